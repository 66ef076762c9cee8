// This file is part of the terraform-provider-powervs project
//
// Copyright (C) ANEO, 2024-2024. All rights reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License")
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use super::models::{
    SharedProcessorPool, SharedProcessorPoolCreate, SharedProcessorPoolDetail,
    SharedProcessorPoolUpdate, SharedProcessorPools,
};
use super::{pcloud_path, ClientResult, PowerVsClient};

#[derive(Debug, Clone)]
pub struct SharedProcessorPoolClient {
    client: PowerVsClient,
    cloud_instance_id: String,
}

impl SharedProcessorPoolClient {
    pub(super) fn new(client: PowerVsClient, cloud_instance_id: &str) -> Self {
        Self {
            client,
            cloud_instance_id: cloud_instance_id.to_owned(),
        }
    }

    fn path(&self, suffix: &str) -> String {
        format!(
            "{}/shared-processor-pools{suffix}",
            pcloud_path(&self.cloud_instance_id)
        )
    }

    pub async fn create(
        &self,
        body: &SharedProcessorPoolCreate,
    ) -> ClientResult<SharedProcessorPool> {
        self.client
            .post(&self.cloud_instance_id, &self.path(""), body)
            .await
    }

    pub async fn list(&self) -> ClientResult<Vec<SharedProcessorPool>> {
        let pools: SharedProcessorPools = self
            .client
            .get(&self.cloud_instance_id, &self.path(""))
            .await?;
        Ok(pools.shared_processor_pools)
    }

    pub async fn get(&self, id: &str) -> ClientResult<SharedProcessorPoolDetail> {
        self.client
            .get(&self.cloud_instance_id, &self.path(&format!("/{id}")))
            .await
    }

    pub async fn update(
        &self,
        id: &str,
        body: &SharedProcessorPoolUpdate,
    ) -> ClientResult<SharedProcessorPool> {
        self.client
            .put(&self.cloud_instance_id, &self.path(&format!("/{id}")), body)
            .await
    }

    pub async fn delete(&self, id: &str) -> ClientResult<()> {
        self.client
            .delete(&self.cloud_instance_id, &self.path(&format!("/{id}")))
            .await
    }
}
