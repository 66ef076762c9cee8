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

use reqwest::Method;

use super::models::{
    PvmInstance, PvmInstanceAction, PvmInstanceCreate, PvmInstanceUpdate, SapCreate,
};
use super::{pcloud_path, ClientResult, PowerVsClient};

#[derive(Debug, Clone)]
pub struct InstanceClient {
    client: PowerVsClient,
    cloud_instance_id: String,
}

#[derive(Debug, Default, serde::Deserialize)]
struct PvmInstances {
    #[serde(default, rename = "pvmInstances")]
    pvm_instances: Vec<PvmInstance>,
}

impl InstanceClient {
    pub(super) fn new(client: PowerVsClient, cloud_instance_id: &str) -> Self {
        Self {
            client,
            cloud_instance_id: cloud_instance_id.to_owned(),
        }
    }

    fn path(&self, suffix: &str) -> String {
        format!("{}/pvm-instances{suffix}", pcloud_path(&self.cloud_instance_id))
    }

    /// Create one or more instances, returning every created replica
    pub async fn create(&self, body: &PvmInstanceCreate) -> ClientResult<Vec<PvmInstance>> {
        self.client
            .post(&self.cloud_instance_id, &self.path(""), body)
            .await
    }

    pub async fn list(&self) -> ClientResult<Vec<PvmInstance>> {
        let instances: PvmInstances = self
            .client
            .get(&self.cloud_instance_id, &self.path(""))
            .await?;
        Ok(instances.pvm_instances)
    }

    pub async fn get(&self, id: &str) -> ClientResult<PvmInstance> {
        self.client
            .get(&self.cloud_instance_id, &self.path(&format!("/{id}")))
            .await
    }

    pub async fn update(&self, id: &str, body: &PvmInstanceUpdate) -> ClientResult<()> {
        self.client
            .call(
                Method::PUT,
                &self.cloud_instance_id,
                &self.path(&format!("/{id}")),
                Some(body),
            )
            .await
    }

    pub async fn delete(&self, id: &str) -> ClientResult<()> {
        self.client
            .delete(&self.cloud_instance_id, &self.path(&format!("/{id}")))
            .await
    }

    /// Run a power action such as `start` or `immediate-shutdown`
    pub async fn action(&self, id: &str, action: &str) -> ClientResult<()> {
        let body = PvmInstanceAction {
            action: action.to_owned(),
        };
        self.client
            .call(
                Method::POST,
                &self.cloud_instance_id,
                &self.path(&format!("/{id}/action")),
                Some(&body),
            )
            .await
    }
}

#[derive(Debug, Clone)]
pub struct SapClient {
    client: PowerVsClient,
    cloud_instance_id: String,
}

impl SapClient {
    pub(super) fn new(client: PowerVsClient, cloud_instance_id: &str) -> Self {
        Self {
            client,
            cloud_instance_id: cloud_instance_id.to_owned(),
        }
    }

    pub async fn create(&self, body: &SapCreate) -> ClientResult<Vec<PvmInstance>> {
        let path = format!("{}/sap", pcloud_path(&self.cloud_instance_id));
        self.client.post(&self.cloud_instance_id, &path, body).await
    }
}
