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

use super::models::{PlacementGroup, PlacementGroupCreate, SppPlacementGroups};
use super::{pcloud_path, ClientResult, PowerVsClient};

/// Placement groups of shared processor pools
#[derive(Debug, Clone)]
pub struct SppPlacementGroupClient {
    client: PowerVsClient,
    cloud_instance_id: String,
}

impl SppPlacementGroupClient {
    pub(super) fn new(client: PowerVsClient, cloud_instance_id: &str) -> Self {
        Self {
            client,
            cloud_instance_id: cloud_instance_id.to_owned(),
        }
    }

    fn path(&self, suffix: &str) -> String {
        format!(
            "{}/spp-placement-groups{suffix}",
            pcloud_path(&self.cloud_instance_id)
        )
    }

    pub async fn create(&self, body: &PlacementGroupCreate) -> ClientResult<PlacementGroup> {
        self.client
            .post(&self.cloud_instance_id, &self.path(""), body)
            .await
    }

    pub async fn list(&self) -> ClientResult<Vec<PlacementGroup>> {
        let groups: SppPlacementGroups = self
            .client
            .get(&self.cloud_instance_id, &self.path(""))
            .await?;
        Ok(groups.spp_placement_groups)
    }

    pub async fn get(&self, id: &str) -> ClientResult<PlacementGroup> {
        self.client
            .get(&self.cloud_instance_id, &self.path(&format!("/{id}")))
            .await
    }

    pub async fn delete(&self, id: &str) -> ClientResult<()> {
        self.client
            .delete(&self.cloud_instance_id, &self.path(&format!("/{id}")))
            .await
    }

    pub async fn add_member(&self, id: &str, pool_id: &str) -> ClientResult<()> {
        self.client
            .call::<()>(
                Method::POST,
                &self.cloud_instance_id,
                &self.path(&format!("/{id}/members/{pool_id}")),
                None,
            )
            .await
    }

    pub async fn remove_member(&self, id: &str, pool_id: &str) -> ClientResult<()> {
        self.client
            .delete(
                &self.cloud_instance_id,
                &self.path(&format!("/{id}/members/{pool_id}")),
            )
            .await
    }
}
