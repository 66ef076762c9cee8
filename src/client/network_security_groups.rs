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

use super::models::{NetworkSecurityGroup, NetworkSecurityGroupAddRule, NetworkSecurityGroupRule};
use super::{ClientResult, PowerVsClient};

#[derive(Debug, Clone)]
pub struct NsgClient {
    client: PowerVsClient,
    cloud_instance_id: String,
}

impl NsgClient {
    pub(super) fn new(client: PowerVsClient, cloud_instance_id: &str) -> Self {
        Self {
            client,
            cloud_instance_id: cloud_instance_id.to_owned(),
        }
    }

    fn path(nsg_id: &str) -> String {
        format!("/v1/network-security-groups/{nsg_id}")
    }

    pub async fn get(&self, nsg_id: &str) -> ClientResult<NetworkSecurityGroup> {
        self.client
            .get(&self.cloud_instance_id, &Self::path(nsg_id))
            .await
    }

    pub async fn add_rule(
        &self,
        nsg_id: &str,
        rule: &NetworkSecurityGroupAddRule,
    ) -> ClientResult<NetworkSecurityGroupRule> {
        let path = format!("{}/rules", Self::path(nsg_id));
        self.client.post(&self.cloud_instance_id, &path, rule).await
    }

    pub async fn remove_rule(&self, nsg_id: &str, rule_id: &str) -> ClientResult<()> {
        let path = format!("{}/rules/{rule_id}", Self::path(nsg_id));
        self.client.delete(&self.cloud_instance_id, &path).await
    }
}
