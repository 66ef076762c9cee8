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
    AddServerVirtualSerialNumber, DeleteServerVirtualSerialNumber, UpdateServerVirtualSerialNumber,
    UpdateVirtualSerialNumber, VirtualSerialNumber,
};
use super::{pcloud_path, ClientResult, PowerVsClient};

/// Virtual serial numbers, both standalone and attached to an instance
#[derive(Debug, Clone)]
pub struct VsnClient {
    client: PowerVsClient,
    cloud_instance_id: String,
}

impl VsnClient {
    pub(super) fn new(client: PowerVsClient, cloud_instance_id: &str) -> Self {
        Self {
            client,
            cloud_instance_id: cloud_instance_id.to_owned(),
        }
    }

    fn pvm_path(&self, pvm_instance_id: &str) -> String {
        format!(
            "{}/pvm-instances/{pvm_instance_id}/virtual-serial-number",
            pcloud_path(&self.cloud_instance_id)
        )
    }

    pub async fn get(&self, serial: &str) -> ClientResult<VirtualSerialNumber> {
        let path = format!("/v1/virtual-serial-number/{serial}");
        self.client.get(&self.cloud_instance_id, &path).await
    }

    /// List serial numbers, optionally only those attached to an instance
    pub async fn list(
        &self,
        pvm_instance_id: Option<&str>,
    ) -> ClientResult<Vec<VirtualSerialNumber>> {
        let query: Vec<(&str, &str)> = pvm_instance_id
            .map(|id| vec![("pvmInstanceID", id)])
            .unwrap_or_default();
        self.client
            .get_with_query(&self.cloud_instance_id, "/v1/virtual-serial-number", &query)
            .await
    }

    pub async fn update(&self, serial: &str, description: &str) -> ClientResult<()> {
        let path = format!("/v1/virtual-serial-number/{serial}");
        let body = UpdateVirtualSerialNumber {
            description: description.to_owned(),
        };
        self.client
            .call(Method::PUT, &self.cloud_instance_id, &path, Some(&body))
            .await
    }

    pub async fn delete(&self, serial: &str) -> ClientResult<()> {
        let path = format!("/v1/virtual-serial-number/{serial}");
        self.client.delete(&self.cloud_instance_id, &path).await
    }

    pub async fn attach(
        &self,
        pvm_instance_id: &str,
        body: &AddServerVirtualSerialNumber,
    ) -> ClientResult<()> {
        self.client
            .call(
                Method::POST,
                &self.cloud_instance_id,
                &self.pvm_path(pvm_instance_id),
                Some(body),
            )
            .await
    }

    pub async fn update_attached(
        &self,
        pvm_instance_id: &str,
        body: &UpdateServerVirtualSerialNumber,
    ) -> ClientResult<()> {
        self.client
            .call(
                Method::PUT,
                &self.cloud_instance_id,
                &self.pvm_path(pvm_instance_id),
                Some(body),
            )
            .await
    }

    pub async fn detach(&self, pvm_instance_id: &str, retain_vsn: bool) -> ClientResult<()> {
        let body = DeleteServerVirtualSerialNumber { retain_vsn };
        self.client
            .call(
                Method::DELETE,
                &self.cloud_instance_id,
                &self.pvm_path(pvm_instance_id),
                Some(&body),
            )
            .await
    }
}
