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

use super::models::Job;
use super::{pcloud_path, ClientResult, PowerVsClient};

#[derive(Debug, Clone)]
pub struct JobClient {
    client: PowerVsClient,
    cloud_instance_id: String,
}

impl JobClient {
    pub(super) fn new(client: PowerVsClient, cloud_instance_id: &str) -> Self {
        Self {
            client,
            cloud_instance_id: cloud_instance_id.to_owned(),
        }
    }

    pub async fn get(&self, id: &str) -> ClientResult<Job> {
        let path = format!("{}/jobs/{id}", pcloud_path(&self.cloud_instance_id));
        self.client.get(&self.cloud_instance_id, &path).await
    }
}
