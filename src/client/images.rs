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

use super::models::{ExportImage, Image, JobReference};
use super::{pcloud_path, ClientResult, PowerVsClient};

#[derive(Debug, Clone)]
pub struct ImageClient {
    client: PowerVsClient,
    cloud_instance_id: String,
}

impl ImageClient {
    pub(super) fn new(client: PowerVsClient, cloud_instance_id: &str) -> Self {
        Self {
            client,
            cloud_instance_id: cloud_instance_id.to_owned(),
        }
    }

    pub async fn get(&self, id: &str) -> ClientResult<Image> {
        let path = format!("{}/images/{id}", pcloud_path(&self.cloud_instance_id));
        self.client.get(&self.cloud_instance_id, &path).await
    }

    pub async fn get_stock_image(&self, id: &str) -> ClientResult<Image> {
        let path = format!("{}/stock-images/{id}", pcloud_path(&self.cloud_instance_id));
        self.client.get(&self.cloud_instance_id, &path).await
    }

    /// Look the image up in the stock catalog first, then in the workspace
    pub async fn get_any(&self, id: &str) -> ClientResult<Image> {
        match self.get_stock_image(id).await {
            Ok(image) => Ok(image),
            Err(err) if err.is_not_found() => self.get(id).await,
            Err(err) => Err(err),
        }
    }

    pub async fn export(&self, id: &str, body: &ExportImage) -> ClientResult<JobReference> {
        let path = format!("{}/images/{id}/export", pcloud_path(&self.cloud_instance_id));
        self.client.post(&self.cloud_instance_id, &path, body).await
    }
}
