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

//! Thin typed client of the PowerVS REST API
//!
//! The client only serializes requests, attaches the IAM bearer token and the
//! `CRN` header of the targeted cloud instance, and maps failures to
//! [`ClientError`].

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Method, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

mod auth;
mod cloud_instance;
mod error;
mod images;
mod instances;
mod jobs;
pub mod models;
mod network_security_groups;
mod placement_groups;
mod shared_processor_pools;
mod spp_placement_groups;
mod virtual_serial_numbers;

pub use auth::{decode_account, Credentials};
pub use cloud_instance::CloudInstanceClient;
pub use error::{ClientError, ClientResult};
pub use images::ImageClient;
pub use instances::{InstanceClient, SapClient};
pub use jobs::JobClient;
pub use network_security_groups::NsgClient;
pub use placement_groups::PlacementGroupClient;
pub use shared_processor_pools::SharedProcessorPoolClient;
pub use spp_placement_groups::SppPlacementGroupClient;
pub use virtual_serial_numbers::VsnClient;

use auth::Authenticator;

/// Everything needed to build a [`PowerVsClient`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    pub endpoint: String,
    pub iam_endpoint: String,
    pub zone: String,
    pub credentials: Credentials,
    pub timeout: Duration,
    pub max_retries: u32,
}

#[derive(Debug, Clone)]
pub struct PowerVsClient {
    http: reqwest::Client,
    endpoint: String,
    zone: String,
    auth: Arc<Authenticator>,
    max_retries: u32,
}

impl PowerVsClient {
    pub fn new(options: ClientOptions) -> ClientResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(options.timeout)
            .user_agent(concat!("terraform-provider-powervs/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let auth = Authenticator::new(http.clone(), options.iam_endpoint, options.credentials);
        Ok(Self {
            http,
            endpoint: options.endpoint.trim_end_matches('/').to_owned(),
            zone: options.zone,
            auth: Arc::new(auth),
            max_retries: options.max_retries,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn zone(&self) -> &str {
        &self.zone
    }

    pub fn cloud_instance(&self, cloud_instance_id: &str) -> CloudInstanceClient {
        CloudInstanceClient::new(self.clone(), cloud_instance_id)
    }
    pub fn instances(&self, cloud_instance_id: &str) -> InstanceClient {
        InstanceClient::new(self.clone(), cloud_instance_id)
    }
    pub fn sap(&self, cloud_instance_id: &str) -> SapClient {
        SapClient::new(self.clone(), cloud_instance_id)
    }
    pub fn images(&self, cloud_instance_id: &str) -> ImageClient {
        ImageClient::new(self.clone(), cloud_instance_id)
    }
    pub fn jobs(&self, cloud_instance_id: &str) -> JobClient {
        JobClient::new(self.clone(), cloud_instance_id)
    }
    pub fn placement_groups(&self, cloud_instance_id: &str) -> PlacementGroupClient {
        PlacementGroupClient::new(self.clone(), cloud_instance_id)
    }
    pub fn spp_placement_groups(&self, cloud_instance_id: &str) -> SppPlacementGroupClient {
        SppPlacementGroupClient::new(self.clone(), cloud_instance_id)
    }
    pub fn shared_processor_pools(&self, cloud_instance_id: &str) -> SharedProcessorPoolClient {
        SharedProcessorPoolClient::new(self.clone(), cloud_instance_id)
    }
    pub fn network_security_groups(&self, cloud_instance_id: &str) -> NsgClient {
        NsgClient::new(self.clone(), cloud_instance_id)
    }
    pub fn virtual_serial_numbers(&self, cloud_instance_id: &str) -> VsnClient {
        VsnClient::new(self.clone(), cloud_instance_id)
    }

    fn crn(&self, account: &str, cloud_instance_id: &str) -> String {
        format!(
            "crn:v1:bluemix:public:power-iaas:{}:a/{account}:{cloud_instance_id}::",
            self.zone
        )
    }

    /// Send a request and return the raw body of a successful response
    async fn send<B>(
        &self,
        method: Method,
        cloud_instance_id: &str,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&B>,
    ) -> ClientResult<String>
    where
        B: Serialize + ?Sized + Sync,
    {
        let url = format!("{}{path}", self.endpoint);
        let mut attempt = 0;
        loop {
            let session = self.auth.session().await?;
            let mut request = self
                .http
                .request(method.clone(), &url)
                .bearer_auth(&session.access_token)
                .header("CRN", self.crn(&session.account, cloud_instance_id))
                .header("Accept", "application/json");
            if !query.is_empty() {
                request = request.query(query);
            }
            if let Some(body) = body {
                request = request.json(body);
            }

            debug!(%method, path, attempt, "PowerVS request");
            match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    if is_transient(status) && attempt < self.max_retries {
                        warn!(%method, path, %status, "transient PowerVS error, retrying");
                    } else {
                        let text = response.text().await?;
                        if status.is_success() {
                            return Ok(text);
                        }
                        debug!(%method, path, %status, body = %text, "PowerVS error");
                        return Err(ClientError::from_response(status.as_u16(), &text));
                    }
                }
                Err(err) if (err.is_connect() || err.is_timeout()) && attempt < self.max_retries => {
                    warn!(%method, path, error = %err, "PowerVS unreachable, retrying");
                }
                Err(err) => return Err(err.into()),
            }
            attempt += 1;
            tokio::time::sleep(Duration::from_millis(500 * attempt as u64)).await;
        }
    }

    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        cloud_instance_id: &str,
        path: &str,
    ) -> ClientResult<T> {
        self.get_with_query(cloud_instance_id, path, &[]).await
    }

    pub(crate) async fn get_with_query<T: DeserializeOwned>(
        &self,
        cloud_instance_id: &str,
        path: &str,
        query: &[(&str, &str)],
    ) -> ClientResult<T> {
        let body = self
            .send::<()>(Method::GET, cloud_instance_id, path, query, None)
            .await?;
        Ok(serde_json::from_str(&body)?)
    }

    pub(crate) async fn post<B, T>(&self, cloud_instance_id: &str, path: &str, body: &B) -> ClientResult<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let body = self
            .send(Method::POST, cloud_instance_id, path, &[], Some(body))
            .await?;
        Ok(serde_json::from_str(&body)?)
    }

    pub(crate) async fn put<B, T>(&self, cloud_instance_id: &str, path: &str, body: &B) -> ClientResult<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let body = self
            .send(Method::PUT, cloud_instance_id, path, &[], Some(body))
            .await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Request whose response body is ignored
    pub(crate) async fn call<B>(
        &self,
        method: Method,
        cloud_instance_id: &str,
        path: &str,
        body: Option<&B>,
    ) -> ClientResult<()>
    where
        B: Serialize + ?Sized + Sync,
    {
        self.send(method, cloud_instance_id, path, &[], body)
            .await
            .map(|_| ())
    }

    pub(crate) async fn delete(&self, cloud_instance_id: &str, path: &str) -> ClientResult<()> {
        self.call::<()>(Method::DELETE, cloud_instance_id, path, None)
            .await
    }
}

/// Path prefix of the workspace scoped `pcloud` API
pub(crate) fn pcloud_path(cloud_instance_id: &str) -> String {
    format!("/pcloud/v1/cloud-instances/{cloud_instance_id}")
}

fn is_transient(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    )
}
