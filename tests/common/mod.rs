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

//! Mock IAM and PowerVS endpoints shared by the integration tests

#![allow(dead_code)]

use std::time::Duration;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use terraform_provider_powervs::client::{ClientOptions, Credentials, PowerVsClient};
use terraform_provider_powervs::state_change::set_poll_scale;
use terraform_provider_powervs::ProviderHandle;

pub const CLOUD: &str = "cloud-1";

/// Unsigned JWT carrying the account claim read by the client
pub fn access_token() -> String {
    let header = URL_SAFE_NO_PAD.encode(json!({"alg": "none"}).to_string());
    let payload = URL_SAFE_NO_PAD.encode(json!({"account": {"bss": "acc-1"}}).to_string());
    format!("{header}.{payload}.sig")
}

pub fn pcloud(suffix: &str) -> String {
    format!("/pcloud/v1/cloud-instances/{CLOUD}{suffix}")
}

/// Start a mock server answering the IAM token exchange, and a provider
/// handle whose client talks to it
pub async fn setup() -> (MockServer, ProviderHandle) {
    set_poll_scale(0);
    let server = MockServer::start().await;
    mount_iam(&server).await;

    let client = PowerVsClient::new(ClientOptions {
        endpoint: server.uri(),
        iam_endpoint: server.uri(),
        zone: "dal12".into(),
        credentials: Credentials::ApiKey("key".into()),
        timeout: Duration::from_secs(10),
        max_retries: 0,
    })
    .expect("client");
    (server, ProviderHandle::new(client))
}

pub async fn mount_iam(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/identity/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": access_token(),
            "refresh_token": "refresh",
            "expires_in": 3600,
        })))
        .mount(server)
        .await;
}

pub fn pvm(id: &str, status: &str) -> serde_json::Value {
    json!({
        "pvmInstanceID": id,
        "serverName": "lpar",
        "imageID": "image-1",
        "status": status,
        "procType": "shared",
        "processors": 0.5,
        "memory": 4,
        "sysType": "s922",
        "health": {"status": "OK"},
        "networks": [],
    })
}
