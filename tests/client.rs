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

mod common;

use std::time::Duration;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde_json::json;
use tokio_test::{assert_err, assert_ok};
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use terraform_provider_powervs::client::{ClientError, ClientOptions, Credentials, PowerVsClient};

use common::{access_token, mount_iam, pcloud, CLOUD};

async fn client(server: &MockServer, max_retries: u32) -> PowerVsClient {
    mount_iam(server).await;
    assert_ok!(PowerVsClient::new(ClientOptions {
        endpoint: server.uri(),
        iam_endpoint: server.uri(),
        zone: "dal12".into(),
        credentials: Credentials::ApiKey("key".into()),
        timeout: Duration::from_secs(10),
        max_retries,
    }))
}

#[tokio::test]
async fn requests_carry_crn_of_the_workspace() {
    let server = MockServer::start().await;
    let client = client(&server, 0).await;
    Mock::given(method("GET"))
        .and(path(pcloud("/placement-groups/pg-1")))
        .and(header(
            "CRN",
            format!("crn:v1:bluemix:public:power-iaas:dal12:a/acc-1:{CLOUD}::").as_str(),
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "pg-1",
            "name": "web",
            "policy": "affinity",
            "members": [],
        })))
        .expect(1)
        .mount(&server)
        .await;

    let group = assert_ok!(client.placement_groups(CLOUD).get("pg-1").await);
    assert_eq!(group.policy, "affinity");
    assert!(group.members.is_empty());
}

#[tokio::test]
async fn transient_errors_are_retried() {
    let server = MockServer::start().await;
    let client = client(&server, 2).await;
    Mock::given(method("GET"))
        .and(path(pcloud("/placement-groups")))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(pcloud("/placement-groups")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"placementGroups": []})))
        .expect(1)
        .mount(&server)
        .await;

    let groups = assert_ok!(client.placement_groups(CLOUD).list().await);
    assert!(groups.is_empty());
}

#[tokio::test]
async fn missing_objects_map_to_not_found() {
    let server = MockServer::start().await;
    let client = client(&server, 0).await;
    Mock::given(method("GET"))
        .and(path(pcloud("/placement-groups/gone")))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"description": "placement group does not exist"})),
        )
        .mount(&server)
        .await;

    let err = assert_err!(client.placement_groups(CLOUD).get("gone").await);
    assert!(err.is_not_found());
    assert!(matches!(err, ClientError::NotFound(_)));
}

#[tokio::test]
async fn rotated_refresh_token_is_used_for_the_next_exchange() {
    let server = MockServer::start().await;
    for (sent, issued) in [("refresh-0", "refresh-1"), ("refresh-1", "refresh-2")] {
        Mock::given(method("POST"))
            .and(path("/identity/token"))
            .and(body_string_contains(format!("refresh_token={sent}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": access_token(),
                "refresh_token": issued,
                "expires_in": 0,
            })))
            .expect(1)
            .mount(&server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path(pcloud("/placement-groups")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"placementGroups": []})))
        .expect(2)
        .mount(&server)
        .await;

    let expired = format!(
        "{}.{}.sig",
        URL_SAFE_NO_PAD.encode(json!({"alg": "none"}).to_string()),
        URL_SAFE_NO_PAD.encode(json!({"account": {"bss": "acc-1"}, "exp": 1}).to_string()),
    );
    let client = assert_ok!(PowerVsClient::new(ClientOptions {
        endpoint: server.uri(),
        iam_endpoint: server.uri(),
        zone: "dal12".into(),
        credentials: Credentials::Token {
            access_token: expired,
            refresh_token: Some("refresh-0".into()),
        },
        timeout: Duration::from_secs(10),
        max_retries: 0,
    }));

    let groups = client.placement_groups(CLOUD);
    assert_ok!(groups.list().await);
    assert_ok!(groups.list().await);
}
