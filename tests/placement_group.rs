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

use serde_json::json;
use tf_provider::{Diagnostics, Resource};
use tf_provider::value::ValueEmpty;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, ResponseTemplate};

use terraform_provider_powervs::placement_group::{PlacementGroupResource, PlacementGroupState};

use common::{pcloud, setup, CLOUD};

#[tokio::test]
async fn placement_group_lifecycle() {
    let (server, handle) = setup().await;
    let group = json!({
        "id": "pg-1",
        "name": "web",
        "policy": "anti-affinity",
        "members": ["pvm-1"],
    });
    Mock::given(method("POST"))
        .and(path(pcloud("/placement-groups")))
        .and(body_json(json!({"name": "web", "policy": "anti-affinity"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(&group))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(pcloud("/placement-groups/pg-1")))
        .respond_with(ResponseTemplate::new(200).set_body_json(&group))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(pcloud("/placement-groups/pg-1")))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let resource = PlacementGroupResource::new(handle);
    let config = PlacementGroupState {
        pi_cloud_instance_id: CLOUD.into(),
        pi_placement_group_name: "web".into(),
        pi_placement_group_policy: "anti-affinity".into(),
        ..Default::default()
    };
    let mut diags = Diagnostics::default();
    let (planned, _) = resource
        .plan_create(&mut diags, config.clone(), config.clone(), ValueEmpty::default())
        .await
        .unwrap();
    assert!(planned.id.is_unknown());

    let (created, _) = resource
        .create(
            &mut diags,
            planned,
            config,
            ValueEmpty::default(),
            ValueEmpty::default(),
        )
        .await
        .unwrap();
    assert!(diags.errors.is_empty(), "{diags:?}");
    assert_eq!(created.id.as_str(), format!("{CLOUD}/pg-1"));
    assert_eq!(created.placement_group_id.as_str(), "pg-1");
    assert_eq!(created.members.as_ref_option().map(|m| m.len()), Some(1));

    let (read, _) = resource
        .read(
            &mut diags,
            created.clone(),
            ValueEmpty::default(),
            ValueEmpty::default(),
        )
        .await
        .unwrap();
    assert_eq!(read, created);

    resource
        .destroy(
            &mut diags,
            read,
            ValueEmpty::default(),
            ValueEmpty::default(),
        )
        .await
        .unwrap();
    assert!(diags.errors.is_empty(), "{diags:?}");
}

#[tokio::test]
async fn missing_placement_group_leaves_state() {
    let (server, handle) = setup().await;
    Mock::given(method("GET"))
        .and(path(pcloud("/placement-groups/gone")))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"description": "placement group not found"})),
        )
        .mount(&server)
        .await;

    let id = format!("{CLOUD}/gone");
    let state = PlacementGroupState {
        id: id.as_str().into(),
        ..Default::default()
    };
    let mut diags = Diagnostics::default();
    let read = PlacementGroupResource::new(handle)
        .read(&mut diags, state, ValueEmpty::default(), ValueEmpty::default())
        .await;
    assert!(read.is_none());
    assert!(diags.errors.is_empty());
}
