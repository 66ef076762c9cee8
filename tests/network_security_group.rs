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
use tf_provider::value::{Value, ValueEmpty};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, ResponseTemplate};

use terraform_provider_powervs::network_security_group::{
    NsgPort, NsgProtocol, NsgRemote, NsgRuleResource, NsgRuleState,
};

use common::{mount_iam, setup, CLOUD};

const NSG_PATH: &str = "/v1/network-security-groups/nsg-1";

fn nsg(rules: serde_json::Value) -> serde_json::Value {
    json!({
        "id": "nsg-1",
        "name": "web",
        "crn": "crn:v1:nsg-1",
        "members": [],
        "rules": rules,
        "userTags": [],
    })
}

fn ssh_rule() -> serde_json::Value {
    json!({
        "id": "rule-1",
        "name": "ssh",
        "action": "allow",
        "protocol": {"type": "tcp"},
        "remote": {"type": "default-network-address-group"},
        "destinationPort": {"minimum": 22, "maximum": 22},
    })
}

fn config() -> NsgRuleState<'static> {
    NsgRuleState {
        pi_cloud_instance_id: CLOUD.into(),
        pi_network_security_group_id: "nsg-1".into(),
        pi_action: "allow".into(),
        pi_name: "ssh".into(),
        pi_protocol: Value::Value(NsgProtocol {
            protocol_type: "tcp".into(),
            ..Default::default()
        }),
        pi_remote: Value::Value(NsgRemote {
            remote_type: "default-network-address-group".into(),
            ..Default::default()
        }),
        pi_destination_port: Value::Value(NsgPort {
            minimum: Value::Value(22),
            maximum: Value::Value(22),
        }),
        ..Default::default()
    }
}

#[tokio::test]
async fn add_rule_waits_until_listed_then_removes_it() {
    let (server, handle) = setup().await;
    Mock::given(method("POST"))
        .and(path(format!("{NSG_PATH}/rules")))
        .and(body_json(json!({
            "action": "allow",
            "name": "ssh",
            "protocol": {"type": "tcp"},
            "remote": {"type": "default-network-address-group"},
            "destinationPorts": {"minimum": 22, "maximum": 22},
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(ssh_rule()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(NSG_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(nsg(json!([]))))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(NSG_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(nsg(json!([ssh_rule()]))))
        .mount(&server)
        .await;

    let resource = NsgRuleResource::new(handle);
    let mut diags = Diagnostics::default();
    let (planned, _) = resource
        .plan_create(&mut diags, config(), config(), ValueEmpty::default())
        .await
        .unwrap();
    let (created, _) = resource
        .create(
            &mut diags,
            planned,
            config(),
            ValueEmpty::default(),
            ValueEmpty::default(),
        )
        .await
        .unwrap();
    assert!(diags.errors.is_empty(), "{diags:?}");
    assert_eq!(created.id.as_str(), format!("{CLOUD}/nsg-1/rule-1"));
    assert_eq!(created.crn.as_str(), "crn:v1:nsg-1");
    assert_eq!(created.rules.as_ref_option().map(Vec::len), Some(1));

    server.reset().await;
    mount_iam(&server).await;
    Mock::given(method("DELETE"))
        .and(path(format!("{NSG_PATH}/rules/rule-1")))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(NSG_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(nsg(json!([]))))
        .mount(&server)
        .await;

    resource
        .destroy(
            &mut diags,
            created,
            ValueEmpty::default(),
            ValueEmpty::default(),
        )
        .await
        .unwrap();
    assert!(diags.errors.is_empty(), "{diags:?}");
}

#[tokio::test]
async fn remove_mode_deletes_existing_rule() {
    let (server, handle) = setup().await;
    Mock::given(method("DELETE"))
        .and(path(format!("{NSG_PATH}/rules/rule-1")))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(NSG_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(nsg(json!([]))))
        .mount(&server)
        .await;

    let config = NsgRuleState {
        pi_cloud_instance_id: CLOUD.into(),
        pi_network_security_group_id: "nsg-1".into(),
        pi_network_security_group_rule_id: "rule-1".into(),
        ..Default::default()
    };
    let resource = NsgRuleResource::new(handle);
    let mut diags = Diagnostics::default();
    let (planned, _) = resource
        .plan_create(&mut diags, config.clone(), config.clone(), ValueEmpty::default())
        .await
        .unwrap();
    let (state, _) = resource
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
    assert_eq!(state.id.as_str(), format!("{CLOUD}/nsg-1"));
    assert_eq!(state.rules.as_ref_option().map(Vec::len), Some(0));

    // A removal rule has nothing to undo
    resource
        .destroy(
            &mut diags,
            state,
            ValueEmpty::default(),
            ValueEmpty::default(),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn added_rule_stays_in_state_when_the_wait_fails() {
    let (server, handle) = setup().await;
    Mock::given(method("POST"))
        .and(path(format!("{NSG_PATH}/rules")))
        .respond_with(ResponseTemplate::new(200).set_body_json(ssh_rule()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(NSG_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"description": "internal error"})))
        .mount(&server)
        .await;

    let resource = NsgRuleResource::new(handle);
    let mut diags = Diagnostics::default();
    let (planned, _) = resource
        .plan_create(&mut diags, config(), config(), ValueEmpty::default())
        .await
        .unwrap();
    let (state, _) = resource
        .create(
            &mut diags,
            planned,
            config(),
            ValueEmpty::default(),
            ValueEmpty::default(),
        )
        .await
        .expect("the added rule stays in state");
    assert_eq!(diags.errors.len(), 1);
    assert_eq!(state.id.as_str(), format!("{CLOUD}/nsg-1/rule-1"));
    assert!(state.crn.is_null());
    assert!(state.rules.is_null());
}

#[tokio::test]
async fn failed_removal_is_not_recorded() {
    let (server, handle) = setup().await;
    Mock::given(method("DELETE"))
        .and(path(format!("{NSG_PATH}/rules/rule-1")))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"description": "internal error"})))
        .expect(1)
        .mount(&server)
        .await;

    let config = NsgRuleState {
        pi_cloud_instance_id: CLOUD.into(),
        pi_network_security_group_id: "nsg-1".into(),
        pi_network_security_group_rule_id: "rule-1".into(),
        ..Default::default()
    };
    let resource = NsgRuleResource::new(handle);
    let mut diags = Diagnostics::default();
    let (planned, _) = resource
        .plan_create(&mut diags, config.clone(), config.clone(), ValueEmpty::default())
        .await
        .unwrap();
    let created = resource
        .create(
            &mut diags,
            planned,
            config,
            ValueEmpty::default(),
            ValueEmpty::default(),
        )
        .await;
    assert!(created.is_none());
    assert_eq!(diags.errors.len(), 1);
}
