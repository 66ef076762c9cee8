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

use std::sync::{Arc, Mutex};

use serde_json::json;
use tf_provider::{Diagnostics, Resource};
use tf_provider::value::{Value, ValueEmpty};
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use terraform_provider_powervs::timeouts::Timeouts;
use terraform_provider_powervs::virtual_serial_number::{VsnResource, VsnState, AUTO_ASSIGN};

use common::{pcloud, pvm, setup, CLOUD};

/// Power state and serial number of a simulated LPAR
#[derive(Debug, Default)]
struct Lpar {
    running: bool,
    serial: Option<String>,
    /// Ignores start actions
    stuck: bool,
}

/// Serve the LPAR, its power actions and its serial number endpoint
async fn mount_lpar(server: &MockServer, lpar: Arc<Mutex<Lpar>>) {
    let state = lpar.clone();
    Mock::given(method("GET"))
        .and(path(pcloud("/pvm-instances/pvm-1")))
        .respond_with(move |_: &Request| {
            let lpar = state.lock().unwrap();
            let mut body = pvm("pvm-1", if lpar.running { "ACTIVE" } else { "SHUTOFF" });
            if let Some(serial) = &lpar.serial {
                body["virtualSerialNumber"] = json!({
                    "serial": serial,
                    "description": "lpar serial",
                    "softwareTier": "P05",
                });
            }
            ResponseTemplate::new(200).set_body_json(body)
        })
        .mount(server)
        .await;

    let state = lpar.clone();
    Mock::given(method("POST"))
        .and(path(pcloud("/pvm-instances/pvm-1/action")))
        .respond_with(move |request: &Request| {
            let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
            let mut lpar = state.lock().unwrap();
            lpar.running = body["action"] == "start" && !lpar.stuck;
            ResponseTemplate::new(200).set_body_json(json!({}))
        })
        .expect(2)
        .mount(server)
        .await;

    let state = lpar;
    Mock::given(method("POST"))
        .and(path(pcloud("/pvm-instances/pvm-1/virtual-serial-number")))
        .and(body_json(json!({"serial": AUTO_ASSIGN, "description": "lpar serial"})))
        .respond_with(move |_: &Request| {
            let mut lpar = state.lock().unwrap();
            assert!(!lpar.running, "serial numbers are attached to stopped lpars");
            lpar.serial = Some("ABC1234".into());
            ResponseTemplate::new(200).set_body_json(json!({}))
        })
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn auto_assign_stops_attaches_and_restarts() {
    let (server, handle) = setup().await;
    let lpar = Arc::new(Mutex::new(Lpar {
        running: true,
        ..Default::default()
    }));
    mount_lpar(&server, lpar.clone()).await;

    let vsn = json!({
        "serial": "ABC1234",
        "description": "lpar serial",
        "pvmInstanceID": "pvm-1",
        "softwareTier": "P05",
    });
    Mock::given(method("GET"))
        .and(path("/v1/virtual-serial-number"))
        .and(query_param("pvmInstanceID", "pvm-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([vsn])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/virtual-serial-number/ABC1234"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&vsn))
        .mount(&server)
        .await;

    let config = VsnState {
        pi_cloud_instance_id: CLOUD.into(),
        pi_serial: AUTO_ASSIGN.into(),
        pi_description: "lpar serial".into(),
        pi_instance_id: "pvm-1".into(),
        ..Default::default()
    };
    let resource = VsnResource::new(handle);
    let mut diags = Diagnostics::default();
    let (planned, _) = resource
        .plan_create(&mut diags, config.clone(), config.clone(), ValueEmpty::default())
        .await
        .unwrap();
    assert!(planned.pi_software_tier.is_unknown());

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
    assert_eq!(created.id.as_str(), format!("{CLOUD}/ABC1234"));
    assert_eq!(created.pi_serial.as_str(), AUTO_ASSIGN);
    assert_eq!(created.pi_software_tier.as_str(), "P05");

    let lpar = lpar.lock().unwrap();
    assert!(lpar.running, "the lpar is restarted");
    assert_eq!(lpar.serial.as_deref(), Some("ABC1234"));
}

#[tokio::test]
async fn restart_gives_up_at_the_create_timeout() {
    let (server, handle) = setup().await;
    let lpar = Arc::new(Mutex::new(Lpar {
        running: true,
        stuck: true,
        ..Default::default()
    }));
    mount_lpar(&server, lpar.clone()).await;
    Mock::given(method("GET"))
        .and(path("/v1/virtual-serial-number"))
        .and(query_param("pvmInstanceID", "pvm-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "serial": "ABC1234",
            "description": "lpar serial",
            "pvmInstanceID": "pvm-1",
            "softwareTier": "P05",
        }])))
        .mount(&server)
        .await;

    let config = VsnState {
        pi_cloud_instance_id: CLOUD.into(),
        pi_serial: AUTO_ASSIGN.into(),
        pi_description: "lpar serial".into(),
        pi_instance_id: "pvm-1".into(),
        timeouts: Value::Value(Timeouts {
            create: "2s".into(),
            ..Default::default()
        }),
        ..Default::default()
    };
    let resource = VsnResource::new(handle);
    let mut diags = Diagnostics::default();
    let (planned, _) = resource
        .plan_create(&mut diags, config.clone(), config.clone(), ValueEmpty::default())
        .await
        .unwrap();
    let _ = resource
        .create(
            &mut diags,
            planned,
            config,
            ValueEmpty::default(),
            ValueEmpty::default(),
        )
        .await;

    assert_eq!(diags.errors.len(), 1);
    let message = format!("{diags:?}");
    assert!(message.contains("failed to restart the pvm instance"), "{message}");
    assert!(message.contains("timeout: 2s"), "{message}");
    assert!(!lpar.lock().unwrap().running);
}

#[tokio::test]
async fn serial_attached_elsewhere_is_rejected() {
    let (server, handle) = setup().await;
    Mock::given(method("GET"))
        .and(path("/v1/virtual-serial-number/ABC1234"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "serial": "ABC1234",
            "description": "",
            "pvmInstanceID": "pvm-0",
            "softwareTier": "P05",
        })))
        .mount(&server)
        .await;

    let config = VsnState {
        pi_cloud_instance_id: CLOUD.into(),
        pi_serial: "ABC1234".into(),
        pi_instance_id: "pvm-1".into(),
        ..Default::default()
    };
    let resource = VsnResource::new(handle);
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
    assert!(format!("{diags:?}").contains("please unassign virtual serial number ABC1234"));
}
