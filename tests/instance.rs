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
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use terraform_provider_powervs::instance::{InstanceNetwork, InstanceResource, InstanceState};

use common::{pcloud, pvm, setup, CLOUD};

fn config() -> InstanceState<'static> {
    InstanceState {
        pi_cloud_instance_id: CLOUD.into(),
        pi_image_id: "image-1".into(),
        pi_instance_name: "lpar".into(),
        pi_network: Value::Value(vec![Value::Value(InstanceNetwork {
            network_id: "net-1".into(),
            ..Default::default()
        })]),
        pi_memory: Value::Value(4.0),
        pi_processors: Value::Value(0.5),
        pi_proc_type: "shared".into(),
        pi_sys_type: "s922".into(),
        ..Default::default()
    }
}

#[tokio::test]
async fn create_waits_until_active_then_reads() {
    let (server, handle) = setup().await;
    let mut active = pvm("pvm-1", "ACTIVE");
    active["networks"] = json!([{
        "networkID": "net-1",
        "networkName": "public",
        "ipAddress": "10.0.0.5",
        "macAddress": "fa:16:3e:00:00:01",
        "type": "fixed",
    }]);

    Mock::given(method("POST"))
        .and(path(pcloud("/pvm-instances")))
        .and(body_partial_json(json!({
            "serverName": "lpar",
            "imageID": "image-1",
            "networks": [{"networkID": "net-1"}],
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([pvm("pvm-1", "BUILD")])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(pcloud("/pvm-instances/pvm-1")))
        .respond_with(ResponseTemplate::new(200).set_body_json(pvm("pvm-1", "BUILD")))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(pcloud("/pvm-instances/pvm-1")))
        .respond_with(ResponseTemplate::new(200).set_body_json(&active))
        .mount(&server)
        .await;

    let resource = InstanceResource::new(handle);
    let mut diags = Diagnostics::default();
    let (planned, _) = resource
        .plan_create(&mut diags, config(), config(), ValueEmpty::default())
        .await
        .unwrap();
    assert!(planned.id.is_unknown());

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
    assert_eq!(created.id.as_str(), format!("{CLOUD}/pvm-1"));
    assert_eq!(created.instance_id.as_str(), "pvm-1");
    let networks = created.pi_network.as_ref_option().unwrap();
    let network = networks[0].as_ref_option().unwrap();
    assert_eq!(network.ip_address.as_str(), "10.0.0.5");
    assert_eq!(network.network_name.as_str(), "public");

    let (read, _) = resource
        .read(
            &mut diags,
            created.clone(),
            ValueEmpty::default(),
            ValueEmpty::default(),
        )
        .await
        .unwrap();
    assert!(diags.errors.is_empty(), "{diags:?}");
    assert_eq!(read.id, created.id);
    assert_eq!(read.pi_memory, Value::Value(4.0));
}

#[tokio::test]
async fn failed_build_taints_the_instance() {
    let (server, handle) = setup().await;
    Mock::given(method("POST"))
        .and(path(pcloud("/pvm-instances")))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([pvm("pvm-2", "BUILD")])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(pcloud("/pvm-instances/pvm-2")))
        .respond_with(ResponseTemplate::new(200).set_body_json(pvm("pvm-2", "ERROR")))
        .mount(&server)
        .await;

    let resource = InstanceResource::new(handle);
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
        .expect("the created instance stays in state");
    assert_eq!(diags.errors.len(), 1);
    assert_eq!(state.id.as_str(), format!("{CLOUD}/pvm-2"));
}

/// Power state and sizing of a simulated LPAR, with the update bodies it received
#[derive(Debug)]
struct Lpar {
    running: bool,
    memory: f64,
    processors: f64,
    migratable: bool,
    updates: Vec<serde_json::Value>,
    actions: Vec<String>,
}

impl Default for Lpar {
    fn default() -> Self {
        Self {
            running: true,
            memory: 4.0,
            processors: 0.5,
            migratable: false,
            updates: Vec::new(),
            actions: Vec::new(),
        }
    }
}

/// Serve the workspace, the LPAR, its updates and its power actions
async fn mount_lpar(server: &MockServer, lpar: Arc<Mutex<Lpar>>) {
    Mock::given(method("GET"))
        .and(path(pcloud("")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "cloudInstanceID": CLOUD,
            "capabilities": [],
        })))
        .mount(server)
        .await;

    let state = lpar.clone();
    Mock::given(method("GET"))
        .and(path(pcloud("/pvm-instances/pvm-1")))
        .respond_with(move |_: &Request| {
            let lpar = state.lock().unwrap();
            let mut body = pvm("pvm-1", if lpar.running { "ACTIVE" } else { "SHUTOFF" });
            body["memory"] = json!(lpar.memory);
            body["processors"] = json!(lpar.processors);
            body["migratable"] = json!(lpar.migratable);
            body["maxmem"] = json!(8.0);
            body["maxproc"] = json!(1.0);
            ResponseTemplate::new(200).set_body_json(body)
        })
        .mount(server)
        .await;

    let state = lpar.clone();
    Mock::given(method("PUT"))
        .and(path(pcloud("/pvm-instances/pvm-1")))
        .respond_with(move |request: &Request| {
            let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
            let mut lpar = state.lock().unwrap();
            if let Some(memory) = body["memory"].as_f64() {
                lpar.memory = memory;
            }
            if let Some(processors) = body["processors"].as_f64() {
                lpar.processors = processors;
            }
            if let Some(migratable) = body["migratable"].as_bool() {
                lpar.migratable = migratable;
            }
            lpar.updates.push(body);
            ResponseTemplate::new(202).set_body_json(json!({}))
        })
        .mount(server)
        .await;

    let state = lpar;
    Mock::given(method("POST"))
        .and(path(pcloud("/pvm-instances/pvm-1/action")))
        .respond_with(move |request: &Request| {
            let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
            let action = body["action"].as_str().unwrap_or_default().to_owned();
            let mut lpar = state.lock().unwrap();
            lpar.running = action == "start";
            lpar.actions.push(action);
            ResponseTemplate::new(200).set_body_json(json!({}))
        })
        .mount(server)
        .await;
}

/// Plan then apply an in-place update from `prior`
async fn plan_and_update(
    resource: &InstanceResource,
    prior: InstanceState<'static>,
    proposed: InstanceState<'static>,
    config: InstanceState<'static>,
    diags: &mut Diagnostics,
) -> (InstanceState<'static>, Option<InstanceState<'static>>) {
    let (planned, _, replace) = resource
        .plan_update(
            diags,
            prior.clone(),
            proposed,
            config.clone(),
            ValueEmpty::default(),
            ValueEmpty::default(),
        )
        .await
        .unwrap();
    assert!(replace.is_empty(), "{replace:?}");
    let updated = resource
        .update(
            diags,
            prior,
            planned.clone(),
            config,
            ValueEmpty::default(),
            ValueEmpty::default(),
        )
        .await
        .map(|(state, _)| state);
    (planned, updated)
}

#[tokio::test]
async fn migratable_change_keeps_the_current_size() {
    let (server, handle) = setup().await;
    let lpar = Arc::new(Mutex::new(Lpar::default()));
    mount_lpar(&server, lpar.clone()).await;

    let resource = InstanceResource::new(handle);
    let mut diags = Diagnostics::default();
    let (prior, _) = resource
        .import(&mut diags, format!("{CLOUD}/pvm-1"))
        .await
        .unwrap();
    assert_eq!(prior.pi_memory, Value::Value(4.0));

    let proposed = InstanceState {
        pi_migratable: Value::Value(true),
        ..prior.clone()
    };
    let config = InstanceState {
        pi_memory: Value::Null,
        pi_processors: Value::Null,
        ..proposed.clone()
    };
    let (planned, updated) = plan_and_update(&resource, prior, proposed, config, &mut diags).await;
    assert!(planned.pi_memory.is_unknown());
    assert!(diags.errors.is_empty(), "{diags:?}");

    let updated = updated.unwrap();
    assert_eq!(updated.pi_memory, Value::Value(4.0));
    assert_eq!(updated.pi_processors, Value::Value(0.5));
    let lpar = lpar.lock().unwrap();
    assert_eq!(
        lpar.updates,
        vec![json!({"memory": 4.0, "processors": 0.5, "migratable": true})]
    );
    assert!(lpar.actions.is_empty());
}

#[tokio::test]
async fn resize_within_maximum_is_applied_live() {
    let (server, handle) = setup().await;
    let lpar = Arc::new(Mutex::new(Lpar::default()));
    mount_lpar(&server, lpar.clone()).await;

    let resource = InstanceResource::new(handle);
    let mut diags = Diagnostics::default();
    let (prior, _) = resource
        .import(&mut diags, format!("{CLOUD}/pvm-1"))
        .await
        .unwrap();

    let proposed = InstanceState {
        pi_memory: Value::Value(6.0),
        ..prior.clone()
    };
    let (_, updated) =
        plan_and_update(&resource, prior, proposed.clone(), proposed, &mut diags).await;
    assert!(diags.errors.is_empty(), "{diags:?}");
    assert_eq!(updated.unwrap().pi_memory, Value::Value(6.0));

    let lpar = lpar.lock().unwrap();
    assert_eq!(
        lpar.updates,
        vec![json!({"memory": 6.0, "processors": 0.5, "migratable": false})]
    );
    assert!(lpar.actions.is_empty());
    assert!(lpar.running);
}

#[tokio::test]
async fn resize_over_maximum_stops_and_restarts() {
    let (server, handle) = setup().await;
    let lpar = Arc::new(Mutex::new(Lpar::default()));
    mount_lpar(&server, lpar.clone()).await;

    let resource = InstanceResource::new(handle);
    let mut diags = Diagnostics::default();
    let (prior, _) = resource
        .import(&mut diags, format!("{CLOUD}/pvm-1"))
        .await
        .unwrap();

    let proposed = InstanceState {
        pi_memory: Value::Value(16.0),
        pi_processors: Value::Value(2.0),
        ..prior.clone()
    };
    let (_, updated) =
        plan_and_update(&resource, prior, proposed.clone(), proposed, &mut diags).await;
    assert!(diags.errors.is_empty(), "{diags:?}");
    let updated = updated.unwrap();
    assert_eq!(updated.pi_memory, Value::Value(16.0));
    assert_eq!(updated.pi_processors, Value::Value(2.0));

    let lpar = lpar.lock().unwrap();
    assert_eq!(lpar.updates, vec![json!({"memory": 16.0, "processors": 2.0})]);
    assert_eq!(lpar.actions, vec!["immediate-shutdown", "start"]);
    assert!(lpar.running);
}

#[tokio::test]
async fn rename_is_applied_alone() {
    let (server, handle) = setup().await;
    let lpar = Arc::new(Mutex::new(Lpar::default()));
    mount_lpar(&server, lpar.clone()).await;

    let resource = InstanceResource::new(handle);
    let mut diags = Diagnostics::default();
    let (prior, _) = resource
        .import(&mut diags, format!("{CLOUD}/pvm-1"))
        .await
        .unwrap();

    let proposed = InstanceState {
        pi_instance_name: "renamed".into(),
        ..prior.clone()
    };
    let (_, updated) =
        plan_and_update(&resource, prior, proposed.clone(), proposed, &mut diags).await;
    assert!(diags.errors.is_empty(), "{diags:?}");
    assert!(updated.is_some());

    let lpar = lpar.lock().unwrap();
    assert_eq!(lpar.updates, vec![json!({"serverName": "renamed"})]);
    assert!(lpar.actions.is_empty());
}
