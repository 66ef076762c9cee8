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

use anyhow::{bail, Context, Result};
use tf_provider::value::{Value, ValueString};

use crate::client::models::{
    PvmInstance, PvmInstanceAddNetwork, PvmInstanceCreate, PvmInstanceMultiCreate,
    SapCreate, StorageAffinity, VirtualCores,
};
use crate::client::PowerVsClient;
use crate::utils::{non_empty, string_list, string_set};

use super::state::InstanceState;

fn networks(state: &InstanceState<'_>) -> Vec<PvmInstanceAddNetwork> {
    state
        .pi_network
        .iter()
        .flatten()
        .flatten()
        .map(|network| PvmInstanceAddNetwork {
            network_id: network.network_id.as_str().to_owned(),
            ip_address: non_empty(&network.ip_address).map(str::to_owned),
        })
        .collect()
}

fn storage_affinity(state: &InstanceState<'_>) -> Option<StorageAffinity> {
    let policy = non_empty(&state.pi_affinity_policy)?;
    let mut affinity = StorageAffinity {
        affinity_policy: policy.to_owned(),
        ..Default::default()
    };
    if policy == "affinity" {
        affinity.affinity_volume = non_empty(&state.pi_affinity_volume).map(str::to_owned);
        affinity.affinity_pvm_instance = non_empty(&state.pi_affinity_instance).map(str::to_owned);
    } else {
        affinity.anti_affinity_volumes = string_list(&state.pi_anti_affinity_volumes);
        affinity.anti_affinity_pvm_instances = string_list(&state.pi_anti_affinity_instances);
    }
    Some(affinity)
}

/// Pin policy sent to the API: only `soft` and `hard` are explicit
fn pin_policy(state: &InstanceState<'_>) -> Option<String> {
    non_empty(&state.pi_pin_policy)
        .filter(|policy| matches!(*policy, "soft" | "hard"))
        .map(str::to_owned)
}

fn owned(value: &ValueString<'_>) -> Option<String> {
    non_empty(value).map(str::to_owned)
}

pub(super) fn sap_body(state: &InstanceState<'_>) -> SapCreate {
    SapCreate {
        name: state.pi_instance_name.as_str().to_owned(),
        profile_id: state.pi_sap_profile_id.as_str().to_owned(),
        image_id: state.pi_image_id.as_str().to_owned(),
        networks: networks(state),
        instances: PvmInstanceMultiCreate {
            affinity_policy: state.pi_replication_policy.as_str().to_owned(),
            count: state.pi_replicants.as_ref_option().copied().unwrap_or(1),
            numerical: state.pi_replication_scheme.as_str().to_owned(),
        },
        volume_ids: string_set(&state.pi_volume_ids),
        pin_policy: pin_policy(state),
        ssh_key_name: owned(&state.pi_key_pair_name),
        user_data: owned(&state.pi_user_data),
        sys_type: owned(&state.pi_sys_type),
        storage_type: owned(&state.pi_storage_type),
        storage_pool: owned(&state.pi_storage_pool),
        storage_affinity: storage_affinity(state),
    }
}

fn required<T: Copy>(value: &Value<T>, name: &str) -> Result<T> {
    match value {
        Value::Value(v) => Ok(*v),
        _ => bail!("{name} is required for creating pvm instances"),
    }
}

fn required_str(value: &ValueString<'_>, name: &str) -> Result<String> {
    match non_empty(value) {
        Some(v) => Ok(v.to_owned()),
        None => bail!("{name} is required for creating pvm instances"),
    }
}

/// Body of a regular PVM instance creation
///
/// `license_repository_capacity` must already have been checked against the
/// image type.
pub(super) fn pvm_body(state: &InstanceState<'_>) -> Result<PvmInstanceCreate> {
    let memory = required(&state.pi_memory, "pi_memory")?;
    let processors = required(&state.pi_processors, "pi_processors")?;
    let sys_type = required_str(&state.pi_sys_type, "pi_sys_type")?;
    let proc_type = required_str(&state.pi_proc_type, "pi_proc_type")?;

    Ok(PvmInstanceCreate {
        server_name: state.pi_instance_name.as_str().to_owned(),
        image_id: state.pi_image_id.as_str().to_owned(),
        processors,
        memory,
        proc_type,
        sys_type,
        networks: networks(state),
        volume_ids: string_set(&state.pi_volume_ids),
        replicants: state.pi_replicants.as_ref_option().copied().unwrap_or(1),
        replicant_naming_scheme: state.pi_replication_scheme.as_str().to_owned(),
        replicant_affinity_policy: state.pi_replication_policy.as_str().to_owned(),
        user_data: owned(&state.pi_user_data),
        key_pair_name: owned(&state.pi_key_pair_name),
        migratable: state.pi_migratable.as_ref_option().copied().unwrap_or(false),
        pin_policy: pin_policy(state),
        virtual_cores: state
            .pi_virtual_cores_assigned
            .as_ref_option()
            .map(|assigned| VirtualCores::assigned(*assigned)),
        storage_type: owned(&state.pi_storage_type),
        storage_pool: owned(&state.pi_storage_pool),
        storage_affinity: storage_affinity(state),
        storage_connection: owned(&state.pi_storage_connection),
        placement_group: owned(&state.pi_placement_group_id),
        shared_processor_pool: owned(&state.pi_shared_processor_pool),
        license_repository_capacity: license_repository_capacity(state),
    })
}

fn license_repository_capacity(state: &InstanceState<'_>) -> Option<i64> {
    state
        .pi_license_repository_capacity
        .as_ref_option()
        .copied()
        .filter(|lrc| *lrc > 0)
}

/// Submit the creation request, through the SAP endpoint when a profile is set
pub(super) async fn create_instances(
    client: &PowerVsClient,
    state: &InstanceState<'_>,
) -> Result<Vec<PvmInstance>> {
    let cloud_instance_id = state.pi_cloud_instance_id.as_str();
    let instances = if non_empty(&state.pi_sap_profile_id).is_some() {
        client
            .sap(cloud_instance_id)
            .create(&sap_body(state))
            .await
            .context("failed to provision")?
    } else {
        let body = pvm_body(state)?;
        if body.license_repository_capacity.is_some() {
            let image = client
                .images(cloud_instance_id)
                .get_any(&body.image_id)
                .await
                .context("image doesn't exist")?;
            let image_type = image.specifications.as_ref().map(|s| s.image_type.as_str());
            if image_type != Some("stock-vtl") {
                bail!("pi_license_repository_capacity should only be used when creating VTL instances");
            }
        }
        client
            .instances(cloud_instance_id)
            .create(&body)
            .await
            .context("failed to provision")?
    };
    if instances.is_empty() {
        bail!("failed to provision: no instance returned");
    }
    Ok(instances)
}
