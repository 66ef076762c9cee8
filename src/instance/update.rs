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

use std::time::Duration;

use anyhow::{bail, Context, Result};
use tf_provider::value::Value;
use tracing::{debug, info};

use crate::client::models::{PvmInstanceUpdate, VirtualCores};
use crate::client::PowerVsClient;
use crate::utils::non_empty;

use super::state::InstanceState;
use super::wait::{start, stop, wait_available, wait_resized, wait_stopped};

const CUSTOM_VIRTUAL_CORES: &str = "custom-virtualcores";

fn differs<T: PartialEq>(prior: &Value<T>, planned: &Value<T>) -> bool {
    planned.is_value() && prior != planned
}

/// Planned value, or the prior one when the plan leaves it to the API
fn effective<T: Copy + Default>(prior: &Value<T>, planned: &Value<T>) -> T {
    planned
        .as_ref_option()
        .or(prior.as_ref_option())
        .copied()
        .unwrap_or_default()
}

/// Apply the in-place changes between two states, in dependency order
pub(super) async fn update_instance(
    client: &PowerVsClient,
    instance_id: &str,
    prior: &InstanceState<'_>,
    planned: &InstanceState<'_>,
    timeout: Duration,
) -> Result<()> {
    if prior.health_status.as_str() == "WARNING" {
        bail!("the operation cannot be performed when the lpar health in the WARNING State");
    }

    let cloud_instance_id = planned.pi_cloud_instance_id.as_str();
    let instances = client.instances(cloud_instance_id);
    let cores_enabled = client
        .cloud_instance(cloud_instance_id)
        .has_capability(CUSTOM_VIRTUAL_CORES)
        .await?;
    debug!(instance_id, cores_enabled, "virtual cores capability");
    let assigned_cores = planned
        .pi_virtual_cores_assigned
        .as_ref_option()
        .map(|assigned| VirtualCores::assigned(*assigned));
    let shut_off = prior.status.as_str() == "SHUTOFF";

    if differs(&prior.pi_instance_name, &planned.pi_instance_name) {
        info!(instance_id, name = planned.pi_instance_name.as_str(), "renaming instance");
        let body = PvmInstanceUpdate {
            server_name: Some(planned.pi_instance_name.as_str().to_owned()),
            ..Default::default()
        };
        instances
            .update(instance_id, &body)
            .await
            .context("failed to update the lpar with the change for name")?;
        wait_available(&instances, instance_id, "OK", timeout).await?;
    }

    if differs(&prior.pi_proc_type, &planned.pi_proc_type) {
        info!(instance_id, "changing the processor type");
        if !shut_off {
            stop(&instances, instance_id).await?;
        }
        let body = PvmInstanceUpdate {
            proc_type: Some(planned.pi_proc_type.as_str().to_owned()),
            virtual_cores: assigned_cores.clone().filter(|_| cores_enabled),
            ..Default::default()
        };
        instances.update(instance_id, &body).await?;
        wait_stopped(&instances, instance_id).await?;
        start(&instances, instance_id).await?;
    }

    if differs(
        &prior.pi_virtual_cores_assigned,
        &planned.pi_virtual_cores_assigned,
    ) {
        info!(instance_id, "changing the assigned virtual cores");
        let body = PvmInstanceUpdate {
            virtual_cores: assigned_cores.clone(),
            ..Default::default()
        };
        instances
            .update(instance_id, &body)
            .await
            .context("failed to update the lpar with the change for virtual cores")?;
        wait_available(&instances, instance_id, "OK", timeout).await?;
    }

    if differs(&prior.pi_memory, &planned.pi_memory)
        || differs(&prior.pi_processors, &planned.pi_processors)
        || differs(&prior.pi_migratable, &planned.pi_migratable)
    {
        let memory = effective(&prior.pi_memory, &planned.pi_memory);
        let processors = effective(&prior.pi_processors, &planned.pi_processors);
        let max_memory = prior.max_memory.as_ref_option().copied().unwrap_or_default();
        let max_processors = prior
            .max_processors
            .as_ref_option()
            .copied()
            .unwrap_or_default();

        if memory > max_memory || processors > max_processors {
            info!(instance_id, memory, processors, "resizing beyond the current maximum requires a shutdown");
            stop(&instances, instance_id).await?;
            let body = PvmInstanceUpdate {
                memory: Some(memory),
                processors: Some(processors),
                ..Default::default()
            };
            instances
                .update(instance_id, &body)
                .await
                .context("failed to update the lpar with the change")?;
            wait_resized(&instances, instance_id)
                .await
                .context("failed to get an update from the Service after the resource change")?;
            start(&instances, instance_id).await?;
        } else {
            info!(instance_id, memory, processors, "resizing instance");
            let body = PvmInstanceUpdate {
                memory: Some(memory),
                processors: Some(processors),
                migratable: planned.pi_migratable.as_ref_option().copied(),
                virtual_cores: assigned_cores.clone().filter(|_| cores_enabled),
                ..Default::default()
            };
            instances
                .update(instance_id, &body)
                .await
                .context("failed to update the lpar with the change")?;
            wait_available(&instances, instance_id, "OK", timeout).await?;
        }
    }

    if differs(
        &prior.pi_license_repository_capacity,
        &planned.pi_license_repository_capacity,
    ) {
        let body = PvmInstanceUpdate {
            license_repository_capacity: planned.pi_license_repository_capacity.as_ref_option().copied(),
            ..Default::default()
        };
        instances
            .update(instance_id, &body)
            .await
            .context("failed to update the lpar with the change for license repository capacity")?;
        wait_available(&instances, instance_id, "OK", timeout).await?;
    }

    if prior.pi_sap_profile_id != planned.pi_sap_profile_id {
        if let Some(profile_id) = non_empty(&planned.pi_sap_profile_id) {
            info!(instance_id, profile_id, "changing the SAP profile");
            if !shut_off {
                stop(&instances, instance_id).await?;
            }
            let body = PvmInstanceUpdate {
                sap_profile_id: Some(profile_id.to_owned()),
                ..Default::default()
            };
            instances
                .update(instance_id, &body)
                .await
                .context("failed to update the lpar with the change for sap profile")?;
            wait_stopped(&instances, instance_id).await?;
            start(&instances, instance_id).await?;
        }
    }

    if differs(&prior.pi_storage_pool_affinity, &planned.pi_storage_pool_affinity) {
        let body = PvmInstanceUpdate {
            storage_pool_affinity: planned.pi_storage_pool_affinity.as_ref_option().copied(),
            ..Default::default()
        };
        instances.update(instance_id, &body).await?;
    }

    if prior.pi_placement_group_id != planned.pi_placement_group_id {
        let groups = client.placement_groups(cloud_instance_id);
        if let Some(old) = non_empty(&prior.pi_placement_group_id).map(str::trim) {
            if !old.is_empty() {
                match groups.remove_member(old, instance_id).await {
                    Err(err) if err.to_string().contains("is not part of placement-group") => {
                        debug!(instance_id, group = old, "instance already out of the placement group")
                    }
                    result => result?,
                }
            }
        }
        if let Some(new) = non_empty(&planned.pi_placement_group_id).map(str::trim) {
            if !new.is_empty() {
                groups.add_member(new, instance_id).await?;
            }
        }
    }

    Ok(())
}
