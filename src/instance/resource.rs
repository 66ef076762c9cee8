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

use async_trait::async_trait;
use futures::future::try_join_all;
use tf_provider::{AttributePath, Diagnostics, Resource};
use tf_provider::schema::Schema;
use tf_provider::value::{Value, ValueEmpty};
use tracing::{info, warn};

use crate::client::models::PvmInstanceUpdate;
use crate::powervs_provider::ProviderHandle;
use crate::timeouts::{DefaultTimeouts, TimeoutsExt};
use crate::utils::{
    changed, split_id, unknown_if_null, value_string, WithNormalize, WithSchema, WithValidate,
};

use super::create::create_instances;
use super::state::{InstanceNetwork, InstanceState, INSTANCE_TIMEOUTS};
use super::update::update_instance;
use super::wait::{wait_available, wait_deleted, DELETED_TIMEOUT};

#[derive(Debug, Default, Clone)]
pub struct InstanceResource {
    handle: ProviderHandle,
}

impl InstanceResource {
    pub fn new(handle: ProviderHandle) -> Self {
        Self { handle }
    }
}

/// Network interfaces as configured: their network and optional fixed address
fn network_layout<'b>(state: &'b InstanceState<'_>) -> Vec<(&'b str, Option<&'b str>)> {
    state
        .pi_network
        .iter()
        .flatten()
        .flatten()
        .map(|network| {
            (
                network.network_id.as_str(),
                network.ip_address.as_deref_option(),
            )
        })
        .collect()
}

/// Attributes whose change forces a new instance
fn replace_triggers(prior: &InstanceState<'_>, proposed: &InstanceState<'_>) -> Vec<AttributePath> {
    changed([
        ("pi_cloud_instance_id", prior.pi_cloud_instance_id != proposed.pi_cloud_instance_id),
        ("pi_image_id", prior.pi_image_id != proposed.pi_image_id),
        ("pi_network", network_layout(prior) != network_layout(proposed)),
        ("pi_volume_ids", prior.pi_volume_ids != proposed.pi_volume_ids),
        ("pi_key_pair_name", prior.pi_key_pair_name != proposed.pi_key_pair_name),
        ("pi_user_data", prior.pi_user_data != proposed.pi_user_data),
        ("pi_sys_type", prior.pi_sys_type != proposed.pi_sys_type),
        ("pi_storage_type", prior.pi_storage_type != proposed.pi_storage_type),
        ("pi_storage_pool", prior.pi_storage_pool != proposed.pi_storage_pool),
        ("pi_storage_connection", prior.pi_storage_connection != proposed.pi_storage_connection),
        ("pi_affinity_policy", prior.pi_affinity_policy != proposed.pi_affinity_policy),
        ("pi_affinity_volume", prior.pi_affinity_volume != proposed.pi_affinity_volume),
        ("pi_affinity_instance", prior.pi_affinity_instance != proposed.pi_affinity_instance),
        ("pi_anti_affinity_volumes", prior.pi_anti_affinity_volumes != proposed.pi_anti_affinity_volumes),
        ("pi_anti_affinity_instances", prior.pi_anti_affinity_instances != proposed.pi_anti_affinity_instances),
        ("pi_replicants", prior.pi_replicants != proposed.pi_replicants),
        ("pi_replication_policy", prior.pi_replication_policy != proposed.pi_replication_policy),
        ("pi_replication_scheme", prior.pi_replication_scheme != proposed.pi_replication_scheme),
        ("pi_pin_policy", prior.pi_pin_policy != proposed.pi_pin_policy),
        ("pi_shared_processor_pool", prior.pi_shared_processor_pool != proposed.pi_shared_processor_pool),
    ])
}

/// Whether an attribute updated in place changed
fn has_update(prior: &InstanceState<'_>, proposed: &InstanceState<'_>) -> bool {
    prior.pi_instance_name != proposed.pi_instance_name
        || prior.pi_proc_type != proposed.pi_proc_type
        || prior.pi_virtual_cores_assigned != proposed.pi_virtual_cores_assigned
        || prior.pi_memory != proposed.pi_memory
        || prior.pi_processors != proposed.pi_processors
        || prior.pi_migratable != proposed.pi_migratable
        || prior.pi_license_repository_capacity != proposed.pi_license_repository_capacity
        || prior.pi_sap_profile_id != proposed.pi_sap_profile_id
        || prior.pi_storage_pool_affinity != proposed.pi_storage_pool_affinity
        || prior.pi_placement_group_id != proposed.pi_placement_group_id
}

fn unknown_if_unset<T, U>(value: &mut Value<T>, config: &Value<U>) {
    if config.is_null() {
        *value = Value::Unknown;
    }
}

/// Mark unknown every optional computed attribute the practitioner left out
fn unknown_unset(state: &mut InstanceState<'_>, config: &InstanceState<'_>) {
    unknown_if_unset(&mut state.pi_proc_type, &config.pi_proc_type);
    unknown_if_unset(&mut state.pi_storage_type, &config.pi_storage_type);
    unknown_if_unset(&mut state.pi_storage_pool, &config.pi_storage_pool);
    unknown_if_unset(&mut state.pi_sys_type, &config.pi_sys_type);
    unknown_if_unset(&mut state.pi_memory, &config.pi_memory);
    unknown_if_unset(&mut state.pi_processors, &config.pi_processors);
    unknown_if_unset(&mut state.pi_migratable, &config.pi_migratable);
    unknown_if_unset(
        &mut state.pi_license_repository_capacity,
        &config.pi_license_repository_capacity,
    );
    unknown_if_unset(
        &mut state.pi_virtual_cores_assigned,
        &config.pi_virtual_cores_assigned,
    );
}

#[async_trait]
impl Resource for InstanceResource {
    type State<'a> = InstanceState<'a>;
    type PrivateState<'a> = ValueEmpty;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(InstanceState::schema())
    }

    async fn validate<'a>(&self, diags: &mut Diagnostics, config: Self::State<'a>) -> Option<()> {
        config.validate(diags, Default::default());
        if diags.errors.is_empty() {
            Some(())
        } else {
            None
        }
    }

    async fn read<'a>(
        &self,
        diags: &mut Diagnostics,
        state: Self::State<'a>,
        private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let client = self.handle.client(diags).await?;
        let ids = match split_id(state.id.as_str(), 2) {
            Ok(ids) => ids,
            Err(err) => {
                diags.root_error("Invalid instance id", err.to_string());
                return None;
            }
        };
        let (cloud_instance_id, instance_id) = (ids[0], ids[1]);
        info!(cloud_instance_id, instance_id, "reading ibm_pi_instance");

        match client.instances(cloud_instance_id).get(instance_id).await {
            Ok(pvm) => {
                let mut state = state.clone();
                state.refresh(cloud_instance_id, &pvm, true);
                Some((state, private_state))
            }
            Err(err) if err.is_not_found() => {
                warn!(cloud_instance_id, instance_id, "instance not found, removing it from state");
                None
            }
            Err(err) => {
                diags.root_error("Failed to read the instance", err.to_string());
                None
            }
        }
    }

    async fn plan_create<'a>(
        &self,
        diags: &mut Diagnostics,
        proposed_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let mut state = proposed_state;
        state.normalize(diags);
        state.id = Value::Unknown;
        state.unknown_computed();
        unknown_if_null(&mut state.pi_memory);
        unknown_if_null(&mut state.pi_processors);
        unknown_if_null(&mut state.pi_proc_type);
        unknown_if_null(&mut state.pi_sys_type);
        unknown_if_null(&mut state.pi_migratable);
        unknown_if_null(&mut state.pi_storage_type);
        unknown_if_null(&mut state.pi_storage_pool);
        unknown_if_null(&mut state.pi_license_repository_capacity);
        unknown_if_null(&mut state.pi_virtual_cores_assigned);
        for network in state.pi_network.iter_mut().flatten().flatten() {
            unknown_if_null(&mut network.ip_address);
            network.mac_address = Value::Unknown;
            network.network_name = Value::Unknown;
            network.network_type = Value::Unknown;
            network.external_ip = Value::Unknown;
        }
        Some((state, Default::default()))
    }

    async fn plan_update<'a>(
        &self,
        diags: &mut Diagnostics,
        prior_state: Self::State<'a>,
        proposed_state: Self::State<'a>,
        config_state: Self::State<'a>,
        prior_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>, Vec<AttributePath>)> {
        let mut state = proposed_state;
        state.normalize(diags);

        let trigger_replace = replace_triggers(&prior_state, &state);
        if trigger_replace.is_empty() && has_update(&prior_state, &state) {
            state.unknown_computed();
            unknown_unset(&mut state, &config_state);
        }

        Some((state, prior_private_state, trigger_replace))
    }

    async fn plan_destroy<'a>(
        &self,
        _diags: &mut Diagnostics,
        _prior_state: Self::State<'a>,
        prior_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<Self::PrivateState<'a>> {
        Some(prior_private_state)
    }

    async fn create<'a>(
        &self,
        diags: &mut Diagnostics,
        planned_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        planned_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let client = self.handle.client(diags).await?;
        let mut state = planned_state;
        let cloud_instance_id = state.pi_cloud_instance_id.as_str().to_owned();
        info!(
            cloud_instance_id = %cloud_instance_id,
            name = state.pi_instance_name.as_str(),
            "creating ibm_pi_instance"
        );

        let created = match create_instances(&client, &state).await {
            Ok(created) => created,
            Err(err) => {
                diags.root_error("Failed to create the instance", format!("{err:#}"));
                return None;
            }
        };
        let instance_id = created[0].pvm_instance_id.clone();
        let instances = client.instances(&cloud_instance_id);
        let timeout = state.timeouts.create_or(&INSTANCE_TIMEOUTS);

        let ready_status = state.ready_status();
        let mut result = try_join_all(created.iter().map(|pvm| {
            wait_available(&instances, &pvm.pvm_instance_id, ready_status, timeout)
        }))
        .await
        .map(|_| ());

        if result.is_ok() && state.pi_storage_pool_affinity == Value::Value(false) {
            let body = PvmInstanceUpdate {
                storage_pool_affinity: Some(false),
                ..Default::default()
            };
            for pvm in &created {
                if let Err(err) = instances.update(&pvm.pvm_instance_id, &body).await {
                    result = Err(err.into());
                    break;
                }
            }
        }

        if let Err(err) = result {
            // The instance exists: keep it in state so that it gets tainted
            diags.root_error("Failed to create the instance", format!("{err:#}"));
            state.refresh(&cloud_instance_id, &created[0], false);
            return Some((state, planned_private_state));
        }

        match instances.get(&instance_id).await {
            Ok(pvm) => state.refresh(&cloud_instance_id, &pvm, false),
            Err(err) => {
                diags.root_error("Failed to read the created instance", err.to_string());
                state.refresh(&cloud_instance_id, &created[0], false);
            }
        }
        Some((state, planned_private_state))
    }

    async fn update<'a>(
        &self,
        diags: &mut Diagnostics,
        prior_state: Self::State<'a>,
        planned_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        planned_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let client = self.handle.client(diags).await?;
        let ids = match split_id(prior_state.id.as_str(), 2) {
            Ok(ids) => ids,
            Err(err) => {
                diags.root_error("Invalid instance id", err.to_string());
                return None;
            }
        };
        let (cloud_instance_id, instance_id) = (ids[0].to_owned(), ids[1].to_owned());
        info!(cloud_instance_id = %cloud_instance_id, instance_id = %instance_id, "updating ibm_pi_instance");

        let timeout = planned_state.timeouts.update_or(&INSTANCE_TIMEOUTS);
        if let Err(err) =
            update_instance(&client, &instance_id, &prior_state, &planned_state, timeout).await
        {
            diags.root_error("Failed to update the instance", format!("{err:#}"));
            return None;
        }

        let mut state = planned_state;
        match client.instances(&cloud_instance_id).get(&instance_id).await {
            Ok(pvm) => {
                state.refresh(&cloud_instance_id, &pvm, false);
                Some((state, planned_private_state))
            }
            Err(err) => {
                diags.root_error("Failed to read the updated instance", err.to_string());
                None
            }
        }
    }

    async fn destroy<'a>(
        &self,
        diags: &mut Diagnostics,
        state: Self::State<'a>,
        _planned_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<()> {
        let client = self.handle.client(diags).await?;
        let ids = match split_id(state.id.as_str(), 2) {
            Ok(ids) => ids,
            Err(err) => {
                diags.root_error("Invalid instance id", err.to_string());
                return None;
            }
        };
        let (cloud_instance_id, instance_id) = (ids[0], ids[1]);
        info!(cloud_instance_id, instance_id, "deleting ibm_pi_instance");

        let instances = client.instances(cloud_instance_id);
        match instances.delete(instance_id).await {
            Ok(()) => (),
            Err(err) if err.is_not_found() => return Some(()),
            Err(err) => {
                diags.root_error("Failed to delete the instance", err.to_string());
                return None;
            }
        }
        let timeout = state.timeouts.delete_or(&DefaultTimeouts {
            delete: DELETED_TIMEOUT,
            ..INSTANCE_TIMEOUTS
        });
        if let Err(err) = wait_deleted(&instances, instance_id, timeout).await {
            diags.root_error("Failed to delete the instance", format!("{err:#}"));
            return None;
        }
        Some(())
    }

    async fn import<'a>(
        &self,
        diags: &mut Diagnostics,
        id: String,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let cloud_instance_id = match split_id(&id, 2) {
            Ok(ids) => ids[0].to_owned(),
            Err(err) => {
                diags.root_error("Invalid import id", err.to_string());
                return None;
            }
        };
        let mut state = InstanceState {
            id: value_string(id),
            pi_cloud_instance_id: value_string(cloud_instance_id),
            ..Default::default()
        };
        state.normalize(diags);
        self.read(diags, state, ValueEmpty::default(), ValueEmpty::default())
            .await
    }
}
