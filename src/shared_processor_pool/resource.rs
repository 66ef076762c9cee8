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
use tf_provider::{AttributePath, Diagnostics, Resource};
use tf_provider::schema::Schema;
use tf_provider::value::{Value, ValueEmpty};
use tracing::info;

use crate::client::models::{SharedProcessorPoolCreate, SharedProcessorPoolUpdate};
use crate::client::PowerVsClient;
use crate::powervs_provider::ProviderHandle;
use crate::timeouts::TimeoutsExt;
use crate::utils::{
    changed, join_id, non_empty, split_id, string_list, unknown_if_null, value_string, WithSchema,
    WithValidate,
};

use super::wait::{wait_active, wait_deleted};
use super::{SharedProcessorPoolState, POOL_TIMEOUTS};

/// Groups to leave and groups to join when going from `prior` to `planned`
fn membership_changes(prior: &[String], planned: &[String]) -> (Vec<String>, Vec<String>) {
    let removed = prior
        .iter()
        .filter(|group| !planned.contains(group))
        .cloned()
        .collect();
    let added = planned
        .iter()
        .filter(|group| !prior.contains(group))
        .cloned()
        .collect();
    (removed, added)
}

async fn update_memberships(
    client: &PowerVsClient,
    cloud_instance_id: &str,
    pool_id: &str,
    prior: &[String],
    planned: &[String],
) -> anyhow::Result<()> {
    let groups = client.spp_placement_groups(cloud_instance_id);
    let (removed, added) = membership_changes(prior, planned);
    for group in removed {
        info!(pool_id, group = %group, "removing shared processor pool from SPP placement group");
        groups.remove_member(&group, pool_id).await?;
    }
    for group in added {
        info!(pool_id, group = %group, "adding shared processor pool to SPP placement group");
        groups.add_member(&group, pool_id).await?;
    }
    Ok(())
}

#[derive(Debug, Default, Clone)]
pub struct SharedProcessorPoolResource {
    handle: ProviderHandle,
}

impl SharedProcessorPoolResource {
    pub fn new(handle: ProviderHandle) -> Self {
        Self { handle }
    }
}

#[async_trait]
impl Resource for SharedProcessorPoolResource {
    type State<'a> = SharedProcessorPoolState<'a>;
    type PrivateState<'a> = ValueEmpty;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(SharedProcessorPoolState::schema())
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
                diags.root_error("Invalid shared processor pool id", err.to_string());
                return None;
            }
        };
        let (cloud_instance_id, pool_id) = (ids[0].to_owned(), ids[1].to_owned());
        info!(cloud_instance_id = %cloud_instance_id, pool_id = %pool_id, "reading ibm_pi_shared_processor_pool");

        match client.shared_processor_pools(&cloud_instance_id).get(&pool_id).await {
            Ok(detail) => {
                let mut state = state;
                state.refresh(&cloud_instance_id, &detail, true);
                Some((state, private_state))
            }
            Err(err) if err.is_not_found() => None,
            Err(err) => {
                diags.root_error("Failed to read the shared processor pool", err.to_string());
                None
            }
        }
    }

    async fn plan_create<'a>(
        &self,
        _diags: &mut Diagnostics,
        proposed_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let mut state = proposed_state;
        state.id = Value::Unknown;
        state.shared_processor_pool_id = Value::Unknown;
        state.host_id = Value::Unknown;
        state.unknown_computed();
        unknown_if_null(&mut state.spp_placement_groups);
        Some((state, Default::default()))
    }

    async fn plan_update<'a>(
        &self,
        _diags: &mut Diagnostics,
        prior_state: Self::State<'a>,
        proposed_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        prior_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>, Vec<AttributePath>)> {
        let trigger_replace = changed([
            (
                "pi_cloud_instance_id",
                prior_state.pi_cloud_instance_id != proposed_state.pi_cloud_instance_id,
            ),
            (
                "pi_shared_processor_pool_host_group",
                prior_state.pi_shared_processor_pool_host_group
                    != proposed_state.pi_shared_processor_pool_host_group,
            ),
            (
                "pi_shared_processor_pool_placement_group_id",
                prior_state.pi_shared_processor_pool_placement_group_id
                    != proposed_state.pi_shared_processor_pool_placement_group_id,
            ),
        ]);
        let mut state = proposed_state;
        if trigger_replace.is_empty()
            && (prior_state.pi_shared_processor_pool_name != state.pi_shared_processor_pool_name
                || prior_state.pi_shared_processor_pool_reserved_cores
                    != state.pi_shared_processor_pool_reserved_cores
                || prior_state.spp_placement_groups != state.spp_placement_groups)
        {
            state.unknown_computed();
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
        let pools = client.shared_processor_pools(&cloud_instance_id);
        let body = SharedProcessorPoolCreate {
            name: state.pi_shared_processor_pool_name.as_str().to_owned(),
            host_group: state.pi_shared_processor_pool_host_group.as_str().to_owned(),
            reserved_cores: state
                .pi_shared_processor_pool_reserved_cores
                .as_option()
                .unwrap_or_default(),
            placement_group_id: non_empty(&state.pi_shared_processor_pool_placement_group_id)
                .map(str::to_owned),
        };
        info!(cloud_instance_id = %cloud_instance_id, name = %body.name, "creating ibm_pi_shared_processor_pool");

        let pool = match pools.create(&body).await {
            Ok(pool) => pool,
            Err(err) => {
                diags.root_error("Failed to create the shared processor pool", err.to_string());
                return None;
            }
        };
        state.id = value_string(join_id([cloud_instance_id.as_str(), &pool.id]));
        state.shared_processor_pool_id = value_string(pool.id.as_str());

        let timeout = state.timeouts.create_or(&POOL_TIMEOUTS);
        let mut detail = match wait_active(&pools, &pool.id, timeout).await {
            Ok(detail) => detail,
            Err(err) => {
                // The pool exists: keep it in state so that it gets tainted
                diags.root_error("Failed to create the shared processor pool", format!("{err:#}"));
                state.unknown_computed();
                return Some((fill_unknowns(state), planned_private_state));
            }
        };

        let groups = string_list(&state.spp_placement_groups);
        if !groups.is_empty() {
            if let Err(err) =
                update_memberships(&client, &cloud_instance_id, &pool.id, &[], &groups).await
            {
                diags.root_error(
                    "Failed to add the shared processor pool to its SPP placement groups",
                    format!("{err:#}"),
                );
                state.refresh(&cloud_instance_id, &detail, false);
                return Some((state, planned_private_state));
            }
            match pools.get(&pool.id).await {
                Ok(refreshed) => detail = refreshed,
                Err(err) => diags.root_warning(
                    "Failed to read the created shared processor pool",
                    err.to_string(),
                ),
            }
        }

        state.refresh(&cloud_instance_id, &detail, false);
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
                diags.root_error("Invalid shared processor pool id", err.to_string());
                return None;
            }
        };
        let (cloud_instance_id, pool_id) = (ids[0].to_owned(), ids[1].to_owned());
        info!(cloud_instance_id = %cloud_instance_id, pool_id = %pool_id, "updating ibm_pi_shared_processor_pool");
        let pools = client.shared_processor_pools(&cloud_instance_id);

        let body = SharedProcessorPoolUpdate {
            name: (prior_state.pi_shared_processor_pool_name
                != planned_state.pi_shared_processor_pool_name)
                .then(|| planned_state.pi_shared_processor_pool_name.as_str().to_owned()),
            reserved_cores: (prior_state.pi_shared_processor_pool_reserved_cores
                != planned_state.pi_shared_processor_pool_reserved_cores)
                .then(|| planned_state.pi_shared_processor_pool_reserved_cores.as_option())
                .flatten(),
        };
        if body.name.is_some() || body.reserved_cores.is_some() {
            let timeout = planned_state.timeouts.update_or(&POOL_TIMEOUTS);
            let result = match pools.update(&pool_id, &body).await {
                Ok(_) => wait_active(&pools, &pool_id, timeout).await.map(|_| ()),
                Err(err) => Err(err.into()),
            };
            if let Err(err) = result {
                diags.root_error("Failed to update the shared processor pool", format!("{err:#}"));
                return None;
            }
        }

        if planned_state.spp_placement_groups.is_value() {
            let prior = string_list(&prior_state.spp_placement_groups);
            let planned = string_list(&planned_state.spp_placement_groups);
            if let Err(err) =
                update_memberships(&client, &cloud_instance_id, &pool_id, &prior, &planned).await
            {
                diags.root_error(
                    "Failed to update the SPP placement groups of the shared processor pool",
                    format!("{err:#}"),
                );
                return None;
            }
        }

        let mut state = planned_state;
        match pools.get(&pool_id).await {
            Ok(detail) => {
                state.refresh(&cloud_instance_id, &detail, false);
                Some((state, planned_private_state))
            }
            Err(err) => {
                diags.root_error("Failed to read the updated shared processor pool", err.to_string());
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
                diags.root_error("Invalid shared processor pool id", err.to_string());
                return None;
            }
        };
        let (cloud_instance_id, pool_id) = (ids[0], ids[1]);
        info!(cloud_instance_id, pool_id, "deleting ibm_pi_shared_processor_pool");

        let pools = client.shared_processor_pools(cloud_instance_id);
        match pools.delete(pool_id).await {
            Ok(()) => (),
            Err(err) if err.is_not_found() => return Some(()),
            Err(err) => {
                diags.root_error("Failed to delete the shared processor pool", err.to_string());
                return None;
            }
        }
        let timeout = state.timeouts.delete_or(&POOL_TIMEOUTS);
        if let Err(err) = wait_deleted(&pools, pool_id, timeout).await {
            diags.root_error("Failed to delete the shared processor pool", format!("{err:#}"));
            return None;
        }
        Some(())
    }

    async fn import<'a>(
        &self,
        diags: &mut Diagnostics,
        id: String,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let state = SharedProcessorPoolState {
            id: value_string(id),
            ..Default::default()
        };
        self.read(diags, state, ValueEmpty::default(), ValueEmpty::default())
            .await
    }
}

/// Unknown values cannot be stored: null the ones the API did not report
fn fill_unknowns(mut state: SharedProcessorPoolState<'_>) -> SharedProcessorPoolState<'_> {
    fn null_unknown<T>(value: &mut Value<T>) {
        if value.is_unknown() {
            *value = Value::Null;
        }
    }
    null_unknown(&mut state.spp_placement_groups);
    null_unknown(&mut state.status);
    null_unknown(&mut state.status_detail);
    null_unknown(&mut state.allocated_cores);
    null_unknown(&mut state.available_cores);
    null_unknown(&mut state.host_id);
    null_unknown(&mut state.instances);
    state
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prior() -> SharedProcessorPoolState<'static> {
        let mut state = SharedProcessorPoolState {
            id: Value::from("cloud/pool"),
            pi_cloud_instance_id: Value::from("cloud"),
            pi_shared_processor_pool_name: Value::from("pool"),
            pi_shared_processor_pool_host_group: Value::from("s922"),
            pi_shared_processor_pool_reserved_cores: Value::Value(2),
            ..Default::default()
        };
        state.refresh("cloud", &super::super::tests::detail(), false);
        state
    }

    #[test]
    fn membership_diff() {
        let (removed, added) = membership_changes(
            &["a".to_owned(), "b".to_owned()],
            &["b".to_owned(), "c".to_owned()],
        );
        assert_eq!(removed, vec!["a".to_owned()]);
        assert_eq!(added, vec!["c".to_owned()]);
    }

    #[tokio::test]
    async fn host_group_forces_replacement() {
        let resource = SharedProcessorPoolResource::default();
        let mut diags = Diagnostics::default();
        let mut proposed = prior();
        proposed.pi_shared_processor_pool_host_group = Value::from("e980");
        let (_, _, replace) = resource
            .plan_update(
                &mut diags,
                prior(),
                proposed.clone(),
                proposed,
                ValueEmpty::default(),
                ValueEmpty::default(),
            )
            .await
            .unwrap();
        assert_eq!(
            replace,
            vec![AttributePath::new("pi_shared_processor_pool_host_group")]
        );
    }

    #[tokio::test]
    async fn reserved_cores_update_in_place() {
        let resource = SharedProcessorPoolResource::default();
        let mut diags = Diagnostics::default();
        let mut proposed = prior();
        proposed.pi_shared_processor_pool_reserved_cores = Value::Value(4);
        let (planned, _, replace) = resource
            .plan_update(
                &mut diags,
                prior(),
                proposed.clone(),
                proposed,
                ValueEmpty::default(),
                ValueEmpty::default(),
            )
            .await
            .unwrap();
        assert!(replace.is_empty());
        assert!(planned.available_cores.is_unknown());
        assert_eq!(planned.shared_processor_pool_id.as_str(), "pool");
    }

    #[test]
    fn unknowns_are_nulled_after_failure() {
        let mut state = prior();
        state.unknown_computed();
        let state = fill_unknowns(state);
        assert!(state.status.is_null());
        assert!(state.instances.is_null());
        assert_eq!(state.pi_shared_processor_pool_name.as_str(), "pool");
    }
}
