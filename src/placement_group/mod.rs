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

//! `ibm_pi_placement_group` resource and data source

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tf_provider::{map, AttributePath, Diagnostics, Resource};
use tf_provider::schema::{AttributeConstraint, AttributeType, Block, Description, Schema};
use tf_provider::value::{Value, ValueEmpty, ValueSet, ValueString};
use tracing::{info, warn};

use crate::client::models::{PlacementGroup, PlacementGroupCreate};
use crate::powervs_provider::ProviderHandle;
use crate::utils::{
    attribute, changed, join_id, split_id, validate_one_of, value_string, value_string_set,
    WithSchema, WithValidate,
};

mod data_source;

pub use data_source::PlacementGroupDataSource;

pub const POLICIES: &[&str] = &["affinity", "anti-affinity"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PlacementGroupState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub pi_cloud_instance_id: ValueString<'a>,
    pub pi_placement_group_name: ValueString<'a>,
    pub pi_placement_group_policy: ValueString<'a>,
    pub placement_group_id: ValueString<'a>,
    pub members: ValueSet<ValueString<'a>>,
}

impl WithSchema for PlacementGroupState<'_> {
    fn schema() -> Schema {
        use AttributeConstraint::{Computed, Required};
        use AttributeType::{Set, String};
        Schema {
            version: 1,
            block: Block {
                version: 1,
                attributes: map! {
                    "id" => attribute(String, Computed, "`<cloud_instance_id>/<placement_group_id>`"),
                    "pi_cloud_instance_id" => attribute(String, Required, "ID of the PowerVS workspace"),
                    "pi_placement_group_name" => attribute(String, Required, "Name of the placement group"),
                    "pi_placement_group_policy" => attribute(String, Required, "Policy of the placement group: affinity or anti-affinity"),
                    "placement_group_id" => attribute(String, Computed, "ID of the placement group"),
                    "members" => attribute(Set(String.into()), Computed, "Instances in the placement group"),
                },
                description: Description::plain("IBM PowerVS placement group of instances"),
                ..Default::default()
            },
        }
    }
}

impl WithValidate for PlacementGroupState<'_> {
    fn validate(&self, diags: &mut Diagnostics, attr_path: AttributePath) {
        validate_one_of(
            diags,
            &self.pi_placement_group_policy,
            POLICIES,
            attr_path.attribute("pi_placement_group_policy"),
        );
    }
}

impl PlacementGroupState<'_> {
    fn refresh(&mut self, cloud_instance_id: &str, group: &PlacementGroup) {
        self.id = value_string(join_id([cloud_instance_id, &group.id]));
        self.pi_cloud_instance_id = value_string(cloud_instance_id);
        self.pi_placement_group_name = value_string(group.name.as_str());
        self.pi_placement_group_policy = value_string(group.policy.as_str());
        self.placement_group_id = value_string(group.id.as_str());
        self.members = value_string_set(group.members.iter().map(String::as_str));
    }
}

#[derive(Debug, Default, Clone)]
pub struct PlacementGroupResource {
    handle: ProviderHandle,
}

impl PlacementGroupResource {
    pub fn new(handle: ProviderHandle) -> Self {
        Self { handle }
    }
}

#[async_trait]
impl Resource for PlacementGroupResource {
    type State<'a> = PlacementGroupState<'a>;
    type PrivateState<'a> = ValueEmpty;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(PlacementGroupState::schema())
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
                diags.root_error("Invalid placement group id", err.to_string());
                return None;
            }
        };
        let (cloud_instance_id, group_id) = (ids[0].to_owned(), ids[1].to_owned());
        info!(cloud_instance_id = %cloud_instance_id, group_id = %group_id, "reading ibm_pi_placement_group");

        match client.placement_groups(&cloud_instance_id).get(&group_id).await {
            Ok(group) => {
                let mut state = state;
                state.refresh(&cloud_instance_id, &group);
                Some((state, private_state))
            }
            Err(err) if err.is_not_found() => {
                warn!(cloud_instance_id = %cloud_instance_id, group_id = %group_id, "placement group not found, removing it from state");
                None
            }
            Err(err) => {
                diags.root_error("Failed to read the placement group", err.to_string());
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
        state.placement_group_id = Value::Unknown;
        state.members = Value::Unknown;
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
                "pi_placement_group_name",
                prior_state.pi_placement_group_name != proposed_state.pi_placement_group_name,
            ),
            (
                "pi_placement_group_policy",
                prior_state.pi_placement_group_policy != proposed_state.pi_placement_group_policy,
            ),
        ]);
        Some((proposed_state, prior_private_state, trigger_replace))
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
        let cloud_instance_id = planned_state.pi_cloud_instance_id.as_str().to_owned();
        let groups = client.placement_groups(&cloud_instance_id);
        let body = PlacementGroupCreate {
            name: planned_state.pi_placement_group_name.as_str().to_owned(),
            policy: planned_state.pi_placement_group_policy.as_str().to_owned(),
        };
        info!(cloud_instance_id = %cloud_instance_id, name = %body.name, "creating ibm_pi_placement_group");

        let created = match groups.create(&body).await {
            Ok(group) => group,
            Err(err) => {
                diags.root_error("Failed to create the placement group", err.to_string());
                return None;
            }
        };
        let group = match groups.get(&created.id).await {
            Ok(group) => group,
            Err(err) => {
                diags.root_warning("Failed to read the created placement group", err.to_string());
                created
            }
        };
        let mut state = planned_state;
        state.refresh(&cloud_instance_id, &group);
        Some((state, planned_private_state))
    }

    async fn update<'a>(
        &self,
        _diags: &mut Diagnostics,
        _prior_state: Self::State<'a>,
        planned_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        planned_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        Some((planned_state, planned_private_state))
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
                diags.root_error("Invalid placement group id", err.to_string());
                return None;
            }
        };
        info!(cloud_instance_id = ids[0], group_id = ids[1], "deleting ibm_pi_placement_group");
        match client.placement_groups(ids[0]).delete(ids[1]).await {
            Ok(()) => Some(()),
            Err(err) if err.is_not_found() => Some(()),
            Err(err) => {
                diags.root_error("Failed to delete the placement group", err.to_string());
                None
            }
        }
    }

    async fn import<'a>(
        &self,
        diags: &mut Diagnostics,
        id: String,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let state = PlacementGroupState {
            id: value_string(id),
            ..Default::default()
        };
        self.read(diags, state, ValueEmpty::default(), ValueEmpty::default())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(name: &str, policy: &str) -> PlacementGroupState<'static> {
        PlacementGroupState {
            id: Value::from("cloud/pg"),
            pi_cloud_instance_id: Value::from("cloud"),
            pi_placement_group_name: value_string(name),
            pi_placement_group_policy: value_string(policy),
            placement_group_id: Value::from("pg"),
            members: value_string_set(["pvm-1"]),
        }
    }

    #[test]
    fn refresh_from_api() {
        let mut state = PlacementGroupState::default();
        state.refresh(
            "cloud",
            &PlacementGroup {
                id: "pg".into(),
                name: "group".into(),
                policy: "affinity".into(),
                members: vec!["pvm-2".into(), "pvm-1".into()],
            },
        );
        assert_eq!(state, {
            let mut expected = state_fixture();
            expected.members = value_string_set(["pvm-1", "pvm-2"]);
            expected
        });
    }

    fn state_fixture() -> PlacementGroupState<'static> {
        state("group", "affinity")
    }

    #[tokio::test]
    async fn every_argument_forces_replacement() {
        let resource = PlacementGroupResource::default();
        let mut diags = Diagnostics::default();
        let (_, _, replace) = resource
            .plan_update(
                &mut diags,
                state("group", "affinity"),
                state("group", "anti-affinity"),
                state("group", "anti-affinity"),
                ValueEmpty::default(),
                ValueEmpty::default(),
            )
            .await
            .unwrap();
        assert_eq!(replace, vec![AttributePath::new("pi_placement_group_policy")]);
    }

    #[test]
    fn rejects_unknown_policy() {
        let mut diags = Diagnostics::default();
        state("group", "spread").validate(&mut diags, AttributePath::default());
        assert_eq!(diags.errors.len(), 1);
    }
}
