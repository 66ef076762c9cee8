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
use serde::{Deserialize, Serialize};
use tf_provider::{map, AttributePath, DataSource, Diagnostics};
use tf_provider::schema::{AttributeConstraint, AttributeType, Block, Description, Schema};
use tf_provider::value::{ValueEmpty, ValueSet, ValueString};
use tracing::info;

use crate::client::models::PlacementGroup;
use crate::client::{ClientResult, PlacementGroupClient};
use crate::powervs_provider::ProviderHandle;
use crate::utils::{attribute, value_string, value_string_set, WithSchema};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PlacementGroupDataState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub pi_cloud_instance_id: ValueString<'a>,
    pub pi_placement_group_name: ValueString<'a>,
    pub policy: ValueString<'a>,
    pub members: ValueSet<ValueString<'a>>,
}

impl WithSchema for PlacementGroupDataState<'_> {
    fn schema() -> Schema {
        use AttributeConstraint::{Computed, Required};
        use AttributeType::{Set, String};
        Schema {
            version: 1,
            block: Block {
                version: 1,
                attributes: map! {
                    "id" => attribute(String, Computed, "ID of the placement group"),
                    "pi_cloud_instance_id" => attribute(String, Required, "ID of the PowerVS workspace"),
                    "pi_placement_group_name" => attribute(String, Required, "Name or ID of the placement group"),
                    "policy" => attribute(String, Computed, "Policy of the placement group"),
                    "members" => attribute(Set(String.into()), Computed, "Instances in the placement group"),
                },
                description: Description::plain("Look up an IBM PowerVS placement group"),
                ..Default::default()
            },
        }
    }
}

impl PlacementGroupDataState<'_> {
    fn fill(&mut self, group: &PlacementGroup) {
        self.id = value_string(group.id.as_str());
        self.policy = value_string(group.policy.as_str());
        self.members = value_string_set(group.members.iter().map(String::as_str));
    }
}

async fn find_group(client: &PlacementGroupClient, name_or_id: &str) -> ClientResult<PlacementGroup> {
    match client.get(name_or_id).await {
        Err(err) if err.is_not_found() => client
            .list()
            .await?
            .into_iter()
            .find(|group| group.name == name_or_id)
            .ok_or(err),
        result => result,
    }
}

#[derive(Debug, Default, Clone)]
pub struct PlacementGroupDataSource {
    handle: ProviderHandle,
}

impl PlacementGroupDataSource {
    pub fn new(handle: ProviderHandle) -> Self {
        Self { handle }
    }
}

#[async_trait]
impl DataSource for PlacementGroupDataSource {
    type State<'a> = PlacementGroupDataState<'a>;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(PlacementGroupDataState::schema())
    }

    async fn read<'a>(
        &self,
        diags: &mut Diagnostics,
        config: Self::State<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<Self::State<'a>> {
        let client = self.handle.client(diags).await?;
        let cloud_instance_id = config.pi_cloud_instance_id.as_str().to_owned();
        let name = config.pi_placement_group_name.as_str().to_owned();
        info!(cloud_instance_id = %cloud_instance_id, name = %name, "reading data.ibm_pi_placement_group");

        match find_group(&client.placement_groups(&cloud_instance_id), &name).await {
            Ok(group) => {
                let mut state = config;
                state.fill(&group);
                Some(state)
            }
            Err(err) => {
                diags.error(
                    "Failed to read the placement group",
                    err.to_string(),
                    AttributePath::new("pi_placement_group_name"),
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_outputs() {
        let mut state = PlacementGroupDataState {
            pi_cloud_instance_id: "cloud".into(),
            pi_placement_group_name: "group".into(),
            ..Default::default()
        };
        state.fill(&PlacementGroup {
            id: "pg".into(),
            name: "group".into(),
            policy: "anti-affinity".into(),
            members: vec![],
        });
        assert_eq!(state.id.as_str(), "pg");
        assert_eq!(state.policy.as_str(), "anti-affinity");
        assert_eq!(state.members, value_string_set(Vec::<String>::new()));
        assert_eq!(state.pi_placement_group_name.as_str(), "group");
    }
}
