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

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tf_provider::{map, AttributePath, DataSource, Diagnostics};
use tf_provider::schema::{
    Attribute, AttributeConstraint, AttributeType, Block, Description, Schema,
};
use tf_provider::value::{Value, ValueEmpty, ValueList, ValueString};
use tracing::info;

use crate::powervs_provider::ProviderHandle;
use crate::utils::{attribute, value_string, WithSchema};

use super::{nsg_attributes, FlatNsg, NsgMember, NsgRule};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct NsgDataState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub pi_cloud_instance_id: ValueString<'a>,
    pub pi_network_security_group_id: ValueString<'a>,
    pub crn: ValueString<'a>,
    pub name: ValueString<'a>,
    pub user_tags: ValueList<ValueString<'a>>,
    pub members: ValueList<Value<NsgMember<'a>>>,
    pub rules: ValueList<Value<NsgRule<'a>>>,
}

impl WithSchema for NsgDataState<'_> {
    fn schema() -> Schema {
        use AttributeConstraint::{Computed, Required};
        let string = || AttributeType::String;
        let own: HashMap<String, Attribute> = map! {
            "id" => attribute(string(), Computed, "ID of the network security group"),
            "pi_cloud_instance_id" => attribute(string(), Required, "ID of the PowerVS workspace"),
            "pi_network_security_group_id" => attribute(string(), Required, "ID of the network security group"),
        };
        let mut attributes = nsg_attributes();
        attributes.extend(own);
        Schema {
            version: 1,
            block: Block {
                version: 1,
                attributes,
                description: Description::plain("Look up an IBM PowerVS network security group"),
                ..Default::default()
            },
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct NsgDataSource {
    handle: ProviderHandle,
}

impl NsgDataSource {
    pub fn new(handle: ProviderHandle) -> Self {
        Self { handle }
    }
}

#[async_trait]
impl DataSource for NsgDataSource {
    type State<'a> = NsgDataState<'a>;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(NsgDataState::schema())
    }

    async fn read<'a>(
        &self,
        diags: &mut Diagnostics,
        config: Self::State<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<Self::State<'a>> {
        let client = self.handle.client(diags).await?;
        let cloud_instance_id = config.pi_cloud_instance_id.as_str().to_owned();
        let nsg_id = config.pi_network_security_group_id.as_str().to_owned();
        info!(cloud_instance_id = %cloud_instance_id, nsg_id = %nsg_id, "reading data.ibm_pi_network_security_group");

        match client.network_security_groups(&cloud_instance_id).get(&nsg_id).await {
            Ok(nsg) => {
                let flat = FlatNsg::from_api(&nsg);
                Some(NsgDataState {
                    id: value_string(nsg.id.as_str()),
                    crn: flat.crn,
                    name: flat.name,
                    user_tags: flat.user_tags,
                    members: flat.members,
                    rules: flat.rules,
                    ..config
                })
            }
            Err(err) => {
                diags.error(
                    "Failed to read the network security group",
                    err.to_string(),
                    AttributePath::new("pi_network_security_group_id"),
                );
                None
            }
        }
    }
}
