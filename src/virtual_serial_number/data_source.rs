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
use tf_provider::value::{ValueEmpty, ValueString};
use tracing::info;

use crate::client::models::VirtualSerialNumber;
use crate::powervs_provider::ProviderHandle;
use crate::utils::{attribute, value_opt_string, value_string, WithSchema};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct VsnDataState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub pi_cloud_instance_id: ValueString<'a>,
    pub pi_serial: ValueString<'a>,
    pub description: ValueString<'a>,
    pub pvm_instance_id: ValueString<'a>,
    pub software_tier: ValueString<'a>,
}

impl WithSchema for VsnDataState<'_> {
    fn schema() -> Schema {
        use AttributeConstraint::{Computed, Required};
        use AttributeType::String;
        Schema {
            version: 1,
            block: Block {
                version: 1,
                attributes: map! {
                    "id" => attribute(String, Computed, "The virtual serial number"),
                    "pi_cloud_instance_id" => attribute(String, Required, "ID of the PowerVS workspace"),
                    "pi_serial" => attribute(String, Required, "Virtual serial number to look up"),
                    "description" => attribute(String, Computed, "Description of the virtual serial number"),
                    "pvm_instance_id" => attribute(String, Computed, "Instance the virtual serial number is attached to"),
                    "software_tier" => attribute(String, Computed, "Software tier of the virtual serial number"),
                },
                description: Description::plain("Look up an IBM PowerVS virtual serial number"),
                ..Default::default()
            },
        }
    }
}

impl VsnDataState<'_> {
    fn fill(&mut self, vsn: &VirtualSerialNumber) {
        self.id = value_string(vsn.serial.as_str());
        self.description = value_string(vsn.description.as_str());
        self.pvm_instance_id = value_opt_string(vsn.pvm_instance_id.clone());
        self.software_tier = value_opt_string(Some(vsn.software_tier.clone()));
    }
}

#[derive(Debug, Default, Clone)]
pub struct VsnDataSource {
    handle: ProviderHandle,
}

impl VsnDataSource {
    pub fn new(handle: ProviderHandle) -> Self {
        Self { handle }
    }
}

#[async_trait]
impl DataSource for VsnDataSource {
    type State<'a> = VsnDataState<'a>;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(VsnDataState::schema())
    }

    async fn read<'a>(
        &self,
        diags: &mut Diagnostics,
        config: Self::State<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<Self::State<'a>> {
        let client = self.handle.client(diags).await?;
        let cloud_instance_id = config.pi_cloud_instance_id.as_str().to_owned();
        let serial = config.pi_serial.as_str().to_owned();
        info!(cloud_instance_id = %cloud_instance_id, serial = %serial, "reading data.ibm_pi_virtual_serial_number");

        match client
            .virtual_serial_numbers(&cloud_instance_id)
            .get(&serial)
            .await
        {
            Ok(vsn) => {
                let mut state = config;
                state.fill(&vsn);
                Some(state)
            }
            Err(err) => {
                diags.error(
                    "Failed to read the virtual serial number",
                    err.to_string(),
                    AttributePath::new("pi_serial"),
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
    fn unattached_serial_has_no_instance() {
        let mut state = VsnDataState {
            pi_cloud_instance_id: "cloud".into(),
            pi_serial: "ABC1234".into(),
            ..Default::default()
        };
        state.fill(&VirtualSerialNumber {
            serial: "ABC1234".into(),
            description: "spare".into(),
            pvm_instance_id: None,
            software_tier: String::new(),
        });
        assert_eq!(state.id.as_str(), "ABC1234");
        assert_eq!(state.description.as_str(), "spare");
        assert!(state.pvm_instance_id.is_null());
        assert!(state.software_tier.is_null());
    }
}
