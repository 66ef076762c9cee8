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
use tf_provider::value::{Value, ValueEmpty, ValueList, ValueNumber, ValueString};
use tracing::info;

use crate::client::models::PvmInstance;
use crate::client::{ClientResult, InstanceClient};
use crate::powervs_provider::ProviderHandle;
use crate::utils::{attribute, join_id, value_opt_string, value_string, WithSchema, WithValidate};

use super::state::InstanceNetwork;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct InstanceDataState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub pi_cloud_instance_id: ValueString<'a>,
    pub pi_instance_name: ValueString<'a>,

    pub instance_id: ValueString<'a>,
    pub server_name: ValueString<'a>,
    pub image_id: ValueString<'a>,
    pub status: ValueString<'a>,
    pub health_status: ValueString<'a>,
    pub memory: Value<f64>,
    pub processors: Value<f64>,
    pub proc_type: ValueString<'a>,
    pub sys_type: ValueString<'a>,
    pub min_processors: Value<f64>,
    pub max_processors: Value<f64>,
    pub min_memory: Value<f64>,
    pub max_memory: Value<f64>,
    pub virtual_cores_assigned: ValueNumber,
    pub min_virtual_cores: ValueNumber,
    pub max_virtual_cores: ValueNumber,
    pub pin_policy: ValueString<'a>,
    pub storage_type: ValueString<'a>,
    pub storage_pool: ValueString<'a>,
    pub storage_pool_affinity: Value<bool>,
    pub placement_group_id: ValueString<'a>,
    pub shared_processor_pool: ValueString<'a>,
    pub shared_processor_pool_id: ValueString<'a>,
    pub license_repository_capacity: ValueNumber,
    pub operating_system: ValueString<'a>,
    pub os_type: ValueString<'a>,
    pub networks: ValueList<Value<InstanceNetwork<'a>>>,
}

impl WithSchema for InstanceDataState<'_> {
    fn schema() -> Schema {
        use AttributeConstraint::{Computed, Required};
        use AttributeType::{Bool, Number, String};
        Schema {
            version: 1,
            block: Block {
                version: 1,
                attributes: map! {
                    "id" => attribute(String, Computed, "`<cloud_instance_id>/<pvm_instance_id>`"),
                    "pi_cloud_instance_id" => attribute(String, Required, "ID of the PowerVS workspace"),
                    "pi_instance_name" => attribute(String, Required, "Name or ID of the instance"),
                    "instance_id" => attribute(String, Computed, "ID of the instance"),
                    "server_name" => attribute(String, Computed, "Name of the instance"),
                    "image_id" => attribute(String, Computed, "Image the instance was deployed from"),
                    "status" => attribute(String, Computed, "Status of the instance"),
                    "health_status" => attribute(String, Computed, "Health status of the instance"),
                    "memory" => attribute(Number, Computed, "Memory in GB"),
                    "processors" => attribute(Number, Computed, "Number of processors"),
                    "proc_type" => attribute(String, Computed, "Processor type"),
                    "sys_type" => attribute(String, Computed, "System type"),
                    "min_processors" => attribute(Number, Computed, "Minimum number of processors"),
                    "max_processors" => attribute(Number, Computed, "Maximum number of processors"),
                    "min_memory" => attribute(Number, Computed, "Minimum memory"),
                    "max_memory" => attribute(Number, Computed, "Maximum memory"),
                    "virtual_cores_assigned" => attribute(Number, Computed, "Assigned virtual cores"),
                    "min_virtual_cores" => attribute(Number, Computed, "Minimum number of virtual cores"),
                    "max_virtual_cores" => attribute(Number, Computed, "Maximum number of virtual cores"),
                    "pin_policy" => attribute(String, Computed, "Pin policy"),
                    "storage_type" => attribute(String, Computed, "Storage type of the boot volume"),
                    "storage_pool" => attribute(String, Computed, "Storage pool of the boot volume"),
                    "storage_pool_affinity" => attribute(Bool, Computed, "Whether attached volumes must share the storage pool"),
                    "placement_group_id" => attribute(String, Computed, "Placement group of the instance"),
                    "shared_processor_pool" => attribute(String, Computed, "Shared processor pool name"),
                    "shared_processor_pool_id" => attribute(String, Computed, "Shared processor pool ID"),
                    "license_repository_capacity" => attribute(Number, Computed, "VTL license repository capacity"),
                    "operating_system" => attribute(String, Computed, "Operating system"),
                    "os_type" => attribute(String, Computed, "Operating system type"),
                    "networks" => attribute(
                        AttributeType::AttributeList(map! {
                            "network_id" => attribute(String, Computed, "ID of the network"),
                            "ip_address" => attribute(String, Computed, "IP address"),
                            "mac_address" => attribute(String, Computed, "MAC address"),
                            "network_name" => attribute(String, Computed, "Name of the network"),
                            "type" => attribute(String, Computed, "Type of the network"),
                            "external_ip" => attribute(String, Computed, "External IP address"),
                        }),
                        Computed,
                        "Network interfaces of the instance",
                    ),
                },
                description: Description::plain("Look up an IBM PowerVS instance"),
                ..Default::default()
            },
        }
    }
}

impl WithValidate for InstanceDataState<'_> {
    fn validate(&self, diags: &mut Diagnostics, attr_path: AttributePath) {
        if let Value::Value(name) = &self.pi_instance_name {
            if name.is_empty() {
                diags.error_short(
                    "`pi_instance_name` must not be empty",
                    attr_path.attribute("pi_instance_name"),
                );
            }
        }
    }
}

impl InstanceDataState<'_> {
    pub(crate) fn fill(&mut self, cloud_instance_id: &str, pvm: &PvmInstance) {
        let opt = |s: &str| value_opt_string(Some(s.to_owned()));
        self.id = value_string(join_id([cloud_instance_id, &pvm.pvm_instance_id]));
        self.instance_id = value_string(pvm.pvm_instance_id.as_str());
        self.server_name = opt(&pvm.server_name);
        self.image_id = opt(&pvm.image_id);
        self.status = opt(&pvm.status);
        self.health_status = opt(pvm.health_status());
        self.memory = Value::Value(pvm.memory);
        self.processors = Value::Value(pvm.processors);
        self.proc_type = opt(&pvm.proc_type);
        self.sys_type = opt(&pvm.sys_type);
        self.min_processors = Value::Value(pvm.minproc);
        self.max_processors = Value::Value(pvm.maxproc);
        self.min_memory = Value::Value(pvm.minmem);
        self.max_memory = Value::Value(pvm.maxmem);
        let cores = pvm.virtual_cores.as_ref();
        self.virtual_cores_assigned = cores.map(|c| c.assigned).into();
        self.min_virtual_cores = cores.and_then(|c| c.min).into();
        self.max_virtual_cores = cores.and_then(|c| c.max).into();
        self.pin_policy = opt(&pvm.pin_policy);
        self.storage_type = value_opt_string(pvm.storage_type.clone());
        self.storage_pool = opt(&pvm.storage_pool);
        self.storage_pool_affinity = pvm.storage_pool_affinity.into();
        self.placement_group_id = value_opt_string(
            pvm.placement_group
                .clone()
                .filter(|group| group != "none"),
        );
        self.shared_processor_pool = opt(&pvm.shared_processor_pool);
        self.shared_processor_pool_id = opt(&pvm.shared_processor_pool_id);
        self.license_repository_capacity = Value::Value(pvm.license_repository_capacity);
        self.operating_system = opt(&pvm.operating_system);
        self.os_type = value_opt_string(pvm.os_type.clone());
        self.networks = Value::Value(
            pvm.networks
                .iter()
                .map(|network| {
                    Value::Value(InstanceNetwork {
                        network_id: opt(&network.network_id),
                        ip_address: opt(&network.ip_address),
                        mac_address: opt(&network.mac_address),
                        network_name: opt(&network.network_name),
                        network_type: opt(&network.network_type),
                        external_ip: opt(&network.external_ip),
                    })
                })
                .collect(),
        );
    }
}

/// Look an instance up by ID, then by name
pub(crate) async fn find_instance(client: &InstanceClient, name_or_id: &str) -> ClientResult<PvmInstance> {
    match client.get(name_or_id).await {
        Err(err) if err.is_not_found() => {
            let instances = client.list().await?;
            match instances.into_iter().find(|pvm| pvm.server_name == name_or_id) {
                Some(pvm) => client.get(&pvm.pvm_instance_id).await,
                None => Err(err),
            }
        }
        result => result,
    }
}

#[derive(Debug, Default, Clone)]
pub struct InstanceDataSource {
    handle: ProviderHandle,
}

impl InstanceDataSource {
    pub fn new(handle: ProviderHandle) -> Self {
        Self { handle }
    }
}

#[async_trait]
impl DataSource for InstanceDataSource {
    type State<'a> = InstanceDataState<'a>;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(InstanceDataState::schema())
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
        config: Self::State<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<Self::State<'a>> {
        let client = self.handle.client(diags).await?;
        let cloud_instance_id = config.pi_cloud_instance_id.as_str().to_owned();
        let name = config.pi_instance_name.as_str().to_owned();
        info!(cloud_instance_id = %cloud_instance_id, name = %name, "reading data.ibm_pi_instance");

        match find_instance(&client.instances(&cloud_instance_id), &name).await {
            Ok(pvm) => {
                let mut state = config;
                state.fill(&cloud_instance_id, &pvm);
                Some(state)
            }
            Err(err) => {
                diags.error(
                    "Failed to read the instance",
                    err.to_string(),
                    AttributePath::new("pi_instance_name"),
                );
                None
            }
        }
    }
}
