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

use serde::{Deserialize, Serialize};

use tf_provider::{map, value, Diagnostics};
use tf_provider::schema::{
    AttributeConstraint, AttributeType, Block, Description, NestedBlock, Schema,
};
use tf_provider::value::{Value, ValueList, ValueNumber, ValueSet, ValueString};

use crate::client::models::PvmInstance;
use crate::timeouts::{DefaultTimeouts, Timeouts};
use crate::utils::{
    attribute, default_if_null, join_id, set_value, value_opt_string, value_string,
    WithNormalize, WithSchema,
};

pub const INSTANCE_TIMEOUTS: DefaultTimeouts = DefaultTimeouts {
    create: Duration::from_secs(120 * 60),
    update: Duration::from_secs(60 * 60),
    delete: Duration::from_secs(60 * 60),
};

pub const PROC_TYPES: &[&str] = &["dedicated", "shared", "capped"];
pub const AFFINITY_POLICIES: &[&str] = &["affinity", "anti-affinity"];
pub const REPLICATION_POLICIES: &[&str] = &["affinity", "anti-affinity", "none"];
pub const REPLICATION_SCHEMES: &[&str] = &["prefix", "suffix"];
pub const PIN_POLICIES: &[&str] = &["none", "soft", "hard"];
pub const HEALTH_STATUSES: &[&str] = &["OK", "WARNING"];
pub const STORAGE_CONNECTIONS: &[&str] = &["vSCSI"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct InstanceState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub pi_cloud_instance_id: ValueString<'a>,
    pub pi_image_id: ValueString<'a>,
    pub pi_instance_name: ValueString<'a>,
    pub pi_network: ValueList<Value<InstanceNetwork<'a>>>,

    pub pi_memory: Value<f64>,
    pub pi_processors: Value<f64>,
    pub pi_proc_type: ValueString<'a>,
    pub pi_sys_type: ValueString<'a>,
    pub pi_migratable: Value<bool>,
    pub pi_key_pair_name: ValueString<'a>,
    pub pi_user_data: ValueString<'a>,
    pub pi_volume_ids: ValueSet<ValueString<'a>>,
    pub pi_storage_type: ValueString<'a>,
    pub pi_storage_pool: ValueString<'a>,
    pub pi_storage_connection: ValueString<'a>,
    pub pi_storage_pool_affinity: Value<bool>,
    pub pi_placement_group_id: ValueString<'a>,
    pub pi_shared_processor_pool: ValueString<'a>,
    pub pi_sap_profile_id: ValueString<'a>,
    pub pi_license_repository_capacity: ValueNumber,
    pub pi_virtual_cores_assigned: ValueNumber,

    pub pi_affinity_policy: ValueString<'a>,
    pub pi_affinity_volume: ValueString<'a>,
    pub pi_affinity_instance: ValueString<'a>,
    pub pi_anti_affinity_volumes: ValueList<ValueString<'a>>,
    pub pi_anti_affinity_instances: ValueList<ValueString<'a>>,

    pub pi_replicants: ValueNumber,
    pub pi_replication_policy: ValueString<'a>,
    pub pi_replication_scheme: ValueString<'a>,
    pub pi_pin_policy: ValueString<'a>,
    pub pi_health_status: ValueString<'a>,

    pub instance_id: ValueString<'a>,
    pub status: ValueString<'a>,
    pub health_status: ValueString<'a>,
    pub progress: Value<f64>,
    pub min_processors: Value<f64>,
    pub max_processors: Value<f64>,
    pub min_memory: Value<f64>,
    pub max_memory: Value<f64>,
    pub min_virtual_cores: ValueNumber,
    pub max_virtual_cores: ValueNumber,
    pub pin_policy: ValueString<'a>,
    pub operating_system: ValueString<'a>,
    pub os_type: ValueString<'a>,

    #[serde(with = "value::serde_as_vec")]
    pub timeouts: Value<Timeouts<'a>>,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct InstanceNetwork<'a> {
    #[serde(borrow = "'a")]
    pub network_id: ValueString<'a>,
    pub ip_address: ValueString<'a>,
    pub mac_address: ValueString<'a>,
    pub network_name: ValueString<'a>,
    #[serde(rename = "type")]
    pub network_type: ValueString<'a>,
    pub external_ip: ValueString<'a>,
}

impl InstanceNetwork<'_> {
    pub(crate) fn block() -> Block {
        use AttributeConstraint::{Computed, OptionalComputed, Required};
        use AttributeType::String;
        Block {
            attributes: map! {
                "network_id" => attribute(String, Required, "ID of the network"),
                "ip_address" => attribute(String, OptionalComputed, "Fixed IP address of the instance on this network"),
                "mac_address" => attribute(String, Computed, "MAC address of the interface"),
                "network_name" => attribute(String, Computed, "Name of the network"),
                "type" => attribute(String, Computed, "Type of the network"),
                "external_ip" => attribute(String, Computed, "External IP address of the interface"),
            },
            description: Description::plain("Network attached to the instance"),
            ..Default::default()
        }
    }
}

impl WithSchema for InstanceState<'_> {
    fn schema() -> Schema {
        use AttributeConstraint::{Computed, Optional, OptionalComputed, Required};
        use AttributeType::{Bool, List, Number, Set, String};
        Schema {
            version: 1,
            block: Block {
                version: 1,
                attributes: map! {
                    "id" => attribute(String, Computed, "Resource id: `<cloud_instance_id>/<pvm_instance_id>`"),
                    "pi_cloud_instance_id" => attribute(String, Required, "ID of the PowerVS workspace"),
                    "pi_image_id" => attribute(String, Required, "ID of the image to boot from"),
                    "pi_instance_name" => attribute(String, Required, "Name of the instance"),
                    "pi_memory" => attribute(Number, OptionalComputed, "Memory size in GB"),
                    "pi_processors" => attribute(Number, OptionalComputed, "Number of processors"),
                    "pi_proc_type" => attribute(String, OptionalComputed, "Processor type: dedicated, shared or capped"),
                    "pi_sys_type" => attribute(String, OptionalComputed, "System type of the instance"),
                    "pi_migratable" => attribute(Bool, OptionalComputed, "Whether the instance can be migrated"),
                    "pi_key_pair_name" => attribute(String, Optional, "Name of the SSH key"),
                    "pi_user_data" => attribute(String, Optional, "Base64 encoded cloud-init user data"),
                    "pi_volume_ids" => attribute(Set(String.into()), Optional, "Volumes attached at creation"),
                    "pi_storage_type" => attribute(String, OptionalComputed, "Storage type of the boot volume"),
                    "pi_storage_pool" => attribute(String, OptionalComputed, "Storage pool of the boot volume"),
                    "pi_storage_connection" => attribute(String, Optional, "Storage connectivity group: vSCSI"),
                    "pi_storage_pool_affinity" => attribute(Bool, OptionalComputed, "Whether every attached volume must reside in the same storage pool (default: true)"),
                    "pi_placement_group_id" => attribute(String, Optional, "Placement group the instance belongs to"),
                    "pi_shared_processor_pool" => attribute(String, Optional, "Shared processor pool to deploy the instance in"),
                    "pi_sap_profile_id" => attribute(String, Optional, "SAP profile defining cores and memory"),
                    "pi_license_repository_capacity" => attribute(Number, OptionalComputed, "VTL license repository capacity in TB"),
                    "pi_virtual_cores_assigned" => attribute(Number, OptionalComputed, "Virtual cores assigned to the instance"),
                    "pi_affinity_policy" => attribute(String, Optional, "Storage affinity policy: affinity or anti-affinity"),
                    "pi_affinity_volume" => attribute(String, Optional, "Volume to base the storage affinity on"),
                    "pi_affinity_instance" => attribute(String, Optional, "Instance to base the storage affinity on"),
                    "pi_anti_affinity_volumes" => attribute(List(String.into()), Optional, "Volumes to base the storage anti-affinity on"),
                    "pi_anti_affinity_instances" => attribute(List(String.into()), Optional, "Instances to base the storage anti-affinity on"),
                    "pi_replicants" => attribute(Number, OptionalComputed, "Number of replicas (default: 1)"),
                    "pi_replication_policy" => attribute(String, OptionalComputed, "Replication policy: affinity, anti-affinity or none (default: none)"),
                    "pi_replication_scheme" => attribute(String, OptionalComputed, "Replica naming scheme: prefix or suffix (default: suffix)"),
                    "pi_pin_policy" => attribute(String, OptionalComputed, "Pin policy: none, soft or hard (default: none)"),
                    "pi_health_status" => attribute(String, OptionalComputed, "Health status considered ready: OK or WARNING (default: OK)"),
                    "instance_id" => attribute(String, Computed, "ID of the instance"),
                    "status" => attribute(String, Computed, "Status of the instance"),
                    "health_status" => attribute(String, Computed, "Health status of the instance"),
                    "progress" => attribute(Number, Computed, "Progress of the current operation"),
                    "min_processors" => attribute(Number, Computed, "Minimum number of processors"),
                    "max_processors" => attribute(Number, Computed, "Maximum number of processors"),
                    "min_memory" => attribute(Number, Computed, "Minimum memory"),
                    "max_memory" => attribute(Number, Computed, "Maximum memory"),
                    "min_virtual_cores" => attribute(Number, Computed, "Minimum number of virtual cores"),
                    "max_virtual_cores" => attribute(Number, Computed, "Maximum number of virtual cores"),
                    "pin_policy" => attribute(String, Computed, "Pin policy of the instance"),
                    "operating_system" => attribute(String, Computed, "Operating system"),
                    "os_type" => attribute(String, Computed, "Operating system type"),
                },
                blocks: map! {
                    "pi_network" => NestedBlock::List(InstanceNetwork::block()),
                    "timeouts" => INSTANCE_TIMEOUTS.block(),
                },
                description: Description::plain("IBM PowerVS instance (LPAR)"),
                deprecated: false,
            },
        }
    }
}

impl WithNormalize for InstanceState<'_> {
    fn normalize(&mut self, _diags: &mut Diagnostics) {
        default_if_null(&mut self.pi_storage_pool_affinity, true);
        default_if_null(&mut self.pi_replicants, 1);
        default_if_null(&mut self.pi_replication_policy, "none".into());
        default_if_null(&mut self.pi_replication_scheme, "suffix".into());
        default_if_null(&mut self.pi_pin_policy, "none".into());
        default_if_null(&mut self.pi_health_status, "OK".into());
    }
}

impl<'a> InstanceState<'a> {
    /// Health status the instance must report to be considered ready
    pub fn ready_status(&self) -> &str {
        match self.pi_health_status.as_deref_option() {
            Some(status) if !status.is_empty() => status,
            _ => "OK",
        }
    }

    /// Mark every purely computed attribute unknown
    pub fn unknown_computed(&mut self) {
        self.instance_id = Value::Unknown;
        self.status = Value::Unknown;
        self.health_status = Value::Unknown;
        self.progress = Value::Unknown;
        self.min_processors = Value::Unknown;
        self.max_processors = Value::Unknown;
        self.min_memory = Value::Unknown;
        self.max_memory = Value::Unknown;
        self.min_virtual_cores = Value::Unknown;
        self.max_virtual_cores = Value::Unknown;
        self.pin_policy = Value::Unknown;
        self.operating_system = Value::Unknown;
        self.os_type = Value::Unknown;
    }

    /// Copy the instance reported by the API into the state
    ///
    /// With `overwrite`, every reported attribute replaces the stored one so
    /// that drift is detected. Otherwise only unknown attributes are filled.
    pub fn refresh(&mut self, cloud_instance_id: &str, pvm: &PvmInstance, overwrite: bool) {
        set_value(
            &mut self.id,
            value_string(join_id([cloud_instance_id, &pvm.pvm_instance_id])),
            overwrite,
        );
        set_value(
            &mut self.pi_cloud_instance_id,
            value_string(cloud_instance_id),
            overwrite,
        );
        set_value(
            &mut self.instance_id,
            value_string(pvm.pvm_instance_id.as_str()),
            overwrite,
        );
        set_value(
            &mut self.pi_instance_name,
            value_string(pvm.server_name.as_str()),
            overwrite,
        );
        set_value(
            &mut self.pi_image_id,
            value_opt_string(Some(pvm.image_id.clone())),
            overwrite,
        );
        set_value(&mut self.pi_memory, Value::Value(pvm.memory), overwrite);
        set_value(&mut self.pi_processors, Value::Value(pvm.processors), overwrite);
        set_value(
            &mut self.pi_proc_type,
            value_opt_string(Some(pvm.proc_type.clone())),
            overwrite,
        );
        set_value(
            &mut self.pi_sys_type,
            value_opt_string(Some(pvm.sys_type.clone())),
            overwrite,
        );
        if let Some(migratable) = pvm.migratable {
            set_value(&mut self.pi_migratable, Value::Value(migratable), overwrite);
        }
        if let Some(storage_type) = &pvm.storage_type {
            set_value(
                &mut self.pi_storage_type,
                value_opt_string(Some(storage_type.clone())),
                overwrite,
            );
        }
        set_value(
            &mut self.pi_storage_pool,
            value_opt_string(Some(pvm.storage_pool.clone())),
            overwrite,
        );
        if let Some(affinity) = pvm.storage_pool_affinity {
            set_value(
                &mut self.pi_storage_pool_affinity,
                Value::Value(affinity),
                overwrite,
            );
        }
        match pvm.placement_group.as_deref() {
            Some(group) if !group.is_empty() && group != "none" => {
                set_value(&mut self.pi_placement_group_id, value_string(group), overwrite)
            }
            _ => set_value(&mut self.pi_placement_group_id, Value::Null, false),
        }
        if let Some(profile_id) = pvm.sap_profile.as_ref().and_then(|p| p.profile_id.clone()) {
            set_value(&mut self.pi_sap_profile_id, value_string(profile_id), overwrite);
        }
        set_value(
            &mut self.pi_license_repository_capacity,
            Value::Value(pvm.license_repository_capacity),
            overwrite,
        );

        let networks = pvm
            .networks
            .iter()
            .map(|network| {
                Value::Value(InstanceNetwork {
                    network_id: value_string(network.network_id.as_str()),
                    ip_address: value_opt_string(Some(network.ip_address.clone())),
                    mac_address: value_opt_string(Some(network.mac_address.clone())),
                    network_name: value_opt_string(Some(network.network_name.clone())),
                    network_type: value_opt_string(Some(network.network_type.clone())),
                    external_ip: value_opt_string(Some(network.external_ip.clone())),
                })
            })
            .collect::<Vec<_>>();
        if overwrite || self.pi_network.is_unknown() {
            self.pi_network = Value::Value(networks);
        } else if let Value::Value(planned) = &mut self.pi_network {
            for network in planned.iter_mut().flatten() {
                let reported = pvm
                    .networks
                    .iter()
                    .find(|n| n.network_id == network.network_id.as_str());
                if let Some(reported) = reported {
                    let ip = value_opt_string(Some(reported.ip_address.clone()));
                    set_value(&mut network.ip_address, ip, false);
                    let mac = value_opt_string(Some(reported.mac_address.clone()));
                    set_value(&mut network.mac_address, mac, false);
                    let name = value_opt_string(Some(reported.network_name.clone()));
                    set_value(&mut network.network_name, name, false);
                    let kind = value_opt_string(Some(reported.network_type.clone()));
                    set_value(&mut network.network_type, kind, false);
                    let external = value_opt_string(Some(reported.external_ip.clone()));
                    set_value(&mut network.external_ip, external, false);
                }
                // Interfaces the API does not report yet
                for field in [
                    &mut network.ip_address,
                    &mut network.mac_address,
                    &mut network.network_name,
                    &mut network.network_type,
                    &mut network.external_ip,
                ] {
                    set_value(field, Value::Null, false);
                }
            }
        }

        set_value(
            &mut self.status,
            value_opt_string(Some(pvm.status.clone())),
            overwrite,
        );
        set_value(
            &mut self.health_status,
            value_opt_string(pvm.health.as_ref().map(|h| h.status.clone())),
            overwrite,
        );
        set_value(&mut self.progress, Value::Value(pvm.progress), overwrite);
        set_value(&mut self.min_processors, Value::Value(pvm.minproc), overwrite);
        set_value(&mut self.max_processors, Value::Value(pvm.maxproc), overwrite);
        set_value(&mut self.min_memory, Value::Value(pvm.minmem), overwrite);
        set_value(&mut self.max_memory, Value::Value(pvm.maxmem), overwrite);
        let cores = pvm.virtual_cores.as_ref();
        set_value(
            &mut self.pi_virtual_cores_assigned,
            cores.map(|c| c.assigned).into(),
            overwrite,
        );
        set_value(
            &mut self.min_virtual_cores,
            cores.and_then(|c| c.min).into(),
            overwrite,
        );
        set_value(
            &mut self.max_virtual_cores,
            cores.and_then(|c| c.max).into(),
            overwrite,
        );
        set_value(
            &mut self.pin_policy,
            value_opt_string(Some(pvm.pin_policy.clone())),
            overwrite,
        );
        set_value(
            &mut self.operating_system,
            value_opt_string(Some(pvm.operating_system.clone())),
            overwrite,
        );
        set_value(
            &mut self.os_type,
            value_opt_string(pvm.os_type.clone()),
            overwrite,
        );

        // Attributes the API never reports
        for field in [
            &mut self.pi_storage_type,
            &mut self.pi_storage_pool,
            &mut self.pi_proc_type,
            &mut self.pi_sys_type,
        ] {
            set_value(field, Value::Null, false);
        }
        set_value(&mut self.pi_migratable, Value::Null, false);
        set_value(&mut self.pi_storage_pool_affinity, Value::Value(true), false);
    }
}
