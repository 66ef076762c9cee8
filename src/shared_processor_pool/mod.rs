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

//! `ibm_pi_shared_processor_pool` resource and data source

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tf_provider::{map, value, AttributePath, Diagnostics};
use tf_provider::schema::{
    Attribute, AttributeConstraint, AttributeType, Block, Description, Schema,
};
use tf_provider::value::{Value, ValueList, ValueNumber, ValueString};

use crate::client::models::{SharedProcessorPoolDetail, SharedProcessorPoolServer};
use crate::timeouts::{DefaultTimeouts, Timeouts};
use crate::utils::{
    attribute, join_id, set_value, value_opt_string, value_string, value_string_list, WithSchema,
    WithValidate,
};

mod data_source;
mod resource;
mod wait;

pub use data_source::{SharedProcessorPoolDataSource, SharedProcessorPoolDataState};
pub use resource::SharedProcessorPoolResource;

pub const POOL_TIMEOUTS: DefaultTimeouts = DefaultTimeouts::all(Duration::from_secs(60 * 60));

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PoolInstance<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub name: ValueString<'a>,
    pub cpus: Value<f64>,
    pub uncapped: Value<bool>,
    pub vcpus: Value<f64>,
    pub memory: ValueNumber,
    pub availability_zone: ValueString<'a>,
}

impl PoolInstance<'_> {
    pub(crate) fn attributes() -> HashMap<String, Attribute> {
        use AttributeConstraint::Computed;
        use AttributeType::{Bool, Number, String};
        map! {
            "id" => attribute(String, Computed, "ID of the instance"),
            "name" => attribute(String, Computed, "Name of the instance"),
            "cpus" => attribute(Number, Computed, "Number of processors"),
            "uncapped" => attribute(Bool, Computed, "Whether the instance is uncapped"),
            "vcpus" => attribute(Number, Computed, "Number of virtual processors"),
            "memory" => attribute(Number, Computed, "Memory in GB"),
            "availability_zone" => attribute(String, Computed, "Availability zone of the instance"),
        }
    }
}

pub(crate) fn pool_instances<'a>(
    servers: &[SharedProcessorPoolServer],
) -> ValueList<Value<PoolInstance<'a>>> {
    Value::Value(
        servers
            .iter()
            .map(|server| {
                Value::Value(PoolInstance {
                    id: value_string(server.id.as_str()),
                    name: value_string(server.name.as_str()),
                    cpus: Value::Value(server.cpus),
                    uncapped: Value::Value(server.uncapped),
                    vcpus: Value::Value(server.vcpus),
                    memory: Value::Value(server.memory),
                    availability_zone: value_opt_string(Some(server.availability_zone.clone())),
                })
            })
            .collect(),
    )
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SharedProcessorPoolState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub pi_cloud_instance_id: ValueString<'a>,
    pub pi_shared_processor_pool_name: ValueString<'a>,
    pub pi_shared_processor_pool_host_group: ValueString<'a>,
    pub pi_shared_processor_pool_reserved_cores: ValueNumber,
    pub pi_shared_processor_pool_placement_group_id: ValueString<'a>,
    pub spp_placement_groups: ValueList<ValueString<'a>>,

    pub shared_processor_pool_id: ValueString<'a>,
    pub status: ValueString<'a>,
    pub status_detail: ValueString<'a>,
    pub allocated_cores: Value<f64>,
    pub available_cores: Value<f64>,
    pub host_id: ValueNumber,
    pub instances: ValueList<Value<PoolInstance<'a>>>,

    #[serde(with = "value::serde_as_vec")]
    pub timeouts: Value<Timeouts<'a>>,
}

impl WithSchema for SharedProcessorPoolState<'_> {
    fn schema() -> Schema {
        use AttributeConstraint::{Computed, Optional, OptionalComputed, Required};
        use AttributeType::{List, Number, String};
        Schema {
            version: 1,
            block: Block {
                version: 1,
                attributes: map! {
                    "id" => attribute(String, Computed, "`<cloud_instance_id>/<shared_processor_pool_id>`"),
                    "pi_cloud_instance_id" => attribute(String, Required, "ID of the PowerVS workspace"),
                    "pi_shared_processor_pool_name" => attribute(String, Required, "Name of the pool"),
                    "pi_shared_processor_pool_host_group" => attribute(String, Required, "Host group of the pool: s922 or e980"),
                    "pi_shared_processor_pool_reserved_cores" => attribute(Number, Required, "Number of reserved cores"),
                    "pi_shared_processor_pool_placement_group_id" => attribute(String, Optional, "SPP placement group the pool is created in"),
                    "spp_placement_groups" => attribute(List(String.into()), OptionalComputed, "SPP placement groups the pool belongs to"),
                    "shared_processor_pool_id" => attribute(String, Computed, "ID of the pool"),
                    "status" => attribute(String, Computed, "Status of the pool"),
                    "status_detail" => attribute(String, Computed, "Detail of the pool status"),
                    "allocated_cores" => attribute(Number, Computed, "Cores allocated to the instances of the pool"),
                    "available_cores" => attribute(Number, Computed, "Cores still available in the pool"),
                    "host_id" => attribute(Number, Computed, "ID of the host the pool lives on"),
                    "instances" => attribute(
                        AttributeType::AttributeList(PoolInstance::attributes()),
                        Computed,
                        "Instances running in the pool",
                    ),
                },
                blocks: map! {
                    "timeouts" => POOL_TIMEOUTS.block(),
                },
                description: Description::plain("IBM PowerVS shared processor pool"),
                ..Default::default()
            },
        }
    }
}

impl WithValidate for SharedProcessorPoolState<'_> {
    fn validate(&self, diags: &mut Diagnostics, attr_path: AttributePath) {
        if let Value::Value(cores) = self.pi_shared_processor_pool_reserved_cores {
            if cores < 0 {
                diags.error_short(
                    "`pi_shared_processor_pool_reserved_cores` must not be negative",
                    attr_path
                        .clone()
                        .attribute("pi_shared_processor_pool_reserved_cores"),
                );
            }
        }
        if let Value::Value(timeouts) = &self.timeouts {
            timeouts.validate(diags, attr_path.attribute("timeouts"));
        }
    }
}

impl SharedProcessorPoolState<'_> {
    pub fn unknown_computed(&mut self) {
        self.status = Value::Unknown;
        self.status_detail = Value::Unknown;
        self.allocated_cores = Value::Unknown;
        self.available_cores = Value::Unknown;
        self.instances = Value::Unknown;
    }

    /// Copy the pool reported by the API into the state
    ///
    /// Arguments are only overwritten in `overwrite` mode. Computed attributes
    /// are always refreshed.
    pub fn refresh(
        &mut self,
        cloud_instance_id: &str,
        detail: &SharedProcessorPoolDetail,
        overwrite: bool,
    ) {
        let pool = &detail.shared_processor_pool;
        self.id = value_string(join_id([cloud_instance_id, &pool.id]));
        self.pi_cloud_instance_id = value_string(cloud_instance_id);
        set_value(
            &mut self.pi_shared_processor_pool_name,
            value_string(pool.name.as_str()),
            overwrite,
        );
        set_value(
            &mut self.pi_shared_processor_pool_host_group,
            value_string(pool.host_group.as_str()),
            overwrite,
        );
        set_value(
            &mut self.pi_shared_processor_pool_reserved_cores,
            Value::Value(pool.reserved_cores),
            overwrite,
        );
        set_value(
            &mut self.spp_placement_groups,
            value_string_list(pool.spp_placement_groups.iter().map(|group| group.id.as_str())),
            overwrite,
        );
        self.shared_processor_pool_id = value_string(pool.id.as_str());
        self.status = value_string(pool.status.as_str());
        self.status_detail = value_opt_string(Some(pool.status_detail.clone()));
        self.allocated_cores = Value::Value(pool.allocated_cores);
        self.available_cores = Value::Value(pool.available_cores);
        self.host_id = Value::Value(pool.host_id);
        self.instances = pool_instances(&detail.servers);
    }
}
