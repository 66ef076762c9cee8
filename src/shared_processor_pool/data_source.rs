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

use crate::client::models::SharedProcessorPoolDetail;
use crate::client::{ClientResult, SharedProcessorPoolClient};
use crate::powervs_provider::ProviderHandle;
use crate::utils::{attribute, value_opt_string, value_string, value_string_list, WithSchema};

use super::{pool_instances, PoolInstance};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SharedProcessorPoolDataState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub pi_cloud_instance_id: ValueString<'a>,
    pub pi_shared_processor_pool_id: ValueString<'a>,
    pub name: ValueString<'a>,
    pub host_id: ValueNumber,
    pub reserved_cores: ValueNumber,
    pub allocated_cores: Value<f64>,
    pub available_cores: Value<f64>,
    pub status: ValueString<'a>,
    pub status_detail: ValueString<'a>,
    pub spp_placement_groups: ValueList<ValueString<'a>>,
    pub instances: ValueList<Value<PoolInstance<'a>>>,
}

impl WithSchema for SharedProcessorPoolDataState<'_> {
    fn schema() -> Schema {
        use AttributeConstraint::{Computed, Required};
        use AttributeType::{List, Number, String};
        Schema {
            version: 1,
            block: Block {
                version: 1,
                attributes: map! {
                    "id" => attribute(String, Computed, "ID of the pool"),
                    "pi_cloud_instance_id" => attribute(String, Required, "ID of the PowerVS workspace"),
                    "pi_shared_processor_pool_id" => attribute(String, Required, "Name or ID of the pool"),
                    "name" => attribute(String, Computed, "Name of the pool"),
                    "host_id" => attribute(Number, Computed, "ID of the host the pool lives on"),
                    "reserved_cores" => attribute(Number, Computed, "Number of reserved cores"),
                    "allocated_cores" => attribute(Number, Computed, "Cores allocated to the instances of the pool"),
                    "available_cores" => attribute(Number, Computed, "Cores still available in the pool"),
                    "status" => attribute(String, Computed, "Status of the pool"),
                    "status_detail" => attribute(String, Computed, "Detail of the pool status"),
                    "spp_placement_groups" => attribute(List(String.into()), Computed, "SPP placement groups the pool belongs to"),
                    "instances" => attribute(
                        AttributeType::AttributeList(PoolInstance::attributes()),
                        Computed,
                        "Instances running in the pool",
                    ),
                },
                description: Description::plain("Look up an IBM PowerVS shared processor pool"),
                ..Default::default()
            },
        }
    }
}

impl SharedProcessorPoolDataState<'_> {
    fn fill(&mut self, detail: &SharedProcessorPoolDetail) {
        let pool = &detail.shared_processor_pool;
        self.id = value_string(pool.id.as_str());
        self.name = value_string(pool.name.as_str());
        self.host_id = Value::Value(pool.host_id);
        self.reserved_cores = Value::Value(pool.reserved_cores);
        self.allocated_cores = Value::Value(pool.allocated_cores);
        self.available_cores = Value::Value(pool.available_cores);
        self.status = value_string(pool.status.as_str());
        self.status_detail = value_opt_string(Some(pool.status_detail.clone()));
        self.spp_placement_groups =
            value_string_list(pool.spp_placement_groups.iter().map(|group| group.id.as_str()));
        self.instances = pool_instances(&detail.servers);
    }
}

async fn find_pool(
    client: &SharedProcessorPoolClient,
    name_or_id: &str,
) -> ClientResult<SharedProcessorPoolDetail> {
    match client.get(name_or_id).await {
        Err(err) if err.is_not_found() => {
            let pools = client.list().await?;
            match pools.into_iter().find(|pool| pool.name == name_or_id) {
                Some(pool) => client.get(&pool.id).await,
                None => Err(err),
            }
        }
        result => result,
    }
}

#[derive(Debug, Default, Clone)]
pub struct SharedProcessorPoolDataSource {
    handle: ProviderHandle,
}

impl SharedProcessorPoolDataSource {
    pub fn new(handle: ProviderHandle) -> Self {
        Self { handle }
    }
}

#[async_trait]
impl DataSource for SharedProcessorPoolDataSource {
    type State<'a> = SharedProcessorPoolDataState<'a>;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(SharedProcessorPoolDataState::schema())
    }

    async fn read<'a>(
        &self,
        diags: &mut Diagnostics,
        config: Self::State<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<Self::State<'a>> {
        let client = self.handle.client(diags).await?;
        let cloud_instance_id = config.pi_cloud_instance_id.as_str().to_owned();
        let name = config.pi_shared_processor_pool_id.as_str().to_owned();
        info!(cloud_instance_id = %cloud_instance_id, name = %name, "reading data.ibm_pi_shared_processor_pool");

        match find_pool(&client.shared_processor_pools(&cloud_instance_id), &name).await {
            Ok(detail) => {
                let mut state = config;
                state.fill(&detail);
                Some(state)
            }
            Err(err) => {
                diags.error(
                    "Failed to read the shared processor pool",
                    err.to_string(),
                    AttributePath::new("pi_shared_processor_pool_id"),
                );
                None
            }
        }
    }
}
