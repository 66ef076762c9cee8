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
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::info;

use tf_provider::{map, Diagnostics, DynamicDataSource, DynamicResource, Provider};
use tf_provider::schema::Schema;
use tf_provider::value::ValueEmpty;

use crate::client::PowerVsClient;
use crate::config::ProviderConfig;
use crate::image_export::{ImageExportResource, JobDataSource};
use crate::instance::{InstanceDataSource, InstanceResource};
use crate::network_security_group::{NsgDataSource, NsgRuleResource};
use crate::placement_group::{PlacementGroupDataSource, PlacementGroupResource};
use crate::shared_processor_pool::{SharedProcessorPoolDataSource, SharedProcessorPoolResource};
use crate::spp_placement_group::{SppPlacementGroupDataSource, SppPlacementGroupResource};
use crate::utils::{WithSchema, WithValidate};
use crate::virtual_serial_number::{VsnDataSource, VsnResource};

/// Client shared between the provider and its resources
///
/// Resources are instantiated before the provider is configured, so they all
/// hold a handle that `configure` fills.
#[derive(Debug, Clone, Default)]
pub struct ProviderHandle {
    client: Arc<RwLock<Option<PowerVsClient>>>,
}

impl ProviderHandle {
    pub fn new(client: PowerVsClient) -> Self {
        Self {
            client: Arc::new(RwLock::new(Some(client))),
        }
    }

    pub async fn set(&self, client: PowerVsClient) {
        *self.client.write().await = Some(client);
    }

    /// Configured client, or an error diagnostic when `configure` did not run
    pub async fn client(&self, diags: &mut Diagnostics) -> Option<PowerVsClient> {
        let client = self.client.read().await.clone();
        if client.is_none() {
            diags.root_error(
                "Provider not configured",
                "The PowerVS provider must be configured before resources and data sources are used.",
            );
        }
        client
    }
}

#[derive(Debug, Default, Clone)]
pub struct PowerVsProvider {
    handle: ProviderHandle,
}

impl PowerVsProvider {
    pub fn handle(&self) -> &ProviderHandle {
        &self.handle
    }

    /// Build the client from the configuration, falling back on `env`
    async fn configure_from(
        &self,
        diags: &mut Diagnostics,
        terraform_version: String,
        config: ProviderConfig<'_>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Option<()> {
        let options = match config.resolve(env) {
            Ok(options) => options,
            Err(err) => {
                diags.root_error("Invalid provider configuration", format!("{err:#}"));
                return None;
            }
        };
        info!(
            terraform_version = %terraform_version,
            endpoint = %options.endpoint,
            zone = %options.zone,
            "configuring PowerVS provider"
        );
        match PowerVsClient::new(options) {
            Ok(client) => {
                self.handle.set(client).await;
                Some(())
            }
            Err(err) => {
                diags.root_error("Failed to build the PowerVS client", err.to_string());
                None
            }
        }
    }
}

#[async_trait]
impl Provider for PowerVsProvider {
    type Config<'a> = ProviderConfig<'a>;
    type MetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(ProviderConfig::schema())
    }

    async fn validate<'a>(&self, diags: &mut Diagnostics, config: Self::Config<'a>) -> Option<()> {
        config.validate(diags, Default::default());
        if diags.errors.is_empty() {
            Some(())
        } else {
            None
        }
    }

    async fn configure<'a>(
        &self,
        diags: &mut Diagnostics,
        terraform_version: String,
        config: Self::Config<'a>,
    ) -> Option<()> {
        self.configure_from(diags, terraform_version, config, |name| {
            std::env::var(name).ok()
        })
        .await
    }

    fn get_resources(
        &self,
        _diags: &mut Diagnostics,
    ) -> Option<HashMap<String, Box<dyn DynamicResource>>> {
        let handle = &self.handle;
        Some(map! {
            "pi_instance" => InstanceResource::new(handle.clone()),
            "pi_placement_group" => PlacementGroupResource::new(handle.clone()),
            "pi_spp_placement_group" => SppPlacementGroupResource::new(handle.clone()),
            "pi_shared_processor_pool" => SharedProcessorPoolResource::new(handle.clone()),
            "pi_network_security_group_rule" => NsgRuleResource::new(handle.clone()),
            "pi_virtual_serial_number" => VsnResource::new(handle.clone()),
            "pi_image_export" => ImageExportResource::new(handle.clone()),
        })
    }

    fn get_data_sources(
        &self,
        _diags: &mut Diagnostics,
    ) -> Option<HashMap<String, Box<dyn DynamicDataSource>>> {
        let handle = &self.handle;
        Some(map! {
            "pi_instance" => InstanceDataSource::new(handle.clone()),
            "pi_placement_group" => PlacementGroupDataSource::new(handle.clone()),
            "pi_spp_placement_group" => SppPlacementGroupDataSource::new(handle.clone()),
            "pi_shared_processor_pool" => SharedProcessorPoolDataSource::new(handle.clone()),
            "pi_network_security_group" => NsgDataSource::new(handle.clone()),
            "pi_virtual_serial_number" => VsnDataSource::new(handle.clone()),
            "pi_job" => JobDataSource::new(handle.clone()),
        })
    }
}
