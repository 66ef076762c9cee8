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

//! Terraform and ToFu provider for IBM Power Systems Virtual Server
//!
//! The provider manages PowerVS instances and the objects around them:
//! placement groups, shared processor pools, network security group rules,
//! virtual serial numbers and image exports.

pub mod client;
pub mod config;
pub mod image_export;
pub mod instance;
pub mod logging;
pub mod network_security_group;
pub mod placement_group;
pub mod powervs_provider;
pub mod shared_processor_pool;
pub mod spp_placement_group;
pub mod state_change;
pub mod timeouts;
pub mod utils;
pub mod virtual_serial_number;

pub use powervs_provider::{PowerVsProvider, ProviderHandle};
