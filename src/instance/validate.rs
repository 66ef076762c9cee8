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

use base64::Engine;
use tf_provider::{AttributePath, Diagnostics};
use tf_provider::value::Value;

use crate::utils::{validate_conflict, validate_one_of, WithValidate};

use super::state::{
    InstanceState, AFFINITY_POLICIES, HEALTH_STATUSES, PIN_POLICIES, PROC_TYPES,
    REPLICATION_POLICIES, REPLICATION_SCHEMES, STORAGE_CONNECTIONS,
};

impl WithValidate for InstanceState<'_> {
    fn validate(&self, diags: &mut Diagnostics, attr_path: AttributePath) {
        let path = |name: &str| attr_path.clone().attribute(name.to_owned());

        for (name, value, allowed) in [
            ("pi_proc_type", &self.pi_proc_type, PROC_TYPES),
            ("pi_affinity_policy", &self.pi_affinity_policy, AFFINITY_POLICIES),
            ("pi_replication_policy", &self.pi_replication_policy, REPLICATION_POLICIES),
            ("pi_replication_scheme", &self.pi_replication_scheme, REPLICATION_SCHEMES),
            ("pi_pin_policy", &self.pi_pin_policy, PIN_POLICIES),
            ("pi_health_status", &self.pi_health_status, HEALTH_STATUSES),
            ("pi_storage_connection", &self.pi_storage_connection, STORAGE_CONNECTIONS),
        ] {
            validate_one_of(diags, value, allowed, path(name));
        }

        let sap = ("pi_sap_profile_id", &self.pi_sap_profile_id);
        validate_conflict(diags, sap, ("pi_processors", &self.pi_processors), attr_path.clone());
        validate_conflict(diags, sap, ("pi_memory", &self.pi_memory), attr_path.clone());
        validate_conflict(diags, sap, ("pi_proc_type", &self.pi_proc_type), attr_path.clone());
        validate_conflict(
            diags,
            sap,
            ("pi_shared_processor_pool", &self.pi_shared_processor_pool),
            attr_path.clone(),
        );
        validate_conflict(
            diags,
            ("pi_affinity_volume", &self.pi_affinity_volume),
            ("pi_affinity_instance", &self.pi_affinity_instance),
            attr_path.clone(),
        );
        validate_conflict(
            diags,
            ("pi_anti_affinity_volumes", &self.pi_anti_affinity_volumes),
            ("pi_anti_affinity_instances", &self.pi_anti_affinity_instances),
            attr_path.clone(),
        );

        if let Value::Value(user_data) = &self.pi_user_data {
            if base64::engine::general_purpose::STANDARD
                .decode(user_data.as_bytes())
                .is_err()
            {
                diags.error(
                    "Invalid user data",
                    "`pi_user_data` must be base64 encoded.",
                    path("pi_user_data"),
                );
            }
        }

        if let Value::Value(networks) = &self.pi_network {
            if networks.is_empty() {
                diags.error_short("At least one `pi_network` block is required", path("pi_network"));
            }
        }

        if let Value::Value(replicants) = self.pi_replicants {
            if replicants < 1 {
                diags.error_short("`pi_replicants` must be at least 1", path("pi_replicants"));
            }
        }

        if let Value::Value(timeouts) = &self.timeouts {
            timeouts.validate(diags, path("timeouts"));
        }
    }
}

#[cfg(test)]
mod tests {
    use tf_provider::value::Value;

    use super::*;
    use crate::instance::state::InstanceNetwork;

    fn valid() -> InstanceState<'static> {
        InstanceState {
            pi_cloud_instance_id: Value::from("cloud"),
            pi_image_id: Value::from("img"),
            pi_instance_name: Value::from("lpar"),
            pi_network: Value::Value(vec![Value::Value(InstanceNetwork {
                network_id: Value::from("net"),
                ..Default::default()
            })]),
            pi_memory: Value::Value(4.0),
            pi_processors: Value::Value(0.25),
            pi_proc_type: Value::from("shared"),
            pi_sys_type: Value::from("s922"),
            ..Default::default()
        }
    }

    #[test]
    fn accepts_pvm_configuration() {
        let mut diags = Diagnostics::default();
        valid().validate(&mut diags, AttributePath::default());
        assert!(diags.errors.is_empty(), "{:?}", diags.errors);
    }

    #[test]
    fn sap_profile_conflicts_with_sizing() {
        let mut diags = Diagnostics::default();
        let state = InstanceState {
            pi_sap_profile_id: Value::from("ush1-4x128"),
            ..valid()
        };
        state.validate(&mut diags, AttributePath::default());
        assert_eq!(diags.errors.len(), 3);
    }

    #[test]
    fn rejects_invalid_values() {
        let mut diags = Diagnostics::default();
        let state = InstanceState {
            pi_proc_type: Value::from("elastic"),
            pi_user_data: Value::from("not base64!"),
            pi_storage_connection: Value::from("iSCSI"),
            pi_affinity_volume: Value::from("vol"),
            pi_affinity_instance: Value::from("pvm"),
            pi_network: Value::Value(vec![]),
            ..valid()
        };
        state.validate(&mut diags, AttributePath::default());
        assert_eq!(diags.errors.len(), 5);
    }
}
