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

//! `ibm_pi_virtual_serial_number` resource and data source
//!
//! A virtual serial number (VSN) exists on its own or attached to an LPAR.
//! Attaching, detaching and changing the software tier all require the LPAR
//! to be stopped; it is restarted afterwards when it was running.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tf_provider::{map, value, AttributePath, Diagnostics};
use tf_provider::schema::{AttributeConstraint, AttributeType, Block, Description, Schema};
use tf_provider::value::{Value, ValueBool, ValueString};

use crate::client::models::VirtualSerialNumber;
use crate::timeouts::{DefaultTimeouts, Timeouts};
use crate::utils::{
    attribute, set_value, validate_one_of, value_opt_string, value_string, WithSchema,
    WithValidate,
};

mod data_source;
mod lpar;
mod resource;

pub use data_source::{VsnDataSource, VsnDataState};
pub use resource::VsnResource;

pub const AUTO_ASSIGN: &str = "auto-assign";
pub const SOFTWARE_TIERS: &[&str] = &["P05", "P10", "P20", "P30"];
pub const VSN_TIMEOUTS: DefaultTimeouts = DefaultTimeouts::all(Duration::from_secs(45 * 60));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct VsnState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub pi_cloud_instance_id: ValueString<'a>,
    pub pi_serial: ValueString<'a>,
    pub pi_description: ValueString<'a>,
    pub pi_instance_id: ValueString<'a>,
    pub pi_retain_virtual_serial_number: ValueBool,
    pub pi_software_tier: ValueString<'a>,

    #[serde(with = "value::serde_as_vec")]
    pub timeouts: Value<Timeouts<'a>>,
}

impl WithSchema for VsnState<'_> {
    fn schema() -> Schema {
        use AttributeConstraint::{Computed, Optional, OptionalComputed, Required};
        use AttributeType::{Bool, String};
        Schema {
            version: 1,
            block: Block {
                version: 1,
                attributes: map! {
                    "id" => attribute(String, Computed, "`<cloud_instance_id>/<serial>`"),
                    "pi_cloud_instance_id" => attribute(String, Required, "ID of the PowerVS workspace"),
                    "pi_serial" => attribute(String, Required, "Virtual serial number, or `auto-assign` to let PowerVS pick one"),
                    "pi_description" => attribute(String, OptionalComputed, "Description of the virtual serial number"),
                    "pi_instance_id" => attribute(String, Optional, "Instance the virtual serial number is attached to"),
                    "pi_retain_virtual_serial_number" => attribute(Bool, Optional, "Keep the virtual serial number when it is detached on deletion"),
                    "pi_software_tier" => attribute(String, OptionalComputed, "Software tier: P05, P10, P20 or P30"),
                },
                blocks: map! {
                    "timeouts" => VSN_TIMEOUTS.block(),
                },
                description: Description::plain("IBM PowerVS virtual serial number"),
                ..Default::default()
            },
        }
    }
}

impl WithValidate for VsnState<'_> {
    fn validate(&self, diags: &mut Diagnostics, attr_path: AttributePath) {
        let path = |name: &'static str| attr_path.clone().attribute(name);
        validate_one_of(diags, &self.pi_software_tier, SOFTWARE_TIERS, path("pi_software_tier"));

        if self.pi_instance_id.is_null() {
            if self.pi_serial.as_deref_option() == Some(AUTO_ASSIGN) {
                diags.error_short(
                    format!("cannot use '{AUTO_ASSIGN}' unless 'pi_instance_id' is specified"),
                    path("pi_serial"),
                );
            }
            if self.pi_software_tier.is_value() {
                diags.error_short(
                    "cannot use 'pi_software_tier' unless 'pi_instance_id' is specified",
                    path("pi_software_tier"),
                );
            }
            if self.pi_retain_virtual_serial_number.is_value() {
                diags.error_short(
                    "'pi_retain_virtual_serial_number' requires 'pi_instance_id'",
                    path("pi_retain_virtual_serial_number"),
                );
            }
        }
        if let Value::Value(timeouts) = &self.timeouts {
            timeouts.validate(diags, path("timeouts"));
        }
    }
}

impl VsnState<'_> {
    /// Copy the serial number reported by the API into the state
    ///
    /// A `pi_serial` of `auto-assign` is kept: the assigned serial lives in the id.
    pub fn refresh(&mut self, cloud_instance_id: &str, vsn: &VirtualSerialNumber, overwrite: bool) {
        self.id = value_string(format!("{cloud_instance_id}/{}", vsn.serial));
        self.pi_cloud_instance_id = value_string(cloud_instance_id);
        if self.pi_serial.as_deref_option() != Some(AUTO_ASSIGN) {
            set_value(&mut self.pi_serial, value_string(vsn.serial.as_str()), overwrite);
        }
        set_value(
            &mut self.pi_description,
            value_string(vsn.description.as_str()),
            overwrite,
        );
        set_value(
            &mut self.pi_instance_id,
            value_opt_string(vsn.pvm_instance_id.clone()),
            overwrite,
        );
        set_value(
            &mut self.pi_software_tier,
            value_opt_string(Some(vsn.software_tier.clone())),
            overwrite,
        );
    }
}

/// Whether a change of `pi_serial` designates another serial number
///
/// `auto-assign` matches the serial it was resolved to.
pub(crate) fn serial_changed(prior: &str, proposed: &str, assigned: &str) -> bool {
    match (prior == AUTO_ASSIGN, proposed == AUTO_ASSIGN) {
        (true, true) => false,
        (true, false) => proposed != assigned,
        (false, true) => prior != assigned,
        (false, false) => prior != proposed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn errors(state: &VsnState) -> usize {
        let mut diags = Diagnostics::default();
        state.validate(&mut diags, AttributePath::default());
        diags.errors.len()
    }

    #[test]
    fn auto_assign_needs_an_instance() {
        let state = VsnState {
            pi_serial: Value::from(AUTO_ASSIGN),
            pi_software_tier: Value::from("P10"),
            pi_retain_virtual_serial_number: Value::Value(true),
            ..Default::default()
        };
        assert_eq!(errors(&state), 3);

        let state = VsnState {
            pi_instance_id: Value::from("pvm"),
            ..state
        };
        assert_eq!(errors(&state), 0);
    }

    #[test]
    fn unknown_tier_is_rejected() {
        let state = VsnState {
            pi_serial: Value::from("ABC1234"),
            pi_instance_id: Value::from("pvm"),
            pi_software_tier: Value::from("P40"),
            ..Default::default()
        };
        assert_eq!(errors(&state), 1);
    }

    #[test]
    fn auto_assign_suppresses_serial_diff() {
        assert!(!serial_changed(AUTO_ASSIGN, "ABC1234", "ABC1234"));
        assert!(!serial_changed("ABC1234", AUTO_ASSIGN, "ABC1234"));
        assert!(serial_changed(AUTO_ASSIGN, "XYZ9876", "ABC1234"));
        assert!(serial_changed("ABC1234", "XYZ9876", "ABC1234"));
        assert!(!serial_changed(AUTO_ASSIGN, AUTO_ASSIGN, "ABC1234"));
    }

    #[test]
    fn refresh_keeps_auto_assign() {
        let mut state = VsnState {
            pi_serial: Value::from(AUTO_ASSIGN),
            pi_instance_id: Value::from("pvm"),
            pi_description: Value::Unknown,
            pi_software_tier: Value::Unknown,
            ..Default::default()
        };
        let vsn = VirtualSerialNumber {
            serial: "ABC1234".into(),
            description: "lpar serial".into(),
            pvm_instance_id: Some("pvm".into()),
            software_tier: "P05".into(),
        };
        state.refresh("cloud", &vsn, true);
        assert_eq!(state.id.as_str(), "cloud/ABC1234");
        assert_eq!(state.pi_serial.as_str(), AUTO_ASSIGN);
        assert_eq!(state.pi_software_tier.as_str(), "P05");
        assert_eq!(state.pi_description.as_str(), "lpar serial");
    }
}
