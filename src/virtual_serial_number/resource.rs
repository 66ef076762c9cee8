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

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use tf_provider::{AttributePath, Diagnostics, Resource};
use tf_provider::schema::Schema;
use tf_provider::value::{Value, ValueEmpty};
use tracing::info;

use crate::client::models::{AddServerVirtualSerialNumber, UpdateServerVirtualSerialNumber};
use crate::client::{InstanceClient, VsnClient};
use crate::powervs_provider::ProviderHandle;
use crate::timeouts::TimeoutsExt;
use crate::utils::{
    changed, join_id, non_empty, split_id, unknown_if_null, value_string, WithSchema,
    WithValidate,
};

use super::lpar::{ensure_stopped, settle, wait_vsn_assigned, wait_vsn_removed, StoppedLpar};
use super::{serial_changed, VsnState, AUTO_ASSIGN, VSN_TIMEOUTS};

/// Handle on the serial numbers and instances of one workspace
struct VsnOps {
    vsns: VsnClient,
    instances: InstanceClient,
    timeout: Duration,
}

impl VsnOps {
    /// Make sure a concrete serial can be used, returning the instance it is
    /// already attached to
    async fn check_serial(
        &self,
        serial: &str,
        pvm_instance_id: Option<&str>,
        description: Option<&str>,
    ) -> Result<Option<String>> {
        let vsn = self
            .vsns
            .get(serial)
            .await
            .with_context(|| format!("failed to read virtual serial number {serial}"))?;
        let description = description.filter(|d| *d != vsn.description);
        match (vsn.pvm_instance_id.filter(|id| !id.is_empty()), pvm_instance_id) {
            (Some(old), Some(pvm)) if old == pvm => {
                if let Some(description) = description {
                    let body = UpdateServerVirtualSerialNumber {
                        description: Some(description.to_owned()),
                        software_tier: None,
                    };
                    self.vsns.update_attached(pvm, &body).await?;
                }
                Ok(Some(old))
            }
            (Some(old), _) => bail!(
                "please unassign virtual serial number {serial} from current pvm instance {old} or specify \"{old}\" for pi_instance_id"
            ),
            (None, None) => {
                if let Some(description) = description {
                    self.vsns.update(serial, description).await?;
                }
                Ok(None)
            }
            (None, Some(_)) => Ok(None),
        }
    }

    /// Attach `serial` to a stopped LPAR and return the serial it ended up with
    async fn attach<'c>(
        &'c self,
        lpar: &mut Option<StoppedLpar<'c>>,
        pvm_instance_id: &str,
        serial: &str,
        description: Option<&str>,
    ) -> Result<String> {
        ensure_stopped(lpar, &self.instances, pvm_instance_id, self.timeout).await?;
        let body = AddServerVirtualSerialNumber {
            serial: serial.to_owned(),
            description: description.map(str::to_owned),
        };
        self.vsns
            .attach(pvm_instance_id, &body)
            .await
            .context("failed to attach the virtual serial number")?;
        wait_vsn_assigned(&self.instances, pvm_instance_id, None, self.timeout).await?;

        if serial != AUTO_ASSIGN {
            return Ok(serial.to_owned());
        }
        self.vsns
            .list(Some(pvm_instance_id))
            .await?
            .into_iter()
            .next()
            .map(|vsn| vsn.serial)
            .ok_or_else(|| anyhow!("no virtual serial number assigned to pvm instance {pvm_instance_id}"))
    }

    /// Change the software tier of the serial attached to an LPAR, if needed
    async fn set_tier<'c>(
        &'c self,
        lpar: &mut Option<StoppedLpar<'c>>,
        pvm_instance_id: &str,
        serial: &str,
        tier: &str,
    ) -> Result<()> {
        let current = self.vsns.get(serial).await?;
        if current.software_tier == tier {
            return Ok(());
        }
        info!(pvm_instance_id, serial, tier, "changing the software tier");
        ensure_stopped(lpar, &self.instances, pvm_instance_id, self.timeout).await?;
        let body = UpdateServerVirtualSerialNumber {
            description: None,
            software_tier: Some(tier.to_owned()),
        };
        self.vsns
            .update_attached(pvm_instance_id, &body)
            .await
            .context("failed to update the software tier")?;
        wait_vsn_assigned(&self.instances, pvm_instance_id, Some(tier), self.timeout).await?;
        Ok(())
    }

    /// Attach then apply the tier, restarting the LPAR afterwards
    async fn attach_and_tier(
        &self,
        pvm_instance_id: &str,
        serial: &str,
        description: Option<&str>,
        tier: Option<&str>,
        already_attached: bool,
    ) -> Result<String> {
        let mut lpar = None;
        let result = async {
            let serial = if already_attached {
                serial.to_owned()
            } else {
                self.attach(&mut lpar, pvm_instance_id, serial, description)
                    .await?
            };
            if let Some(tier) = tier {
                self.set_tier(&mut lpar, pvm_instance_id, &serial, tier)
                    .await?;
            }
            Ok::<_, anyhow::Error>(serial)
        }
        .await;
        settle(lpar, result).await
    }

    async fn detach(&self, pvm_instance_id: &str, retain: bool) -> Result<()> {
        let mut lpar = None;
        let result = async {
            ensure_stopped(&mut lpar, &self.instances, pvm_instance_id, self.timeout).await?;
            self.vsns
                .detach(pvm_instance_id, retain)
                .await
                .context("failed to detach the virtual serial number")?;
            wait_vsn_removed(&self.instances, pvm_instance_id, self.timeout).await?;
            Ok::<_, anyhow::Error>(())
        }
        .await;
        settle(lpar, result).await
    }
}

async fn create_vsn(ops: &VsnOps, state: &VsnState<'_>) -> Result<String> {
    let serial = state.pi_serial.as_str();
    let pvm_instance_id = non_empty(&state.pi_instance_id);
    let description = non_empty(&state.pi_description);

    let already_attached = if serial == AUTO_ASSIGN {
        false
    } else {
        ops.check_serial(serial, pvm_instance_id, description)
            .await?
            .is_some()
    };

    match pvm_instance_id {
        Some(pvm_instance_id) => {
            ops.attach_and_tier(
                pvm_instance_id,
                serial,
                description,
                non_empty(&state.pi_software_tier),
                already_attached,
            )
            .await
        }
        None if serial == AUTO_ASSIGN => {
            bail!("cannot use '{AUTO_ASSIGN}' unless 'pi_instance_id' is specified")
        }
        None => Ok(serial.to_owned()),
    }
}

async fn update_vsn(
    ops: &VsnOps,
    serial: &str,
    prior: &VsnState<'_>,
    planned: &VsnState<'_>,
) -> Result<()> {
    let description = non_empty(&planned.pi_description);
    let tier = non_empty(&planned.pi_software_tier);
    let description_changed = description.is_some() && prior.pi_description != planned.pi_description;
    let tier_changed = tier.is_some() && prior.pi_software_tier != planned.pi_software_tier;

    if prior.pi_instance_id == planned.pi_instance_id {
        match non_empty(&planned.pi_instance_id) {
            Some(pvm_instance_id) => {
                if let (true, Some(description)) = (description_changed, description) {
                    let body = UpdateServerVirtualSerialNumber {
                        description: Some(description.to_owned()),
                        software_tier: None,
                    };
                    ops.vsns.update_attached(pvm_instance_id, &body).await?;
                }
                if let (true, Some(tier)) = (tier_changed, tier) {
                    ops.attach_and_tier(pvm_instance_id, serial, None, Some(tier), true)
                        .await?;
                }
            }
            None => {
                if tier_changed {
                    bail!("cannot set 'pi_software_tier' unless 'pi_instance_id' is specified");
                }
                if let (true, Some(description)) = (description_changed, description) {
                    ops.vsns.update(serial, description).await?;
                }
            }
        }
        return Ok(());
    }

    if let Some(old) = non_empty(&prior.pi_instance_id) {
        info!(serial, pvm_instance_id = old, "detaching virtual serial number");
        ops.detach(old, true).await?;
    }
    match non_empty(&planned.pi_instance_id) {
        Some(new) => {
            info!(serial, pvm_instance_id = new, "attaching virtual serial number");
            ops.attach_and_tier(new, serial, description, tier, false)
                .await?;
        }
        None if tier.is_some() => {
            bail!("cannot set 'pi_software_tier' unless 'pi_instance_id' is specified")
        }
        None => (),
    }
    Ok(())
}

#[derive(Debug, Default, Clone)]
pub struct VsnResource {
    handle: ProviderHandle,
}

impl VsnResource {
    pub fn new(handle: ProviderHandle) -> Self {
        Self { handle }
    }
}

#[async_trait]
impl Resource for VsnResource {
    type State<'a> = VsnState<'a>;
    type PrivateState<'a> = ValueEmpty;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(VsnState::schema())
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
        state: Self::State<'a>,
        private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let client = self.handle.client(diags).await?;
        let ids = match split_id(state.id.as_str(), 2) {
            Ok(ids) => ids,
            Err(err) => {
                diags.root_error("Invalid virtual serial number id", err.to_string());
                return None;
            }
        };
        let (cloud_instance_id, serial) = (ids[0].to_owned(), ids[1].to_owned());
        info!(cloud_instance_id = %cloud_instance_id, serial = %serial, "reading ibm_pi_virtual_serial_number");

        match client.virtual_serial_numbers(&cloud_instance_id).get(&serial).await {
            Ok(vsn) => {
                let mut state = state;
                state.refresh(&cloud_instance_id, &vsn, true);
                Some((state, private_state))
            }
            Err(err) if err.is_not_found() => None,
            Err(err) => {
                diags.root_error("Failed to read the virtual serial number", err.to_string());
                None
            }
        }
    }

    async fn plan_create<'a>(
        &self,
        _diags: &mut Diagnostics,
        proposed_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let mut state = proposed_state;
        state.id = Value::Unknown;
        unknown_if_null(&mut state.pi_description);
        unknown_if_null(&mut state.pi_software_tier);
        Some((state, Default::default()))
    }

    async fn plan_update<'a>(
        &self,
        _diags: &mut Diagnostics,
        prior_state: Self::State<'a>,
        proposed_state: Self::State<'a>,
        config_state: Self::State<'a>,
        prior_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>, Vec<AttributePath>)> {
        let assigned = prior_state
            .id
            .as_str()
            .rsplit_once('/')
            .map_or("", |(_, serial)| serial);
        let serial_differs = match (&prior_state.pi_serial, &proposed_state.pi_serial) {
            (Value::Value(prior), Value::Value(proposed)) => serial_changed(prior, proposed, assigned),
            (prior, proposed) => prior != proposed,
        };
        let trigger_replace = changed([
            (
                "pi_cloud_instance_id",
                prior_state.pi_cloud_instance_id != proposed_state.pi_cloud_instance_id,
            ),
            ("pi_serial", serial_differs),
        ]);

        let mut state = proposed_state;
        if state.pi_instance_id != prior_state.pi_instance_id
            && config_state.pi_software_tier.is_null()
        {
            state.pi_software_tier = Value::Unknown;
        }
        Some((state, prior_private_state, trigger_replace))
    }

    async fn plan_destroy<'a>(
        &self,
        _diags: &mut Diagnostics,
        _prior_state: Self::State<'a>,
        prior_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<Self::PrivateState<'a>> {
        Some(prior_private_state)
    }

    async fn create<'a>(
        &self,
        diags: &mut Diagnostics,
        planned_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        planned_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let client = self.handle.client(diags).await?;
        let mut state = planned_state;
        let cloud_instance_id = state.pi_cloud_instance_id.as_str().to_owned();
        info!(
            cloud_instance_id = %cloud_instance_id,
            serial = %state.pi_serial.as_str(),
            "creating ibm_pi_virtual_serial_number"
        );
        let ops = VsnOps {
            vsns: client.virtual_serial_numbers(&cloud_instance_id),
            instances: client.instances(&cloud_instance_id),
            timeout: state.timeouts.create_or(&VSN_TIMEOUTS),
        };

        let serial = match create_vsn(&ops, &state).await {
            Ok(serial) => serial,
            Err(err) => {
                diags.root_error("Failed to create the virtual serial number", format!("{err:#}"));
                return None;
            }
        };
        state.id = value_string(join_id([cloud_instance_id.as_str(), &serial]));

        match ops.vsns.get(&serial).await {
            Ok(vsn) => state.refresh(&cloud_instance_id, &vsn, false),
            Err(err) => {
                diags.root_warning(
                    "Failed to read the created virtual serial number",
                    err.to_string(),
                );
                null_unknowns(&mut state);
            }
        }
        Some((state, planned_private_state))
    }

    async fn update<'a>(
        &self,
        diags: &mut Diagnostics,
        prior_state: Self::State<'a>,
        planned_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        planned_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let client = self.handle.client(diags).await?;
        let ids = match split_id(prior_state.id.as_str(), 2) {
            Ok(ids) => ids,
            Err(err) => {
                diags.root_error("Invalid virtual serial number id", err.to_string());
                return None;
            }
        };
        let (cloud_instance_id, serial) = (ids[0].to_owned(), ids[1].to_owned());
        info!(cloud_instance_id = %cloud_instance_id, serial = %serial, "updating ibm_pi_virtual_serial_number");
        let ops = VsnOps {
            vsns: client.virtual_serial_numbers(&cloud_instance_id),
            instances: client.instances(&cloud_instance_id),
            timeout: planned_state.timeouts.update_or(&VSN_TIMEOUTS),
        };

        if let Err(err) = update_vsn(&ops, &serial, &prior_state, &planned_state).await {
            diags.root_error("Failed to update the virtual serial number", format!("{err:#}"));
            return None;
        }

        let mut state = planned_state;
        match ops.vsns.get(&serial).await {
            Ok(vsn) => {
                state.refresh(&cloud_instance_id, &vsn, false);
                Some((state, planned_private_state))
            }
            Err(err) => {
                diags.root_error("Failed to read the updated virtual serial number", err.to_string());
                None
            }
        }
    }

    async fn destroy<'a>(
        &self,
        diags: &mut Diagnostics,
        state: Self::State<'a>,
        _planned_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<()> {
        let client = self.handle.client(diags).await?;
        let ids = match split_id(state.id.as_str(), 2) {
            Ok(ids) => ids,
            Err(err) => {
                diags.root_error("Invalid virtual serial number id", err.to_string());
                return None;
            }
        };
        let (cloud_instance_id, serial) = (ids[0], ids[1]);
        info!(cloud_instance_id, serial, "deleting ibm_pi_virtual_serial_number");
        let ops = VsnOps {
            vsns: client.virtual_serial_numbers(cloud_instance_id),
            instances: client.instances(cloud_instance_id),
            timeout: state.timeouts.delete_or(&VSN_TIMEOUTS),
        };

        let result = match non_empty(&state.pi_instance_id) {
            Some(pvm_instance_id) => {
                let retain = state
                    .pi_retain_virtual_serial_number
                    .as_option()
                    .unwrap_or_default();
                ops.detach(pvm_instance_id, retain).await
            }
            None => match ops.vsns.delete(serial).await {
                Err(err) if !err.is_not_found() => Err(err.into()),
                _ => Ok(()),
            },
        };
        if let Err(err) = result {
            diags.root_error("Failed to delete the virtual serial number", format!("{err:#}"));
            return None;
        }
        Some(())
    }

    async fn import<'a>(
        &self,
        diags: &mut Diagnostics,
        id: String,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let state = VsnState {
            id: value_string(id),
            ..Default::default()
        };
        self.read(diags, state, ValueEmpty::default(), ValueEmpty::default())
            .await
    }
}

fn null_unknowns(state: &mut VsnState<'_>) {
    for value in [&mut state.pi_description, &mut state.pi_software_tier] {
        if value.is_unknown() {
            *value = Value::Null;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn plan(
        prior: VsnState<'static>,
        proposed: VsnState<'static>,
    ) -> (VsnState<'static>, Vec<AttributePath>) {
        let config = proposed.clone();
        let mut diags = Diagnostics::default();
        let (state, _, replace) = VsnResource::default()
            .plan_update(
                &mut diags,
                prior,
                proposed,
                config,
                ValueEmpty::default(),
                ValueEmpty::default(),
            )
            .await
            .unwrap();
        (state, replace)
    }

    fn attached() -> VsnState<'static> {
        VsnState {
            id: "cloud/ABC1234".into(),
            pi_cloud_instance_id: "cloud".into(),
            pi_serial: AUTO_ASSIGN.into(),
            pi_description: "lpar serial".into(),
            pi_instance_id: "pvm".into(),
            pi_software_tier: "P05".into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn resolved_serial_does_not_replace() {
        let proposed = VsnState {
            pi_serial: "ABC1234".into(),
            ..attached()
        };
        let (_, replace) = plan(attached(), proposed).await;
        assert!(replace.is_empty());

        let proposed = VsnState {
            pi_serial: "XYZ9876".into(),
            ..attached()
        };
        let (_, replace) = plan(attached(), proposed).await;
        assert_eq!(replace, vec![AttributePath::new("pi_serial")]);
    }

    #[tokio::test]
    async fn instance_change_recomputes_unset_tier() {
        let proposed = VsnState {
            pi_instance_id: "other".into(),
            ..attached()
        };
        let mut config = proposed.clone();
        config.pi_software_tier = Value::Null;
        let mut diags = Diagnostics::default();
        let (state, _, replace) = VsnResource::default()
            .plan_update(
                &mut diags,
                attached(),
                proposed,
                config,
                ValueEmpty::default(),
                ValueEmpty::default(),
            )
            .await
            .unwrap();
        assert!(replace.is_empty());
        assert!(state.pi_software_tier.is_unknown());
    }

    #[test]
    fn unknowns_are_nulled_after_failed_read() {
        let mut state = VsnState {
            pi_description: Value::Unknown,
            pi_software_tier: "P10".into(),
            ..Default::default()
        };
        null_unknowns(&mut state);
        assert!(state.pi_description.is_null());
        assert_eq!(state.pi_software_tier.as_str(), "P10");
    }
}
