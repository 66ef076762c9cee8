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

//! LPAR handling around virtual serial number changes

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use tracing::{info, warn};

use crate::client::models::PvmInstance;
use crate::client::InstanceClient;
use crate::instance::wait::{start_within, stop_if_running};
use crate::state_change::StateChangeConf;

const VSN_DELAY: Duration = Duration::from_secs(10);
const VSN_POLL: Duration = Duration::from_secs(30);

/// An LPAR stopped for a serial number change
///
/// Remembers whether it was running so that [`StoppedLpar::finish`] and
/// [`StoppedLpar::abort`] restart it, within `timeout`.
pub(super) struct StoppedLpar<'c> {
    instances: &'c InstanceClient,
    pvm_instance_id: String,
    restart: bool,
    timeout: Duration,
}

impl<'c> StoppedLpar<'c> {
    pub(super) async fn stop(
        instances: &'c InstanceClient,
        pvm_instance_id: &str,
        timeout: Duration,
    ) -> Result<Self> {
        info!(pvm_instance_id, "stopping lpar for a virtual serial number change");
        let restart = stop_if_running(instances, pvm_instance_id)
            .await
            .with_context(|| format!("failed to stop pvm instance {pvm_instance_id}"))?;
        Ok(Self {
            instances,
            pvm_instance_id: pvm_instance_id.to_owned(),
            restart,
            timeout,
        })
    }

    /// Stop again before a further change, keeping the restart flag
    pub(super) async fn stop_again(&mut self) -> Result<()> {
        let restart = stop_if_running(self.instances, &self.pvm_instance_id).await?;
        self.restart |= restart;
        Ok(())
    }

    /// Restart the LPAR if it was running before the change
    pub(super) async fn finish(self) -> Result<()> {
        if self.restart {
            info!(pvm_instance_id = %self.pvm_instance_id, "restarting lpar after the virtual serial number change");
            start_within(self.instances, &self.pvm_instance_id, self.timeout)
                .await
                .context("failed to restart the pvm instance")?;
        }
        Ok(())
    }

    /// Restart the LPAR after a failed change, then hand back the original error
    pub(super) async fn abort(self, err: anyhow::Error) -> anyhow::Error {
        if self.restart {
            if let Err(restart_err) =
                start_within(self.instances, &self.pvm_instance_id, self.timeout).await
            {
                warn!(pvm_instance_id = %self.pvm_instance_id, error = %restart_err, "failed to restart lpar");
                return err.context(format!(
                    "the pvm instance {} could not be restarted: {restart_err:#}",
                    self.pvm_instance_id
                ));
            }
        }
        err
    }
}

/// Stop the LPAR, or stop it again when an earlier step already did
pub(super) async fn ensure_stopped<'c>(
    lpar: &mut Option<StoppedLpar<'c>>,
    instances: &'c InstanceClient,
    pvm_instance_id: &str,
    timeout: Duration,
) -> Result<()> {
    match lpar {
        Some(stopped) => stopped.stop_again().await,
        None => {
            *lpar = Some(StoppedLpar::stop(instances, pvm_instance_id, timeout).await?);
            Ok(())
        }
    }
}

/// Restart the LPAR stopped along `result`, whatever the outcome
pub(super) async fn settle<T>(lpar: Option<StoppedLpar<'_>>, result: Result<T>) -> Result<T> {
    match (lpar, result) {
        (Some(stopped), Ok(value)) => stopped.finish().await.map(|()| value),
        (Some(stopped), Err(err)) => Err(stopped.abort(err).await),
        (None, result) => result,
    }
}

/// Wait until the LPAR is stopped and carries a serial number, with the
/// expected software tier when one is given
pub(super) async fn wait_vsn_assigned(
    instances: &InstanceClient,
    pvm_instance_id: &str,
    software_tier: Option<&str>,
    timeout: Duration,
) -> Result<PvmInstance> {
    info!(pvm_instance_id, ?software_tier, "waiting for the virtual serial number");
    StateChangeConf::new(&["pending"], &["assigned"], timeout)
        .delay(VSN_DELAY)
        .min_timeout(VSN_POLL)
        .wait_for_state(|| async move {
            let pvm = instances.get(pvm_instance_id).await?;
            let assigned = pvm.status.eq_ignore_ascii_case("SHUTOFF")
                && pvm.virtual_serial_number.as_ref().is_some_and(|vsn| {
                    software_tier.map_or(true, |tier| vsn.software_tier == tier)
                });
            let state = if assigned { "assigned" } else { "pending" };
            Ok::<_, anyhow::Error>((Some(pvm), state.to_owned()))
        })
        .await?
        .ok_or_else(|| anyhow!("instance {pvm_instance_id} disappeared"))
}

/// Wait until the LPAR reports no serial number anymore
pub(super) async fn wait_vsn_removed(
    instances: &InstanceClient,
    pvm_instance_id: &str,
    timeout: Duration,
) -> Result<PvmInstance> {
    info!(pvm_instance_id, "waiting for the virtual serial number removal");
    StateChangeConf::new(&["pending"], &["removed"], timeout)
        .delay(VSN_DELAY)
        .min_timeout(VSN_POLL)
        .wait_for_state(|| async move {
            let pvm = instances.get(pvm_instance_id).await?;
            let state = if pvm.virtual_serial_number.is_none() {
                "removed"
            } else {
                "pending"
            };
            Ok::<_, anyhow::Error>((Some(pvm), state.to_owned()))
        })
        .await?
        .ok_or_else(|| anyhow!("instance {pvm_instance_id} disappeared"))
}
