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

//! Power state transitions of an LPAR

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use tracing::{debug, info};

use crate::client::models::PvmInstance;
use crate::client::InstanceClient;
use crate::state_change::StateChangeConf;

pub const AVAILABLE_POLL: Duration = Duration::from_secs(2 * 60);
pub const WARNING_POLL: Duration = Duration::from_secs(60);
pub const STOPPED_TIMEOUT: Duration = Duration::from_secs(30 * 60);
pub const RESIZE_TIMEOUT: Duration = Duration::from_secs(60 * 60);
pub const DELETED_TIMEOUT: Duration = Duration::from_secs(10 * 60);
/// Timeout of the restart following a stopped resource change
pub const START_TIMEOUT: Duration = Duration::from_secs(120 * 60);

/// Wait until the instance is `ACTIVE` with the given health status
///
/// A health status of `OK` is always accepted.
pub async fn wait_available(
    client: &InstanceClient,
    id: &str,
    ready_status: &str,
    timeout: Duration,
) -> Result<PvmInstance> {
    info!(id, ready_status, "waiting for the instance to be available");
    let poll = if ready_status == "WARNING" {
        WARNING_POLL
    } else {
        AVAILABLE_POLL
    };
    StateChangeConf::new(
        &["PENDING", "BUILD", "WARNING"],
        &["ACTIVE", "OK", "ERROR", ""],
        timeout,
    )
    .delay(Duration::from_secs(30))
    .min_timeout(poll)
    .wait_for_state(|| async move {
        let pvm = client.get(id).await?;
        if pvm.status == "ACTIVE" && [ready_status, "OK"].contains(&pvm.health_status()) {
            return Ok((Some(pvm), "ACTIVE".to_owned()));
        }
        if pvm.status == "ERROR" {
            return Err(anyhow!("failed to create the lpar"));
        }
        Ok::<_, anyhow::Error>((Some(pvm), "BUILD".to_owned()))
    })
    .await?
    .ok_or_else(|| anyhow!("instance {id} disappeared"))
}

/// Wait until the instance is `SHUTOFF` and healthy
pub async fn wait_stopped(client: &InstanceClient, id: &str) -> Result<PvmInstance> {
    info!(id, "waiting for the instance to be stopped");
    StateChangeConf::new(
        &["STOPPING", "RESIZE", "VERIFY_RESIZE", "WARNING"],
        &["OK", "SHUTOFF"],
        STOPPED_TIMEOUT,
    )
    .delay(Duration::from_secs(10))
    .min_timeout(Duration::from_secs(2 * 60))
    .wait_for_state(|| async move {
        let pvm = client.get(id).await?;
        let state = if pvm.status == "SHUTOFF" && pvm.health_status() == "OK" {
            "SHUTOFF"
        } else {
            "STOPPING"
        };
        Ok::<_, anyhow::Error>((Some(pvm), state.to_owned()))
    })
    .await?
    .ok_or_else(|| anyhow!("instance {id} disappeared"))
}

/// Wait until a resize of a stopped instance settles
pub async fn wait_resized(client: &InstanceClient, id: &str) -> Result<PvmInstance> {
    info!(id, "waiting for the instance resize");
    StateChangeConf::new(
        &["RESIZE", "VERIFY_RESIZE"],
        &["ACTIVE", "SHUTOFF", "OK"],
        RESIZE_TIMEOUT,
    )
    .delay(Duration::from_secs(10))
    .min_timeout(Duration::from_secs(5 * 60))
    .wait_for_state(|| async move {
        let pvm = client.get(id).await?;
        let state = if pvm.status == "SHUTOFF" && pvm.health_status() == "OK" {
            "SHUTOFF"
        } else {
            "RESIZE"
        };
        Ok::<_, anyhow::Error>((Some(pvm), state.to_owned()))
    })
    .await?
    .ok_or_else(|| anyhow!("instance {id} disappeared"))
}

/// Wait until the instance cannot be found anymore
pub async fn wait_deleted(client: &InstanceClient, id: &str, timeout: Duration) -> Result<()> {
    info!(id, "waiting for the instance to be deleted");
    StateChangeConf::new(&["retry", "DELETING"], &["Not Found"], timeout)
        .delay(Duration::from_secs(10))
        .min_timeout(Duration::from_secs(10))
        .wait_for_state(|| async move {
            match client.get(id).await {
                Ok(_) => Ok((Some(()), "DELETING".to_owned())),
                Err(err) if err.is_not_found() => Ok((Some(()), "Not Found".to_owned())),
                Err(err) => Err(anyhow::Error::from(err)),
            }
        })
        .await?;
    Ok(())
}

/// Immediately shut the instance down and wait for it to be stopped
pub async fn stop(client: &InstanceClient, id: &str) -> Result<PvmInstance> {
    debug!(id, "stopping instance");
    client
        .action(id, "immediate-shutdown")
        .await
        .context("failed to perform the stop action on the pvm instance")?;
    wait_stopped(client, id).await
}

/// Start the instance and wait for it to be available
pub async fn start(client: &InstanceClient, id: &str) -> Result<PvmInstance> {
    start_within(client, id, START_TIMEOUT).await
}

pub async fn start_within(
    client: &InstanceClient,
    id: &str,
    timeout: Duration,
) -> Result<PvmInstance> {
    debug!(id, "starting instance");
    client
        .action(id, "start")
        .await
        .context("failed to perform the start action on the pvm instance")?;
    wait_available(client, id, "OK", timeout).await
}

/// Stop unless already `SHUTOFF`, returning whether the instance was running
pub async fn stop_if_running(client: &InstanceClient, id: &str) -> Result<bool> {
    let pvm = client.get(id).await?;
    if pvm.status == "SHUTOFF" {
        return Ok(false);
    }
    stop(client, id).await?;
    Ok(true)
}
