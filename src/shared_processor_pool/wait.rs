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

use anyhow::{anyhow, Result};
use tracing::info;

use crate::client::models::SharedProcessorPoolDetail;
use crate::client::SharedProcessorPoolClient;
use crate::state_change::StateChangeConf;

const POLL: Duration = Duration::from_secs(30);

/// Wait until the pool is `active`
pub(super) async fn wait_active(
    client: &SharedProcessorPoolClient,
    id: &str,
    timeout: Duration,
) -> Result<SharedProcessorPoolDetail> {
    info!(id, "waiting for the shared processor pool to be active");
    StateChangeConf::new(&["configuring"], &["active"], timeout)
        .delay(Duration::from_secs(10))
        .min_timeout(POLL)
        .wait_for_state(|| async move {
            let detail = client.get(id).await?;
            let pool = &detail.shared_processor_pool;
            if pool.status == "error" {
                return Err(anyhow!(
                    "shared processor pool {id} is in error: {}",
                    pool.status_detail
                ));
            }
            let status = pool.status.clone();
            Ok::<_, anyhow::Error>((Some(detail), status))
        })
        .await?
        .ok_or_else(|| anyhow!("shared processor pool {id} disappeared"))
}

/// Wait until the pool cannot be found anymore
pub(super) async fn wait_deleted(
    client: &SharedProcessorPoolClient,
    id: &str,
    timeout: Duration,
) -> Result<()> {
    info!(id, "waiting for the shared processor pool to be deleted");
    StateChangeConf::new(&["deleting"], &[], timeout)
        .delay(Duration::from_secs(10))
        .min_timeout(POLL)
        .wait_for_state(|| async move {
            match client.get(id).await {
                Ok(_) => Ok((Some(()), "deleting".to_owned())),
                Err(err) if err.is_not_found() => Ok((None, String::new())),
                Err(err) => Err(anyhow::Error::from(err)),
            }
        })
        .await?;
    Ok(())
}
