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

//! Polling of asynchronous PowerVS operations
//!
//! A [`StateChangeConf`] describes which states are transient (`pending`) and
//! which ones end the wait (`target`). [`StateChangeConf::wait_for_state`]
//! calls the refresh function until the object reaches a target state, the
//! deadline passes, or the refresh reports a state outside both sets.

use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use rand::Rng;
use thiserror::Error;
use tokio::time::{sleep_until, timeout_at, Instant};
use tracing::debug;

use crate::timeouts::format_duration;

pub const DEFAULT_NOT_FOUND_CHECKS: u32 = 20;

static POLL_SCALE: AtomicU32 = AtomicU32::new(100);

/// Scale every polling delay and interval, in percent
///
/// Mock servers answer immediately: tests run with a scale of 0.
pub fn set_poll_scale(percent: u32) {
    POLL_SCALE.store(percent, Ordering::Relaxed);
}

fn scaled(duration: Duration) -> Duration {
    duration * POLL_SCALE.load(Ordering::Relaxed) / 100
}

#[derive(Error, Debug)]
pub enum WaitError {
    #[error("timeout while waiting for state to become '{target}' (last state: '{last_state}', timeout: {timeout})")]
    Timeout {
        last_state: String,
        target: String,
        timeout: String,
    },

    #[error("unexpected state '{state}', wanted target '{expected}'")]
    UnexpectedState { state: String, expected: String },

    #[error("couldn't find resource ({checks} retries)")]
    NotFound { checks: u32 },

    #[error(transparent)]
    Refresh(#[from] anyhow::Error),
}

#[derive(Debug, Clone)]
pub struct StateChangeConf<'a> {
    pub pending: Vec<&'a str>,
    pub target: Vec<&'a str>,
    /// Wait before the first refresh
    pub delay: Duration,
    /// Interval between two refreshes
    pub min_timeout: Duration,
    pub timeout: Duration,
    pub not_found_checks: u32,
}

impl<'a> StateChangeConf<'a> {
    pub fn new(pending: &[&'a str], target: &[&'a str], timeout: Duration) -> Self {
        Self {
            pending: pending.to_vec(),
            target: target.to_vec(),
            delay: Duration::ZERO,
            min_timeout: Duration::from_secs(10),
            timeout,
            not_found_checks: DEFAULT_NOT_FOUND_CHECKS,
        }
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn min_timeout(mut self, min_timeout: Duration) -> Self {
        self.min_timeout = min_timeout;
        self
    }

    /// Poll `refresh` until the object reaches one of the target states
    ///
    /// The refresh returns the object, or `None` if it does not exist, with its
    /// current state. With an empty `target`, a missing object ends the wait
    /// successfully with `None`.
    pub async fn wait_for_state<T, F, Fut>(&self, mut refresh: F) -> Result<Option<T>, WaitError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = anyhow::Result<(Option<T>, String)>>,
    {
        let deadline = Instant::now() + self.timeout;
        let mut last_state = String::new();
        let mut not_found = 0;

        sleep_until(deadline.min(Instant::now() + scaled(self.delay))).await;

        loop {
            let timeout_error = |last_state: &str| WaitError::Timeout {
                last_state: last_state.to_owned(),
                target: self.target.join(", "),
                timeout: format_duration(self.timeout),
            };
            if Instant::now() >= deadline {
                return Err(timeout_error(&last_state));
            }

            let (object, state) = timeout_at(deadline, refresh())
                .await
                .map_err(|_| timeout_error(&last_state))??;

            if state != last_state {
                debug!(from = %last_state, to = %state, "state transition");
            }

            match object {
                None if self.target.is_empty() => return Ok(None),
                None => {
                    not_found += 1;
                    if not_found > self.not_found_checks {
                        return Err(WaitError::NotFound {
                            checks: self.not_found_checks,
                        });
                    }
                }
                Some(object) => {
                    not_found = 0;
                    if self.target.contains(&state.as_str()) {
                        return Ok(Some(object));
                    }
                    if !self.pending.contains(&state.as_str()) {
                        return Err(WaitError::UnexpectedState {
                            state,
                            expected: self.target.join(", "),
                        });
                    }
                }
            }
            last_state = state;

            sleep_until(deadline.min(Instant::now() + self.poll_interval())).await;
        }
    }

    fn poll_interval(&self) -> Duration {
        let min_timeout = scaled(self.min_timeout);
        let max_jitter = min_timeout.as_millis() as u64 / 10;
        let jitter = if max_jitter > 0 {
            rand::thread_rng().gen_range(0..=max_jitter)
        } else {
            0
        };
        min_timeout + Duration::from_millis(jitter)
    }
}
