// This file is part of the terraform-provider-cloudbolt project
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

//! Wait for a remote asynchronous operation to reach a terminal state
//!
//! Every mutating call of the CloudBolt and OneFuse APIs answers with a reference to an operation
//! (an order, a job, or a OneFuse job status) that must be polled until it either succeeds or fails.
//! [`wait_for_state`] implements the polling loop once, and each kind of operation plugs its own
//! vocabulary and failure report through the [`StatusSource`] trait.

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::{sleep, Instant};
use tracing::{debug, info};

use crate::error::{Error, Result};

mod action;
mod job;
mod job_status;
mod order;
mod report;

pub use action::wait_for_action;
pub use job::{JobOperation, JOB_STATES};
pub use job_status::{JobStatusOperation, JOB_STATUS_STATES};
pub use order::{OrderOperation, ORDER_STATES};
pub use report::Report;

/// Delay between two fetches of the operation status
pub const DEFAULT_DELAY: Duration = Duration::from_secs(10);

/// Number of consecutive unrecognized states after which the operation is considered failed
pub const DEFAULT_UNKNOWN_STATE_LIMIT: usize = 3;

/// States of an operation, grouped by meaning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Vocabulary {
    /// The operation is still running
    pub pending: &'static [&'static str],
    /// The operation succeeded
    pub target: &'static [&'static str],
    /// The operation failed
    pub failure: &'static [&'static str],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateClass {
    Pending,
    Target,
    Failure,
    Unknown,
}

impl Vocabulary {
    pub fn classify(&self, state: &str) -> StateClass {
        if self.target.contains(&state) {
            StateClass::Target
        } else if self.failure.contains(&state) {
            StateClass::Failure
        } else if self.pending.contains(&state) {
            StateClass::Pending
        } else {
            StateClass::Unknown
        }
    }
}

/// Remote operation that can be polled
#[async_trait]
pub trait StatusSource: Send + Sync {
    /// Status document of the operation
    type Status: Send + Sync;

    /// Name of the kind of operation, used in messages
    fn kind(&self) -> &'static str;

    /// Reference of the operation, used in messages
    fn reference(&self) -> &str;

    fn vocabulary(&self) -> &Vocabulary;

    /// Fetch the current status of the operation
    async fn fetch(&self) -> Result<Self::Status>;

    /// Extract the state from a status document
    fn state<'s>(&self, status: &'s Self::Status) -> &'s str;

    /// Human readable report of a failed operation
    async fn failure_report(&self, status: &Self::Status) -> String;
}

/// Timing of the polling loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitConfig {
    pub delay: Duration,
    pub timeout: Duration,
    /// Zero disables the limit
    pub unknown_state_limit: usize,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            delay: DEFAULT_DELAY,
            timeout: Duration::from_secs(30 * 60),
            unknown_state_limit: DEFAULT_UNKNOWN_STATE_LIMIT,
        }
    }
}

impl WaitConfig {
    /// Poll with the default delay until `minutes` have elapsed
    pub fn minutes(minutes: i64) -> Self {
        Self {
            timeout: Duration::from_secs(minutes.max(0) as u64 * 60),
            ..Default::default()
        }
    }
}

/// Poll `source` until it reaches a target state
///
/// The first fetch is done immediately, and the following ones every `config.delay`.
/// The loop stops:
/// - with the last status when a target state is reached,
/// - with [`Error::Failed`] carrying the failure report when a failure state is reached,
/// - with the fetch error as soon as a fetch fails,
/// - with [`Error::Timeout`] when the operation is still pending after `config.timeout`,
/// - with [`Error::UnexpectedState`] after `config.unknown_state_limit` consecutive unrecognized states.
///
/// The last fetch happens at the deadline, so the wait never exceeds `config.timeout` plus the
/// duration of a fetch.
pub async fn wait_for_state<S: StatusSource>(source: &S, config: &WaitConfig) -> Result<S::Status> {
    let start = Instant::now();
    let mut unknown_count = 0;

    loop {
        let status = source.fetch().await?;
        let state = source.state(&status);

        match source.vocabulary().classify(state) {
            StateClass::Target => {
                info!(
                    kind = source.kind(),
                    reference = source.reference(),
                    state,
                    "operation completed"
                );
                return Ok(status);
            }
            StateClass::Failure => {
                info!(
                    kind = source.kind(),
                    reference = source.reference(),
                    state,
                    "operation failed"
                );
                return Err(Error::Failed(source.failure_report(&status).await));
            }
            StateClass::Pending => {
                unknown_count = 0;
            }
            StateClass::Unknown => {
                unknown_count += 1;
                if config.unknown_state_limit > 0 && unknown_count >= config.unknown_state_limit {
                    return Err(Error::UnexpectedState {
                        kind: source.kind(),
                        reference: source.reference().to_owned(),
                        state: state.to_owned(),
                        count: unknown_count,
                    });
                }
            }
        }

        let elapsed = start.elapsed();
        if elapsed >= config.timeout {
            return Err(Error::Timeout {
                kind: source.kind(),
                reference: source.reference().to_owned(),
                elapsed,
            });
        }

        debug!(
            kind = source.kind(),
            reference = source.reference(),
            state,
            elapsed = elapsed.as_secs(),
            "operation still pending"
        );
        sleep(config.delay.min(config.timeout - elapsed)).await;
    }
}
