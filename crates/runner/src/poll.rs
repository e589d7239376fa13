// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Waiting on a job with exponential backoff.
//!
//! The poller is an explicit `(elapsed, interval)` loop: check the record,
//! sleep, double the interval up to a cap, repeat. It never busy-spins and
//! never mutates a job it does not own — on its own timeout the job is left
//! exactly as it was.

use crate::Runner;
use errand_core::{Clock, Job};
use errand_store::RegistryError;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Upper bound on a wait request. Longer requests are clamped, not rejected.
pub const MAX_WAIT_TIMEOUT: Duration = Duration::from_secs(3600);

/// How much of the output file a wait result carries back.
const PREVIEW_MAX_BYTES: usize = 16 * 1024;

/// Backoff tuning for the poll loop.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// First sleep interval; the floor must be positive
    pub floor: Duration,
    /// Interval cap; growth is geometric (doubling) up to this ceiling
    pub ceiling: Duration,
}

impl PollConfig {
    /// Defaults, overridable via `ERRAND_WAIT_POLL_MS` /
    /// `ERRAND_WAIT_POLL_MAX_MS`.
    pub fn from_env() -> Self {
        Self {
            floor: crate::env::wait_poll_floor(),
            ceiling: crate::env::wait_poll_ceiling(),
        }
    }

    fn clamped(&self) -> (Duration, Duration) {
        let floor = self.floor.max(Duration::from_millis(1));
        let ceiling = self.ceiling.max(floor);
        (floor, ceiling)
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            floor: Duration::from_millis(200),
            ceiling: Duration::from_secs(5),
        }
    }
}

/// How a wait ended. Timeout is the poller giving up, not a job outcome —
/// the job may still be running.
#[derive(Debug)]
pub enum WaitOutcome {
    Terminal { job: Job, output_preview: String },
    Timeout { job: Job },
}

#[derive(Debug, Error)]
pub enum WaitError {
    #[error("job not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl<C: Clock> Runner<C> {
    /// Poll a job until it reaches a terminal status or `timeout` elapses.
    ///
    /// A terminal status observed by a poll that completed before the
    /// deadline wins; otherwise the result is `Timeout` — never both.
    pub async fn wait_for_job(
        &self,
        id: &str,
        timeout: Duration,
        config: &PollConfig,
    ) -> Result<WaitOutcome, WaitError> {
        let timeout = timeout.min(MAX_WAIT_TIMEOUT);
        let (floor, ceiling) = config.clamped();
        let started = self.clock().now();
        let mut interval = floor;

        loop {
            let job = self
                .check_job(id)?
                .ok_or_else(|| WaitError::NotFound(id.to_string()))?;

            if job.is_terminal() {
                let output_preview = read_preview(&job.output_file);
                tracing::debug!(job_id = %job.id, status = %job.status, "wait observed terminal status");
                return Ok(WaitOutcome::Terminal { job, output_preview });
            }

            let elapsed = self.clock().now().duration_since(started);
            if elapsed >= timeout {
                tracing::debug!(job_id = %job.id, elapsed_ms = elapsed.as_millis() as u64, "wait timed out; job left running");
                return Ok(WaitOutcome::Timeout { job });
            }

            // Never sleep past the deadline
            let sleep_for = interval.min(timeout - elapsed);
            tokio::time::sleep(sleep_for).await;
            interval = (interval * 2).min(ceiling);
        }
    }
}

/// First `PREVIEW_MAX_BYTES` of the output file, lossily decoded. Missing
/// output (job produced nothing yet) is an empty preview, not an error.
fn read_preview(path: &Path) -> String {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(_) => return String::new(),
    };
    if bytes.len() <= PREVIEW_MAX_BYTES {
        String::from_utf8_lossy(&bytes).into_owned()
    } else {
        let mut preview = String::from_utf8_lossy(&bytes[..PREVIEW_MAX_BYTES]).into_owned();
        preview.push_str("\n… [output truncated]");
        preview
    }
}

#[cfg(test)]
#[path = "poll_tests.rs"]
mod tests;
