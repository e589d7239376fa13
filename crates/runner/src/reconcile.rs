// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Exit-marker reconciliation.
//!
//! The background wrapper records the child's exit code in a marker file
//! because it cannot safely rewrite the job document itself. Every
//! registry-reading operation in the runner folds a pending marker into
//! the record here, so completion is observed even when the launching
//! process is long gone.

use crate::Runner;
use errand_core::{Clock, Job, JobStatus, Provider};
use errand_store::RegistryError;
use serde_json::{Map, Value};

impl<C: Clock> Runner<C> {
    /// Current record for a job id, with any pending exit marker applied.
    /// `Ok(None)` when the id is unknown.
    pub fn check_job(&self, id: &str) -> Result<Option<Job>, RegistryError> {
        let Some(job) = self.registry().find_job(id)? else {
            return Ok(None);
        };
        self.refresh(job).map(Some)
    }

    /// Like [`check_job`](Self::check_job) with a known provider, skipping
    /// the provider scan.
    pub fn check_job_for(
        &self,
        provider: &Provider,
        id: &str,
    ) -> Result<Option<Job>, RegistryError> {
        let Some(job) = self.registry().get_job(provider, id)? else {
            return Ok(None);
        };
        self.refresh(job).map(Some)
    }

    /// Fold a pending exit marker into a non-terminal record.
    pub(crate) fn refresh(&self, job: Job) -> Result<Job, RegistryError> {
        if job.is_terminal() {
            return Ok(job);
        }
        let Some(code) = self.registry().take_exit_marker(&job.provider, &job.id)? else {
            return Ok(job);
        };
        let (status, error) = match code {
            0 => (JobStatus::Completed, None),
            code => (
                JobStatus::Failed,
                Some(format!("process exited with code {code}")),
            ),
        };
        tracing::info!(job_id = %job.id, exit_code = code, %status, "reconciled exit marker");
        let patch = terminal_patch(status, error.as_deref(), self.clock().epoch_ms());
        self.registry().update_job(&job.provider, &job.id, patch)
    }
}

/// Patch moving a record to `running` with its pid.
pub(crate) fn running_patch(pid: u32) -> Map<String, Value> {
    let mut patch = Map::new();
    patch.insert("status".to_string(), Value::String("running".to_string()));
    patch.insert("pid".to_string(), Value::from(pid));
    patch
}

/// Patch moving a record to a terminal status.
pub(crate) fn terminal_patch(
    status: JobStatus,
    error: Option<&str>,
    epoch_ms: u64,
) -> Map<String, Value> {
    let mut patch = Map::new();
    patch.insert("status".to_string(), Value::String(status.to_string()));
    patch.insert("completed_at_ms".to_string(), Value::from(epoch_ms));
    if let Some(error) = error {
        patch.insert("error".to_string(), Value::String(error.to_string()));
    }
    patch
}

#[cfg(test)]
#[path = "reconcile_tests.rs"]
mod tests;
