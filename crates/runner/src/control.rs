// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job control — termination signals and listings.

use crate::reconcile::terminal_patch;
use crate::Runner;
use errand_core::{Clock, Job, JobStatus, Provider, StatusFilter};
use errand_store::RegistryError;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum KillError {
    #[error("job not found: {0}")]
    NotFound(String),
    #[error("job {id} is not running (status: {status})")]
    NotRunning { id: String, status: JobStatus },
    #[error("job {0} has no recorded pid")]
    NoPid(String),
    #[error("unknown signal '{0}'")]
    UnknownSignal(String),
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Parse a signal name, with or without the `SIG` prefix (`TERM`,
/// `SIGTERM`, `kill`, ...).
pub fn parse_signal(name: &str) -> Result<Signal, KillError> {
    let upper = name.to_uppercase();
    let full = if upper.starts_with("SIG") { upper } else { format!("SIG{upper}") };
    full.parse::<Signal>().map_err(|_| KillError::UnknownSignal(name.to_string()))
}

impl<C: Clock> Runner<C> {
    /// Deliver a termination signal to a running job and mark it `killed`.
    ///
    /// Only valid from `spawned`/`running`. The signal goes to the recorded
    /// process group; delivery is not guaranteed to stop the process, and
    /// the record is marked `killed` regardless — the registry tracks
    /// intent, not a liveness probe.
    pub fn kill_job(
        &self,
        provider: Option<&Provider>,
        id: &str,
        sig: Option<Signal>,
    ) -> Result<Job, KillError> {
        let job = match provider {
            Some(p) => self.check_job_for(p, id)?,
            None => self.check_job(id)?,
        }
        .ok_or_else(|| KillError::NotFound(id.to_string()))?;

        if !matches!(job.status, JobStatus::Spawned | JobStatus::Running) {
            return Err(KillError::NotRunning { id: id.to_string(), status: job.status });
        }
        let pid = job.pid.ok_or_else(|| KillError::NoPid(id.to_string()))?;

        let sig = sig.unwrap_or(Signal::SIGTERM);
        signal_group(pid, sig);

        let patch = terminal_patch(
            JobStatus::Killed,
            Some(&format!("killed with {sig}")),
            self.clock().epoch_ms(),
        );
        let job = self.registry().update_job(&job.provider, &job.id, patch)?;
        tracing::info!(job_id = %job.id, pid, %sig, "job killed");
        Ok(job)
    }

    /// Jobs newest-first, exit markers reconciled so the `active` shorthand
    /// reflects reality.
    pub fn list_jobs(
        &self,
        provider: Option<&Provider>,
        filter: StatusFilter,
        limit: usize,
    ) -> Result<Vec<Job>, RegistryError> {
        let mut jobs = Vec::new();
        for job in self.registry().list_jobs(provider, None, usize::MAX)? {
            jobs.push(self.refresh(job)?);
        }
        jobs.retain(|job| filter.matches(job.status));
        jobs.truncate(limit);
        Ok(jobs)
    }
}

/// Signal a job's process group. Delivery failure (typically ESRCH after
/// the group exited) is logged, not surfaced.
pub(crate) fn signal_group(pid: u32, sig: Signal) {
    let pgid = Pid::from_raw(pid as i32);
    if let Err(errno) = signal::killpg(pgid, sig) {
        tracing::warn!(pid, %sig, error = %errno, "signal delivery failed");
    }
}

#[cfg(test)]
#[path = "control_tests.rs"]
mod tests;
