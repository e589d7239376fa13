// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job record and status machine.

use crate::clock::Clock;
use crate::provider::Provider;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

crate::define_id! {
    /// Unique identifier for a tracked background invocation.
    ///
    /// Each launch gets a unique ID that callers use to poll status,
    /// wait for completion, and deliver signals.
    pub struct JobId("job-");
}

/// Lifecycle status of a job.
///
/// Transitions are `spawned → running → {completed, failed, timeout, killed}`.
/// Terminal statuses are final: the registry refuses any further status write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Record created, process not yet confirmed started
    Spawned,
    /// OS confirmed the process started
    Running,
    /// Process exited with code 0
    Completed,
    /// Process exited non-zero or failed to spawn
    Failed,
    /// A supervising waiter gave up and terminated the process
    Timeout,
    /// Terminated via an explicit kill request
    Killed,
}

impl JobStatus {
    /// Check if this status admits no further transition.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Timeout | JobStatus::Killed
        )
    }
}

crate::simple_display! {
    JobStatus {
        Spawned => "spawned",
        Running => "running",
        Completed => "completed",
        Failed => "failed",
        Timeout => "timeout",
        Killed => "killed",
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown job status '{0}'")]
pub struct ParseStatusError(String);

impl std::str::FromStr for JobStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "spawned" => Ok(JobStatus::Spawned),
            "running" => Ok(JobStatus::Running),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            "timeout" => Ok(JobStatus::Timeout),
            "killed" => Ok(JobStatus::Killed),
            other => Err(ParseStatusError(other.to_string())),
        }
    }
}

/// Status filter for job listings.
///
/// `active` is shorthand for `{spawned, running}`; any other value matches
/// that literal status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter {
    Active,
    Only(JobStatus),
}

impl StatusFilter {
    pub fn matches(&self, status: JobStatus) -> bool {
        match self {
            StatusFilter::Active => {
                matches!(status, JobStatus::Spawned | JobStatus::Running)
            }
            StatusFilter::Only(wanted) => status == *wanted,
        }
    }
}

impl Default for StatusFilter {
    fn default() -> Self {
        StatusFilter::Active
    }
}

impl std::str::FromStr for StatusFilter {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "active" {
            Ok(StatusFilter::Active)
        } else {
            Ok(StatusFilter::Only(s.parse()?))
        }
    }
}

/// One tracked invocation of an external assistant CLI.
///
/// Persisted as a single JSON document under `jobs/<provider>/<id>` in the
/// state directory. The launcher creates the record; after that only the
/// spawned process (via its exit marker) and the supervising wait loop write
/// to `status`, `completed_at_ms`, and `error`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub provider: Provider,
    pub status: JobStatus,
    /// Rendered invocation line, kept for display and audit
    pub command: String,
    /// Audit copy of an inline prompt, or the caller-supplied prompt file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_file: Option<PathBuf>,
    /// Where the child's stdout/stderr land; may not exist while running
    pub output_file: PathBuf,
    /// Process-group leader pid, present once spawned; used only for signaling
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    pub created_at_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at_ms: Option<u64>,
    /// Populated only on failed/timeout/killed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Job {
    /// Create a new job record in the `spawned` state.
    pub fn new(
        id: JobId,
        provider: Provider,
        command: impl Into<String>,
        output_file: PathBuf,
        clock: &impl Clock,
    ) -> Self {
        Self {
            id,
            provider,
            status: JobStatus::Spawned,
            command: command.into(),
            prompt_file: None,
            output_file,
            pid: None,
            created_at_ms: clock.epoch_ms(),
            completed_at_ms: None,
            error: None,
        }
    }

    /// Check if the job is in a terminal state
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Record the OS-confirmed process start.
    pub fn mark_running(&mut self, pid: u32) {
        self.status = JobStatus::Running;
        self.pid = Some(pid);
    }

    /// Record a terminal outcome. Error text is kept only for non-completed
    /// outcomes, matching the record's invariant.
    pub fn mark_terminal(&mut self, status: JobStatus, error: Option<String>, epoch_ms: u64) {
        self.status = status;
        self.completed_at_ms = Some(epoch_ms);
        self.error = if status == JobStatus::Completed { None } else { error };
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
