// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process launching — validation, audit-prompt persistence, detached
//! background spawn, and the supervised foreground path.

use crate::adapter::{shell_quote, Invocation};
use crate::reconcile::{running_patch, terminal_patch};
use crate::Runner;
use errand_core::{Clock, Job, JobId, JobStatus, Provider};
use errand_store::RegistryError;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;

/// Hard wall-clock cap for a supervised foreground run. Requests above the
/// cap are clamped, not rejected.
pub const MAX_JOB_TIMEOUT: Duration = Duration::from_secs(3600);

/// Grace period between SIGTERM and SIGKILL when a foreground run times out.
const KILL_GRACE: Duration = Duration::from_secs(2);

/// What to launch and how.
#[derive(Debug, Clone)]
pub struct LaunchRequest {
    pub provider: Provider,
    /// Inline prompt text; foreground-only, persisted to an audit file
    pub prompt: Option<String>,
    /// Caller-supplied prompt file; relative paths resolve against `cwd`
    pub prompt_file: Option<PathBuf>,
    /// Where output lands; defaults to `<state>/jobs/<provider>/<id>.out`
    pub output_file: Option<PathBuf>,
    /// Extra arguments appended to the provider invocation
    pub extra_args: Vec<String>,
    /// Working directory, already sanitized by the caller's path resolver
    pub cwd: PathBuf,
    pub background: bool,
    /// Foreground wall-clock cap; clamped to [`MAX_JOB_TIMEOUT`]
    pub timeout: Option<Duration>,
}

impl LaunchRequest {
    pub fn new(provider: Provider, cwd: impl Into<PathBuf>) -> Self {
        Self {
            provider,
            prompt: None,
            prompt_file: None,
            output_file: None,
            extra_args: Vec::new(),
            cwd: cwd.into(),
            background: false,
            timeout: None,
        }
    }
}

/// Result of a launch: a handle to poll later, or the captured output of a
/// blocking run.
#[derive(Debug)]
pub enum Launched {
    Background(Job),
    Foreground { job: Job, output: String },
}

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("no prompt source: provide an inline prompt or a prompt file")]
    MissingPrompt,
    #[error("ambiguous prompt source: provide either an inline prompt or a prompt file, not both")]
    AmbiguousPrompt,
    #[error("prompt must not be empty")]
    EmptyPrompt,
    #[error("inline prompts are foreground-only; use a prompt file for background jobs")]
    InlineBackgroundConflict,
    #[error("prompt file not found: {0}")]
    PromptFileNotFound(PathBuf),
    #[error("working directory does not exist: {0}")]
    WorkingDirMissing(PathBuf),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Prompt source after validation: the file the child will read on stdin.
enum PromptSource {
    /// Inline text, to be persisted to the audit file before spawning
    Inline(String),
    File(PathBuf),
}

impl<C: Clock> Runner<C> {
    /// Launch a provider invocation.
    ///
    /// Background: creates the job record, spawns the wrapper fully detached
    /// (own process group, output redirected, exit marker on completion),
    /// marks the record `running`, and returns without blocking. A spawn
    /// failure after the record exists comes back as a `failed` job, not an
    /// error.
    ///
    /// Foreground: same record lifecycle, but the call supervises the child,
    /// enforces the wall-clock cap, and returns the captured output.
    pub async fn launch(&self, request: LaunchRequest) -> Result<Launched, LaunchError> {
        let source = validate(&request)?;

        let id = JobId::new();
        let provider = request.provider.clone();
        let registry = self.registry();

        let prompt_file = match source {
            PromptSource::Inline(text) => {
                // Persist the inline prompt before spawning, for audit and
                // reproducibility.
                let path = registry.prompt_path(&provider, &id);
                ensure_parent(&path)?;
                std::fs::write(&path, text)?;
                path
            }
            PromptSource::File(path) => path,
        };

        let output_file = match &request.output_file {
            Some(path) => resolve(&request.cwd, path),
            None => registry.output_path(&provider, &id),
        };
        ensure_parent(&output_file)?;

        let invocation = Invocation::build(&provider, &request.extra_args);
        let command = format!("{} < {}", invocation.render(), shell_quote(&prompt_file.to_string_lossy()));

        let mut job = Job::new(id, provider.clone(), command, output_file, self.clock());
        job.prompt_file = Some(prompt_file.clone());
        registry.create_job(&job)?;

        if request.background {
            job = self.spawn_background(job, &request.cwd).await?;
            Ok(Launched::Background(job))
        } else {
            let effective_timeout = request.timeout.unwrap_or(MAX_JOB_TIMEOUT).min(MAX_JOB_TIMEOUT);
            let (job, output) =
                self.run_foreground(job, &invocation, &prompt_file, &request.cwd, effective_timeout).await?;
            Ok(Launched::Foreground { job, output })
        }
    }

    /// Spawn the detached wrapper: run the invocation with stdio redirected,
    /// then record the exit code in the marker file. The wrapper lives in
    /// its own process group so it survives this process and can be signaled
    /// as a unit.
    async fn spawn_background(&self, job: Job, cwd: &Path) -> Result<Job, LaunchError> {
        let registry = self.registry();
        let marker = registry.exit_marker_path(&job.provider, &job.id);
        let marker_tmp = marker.with_extension("exit.tmp");
        let script = format!(
            "{cmd} > {out} 2>&1; status=$?; printf '%s' \"$status\" > {tmp}; mv -f {tmp} {marker}",
            cmd = job.command,
            out = shell_quote(&job.output_file.to_string_lossy()),
            tmp = shell_quote(&marker_tmp.to_string_lossy()),
            marker = shell_quote(&marker.to_string_lossy()),
        );

        let mut cmd = tokio::process::Command::new("bash");
        cmd.arg("-c")
            .arg(&script)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .process_group(0);

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                tracing::error!(job_id = %job.id, error = %e, "background spawn failed");
                let patch = terminal_patch(
                    JobStatus::Failed,
                    Some(&format!("failed to spawn: {e}")),
                    self.clock().epoch_ms(),
                );
                return Ok(registry.update_job(&job.provider, &job.id, patch)?);
            }
        };

        let job = match child.id() {
            Some(pid) => registry.update_job(&job.provider, &job.id, running_patch(pid))?,
            None => {
                tracing::warn!(job_id = %job.id, "spawned wrapper has no pid; leaving record spawned");
                job
            }
        };

        // Reap the wrapper to avoid zombies while this process lives. If we
        // exit first the wrapper is reparented and reaped by init.
        let reaper_id = job.id.clone();
        tokio::spawn(async move {
            match child.wait().await {
                Ok(status) => {
                    tracing::debug!(job_id = %reaper_id, exit_status = %status, "background wrapper exited");
                }
                Err(e) => {
                    tracing::error!(job_id = %reaper_id, error = %e, "failed to wait on background wrapper");
                }
            }
        });

        tracing::info!(job_id = %job.id, provider = %job.provider, pid = ?job.pid, "background job running");
        Ok(job)
    }

    /// Run the invocation under this call's supervision, with a hard
    /// wall-clock cap. This supervisor owns the job, so on the cap it kills
    /// the process group and records `timeout`.
    async fn run_foreground(
        &self,
        job: Job,
        invocation: &Invocation,
        prompt_file: &Path,
        cwd: &Path,
        cap: Duration,
    ) -> Result<(Job, String), LaunchError> {
        let registry = self.registry();
        let stdin = std::fs::File::open(prompt_file)?;
        let stdout = std::fs::File::create(&job.output_file)?;
        let stderr = stdout.try_clone()?;

        let mut cmd = tokio::process::Command::new(&invocation.program);
        cmd.args(&invocation.args)
            .current_dir(cwd)
            .stdin(Stdio::from(stdin))
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::from(stderr))
            .process_group(0);

        let mut child = match cmd.spawn() {
            Err(e) => {
                tracing::error!(job_id = %job.id, program = %invocation.program, error = %e, "foreground spawn failed");
                let patch = terminal_patch(
                    JobStatus::Failed,
                    Some(&format!("failed to spawn: {e}")),
                    self.clock().epoch_ms(),
                );
                let job = registry.update_job(&job.provider, &job.id, patch)?;
                return Ok((job, String::new()));
            }
            Ok(child) => child,
        };

        let mut job = match child.id() {
            Some(pid) => registry.update_job(&job.provider, &job.id, running_patch(pid))?,
            None => job,
        };

        let outcome = tokio::time::timeout(cap, child.wait()).await;
        let patch = match outcome {
            Ok(Ok(status)) => match status.code() {
                Some(0) => terminal_patch(JobStatus::Completed, None, self.clock().epoch_ms()),
                Some(code) => terminal_patch(
                    JobStatus::Failed,
                    Some(&format!("process exited with code {code}")),
                    self.clock().epoch_ms(),
                ),
                None => terminal_patch(
                    JobStatus::Failed,
                    Some("process terminated by signal"),
                    self.clock().epoch_ms(),
                ),
            },
            Ok(Err(e)) => terminal_patch(
                JobStatus::Failed,
                Some(&format!("failed to wait on process: {e}")),
                self.clock().epoch_ms(),
            ),
            Err(_elapsed) => {
                tracing::warn!(job_id = %job.id, cap_s = cap.as_secs(), "foreground run hit wall-clock cap");
                if let Some(pid) = job.pid {
                    crate::control::signal_group(pid, nix::sys::signal::Signal::SIGTERM);
                    if tokio::time::timeout(KILL_GRACE, child.wait()).await.is_err() {
                        crate::control::signal_group(pid, nix::sys::signal::Signal::SIGKILL);
                        let _ = child.wait().await;
                    }
                }
                terminal_patch(
                    JobStatus::Timeout,
                    Some(&format!("wall-clock timeout after {}s", cap.as_secs())),
                    self.clock().epoch_ms(),
                )
            }
        };
        job = registry.update_job(&job.provider, &job.id, patch)?;

        let output = std::fs::read(&job.output_file)
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
            .unwrap_or_default();
        Ok((job, output))
    }
}

fn validate(request: &LaunchRequest) -> Result<PromptSource, LaunchError> {
    if !request.cwd.is_dir() {
        return Err(LaunchError::WorkingDirMissing(request.cwd.clone()));
    }
    match (&request.prompt, &request.prompt_file) {
        (Some(_), Some(_)) => Err(LaunchError::AmbiguousPrompt),
        (None, None) => Err(LaunchError::MissingPrompt),
        (Some(text), None) => {
            if request.background {
                return Err(LaunchError::InlineBackgroundConflict);
            }
            if text.trim().is_empty() {
                return Err(LaunchError::EmptyPrompt);
            }
            Ok(PromptSource::Inline(text.clone()))
        }
        (None, Some(path)) => {
            let path = resolve(&request.cwd, path);
            if !path.is_file() {
                return Err(LaunchError::PromptFileNotFound(path));
            }
            Ok(PromptSource::File(path))
        }
    }
}

/// Resolve a possibly-relative path against the sanitized working directory.
fn resolve(cwd: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}

fn ensure_parent(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "launch_tests.rs"]
mod tests;
