// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `errand job` - job inspection and control

use anyhow::Result;
use clap::{Args, Subcommand};
use errand_core::{Clock, JobStatus, Provider, StatusFilter};
use errand_runner::{parse_signal, PollConfig, Runner, WaitError, WaitOutcome};

use crate::exit_error::ExitError;
use crate::output::{format_job_list, format_or_json, print_job_detail, OutputFormat};

#[derive(Args)]
pub struct JobArgs {
    #[command(subcommand)]
    pub command: JobCommand,
}

#[derive(Subcommand)]
pub enum JobCommand {
    /// List jobs, newest first
    List {
        /// Filter: "active" (spawned+running) or a literal status
        #[arg(long, default_value = "active")]
        status: String,

        /// Maximum number of jobs to show
        #[arg(short = 'n', long, default_value = "50")]
        limit: usize,

        /// Restrict to one provider
        #[arg(long)]
        provider: Option<String>,
    },
    /// Show the current record for a job
    Status {
        /// Job ID
        id: String,
    },
    /// Block until a job reaches a terminal status
    Wait {
        /// Job ID
        id: String,

        /// Give up after this long (e.g. "30s", "5m"; clamped to 1h)
        #[arg(long, default_value = "1h")]
        timeout: String,
    },
    /// Send a termination signal to a running job
    Kill {
        /// Job ID
        id: String,

        /// Signal name (default: TERM)
        #[arg(long)]
        signal: Option<String>,
    },
}

pub async fn handle<C: Clock>(
    command: JobCommand,
    runner: &Runner<C>,
    format: OutputFormat,
) -> Result<()> {
    match command {
        JobCommand::List { status, limit, provider } => {
            let filter: StatusFilter = status.parse()?;
            let provider = provider.map(|p| p.parse::<Provider>()).transpose()?;
            let jobs = runner.list_jobs(provider.as_ref(), filter, limit)?;
            let now_ms = runner.clock().epoch_ms();
            format_or_json(format, &jobs, || {
                format_job_list(&mut std::io::stdout(), &jobs, now_ms);
            })?;
        }
        JobCommand::Status { id } => {
            let Some(job) = runner.check_job(&id)? else {
                return Err(ExitError::new(1, format!("Job not found: {}", id)).into());
            };
            let now_ms = runner.clock().epoch_ms();
            format_or_json(format, &job, || print_job_detail(&job, now_ms))?;
        }
        JobCommand::Wait { id, timeout } => {
            let timeout = super::parse_duration(&timeout)?;
            let outcome = runner.wait_for_job(&id, timeout, &PollConfig::from_env()).await;
            match outcome {
                Ok(WaitOutcome::Terminal { job, output_preview }) => {
                    format_or_json(format, &job, || {
                        if !output_preview.is_empty() {
                            println!("{}", output_preview.trim_end());
                        }
                    })?;
                    if job.status != JobStatus::Completed {
                        return Err(ExitError::new(
                            1,
                            format!(
                                "job {} {}: {}",
                                job.id,
                                job.status,
                                job.error.as_deref().unwrap_or("")
                            ),
                        )
                        .into());
                    }
                }
                Ok(WaitOutcome::Timeout { job }) => {
                    return Err(ExitError::timeout(format!(
                        "wait timed out; job {} is still {}",
                        job.id, job.status
                    ))
                    .into());
                }
                Err(WaitError::NotFound(id)) => {
                    return Err(ExitError::new(1, format!("Job not found: {}", id)).into());
                }
                Err(e) => return Err(e.into()),
            }
        }
        JobCommand::Kill { id, signal } => {
            let signal = signal.as_deref().map(parse_signal).transpose()?;
            match runner.kill_job(None, &id, signal) {
                Ok(job) => {
                    format_or_json(format, &job, || {
                        println!("Killed job {}", job.id);
                    })?;
                }
                Err(e) => return Err(ExitError::new(1, e.to_string()).into()),
            }
        }
    }
    Ok(())
}
