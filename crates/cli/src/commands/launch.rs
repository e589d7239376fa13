// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `errand launch` - start a provider invocation

use anyhow::Result;
use clap::Args;
use errand_core::{Clock, JobStatus, Provider};
use errand_runner::{LaunchRequest, Launched, Runner};
use std::path::PathBuf;

use crate::exit_error::ExitError;
use crate::output::{format_or_json, OutputFormat};

#[derive(Args)]
pub struct LaunchArgs {
    /// Provider CLI family (codex, gemini, or any executable name)
    #[arg(long)]
    provider: String,

    /// Inline prompt text (foreground only; persisted to an audit file)
    #[arg(long)]
    prompt: Option<String>,

    /// File the provider reads its prompt from
    #[arg(long)]
    prompt_file: Option<PathBuf>,

    /// Output file (default: under the state directory)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Detach and return the job id immediately instead of blocking
    #[arg(long)]
    background: bool,

    /// Working directory for the provider process (default: current dir)
    #[arg(long)]
    cwd: Option<PathBuf>,

    /// Wall-clock cap for foreground runs (e.g. "30s", "5m"; max 1h)
    #[arg(long)]
    timeout: Option<String>,

    /// Extra arguments passed through to the provider CLI
    #[arg(last = true)]
    extra_args: Vec<String>,
}

pub async fn handle<C: Clock>(
    args: LaunchArgs,
    runner: &Runner<C>,
    format: OutputFormat,
) -> Result<()> {
    let provider: Provider = args.provider.parse()?;
    let cwd = match args.cwd {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    let mut request = LaunchRequest::new(provider, cwd);
    request.prompt = args.prompt;
    request.prompt_file = args.prompt_file;
    request.output_file = args.output;
    request.background = args.background;
    request.extra_args = args.extra_args;
    if let Some(timeout) = &args.timeout {
        request.timeout = Some(super::parse_duration(timeout)?);
    }

    match runner.launch(request).await? {
        Launched::Background(job) => {
            format_or_json(format, &job, || {
                // Bare id on stdout so scripts can capture it
                println!("{}", job.id);
            })?;
            if job.status == JobStatus::Failed {
                return Err(ExitError::new(
                    1,
                    format!("job failed: {}", job.error.as_deref().unwrap_or("unknown error")),
                )
                .into());
            }
            Ok(())
        }
        Launched::Foreground { job, output } => {
            format_or_json(format, &job, || {
                print!("{}", output);
            })?;
            match job.status {
                JobStatus::Completed => Ok(()),
                JobStatus::Timeout => Err(ExitError::timeout(format!(
                    "job timed out: {}",
                    job.error.as_deref().unwrap_or("")
                ))
                .into()),
                status => Err(ExitError::new(
                    1,
                    format!("job {}: {}", status, job.error.as_deref().unwrap_or("")),
                )
                .into()),
            }
        }
    }
}
