// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Output helpers shared by the command handlers.

use anyhow::Result;
use errand_core::Job;
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Print `value` as JSON, or run the text formatter.
pub fn format_or_json<T: Serialize>(
    format: OutputFormat,
    value: &T,
    text: impl FnOnce(),
) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(value)?);
            Ok(())
        }
        OutputFormat::Text => {
            text();
            Ok(())
        }
    }
}

/// Compact "3s ago" / "5m ago" / "2h ago" rendering.
pub fn format_time_ago(now_ms: u64, then_ms: u64) -> String {
    let delta_s = now_ms.saturating_sub(then_ms) / 1000;
    if delta_s < 60 {
        format!("{}s ago", delta_s)
    } else if delta_s < 3600 {
        format!("{}m ago", delta_s / 60)
    } else if delta_s < 86_400 {
        format!("{}h ago", delta_s / 3600)
    } else {
        format!("{}d ago", delta_s / 86_400)
    }
}

pub fn format_job_list(out: &mut (impl Write + ?Sized), jobs: &[Job], now_ms: u64) {
    if jobs.is_empty() {
        let _ = writeln!(out, "No jobs");
        return;
    }
    let _ = writeln!(
        out,
        "{:<24} {:<10} {:<10} {:<10} {:<8}",
        "ID", "PROVIDER", "STATUS", "CREATED", "PID"
    );
    for job in jobs {
        let pid = job.pid.map(|p| p.to_string()).unwrap_or_else(|| "-".to_string());
        let _ = writeln!(
            out,
            "{:<24} {:<10} {:<10} {:<10} {:<8}",
            job.id.as_str(),
            job.provider,
            job.status,
            format_time_ago(now_ms, job.created_at_ms),
            pid
        );
    }
}

pub fn print_job_detail(job: &Job, now_ms: u64) {
    println!("Job: {}", job.id);
    println!("  Provider: {}", job.provider);
    println!("  Status: {}", job.status);
    println!("  Command: {}", job.command);
    if let Some(prompt) = &job.prompt_file {
        println!("  Prompt: {}", prompt.display());
    }
    println!("  Output: {}", job.output_file.display());
    if let Some(pid) = job.pid {
        println!("  Pid: {}", pid);
    }
    println!("  Created: {}", format_time_ago(now_ms, job.created_at_ms));
    if let Some(completed) = job.completed_at_ms {
        println!("  Completed: {}", format_time_ago(now_ms, completed));
    }
    if let Some(error) = &job.error {
        println!("  Error: {}", error);
    }
}

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;
