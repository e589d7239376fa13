// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::poll::{PollConfig, WaitOutcome};
use errand_core::SystemClock;
use errand_store::{JobRegistry, StateStore};
use std::time::Duration;
use tempfile::TempDir;

fn runner() -> (TempDir, Runner<SystemClock>) {
    let temp = TempDir::new().unwrap();
    let registry = JobRegistry::new(StateStore::new(temp.path().join("state")));
    (temp, Runner::new(registry, SystemClock))
}

/// A provider that resolves to `sh`, so `extra_args` can carry `-c <script>`.
fn sh() -> Provider {
    Provider::parse("sh").unwrap()
}

fn sh_request(cwd: &std::path::Path, script: &str, prompt_file: PathBuf) -> LaunchRequest {
    let mut request = LaunchRequest::new(sh(), cwd);
    request.prompt_file = Some(prompt_file);
    request.extra_args = vec!["-c".to_string(), script.to_string()];
    request
}

fn write_prompt(temp: &TempDir, text: &str) -> PathBuf {
    let path = temp.path().join("prompt.txt");
    std::fs::write(&path, text).unwrap();
    path
}

// --- validation ---

#[tokio::test]
async fn launch_requires_a_prompt_source() {
    let (temp, runner) = runner();
    let request = LaunchRequest::new(sh(), temp.path());
    assert!(matches!(runner.launch(request).await, Err(LaunchError::MissingPrompt)));
}

#[tokio::test]
async fn launch_rejects_two_prompt_sources() {
    let (temp, runner) = runner();
    let prompt_file = write_prompt(&temp, "hi");
    let mut request = LaunchRequest::new(sh(), temp.path());
    request.prompt = Some("hi".to_string());
    request.prompt_file = Some(prompt_file);
    assert!(matches!(runner.launch(request).await, Err(LaunchError::AmbiguousPrompt)));
}

#[tokio::test]
async fn launch_rejects_blank_inline_prompt() {
    let (temp, runner) = runner();
    let mut request = LaunchRequest::new(sh(), temp.path());
    request.prompt = Some("   \n".to_string());
    assert!(matches!(runner.launch(request).await, Err(LaunchError::EmptyPrompt)));
}

#[tokio::test]
async fn inline_prompt_cannot_run_in_background() {
    let (temp, runner) = runner();
    let mut request = LaunchRequest::new(sh(), temp.path());
    request.prompt = Some("hi".to_string());
    request.background = true;
    assert!(matches!(
        runner.launch(request).await,
        Err(LaunchError::InlineBackgroundConflict)
    ));
}

#[tokio::test]
async fn launch_rejects_missing_prompt_file() {
    let (temp, runner) = runner();
    let mut request = LaunchRequest::new(sh(), temp.path());
    request.prompt_file = Some(temp.path().join("nope.txt"));
    assert!(matches!(
        runner.launch(request).await,
        Err(LaunchError::PromptFileNotFound(_))
    ));
}

#[tokio::test]
async fn launch_rejects_missing_working_directory() {
    let (temp, runner) = runner();
    let mut request = LaunchRequest::new(sh(), temp.path().join("not-a-dir"));
    request.prompt = Some("hi".to_string());
    assert!(matches!(
        runner.launch(request).await,
        Err(LaunchError::WorkingDirMissing(_))
    ));
}

// --- foreground ---

#[tokio::test]
async fn foreground_cat_echoes_inline_prompt() {
    let (temp, runner) = runner();
    let mut request = LaunchRequest::new(Provider::parse("cat").unwrap(), temp.path());
    request.prompt = Some("hello from the audit file".to_string());

    let Launched::Foreground { job, output } = runner.launch(request).await.unwrap() else {
        panic!("foreground launch must return captured output");
    };
    assert_eq!(job.status, JobStatus::Completed);
    assert!(job.completed_at_ms.is_some());
    assert_eq!(output, "hello from the audit file");

    // The inline prompt was persisted for audit before spawning
    let audit = job.prompt_file.unwrap();
    assert_eq!(std::fs::read_to_string(audit).unwrap(), "hello from the audit file");
}

#[tokio::test]
async fn foreground_failure_records_exit_code() {
    let (temp, runner) = runner();
    let prompt_file = write_prompt(&temp, "ignored");
    let request = sh_request(temp.path(), "exit 3", prompt_file);

    let Launched::Foreground { job, .. } = runner.launch(request).await.unwrap() else {
        panic!("expected foreground result");
    };
    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.error.as_deref(), Some("process exited with code 3"));
}

#[tokio::test]
async fn foreground_spawn_failure_is_a_failed_job() {
    let (temp, runner) = runner();
    let mut request = LaunchRequest::new(Provider::parse("no-such-binary-xyz").unwrap(), temp.path());
    request.prompt = Some("hi".to_string());

    let Launched::Foreground { job, output } = runner.launch(request).await.unwrap() else {
        panic!("expected foreground result");
    };
    assert_eq!(job.status, JobStatus::Failed);
    assert!(job.error.as_deref().is_some_and(|e| e.starts_with("failed to spawn")));
    assert!(output.is_empty());
}

#[tokio::test]
async fn foreground_wall_clock_cap_times_out_the_job() {
    let (temp, runner) = runner();
    let prompt_file = write_prompt(&temp, "ignored");
    let mut request = sh_request(temp.path(), "sleep 30", prompt_file);
    request.timeout = Some(Duration::from_millis(100));

    let Launched::Foreground { job, .. } = runner.launch(request).await.unwrap() else {
        panic!("expected foreground result");
    };
    assert_eq!(job.status, JobStatus::Timeout);
    assert!(job.error.as_deref().is_some_and(|e| e.contains("wall-clock timeout")));
}

// --- background ---

#[tokio::test]
async fn background_launch_returns_running_without_blocking() {
    let (temp, runner) = runner();
    let prompt_file = write_prompt(&temp, "ignored");
    let mut request = sh_request(temp.path(), "sleep 30", prompt_file);
    request.background = true;

    let started = std::time::Instant::now();
    let Launched::Background(job) = runner.launch(request).await.unwrap() else {
        panic!("expected background result");
    };
    assert!(started.elapsed() < Duration::from_secs(5), "launch must not block on the child");
    assert_eq!(job.status, JobStatus::Running);
    assert!(job.pid.is_some());
    assert!(job.completed_at_ms.is_none());

    // Clean up the sleeper
    runner.kill_job(None, &job.id, None).unwrap();
}

#[tokio::test]
async fn background_output_is_redirected_to_the_output_file() {
    let (temp, runner) = runner();
    let prompt_file = write_prompt(&temp, "ignored");
    let mut request = sh_request(temp.path(), "echo out-line; echo err-line >&2", prompt_file);
    request.background = true;

    let Launched::Background(job) = runner.launch(request).await.unwrap() else {
        panic!("expected background result");
    };
    let outcome = runner
        .wait_for_job(&job.id, Duration::from_secs(10), &fast_poll())
        .await
        .unwrap();
    let WaitOutcome::Terminal { job, output_preview } = outcome else {
        panic!("job should complete");
    };
    assert_eq!(job.status, JobStatus::Completed);
    assert!(output_preview.contains("out-line"));
    assert!(output_preview.contains("err-line"));
}

#[tokio::test]
async fn background_prompt_reaches_the_child_stdin() {
    let (temp, runner) = runner();
    let prompt_file = write_prompt(&temp, "prompt payload");
    let mut request = LaunchRequest::new(Provider::parse("cat").unwrap(), temp.path());
    request.prompt_file = Some(prompt_file);
    request.background = true;

    let Launched::Background(job) = runner.launch(request).await.unwrap() else {
        panic!("expected background result");
    };
    let outcome = runner
        .wait_for_job(&job.id, Duration::from_secs(10), &fast_poll())
        .await
        .unwrap();
    let WaitOutcome::Terminal { output_preview, .. } = outcome else {
        panic!("job should complete");
    };
    assert_eq!(output_preview, "prompt payload");
}

#[tokio::test]
async fn background_missing_binary_reconciles_to_failed() {
    let (temp, runner) = runner();
    let prompt_file = write_prompt(&temp, "ignored");
    let mut request =
        LaunchRequest::new(Provider::parse("no-such-binary-xyz").unwrap(), temp.path());
    request.prompt_file = Some(prompt_file);
    request.background = true;

    let Launched::Background(job) = runner.launch(request).await.unwrap() else {
        panic!("expected background result");
    };
    let outcome = runner
        .wait_for_job(&job.id, Duration::from_secs(10), &fast_poll())
        .await
        .unwrap();
    let WaitOutcome::Terminal { job, .. } = outcome else {
        panic!("wrapper should report the failure");
    };
    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.error.as_deref(), Some("process exited with code 127"));
}

#[tokio::test]
async fn explicit_output_file_is_respected() {
    let (temp, runner) = runner();
    let prompt_file = write_prompt(&temp, "ignored");
    let mut request = sh_request(temp.path(), "echo custom-target", prompt_file);
    request.output_file = Some(temp.path().join("result.log"));
    request.background = true;

    let Launched::Background(job) = runner.launch(request).await.unwrap() else {
        panic!("expected background result");
    };
    assert_eq!(job.output_file, temp.path().join("result.log"));
    runner.wait_for_job(&job.id, Duration::from_secs(10), &fast_poll()).await.unwrap();
    let content = std::fs::read_to_string(temp.path().join("result.log")).unwrap();
    assert_eq!(content, "custom-target\n");
}

fn fast_poll() -> PollConfig {
    PollConfig { floor: Duration::from_millis(10), ceiling: Duration::from_millis(50) }
}
