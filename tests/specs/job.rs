// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job lifecycle specs
//!
//! Verify launch/wait/status/kill/list against real short-lived commands.
//! Providers here are plain executables (`sh`, `cat`) exercised through the
//! generic adapter.

use crate::prelude::*;

fn launch_sh(temp: &Project, script: &str) -> String {
    temp.file("prompt.txt", "ignored");
    let id = temp
        .errand()
        .args(&[
            "launch",
            "--provider",
            "sh",
            "--prompt-file",
            "prompt.txt",
            "--background",
            "--",
            "-c",
            script,
        ])
        .passes()
        .stdout()
        .trim()
        .to_string();
    assert!(id.starts_with("job-"), "expected a job id, got: {id}");
    id
}

#[test]
fn background_job_completes_and_wait_returns_output() {
    let temp = Project::empty();
    let id = launch_sh(&temp, "sleep 0.05; echo all-done");

    temp.errand()
        .args(&["job", "wait", &id, "--timeout", "5s"])
        .env("ERRAND_WAIT_POLL_MS", "10")
        .passes()
        .stdout_has("all-done");

    temp.errand().args(&["job", "status", &id]).passes().stdout_has("completed");
}

#[test]
fn wait_timeout_leaves_the_job_running() {
    let temp = Project::empty();
    let id = launch_sh(&temp, "sleep 30");

    temp.errand()
        .args(&["job", "wait", &id, "--timeout", "1s"])
        .env("ERRAND_WAIT_POLL_MS", "10")
        .exits_with(2)
        .stderr_has("still running");

    // The poller gave up; the job itself is untouched
    temp.errand().args(&["job", "status", &id]).passes().stdout_has("running");

    temp.errand().args(&["job", "kill", &id]).passes();
}

#[test]
fn failed_job_propagates_exit_code_detail() {
    let temp = Project::empty();
    let id = launch_sh(&temp, "exit 7");

    temp.errand()
        .args(&["job", "wait", &id, "--timeout", "5s"])
        .env("ERRAND_WAIT_POLL_MS", "10")
        .exits_with(1)
        .stderr_has("process exited with code 7");
}

#[test]
fn kill_then_status_reports_killed() {
    let temp = Project::empty();
    let id = launch_sh(&temp, "sleep 30");

    temp.errand().args(&["job", "kill", &id]).passes().stdout_has("Killed job");
    temp.errand().args(&["job", "status", &id]).passes().stdout_has("killed");
}

#[test]
fn kill_completed_job_is_an_error() {
    let temp = Project::empty();
    let id = launch_sh(&temp, "true");

    let done = wait_for(SPEC_WAIT_MAX_MS, || {
        temp.errand().args(&["job", "status", &id]).passes().stdout().contains("completed")
    });
    assert!(done, "job should complete");

    temp.errand()
        .args(&["job", "kill", &id])
        .fails()
        .stderr_has("not running");
    // The terminal record is untouched
    temp.errand().args(&["job", "status", &id]).passes().stdout_has("completed");
}

#[test]
fn list_filters_active_and_literal_statuses() {
    let temp = Project::empty();
    let running = launch_sh(&temp, "sleep 30");
    let finished = launch_sh(&temp, "true");

    let done = wait_for(SPEC_WAIT_MAX_MS, || {
        temp.errand()
            .args(&["job", "list", "--status", "completed"])
            .passes()
            .stdout()
            .contains(&finished)
    });
    assert!(done, "finished job should reconcile to completed");

    let active = temp.errand().args(&["job", "list"]).passes().stdout();
    assert!(active.contains(&running), "active list should show the sleeper:\n{active}");
    assert!(!active.contains(&finished), "completed job must not list as active:\n{active}");

    temp.errand().args(&["job", "kill", &running]).passes();
}

#[test]
fn foreground_inline_prompt_returns_output_directly() {
    let temp = Project::empty();
    temp.errand()
        .args(&["launch", "--provider", "cat", "--prompt", "inline hello"])
        .passes()
        .stdout_has("inline hello");
}

#[test]
fn inline_prompt_cannot_run_in_background() {
    let temp = Project::empty();
    temp.errand()
        .args(&["launch", "--provider", "cat", "--prompt", "hi", "--background"])
        .fails()
        .stderr_has("foreground-only");
}

#[test]
fn launch_without_prompt_source_is_rejected() {
    let temp = Project::empty();
    temp.errand()
        .args(&["launch", "--provider", "codex"])
        .fails()
        .stderr_has("no prompt source");
}

#[test]
fn wait_not_found_exits_nonzero() {
    let temp = Project::empty();
    temp.errand()
        .args(&["job", "wait", "job-nonexistent12345", "--timeout", "1s"])
        .env("ERRAND_WAIT_POLL_MS", "10")
        .fails()
        .stderr_has("Job not found");
}

#[test]
fn status_not_found_exits_nonzero() {
    let temp = Project::empty();
    temp.errand().args(&["job", "status", "job-nope"]).fails().stderr_has("Job not found");
}

#[test]
fn json_listing_is_machine_readable() {
    let temp = Project::empty();
    let id = launch_sh(&temp, "sleep 30");

    let out = temp.errand().args(&["--json", "job", "list"]).passes().stdout();
    let jobs: serde_json::Value = serde_json::from_str(&out).expect("valid JSON output");
    let listed = jobs.as_array().expect("array of jobs");
    assert!(listed.iter().any(|j| j["id"] == serde_json::json!(id)));
    assert!(listed.iter().all(|j| j["provider"] == serde_json::json!("sh")));

    temp.errand().args(&["job", "kill", &id]).passes();
}
