// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Mode-state specs
//!
//! Verify `errand state` write/read/clear/active/status across scopes.

use crate::prelude::*;

#[test]
fn write_then_read_roundtrip() {
    let temp = Project::empty();
    temp.errand()
        .args(&["state", "write", "ralph", r#"{"active": true, "iteration": 2}"#])
        .passes();
    temp.errand()
        .args(&["state", "read", "ralph"])
        .passes()
        .stdout_has("\"iteration\": 2");
}

#[test]
fn read_absent_mode_reports_no_state() {
    let temp = Project::empty();
    temp.errand()
        .args(&["state", "read", "ralph"])
        .passes()
        .stdout_has("No state for mode 'ralph'");
}

#[test]
fn clear_is_idempotent() {
    let temp = Project::empty();
    temp.errand().args(&["state", "write", "ralph", r#"{"active": true}"#]).passes();
    temp.errand().args(&["state", "clear", "ralph"]).passes();
    temp.errand().args(&["state", "clear", "ralph"]).passes();
    temp.errand().args(&["state", "read", "ralph"]).passes().stdout_has("No state");
}

#[test]
fn session_scoped_state_is_isolated_from_global() {
    let temp = Project::empty();
    temp.errand()
        .args(&["state", "write", "ralph", r#"{"active": true}"#, "--session", "abc"])
        .passes();

    // Session listing sees it; the global listing does not
    temp.errand()
        .args(&["state", "active", "--session", "abc"])
        .passes()
        .stdout_has("ralph");
    let global = temp.errand().args(&["state", "active"]).passes().stdout();
    assert!(!global.contains("ralph"), "global scope leaked session state:\n{global}");

    // One document per (mode, scope), under the session sub-tree
    assert!(temp.path().join("state/sessions/abc/ralph.json").is_file());
    assert!(!temp.path().join("state/ralph.json").exists());
}

#[test]
fn inactive_and_missing_active_fields_are_not_listed() {
    let temp = Project::empty();
    temp.errand().args(&["state", "write", "ralph", r#"{"active": true}"#]).passes();
    temp.errand().args(&["state", "write", "autopilot", r#"{"active": false}"#]).passes();
    temp.errand().args(&["state", "write", "review", r#"{"note": "x"}"#]).passes();

    let out = temp.errand().args(&["state", "active"]).passes().stdout();
    assert_eq!(out.trim(), "ralph");
}

#[test]
fn status_reports_per_mode_summary() {
    let temp = Project::empty();
    temp.errand().args(&["state", "write", "ralph", r#"{"active": true}"#]).passes();
    temp.errand().args(&["state", "write", "autopilot", r#"{"active": false}"#]).passes();

    temp.errand()
        .args(&["state", "status"])
        .passes()
        .stdout_has("ralph: active")
        .stdout_has("autopilot: inactive");

    temp.errand()
        .args(&["state", "status", "never-written"])
        .passes()
        .stdout_has("never-written: inactive");
}

#[test]
fn non_object_payload_is_rejected() {
    let temp = Project::empty();
    temp.errand()
        .args(&["state", "write", "ralph", "[1, 2]"])
        .fails()
        .stderr_has("JSON object");
}

#[test]
fn reserved_and_invalid_modes_are_rejected() {
    let temp = Project::empty();
    temp.errand()
        .args(&["state", "write", "jobs/codex/x", r#"{"active": true}"#])
        .fails()
        .stderr_has("reserved");
    temp.errand()
        .args(&["state", "write", "../escape", r#"{"active": true}"#])
        .fails()
        .stderr_has("invalid mode");
}

#[test]
fn json_output_mode_round_trips() {
    let temp = Project::empty();
    temp.errand().args(&["state", "write", "ralph", r#"{"active": true}"#]).passes();
    let out = temp.errand().args(&["--json", "state", "read", "ralph"]).passes().stdout();
    let value: serde_json::Value = serde_json::from_str(&out).expect("valid JSON output");
    assert_eq!(value["payload"]["active"], serde_json::json!(true));
    assert!(value["_meta"]["writer"].as_str().is_some());
}
