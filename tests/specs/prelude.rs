// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared spec harness: a temp project directory plus an `errand` command
//! builder with pass/fail assertions.

use std::path::Path;
use std::process::Output;
use std::time::{Duration, Instant};
use tempfile::TempDir;

/// Ceiling for `wait_for` polling in specs.
pub const SPEC_WAIT_MAX_MS: u64 = 10_000;

/// A throwaway project directory with its own isolated state directory.
pub struct Project {
    temp: TempDir,
}

impl Project {
    pub fn empty() -> Self {
        Self { temp: TempDir::new().expect("create temp project") }
    }

    pub fn path(&self) -> &Path {
        self.temp.path()
    }

    /// Write a file under the project, creating parents.
    pub fn file(&self, rel: &str, content: &str) {
        let path = self.temp.path().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent dirs");
        }
        std::fs::write(path, content).expect("write file");
    }

    /// Command builder for the `errand` binary, scoped to this project's
    /// state directory and working directory.
    pub fn errand(&self) -> Errand {
        let mut cmd = assert_cmd::Command::cargo_bin("errand").expect("errand binary");
        cmd.current_dir(self.temp.path());
        cmd.env("ERRAND_STATE_DIR", self.temp.path().join("state"));
        Errand { cmd }
    }
}

pub struct Errand {
    cmd: assert_cmd::Command,
}

impl Errand {
    pub fn args(mut self, args: &[&str]) -> Self {
        self.cmd.args(args);
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.cmd.env(key, value);
        self
    }

    /// Run and require exit code 0.
    pub fn passes(mut self) -> Run {
        let output = self.cmd.output().expect("run errand");
        assert!(
            output.status.success(),
            "expected success, got {:?}\nstdout:\n{}\nstderr:\n{}",
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        );
        Run { output }
    }

    /// Run and require a non-zero exit code.
    pub fn fails(mut self) -> Run {
        let output = self.cmd.output().expect("run errand");
        assert!(
            !output.status.success(),
            "expected failure, got success\nstdout:\n{}",
            String::from_utf8_lossy(&output.stdout),
        );
        Run { output }
    }

    /// Run and require a specific exit code.
    pub fn exits_with(mut self, code: i32) -> Run {
        let output = self.cmd.output().expect("run errand");
        assert_eq!(
            output.status.code(),
            Some(code),
            "stdout:\n{}\nstderr:\n{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        );
        Run { output }
    }
}

pub struct Run {
    output: Output,
}

impl Run {
    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.output.stdout).into_owned()
    }

    pub fn stderr(&self) -> String {
        String::from_utf8_lossy(&self.output.stderr).into_owned()
    }

    pub fn stdout_has(self, needle: &str) -> Self {
        assert!(
            self.stdout().contains(needle),
            "stdout missing '{needle}':\n{}",
            self.stdout()
        );
        self
    }

    pub fn stderr_has(self, needle: &str) -> Self {
        assert!(
            self.stderr().contains(needle),
            "stderr missing '{needle}':\n{}",
            self.stderr()
        );
        self
    }
}

/// Poll `f` until it returns true or `max_ms` elapses.
pub fn wait_for(max_ms: u64, mut f: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_millis(max_ms);
    loop {
        if f() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
}
