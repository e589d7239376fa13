// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the runner.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EnvError {
    #[error("cannot resolve a state directory: set ERRAND_STATE_DIR or HOME")]
    NoStateDir,
}

/// Resolve state directory: ERRAND_STATE_DIR > XDG_STATE_HOME/errand > ~/.local/state/errand
pub fn state_dir() -> Result<PathBuf, EnvError> {
    if let Ok(dir) = std::env::var("ERRAND_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("errand"));
    }
    let home = std::env::var("HOME").map_err(|_| EnvError::NoStateDir)?;
    Ok(PathBuf::from(home).join(".local/state/errand"))
}

/// Poll interval floor (default 200ms, configurable via `ERRAND_WAIT_POLL_MS`).
pub fn wait_poll_floor() -> Duration {
    std::env::var("ERRAND_WAIT_POLL_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_millis(200))
}

/// Poll interval ceiling (default 5s, configurable via `ERRAND_WAIT_POLL_MAX_MS`).
pub fn wait_poll_ceiling() -> Duration {
    std::env::var("ERRAND_WAIT_POLL_MAX_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(5))
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
