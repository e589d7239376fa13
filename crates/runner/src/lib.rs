// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! errand-runner: launches provider CLI processes in the background,
//! polls them to completion, and delivers termination signals.
//!
//! All operations hang off [`Runner`], whose impl is split by concern:
//! launching ([`launch`]), polling ([`poll`]), signaling and listing
//! ([`control`]), and exit-marker reconciliation ([`reconcile`]).

pub mod adapter;
pub mod control;
pub mod env;
pub mod launch;
pub mod poll;
pub mod reconcile;

use errand_core::Clock;
use errand_store::JobRegistry;

pub use adapter::{adapter_for, Invocation, ProviderCommand};
pub use control::{parse_signal, KillError};
pub use launch::{LaunchError, LaunchRequest, Launched};
pub use poll::{PollConfig, WaitError, WaitOutcome, MAX_WAIT_TIMEOUT};

/// Job lifecycle operations over one registry.
///
/// Clone-cheap: the registry is a path handle and clocks are shared.
#[derive(Debug, Clone)]
pub struct Runner<C: Clock> {
    registry: JobRegistry,
    clock: C,
}

impl<C: Clock> Runner<C> {
    pub fn new(registry: JobRegistry, clock: C) -> Self {
        Self { registry, clock }
    }

    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }
}
