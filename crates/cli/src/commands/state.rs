// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `errand state` - scoped mode-state documents

use anyhow::Result;
use clap::{Args, Subcommand};
use errand_core::SessionId;
use errand_store::StateStore;

use crate::output::{format_or_json, OutputFormat};

#[derive(Args)]
pub struct StateArgs {
    #[command(subcommand)]
    pub command: StateCommand,
}

#[derive(Subcommand)]
pub enum StateCommand {
    /// Write a mode document (payload is a JSON object)
    Write {
        mode: String,
        /// JSON object payload, e.g. '{"active": true}'
        payload: String,
        #[arg(long)]
        session: Option<String>,
    },
    /// Read a mode document
    Read {
        mode: String,
        #[arg(long)]
        session: Option<String>,
    },
    /// Remove a mode document (no-op when absent)
    Clear {
        mode: String,
        #[arg(long)]
        session: Option<String>,
    },
    /// List modes whose payload is active
    Active {
        #[arg(long)]
        session: Option<String>,
    },
    /// Per-mode active/inactive summary
    Status {
        mode: Option<String>,
        #[arg(long)]
        session: Option<String>,
    },
}

pub fn handle(command: StateCommand, store: &StateStore, format: OutputFormat) -> Result<()> {
    match command {
        StateCommand::Write { mode, payload, session } => {
            let session = session.map(SessionId::new);
            let value: serde_json::Value = serde_json::from_str(&payload)?;
            let serde_json::Value::Object(payload) = value else {
                anyhow::bail!("payload must be a JSON object, e.g. '{{\"active\": true}}'");
            };
            store.write(&mode, payload, session.as_ref())?;
        }
        StateCommand::Read { mode, session } => {
            let session = session.map(SessionId::new);
            match store.read(&mode, session.as_ref())? {
                Some(doc) => {
                    let rendered = serde_json::json!({
                        "mode": doc.mode,
                        "payload": doc.payload,
                        "_meta": doc.meta,
                    });
                    format_or_json(format, &rendered, || {
                        println!(
                            "{}",
                            serde_json::to_string_pretty(&doc.payload).unwrap_or_default()
                        );
                    })?;
                }
                None => {
                    // Absence is an expected case, not an error
                    format_or_json(format, &serde_json::Value::Null, || {
                        println!("No state for mode '{}'", mode);
                    })?;
                }
            }
        }
        StateCommand::Clear { mode, session } => {
            let session = session.map(SessionId::new);
            store.clear(&mode, session.as_ref())?;
        }
        StateCommand::Active { session } => {
            let session = session.map(SessionId::new);
            let modes = store.list_active(session.as_ref())?;
            format_or_json(format, &modes, || {
                for mode in &modes {
                    println!("{}", mode);
                }
            })?;
        }
        StateCommand::Status { mode, session } => {
            let session = session.map(SessionId::new);
            let statuses = store.status(mode.as_deref(), session.as_ref())?;
            format_or_json(format, &statuses, || {
                for status in &statuses {
                    let state = if status.active { "active" } else { "inactive" };
                    println!("{}: {}", status.mode, state);
                }
            })?;
        }
    }
    Ok(())
}
