// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `errand` - launch and track background assistant CLI jobs

mod commands;
mod exit_error;
mod output;

use clap::{Parser, Subcommand};
use errand_core::SystemClock;
use errand_runner::Runner;
use errand_store::{JobRegistry, StateStore};
use exit_error::ExitError;
use output::OutputFormat;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "errand", version, about = "Launch and track background assistant CLI jobs")]
struct Cli {
    /// Emit JSON instead of human-readable output
    #[arg(long, global = true)]
    json: bool,

    /// State directory override (default: ERRAND_STATE_DIR, then XDG state)
    #[arg(long, global = true, value_name = "DIR")]
    state_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Launch a provider invocation
    Launch(commands::launch::LaunchArgs),
    /// Inspect and control jobs
    Job(commands::job::JobArgs),
    /// Read and write mode state
    State(commands::state::StateArgs),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_env("ERRAND_LOG"))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        match e.downcast_ref::<ExitError>() {
            Some(exit) => {
                if !exit.message.is_empty() {
                    eprintln!("{}", exit.message);
                }
                std::process::exit(exit.code);
            }
            None => {
                eprintln!("error: {e:#}");
                std::process::exit(1);
            }
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let state_dir = match cli.state_dir {
        Some(dir) => dir,
        None => errand_runner::env::state_dir()?,
    };
    let store = StateStore::new(state_dir);
    let runner = Runner::new(JobRegistry::new(store.clone()), SystemClock);
    let format = if cli.json { OutputFormat::Json } else { OutputFormat::Text };

    match cli.command {
        Command::Launch(args) => commands::launch::handle(args, &runner, format).await,
        Command::Job(args) => commands::job::handle(args.command, &runner, format).await,
        Command::State(args) => commands::state::handle(args.command, &store, format),
    }
}
