#![warn(missing_docs)]

//! Entry point for the `autotype` binary.

mod cli;
mod error;
mod run;
mod when;

use std::{io, process};

use autotype_engine::{ActionDelay, ActionToken};
use clap::Parser;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, registry};
use winops::SystemWinOps;

use crate::{
    cli::{Cli, Commands},
    error::Result,
};

fn main() {
    if let Err(err) = run() {
        error!("{err}");
        eprintln!("error: {err}");
        process::exit(1);
    }
}

/// Parse CLI arguments, install logging, and dispatch to the chosen subcommand.
fn run() -> Result<()> {
    let Cli { log, command } = Cli::parse();
    let env_filter = logging::env_filter_from_spec(&log.spec());
    registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(io::stderr).without_time())
        .try_init()
        .ok();

    match command {
        Commands::Windows => list_windows(),
        Commands::Tokens => {
            list_tokens();
            Ok(())
        }
        Commands::Run(args) => run::run(&args),
    }
}

/// Print every targetable window.
fn list_windows() -> Result<()> {
    for w in winops::visible_windows(&SystemWinOps)? {
        println!("{:>18}  {:>6}  {}", w.handle.to_string(), w.pid, w.title);
    }
    Ok(())
}

/// Print the action vocabulary and delay choices.
fn list_tokens() {
    for t in ActionToken::vocabulary() {
        println!("{t}");
    }
    let delays: Vec<String> = ActionDelay::choices().iter().map(ToString::to_string).collect();
    println!("\ndelays: {}", delays.join(" "));
}
