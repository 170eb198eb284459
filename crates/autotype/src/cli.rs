//! Command-line interface definitions for autotype.

use std::{path::PathBuf, time::Duration};

use clap::{Args, Parser, Subcommand};
use logging::LogArgs;
use time::Time;

use crate::when::{AlarmArg, parse_clock};

/// Command-line interface for the `autotype` binary.
#[derive(Parser, Debug)]
#[command(
    name = "autotype",
    about = "Type scheduled messages and keystrokes into other windows",
    version
)]
pub struct Cli {
    /// Logging controls.
    #[command(flatten)]
    pub log: LogArgs,

    /// Command to run.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List windows that can be targeted.
    Windows,
    /// Print the action tokens and delay choices.
    Tokens,
    /// Schedule a message and run until it and every alarm have finished.
    Run(RunArgs),
}

/// Arguments for the `run` subcommand.
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Clock time to type the message at (HH:MM or HH:MM:SS). Rolls over to
    /// tomorrow if already past.
    #[arg(long, value_parser = parse_clock, value_name = "TIME", conflicts_with = "after")]
    pub at: Option<Time>,

    /// Type the message after this long instead, e.g. `90s` or `5m`.
    #[arg(
        long = "in",
        value_parser = humantime::parse_duration,
        value_name = "DURATION"
    )]
    pub after: Option<Duration>,

    /// Exact title of the target window.
    #[arg(
        long,
        value_name = "TITLE",
        requires = "message",
        required_unless_present = "alarm"
    )]
    pub window: Option<String>,

    /// Text to type.
    #[arg(long, value_name = "TEXT", requires = "window")]
    pub message: Option<String>,

    /// Keyboard action to run after typing. Repeatable; see `autotype tokens`.
    #[arg(long = "action", value_name = "TOKEN")]
    pub actions: Vec<String>,

    /// Seconds to wait between actions (0 to 5).
    #[arg(long, default_value_t = 1.0, value_name = "SECONDS")]
    pub delay: f64,

    /// Countdown alarm as TIME=MESSAGE, where TIME is HH:MM[:SS] or a
    /// duration. Repeatable.
    #[arg(long = "alarm", value_name = "TIME=MESSAGE")]
    pub alarm: Vec<AlarmArg>,

    /// Print alarm countdowns every second.
    #[arg(long)]
    pub countdown: bool,

    /// Engine configuration file (RON).
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn run_parses_task_and_alarms() {
        let cli = Cli::try_parse_from([
            "autotype",
            "--debug",
            "run",
            "--in",
            "2m",
            "--window",
            "Untitled - Notepad",
            "--message",
            "hello",
            "--action",
            "ENTER",
            "--action",
            "ctrl+s",
            "--alarm",
            "10m=stretch",
        ])
        .unwrap();
        assert!(cli.log.debug);
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.after, Some(Duration::from_secs(120)));
        assert_eq!(args.window.as_deref(), Some("Untitled - Notepad"));
        assert_eq!(args.actions, ["ENTER", "ctrl+s"]);
        assert_eq!(args.delay, 1.0);
        assert_eq!(args.alarm.len(), 1);
    }

    #[test]
    fn run_needs_a_task_or_an_alarm() {
        assert!(Cli::try_parse_from(["autotype", "run"]).is_err());
        assert!(Cli::try_parse_from(["autotype", "run", "--window", "x"]).is_err());
        assert!(Cli::try_parse_from(["autotype", "run", "--alarm", "1m=x"]).is_ok());
    }

    #[test]
    fn at_and_in_conflict() {
        let r = Cli::try_parse_from([
            "autotype", "run", "--at", "10:00", "--in", "5m", "--alarm", "1m=x",
        ]);
        assert!(r.is_err());
    }
}
