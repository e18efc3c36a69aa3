// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Command-line arguments for `remote-task`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "remote-task",
    version,
    about = "Run a command on a worker node and report its output and exit status.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `RemoteTask.toml` in the current working directory, if it
    /// exists; otherwise built-in defaults.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `REMOTE_TASK_LOG` or a default level will be used.
    #[arg(long, global = true, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Serve as a worker node until Ctrl-C.
    Agent {
        /// Address to listen on; overrides `[agent].listen`.
        #[arg(long, value_name = "ADDR")]
        listen: Option<String>,
    },

    /// Run a command as a scripted step and print its value.
    Run {
        #[command(flatten)]
        target: TargetArgs,

        /// Encoding used to decode the command output (worker default if
        /// omitted).
        #[arg(long, value_name = "LABEL")]
        encoding: Option<String>,

        /// Return the output instead of logging it.
        #[arg(long)]
        return_stdout: bool,

        /// Return a non-zero exit code instead of failing.
        #[arg(long)]
        return_status: bool,

        /// Log each line as it is read (direct execution only).
        #[arg(long)]
        per_line: bool,

        /// The command and its arguments.
        #[arg(last = true, required = true, value_name = "CMD")]
        cmd: Vec<String>,
    },

    /// Run a command as a build step: log everything, fail on non-zero exit.
    Build {
        #[command(flatten)]
        target: TargetArgs,

        #[arg(last = true, required = true, value_name = "CMD")]
        cmd: Vec<String>,
    },

    /// Run a task declared as `[task.<NAME>]` in the config.
    Task {
        name: String,

        #[command(flatten)]
        target: TargetArgs,
    },

    /// Validate the config and print the declared tasks; runs nothing.
    Check,
}

/// Where to run; overrides `[coordinator].agent`.
#[derive(Debug, Clone, Default, Args)]
pub struct TargetArgs {
    /// Dispatch to the agent at `host:port`.
    #[arg(long, value_name = "ADDR", conflicts_with = "direct")]
    pub agent: Option<String>,

    /// Run on this machine even if the config names an agent.
    #[arg(long)]
    pub direct: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
