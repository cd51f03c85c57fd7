//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "loadtrack", version, about = "Truck load tracker CLI")]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE", default_value = "etc/loadtrack.toml")]
    pub config: PathBuf,

    /// Log as JSON lines instead of pretty
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the monitoring loop (Ctrl-C to stop)
    Run {
        /// Override storage.path from the config
        #[arg(long, value_name = "FILE")]
        store: Option<PathBuf>,

        /// Stop after this many loop iterations (0 = run until Ctrl-C)
        #[arg(long, value_name = "N", default_value_t = 0)]
        iterations: u64,
    },
    /// Print the persisted ledger and scale factor, then exit
    Status {
        /// Override storage.path from the config
        #[arg(long, value_name = "FILE")]
        store: Option<PathBuf>,
    },
    /// Quick health check (sensor readable, store writable)
    SelfCheck,
}
