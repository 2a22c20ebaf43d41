use std::path::PathBuf;

use clap::Parser;
use pex_core::runner::config::default_max_concurrent_cmds;
use pex_observe::LoggerFormat;

/// Runs the commands listed in a config file in parallel.
#[derive(Debug, Parser)]
#[command(name = "pex", version, about)]
pub struct Cli {
    /// The directory to run the commands in (default: the config's `dir`).
    #[arg(long)]
    pub dir: Option<PathBuf>,

    /// Fail on the first command failure.
    #[arg(long)]
    pub fast_fail: bool,

    /// Maximum number of processes to run concurrently, or unlimited if 0.
    #[arg(long, default_value_t = default_max_concurrent_cmds(), allow_negative_numbers = true)]
    pub max_concurrent_cmds: i64,

    /// Do not output logs.
    #[arg(long)]
    pub no_log: bool,

    /// Log lifecycle events as serialized JSON records.
    #[arg(long)]
    pub json_events: bool,

    /// Log output format (text|json).
    #[arg(long, env = "PEX_LOG_FORMAT", default_value = "text")]
    pub log_format: LoggerFormat,

    /// Log filter directive, e.g. `info` or `pex.events=debug`.
    #[arg(long, env = "PEX_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Config file (YAML or JSON).
    pub config: PathBuf,
}
