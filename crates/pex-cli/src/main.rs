mod cli;
mod config;
mod signals;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use pex_core::{CommandRef, NoopSink, Runner};
use pex_exec::ProcCommand;
use pex_observe::{EventLog, LoggerConfig, logger_init};

use crate::{cli::Cli, config::Config, signals::interrupt_on_signal};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if !cli.no_log {
        let cfg = LoggerConfig::default()
            .with_format(cli.log_format)
            .with_level(cli.log_level.as_str());
        logger_init(&cfg)?;
    }

    let config = Config::load(&cli.config)?;
    if !cli.no_log {
        info!(target: "pex.cli", "{}", config.to_json().context("encode config")?);
    }

    let cmds: Vec<CommandRef> = config
        .command_specs(cli.dir.as_deref())?
        .into_iter()
        .map(|spec| Arc::new(ProcCommand::new(spec)) as CommandRef)
        .collect();

    let builder = Runner::builder()
        .fast_fail(cli.fast_fail)
        .max_concurrent_cmds(cli.max_concurrent_cmds);
    let runner = match (cli.no_log, cli.json_events) {
        (true, _) => builder.event_sink(NoopSink),
        (false, true) => builder.event_sink(EventLog::json()),
        (false, false) => builder.event_sink(EventLog::new()),
    }
    .build();

    let signals = interrupt_on_signal(runner.interrupt_handle()).context("install signal handlers")?;
    let res = runner.run(cmds).await;
    signals.abort();

    Ok(res?)
}
