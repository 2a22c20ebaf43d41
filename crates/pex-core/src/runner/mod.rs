//! # Run a batch of independent commands under a concurrency cap.
//!
//! ## Flow
//! ```text
//! run(cmds)
//!   ├─► one CmdController per command (order preserved)
//!   ├─► emit Started
//!   ├─► per controller: JoinSet task
//!   │       acquire 1 unit (skipped if the run is already stopping)
//!   │       controller.run()
//!   │       release unit
//!   │       on failure: record in Outcome; fast_fail → cancel fast-fail token
//!   ├─► first of (biased): interrupt token │ fast-fail token │ all tasks joined
//!   ├─► kill sweep: controller.kill() for every controller
//!   ├─► cancel stop token, drain JoinSet (no task outlives run)
//!   └─► emit Finished{error}, return
//! ```
//!
//! ## Result
//! Decided once, right after the first done signal:
//! - interrupt token cancelled → [`RunError::Interrupted`]
//! - any controller reported failure → [`RunError::CommandFailed`]
//! - otherwise `Ok(())`
//!
//! The interrupt always wins a race with command failures.

mod builder;
pub mod config;
mod outcome;

pub use builder::RunnerBuilder;
pub use config::{Clock, RunnerConfig, RunnerOption};

use std::sync::Arc;

use pex_model::Event;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::{CmdController, CommandRef, RunError, Semaphore};
use outcome::Outcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DoneReason {
    Interrupted,
    FastFail,
    Completed,
}

#[derive(Debug, Clone)]
pub struct Runner {
    cfg: RunnerConfig,
}

impl Runner {
    /// Builds a runner from option functions applied in order over the defaults.
    pub fn new<I>(options: I) -> Self
    where
        I: IntoIterator<Item = RunnerOption>,
    {
        Self::from_config(RunnerConfig::from_options(options))
    }

    pub fn from_config(cfg: RunnerConfig) -> Self {
        Self { cfg }
    }

    pub fn builder() -> RunnerBuilder {
        RunnerBuilder::default()
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.cfg
    }

    /// Token that interrupts this runner when cancelled.
    pub fn interrupt_handle(&self) -> CancellationToken {
        self.cfg.interrupt.clone()
    }

    /// Runs every command to completion, fast-fail, or interrupt.
    ///
    /// By the time this returns every controller is finished, every spawned
    /// task has been joined, and the `finished` event has been emitted.
    /// An empty batch succeeds immediately.
    #[instrument(level = "debug", name = "pex.run", skip_all, fields(cmds = cmds.len()))]
    pub async fn run(&self, cmds: Vec<CommandRef>) -> Result<(), RunError> {
        let sink = Arc::clone(&self.cfg.sink);
        let clock = Arc::clone(&self.cfg.clock);
        let interrupt = self.cfg.interrupt.clone();

        let controllers: Vec<Arc<CmdController>> = cmds
            .into_iter()
            .map(|cmd| Arc::new(CmdController::new(cmd, Arc::clone(&sink), Arc::clone(&clock))))
            .collect();

        let semaphore = Semaphore::new(self.cfg.max_concurrent_cmds);
        let outcome = Arc::new(Outcome::default());
        let fast_fail = CancellationToken::new();
        let stop = CancellationToken::new();

        let started_at = clock();
        sink.handle(&Event::started(started_at));

        let mut set = JoinSet::new();
        for ctl in &controllers {
            set.spawn(run_one(
                Arc::clone(ctl),
                semaphore.clone(),
                Arc::clone(&outcome),
                self.cfg.fast_fail.then(|| fast_fail.clone()),
                stop.clone(),
            ));
        }

        let reason = tokio::select! {
            biased;
            _ = interrupt.cancelled() => DoneReason::Interrupted,
            _ = fast_fail.cancelled() => DoneReason::FastFail,
            _ = drain(&mut set, &outcome) => DoneReason::Completed,
        };
        let interrupted = interrupt.is_cancelled();
        debug!(?reason, interrupted, "run done; killing remaining commands");

        for ctl in &controllers {
            ctl.kill();
        }
        stop.cancel();
        drain(&mut set, &outcome).await;

        let result = if interrupted {
            Err(RunError::Interrupted)
        } else if outcome.has_failures() {
            Err(RunError::CommandFailed)
        } else {
            Ok(())
        };

        match &result {
            Ok(()) => info!(cmds = controllers.len(), "all commands succeeded"),
            Err(e) => warn!(
                cmds = controllers.len(),
                failures = outcome.failures(),
                error = %e,
                error.label = e.as_label(),
                "run failed"
            ),
        }

        sink.handle(&Event::finished(
            clock(),
            started_at,
            result.as_ref().err().map(ToString::to_string),
        ));
        result
    }
}

async fn run_one(
    ctl: Arc<CmdController>,
    semaphore: Semaphore,
    outcome: Arc<Outcome>,
    fast_fail: Option<CancellationToken>,
    stop: CancellationToken,
) {
    let permit = tokio::select! {
        biased;
        _ = stop.cancelled() => return,
        permit = semaphore.acquire(1) => permit,
    };

    let ok = ctl.run().await;
    permit.release();

    if !ok {
        outcome.record_failure();
        if let Some(token) = fast_fail {
            debug!(cmd = ctl.description(), "command failed; fast-failing run");
            token.cancel();
        }
    }
}

async fn drain(set: &mut JoinSet<()>, outcome: &Outcome) {
    while let Some(res) = set.join_next().await {
        if let Err(e) = res
            && e.is_panic()
        {
            warn!(error = %e, "command task panicked");
            outcome.record_failure();
        }
    }
}
