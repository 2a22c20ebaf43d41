use std::{sync::Arc, time::SystemTime};

use pex_model::EventSink;
use tokio_util::sync::CancellationToken;

use super::{Runner, RunnerConfig};

/// Fluent alternative to the option functions taken by [`Runner::new`].
///
/// ```rust
/// use pex_core::{NoopSink, Runner};
///
/// let runner = Runner::builder()
///     .fast_fail(true)
///     .max_concurrent_cmds(2)
///     .event_sink(NoopSink)
///     .build();
/// assert!(runner.config().fast_fail);
/// ```
#[derive(Debug, Default)]
pub struct RunnerBuilder {
    cfg: RunnerConfig,
}

impl RunnerBuilder {
    pub fn new(cfg: RunnerConfig) -> Self {
        Self { cfg }
    }

    pub fn fast_fail(mut self, on: bool) -> Self {
        self.cfg.fast_fail = on;
        self
    }

    pub fn max_concurrent_cmds(mut self, n: i64) -> Self {
        self.cfg.max_concurrent_cmds = n;
        self
    }

    pub fn event_sink<S>(mut self, sink: S) -> Self
    where
        S: EventSink + 'static,
    {
        self.cfg.sink = Arc::new(sink);
        self
    }

    pub fn clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> SystemTime + Send + Sync + 'static,
    {
        self.cfg.clock = Arc::new(clock);
        self
    }

    pub fn interrupt(mut self, token: CancellationToken) -> Self {
        self.cfg.interrupt = token;
        self
    }

    pub fn build(self) -> Runner {
        Runner::from_config(self.cfg)
    }
}
