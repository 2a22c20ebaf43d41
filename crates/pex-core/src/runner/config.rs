//! # Runner configuration.
//!
//! [`RunnerConfig`] is assembled once, before the first `run`, either from an
//! ordered list of [`RunnerOption`]s or through [`RunnerBuilder`](super::RunnerBuilder).
//!
//! ## Sentinel values
//! - `max_concurrent_cmds <= 0` → unlimited (no semaphore)

use std::{fmt, sync::Arc, time::SystemTime};

use pex_model::EventSink;
use pex_observe::EventLog;
use tokio_util::sync::CancellationToken;

/// Time source used for every event timestamp.
pub type Clock = Arc<dyn Fn() -> SystemTime + Send + Sync>;

/// Mutates a configuration before the runner is built.
pub type RunnerOption = Box<dyn FnOnce(&mut RunnerConfig) + Send>;

pub const DEFAULT_FAST_FAIL: bool = false;

/// Host parallelism, or 1 when it cannot be determined.
pub fn default_max_concurrent_cmds() -> i64 {
    std::thread::available_parallelism()
        .map(|n| i64::try_from(n.get()).unwrap_or(i64::MAX))
        .unwrap_or(1)
}

pub fn default_clock() -> Clock {
    Arc::new(SystemTime::now)
}

#[derive(Clone)]
pub struct RunnerConfig {
    /// Stop the whole run on the first command failure.
    pub fast_fail: bool,
    /// Maximum number of commands running at once (`<= 0` = unlimited).
    pub max_concurrent_cmds: i64,
    /// Receives every lifecycle event.
    pub sink: Arc<dyn EventSink>,
    pub clock: Clock,
    /// Cancelling this token interrupts the run: everything is killed and
    /// `run` returns `RunError::Interrupted`.
    pub interrupt: CancellationToken,
}

impl RunnerConfig {
    pub fn from_options<I>(options: I) -> Self
    where
        I: IntoIterator<Item = RunnerOption>,
    {
        let mut cfg = Self::default();
        for option in options {
            option(&mut cfg);
        }
        cfg
    }

    #[inline]
    pub fn is_unlimited(&self) -> bool {
        self.max_concurrent_cmds <= 0
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            fast_fail: DEFAULT_FAST_FAIL,
            max_concurrent_cmds: default_max_concurrent_cmds(),
            sink: Arc::new(EventLog::new()),
            clock: default_clock(),
            interrupt: CancellationToken::new(),
        }
    }
}

impl fmt::Debug for RunnerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunnerConfig")
            .field("fast_fail", &self.fast_fail)
            .field("max_concurrent_cmds", &self.max_concurrent_cmds)
            .field("interrupted", &self.interrupt.is_cancelled())
            .finish_non_exhaustive()
    }
}

/// Return from `run` as soon as one command fails.
pub fn with_fast_fail() -> RunnerOption {
    Box::new(|cfg| cfg.fast_fail = true)
}

/// Run at most `n` commands at once, or unlimited if `n <= 0`.
pub fn with_max_concurrent_cmds(n: i64) -> RunnerOption {
    Box::new(move |cfg| cfg.max_concurrent_cmds = n)
}

pub fn with_event_sink<S>(sink: S) -> RunnerOption
where
    S: EventSink + 'static,
{
    let sink: Arc<dyn EventSink> = Arc::new(sink);
    Box::new(move |cfg| cfg.sink = sink)
}

pub fn with_clock<F>(clock: F) -> RunnerOption
where
    F: Fn() -> SystemTime + Send + Sync + 'static,
{
    let clock: Clock = Arc::new(clock);
    Box::new(move |cfg| cfg.clock = clock)
}

pub fn with_interrupt(token: CancellationToken) -> RunnerOption {
    Box::new(move |cfg| cfg.interrupt = token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pex_model::NoopSink;
    use std::time::{Duration, UNIX_EPOCH};

    #[test]
    fn defaults() {
        let cfg = RunnerConfig::default();
        assert!(!cfg.fast_fail);
        assert!(cfg.max_concurrent_cmds >= 1);
        assert!(!cfg.interrupt.is_cancelled());
    }

    #[test]
    fn options_apply_in_order() {
        let cfg = RunnerConfig::from_options([
            with_max_concurrent_cmds(4),
            with_fast_fail(),
            with_max_concurrent_cmds(0),
            with_event_sink(NoopSink),
            with_clock(|| UNIX_EPOCH + Duration::from_secs(7)),
        ]);

        assert!(cfg.fast_fail);
        assert_eq!(cfg.max_concurrent_cmds, 0);
        assert!(cfg.is_unlimited());
        assert_eq!((cfg.clock)(), UNIX_EPOCH + Duration::from_secs(7));
    }

    #[test]
    fn interrupt_option_shares_token() {
        let token = CancellationToken::new();
        let cfg = RunnerConfig::from_options([with_interrupt(token.clone())]);
        token.cancel();
        assert!(cfg.interrupt.is_cancelled());
    }
}
