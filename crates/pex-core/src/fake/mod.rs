//! Deterministic [`Command`] double and event recorder for tests.
//!
//! [`FakeCommand`] never touches the OS: its exit status, start/kill failures
//! and run time are configured up front, and it can report how many fakes sharing
//! an [`ActiveGauge`] were running at once.

use std::{
    fmt,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use pex_model::{Event, EventKind, EventSink};
use tokio_util::sync::CancellationToken;

use crate::{Command, CommandError};

/// Counts commands between a successful `start` and the return of `wait`.
#[derive(Debug, Default)]
pub struct ActiveGauge {
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl ActiveGauge {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn enter(&self) {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    fn exit(&self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn current(&self) -> usize {
        self.current.load(Ordering::SeqCst)
    }

    /// Highest number of simultaneously active commands observed.
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

/// Lines written by fakes on natural completion, shared between commands.
pub type OutputLines = Arc<Mutex<Vec<String>>>;

pub struct FakeCommand {
    name: String,
    exit_code: i32,
    run_for: Option<Duration>,
    start_error: Option<String>,
    kill_error: Option<String>,
    gauge: Option<Arc<ActiveGauge>>,
    output: Option<OutputLines>,

    started: AtomicBool,
    start_calls: AtomicUsize,
    kill_calls: AtomicUsize,
    killed: CancellationToken,
}

impl FakeCommand {
    /// A command that exits 0 as soon as it is waited on.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            exit_code: 0,
            run_for: Some(Duration::ZERO),
            start_error: None,
            kill_error: None,
            gauge: None,
            output: None,
            started: AtomicBool::new(false),
            start_calls: AtomicUsize::new(0),
            kill_calls: AtomicUsize::new(0),
            killed: CancellationToken::new(),
        }
    }

    pub fn with_exit_code(mut self, code: i32) -> Self {
        self.exit_code = code;
        self
    }

    /// Runs for `d` before exiting.
    pub fn with_run_time(mut self, d: Duration) -> Self {
        self.run_for = Some(d);
        self
    }

    /// Runs until killed.
    pub fn until_killed(mut self) -> Self {
        self.run_for = None;
        self
    }

    pub fn with_start_error(mut self, reason: impl Into<String>) -> Self {
        self.start_error = Some(reason.into());
        self
    }

    pub fn with_kill_error(mut self, reason: impl Into<String>) -> Self {
        self.kill_error = Some(reason.into());
        self
    }

    pub fn with_gauge(mut self, gauge: Arc<ActiveGauge>) -> Self {
        self.gauge = Some(gauge);
        self
    }

    /// Appends the command name to `lines` when it exits on its own.
    pub fn with_output(mut self, lines: OutputLines) -> Self {
        self.output = Some(lines);
        self
    }

    pub fn into_ref(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn start_calls(&self) -> usize {
        self.start_calls.load(Ordering::SeqCst)
    }

    pub fn kill_calls(&self) -> usize {
        self.kill_calls.load(Ordering::SeqCst)
    }

    pub fn was_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    pub fn was_killed(&self) -> bool {
        self.killed.is_cancelled()
    }

    async fn run_until_exit(&self) {
        match self.run_for {
            Some(d) if d.is_zero() => {}
            Some(d) => tokio::time::sleep(d).await,
            None => std::future::pending::<()>().await,
        }
    }
}

#[async_trait]
impl Command for FakeCommand {
    fn start(&self) -> Result<(), CommandError> {
        self.start_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(reason) = &self.start_error {
            return Err(CommandError::Spawn(reason.clone()));
        }
        if self.killed.is_cancelled() {
            return Err(CommandError::Killed);
        }
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(CommandError::AlreadyStarted);
        }
        if let Some(gauge) = &self.gauge {
            gauge.enter();
        }
        Ok(())
    }

    async fn wait(&self) -> Result<(), CommandError> {
        if !self.was_started() {
            return Err(CommandError::NotStarted);
        }

        let natural = tokio::select! {
            biased;
            _ = self.killed.cancelled() => false,
            _ = self.run_until_exit() => true,
        };

        if let Some(gauge) = &self.gauge {
            gauge.exit();
        }
        if !natural {
            return Err(CommandError::Killed);
        }
        if let Some(lines) = &self.output {
            lines
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push(self.name.clone());
        }
        match self.exit_code {
            0 => Ok(()),
            code => Err(CommandError::NonZeroExit { code }),
        }
    }

    fn kill(&self) -> Result<(), CommandError> {
        self.kill_calls.fetch_add(1, Ordering::SeqCst);
        self.killed.cancel();
        match &self.kill_error {
            Some(reason) => Err(CommandError::Kill(reason.clone())),
            None => Ok(()),
        }
    }
}

impl fmt::Display for FakeCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Event sink that keeps every event for later inspection.
#[derive(Debug, Default, Clone)]
pub struct EventRecorder {
    events: Arc<Mutex<Vec<Event>>>,
}

impl EventRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn of_kind(&self, kind: EventKind) -> Vec<Event> {
        self.events()
            .into_iter()
            .filter(|e| e.kind() == kind)
            .collect()
    }

    pub fn successes(&self, kind: EventKind) -> usize {
        self.of_kind(kind).iter().filter(|e| e.is_success()).count()
    }

    pub fn failures(&self, kind: EventKind) -> usize {
        self.of_kind(kind).iter().filter(|e| !e.is_success()).count()
    }
}

impl EventSink for EventRecorder {
    fn handle(&self, event: &Event) {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(event.clone());
    }
}
