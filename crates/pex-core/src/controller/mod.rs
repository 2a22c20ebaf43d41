//! # Per-command state machine.
//!
//! [`CmdController`] wraps one [`Command`](crate::Command) and guarantees it is
//! started at most once and finished (with a `cmd_finished` event) at most once,
//! no matter how `run` and `kill` race.
//!
//! ```text
//!            run()                 wait() returns / start() fails
//!   Idle ──────────────► Running ─────────────────────────────► Finished
//!     │                     │                                      ▲
//!     │ kill(): no event    │ kill(): Command::kill + event        │
//!     └─────────────────────┴──────────────────────────────────────┘
//! ```
//!
//! ## Rules
//! - The lock guards only the state transition and event emission, never `wait()`.
//! - The first transition into `Finished` wins; every later one is a no-op.
//! - A controller killed while `Idle` never starts its command and emits nothing.

use std::{
    fmt,
    sync::{Arc, Mutex, MutexGuard},
    time::SystemTime,
};

use pex_model::{Event, EventSink};
use tracing::{debug, trace};

use crate::{Clock, CommandRef};

/// Observable state of a [`CmdController`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Idle,
    Running,
    Finished,
}

#[derive(Debug, Clone, Copy)]
enum State {
    Idle,
    Running { started_at: SystemTime },
    Finished,
}

pub struct CmdController {
    cmd: CommandRef,
    desc: String,
    sink: Arc<dyn EventSink>,
    clock: Clock,
    state: Mutex<State>,
}

impl CmdController {
    pub fn new(cmd: CommandRef, sink: Arc<dyn EventSink>, clock: Clock) -> Self {
        let desc = cmd.to_string();
        Self {
            cmd,
            desc,
            sink,
            clock,
            state: Mutex::new(State::Idle),
        }
    }

    /// Command description as carried by this controller's events.
    pub fn description(&self) -> &str {
        &self.desc
    }

    pub fn state(&self) -> ControllerState {
        match *self.lock() {
            State::Idle => ControllerState::Idle,
            State::Running { .. } => ControllerState::Running,
            State::Finished => ControllerState::Finished,
        }
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        self.state() == ControllerState::Finished
    }

    /// Starts the command and waits for it.
    ///
    /// Returns `false` only for a failure this call is responsible for reporting;
    /// `true` on success, when already started or finished, and when a concurrent
    /// [`kill`](Self::kill) finished the controller first.
    pub async fn run(&self) -> bool {
        let started_at = {
            let mut state = self.lock();
            if !matches!(*state, State::Idle) {
                return true;
            }
            let started_at = self.now();
            *state = State::Running { started_at };
            self.sink
                .handle(&Event::cmd_started(started_at, self.desc.as_str()));
            started_at
        };

        trace!(target: "pex.core.controller", cmd = %self.desc, "start");
        if let Err(e) = self.cmd.start() {
            let mut state = self.lock();
            if matches!(*state, State::Finished) {
                return true;
            }
            *state = State::Finished;
            debug!(target: "pex.core.controller", cmd = %self.desc, error.label = e.as_label(), "start failed");
            let reason = format!("command could not start: {}: {e}", self.desc);
            self.sink.handle(&Event::cmd_finished(
                self.now(),
                self.desc.as_str(),
                started_at,
                Some(reason),
            ));
            return false;
        }

        // A kill that landed between the state transition and the spawn may have
        // found nothing to signal.
        if self.is_finished() {
            debug!(target: "pex.core.controller", cmd = %self.desc, "killed while starting; reaping");
            let _ = self.cmd.kill();
            let _ = self.cmd.wait().await;
            return true;
        }

        let res = self.cmd.wait().await;
        let finished_at = self.now();

        let mut state = self.lock();
        if matches!(*state, State::Finished) {
            trace!(target: "pex.core.controller", cmd = %self.desc, "exit discarded; kill already reported");
            return true;
        }
        *state = State::Finished;

        let ok = res.is_ok();
        if let Err(e) = &res {
            debug!(target: "pex.core.controller", cmd = %self.desc, error.label = e.as_label(), "wait failed");
        }
        let reason = res
            .err()
            .map(|e| format!("command had error: {}: {e}", self.desc));
        self.sink.handle(&Event::cmd_finished(
            finished_at,
            self.desc.as_str(),
            started_at,
            reason,
        ));
        ok
    }

    /// Finishes the controller.
    ///
    /// - `Idle`: marked finished; the command never starts; no event.
    /// - `Running`: the command is killed and a `cmd_finished` event is emitted.
    /// - `Finished`: no-op.
    pub fn kill(&self) {
        let mut state = self.lock();
        let started_at = match *state {
            State::Finished => return,
            State::Idle => {
                *state = State::Finished;
                return;
            }
            State::Running { started_at } => started_at,
        };
        *state = State::Finished;

        debug!(target: "pex.core.controller", cmd = %self.desc, "killing");
        let reason = self
            .cmd
            .kill()
            .err()
            .map(|e| format!("command had error on kill: {}: {e}", self.desc));
        self.sink.handle(&Event::cmd_finished(
            self.now(),
            self.desc.as_str(),
            started_at,
            reason,
        ));
    }

    #[inline]
    fn now(&self) -> SystemTime {
        (self.clock)()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // A panicking sink must not wedge the state machine.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl fmt::Debug for CmdController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CmdController")
            .field("cmd", &self.desc)
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests;
