//! # pex-core
//!
//! Bounded-concurrency runner for independent external commands.
//!
//! ```text
//!   Vec<CommandRef> ──► Runner::run()
//!                          │ emit Started
//!                          ├─► CmdController #1 ─┐
//!                          ├─► CmdController #2 ─┼─ one task each, gated by Semaphore
//!                          └─► CmdController #N ─┘      │
//!                          │                            ├─ emit CmdStarted
//!                          │                            └─ emit CmdFinished (exactly once)
//!                          │
//!                          ├─ wait: all done | fast-fail | interrupt token
//!                          ├─ kill sweep over every controller
//!                          ├─ drain tasks
//!                          └─ emit Finished ─► Result<(), RunError>
//! ```
//!
//! Per-command failures are reported only through [`CmdFinished`](pex_model::Event::CmdFinished)
//! events; the returned error only distinguishes interrupted from failed.

pub mod error;
pub use error::{CommandError, RunError};

pub mod command;
pub use command::{Command, CommandRef};

pub mod semaphore;
pub use semaphore::{Permit, Semaphore};

pub mod controller;
pub use controller::{CmdController, ControllerState};

pub mod runner;
pub use runner::{Clock, Runner, RunnerBuilder, RunnerConfig, RunnerOption};

pub mod fake;

pub use pex_model::{Event, EventKind, EventSink, NoopSink};
