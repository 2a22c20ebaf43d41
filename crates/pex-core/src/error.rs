//! Error types of the runner and of individual commands.
//!
//! - [`CommandError`]: why one command failed to start, exited badly, or could not be killed.
//!   Only ever surfaces as the `error` text of a `cmd_finished` event.
//! - [`RunError`]: the collapsed outcome of a whole run.

use thiserror::Error;

/// Errors produced by a single [`Command`](crate::Command).
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// The executable could not be launched (missing binary, permissions).
    #[error("spawn failed: {0}")]
    Spawn(String),

    /// The process exited with a non-zero status.
    #[error("exit code: {code}")]
    NonZeroExit { code: i32 },

    /// The process was terminated by a signal it did not receive from us.
    #[error("terminated by signal {signal}")]
    Signaled { signal: i32 },

    /// Waiting on the process failed at the OS level.
    #[error("wait failed: {0}")]
    Wait(String),

    /// Signaling a started process failed.
    #[error("kill failed: {0}")]
    Kill(String),

    /// The process was killed on request.
    #[error("killed")]
    Killed,

    /// `wait` was called before a successful `start`.
    #[error("command not started")]
    NotStarted,

    /// `start` was called twice.
    #[error("command already started")]
    AlreadyStarted,
}

impl CommandError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            CommandError::Spawn(_) => "cmd_spawn",
            CommandError::NonZeroExit { .. } => "cmd_exit_non_zero",
            CommandError::Signaled { .. } => "cmd_signaled",
            CommandError::Wait(_) => "cmd_wait",
            CommandError::Kill(_) => "cmd_kill",
            CommandError::Killed => "cmd_killed",
            CommandError::NotStarted => "cmd_not_started",
            CommandError::AlreadyStarted => "cmd_already_started",
        }
    }
}

/// Outcome of [`Runner::run`](crate::Runner::run) when it does not succeed.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunError {
    /// The interrupt token fired during the run.
    #[error("runner interrupted by signal")]
    Interrupted,

    /// At least one command failed to start or exited unsuccessfully.
    #[error("one or more commands failed")]
    CommandFailed,
}

impl RunError {
    pub fn as_label(&self) -> &'static str {
        match self {
            RunError::Interrupted => "run_interrupted",
            RunError::CommandFailed => "run_command_failed",
        }
    }
}
