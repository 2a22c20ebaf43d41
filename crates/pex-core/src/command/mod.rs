use std::{fmt, sync::Arc};

use async_trait::async_trait;

use crate::CommandError;

/// A thing that can be started, waited on, killed, and described.
///
/// Decouples the runner from any particular process-launching mechanism.
/// All methods take `&self`: `kill` must be callable from another task while
/// `wait` is pending.
///
/// `Display` is the command's description (`program arg1 arg2 ...`), used only
/// for diagnostics and events; it is never parsed.
#[async_trait]
pub trait Command: fmt::Display + Send + Sync {
    /// Launches the command. Fails if it cannot be spawned.
    fn start(&self) -> Result<(), CommandError>;

    /// Suspends until the command exits.
    ///
    /// Fails on non-zero exit, on termination by signal, or on an OS wait error.
    async fn wait(&self) -> Result<(), CommandError>;

    /// Requests termination of a started command.
    ///
    /// No-op returning `Ok(())` if the command never started.
    fn kill(&self) -> Result<(), CommandError>;
}

/// Shared handle to a command.
pub type CommandRef = Arc<dyn Command>;
