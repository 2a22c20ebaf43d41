//! Bridges OS termination signals to the runner's interrupt token.
//!
//! Unix listens for SIGINT, SIGTERM and SIGQUIT; other platforms for Ctrl-C.
//! Handlers are installed before [`interrupt_on_signal`] returns, so a signal
//! arriving as the run starts still interrupts it.

use std::io;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Installed shutdown signal handlers.
pub struct ShutdownSignals {
    #[cfg(unix)]
    interrupt: tokio::signal::unix::Signal,
    #[cfg(unix)]
    terminate: tokio::signal::unix::Signal,
    #[cfg(unix)]
    quit: tokio::signal::unix::Signal,
    #[cfg(windows)]
    ctrl_c: tokio::signal::windows::CtrlC,
}

impl ShutdownSignals {
    /// Installs the handlers. Must be called from within a tokio runtime.
    #[cfg(unix)]
    pub fn register() -> io::Result<Self> {
        use tokio::signal::unix::{SignalKind, signal};

        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
            quit: signal(SignalKind::quit())?,
        })
    }

    #[cfg(windows)]
    pub fn register() -> io::Result<Self> {
        Ok(Self {
            ctrl_c: tokio::signal::windows::ctrl_c()?,
        })
    }

    /// Name of the next signal delivered, or `None` once no handler can fire.
    #[cfg(unix)]
    pub async fn recv(&mut self) -> Option<&'static str> {
        tokio::select! {
            Some(()) = self.interrupt.recv() => Some("SIGINT"),
            Some(()) = self.terminate.recv() => Some("SIGTERM"),
            Some(()) = self.quit.recv() => Some("SIGQUIT"),
            else => None,
        }
    }

    #[cfg(windows)]
    pub async fn recv(&mut self) -> Option<&'static str> {
        self.ctrl_c.recv().await.map(|()| "CTRL_C")
    }
}

/// Cancels `interrupt` on the first shutdown signal.
///
/// Abort the returned handle once the run is over.
pub fn interrupt_on_signal(interrupt: CancellationToken) -> io::Result<JoinHandle<()>> {
    let mut signals = ShutdownSignals::register()?;
    Ok(tokio::spawn(async move {
        match signals.recv().await {
            Some(signal) => {
                info!(target: "pex.cli", signal, "shutdown signal received; interrupting run");
                interrupt.cancel();
            }
            None => debug!(target: "pex.cli", "signal handlers closed"),
        }
    }))
}
