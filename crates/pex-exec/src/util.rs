use std::time::Duration;

use tokio::process::Child;

/// How long a child gets to exit after SIGTERM before it is killed outright.
pub const KILL_GRACE: Duration = Duration::from_millis(500);

/// Asks the child to terminate, then kills it if it is still alive after
/// [`KILL_GRACE`]. The child is reaped before this returns.
pub async fn kill_graceful(child: &mut Child) -> std::io::Result<()> {
    cfg_if::cfg_if! {
        if #[cfg(unix)] {
            if let Some(id) = child.id()
                && let Ok(pid) = libc::pid_t::try_from(id)
            {
                // SAFETY: plain syscall on a pid we spawned and have not reaped yet.
                let _ = unsafe { libc::kill(pid, libc::SIGTERM) };
                if tokio::time::timeout(KILL_GRACE, child.wait()).await.is_ok() {
                    tracing::trace!(target: "pex.exec.proc", pid, "exited on SIGTERM");
                    return Ok(());
                }
            }
        }
    }
    child.kill().await
}
