//! # Process-backed command.
//!
//! [`ProcCommand`] launches one [`CommandSpec`] with `tokio::process`.
//!
//! ```text
//! start() ──► spawn child (+ line forwarders for Writer sinks)
//! wait()  ──► select! { child exits │ kill token fires → kill_graceful }
//!             drain forwarders (until EOF or kill), map exit status
//! kill()  ──► cancel kill token (the waiter signals and reaps)
//! ```

use std::{
    fmt,
    process::ExitStatus,
    sync::{
        Mutex,
        atomic::{AtomicBool, Ordering},
    },
};

use async_trait::async_trait;
use tokio::{
    process::{Child, Command as TokioCommand},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use pex_core::{Command, CommandError};
use pex_model::CommandSpec;

use crate::{
    output::{OutputSink, forward_lines},
    util::kill_graceful,
};

struct Spawned {
    child: Child,
    forwarders: Vec<JoinHandle<()>>,
}

pub struct ProcCommand {
    spec: CommandSpec,
    stdout: OutputSink,
    stderr: OutputSink,

    started: AtomicBool,
    spawned: Mutex<Option<Spawned>>,
    kill: CancellationToken,
}

impl ProcCommand {
    /// Command with stdout and stderr inherited from the current process.
    pub fn new(spec: CommandSpec) -> Self {
        Self {
            spec,
            stdout: OutputSink::Inherit,
            stderr: OutputSink::Inherit,
            started: AtomicBool::new(false),
            spawned: Mutex::new(None),
            kill: CancellationToken::new(),
        }
    }

    pub fn with_stdout(mut self, sink: OutputSink) -> Self {
        self.stdout = sink;
        self
    }

    pub fn with_stderr(mut self, sink: OutputSink) -> Self {
        self.stderr = sink;
        self
    }

    pub fn spec(&self) -> &CommandSpec {
        &self.spec
    }

    /// Waits for the forwarders to reach EOF. A background process that inherited
    /// the pipes holds them open past the child's exit, so a kill cuts this short.
    async fn drain(&self, forwarders: Vec<JoinHandle<()>>) {
        let aborts: Vec<_> = forwarders.iter().map(JoinHandle::abort_handle).collect();
        tokio::select! {
            biased;
            _ = self.kill.cancelled() => {
                debug!(target: "pex.exec.proc", cmd = %self.spec, "kill requested; dropping output");
                for a in aborts {
                    a.abort();
                }
            }
            _ = async {
                for f in forwarders {
                    let _ = f.await;
                }
            } => {}
        }
    }

    fn build(&self) -> TokioCommand {
        let mut cmd = TokioCommand::new(&self.spec.program);
        cmd.args(&self.spec.args);
        if let Some(cwd) = &self.spec.cwd {
            cmd.current_dir(cwd);
        }
        for (k, v) in &self.spec.env {
            cmd.env(k, v);
        }
        cmd.stdin(std::process::Stdio::null());
        cmd.stdout(self.stdout.stdio());
        cmd.stderr(self.stderr.stdio());
        cmd.kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl Command for ProcCommand {
    fn start(&self) -> Result<(), CommandError> {
        if self.kill.is_cancelled() {
            return Err(CommandError::Killed);
        }
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(CommandError::AlreadyStarted);
        }

        trace!(target: "pex.exec.proc", program = %self.spec.program, args = ?self.spec.args, "spawn");
        let mut child = self
            .build()
            .spawn()
            .map_err(|e| CommandError::Spawn(e.to_string()))?;

        let desc = self.spec.to_string();
        let mut forwarders = Vec::new();
        if let (Some(out), Some(sink)) = (child.stdout.take(), self.stdout.shared()) {
            forwarders.push(forward_lines(out, sink, desc.clone()));
        }
        if let (Some(err), Some(sink)) = (child.stderr.take(), self.stderr.shared()) {
            forwarders.push(forward_lines(err, sink, desc));
        }

        debug!(target: "pex.exec.proc", cmd = %self.spec, pid = ?child.id(), "spawned");
        *self.spawned.lock().unwrap_or_else(|e| e.into_inner()) = Some(Spawned { child, forwarders });
        Ok(())
    }

    async fn wait(&self) -> Result<(), CommandError> {
        let taken = self.spawned.lock().unwrap_or_else(|e| e.into_inner()).take();
        let Some(Spawned {
            mut child,
            forwarders,
        }) = taken
        else {
            return Err(if self.started.load(Ordering::SeqCst) {
                CommandError::Wait("already waited".into())
            } else {
                CommandError::NotStarted
            });
        };

        tokio::select! {
            biased;
            _ = self.kill.cancelled() => {
                debug!(target: "pex.exec.proc", cmd = %self.spec, "kill requested; terminating child");
                if let Err(e) = kill_graceful(&mut child).await {
                    warn!(target: "pex.exec.proc", cmd = %self.spec, error = %e, "kill failed");
                }
                // Orphaned grandchildren may keep the pipes open.
                for f in forwarders {
                    f.abort();
                }
                Err(CommandError::Killed)
            }
            status = child.wait() => {
                let status = status.map_err(|e| CommandError::Wait(e.to_string()))?;
                trace!(target: "pex.exec.proc", cmd = %self.spec, %status, "exited");
                self.drain(forwarders).await;
                exit_result(status)
            }
        }
    }

    fn kill(&self) -> Result<(), CommandError> {
        self.kill.cancel();
        Ok(())
    }
}

fn exit_result(status: ExitStatus) -> Result<(), CommandError> {
    if status.success() {
        return Ok(());
    }
    if let Some(code) = status.code() {
        return Err(CommandError::NonZeroExit { code });
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return Err(CommandError::Signaled { signal });
        }
    }
    Err(CommandError::Wait(format!("abnormal exit: {status}")))
}

impl fmt::Display for ProcCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.spec, f)
    }
}

impl fmt::Debug for ProcCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcCommand")
            .field("spec", &self.spec)
            .field("stdout", &self.stdout)
            .field("stderr", &self.stderr)
            .field("started", &self.started.load(Ordering::SeqCst))
            .field("killed", &self.kill.is_cancelled())
            .finish()
    }
}
