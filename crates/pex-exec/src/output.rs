use std::{
    fmt,
    io::Write,
    process::Stdio,
    sync::{Arc, Mutex},
};

use tokio::{
    io::{AsyncBufReadExt, AsyncRead, BufReader},
    task::JoinHandle,
};
use tracing::warn;

/// Writer shared between the output forwarders of several commands.
pub type SharedWriter = Arc<Mutex<dyn Write + Send>>;

/// Where a child's stdout or stderr goes.
#[derive(Clone, Default)]
pub enum OutputSink {
    /// Same stream as the current process.
    #[default]
    Inherit,
    /// Discarded.
    Null,
    /// Forwarded line by line into a shared writer.
    Writer(SharedWriter),
}

impl OutputSink {
    pub fn writer<W>(w: W) -> Self
    where
        W: Write + Send + 'static,
    {
        OutputSink::Writer(Arc::new(Mutex::new(w)))
    }

    pub(crate) fn stdio(&self) -> Stdio {
        match self {
            OutputSink::Inherit => Stdio::inherit(),
            OutputSink::Null => Stdio::null(),
            OutputSink::Writer(_) => Stdio::piped(),
        }
    }

    pub(crate) fn shared(&self) -> Option<SharedWriter> {
        match self {
            OutputSink::Writer(w) => Some(Arc::clone(w)),
            _ => None,
        }
    }
}

impl fmt::Debug for OutputSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputSink::Inherit => f.write_str("Inherit"),
            OutputSink::Null => f.write_str("Null"),
            OutputSink::Writer(_) => f.write_str("Writer(..)"),
        }
    }
}

/// Copies `reader` into `sink` one line at a time until EOF.
///
/// Each line is written under the writer's lock, so lines from concurrent
/// commands never interleave mid-line.
pub(crate) fn forward_lines<R>(reader: R, sink: SharedWriter, cmd: String) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    let mut w = sink.lock().unwrap_or_else(|e| e.into_inner());
                    if let Err(e) = writeln!(w, "{line}") {
                        warn!(target: "pex.exec.output", %cmd, error = %e, "output write failed");
                        return;
                    }
                }
                Ok(None) => return,
                Err(e) => {
                    warn!(target: "pex.exec.output", %cmd, error = %e, "output read failed");
                    return;
                }
            }
        }
    })
}
