use pex_model::{Event, EventKind};
use tracing::{error, info};

#[inline]
pub fn message_for(kind: EventKind) -> &'static str {
    match kind {
        EventKind::Started => "runner started",
        EventKind::CmdStarted => "command started",
        EventKind::CmdFinished => "command finished",
        EventKind::Finished => "runner finished",
    }
}

/// Writes one record per event: `info` for everything except failures, which
/// go out at `error`. `time` is the event's own clock reading.
#[inline]
pub fn log_event(e: &Event) {
    let msg = message_for(e.kind());
    let kind = e.kind().as_str();
    let time = e.timestamp();

    match e {
        Event::Started { .. } => info!(target: "pex.events", kind, %time, "{msg}"),
        Event::CmdStarted { cmd, .. } => info!(target: "pex.events", kind, %time, cmd = %cmd, "{msg}"),
        Event::CmdFinished {
            cmd,
            duration,
            error: None,
            ..
        } => info!(target: "pex.events", kind, %time, cmd = %cmd, ?duration, "{msg}"),
        Event::CmdFinished {
            cmd,
            duration,
            error: Some(reason),
            ..
        } => error!(target: "pex.events", kind, %time, cmd = %cmd, ?duration, error = %reason, "{msg}"),
        Event::Finished {
            duration,
            error: None,
            ..
        } => info!(target: "pex.events", kind, %time, ?duration, "{msg}"),
        Event::Finished {
            duration,
            error: Some(reason),
            ..
        } => error!(target: "pex.events", kind, %time, ?duration, error = %reason, "{msg}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        io,
        sync::{Arc, Mutex},
        time::{Duration, SystemTime, UNIX_EPOCH},
    };
    use tracing::Level;
    use tracing_subscriber::fmt::MakeWriter;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Captured {
        type Writer = Captured;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn logged_at_info(events: &[Event]) -> String {
        let out = Captured::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(out.clone())
            .with_max_level(Level::INFO)
            .with_ansi(false)
            .finish();
        tracing::subscriber::with_default(subscriber, || events.iter().for_each(log_event));
        String::from_utf8(out.0.lock().unwrap().clone()).unwrap()
    }

    fn ts(secs: u64) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(secs)
    }

    #[test]
    fn every_kind_is_visible_at_info() {
        let text = logged_at_info(&[
            Event::started(ts(1)),
            Event::cmd_started(ts(2), "echo one"),
            Event::cmd_finished(ts(3), "echo one", ts(2), None),
            Event::finished(ts(4), ts(1), None),
        ]);

        for kind in EventKind::ALL {
            assert!(text.contains(message_for(kind)), "{kind} missing from:\n{text}");
            assert!(text.contains(kind.as_str()));
        }
    }

    #[test]
    fn records_carry_event_time() {
        let text = logged_at_info(&[Event::cmd_started(ts(5), "ls")]);
        assert!(text.contains("1970-01-01T00:00:05Z"), "{text}");
    }

    #[test]
    fn failures_carry_reason() {
        let text = logged_at_info(&[Event::cmd_finished(
            ts(3),
            "false",
            ts(1),
            Some("command had error: false: exit code: 1".into()),
        )]);
        assert!(text.contains("ERROR"));
        assert!(text.contains("exit code: 1"));
    }
}
