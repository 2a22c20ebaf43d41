use crate::Event;

/// Receives every lifecycle event, synchronously and once per event.
///
/// Sinks run on the scheduling hot path and are called from many tasks at
/// once: implementations must be cheap and must not block indefinitely.
pub trait EventSink: Send + Sync {
    fn handle(&self, event: &Event);
}

impl<F> EventSink for F
where
    F: Fn(&Event) + Send + Sync,
{
    #[inline]
    fn handle(&self, event: &Event) {
        self(event)
    }
}

/// Drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl EventSink for NoopSink {
    #[inline]
    fn handle(&self, _event: &Event) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::time::SystemTime;

    #[test]
    fn closures_are_sinks() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = {
            let seen = Arc::clone(&seen);
            move |e: &Event| seen.lock().unwrap().push(e.kind())
        };

        sink.handle(&Event::started(SystemTime::now()));
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn noop_sink_accepts_events() {
        let sink: Arc<dyn EventSink> = Arc::new(NoopSink);
        sink.handle(&Event::started(SystemTime::now()));
    }
}
