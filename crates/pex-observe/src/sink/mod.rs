mod view;
pub use view::{log_event, message_for};

use pex_model::{Event, EventSink};
use tracing::info;

/// How [`EventLog`] renders events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EventLogMode {
    /// One `tracing` record per event with structured fields.
    #[default]
    Structured,
    /// The serialized JSON record as the message.
    Json,
}

/// Default event sink: writes every runner event to the `tracing` pipeline.
#[derive(Debug, Clone, Copy, Default)]
pub struct EventLog {
    mode: EventLogMode,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn json() -> Self {
        Self {
            mode: EventLogMode::Json,
        }
    }

    pub fn mode(&self) -> EventLogMode {
        self.mode
    }
}

impl EventSink for EventLog {
    fn handle(&self, event: &Event) {
        match self.mode {
            EventLogMode::Structured => log_event(event),
            EventLogMode::Json => info!(target: "pex.events", "{}", event.to_json()),
        }
    }
}
