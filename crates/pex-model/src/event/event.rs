//! # Runner lifecycle events.
//!
//! [`Event`] is a closed union with one payload shape per [`EventKind`]:
//!
//! | kind           | payload                                 |
//! |----------------|-----------------------------------------|
//! | `started`      | `at`                                    |
//! | `cmd_started`  | `at`, `cmd`                             |
//! | `cmd_finished` | `at`, `cmd`, `duration`, `error`        |
//! | `finished`     | `at`, `duration`, `error`               |
//!
//! `error == None` means success. The flattened wire shape is [`EventRecord`]:
//! ```text
//! {"type":"cmd_finished","time":"2026-01-01T00:00:00Z","fields":{"cmd":"sh -c true","duration":"12ms"}}
//! ```

use std::{
    collections::BTreeMap,
    time::{Duration, SystemTime},
};

use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use crate::EventKind;

/// Lifecycle event emitted by the runner and its command controllers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Started {
        at: SystemTime,
    },
    CmdStarted {
        at: SystemTime,
        cmd: String,
    },
    CmdFinished {
        at: SystemTime,
        cmd: String,
        duration: Duration,
        error: Option<String>,
    },
    Finished {
        at: SystemTime,
        duration: Duration,
        error: Option<String>,
    },
}

impl Event {
    pub fn started(at: SystemTime) -> Self {
        Event::Started { at }
    }

    pub fn cmd_started(at: SystemTime, cmd: impl Into<String>) -> Self {
        Event::CmdStarted {
            at,
            cmd: cmd.into(),
        }
    }

    /// Builds a command finish event; `duration` is measured from `started_at`
    /// and saturates to zero if the clock went backwards.
    pub fn cmd_finished(
        at: SystemTime,
        cmd: impl Into<String>,
        started_at: SystemTime,
        error: Option<String>,
    ) -> Self {
        Event::CmdFinished {
            at,
            cmd: cmd.into(),
            duration: elapsed(started_at, at),
            error: non_empty(error),
        }
    }

    pub fn finished(at: SystemTime, started_at: SystemTime, error: Option<String>) -> Self {
        Event::Finished {
            at,
            duration: elapsed(started_at, at),
            error: non_empty(error),
        }
    }

    #[inline]
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Started { .. } => EventKind::Started,
            Event::CmdStarted { .. } => EventKind::CmdStarted,
            Event::CmdFinished { .. } => EventKind::CmdFinished,
            Event::Finished { .. } => EventKind::Finished,
        }
    }

    #[inline]
    pub fn at(&self) -> SystemTime {
        match self {
            Event::Started { at }
            | Event::CmdStarted { at, .. }
            | Event::CmdFinished { at, .. }
            | Event::Finished { at, .. } => *at,
        }
    }

    /// Command description, for command-scoped events.
    #[inline]
    pub fn cmd(&self) -> Option<&str> {
        match self {
            Event::CmdStarted { cmd, .. } | Event::CmdFinished { cmd, .. } => Some(cmd),
            _ => None,
        }
    }

    /// Elapsed time, for finish events.
    #[inline]
    pub fn duration(&self) -> Option<Duration> {
        match self {
            Event::CmdFinished { duration, .. } | Event::Finished { duration, .. } => {
                Some(*duration)
            }
            _ => None,
        }
    }

    #[inline]
    pub fn error(&self) -> Option<&str> {
        match self {
            Event::CmdFinished { error, .. } | Event::Finished { error, .. } => error.as_deref(),
            _ => None,
        }
    }

    #[inline]
    pub fn is_success(&self) -> bool {
        self.error().is_none()
    }

    /// Structured fields carried by this event (`cmd`, `duration`).
    pub fn fields(&self) -> BTreeMap<String, String> {
        let mut fields = BTreeMap::new();
        if let Some(cmd) = self.cmd() {
            fields.insert("cmd".to_string(), cmd.to_string());
        }
        if let Some(duration) = self.duration() {
            fields.insert("duration".to_string(), format!("{duration:?}"));
        }
        fields
    }

    pub fn to_record(&self) -> EventRecord {
        EventRecord {
            kind: self.kind(),
            time: self.timestamp(),
            fields: self.fields(),
            error: self.error().map(str::to_string),
        }
    }

    /// Event time as RFC3339 (UTC).
    pub fn timestamp(&self) -> String {
        rfc3339(self.at())
    }

    /// Serializes the event as a single JSON line.
    pub fn to_json(&self) -> String {
        // A record of strings and a token cannot fail to serialize.
        serde_json::to_string(&self.to_record()).unwrap_or_default()
    }
}

/// Flattened wire representation of an [`Event`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub time: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn elapsed(from: SystemTime, to: SystemTime) -> Duration {
    to.duration_since(from).unwrap_or(Duration::ZERO)
}

fn non_empty(error: Option<String>) -> Option<String> {
    error.filter(|e| !e.is_empty())
}

fn rfc3339(at: SystemTime) -> String {
    OffsetDateTime::from(at)
        .format(&Rfc3339)
        .unwrap_or_default()
}
