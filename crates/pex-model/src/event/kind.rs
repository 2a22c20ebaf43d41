use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::ModelError;

/// Classification of runner lifecycle events.
///
/// Every kind has one canonical snake_case token shared by both encodings:
/// - text: [`fmt::Display`] / [`FromStr`]
/// - json: [`Serialize`] / [`Deserialize`] (a quoted token)
///
/// Decoding is case-insensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// The runner started.
    Started,
    /// A command started.
    CmdStarted,
    /// A command finished (exited, failed to start, or was killed).
    CmdFinished,
    /// The runner finished.
    Finished,
}

impl EventKind {
    /// All kinds in lifecycle order.
    pub const ALL: [EventKind; 4] = [
        EventKind::Started,
        EventKind::CmdStarted,
        EventKind::CmdFinished,
        EventKind::Finished,
    ];

    /// Returns the canonical token.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Started => "started",
            EventKind::CmdStarted => "cmd_started",
            EventKind::CmdFinished => "cmd_finished",
            EventKind::Finished => "finished",
        }
    }

    fn parse(input: &str, format: &'static str) -> Result<Self, ModelError> {
        let norm = input.to_ascii_lowercase();
        match norm.as_str() {
            "started" => Ok(EventKind::Started),
            "cmd_started" => Ok(EventKind::CmdStarted),
            "cmd_finished" => Ok(EventKind::CmdFinished),
            "finished" => Ok(EventKind::Finished),
            _ => Err(ModelError::invalid_kind(format, input)),
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventKind::parse(s, "text")
    }
}

impl Serialize for EventKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EventKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct KindVisitor;

        impl de::Visitor<'_> for KindVisitor {
            type Value = EventKind;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an event kind token")
            }

            fn visit_str<E>(self, v: &str) -> Result<EventKind, E>
            where
                E: de::Error,
            {
                EventKind::parse(v, "json").map_err(E::custom)
            }
        }

        deserializer.deserialize_str(KindVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_roundtrip_all_kinds() {
        for kind in EventKind::ALL {
            let text = kind.to_string();
            let back: EventKind = text.parse().unwrap();
            assert_eq!(back, kind);
        }
    }

    #[test]
    fn json_roundtrip_all_kinds() {
        for kind in EventKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));

            let back: EventKind = serde_json::from_str(&json).unwrap();
            assert_eq!(back, kind);
        }
    }

    #[test]
    fn canonical_tokens() {
        assert_eq!(EventKind::Started.as_str(), "started");
        assert_eq!(EventKind::CmdStarted.as_str(), "cmd_started");
        assert_eq!(EventKind::CmdFinished.as_str(), "cmd_finished");
        assert_eq!(EventKind::Finished.as_str(), "finished");
    }

    #[test]
    fn decode_is_case_insensitive() {
        assert_eq!("CMD_Started".parse::<EventKind>().unwrap(), EventKind::CmdStarted);
        let kind: EventKind = serde_json::from_str(r#""FINISHED""#).unwrap();
        assert_eq!(kind, EventKind::Finished);
    }

    #[test]
    fn text_rejects_unknown_token() {
        let err = "bogus".parse::<EventKind>().unwrap_err();
        assert_eq!(
            err,
            ModelError::InvalidEventKind {
                format: "text",
                input: "bogus".into()
            }
        );
        assert_eq!(err.to_string(), "invalid event kind for text: bogus");
    }

    #[test]
    fn json_rejects_unknown_token() {
        let err = serde_json::from_str::<EventKind>(r#""bogus""#).unwrap_err();
        assert!(err.to_string().contains("invalid event kind for json: bogus"));
    }

    #[test]
    fn failed_decode_leaves_value_untouched() {
        let mut kind = EventKind::CmdFinished;
        if let Ok(parsed) = "bogus".parse::<EventKind>() {
            kind = parsed;
        }
        assert_eq!(kind, EventKind::CmdFinished);
    }
}
