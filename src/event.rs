//! Stream events carried on `data:` lines.

use crate::error::StreamError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Prefix marking a line that carries an event.
pub const DATA_PREFIX: &str = "data:";

/// Which result region an event targets.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    Progress,
    Message,
    Report,
    /// A type this client does not render. Parsed, then ignored.
    Other(String),
}

impl EventKind {
    pub fn as_str(&self) -> &str {
        match self {
            EventKind::Progress => "progress",
            EventKind::Message => "message",
            EventKind::Report => "report",
            EventKind::Other(s) => s,
        }
    }
}

impl From<&str> for EventKind {
    fn from(s: &str) -> Self {
        match s {
            "progress" => EventKind::Progress,
            "message" => EventKind::Message,
            "report" => EventKind::Report,
            other => EventKind::Other(other.to_string()),
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for EventKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EventKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(EventKind::from(raw.as_str()))
    }
}

/// One decoded server event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,
    #[serde(default)]
    pub message: String,
}

#[cfg(test)]
impl StreamEvent {
    pub fn new(kind: EventKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn progress(message: impl Into<String>) -> Self {
        Self::new(EventKind::Progress, message)
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self::new(EventKind::Message, message)
    }

    pub fn report(message: impl Into<String>) -> Self {
        Self::new(EventKind::Report, message)
    }
}

/// Parse one text line.
///
/// Returns `Ok(None)` for lines that are not data lines.
pub fn parse_data_line(line: &str) -> Result<Option<StreamEvent>, StreamError> {
    let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
        return Ok(None);
    };

    serde_json::from_str(payload)
        .map(Some)
        .map_err(|source| StreamError {
            line: line.to_string(),
            source,
        })
}

/// Frame an event the way the server writes it.
pub fn encode_event(event: &StreamEvent) -> String {
    // Serializing a struct of strings cannot fail.
    let json = serde_json::to_string(event).unwrap_or_default();
    format!("{} {}\n\n", DATA_PREFIX, json)
}
