//! Error types for the request/stream path.

use thiserror::Error;

/// Errors raised while submitting the form or consuming the event stream.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Invalid server URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Cannot connect to analysis server at {0}. Is it running?")]
    Connect(String),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed event on line {line_number}: {source}")]
    MalformedEvent {
        line_number: usize,
        line: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to read stream: {0}")]
    Io(#[from] std::io::Error),
}

/// Error from parsing a single data line, before line numbers are known.
#[derive(Debug, Error)]
#[error("invalid event JSON: {source}")]
pub struct StreamError {
    pub line: String,
    #[source]
    pub source: serde_json::Error,
}

impl StreamError {
    pub fn at_line(self, line_number: usize) -> ClientError {
        ClientError::MalformedEvent {
            line_number,
            line: self.line,
            source: self.source,
        }
    }
}
