//! Form submission and event stream consumption.
//!
//! The response body is read one chunk at a time, strictly in order. Each
//! chunk is split into lines, each `data:` line becomes a [`StreamEvent`],
//! and every event is handed to an [`EventSink`] before the next chunk is
//! read.

use crate::decoder::LineDecoder;
use crate::error::ClientError;
use crate::event::{parse_data_line, EventKind, StreamEvent};
use futures::StreamExt;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde_json::{Map, Value};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, info, warn};

/// Receives decoded events as they arrive.
pub trait EventSink {
    /// Called for every raw chunk before it is decoded.
    fn on_chunk(&mut self, _len: usize) {}

    fn on_event(&mut self, event: &StreamEvent);
}

/// Settings for the HTTP client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub server_url: String,
    pub connect_timeout_seconds: u64,
    /// Overall request timeout, covering the whole stream. `None` waits forever.
    pub timeout_seconds: Option<u64>,
    /// Skip malformed data lines instead of aborting the stream.
    pub lenient: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:8000".to_string(),
            connect_timeout_seconds: 10,
            timeout_seconds: None,
            lenient: false,
        }
    }
}

/// Counters for one consumed stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamSummary {
    pub chunks: usize,
    pub bytes: u64,
    pub lines: usize,
    pub events: usize,
    pub ignored_lines: usize,
    pub unknown_events: usize,
    pub skipped_malformed: usize,
}

/// Turns raw chunks into events for a sink.
#[derive(Debug, Default)]
pub struct StreamProcessor {
    decoder: LineDecoder,
    summary: StreamSummary,
    lenient: bool,
}

impl StreamProcessor {
    pub fn new(lenient: bool) -> Self {
        Self {
            decoder: LineDecoder::new(),
            summary: StreamSummary::default(),
            lenient,
        }
    }

    pub fn feed(&mut self, chunk: &[u8], sink: &mut dyn EventSink) -> Result<(), ClientError> {
        self.summary.chunks += 1;
        self.summary.bytes += chunk.len() as u64;
        sink.on_chunk(chunk.len());

        for line in self.decoder.push(chunk) {
            self.handle_line(&line, sink)?;
        }
        Ok(())
    }

    /// Flush the trailing line and return the counters.
    pub fn finish(mut self, sink: &mut dyn EventSink) -> Result<StreamSummary, ClientError> {
        if let Some(line) = self.decoder.finish() {
            self.handle_line(&line, sink)?;
        }
        Ok(self.summary)
    }

    fn handle_line(&mut self, line: &str, sink: &mut dyn EventSink) -> Result<(), ClientError> {
        self.summary.lines += 1;
        let line_number = self.summary.lines;

        let event = match parse_data_line(line) {
            Ok(Some(event)) => event,
            Ok(None) => {
                self.summary.ignored_lines += 1;
                return Ok(());
            }
            Err(err) if self.lenient => {
                warn!("Skipping malformed event on line {}: {}", line_number, err);
                self.summary.skipped_malformed += 1;
                return Ok(());
            }
            Err(err) => return Err(err.at_line(line_number)),
        };

        if let EventKind::Other(ref kind) = event.kind {
            debug!("Unrecognized event type '{}' on line {}", kind, line_number);
            self.summary.unknown_events += 1;
        } else {
            debug!("Event '{}' ({} bytes)", event.kind, event.message.len());
        }

        self.summary.events += 1;
        sink.on_event(&event);
        Ok(())
    }
}

/// Client for the analysis endpoint.
pub struct AnalysisClient {
    config: ClientConfig,
    http_client: reqwest::Client,
}

impl AnalysisClient {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let mut builder = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_seconds));
        if let Some(timeout) = config.timeout_seconds {
            builder = builder.timeout(Duration::from_secs(timeout));
        }
        let http_client = builder.build()?;

        Ok(Self {
            config,
            http_client,
        })
    }

    /// The full URL of the analysis endpoint.
    pub fn analyze_url(&self) -> Result<reqwest::Url, ClientError> {
        let raw = format!("{}/analyze", self.config.server_url.trim_end_matches('/'));
        reqwest::Url::parse(&raw).map_err(|e| ClientError::InvalidUrl {
            url: self.config.server_url.clone(),
            reason: e.to_string(),
        })
    }

    /// POST the payload and feed the streamed response into `sink`.
    ///
    /// Events already delivered to the sink stay delivered if the stream
    /// fails part way through.
    pub async fn submit(
        &self,
        payload: &Map<String, Value>,
        sink: &mut dyn EventSink,
    ) -> Result<StreamSummary, ClientError> {
        let url = self.analyze_url()?;
        info!("Submitting analysis request to {}", url);
        debug!("Payload: {}", serde_json::Value::Object(payload.clone()));

        let response = self
            .http_client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "text/event-stream")
            .json(payload)
            .send()
            .await
            .map_err(|e| self.map_request_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Status {
                status: status.as_u16(),
                body,
            });
        }
        debug!(
            "Response {} ({})",
            status,
            response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("no content type")
        );

        let mut processor = StreamProcessor::new(self.config.lenient);
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| self.map_request_error(e))?;
            processor.feed(&chunk, sink)?;
        }

        let summary = processor.finish(sink)?;
        info!(
            "Stream finished: {} events in {} chunks ({} bytes)",
            summary.events, summary.chunks, summary.bytes
        );
        Ok(summary)
    }

    fn map_request_error(&self, err: reqwest::Error) -> ClientError {
        if err.is_timeout() {
            ClientError::Timeout(
                self.config
                    .timeout_seconds
                    .unwrap_or(self.config.connect_timeout_seconds),
            )
        } else if err.is_connect() {
            ClientError::Connect(self.config.server_url.clone())
        } else {
            ClientError::Http(err)
        }
    }
}

/// Feed a recorded stream through the same decode path as a live response.
pub async fn replay<R>(
    mut reader: R,
    lenient: bool,
    sink: &mut dyn EventSink,
) -> Result<StreamSummary, ClientError>
where
    R: AsyncRead + Unpin,
{
    let mut processor = StreamProcessor::new(lenient);
    let mut buf = vec![0u8; 8 * 1024];
    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        processor.feed(&buf[..n], sink)?;
    }
    processor.finish(sink)
}
