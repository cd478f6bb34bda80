//! Terminal presentation of the streamed results.
//!
//! The renderer keeps the authoritative [`ResultsView`] and mirrors it to
//! the terminal: progress text goes to a spinner line, message and report
//! fragments are printed as plain text above it.

use crate::client::EventSink;
use crate::event::{encode_event, EventKind, StreamEvent};
use crate::view::{ResultsView, STARTING_PROGRESS};
use indicatif::{ProgressBar, ProgressStyle};
use scraper::{Html, Node};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::time::Duration;
use tracing::{debug, warn};

pub struct TerminalRenderer {
    view: ResultsView,
    progress_bar: Option<ProgressBar>,
    echo: bool,
    recorder: Option<BufWriter<File>>,
}

impl TerminalRenderer {
    /// `show_progress` draws the spinner, `echo` prints message and report text.
    pub fn new(show_progress: bool, echo: bool) -> Self {
        let progress_bar = if show_progress {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} [{elapsed_precise}] {binary_bytes:>10} {wide_msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            pb.enable_steady_tick(Duration::from_millis(120));
            Some(pb)
        } else {
            None
        };

        Self {
            view: ResultsView::new(),
            progress_bar,
            echo,
            recorder: None,
        }
    }

    /// Also write every received event to `file`, framed for `--replay`.
    pub fn record_to(&mut self, file: File) {
        self.recorder = Some(BufWriter::new(file));
    }

    /// Reset the regions for a new submission.
    pub fn start(&mut self) {
        self.view.reset();
        if let Some(ref pb) = self.progress_bar {
            pb.set_message(STARTING_PROGRESS);
        }
    }

    pub fn into_view(mut self) -> ResultsView {
        if let Some(ref pb) = self.progress_bar {
            pb.finish_and_clear();
        }
        if let Some(mut recorder) = self.recorder.take() {
            if let Err(e) = recorder.flush() {
                warn!("Failed to flush recorded stream: {}", e);
            }
        }
        self.view
    }

    /// Stop the spinner, leaving `message` on its line.
    pub fn finish(&self, message: &str) {
        if let Some(ref pb) = self.progress_bar {
            pb.finish_with_message(message.to_string());
        }
    }

    fn record(&mut self, event: &StreamEvent) {
        let failed = match self.recorder {
            Some(ref mut recorder) => recorder.write_all(encode_event(event).as_bytes()).err(),
            None => None,
        };
        if let Some(e) = failed {
            warn!("Stopping stream recording: {}", e);
            self.recorder = None;
        }
    }

    fn print(&self, text: &str) {
        if !self.echo || text.is_empty() {
            return;
        }
        match self.progress_bar {
            Some(ref pb) => pb.println(text),
            None => println!("{}", text),
        }
    }
}

impl EventSink for TerminalRenderer {
    fn on_chunk(&mut self, len: usize) {
        if let Some(ref pb) = self.progress_bar {
            pb.inc(len as u64);
        }
    }

    fn on_event(&mut self, event: &StreamEvent) {
        self.record(event);

        if !self.view.apply(event) {
            debug!("Ignoring event of type '{}'", event.kind);
            return;
        }

        match event.kind {
            EventKind::Progress => {
                if let Some(ref pb) = self.progress_bar {
                    pb.set_message(strip_tags(&event.message));
                }
            }
            EventKind::Message => {
                self.print(&format!("💬 {}", strip_tags(&event.message)));
            }
            EventKind::Report => {
                self.print(&format!("\n📄 {}\n", strip_tags(&event.message)));
            }
            EventKind::Other(_) => {}
        }
    }
}

const BLOCK_TAGS: &[&str] = &[
    "p", "div", "br", "li", "tr", "h1", "h2", "h3", "h4", "h5", "h6", "pre", "ul", "ol",
];

/// Convert an HTML fragment to terminal text.
///
/// The fragment goes through a real HTML parser, so entities are decoded and
/// a bare `<` in prose stays text. Block elements start a new line.
pub fn strip_tags(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let mut text = String::with_capacity(html.len());

    for node in fragment.root_element().descendants() {
        match node.value() {
            Node::Text(t) => text.push_str(t),
            Node::Element(element) => {
                if BLOCK_TAGS.contains(&element.name()) && !text.is_empty() && !text.ends_with('\n')
                {
                    text.push('\n');
                }
            }
            _ => {}
        }
    }

    text.replace('\u{a0}', " ").trim().to_string()
}
