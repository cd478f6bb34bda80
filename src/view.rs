//! Result regions updated by stream events.

use crate::event::{EventKind, StreamEvent};
use crate::form::AnalysisForm;
use serde::{Deserialize, Serialize};

/// Element ids the results page exposes.
pub mod region {
    pub const ANALYSIS_DATE: &str = "analysis_date";
    pub const FORM: &str = "analysis-form";
    pub const RESULTS: &str = "results";
    pub const PROGRESS: &str = "progress";
    pub const MESSAGES: &str = "messages";
    pub const REPORT: &str = "report";
}

/// Text shown in the progress region as soon as a form is submitted.
pub const STARTING_PROGRESS: &str = "Starting analysis...";

/// Contents of the three output regions. Markup is stored raw.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultsView {
    pub visible: bool,
    pub progress: String,
    pub messages: String,
    pub report: String,
}

impl ResultsView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show the results block and clear it for a new submission.
    pub fn reset(&mut self) {
        self.visible = true;
        self.progress = STARTING_PROGRESS.to_string();
        self.messages.clear();
        self.report.clear();
    }

    /// Apply one event. Returns `false` when the event type is not rendered.
    pub fn apply(&mut self, event: &StreamEvent) -> bool {
        match &event.kind {
            EventKind::Progress => {
                self.progress = event.message.clone();
            }
            EventKind::Message => {
                self.messages.push_str(&format!("<p>{}</p>", event.message));
            }
            EventKind::Report => {
                self.report.push_str(&format!("<div>{}</div>", event.message));
            }
            EventKind::Other(_) => return false,
        }
        true
    }

    /// Render the submitted form and the regions as a standalone page.
    pub fn to_html_document(&self, form: &AnalysisForm) -> String {
        let mut html = String::new();

        html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
        html.push_str(&format!(
            "<title>{} analysis {}</title>\n",
            escape_attr(&form.ticker),
            escape_attr(&form.analysis_date)
        ));
        html.push_str("</head>\n<body>\n");

        html.push_str(&format!("<form id=\"{}\">\n", region::FORM));
        for (name, value) in form.to_form_data().entries() {
            let id = if name == region::ANALYSIS_DATE {
                format!(" id=\"{}\"", region::ANALYSIS_DATE)
            } else {
                String::new()
            };
            html.push_str(&format!(
                "<input{} name=\"{}\" value=\"{}\" readonly>\n",
                id,
                escape_attr(name),
                escape_attr(value)
            ));
        }
        html.push_str("</form>\n");

        html.push_str(&format!(
            "<div id=\"{}\" style=\"display: {}\">\n",
            region::RESULTS,
            if self.visible { "block" } else { "none" }
        ));
        for (id, content) in [
            (region::PROGRESS, &self.progress),
            (region::MESSAGES, &self.messages),
            (region::REPORT, &self.report),
        ] {
            html.push_str(&format!("<div id=\"{}\">{}</div>\n", id, content));
        }
        html.push_str("</div>\n</body>\n</html>\n");

        html
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        serde_json::to_string_pretty(self).map_err(Into::into)
    }
}

fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
