//! Analysis form model and JSON payload construction.
//!
//! The form is kept as an ordered list of name/value entries so that
//! multi-select fields (the analyst picker) keep their selection order.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Name of the multi-select field that is sent as an array.
pub const ANALYSTS_FIELD: &str = "analysts";

/// Analyst kinds offered by the analysis service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AnalystType {
    Market,
    Social,
    News,
    Fundamentals,
}

impl AnalystType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalystType::Market => "market",
            AnalystType::Social => "social",
            AnalystType::News => "news",
            AnalystType::Fundamentals => "fundamentals",
        }
    }

    /// All analysts, in the order the form lists them.
    pub fn all() -> Vec<AnalystType> {
        vec![
            AnalystType::Market,
            AnalystType::Social,
            AnalystType::News,
            AnalystType::Fundamentals,
        ]
    }
}

impl fmt::Display for AnalystType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Research depth presets. The value is the number of debate rounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ResearchDepth {
    /// Quick research, few debate and strategy discussion rounds
    #[default]
    Shallow,
    /// Middle ground, moderate debate rounds and strategy discussion
    Medium,
    /// Comprehensive research, in depth debate and strategy discussion
    Deep,
}

impl ResearchDepth {
    pub fn rounds(&self) -> u32 {
        match self {
            ResearchDepth::Shallow => 1,
            ResearchDepth::Medium => 3,
            ResearchDepth::Deep => 5,
        }
    }
}

/// LLM providers the service knows how to route to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    #[default]
    Openai,
    Anthropic,
    Google,
    Openrouter,
    Ollama,
}

impl LlmProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            LlmProvider::Openai => "openai",
            LlmProvider::Anthropic => "anthropic",
            LlmProvider::Google => "google",
            LlmProvider::Openrouter => "openrouter",
            LlmProvider::Ollama => "ollama",
        }
    }
}

/// Ordered name/value entries, like a browser `FormData`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    entries: Vec<(String, String)>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry. Repeated names are kept, in insertion order.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// All values for `name`, in insertion order.
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

/// The analysis form with its known fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisForm {
    pub ticker: String,
    pub analysis_date: String,
    pub analysts: Vec<String>,
    pub research_depth: String,
    pub llm_provider: String,
    pub shallow_thinker: String,
    pub deep_thinker: String,
    /// Additional fields, appended after the known ones.
    pub extra: Vec<(String, String)>,
}

impl Default for AnalysisForm {
    fn default() -> Self {
        Self {
            ticker: "SPY".to_string(),
            analysis_date: default_analysis_date(),
            analysts: AnalystType::all()
                .iter()
                .map(|a| a.as_str().to_string())
                .collect(),
            research_depth: ResearchDepth::default().rounds().to_string(),
            llm_provider: LlmProvider::default().as_str().to_string(),
            shallow_thinker: "gpt-4o-mini".to_string(),
            deep_thinker: "gpt-4o-mini".to_string(),
            extra: Vec::new(),
        }
    }
}

impl AnalysisForm {
    /// Flatten the form into entries in page order.
    pub fn to_form_data(&self) -> FormData {
        let mut data = FormData::new();
        data.append("ticker", &self.ticker);
        data.append("analysis_date", &self.analysis_date);
        for analyst in &self.analysts {
            data.append(ANALYSTS_FIELD, analyst);
        }
        data.append("research_depth", &self.research_depth);
        data.append("llm_provider", &self.llm_provider);
        data.append("shallow_thinker", &self.shallow_thinker);
        data.append("deep_thinker", &self.deep_thinker);
        for (name, value) in &self.extra {
            data.append(name, value);
        }
        data
    }

    pub fn payload(&self) -> Map<String, Value> {
        build_payload(&self.to_form_data())
    }
}

/// Build the JSON request body from form entries.
///
/// Every name maps to its last string value, then `analysts` is replaced by
/// the array of all its values. No validation is performed.
pub fn build_payload(data: &FormData) -> Map<String, Value> {
    let mut payload = Map::new();
    for (name, value) in data.entries() {
        payload.insert(name.to_string(), Value::String(value.to_string()));
    }

    let analysts = data
        .get_all(ANALYSTS_FIELD)
        .into_iter()
        .map(|v| Value::String(v.to_string()))
        .collect();
    payload.insert(ANALYSTS_FIELD.to_string(), Value::Array(analysts));

    payload
}

/// Today's date (UTC) as `YYYY-MM-DD`.
pub fn default_analysis_date() -> String {
    Utc::now().date_naive().format("%Y-%m-%d").to_string()
}

/// Parse a `KEY=VALUE` pair given on the command line.
pub fn parse_field(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("Expected KEY=VALUE, got '{}'", raw)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn form_with(analysts: &[&str]) -> FormData {
        let mut data = FormData::new();
        data.append("ticker", "NVDA");
        for a in analysts {
            data.append(ANALYSTS_FIELD, *a);
        }
        data.append("llm_provider", "openai");
        data
    }

    #[test]
    fn test_payload_no_analysts() {
        let payload = build_payload(&form_with(&[]));
        assert_eq!(payload["analysts"], json!([]));
        assert_eq!(payload["ticker"], json!("NVDA"));
    }

    #[test]
    fn test_payload_single_analyst() {
        let payload = build_payload(&form_with(&["news"]));
        assert_eq!(payload["analysts"], json!(["news"]));
    }

    #[test]
    fn test_payload_many_analysts_keep_order() {
        let payload = build_payload(&form_with(&["social", "market", "fundamentals"]));
        assert_eq!(payload["analysts"], json!(["social", "market", "fundamentals"]));
        assert_eq!(payload["llm_provider"], json!("openai"));
    }

    #[test]
    fn test_repeated_field_last_value_wins() {
        let mut data = FormData::new();
        data.append("ticker", "AAPL");
        data.append("ticker", "MSFT");
        let payload = build_payload(&data);
        assert_eq!(payload["ticker"], json!("MSFT"));
    }

    #[test]
    fn test_values_stay_strings() {
        let form = AnalysisForm {
            research_depth: "3".to_string(),
            ..AnalysisForm::default()
        };
        let payload = form.payload();
        assert_eq!(payload["research_depth"], json!("3"));
    }

    #[test]
    fn test_extra_fields_included() {
        let form = AnalysisForm {
            extra: vec![("backend_url".to_string(), "http://localhost:11434/v1".to_string())],
            ..AnalysisForm::default()
        };
        let payload = form.payload();
        assert_eq!(payload["backend_url"], json!("http://localhost:11434/v1"));
        assert_eq!(
            payload["analysts"],
            json!(["market", "social", "news", "fundamentals"])
        );
    }

    #[test]
    fn test_default_analysis_date_format() {
        let date = default_analysis_date();
        assert_eq!(date, Utc::now().format("%Y-%m-%d").to_string());
        assert!(chrono::NaiveDate::parse_from_str(&date, "%Y-%m-%d").is_ok());
    }

    #[test]
    fn test_parse_field() {
        assert_eq!(
            parse_field("foo=bar=baz").unwrap(),
            ("foo".to_string(), "bar=baz".to_string())
        );
        assert!(parse_field("novalue").is_err());
        assert!(parse_field("=x").is_err());
    }

    #[test]
    fn test_research_depth_rounds() {
        assert_eq!(ResearchDepth::Shallow.rounds(), 1);
        assert_eq!(ResearchDepth::Medium.rounds(), 3);
        assert_eq!(ResearchDepth::Deep.rounds(), 5);
    }
}
