//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.tradingagents.toml` files.

use crate::cli::{Args, OutputFormat};
use crate::form::{AnalysisForm, AnalystType, LlmProvider, ResearchDepth};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name, looked up in the current directory.
pub const CONFIG_FILE_NAME: &str = ".tradingagents.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Analysis server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Default form values.
    #[serde(default)]
    pub form: FormConfig,

    /// Output settings.
    #[serde(default)]
    pub output: OutputConfig,
}

/// Analysis server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Base URL; the form is posted to `{url}/analyze`.
    #[serde(default = "default_server_url")]
    pub url: String,

    /// Connection timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,

    /// Timeout for the whole streamed response, 0 for none.
    #[serde(default)]
    pub timeout_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: default_server_url(),
            connect_timeout_seconds: default_connect_timeout(),
            timeout_seconds: 0,
        }
    }
}

fn default_server_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_connect_timeout() -> u64 {
    10
}

/// Values pre-filled into the analysis form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormConfig {
    #[serde(default = "default_ticker")]
    pub ticker: String,

    #[serde(default = "AnalystType::all")]
    pub analysts: Vec<AnalystType>,

    #[serde(default)]
    pub research_depth: ResearchDepth,

    #[serde(default)]
    pub llm_provider: LlmProvider,

    #[serde(default = "default_thinker")]
    pub shallow_thinker: String,

    #[serde(default = "default_thinker")]
    pub deep_thinker: String,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            ticker: default_ticker(),
            analysts: AnalystType::all(),
            research_depth: ResearchDepth::default(),
            llm_provider: LlmProvider::default(),
            shallow_thinker: default_thinker(),
            deep_thinker: default_thinker(),
        }
    }
}

impl FormConfig {
    /// Fill in the analysis form from these defaults.
    pub fn to_form(&self, analysis_date: String, extra: Vec<(String, String)>) -> AnalysisForm {
        AnalysisForm {
            ticker: self.ticker.clone(),
            analysis_date,
            analysts: self
                .analysts
                .iter()
                .map(|a| a.as_str().to_string())
                .collect(),
            research_depth: self.research_depth.rounds().to_string(),
            llm_provider: self.llm_provider.as_str().to_string(),
            shallow_thinker: self.shallow_thinker.clone(),
            deep_thinker: self.deep_thinker.clone(),
            extra,
        }
    }
}

fn default_ticker() -> String {
    "SPY".to_string()
}

fn default_thinker() -> String {
    "gpt-4o-mini".to_string()
}

/// Output settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Format of the saved report.
    #[serde(default)]
    pub format: OutputFormat,

    /// Skip malformed data lines instead of aborting.
    #[serde(default)]
    pub lenient: bool,
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE_NAME);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// Only values given explicitly on the command line override the file.
    pub fn merge_with_args(&mut self, args: &Args) {
        if let Some(ref server) = args.server {
            self.server.url = server.clone();
        }
        if let Some(timeout) = args.timeout {
            self.server.timeout_seconds = timeout;
        }

        if let Some(ref ticker) = args.ticker {
            self.form.ticker = ticker.clone();
        }
        if let Some(ref analysts) = args.analysts {
            self.form.analysts = analysts.clone();
        } else if args.no_analysts {
            self.form.analysts.clear();
        }
        if let Some(depth) = args.research_depth {
            self.form.research_depth = depth;
        }
        if let Some(provider) = args.llm_provider {
            self.form.llm_provider = provider;
        }
        if let Some(ref model) = args.shallow_thinker {
            self.form.shallow_thinker = model.clone();
        }
        if let Some(ref model) = args.deep_thinker {
            self.form.deep_thinker = model.clone();
        }

        if let Some(format) = args.format {
            self.output.format = format;
        }
        if args.lenient {
            self.output.lenient = true;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.url, "http://localhost:8000");
        assert_eq!(config.form.ticker, "SPY");
        assert_eq!(config.form.analysts.len(), 4);
        assert_eq!(config.output.format, OutputFormat::Html);
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[server]
url = "http://analysis.internal:9000"
timeout_seconds = 600

[form]
ticker = "NVDA"
analysts = ["news", "market"]
research_depth = "deep"
llm_provider = "anthropic"

[output]
format = "json"
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.server.url, "http://analysis.internal:9000");
        assert_eq!(config.server.timeout_seconds, 600);
        assert_eq!(config.server.connect_timeout_seconds, 10);
        assert_eq!(config.form.ticker, "NVDA");
        assert_eq!(
            config.form.analysts,
            vec![AnalystType::News, AnalystType::Market]
        );
        assert_eq!(config.form.research_depth, ResearchDepth::Deep);
        assert_eq!(config.form.llm_provider, LlmProvider::Anthropic);
        assert_eq!(config.form.shallow_thinker, "gpt-4o-mini");
        assert_eq!(config.output.format, OutputFormat::Json);
        assert!(!config.output.lenient);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[form]\nticker = \"TSLA\"").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.form.ticker, "TSLA");
        assert_eq!(config.server.url, "http://localhost:8000");
    }

    #[test]
    fn test_load_invalid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[form\nticker = ").unwrap();
        assert!(Config::load(file.path()).is_err());
    }

    #[test]
    fn test_merge_only_explicit_args() {
        let mut config = Config::default();
        config.form.ticker = "AMD".to_string();
        config.server.url = "http://file-server:8000".to_string();

        let args = Args::parse_from([
            "tradingagents-client",
            "--server",
            "http://cli-server:8000",
            "--analyst",
            "social",
        ]);
        config.merge_with_args(&args);

        assert_eq!(config.server.url, "http://cli-server:8000");
        assert_eq!(config.form.ticker, "AMD");
        assert_eq!(config.form.analysts, vec![AnalystType::Social]);

        let args = Args::parse_from(["tradingagents-client", "--no-analysts"]);
        config.merge_with_args(&args);
        assert!(config.form.analysts.is_empty());
    }

    #[test]
    fn test_form_from_config() {
        let config = FormConfig {
            analysts: vec![AnalystType::Fundamentals, AnalystType::Social],
            research_depth: ResearchDepth::Medium,
            llm_provider: LlmProvider::Ollama,
            ..FormConfig::default()
        };
        let form = config.to_form(
            "2025-01-02".to_string(),
            vec![("note".to_string(), "x".to_string())],
        );
        let payload = form.payload();

        assert_eq!(payload["analysis_date"], "2025-01-02");
        assert_eq!(payload["research_depth"], "3");
        assert_eq!(payload["llm_provider"], "ollama");
        assert_eq!(
            payload["analysts"],
            serde_json::json!(["fundamentals", "social"])
        );
        assert_eq!(payload["note"], "x");
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(toml_str.contains("[server]"));
        assert!(toml_str.contains("[form]"));
        assert!(toml_str.contains("[output]"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.form.analysts, AnalystType::all());
    }
}
