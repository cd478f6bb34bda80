//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::form::{parse_field, AnalystType, LlmProvider, ResearchDepth};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// TradingAgents client - run a streamed multi-agent market analysis
///
/// Fills in the analysis form, posts it to the server's /analyze endpoint
/// and renders progress, agent messages and report sections as they stream in.
///
/// Examples:
///   tradingagents-client --ticker NVDA
///   tradingagents-client --ticker AAPL --analyst market,news --research-depth deep
///   tradingagents-client --server http://10.0.0.5:8000 --output report.html
///   tradingagents-client --ticker SPY --dry-run
///   tradingagents-client --replay recorded.txt --format json --output view.json
///   tradingagents-client --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Analysis server base URL
    ///
    /// The form is posted to {server}/analyze. Defaults to the config file
    /// value or http://localhost:8000.
    #[arg(long, value_name = "URL", env = "TRADINGAGENTS_SERVER")]
    pub server: Option<String>,

    /// Ticker symbol to analyze
    #[arg(short, long, value_name = "SYMBOL")]
    pub ticker: Option<String>,

    /// Analysis date (YYYY-MM-DD), defaults to today
    #[arg(short, long, value_name = "DATE")]
    pub date: Option<String>,

    /// Analysts to run (repeatable or comma-separated), in order
    #[arg(
        short,
        long = "analyst",
        value_name = "ANALYST",
        value_delimiter = ',',
        conflicts_with = "no_analysts"
    )]
    pub analysts: Option<Vec<AnalystType>>,

    /// Submit the form with no analysts selected
    #[arg(long)]
    pub no_analysts: bool,

    /// Research depth: shallow (1 round), medium (3) or deep (5)
    #[arg(long, value_name = "DEPTH")]
    pub research_depth: Option<ResearchDepth>,

    /// LLM provider used by the server
    #[arg(long, value_name = "PROVIDER")]
    pub llm_provider: Option<LlmProvider>,

    /// Model name for quick-thinking agents
    #[arg(long, value_name = "MODEL")]
    pub shallow_thinker: Option<String>,

    /// Model name for deep-thinking agents
    #[arg(long, value_name = "MODEL")]
    pub deep_thinker: Option<String>,

    /// Extra form field (repeatable)
    ///
    /// Example: --field backend_url=http://localhost:11434/v1
    #[arg(long = "field", value_name = "KEY=VALUE", value_parser = parse_field)]
    pub fields: Vec<(String, String)>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .tradingagents.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Write the rendered results to this file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (html, json)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Timeout for the whole streamed response in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Skip malformed event lines instead of aborting
    #[arg(long)]
    pub lenient: bool,

    /// Render a recorded event stream from a file instead of contacting the server
    #[arg(long, value_name = "FILE")]
    pub replay: Option<PathBuf>,

    /// Save every received event to a file for later --replay
    #[arg(long, value_name = "FILE", conflicts_with = "replay")]
    pub record: Option<PathBuf>,

    /// Print the JSON request body and exit without sending it
    #[arg(long)]
    pub dry_run: bool,

    /// Generate a default .tradingagents.toml configuration file
    #[arg(long)]
    pub init_config: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,
}

/// Output format for the rendered results.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Standalone HTML page with the form and result regions (default)
    #[default]
    Html,
    /// JSON object with the region contents
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if let Some(ref server) = self.server {
            if !server.starts_with("http://") && !server.starts_with("https://") {
                return Err("Server URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if let Some(ref ticker) = self.ticker {
            if ticker.is_empty() || !ticker.chars().all(|c| c.is_ascii_alphabetic()) {
                return Err("Invalid ticker symbol. Please use letters only.".to_string());
            }
        }

        if let Some(ref date) = self.date {
            if chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d").is_err() {
                return Err("Invalid date format. Please use YYYY-MM-DD.".to_string());
            }
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        if let Some(ref replay) = self.replay {
            if !replay.is_file() {
                return Err(format!("Replay file does not exist: {}", replay.display()));
            }
            if self.dry_run {
                return Err("Cannot use both --replay and --dry-run".to_string());
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
