//! TradingAgents client - streamed market analysis from the command line
//!
//! Submits the analysis form to a TradingAgents server and renders the
//! progress, agent messages and report sections as they stream back.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (connection, bad status, malformed stream, config, etc.)
//!   2 - Interrupted with Ctrl-C (partial results are still written)

mod cli;
mod client;
mod config;
mod decoder;
mod error;
mod event;
mod form;
mod render;
mod view;

use anyhow::{Context, Result};
use cli::{Args, OutputFormat};
use client::{AnalysisClient, ClientConfig, StreamSummary};
use config::{Config, CONFIG_FILE_NAME};
use error::ClientError;
use form::{default_analysis_date, AnalysisForm};
use render::{strip_tags, TerminalRenderer};
use serde_json::{Map, Value};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;
use view::ResultsView;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    init_logging(&args);

    info!("TradingAgents client v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run_analysis(args).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Analysis failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .tradingagents.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to set the server URL, analysts, models and more.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Submit the form and render the stream. Returns the exit code.
async fn run_analysis(args: Args) -> Result<i32> {
    let start_time = Instant::now();

    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    let analysis_date = args.date.clone().unwrap_or_else(default_analysis_date);
    let form = config.form.to_form(analysis_date, args.fields.clone());
    let payload = form.payload();

    if args.dry_run {
        println!("{}", serde_json::to_string_pretty(&Value::Object(payload))?);
        return Ok(0);
    }

    if !args.quiet {
        match args.replay {
            Some(ref path) => println!("📼 Replaying recorded stream: {}", path.display()),
            None => {
                println!("🚀 Submitting analysis to {}", config.server.url);
                println!("   Ticker: {}", form.ticker);
                println!("   Date: {}", form.analysis_date);
                println!("   Analysts: {}", display_analysts(&form));
                println!("   Provider: {}", form.llm_provider);
            }
        }
        println!();
    }

    let mut renderer = TerminalRenderer::new(!args.quiet, !args.quiet);
    if let Some(ref path) = args.record {
        let file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create recording {}", path.display()))?;
        renderer.record_to(file);
    }
    renderer.start();

    let outcome = {
        let stream = stream_results(&args, &config, &payload, &mut renderer);
        tokio::select! {
            result = stream => Some(result),
            _ = tokio::signal::ctrl_c() => None,
        }
    };

    let (exit_code, failure, summary) = match outcome {
        Some(Ok(summary)) => {
            renderer.finish("Analysis complete");
            (0, None, Some(summary))
        }
        Some(Err(e)) => {
            renderer.finish("Analysis failed");
            (1, Some(e), None)
        }
        None => {
            renderer.finish("Interrupted");
            warn!("Interrupted, keeping partial results");
            (2, None, None)
        }
    };

    let view = renderer.into_view();
    let duration = start_time.elapsed().as_secs_f64();

    if let Some(ref path) = args.record {
        info!("Recorded stream saved to {}", path.display());
    }

    let saved = match args.output {
        Some(ref path) => write_output(&view, &form, config.output.format, path).map(|()| {
            if !args.quiet {
                println!("\n💾 Results saved to: {}", path.display());
            }
        }),
        None => {
            if !args.quiet && !view.report.is_empty() {
                println!("\n📊 Final report:\n");
                println!("{}", strip_tags(&view.report));
            }
            Ok(())
        }
    };

    report_failures(failure, saved)?;

    if let Some(summary) = summary {
        if !args.quiet {
            print_summary(&summary, duration);
        }
    }

    Ok(exit_code)
}

/// Read events from the server, or from a recorded file with --replay.
async fn stream_results(
    args: &Args,
    config: &Config,
    payload: &Map<String, Value>,
    renderer: &mut TerminalRenderer,
) -> Result<StreamSummary, ClientError> {
    if let Some(ref path) = args.replay {
        let file = tokio::fs::File::open(path).await?;
        return client::replay(file, config.output.lenient, renderer).await;
    }

    let client = AnalysisClient::new(ClientConfig {
        server_url: config.server.url.clone(),
        connect_timeout_seconds: config.server.connect_timeout_seconds,
        timeout_seconds: match config.server.timeout_seconds {
            0 => None,
            secs => Some(secs),
        },
        lenient: config.output.lenient,
    })?;

    client.submit(payload, renderer).await
}

/// Write the rendered view in the configured format.
fn write_output(
    view: &ResultsView,
    form: &AnalysisForm,
    format: OutputFormat,
    path: &Path,
) -> Result<()> {
    let content = match format {
        OutputFormat::Html => view.to_html_document(form),
        OutputFormat::Json => view.to_json()?,
    };

    std::fs::write(path, content)
        .with_context(|| format!("Failed to write results to {}", path.display()))
}

/// The stream failure takes precedence; a failed save is logged alongside it.
fn report_failures(stream: Option<ClientError>, saved: Result<()>) -> Result<()> {
    match (stream, saved) {
        (Some(e), Err(save_err)) => {
            error!("Failed to save partial results: {:#}", save_err);
            Err(e).context(format!(
                "Stream processing stopped (partial results not saved: {:#})",
                save_err
            ))
        }
        (Some(e), Ok(())) => Err(e).context("Stream processing stopped"),
        (None, saved) => saved,
    }
}

fn print_summary(summary: &StreamSummary, duration: f64) {
    println!("\n📈 Stream Summary:");
    println!(
        "   Events: {} ({} unrecognized)",
        summary.events, summary.unknown_events
    );
    println!(
        "   Chunks: {} | Bytes: {} | Lines: {} ({} ignored)",
        summary.chunks, summary.bytes, summary.lines, summary.ignored_lines
    );
    if summary.skipped_malformed > 0 {
        println!("   ⚠️  Skipped malformed lines: {}", summary.skipped_malformed);
    }
    println!("   Duration: {:.1}s", duration);
}

fn display_analysts(form: &AnalysisForm) -> String {
    if form.analysts.is_empty() {
        "(none)".to_string()
    } else {
        form.analysts.join(", ")
    }
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE_NAME);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {:#}", e);
            Ok(Config::default())
        }
    }
}
