//! # Portfolio News Digest
//!
//! Scrapes the personalized news feed of a finance portal's portfolio page,
//! opens and expands each linked article, lets an operator pick which ones to
//! keep, and summarizes the picks through a chat-completions API.
//!
//! ## Usage
//!
//! ```sh
//! DEEPSEEK_API_KEY=... portfolio_news_digest -o ./output
//! ```
//!
//! ## Architecture
//!
//! The application is a sequential pipeline:
//! 1. **Feed**: scroll the portfolio page and extract news stubs
//! 2. **Enrich**: open each stub's article, expand it, extract fields
//! 3. **Select**: the operator keeps, skips, or stops
//! 4. **Summarize**: one API call per kept article
//! 5. **Output**: every stage is saved as JSON in a timestamped run
//!    directory, plus `summaries.md`
//!
//! If the feed is missing (usually an expired login) the operator is asked to
//! log in once in the browser window; a second miss ends the run.

use chrono::Local;
use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod cli;
mod config;
mod console;
mod dom;
mod driver;
mod error;
mod models;
mod observer;
mod outputs;
mod pipeline;
mod scrapers;
mod select;
mod utils;

use api::ChatCompletionsClient;
use cli::Cli;
use config::{PipelineSettings, SummarizerConfig};
use console::TerminalConsole;
use driver::chrome::{ChromeOptions, ChromeSession};
use error::PipelineError;
use observer::TracingObserver;
use outputs::json::RunDir;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("portfolio_news_digest starting up");

    if let Err(e) = dotenvy::dotenv() {
        debug!(error = %e, "No .env file loaded");
    }

    let args = Cli::parse();
    debug!(?args.output_dir, ?args.resume, "Parsed CLI arguments");
    let settings = PipelineSettings::from(&args);

    // Fail before opening a browser if summaries can't be produced.
    let summarizer = if settings.stages.summarize {
        let config = SummarizerConfig::load(args.config.as_deref())?;
        let api_key = args.api_key.clone().ok_or(PipelineError::MissingApiKey)?;
        Some(ChatCompletionsClient::new(api_key, config))
    } else {
        None
    };

    let run_dir = match &args.resume {
        Some(path) => RunDir::open(path).await?,
        None => RunDir::create(&args.output_dir, Local::now()).await?,
    };
    info!(path = %run_dir.path().display(), "Using run directory");

    let chrome_options = ChromeOptions {
        profile_dir: args.profile_dir.clone(),
        headless: args.headless,
    };
    let launch = || {
        info!("Opening the browser with user data directory");
        ChromeSession::launch(&chrome_options)
    };

    let mut console = TerminalConsole::new();
    let observer = TracingObserver;

    let report = match pipeline::run(
        launch,
        &mut console,
        summarizer.as_ref(),
        &observer,
        &settings,
        &run_dir,
    )
    .await
    {
        Ok(report) => report,
        Err(e) => {
            error!(error = %e, "Pipeline aborted");
            return Err(e);
        }
    };

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        stubs = ?report.stubs,
        enriched = report.enriched,
        selected = report.selected,
        summarized = ?report.summarized,
        "Execution complete"
    );

    Ok(())
}
