//! Command-line interface definitions for Portfolio News Digest.
//!
//! Every option can also come from the environment (a `.env` file is loaded
//! before parsing).
//!
//! Wait and pause options are given in (possibly fractional) seconds and are
//! parsed straight into [`Duration`]s by [`parse_seconds`], so a value that
//! cannot be a duration is rejected before anything starts.

use crate::config::DEFAULT_FEED_URL;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Parse a non-negative, finite number of seconds into a [`Duration`].
///
/// # Arguments
///
/// * `raw` - The command-line value, e.g. `"2"` or `"0.5"`
///
/// # Returns
///
/// The duration, or a message for clap to print when the value is not a
/// number, is negative, is NaN or infinite, or does not fit in a `Duration`.
pub fn parse_seconds(raw: &str) -> Result<Duration, String> {
    let secs: f64 = raw
        .trim()
        .parse()
        .map_err(|e| format!("`{raw}` is not a number of seconds: {e}"))?;
    Duration::try_from_secs_f64(secs)
        .map_err(|e| format!("`{raw}` is not a usable number of seconds: {e}"))
}

/// Scrape the portfolio news feed, pick articles, and summarize them.
///
/// # Examples
///
/// ```sh
/// # Full run: scrape, pick interactively, summarize, write Markdown
/// portfolio_news_digest
///
/// # Scrape only, keep every article, cap at 5
/// portfolio_news_digest --no-select --no-summarize --max-articles 5
///
/// # Continue an interrupted run
/// portfolio_news_digest --resume "output/2025-01-06 09.30.00"
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Portfolio page hosting the personalized news feed
    #[arg(long, env = "FEED_URL", default_value = DEFAULT_FEED_URL)]
    pub feed_url: String,

    /// Browser profile directory; keeps the portal login between runs
    #[arg(long, env = "PROFILE_DIR", default_value = "selenium_profile")]
    pub profile_dir: PathBuf,

    /// Parent directory for timestamped run directories
    #[arg(short, long, env = "OUTPUT_DIR", default_value = "output")]
    pub output_dir: PathBuf,

    /// Reuse an existing run directory; stages with saved output are skipped
    #[arg(long)]
    pub resume: Option<PathBuf>,

    /// Run the browser without a window (manual login is impossible then)
    #[arg(long, env = "HEADLESS")]
    pub headless: bool,

    /// Maximum number of infinite-scroll attempts on the feed
    #[arg(long, env = "SCROLL_ATTEMPTS", default_value_t = 1)]
    pub scroll_attempts: usize,

    /// Seconds to let the feed settle after each scroll
    #[arg(long = "scroll-pause-secs", value_parser = parse_seconds, default_value = "2")]
    pub scroll_pause: Duration,

    /// Seconds to wait for the news section after opening the feed
    #[arg(long = "feed-timeout-secs", value_parser = parse_seconds, default_value = "5")]
    pub feed_timeout: Duration,

    /// Seconds to wait for the read-more control after opening an article
    #[arg(long = "article-timeout-secs", value_parser = parse_seconds, default_value = "3")]
    pub article_timeout: Duration,

    /// Seconds to wait for the article body after expanding it
    #[arg(long = "expand-timeout-secs", value_parser = parse_seconds, default_value = "2")]
    pub expand_timeout: Duration,

    /// Stop after this many articles have been enriched
    #[arg(short = 'n', long, env = "MAX_ARTICLES")]
    pub max_articles: Option<usize>,

    /// Keep every enriched article instead of asking
    #[arg(long)]
    pub no_select: bool,

    /// Stop after selection; no summaries, no Markdown
    #[arg(long)]
    pub no_summarize: bool,

    /// Skip writing summaries.md
    #[arg(long)]
    pub no_markdown: bool,

    /// API key for the summarization service
    #[arg(long, env = "DEEPSEEK_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Optional YAML file overriding the summarizer endpoint, model, or prompts
    #[arg(short, long, env = "SUMMARIZER_CONFIG")]
    pub config: Option<PathBuf>,
}
