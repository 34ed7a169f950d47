//! Runtime configuration.
//!
//! [`PipelineSettings`] is built from the parsed [`Cli`] and handed to every
//! stage. [`SummarizerConfig`] carries the prompt and endpoint for the
//! summarization service; it has built-in defaults and can be overridden
//! field by field from a YAML file.

use crate::cli::Cli;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::path::Path;
use std::time::Duration;
use tracing::{info, instrument};

/// Portfolio page hosting the personalized news feed.
pub const DEFAULT_FEED_URL: &str = "https://finance.yahoo.com/portfolios";

/// Which optional stages run after enrichment.
///
/// Feed loading and enrichment always run (or resume). Markdown needs
/// summaries, so it is off whenever summarization is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stages {
    /// Ask the operator about each article; otherwise keep them all.
    pub select: bool,
    /// Call the summarization service for each selected article.
    pub summarize: bool,
    /// Write `summaries.md`.
    pub markdown: bool,
}

impl Default for Stages {
    fn default() -> Self {
        Self {
            select: true,
            summarize: true,
            markdown: true,
        }
    }
}

/// Timeouts used while opening one article.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArticleWaits {
    /// How long to wait for the read-more control after navigation.
    pub load_timeout: Duration,
    /// How long to wait for the content container after expanding.
    pub expand_timeout: Duration,
}

/// Everything the pipeline stages need besides their collaborators.
///
/// # Defaults
///
/// | Setting | Value |
/// |---------|-------|
/// | `feed_url` | [`DEFAULT_FEED_URL`] |
/// | `scroll_attempts` | 1 |
/// | `scroll_pause` | 2s |
/// | `feed_load_timeout` | 5s |
/// | `article_waits` | 3s load, 2s expand |
/// | `max_articles` | unbounded |
/// | `stages` | all enabled |
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Page to read the news feed from.
    pub feed_url: String,
    /// Upper bound on infinite-scroll attempts.
    pub scroll_attempts: usize,
    /// Settle time after each scroll.
    pub scroll_pause: Duration,
    /// How long to wait for the news section after navigation. A timeout
    /// here is what sends the run into the login branch.
    pub feed_load_timeout: Duration,
    pub article_waits: ArticleWaits,
    /// Stop enriching once this many articles succeed. `None` is unbounded.
    pub max_articles: Option<usize>,
    pub stages: Stages,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            feed_url: DEFAULT_FEED_URL.to_string(),
            scroll_attempts: 1,
            scroll_pause: Duration::from_secs(2),
            feed_load_timeout: Duration::from_secs(5),
            article_waits: ArticleWaits {
                load_timeout: Duration::from_secs(3),
                expand_timeout: Duration::from_secs(2),
            },
            max_articles: None,
            stages: Stages::default(),
        }
    }
}

impl From<&Cli> for PipelineSettings {
    fn from(args: &Cli) -> Self {
        Self {
            feed_url: args.feed_url.clone(),
            scroll_attempts: args.scroll_attempts,
            scroll_pause: args.scroll_pause,
            feed_load_timeout: args.feed_timeout,
            article_waits: ArticleWaits {
                load_timeout: args.article_timeout,
                expand_timeout: args.expand_timeout,
            },
            max_articles: args.max_articles,
            stages: Stages {
                select: !args.no_select,
                summarize: !args.no_summarize,
                markdown: !args.no_summarize && !args.no_markdown,
            },
        }
    }
}

/// Endpoint and prompt for the summarization service.
///
/// `user_prompt` is a template; `{title}` and `{content}` are replaced with
/// the article's title and body.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SummarizerConfig {
    /// Chat-completions endpoint.
    pub api_url: String,
    pub model: String,
    /// Fixed instruction sent as the system message.
    pub system_prompt: String,
    pub user_prompt: String,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.deepseek.com/chat/completions".to_string(),
            model: "deepseek-chat".to_string(),
            system_prompt: "Sen, sana gönderilen finans haberlerini özetleyen bir asistansın."
                .to_string(),
            user_prompt: "Aşağıdaki haberi bana türkçe olarak özetler misin?\n\n\
                          Başlık:\n{title}\n\n\
                          İçerik:\n{content}\n"
                .to_string(),
        }
    }
}

impl SummarizerConfig {
    /// Load overrides from a YAML file, or the defaults when no path is given.
    ///
    /// Keys missing from the file keep their default values.
    ///
    /// # Arguments
    ///
    /// * `path` - Optional YAML file with any of `api_url`, `model`,
    ///   `system_prompt`, `user_prompt`
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid YAML for
    /// this structure.
    #[instrument(level = "info")]
    pub fn load(path: Option<&Path>) -> Result<Self, Box<dyn Error>> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&raw)?;
        info!(model = %config.model, api_url = %config.api_url, "Loaded summarizer config");
        Ok(config)
    }

    /// Fill the `{title}` and `{content}` placeholders of `user_prompt`.
    ///
    /// A missing title renders as an empty string.
    pub fn render_user_prompt(&self, title: Option<&str>, content: &str) -> String {
        self.user_prompt
            .replace("{title}", title.unwrap_or(""))
            .replace("{content}", content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;

    #[test]
    fn test_settings_from_cli() {
        let args = Cli::parse_from([
            "portfolio_news_digest",
            "--scroll-attempts",
            "4",
            "--max-articles",
            "5",
            "--no-markdown",
        ]);
        let settings = PipelineSettings::from(&args);
        assert_eq!(settings.scroll_attempts, 4);
        assert_eq!(settings.max_articles, Some(5));
        assert_eq!(settings.scroll_pause, Duration::from_secs(2));
        assert_eq!(settings.article_waits, PipelineSettings::default().article_waits);
        assert!(settings.stages.select);
        assert!(settings.stages.summarize);
        assert!(!settings.stages.markdown);
    }

    #[test]
    fn test_settings_take_parsed_durations() {
        let args = Cli::parse_from([
            "portfolio_news_digest",
            "--scroll-pause-secs",
            "0.25",
            "--article-timeout-secs",
            "10",
        ]);
        let settings = PipelineSettings::from(&args);
        assert_eq!(settings.scroll_pause, Duration::from_millis(250));
        assert_eq!(settings.article_waits.load_timeout, Duration::from_secs(10));
        assert_eq!(settings.feed_load_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_no_summarize_disables_markdown() {
        let args = Cli::parse_from(["portfolio_news_digest", "--no-summarize"]);
        let stages = PipelineSettings::from(&args).stages;
        assert!(!stages.summarize);
        assert!(!stages.markdown);
    }

    #[test]
    fn test_render_user_prompt() {
        let config = SummarizerConfig {
            user_prompt: "T={title} C={content}".to_string(),
            ..SummarizerConfig::default()
        };
        assert_eq!(config.render_user_prompt(Some("Hi"), "body"), "T=Hi C=body");
        assert_eq!(config.render_user_prompt(None, "body"), "T= C=body");
    }

    #[test]
    fn test_default_prompt_has_placeholders() {
        let config = SummarizerConfig::default();
        let prompt = config.render_user_prompt(Some("Başlık X"), "İçerik Y");
        assert!(prompt.contains("Başlık X"));
        assert!(prompt.contains("İçerik Y"));
        assert!(!prompt.contains("{content}"));
    }

    #[test]
    fn test_load_partial_yaml_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "model: deepseek-reasoner\nsystem_prompt: Summarize in English.").unwrap();

        let config = SummarizerConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.model, "deepseek-reasoner");
        assert_eq!(config.system_prompt, "Summarize in English.");
        assert_eq!(config.api_url, SummarizerConfig::default().api_url);
    }

    #[test]
    fn test_load_without_path() {
        assert_eq!(
            SummarizerConfig::load(None).unwrap(),
            SummarizerConfig::default()
        );
    }
}
