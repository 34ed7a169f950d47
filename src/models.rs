//! Data models for each stage of the pipeline.
//!
//! Every stage produces a new list; nothing is mutated once created:
//! - [`NewsStub`]: one feed item as it appears on the portfolio page
//! - [`ArticleRecord`]: fields read from an expanded article page
//! - [`EnrichedArticle`]: a stub merged with its article record, densely re-indexed
//! - [`SelectedArticle`]: an enriched article the operator chose to keep
//! - [`SummarizedArticle`]: a selected article with its generated summary
//!
//! The serialized field names (`count`, `when`, `stocks`, ...) are the stable
//! layout of the run directory's JSON files.

use serde::{Deserialize, Serialize};

/// A news item as listed in the portfolio feed, before its article page is visited.
///
/// Any field except `index` may be missing from the markup; a missing anchor
/// leaves both `title` and `url` empty.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct NewsStub {
    /// 1-based position in feed display order.
    #[serde(rename = "count")]
    pub index: usize,
    /// Headline, taken from the anchor's `aria-label`.
    pub title: Option<String>,
    /// Teaser paragraph under the headline.
    pub description: Option<String>,
    /// Absolute article url; relative links are resolved against the feed page.
    pub url: Option<String>,
    /// First fragment of the feed footer, e.g. `"Reuters"`.
    pub publisher: Option<String>,
    /// Relative time shown in the feed footer, e.g. `"2h ago"`.
    pub when: Option<String>,
}

/// Structured fields extracted from one expanded article page.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ArticleRecord {
    /// Headline from the article's cover.
    pub title: Option<String>,
    /// Byline author; missing for wire stories without one.
    pub author: Option<String>,
    /// Publication time as printed in the byline, e.g. `"Mon, Jan 6, 2025, 9:00 AM"`.
    pub when: Option<String>,
    /// Body text as one newline-joined block.
    pub content: String,
    /// Stock ticker labels from the article's ticker carousel.
    pub stocks: Vec<String>,
}

/// A feed stub merged with the article record fetched from its url.
///
/// `index` is assigned after filtering, so it is always dense and 1-based
/// regardless of how many stubs were dropped before this stage.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct EnrichedArticle {
    /// 1-based position among enriched articles.
    #[serde(rename = "count")]
    pub index: usize,
    /// The stub's url; always present, stubs without one never get here.
    pub url: String,
    /// From the feed stub.
    pub publisher: Option<String>,
    /// From the article page, not the feed.
    pub title: Option<String>,
    pub content: String,
    pub stocks: Vec<String>,
    /// Absolute publication time from the article byline.
    pub when: Option<String>,
    pub author: Option<String>,
}

impl EnrichedArticle {
    /// Merge a stub's feed metadata with the record read from its article page.
    ///
    /// Only `publisher` comes from the stub. Title and time are taken from
    /// the article page, which is more precise than the feed's teaser.
    ///
    /// # Arguments
    ///
    /// * `index` - Dense position to assign
    /// * `stub` - The feed item the article was opened from
    /// * `url` - The stub's url
    /// * `record` - Fields parsed from the expanded article
    pub fn merge(index: usize, stub: &NewsStub, url: &str, record: ArticleRecord) -> Self {
        Self {
            index,
            url: url.to_string(),
            publisher: stub.publisher.clone(),
            title: record.title,
            content: record.content,
            stocks: record.stocks,
            when: record.when,
            author: record.author,
        }
    }

    /// Title for display, falling back to a placeholder.
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("Untitled")
    }
}

/// An enriched article the operator kept during selection.
pub type SelectedArticle = EnrichedArticle;

/// A selected article plus the summary returned by the summarization service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SummarizedArticle {
    /// Serialized inline, so the JSON object has the article's keys plus `summary`.
    #[serde(flatten)]
    pub article: SelectedArticle,
    pub summary: String,
}
