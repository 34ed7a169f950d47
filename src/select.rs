//! Interactive article selection.
//!
//! Each article is presented in order and the operator answers `y` (keep),
//! `n` (skip) or `q` (stop). Stopping drops the current article and every
//! article after it; those are never presented.

use crate::console::Console;
use crate::models::{EnrichedArticle, SelectedArticle};
use std::error::Error;
use tracing::{info, instrument, warn};

const PROMPT: &str = "Press 'y' to summarize, 'n' to skip, or 'q' to skip all remaining articles: ";
const PREVIEW_CHARS: usize = 300;

/// The operator's answer for one article.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// `y`: add the article to the selection.
    Keep,
    /// `n`: leave it out and move on.
    Skip,
    /// `q`: leave it and every later article out.
    StopAll,
}

impl Decision {
    /// Parse an operator response; `None` for anything unrecognized.
    ///
    /// Surrounding whitespace and case are ignored, so `" Y\n"` is
    /// [`Decision::Keep`].
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "y" => Some(Self::Keep),
            "n" => Some(Self::Skip),
            "q" => Some(Self::StopAll),
            _ => None,
        }
    }
}

/// Ask about each article and return the kept ones in their original order.
///
/// End of input counts as [`Decision::StopAll`].
///
/// # Arguments
///
/// * `console` - Where cards are shown and answers are read
/// * `articles` - Enriched articles, presented in this order
///
/// # Returns
///
/// The kept articles, unchanged and in presentation order. Invalid answers
/// repeat the prompt for the same article.
///
/// # Errors
///
/// Only console I/O failures.
#[instrument(level = "info", skip_all, fields(total = articles.len()))]
pub async fn select_articles<C: Console>(
    console: &mut C,
    articles: &[EnrichedArticle],
) -> Result<Vec<SelectedArticle>, Box<dyn Error>> {
    let mut selected = Vec::new();

    'articles: for article in articles {
        console.show(&article_card(article));

        loop {
            let decision = match console.read_line(PROMPT).await? {
                Some(line) => Decision::parse(&line),
                None => {
                    warn!("Input closed; treating as stop");
                    Some(Decision::StopAll)
                }
            };

            match decision {
                Some(Decision::Keep) => {
                    console.show(&format!("Added article: {}", article.display_title()));
                    selected.push(article.clone());
                    break;
                }
                Some(Decision::Skip) => {
                    console.show(&format!("Skipped article: {}", article.display_title()));
                    break;
                }
                Some(Decision::StopAll) => {
                    console.show("Skipping all remaining articles.");
                    break 'articles;
                }
                None => console.show("Invalid input. Please press 'y', 'n', or 'q'."),
            }
        }
    }

    info!(selected = selected.len(), "Selection finished");
    Ok(selected)
}

/// Summary block shown before each prompt.
fn article_card(article: &EnrichedArticle) -> String {
    let or_none = |v: &Option<String>| v.clone().unwrap_or_else(|| "None".to_string());
    let stocks = if article.stocks.is_empty() {
        "None".to_string()
    } else {
        article.stocks.join(", ")
    };
    let preview: String = article.content.chars().take(PREVIEW_CHARS).collect();

    format!(
        "\n--- Article #{} ---\n\
         Title: {}\n\
         Author: {}\n\
         Publisher: {}\n\
         When: {}\n\
         Stocks: {}\n\
         Content (first {} chars): {}...",
        article.index,
        or_none(&article.title),
        or_none(&article.author),
        or_none(&article.publisher),
        or_none(&article.when),
        stocks,
        PREVIEW_CHARS,
        preview,
    )
}
