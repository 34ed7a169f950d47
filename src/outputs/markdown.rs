//! Markdown rendering of summarized articles.
//!
//! # Layout
//!
//! ```text
//! # Summarized Articles
//!
//! ## <title>
//!
//! - **Date**: ...
//! - **Publisher**: ...
//! - **Author**: ...
//! - **Related Stocks**: AAPL, MSFT
//! - **Original Article**: [url](url)
//!
//! **Summary**:
//!
//! <summary>
//!
//! ---
//! ```
//!
//! Missing fields are written as `Unknown Date`, `Unknown Publisher`,
//! `Unknown Author` or `None`.

use crate::models::SummarizedArticle;

/// Render `summaries.md`: one section per article, in selection order.
pub fn summaries_to_markdown(articles: &[SummarizedArticle]) -> String {
    let mut md = String::from("# Summarized Articles\n\n");

    for summarized in articles {
        let article = &summarized.article;
        let stocks = if article.stocks.is_empty() {
            "None".to_string()
        } else {
            article.stocks.join(", ")
        };

        md.push_str(&format!("## {}\n\n", article.display_title()));
        md.push_str(&format!(
            "- **Date**: {}\n",
            article.when.as_deref().unwrap_or("Unknown Date")
        ));
        md.push_str(&format!(
            "- **Publisher**: {}\n",
            article.publisher.as_deref().unwrap_or("Unknown Publisher")
        ));
        md.push_str(&format!(
            "- **Author**: {}\n",
            article.author.as_deref().unwrap_or("Unknown Author")
        ));
        md.push_str(&format!("- **Related Stocks**: {stocks}\n"));
        if article.url.is_empty() {
            md.push_str("- **Original Article**: None\n\n");
        } else {
            md.push_str(&format!(
                "- **Original Article**: [{0}]({0})\n\n",
                article.url
            ));
        }
        md.push_str("**Summary**:\n\n");
        md.push_str(&summarized.summary);
        md.push_str("\n\n---\n\n");
    }

    md
}
