//! Article page extraction.
//!
//! Articles hosted on the portal hide most of their body behind a "Story
//! continues" button. Pages without that button are syndicated from other
//! sites and are reported as [`ArticleOutcome::External`]. A page with the
//! button but without the expected content container means the template has
//! changed, reported as [`ArticleOutcome::StructureMismatch`].

use crate::config::ArticleWaits;
use crate::dom::{self, Document, TextOptions};
use crate::driver::{PageDriver, Wait};
use crate::models::ArticleRecord;
use once_cell::sync::Lazy;
use scraper::Selector;
use std::error::Error;
use tracing::{info, instrument, warn};

/// The "Story continues" button on portal-hosted articles.
pub const READ_MORE: &str =
    "div.readmore.yf-103i3cu button.secondary-btn.fin-size-large.readmore-button.rounded.yf-15mk0m";
/// Container of the expanded article body.
pub const CONTENT: &str = "div.article.yf-l7apfj";

static CONTENT_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse(CONTENT).expect("content selector"));
static COVER_TITLE_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.cover-title.yf-1at0uqp").expect("cover title selector"));
static BYLINE_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.byline-attr.yf-1k5w6kz").expect("byline selector"));
static AUTHOR_SEL: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("div.byline-attr-author.yf-1k5w6kz").expect("author selector")
});
static TIME_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("time.byline-attr-meta-time").expect("time selector"));
static CAROUSEL_SEL: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"div.scroll-carousel.yf-r5lvmz[data-testid="carousel-container"]"#)
        .expect("carousel selector")
});
static TICKER_SEL: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"a[data-testid="ticker-container"]"#).expect("ticker selector")
});

/// Classification of one article page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArticleOutcome {
    /// Expanded and read.
    Parsed(ArticleRecord),
    /// No read-more control: the article lives outside the portal's template.
    External,
    /// Read-more control present but no content container: the template changed.
    StructureMismatch,
}

/// Open `url`, expand the article if it can be expanded, and read its fields.
///
/// # Arguments
///
/// * `driver` - Browser session; left on the article page afterwards
/// * `url` - Absolute article url
/// * `waits` - How long to wait for the read-more control and the body
///
/// # Returns
///
/// [`ArticleOutcome::External`] and [`ArticleOutcome::StructureMismatch`]
/// are ordinary outcomes, not errors.
///
/// # Errors
///
/// Only driver failures (navigation, click, page source) are errors.
#[instrument(level = "info", skip(driver, waits))]
pub async fn extract_article<D: PageDriver>(
    driver: &mut D,
    url: &str,
    waits: &ArticleWaits,
) -> Result<ArticleOutcome, Box<dyn Error>> {
    driver.navigate(url).await?;
    driver
        .wait(Wait::ForElement {
            selector: READ_MORE,
            timeout: waits.load_timeout,
        })
        .await?;

    if !driver.click(READ_MORE).await? {
        warn!("External article, skipping");
        return Ok(ArticleOutcome::External);
    }

    driver
        .wait(Wait::ForElement {
            selector: CONTENT,
            timeout: waits.expand_timeout,
        })
        .await?;

    let markup = driver.page_source().await?;
    Ok(match parse_article(&markup) {
        Some(record) => {
            info!(title = ?record.title, stocks = record.stocks.len(), "Article parsed");
            ArticleOutcome::Parsed(record)
        }
        None => {
            warn!("Article content container not found; page structure differs");
            ArticleOutcome::StructureMismatch
        }
    })
}

/// Read an expanded article page. `None` when the content container is missing.
///
/// Every other field is optional and degrades to `None` (or an empty ticker
/// list) on its own.
pub fn parse_article(markup: &str) -> Option<ArticleRecord> {
    let document = Document::parse(markup);
    let content = document.find(&CONTENT_SEL)?;

    let title = document
        .find(&COVER_TITLE_SEL)
        .map(|e| dom::text(e, TextOptions::STRIPPED));

    let byline = document.find(&BYLINE_SEL);
    let author = byline
        .and_then(|b| dom::find(b, &AUTHOR_SEL))
        .map(|e| dom::text(e, TextOptions::STRIPPED));
    let when = byline
        .and_then(|b| dom::find(b, &TIME_SEL))
        .map(|e| dom::text(e, TextOptions::STRIPPED));

    let stocks = document
        .find(&CAROUSEL_SEL)
        .map(|carousel| {
            dom::find_all(carousel, &TICKER_SEL)
                .into_iter()
                .filter_map(|link| dom::attr(link, "aria-label"))
                .collect()
        })
        .unwrap_or_default();

    Some(ArticleRecord {
        title,
        author,
        when,
        content: dom::text(content, TextOptions::LINES),
        stocks,
    })
}


#[cfg(test)]
mod tests {
    use super::test_markup::*;
    use super::*;
    use crate::driver::fake::{FakeDriver, FakePage};
    use std::time::Duration;

    const URL: &str = "https://finance.yahoo.com/news/story-1.html";

    fn waits() -> ArticleWaits {
        ArticleWaits {
            load_timeout: Duration::from_secs(3),
            expand_timeout: Duration::from_secs(2),
        }
    }

    #[test]
    fn test_parse_full_article() {
        let record = parse_article(&expanded_page("Markets rally")).unwrap();
        assert_eq!(record.title.as_deref(), Some("Markets rally"));
        assert_eq!(record.author.as_deref(), Some("Jane Roe"));
        assert_eq!(record.when.as_deref(), Some("Mon, Jan 6, 2025, 9:00 AM"));
        assert_eq!(record.stocks, vec!["AAPL", "MSFT"]);
        assert_eq!(
            record.content,
            "First paragraph.\nSecond\nbold\nparagraph."
        );
    }

    #[test]
    fn test_parse_without_content_container() {
        let markup = r#"<div class="cover-title yf-1at0uqp">Title</div><div class="article">x</div>"#;
        assert_eq!(parse_article(markup), None);
    }

    #[test]
    fn test_optional_fields_degrade_independently() {
        let markup = r#"<html><body>
            <div class="byline-attr yf-1k5w6kz">
              <time class="byline-attr-meta-time">Yesterday</time>
            </div>
            <div class="article yf-l7apfj"><p>Only body</p></div>
          </body></html>"#;
        let record = parse_article(markup).unwrap();
        assert_eq!(record.title, None);
        assert_eq!(record.author, None);
        assert_eq!(record.when.as_deref(), Some("Yesterday"));
        assert!(record.stocks.is_empty());
        assert_eq!(record.content, "Only body");
    }

    #[tokio::test]
    async fn test_no_read_more_is_external() {
        let mut driver = FakeDriver::new().with_page(URL, FakePage::plain(expanded_page("x")));
        let outcome = extract_article(&mut driver, URL, &waits()).await.unwrap();
        assert_eq!(outcome, ArticleOutcome::External);
        // No expansion wait after classification.
        assert_eq!(driver.waits.len(), 1);
    }

    #[tokio::test]
    async fn test_expanded_without_container_is_mismatch() {
        let mut driver = FakeDriver::new().with_page(
            URL,
            FakePage::expandable(collapsed_page(), "<html><body><p>new layout</p></body></html>"),
        );
        let outcome = extract_article(&mut driver, URL, &waits()).await.unwrap();
        assert_eq!(outcome, ArticleOutcome::StructureMismatch);
    }

    #[tokio::test]
    async fn test_expand_then_parse() {
        let mut driver = FakeDriver::new().with_page(
            URL,
            FakePage::expandable(collapsed_page(), expanded_page("Fed holds rates")),
        );
        let outcome = extract_article(&mut driver, URL, &waits()).await.unwrap();
        let ArticleOutcome::Parsed(record) = outcome else {
            panic!("expected parsed article, got {outcome:?}");
        };
        assert_eq!(record.title.as_deref(), Some("Fed holds rates"));
        assert_eq!(
            driver.waits,
            vec![
                Wait::ForElement {
                    selector: READ_MORE,
                    timeout: Duration::from_secs(3)
                },
                Wait::ForElement {
                    selector: CONTENT,
                    timeout: Duration::from_secs(2)
                },
            ]
        );
    }
}
