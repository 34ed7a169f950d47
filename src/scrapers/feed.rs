//! Portfolio news feed extraction.
//!
//! The feed is an infinite-scroll list. [`load_feed`] navigates to it, scrolls
//! until it stops growing (or the attempt budget runs out), then hands the
//! page source to [`extract_feed`].

use crate::config::PipelineSettings;
use crate::dom::{self, Document};
use crate::driver::{PageDriver, Wait, scroll_to_end};
use crate::models::NewsStub;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Selector};
use std::error::Error;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// The portfolio news section. Its absence is the login-expired signal.
pub const NEWS_SECTION: &str = r#"section.container.yf-1ce4p3e.hideOnPrint[data-testid="port-news"]"#;
const STORY_ITEM: &str = r#"section.container[data-testid="storyitem"]"#;

static NEWS_SECTION_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse(NEWS_SECTION).expect("news section selector"));
static STORY_ITEM_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse(STORY_ITEM).expect("story item selector"));
static TITLE_ANCHOR_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[aria-label]").expect("title anchor selector"));
static DESCRIPTION_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("p.clamp").expect("description selector"));
static FOOTER_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.footer").expect("footer selector"));
static PUBLISHING_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.publishing").expect("publishing selector"));

/// Load the feed page and extract its stubs.
///
/// Returns `Ok(None)` when the news section is missing, which usually means
/// the session is not logged in.
///
/// # Arguments
///
/// * `driver` - Browser session to load the feed in
/// * `settings` - Feed url, load timeout and scroll budget
///
/// # Returns
///
/// The stubs in display order, `Some(vec![])` for a feed with no items, or
/// `None` when the section never appeared.
///
/// # Errors
///
/// Driver failures and an unparseable feed url are returned as errors; a
/// missing section is not an error.
#[instrument(level = "info", skip_all, fields(url = %settings.feed_url))]
pub async fn load_feed<D: PageDriver>(
    driver: &mut D,
    settings: &PipelineSettings,
) -> Result<Option<Vec<NewsStub>>, Box<dyn Error>> {
    driver.navigate(&settings.feed_url).await?;
    driver
        .wait(Wait::ForElement {
            selector: NEWS_SECTION,
            timeout: settings.feed_load_timeout,
        })
        .await?;

    let scrolls = scroll_to_end(driver, settings.scroll_attempts, settings.scroll_pause).await?;
    debug!(scrolls, "Finished scrolling feed");

    let base = Url::parse(&settings.feed_url)?;
    let markup = driver.page_source().await?;
    Ok(extract_feed(&markup, &base))
}

/// Convert feed markup into stubs in display order.
///
/// `None` means the news section itself is absent; a present but empty
/// section yields `Some(vec![])`.
///
/// # Arguments
///
/// * `markup` - Page source of the feed
/// * `base` - Feed url, used to resolve relative article links
pub fn extract_feed(markup: &str, base: &Url) -> Option<Vec<NewsStub>> {
    let document = Document::parse(markup);
    let Some(section) = document.find(&NEWS_SECTION_SEL) else {
        warn!("Portfolio news section not found");
        return None;
    };

    let stubs: Vec<NewsStub> = dom::find_all(section, &STORY_ITEM_SEL)
        .into_iter()
        .enumerate()
        .map(|(i, item)| parse_story_item(i + 1, item, base))
        .collect();

    info!(count = stubs.len(), "Extracted feed stubs");
    Some(stubs)
}

/// Read one story item. `index` is its 1-based position in the feed.
fn parse_story_item(index: usize, item: ElementRef<'_>, base: &Url) -> NewsStub {
    let anchor = dom::find(item, &TITLE_ANCHOR_SEL);
    let title = anchor.and_then(|a| dom::attr(a, "aria-label"));
    let url = anchor
        .and_then(|a| dom::attr(a, "href"))
        .map(|href| resolve(base, &href));

    let description = dom::find(item, &DESCRIPTION_SEL).and_then(dom::trimmed_text);

    let (publisher, when) = dom::find(item, &FOOTER_SEL)
        .and_then(|footer| dom::find(footer, &PUBLISHING_SEL))
        .map(|publishing| footer_fields(dom::fragments(publishing)))
        .unwrap_or((None, None));

    NewsStub {
        index,
        title,
        description,
        url,
        publisher,
        when,
    }
}

/// Publisher is the first fragment; the timestamp is the last one, but only
/// when there is more than one.
fn footer_fields(fragments: Vec<String>) -> (Option<String>, Option<String>) {
    let non_blank = |s: &String| (!s.is_empty()).then(|| s.clone());
    let publisher = fragments.first().and_then(non_blank);
    let when = if fragments.len() > 1 {
        fragments.last().and_then(non_blank)
    } else {
        None
    };
    (publisher, when)
}

/// Absolute form of `href`, or `href` unchanged if it cannot be joined.
fn resolve(base: &Url, href: &str) -> String {
    base.join(href)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}


#[cfg(test)]
mod tests {
    use super::test_markup::*;
    use super::*;
    use crate::driver::fake::{FakeDriver, FakePage};

    fn base() -> Url {
        Url::parse("https://finance.yahoo.com/portfolios").unwrap()
    }

    #[test]
    fn test_missing_section_is_not_found() {
        let markup = "<html><body><section data-testid=\"other\"></section></body></html>";
        assert_eq!(extract_feed(markup, &base()), None);
    }

    #[test]
    fn test_empty_section_is_empty_list() {
        let stubs = extract_feed(&feed_page(&[]), &base()).unwrap();
        assert!(stubs.is_empty());
    }

    #[test]
    fn test_sparse_item_without_anchor() {
        let markup = feed_page(&[story(1), story(2), story_without_anchor()]);
        let stubs = extract_feed(&markup, &base()).unwrap();

        assert_eq!(stubs.len(), 3);
        assert_eq!(stubs[0].index, 1);
        assert_eq!(stubs[0].title.as_deref(), Some("Story 1"));
        assert_eq!(
            stubs[1].url.as_deref(),
            Some("https://finance.yahoo.com/news/story-2.html")
        );
        assert_eq!(stubs[2].index, 3);
        assert_eq!(stubs[2].title, None);
        assert_eq!(stubs[2].url, None);
        assert_eq!(stubs[2].description.as_deref(), Some("Sponsored"));
    }

    #[test]
    fn test_footer_publisher_and_timestamp() {
        let stubs = extract_feed(&feed_page(&[story(4)]), &base()).unwrap();
        assert_eq!(stubs[0].publisher.as_deref(), Some("Reuters"));
        assert_eq!(stubs[0].when.as_deref(), Some("4h ago"));
        assert_eq!(stubs[0].description.as_deref(), Some("Description 4"));
    }

    #[test]
    fn test_single_fragment_footer_has_no_timestamp() {
        let stubs = extract_feed(&feed_page(&[story_without_anchor()]), &base()).unwrap();
        assert_eq!(stubs[0].publisher.as_deref(), Some("Promoted"));
        assert_eq!(stubs[0].when, None);
    }

    #[test]
    fn test_missing_footer() {
        let item = r#"<section class="container" data-testid="storyitem">
                        <a aria-label="Bare" href="/news/bare.html"></a>
                      </section>"#
            .to_string();
        let stubs = extract_feed(&feed_page(&[item]), &base()).unwrap();
        assert_eq!(stubs[0].publisher, None);
        assert_eq!(stubs[0].when, None);
        assert_eq!(stubs[0].description, None);
        assert_eq!(
            stubs[0].url.as_deref(),
            Some("https://finance.yahoo.com/news/bare.html")
        );
    }

    #[test]
    fn test_footer_fields() {
        let frags = |v: &[&str]| v.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        assert_eq!(footer_fields(vec![]), (None, None));
        assert_eq!(
            footer_fields(frags(&["AP"])),
            (Some("AP".to_string()), None)
        );
        assert_eq!(
            footer_fields(frags(&["AP", "", "1d ago"])),
            (Some("AP".to_string()), Some("1d ago".to_string()))
        );
    }

    #[tokio::test]
    async fn test_load_feed_scrolls_then_extracts() {
        let settings = PipelineSettings::default();
        let mut driver = FakeDriver::new()
            .with_page(&settings.feed_url, FakePage::plain(feed_page(&[story(1), story(2)])))
            .with_heights(&[1000, 1800, 1800]);

        let stubs = load_feed(&mut driver, &settings).await.unwrap().unwrap();
        assert_eq!(stubs.len(), 2);
        assert_eq!(driver.navigations, vec![settings.feed_url.clone()]);
        assert_eq!(
            driver.waits[0],
            Wait::ForElement {
                selector: NEWS_SECTION,
                timeout: settings.feed_load_timeout
            }
        );
        assert_eq!(driver.scrolls, 1);
    }
}
