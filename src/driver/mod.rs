//! Browser page-driver capability.
//!
//! The extractors only talk to a [`PageDriver`]. [`chrome::ChromeSession`] is
//! the real implementation; tests use [`fake::FakeDriver`].
//!
//! Waiting is a capability of the driver rather than a bare sleep: callers ask
//! for [`Wait::ForElement`] when they know what they are waiting on and fall
//! back to [`Wait::Pause`] when they don't (e.g. lazy-loaded feed items).

use std::error::Error;
use std::time::Duration;
use tracing::{debug, instrument};

pub mod chrome;
#[cfg(test)]
pub mod fake;

/// A condition to wait for after navigating or clicking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Wait {
    /// Let the page settle for a fixed time.
    Pause(Duration),
    /// Return as soon as `selector` matches, or give up after `timeout`.
    ForElement {
        selector: &'static str,
        timeout: Duration,
    },
}

/// One browser tab, driven sequentially.
///
/// Every method takes `&mut self`: a driver is never shared, and one call
/// finishes before the next starts. Errors mean the browser itself failed
/// (navigation, crash, lost connection); "element not there" is reported
/// through return values instead.
pub trait PageDriver {
    /// Load `url` and wait for navigation to finish.
    async fn navigate(&mut self, url: &str) -> Result<(), Box<dyn Error>>;

    /// Scroll the window to the bottom of the document.
    async fn scroll_to_bottom(&mut self) -> Result<(), Box<dyn Error>>;

    /// Current scroll height of the document body in pixels.
    async fn current_height(&mut self) -> Result<u64, Box<dyn Error>>;

    /// Find the first element matching `selector` and click it.
    ///
    /// Returns `false` when no element matches; that is not an error.
    async fn click(&mut self, selector: &str) -> Result<bool, Box<dyn Error>>;

    /// Block until the wait condition holds. Returns `false` if a
    /// [`Wait::ForElement`] timed out.
    async fn wait(&mut self, wait: Wait) -> Result<bool, Box<dyn Error>>;

    /// Serialized markup of the current page.
    async fn page_source(&mut self) -> Result<String, Box<dyn Error>>;
}

/// Scroll until the page stops growing or `attempts` scrolls have been made.
///
/// Termination is heuristic: a feed that loads slower than `pause` looks the
/// same as one that has run out of items.
///
/// # Arguments
///
/// * `driver` - Tab showing the page to scroll
/// * `attempts` - Maximum number of scrolls; `0` disables scrolling
/// * `pause` - Settle time after each scroll before measuring the height
///
/// # Returns
///
/// The number of scrolls made.
#[instrument(level = "info", skip(driver))]
pub async fn scroll_to_end<D: PageDriver>(
    driver: &mut D,
    attempts: usize,
    pause: Duration,
) -> Result<usize, Box<dyn Error>> {
    let mut last_height = driver.current_height().await?;
    let mut scrolls = 0;

    for _ in 0..attempts {
        driver.scroll_to_bottom().await?;
        driver.wait(Wait::Pause(pause)).await?;
        scrolls += 1;

        let new_height = driver.current_height().await?;
        debug!(scrolls, last_height, new_height, "Scrolled feed");
        if new_height == last_height {
            break;
        }
        last_height = new_height;
    }

    Ok(scrolls)
}
