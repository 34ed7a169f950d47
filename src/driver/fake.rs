//! Scripted in-memory driver for tests. Never sleeps.

use super::{PageDriver, Wait};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::error::Error;
use std::rc::Rc;

/// One version of a page. `expanded` is what the page becomes after the
/// read-more control is clicked; `None` means there is no such control.
#[derive(Debug, Clone)]
pub struct FakePage {
    pub markup: String,
    pub expanded: Option<String>,
}

impl FakePage {
    /// A page without a read-more control.
    pub fn plain(markup: impl Into<String>) -> Self {
        Self {
            markup: markup.into(),
            expanded: None,
        }
    }

    /// A page whose read-more control turns `markup` into `expanded`.
    pub fn expandable(markup: impl Into<String>, expanded: impl Into<String>) -> Self {
        Self {
            markup: markup.into(),
            expanded: Some(expanded.into()),
        }
    }
}

/// Serves scripted pages and records every call.
///
/// Unknown urls load an empty page. Waits always succeed immediately.
#[derive(Debug, Default)]
pub struct FakeDriver {
    /// Each navigation to a url takes the next version; the last one sticks.
    pages: HashMap<String, VecDeque<FakePage>>,
    heights: VecDeque<u64>,
    current: Option<FakePage>,
    clicked: bool,
    pub navigations: Vec<String>,
    pub scrolls: usize,
    pub waits: Vec<Wait>,
    pub fail_urls: Vec<String>,
    released: Option<Rc<Cell<bool>>>,
    log: Option<Rc<RefCell<Vec<String>>>>,
}

impl FakeDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, page: FakePage) -> Self {
        self.pages.entry(url.to_string()).or_default().push_back(page);
        self
    }

    pub fn with_heights(mut self, heights: &[u64]) -> Self {
        self.heights = heights.iter().copied().collect();
        self
    }

    /// Make navigation to `url` fail, as a crashed browser would.
    pub fn failing_on(mut self, url: &str) -> Self {
        self.fail_urls.push(url.to_string());
        self
    }

    /// Flag that flips to `true` when the driver is dropped.
    pub fn release_flag(&mut self) -> Rc<Cell<bool>> {
        let flag = Rc::new(Cell::new(false));
        self.released = Some(Rc::clone(&flag));
        flag
    }

    /// Shared copy of `navigations` that stays readable after the driver
    /// has been moved into the pipeline.
    pub fn navigation_log(&mut self) -> Rc<RefCell<Vec<String>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        self.log = Some(Rc::clone(&log));
        log
    }
}

impl Drop for FakeDriver {
    fn drop(&mut self) {
        if let Some(flag) = &self.released {
            flag.set(true);
        }
    }
}

impl PageDriver for FakeDriver {
    async fn navigate(&mut self, url: &str) -> Result<(), Box<dyn Error>> {
        self.navigations.push(url.to_string());
        if let Some(log) = &self.log {
            log.borrow_mut().push(url.to_string());
        }
        if self.fail_urls.iter().any(|u| u == url) {
            return Err(format!("navigation to {url} failed").into());
        }
        let versions = self.pages.entry(url.to_string()).or_default();
        let page = if versions.len() > 1 {
            versions.pop_front()
        } else {
            versions.front().cloned()
        };
        self.current = Some(page.unwrap_or_else(|| FakePage::plain("<html><body></body></html>")));
        self.clicked = false;
        Ok(())
    }

    async fn scroll_to_bottom(&mut self) -> Result<(), Box<dyn Error>> {
        self.scrolls += 1;
        Ok(())
    }

    async fn current_height(&mut self) -> Result<u64, Box<dyn Error>> {
        let height = if self.heights.len() > 1 {
            self.heights.pop_front()
        } else {
            self.heights.front().copied()
        };
        Ok(height.unwrap_or(0))
    }

    async fn click(&mut self, _selector: &str) -> Result<bool, Box<dyn Error>> {
        let expandable = self
            .current
            .as_ref()
            .is_some_and(|page| page.expanded.is_some());
        self.clicked = expandable;
        Ok(expandable)
    }

    async fn wait(&mut self, wait: Wait) -> Result<bool, Box<dyn Error>> {
        self.waits.push(wait);
        Ok(true)
    }

    async fn page_source(&mut self) -> Result<String, Box<dyn Error>> {
        let page = self.current.as_ref().ok_or("no page loaded")?;
        let markup = match (&page.expanded, self.clicked) {
            (Some(expanded), true) => expanded.clone(),
            _ => page.markup.clone(),
        };
        Ok(markup)
    }
}
