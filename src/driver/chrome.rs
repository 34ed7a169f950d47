//! Chrome page driver backed by [`headless_chrome`].
//!
//! The session keeps a persistent user-data directory so a manual login to the
//! portal survives between runs. `headless_chrome` is synchronous; each call is
//! shipped to the blocking pool and awaited right away, so calls never overlap.
//!
//! # Idle timeout
//!
//! `headless_chrome` closes its connection when the browser emits no events
//! for `idle_browser_timeout`. While the operator logs in by hand the tab can
//! be quiet for a long time, so the limit is [`BROWSER_IDLE_TIMEOUT`] (a
//! week) rather than the library's 30 seconds. A login wait longer than that
//! still ends in a transport error on the retry.

use super::{PageDriver, Wait};
use crate::error::PipelineError;
use headless_chrome::{Browser, LaunchOptions, Tab};
use std::error::Error;
use std::ffi::OsStr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::spawn_blocking;
use tracing::{debug, info, instrument, warn};

/// How long the browser may stay silent before the connection is dropped.
pub const BROWSER_IDLE_TIMEOUT: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// How to launch the browser.
#[derive(Debug, Clone)]
pub struct ChromeOptions {
    /// User-data directory; holds cookies and the portal login.
    pub profile_dir: PathBuf,
    /// Run without a window. The login prompt is useless in this mode.
    pub headless: bool,
}

impl ChromeOptions {
    /// Translate into `headless_chrome` launch options.
    fn launch_options(&self) -> Result<LaunchOptions<'static>, Box<dyn Error>> {
        let launch_options = LaunchOptions::default_builder()
            .headless(self.headless)
            .sandbox(false)
            .user_data_dir(Some(self.profile_dir.clone()))
            .idle_browser_timeout(BROWSER_IDLE_TIMEOUT)
            .args(vec![
                OsStr::new("--disable-gpu"),
                OsStr::new("--disable-dev-shm-usage"),
            ])
            .build()
            .map_err(|e| PipelineError::Browser(e.to_string()))?;
        Ok(launch_options)
    }
}

/// An open browser with one working tab. Dropping it shuts the browser down.
pub struct ChromeSession {
    tab: Arc<Tab>,
    _browser: Browser,
}

impl ChromeSession {
    /// Start Chrome with the given profile and open one tab.
    ///
    /// # Arguments
    ///
    /// * `options` - Profile directory and window mode
    ///
    /// # Returns
    ///
    /// A session ready for navigation. The profile directory is created if
    /// it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The profile directory cannot be created
    /// - The launch options are rejected ([`PipelineError::Browser`])
    /// - Chrome cannot be found or started, or the first tab cannot be opened
    #[instrument(level = "info", skip_all, fields(profile = %options.profile_dir.display(), headless = options.headless))]
    pub fn launch(options: &ChromeOptions) -> Result<Self, Box<dyn Error>> {
        std::fs::create_dir_all(&options.profile_dir)?;

        let launch_options = options.launch_options()?;
        let browser = Browser::new(launch_options)?;
        let tab = browser.new_tab()?;
        info!("Browser session started");

        Ok(Self {
            tab,
            _browser: browser,
        })
    }

    /// Run a blocking call against the tab on the blocking pool.
    async fn with_tab<T, F>(&self, f: F) -> Result<T, Box<dyn Error>>
    where
        T: Send + 'static,
        F: FnOnce(&Tab) -> anyhow::Result<T> + Send + 'static,
    {
        let tab = Arc::clone(&self.tab);
        let result = spawn_blocking(move || f(tab.as_ref())).await?;
        Ok(result?)
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        info!("Releasing browser session");
    }
}

impl PageDriver for ChromeSession {
    #[instrument(level = "debug", skip(self))]
    async fn navigate(&mut self, url: &str) -> Result<(), Box<dyn Error>> {
        let url = url.to_string();
        self.with_tab(move |tab| {
            tab.navigate_to(&url)?.wait_until_navigated()?;
            Ok(())
        })
        .await
    }

    async fn scroll_to_bottom(&mut self) -> Result<(), Box<dyn Error>> {
        self.with_tab(|tab| {
            tab.evaluate("window.scrollTo(0, document.body.scrollHeight);", false)?;
            Ok(())
        })
        .await
    }

    async fn current_height(&mut self) -> Result<u64, Box<dyn Error>> {
        let value = self
            .with_tab(|tab| Ok(tab.evaluate("document.body.scrollHeight", false)?.value))
            .await?;
        let height = value
            .as_ref()
            .and_then(|v| v.as_u64().or_else(|| v.as_f64().map(|f| f as u64)))
            .unwrap_or(0);
        Ok(height)
    }

    #[instrument(level = "debug", skip(self))]
    async fn click(&mut self, selector: &str) -> Result<bool, Box<dyn Error>> {
        let selector = selector.to_string();
        self.with_tab(move |tab| match tab.find_element(&selector) {
            Ok(element) => {
                element.click()?;
                Ok(true)
            }
            Err(e) => {
                debug!(%selector, error = %e, "Element not found");
                Ok(false)
            }
        })
        .await
    }

    async fn wait(&mut self, wait: Wait) -> Result<bool, Box<dyn Error>> {
        match wait {
            Wait::Pause(duration) => {
                tokio::time::sleep(duration).await;
                Ok(true)
            }
            Wait::ForElement { selector, timeout } => {
                let found = self
                    .with_tab(move |tab| {
                        Ok(tab
                            .wait_for_element_with_custom_timeout(selector, timeout)
                            .is_ok())
                    })
                    .await?;
                if !found {
                    warn!(selector, ?timeout, "Timed out waiting for element");
                }
                Ok(found)
            }
        }
    }

    async fn page_source(&mut self) -> Result<String, Box<dyn Error>> {
        self.with_tab(|tab| tab.get_content()).await
    }
}
