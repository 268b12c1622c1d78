//! Scripted-rendering boundary used when a category page only exposes its
//! product links after client-side rendering.

use crate::error::{Result, ScanError};
use headless_chrome::browser::tab::NoElementFound;
use headless_chrome::{Browser, LaunchOptions, Tab};
use std::ffi::OsStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// A browser-like session that can load a page and query the rendered DOM.
///
/// Calls block the current thread.
pub trait Renderer: Send + Sync {
    fn navigate(&self, url: &str) -> Result<()>;

    /// Reads `attribute` from every element matching `selector`. An element
    /// whose attribute is missing or unreadable yields `None`.
    fn query_attribute(&self, selector: &str, attribute: &str) -> Result<Vec<Option<String>>>;
}

/// Headless Chrome session with a single reusable tab.
pub struct ChromeRenderer {
    _browser: Browser,
    tab: Arc<Tab>,
}

impl ChromeRenderer {
    pub fn launch() -> Result<Self> {
        info!("Launching headless browser");

        let options = LaunchOptions {
            headless: true,
            sandbox: false,
            idle_browser_timeout: Duration::from_secs(600),
            args: vec![OsStr::new("--disable-dev-shm-usage")],
            ..Default::default()
        };

        let browser = Browser::new(options)
            .map_err(|e| ScanError::Render(format!("failed to launch browser: {}", e)))?;
        let tab = browser
            .new_tab()
            .map_err(|e| ScanError::Render(format!("failed to open tab: {}", e)))?;

        Ok(Self {
            _browser: browser,
            tab,
        })
    }
}

impl Renderer for ChromeRenderer {
    fn navigate(&self, url: &str) -> Result<()> {
        debug!("Rendering {}", url);
        self.tab
            .navigate_to(url)
            .and_then(|tab| tab.wait_until_navigated())
            .map_err(|e| ScanError::Render(format!("navigation to {} failed: {}", url, e)))?;
        Ok(())
    }

    fn query_attribute(&self, selector: &str, attribute: &str) -> Result<Vec<Option<String>>> {
        let elements = match self.tab.find_elements(selector) {
            Ok(elements) => elements,
            Err(e) if is_no_match(&e) => {
                debug!("No rendered elements for {}", selector);
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(ScanError::Render(format!(
                    "query for {} failed: {}",
                    selector, e
                )));
            }
        };

        Ok(elements
            .iter()
            .map(|element| element.get_attribute_value(attribute).ok().flatten())
            .collect())
    }
}

/// `find_elements` reports an empty match as a `NoElementFound` error.
fn is_no_match(err: &anyhow::Error) -> bool {
    err.downcast_ref::<NoElementFound>().is_some()
}
