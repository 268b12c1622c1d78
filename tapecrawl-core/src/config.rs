use crate::model::{default_categories, Category};
use std::path::PathBuf;
use std::time::Duration;
use tapecrawl_scanner::harvester::{DEFAULT_CATEGORY_PATH, DEFAULT_MARKER, DEFAULT_SETTLE_DELAY};
use tapecrawl_scanner::http::DEFAULT_TIMEOUT;

pub const DEFAULT_BASE_URL: &str = "https://www.brontapes.com";
pub const DEFAULT_LINKS_FILE: &str = "brontapes_urls.json";
pub const DEFAULT_PRODUCTS_FILE: &str = "brontapes_products.json";
pub const DEFAULT_DELAY: Duration = Duration::from_secs(1);

/// Settings shared by both crawl phases.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    pub base_url: String,
    /// Category index path; `{slug}` is substituted.
    pub category_path: String,
    /// Substring that identifies product detail links.
    pub marker: String,
    pub categories: Vec<Category>,
    /// Pause between consecutive requests to the origin.
    pub delay: Duration,
    pub timeout: Duration,
    /// Time given to client-side rendering before the DOM is queried.
    pub settle_delay: Duration,
    pub links_file: PathBuf,
    pub products_file: PathBuf,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            category_path: DEFAULT_CATEGORY_PATH.to_string(),
            marker: DEFAULT_MARKER.to_string(),
            categories: default_categories(),
            delay: DEFAULT_DELAY,
            timeout: DEFAULT_TIMEOUT,
            settle_delay: DEFAULT_SETTLE_DELAY,
            links_file: PathBuf::from(DEFAULT_LINKS_FILE),
            products_file: PathBuf::from(DEFAULT_PRODUCTS_FILE),
        }
    }
}

impl CrawlConfig {
    pub fn category(&self, name: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.name == name)
    }
}
