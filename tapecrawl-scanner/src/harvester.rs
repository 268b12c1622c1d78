use crate::dom::{DomNode, HtmlPage};
use crate::error::{Result, ScanError};
use crate::http::{build_client, fetch_html, DEFAULT_TIMEOUT};
use crate::render::Renderer;
use reqwest::Client;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

pub const DEFAULT_MARKER: &str = "BT-";
pub const DEFAULT_CATEGORY_PATH: &str = "/shop/{slug}/";
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(2);

/// Which extraction path produced a category's links.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarvestPath {
    Static,
    Dynamic,
    /// Neither path found anything.
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Harvest {
    pub urls: Vec<String>,
    pub path: HarvestPath,
}

/// Collects product detail URLs from category index pages.
///
/// The static HTML is tried first; the renderer is only driven when the
/// static markup has no matching anchors.
pub struct LinkHarvester {
    client: Client,
    base_url: Url,
    category_path: String,
    marker: String,
    settle_delay: Duration,
    renderer: Arc<dyn Renderer>,
}

impl LinkHarvester {
    pub fn new(base_url: &str, renderer: Arc<dyn Renderer>) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ScanError::InvalidUrl(format!("{}: {}", base_url, e)))?;

        Ok(Self {
            client: build_client(DEFAULT_TIMEOUT)?,
            base_url,
            category_path: DEFAULT_CATEGORY_PATH.to_string(),
            marker: DEFAULT_MARKER.to_string(),
            settle_delay: DEFAULT_SETTLE_DELAY,
            renderer,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.client = build_client(timeout)?;
        Ok(self)
    }

    pub fn with_marker(mut self, marker: &str) -> Self {
        self.marker = marker.to_string();
        self
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Path template for category index pages; `{slug}` is substituted.
    pub fn with_category_path(mut self, template: &str) -> Self {
        self.category_path = template.to_string();
        self
    }

    /// Appends the category path to the base URL, keeping any path prefix
    /// the base carries.
    pub fn category_url(&self, slug: &str) -> Result<String> {
        let path = self.category_path.replace("{slug}", slug);
        let url = format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Url::parse(&url)
            .map(|u| u.to_string())
            .map_err(|e| ScanError::InvalidUrl(format!("{}: {}", url, e)))
    }

    /// Harvests the product URLs for the category with the given slug.
    ///
    /// An empty result is not an error.
    pub async fn harvest(&self, slug: &str) -> Result<Harvest> {
        let url = self.category_url(slug)?;
        info!("Harvesting {}", url);

        let body = fetch_html(&self.client, &url).await?;
        let urls = self.extract_static(&body);

        if !urls.is_empty() {
            info!("Found {} product URLs in static markup", urls.len());
            return Ok(Harvest {
                urls,
                path: HarvestPath::Static,
            });
        }

        info!("No static product links, falling back to rendered page");
        let urls = self.extract_dynamic(&url).await?;

        if urls.is_empty() {
            warn!("No product links found for {}", url);
            return Ok(Harvest {
                urls,
                path: HarvestPath::Empty,
            });
        }

        info!("Found {} product URLs in rendered page", urls.len());
        Ok(Harvest {
            urls,
            path: HarvestPath::Dynamic,
        })
    }

    /// Root-relative anchors whose href contains the product marker.
    pub fn extract_static(&self, html: &str) -> Vec<String> {
        let page = HtmlPage::parse(html);

        let hrefs = page
            .root()
            .find_all("a[href]")
            .into_iter()
            .filter_map(|a| a.attr("href").map(str::to_string))
            .filter(|href| href.starts_with('/') && !href.starts_with("//"))
            .filter(|href| self.has_marker(href));

        self.resolve_unique(hrefs)
    }

    async fn extract_dynamic(&self, url: &str) -> Result<Vec<String>> {
        let renderer = self.renderer.clone();
        let url = url.to_string();
        let settle_delay = self.settle_delay;
        let selector = format!("a[href*='{}' i]", self.marker);

        let hrefs = tokio::task::spawn_blocking(move || -> Result<Vec<Option<String>>> {
            renderer.navigate(&url)?;
            std::thread::sleep(settle_delay);
            renderer.query_attribute(&selector, "href")
        })
        .await??;

        let hrefs = hrefs
            .into_iter()
            .flatten()
            .filter(|href| self.has_marker(href));

        Ok(self.resolve_unique(hrefs))
    }

    fn has_marker(&self, href: &str) -> bool {
        href.to_ascii_uppercase()
            .contains(&self.marker.to_ascii_uppercase())
    }

    /// Resolve against the base URL, drop query and fragment, keep the
    /// first occurrence of each URL.
    fn resolve_unique(&self, hrefs: impl Iterator<Item = String>) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut links = Vec::new();

        for href in hrefs {
            let Some(url) = self.resolve_url(&href) else {
                debug!("Skipping unresolvable href {}", href);
                continue;
            };
            if seen.insert(url.clone()) {
                links.push(url);
            }
        }

        links
    }

    fn resolve_url(&self, href: &str) -> Option<String> {
        let href = href.trim();
        if href.is_empty() || href.starts_with("javascript:") || href.starts_with('#') {
            return None;
        }

        let mut url = self.base_url.join(href).ok()?;
        url.set_query(None);
        url.set_fragment(None);

        Some(url.to_string())
    }
}
