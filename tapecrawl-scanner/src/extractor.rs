use crate::dom::{DomNode, HtmlPage};
use crate::error::{Result, ScanError};
use crate::fields;
use crate::http::{build_client, fetch_html, DEFAULT_TIMEOUT};
use crate::product::ProductRecord;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Fetches product detail pages and turns them into [`ProductRecord`]s.
pub struct ProductExtractor {
    client: Client,
    base_url: Url,
}

impl ProductExtractor {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ScanError::InvalidUrl(format!("{}: {}", base_url, e)))?;

        Ok(Self {
            client: build_client(timeout)?,
            base_url,
        })
    }

    /// Fails only when the page cannot be fetched or is not HTML. Fields
    /// that cannot be found are left empty.
    pub async fn extract(&self, url: &str, category: &str) -> Result<ProductRecord> {
        let body = fetch_html(&self.client, url).await?;
        let page = HtmlPage::parse(&body);

        let record = extract_record(&page.root(), &self.base_url, url, category);
        debug!(
            "Extracted {}: title={:?} sku={:?} images={}",
            url,
            record.title,
            record.sku,
            record.images.len()
        );

        Ok(record)
    }
}

/// Runs every field extractor over an already parsed page.
pub fn extract_record<N: DomNode>(root: &N, base: &Url, url: &str, category: &str) -> ProductRecord {
    let props = fields::properties(root);
    let (description, applications) = fields::description_and_applications(root);

    ProductRecord {
        category: category.to_string(),
        url: url.to_string(),
        sku: fields::sku(root),
        title: fields::title(root),
        price_raw: fields::price(root),
        sizes: fields::sizes(root),
        color: props.color,
        adhesive: props.adhesive,
        carrier: props.carrier,
        total_thickness: props.total_thickness,
        description,
        applications,
        images: fields::images(root, base, url),
    }
}
