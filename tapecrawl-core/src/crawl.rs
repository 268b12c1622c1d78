use crate::model::{Category, CategoryLinkSet, ProgressState};
use crate::store::{ProgressStore, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::Duration;
use tapecrawl_scanner::{HarvestPath, LinkHarvester, ProductExtractor};
use tracing::{info, warn};

/// Callback for reporting crawl progress
pub type CrawlProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

/// Options for the link discovery phase
pub struct LinkPhaseOptions {
    pub categories: Vec<Category>,
    /// Categories whose stored links are cleared before the phase runs.
    pub refresh: Vec<String>,
    pub delay: Duration,
}

/// Options for the product extraction phase
pub struct ProductPhaseOptions {
    /// Restrict extraction to a single category.
    pub category: Option<String>,
    pub delay: Duration,
    pub show_progress_bars: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkPhaseSummary {
    pub harvested: Vec<String>,
    pub empty: Vec<String>,
    pub skipped: Vec<String>,
    pub failed: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductPhaseSummary {
    pub extracted: usize,
    pub skipped: usize,
    pub failed: Vec<String>,
    pub total_records: usize,
}

/// Categories that still need harvesting: absent, or recorded with no links.
pub fn pending_categories<'a>(categories: &'a [Category], links: &CategoryLinkSet) -> Vec<&'a Category> {
    categories
        .iter()
        .filter(|c| !links.is_harvested(&c.name))
        .collect()
}

/// Drives both crawl phases and persists after every unit of work.
pub struct CrawlOrchestrator {
    store: ProgressStore,
    progress_callback: Option<CrawlProgressCallback>,
}

impl CrawlOrchestrator {
    pub fn new(store: ProgressStore) -> Self {
        Self {
            store,
            progress_callback: None,
        }
    }

    pub fn with_progress_callback(mut self, callback: CrawlProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn store(&self) -> &ProgressStore {
        &self.store
    }

    fn report(&self, msg: String) {
        if let Some(ref callback) = self.progress_callback {
            callback(msg);
        }
    }

    /// Phase 1: harvest product URLs for every category not yet recorded.
    ///
    /// Refreshed categories are emptied in place first. A failed category is
    /// left out of the link set so the next run retries it. Only storage
    /// failures abort the phase.
    pub async fn discover_links(
        &self,
        mut links: CategoryLinkSet,
        harvester: &LinkHarvester,
        options: &LinkPhaseOptions,
    ) -> Result<(CategoryLinkSet, LinkPhaseSummary)> {
        let mut summary = LinkPhaseSummary::default();

        for category in &options.categories {
            if links.is_harvested(&category.name) && !options.refresh.contains(&category.name) {
                info!("[SKIP] {} already harvested", category.name);
                summary.skipped.push(category.name.clone());
            }
        }

        let mut cleared = false;
        for name in &options.refresh {
            if links.is_harvested(name) {
                // Cleared in place so the category keeps its position.
                links.insert(name, Vec::new());
                info!("Cleared stored links for {}", name);
                cleared = true;
            }
        }
        if cleared {
            self.store.save_links(&links)?;
        }

        for category in pending_categories(&options.categories, &links) {
            self.report(format!("Harvesting category: {}", category.name));

            match harvester.harvest(&category.slug).await {
                Ok(harvest) => {
                    if harvest.path == HarvestPath::Empty {
                        summary.empty.push(category.name.clone());
                    } else {
                        summary.harvested.push(category.name.clone());
                    }
                    self.report(format!(
                        "  {} URLs for {} ({:?})",
                        harvest.urls.len(),
                        category.name,
                        harvest.path
                    ));
                    links.insert(&category.name, harvest.urls);
                    self.store.save_links(&links)?;
                }
                Err(e) => {
                    warn!("Failed to harvest {}: {}", category.name, e);
                    self.report(format!("[!] Failed to harvest {}: {}", category.name, e));
                    summary.failed.push(category.name.clone());
                    // Failed categories stay absent from the link set.
                    if links.remove(&category.name).is_some() {
                        self.store.save_links(&links)?;
                    }
                }
            }

            tokio::time::sleep(options.delay).await;
        }

        info!(
            "Link discovery done: {} categories recorded",
            links.len()
        );
        Ok((links, summary))
    }

    /// Phase 2: extract a record for every discovered URL without one.
    ///
    /// Failures are logged and left for the next run.
    pub async fn extract_products(
        &self,
        mut state: ProgressState,
        extractor: &ProductExtractor,
        options: &ProductPhaseOptions,
    ) -> Result<(ProgressState, ProductPhaseSummary)> {
        let mut summary = ProductPhaseSummary::default();

        let work: Vec<(String, String)> = state
            .links
            .iter()
            .filter(|(name, _)| options.category.as_deref().is_none_or(|only| only == *name))
            .flat_map(|(name, urls)| urls.iter().map(move |url| (name.to_string(), url.clone())))
            .collect();

        let pending = work
            .iter()
            .filter(|(_, url)| !state.is_extracted(url))
            .count();

        let progress_bar = if options.show_progress_bars {
            let pb = ProgressBar::new(pending as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.cyan} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );
            Some(pb)
        } else {
            None
        };

        let mut current_category: Option<&str> = None;
        for (category, url) in &work {
            if current_category != Some(category.as_str()) {
                self.report(format!("Category: {}", category));
                current_category = Some(category.as_str());
            }

            if state.is_extracted(url) {
                summary.skipped += 1;
                continue;
            }

            if let Some(ref pb) = progress_bar {
                pb.set_message(url.clone());
            }

            match extractor.extract(url, category).await {
                Ok(record) => {
                    info!(
                        "[OK] {}",
                        record.title.as_deref().unwrap_or(url.as_str())
                    );
                    state.push_product(record);
                    summary.extracted += 1;
                    self.store.save(&state)?;
                }
                Err(e) => {
                    let kind = if e.is_fetch() {
                        "fetch"
                    } else if e.is_parse() {
                        "parse"
                    } else {
                        "extract"
                    };
                    warn!("[ERROR] {} {}: {}", kind, url, e);
                    self.report(format!("[!] Failed to extract {}: {}", url, e));
                    summary.failed.push(url.clone());
                }
            }

            if let Some(ref pb) = progress_bar {
                pb.inc(1);
            }

            tokio::time::sleep(options.delay).await;
        }

        if let Some(ref pb) = progress_bar {
            pb.finish_with_message(format!("{} products extracted", summary.extracted));
        }

        summary.total_records = state.products().len();
        info!("Product extraction done: {} records", summary.total_records);
        Ok((state, summary))
    }
}
