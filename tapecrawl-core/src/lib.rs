pub mod config;
pub mod crawl;
pub mod model;
pub mod report;
pub mod store;

pub use config::CrawlConfig;
pub use crawl::{CrawlOrchestrator, LinkPhaseOptions, ProductPhaseOptions};
pub use model::{Category, CategoryLinkSet, ProgressState};
pub use store::{ProgressStore, StoreError};
