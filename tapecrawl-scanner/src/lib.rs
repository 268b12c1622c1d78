pub mod dom;
pub mod error;
pub mod extractor;
pub mod fields;
pub mod harvester;
pub mod http;
pub mod product;
pub mod render;

pub use error::ScanError;
pub use extractor::ProductExtractor;
pub use harvester::{Harvest, HarvestPath, LinkHarvester};
pub use product::{ProductRecord, Sizes};
pub use render::{ChromeRenderer, Renderer};
