use serde::{Deserialize, Serialize};

/// Size options offered on a product page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sizes {
    pub widths: Vec<String>,
    pub lengths: Vec<String>,
}

/// Structured output for one product detail page.
///
/// Missing scalar fields serialize as `null`; the key is always present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub category: String,
    pub url: String,
    pub sku: Option<String>,
    pub title: Option<String>,
    pub price_raw: Option<String>,
    #[serde(default)]
    pub sizes: Sizes,
    pub color: Option<String>,
    pub adhesive: Option<String>,
    pub carrier: Option<String>,
    pub total_thickness: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub applications: Vec<String>,
    #[serde(default)]
    pub images: Vec<String>,
}

impl ProductRecord {
    pub fn new(url: String, category: String) -> Self {
        Self {
            category,
            url,
            ..Default::default()
        }
    }
}

/// Values read from a product's property table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    pub color: Option<String>,
    pub adhesive: Option<String>,
    pub carrier: Option<String>,
    pub total_thickness: Option<String>,
}
