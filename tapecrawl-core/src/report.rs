// Progress reports built from the persisted state

use crate::model::{Category, ProgressState};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportFormat {
    Text,
    Json,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryStatus {
    /// Never harvested, or the last harvest failed.
    Pending,
    /// Harvested and no product links were found.
    Empty,
    Harvested,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryReport {
    pub name: String,
    pub status: CategoryStatus,
    pub urls: usize,
    pub extracted: usize,
    pub remaining: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusReport {
    pub categories: Vec<CategoryReport>,
    pub total_urls: usize,
    pub total_records: usize,
    pub remaining: usize,
}

impl StatusReport {
    /// Builds the report for the configured categories plus any extra
    /// categories found in the link file.
    pub fn build(categories: &[Category], state: &ProgressState) -> Self {
        let mut names: Vec<String> = categories.iter().map(|c| c.name.clone()).collect();
        for (name, _) in state.links.iter() {
            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }

        let categories: Vec<CategoryReport> = names
            .into_iter()
            .map(|name| {
                let (status, urls, extracted) = match state.links.get(&name) {
                    None => (CategoryStatus::Pending, 0, 0),
                    Some([]) => (CategoryStatus::Empty, 0, 0),
                    Some(urls) => (
                        CategoryStatus::Harvested,
                        urls.len(),
                        urls.iter().filter(|u| state.is_extracted(u)).count(),
                    ),
                };
                CategoryReport {
                    name,
                    status,
                    urls,
                    extracted,
                    remaining: urls - extracted,
                }
            })
            .collect();

        Self {
            total_urls: categories.iter().map(|c| c.urls).sum(),
            remaining: categories.iter().map(|c| c.remaining).sum(),
            total_records: state.products().len(),
            categories,
        }
    }

    pub fn render(&self, format: ReportFormat) -> Result<String, serde_json::Error> {
        match format {
            ReportFormat::Json => serde_json::to_string_pretty(self),
            ReportFormat::Text => Ok(self.render_text()),
        }
    }

    fn render_text(&self) -> String {
        let mut report = String::new();
        report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");
        report.push_str("# Summary:\n");
        report.push_str(&format!("  Categories: {}\n", self.categories.len()));
        report.push_str(&format!("  Product URLs discovered: {}\n", self.total_urls));
        report.push_str(&format!("  Product records: {}\n", self.total_records));
        report.push_str(&format!("  Remaining: {}\n", self.remaining));
        report.push_str("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");

        for category in &self.categories {
            let line = match category.status {
                CategoryStatus::Pending => format!("  [ ] {} (pending)", category.name),
                CategoryStatus::Empty => format!("  [-] {} (no products)", category.name),
                CategoryStatus::Harvested => format!(
                    "  [x] {} {}/{} extracted",
                    category.name, category.extracted, category.urls
                ),
            };
            report.push_str(&line);
            report.push('\n');
        }

        report
    }
}
