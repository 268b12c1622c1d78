use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;
use tapecrawl_scanner::ProductRecord;

/// A catalog section and its URL slug.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub slug: String,
}

impl Category {
    pub fn new(name: &str, slug: &str) -> Self {
        Self {
            name: name.to_string(),
            slug: slug.to_string(),
        }
    }
}

/// Category name to discovered product URLs, in insertion order.
///
/// A key with an empty list records a category that was harvested and had
/// no products; an absent key means the category was never harvested.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryLinkSet {
    entries: Vec<(String, Vec<String>)>,
}

impl CategoryLinkSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, category: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(name, _)| name == category)
            .map(|(_, urls)| urls.as_slice())
    }

    pub fn contains(&self, category: &str) -> bool {
        self.get(category).is_some()
    }

    /// True when the category has at least one recorded URL.
    pub fn is_harvested(&self, category: &str) -> bool {
        self.get(category).is_some_and(|urls| !urls.is_empty())
    }

    /// Replaces the category's URLs in place, or appends a new entry.
    pub fn insert(&mut self, category: &str, urls: Vec<String>) {
        match self.entries.iter_mut().find(|(name, _)| name == category) {
            Some((_, existing)) => *existing = urls,
            None => self.entries.push((category.to_string(), urls)),
        }
    }

    pub fn remove(&mut self, category: &str) -> Option<Vec<String>> {
        let index = self.entries.iter().position(|(name, _)| name == category)?;
        Some(self.entries.remove(index).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(name, urls)| (name.as_str(), urls.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_urls(&self) -> usize {
        self.entries.iter().map(|(_, urls)| urls.len()).sum()
    }
}

impl Serialize for CategoryLinkSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, urls) in &self.entries {
            map.serialize_entry(name, urls)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for CategoryLinkSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct LinkSetVisitor;

        impl<'de> Visitor<'de> for LinkSetVisitor {
            type Value = CategoryLinkSet;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of category names to URL arrays")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut set = CategoryLinkSet::new();
                while let Some((name, urls)) = access.next_entry::<String, Vec<String>>()? {
                    set.insert(&name, urls);
                }
                Ok(set)
            }
        }

        deserializer.deserialize_map(LinkSetVisitor)
    }
}

/// Everything a run has produced so far.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgressState {
    pub links: CategoryLinkSet,
    products: Vec<ProductRecord>,
    extracted: HashSet<String>,
}

impl ProgressState {
    /// Builds a state, keeping only the first record for each URL.
    pub fn new(links: CategoryLinkSet, products: Vec<ProductRecord>) -> Self {
        let mut state = Self {
            links,
            ..Default::default()
        };
        for record in products {
            state.push_product(record);
        }
        state
    }

    pub fn products(&self) -> &[ProductRecord] {
        &self.products
    }

    pub fn is_extracted(&self, url: &str) -> bool {
        self.extracted.contains(url)
    }

    /// Appends a record unless one with the same URL already exists.
    pub fn push_product(&mut self, record: ProductRecord) -> bool {
        if !self.extracted.insert(record.url.clone()) {
            return false;
        }
        self.products.push(record);
        true
    }
}

/// The categories of the brontapes.com catalog, in crawl order.
pub fn default_categories() -> Vec<Category> {
    [
        ("Double Sided", "double-sided"),
        ("Duct Tape", "duct-tape"),
        ("Filament Tape", "filament-tape"),
        ("Foam Tape", "foam-tape"),
        ("Gaffers Tape", "gaffers-tape"),
        ("High Bond Tape", "high-bond"),
        ("Masking Tape", "masking-tape"),
        ("Poly Tape", "poly-tape"),
        ("Vinyl Tape", "vinyl-tape"),
        ("Carton Seal", "carton-seal"),
        ("3M Safety", "3M-safety"),
        ("GaffGun", "gaffgun"),
    ]
    .into_iter()
    .map(|(name, slug)| Category::new(name, slug))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_set_preserves_insertion_order() {
        let mut links = CategoryLinkSet::new();
        links.insert("Vinyl Tape", vec!["https://x/BT-1/".into()]);
        links.insert("Duct Tape", vec![]);
        links.insert("Vinyl Tape", vec!["https://x/BT-2/".into()]);

        let names: Vec<_> = links.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["Vinyl Tape", "Duct Tape"]);
        assert_eq!(links.get("Vinyl Tape").unwrap(), ["https://x/BT-2/".to_string()]);
    }

    #[test]
    fn test_empty_entry_is_recorded_but_not_harvested() {
        let mut links = CategoryLinkSet::new();
        links.insert("Duct Tape", vec![]);

        assert!(links.contains("Duct Tape"));
        assert!(!links.is_harvested("Duct Tape"));
        assert!(!links.contains("Foam Tape"));
    }

    #[test]
    fn test_link_set_json_keeps_key_order() {
        let json = r#"{"Zeta": ["a"], "Alpha": [], "Mid": ["b", "c"]}"#;
        let links: CategoryLinkSet = serde_json::from_str(json).unwrap();

        let names: Vec<_> = links.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["Zeta", "Alpha", "Mid"]);
        assert_eq!(
            serde_json::to_string(&links).unwrap(),
            r#"{"Zeta":["a"],"Alpha":[],"Mid":["b","c"]}"#
        );
    }

    #[test]
    fn test_progress_state_rejects_duplicate_urls() {
        let first = ProductRecord::new("https://x/BT-1/".into(), "Duct Tape".into());
        let mut second = first.clone();
        second.title = Some("later".into());

        let mut state = ProgressState::new(CategoryLinkSet::new(), vec![first, second.clone()]);
        assert_eq!(state.products().len(), 1);
        assert!(state.products()[0].title.is_none());

        assert!(!state.push_product(second));
        assert!(state.is_extracted("https://x/BT-1/"));
    }

    #[test]
    fn test_default_categories_order() {
        let categories = default_categories();
        assert_eq!(categories.len(), 12);
        assert_eq!(categories[0], Category::new("Double Sided", "double-sided"));
        assert_eq!(categories[11].slug, "gaffgun");
    }
}
