//! DOM query interface used by the link harvester and field extractors.
//!
//! Extraction code is written against [`DomNode`] only; [`ScraperNode`] is
//! the implementation backed by the `scraper` crate.

use scraper::{ElementRef, Html, Selector};

/// Elements whose text never counts as page content.
const SKIPPED_TEXT_PARENTS: &[&str] = &["script", "style", "noscript", "template"];

pub trait DomNode: Clone + PartialEq {
    /// Lowercase tag name.
    fn tag(&self) -> &str;

    /// Attribute value, if present.
    fn attr(&self, name: &str) -> Option<&str>;

    /// Raw text nodes under this element, in document order.
    fn text_nodes(&self) -> Vec<String>;

    /// Descendant elements matching `selector`, in document order.
    fn find_all(&self, selector: &str) -> Vec<Self>;

    /// Element siblings that follow this one.
    fn next_siblings(&self) -> Vec<Self>;

    /// First element matching `selector` anywhere after this element's
    /// start tag in document order, including its own descendants.
    fn find_next(&self, selector: &str) -> Option<Self>;

    /// Trimmed, non-empty text nodes joined with a single space.
    fn text(&self) -> String {
        joined_text(self, " ")
    }

    fn find_first(&self, selector: &str) -> Option<Self> {
        self.find_all(selector).into_iter().next()
    }
}

/// Trimmed, non-empty text nodes of `node` joined with `separator`.
pub fn joined_text<N: DomNode>(node: &N, separator: &str) -> String {
    node.text_nodes()
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(separator)
}

/// A parsed HTML document.
pub struct HtmlPage {
    document: Html,
}

impl HtmlPage {
    pub fn parse(body: &str) -> Self {
        Self {
            document: Html::parse_document(body),
        }
    }

    pub fn root(&self) -> ScraperNode<'_> {
        ScraperNode {
            element: self.document.root_element(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScraperNode<'a> {
    element: ElementRef<'a>,
}

impl<'a> DomNode for ScraperNode<'a> {
    fn tag(&self) -> &str {
        self.element.value().name()
    }

    fn attr(&self, name: &str) -> Option<&str> {
        self.element.value().attr(name)
    }

    fn text_nodes(&self) -> Vec<String> {
        self.element
            .descendants()
            .filter_map(|node| {
                let text = node.value().as_text()?;
                let parent = node.parent().and_then(ElementRef::wrap)?;
                if SKIPPED_TEXT_PARENTS.contains(&parent.value().name()) {
                    return None;
                }
                Some(String::from(&**text))
            })
            .collect()
    }

    fn find_all(&self, selector: &str) -> Vec<Self> {
        let Ok(selector) = Selector::parse(selector) else {
            return Vec::new();
        };

        self.element
            .select(&selector)
            .map(|element| ScraperNode { element })
            .collect()
    }

    fn next_siblings(&self) -> Vec<Self> {
        self.element
            .next_siblings()
            .filter_map(ElementRef::wrap)
            .map(|element| ScraperNode { element })
            .collect()
    }

    fn find_next(&self, selector: &str) -> Option<Self> {
        let selector = Selector::parse(selector).ok()?;
        let top = self.element.ancestors().last().unwrap_or(*self.element);
        let start = self.element.id();

        top.descendants()
            .skip_while(|node| node.id() != start)
            .skip(1)
            .filter_map(ElementRef::wrap)
            .find(|element| selector.matches(element))
            .map(|element| ScraperNode { element })
    }
}
