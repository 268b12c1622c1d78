//! Best-effort field extractors for product detail pages.
//!
//! Each function reads one field from the page and degrades to `None` or an
//! empty collection when the markup it looks for is missing. None of them can
//! fail the extraction as a whole.

use crate::dom::{joined_text, DomNode};
use crate::product::{Properties, Sizes};
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;
use url::Url;

static SKU_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"SKU:\s*(\S+)").expect("valid SKU pattern"));

static PRICE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$[0-9][0-9.,/]*").expect("valid price pattern"));

const IMAGE_DENYLIST: &[&str] = &["logo", "icon", "placeholder", "api/cacheable", "no_image_available"];

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

const PROPERTY_KEYWORDS: &[&str] = &["property", "color", "adhesive", "carrier", "thickness"];

const SECTION_HEADINGS: &[&str] = &["h2", "h3", "h4", "h5"];

pub fn title<N: DomNode>(root: &N) -> Option<String> {
    root.find_first("h1")
        .map(|h1| h1.text())
        .filter(|t| !t.is_empty())
}

/// First `SKU: <token>` found in any single text node.
pub fn sku<N: DomNode>(root: &N) -> Option<String> {
    root.text_nodes().iter().find_map(|text| {
        SKU_PATTERN
            .captures(text.trim())
            .map(|caps| caps[1].to_string())
    })
}

/// First `$`-prefixed amount anywhere in the page text, with trailing
/// slashes removed (`$12.99/roll` yields `$12.99`).
pub fn price<N: DomNode>(root: &N) -> Option<String> {
    let text = joined_text(root, "\n");

    PRICE_PATTERN
        .find(&text)
        .map(|m| m.as_str().trim_end_matches('/').trim().to_string())
}

pub fn images<N: DomNode>(root: &N, base: &Url, page_url: &str) -> Vec<String> {
    let page = Url::parse(page_url).unwrap_or_else(|_| base.clone());
    let mut seen = HashSet::new();
    let mut images = Vec::new();

    for img in root.find_all("img[src]") {
        let Some(src) = img.attr("src") else { continue };
        if let Some(resolved) = normalize_image_src(src, base, &page)
            && seen.insert(resolved.clone())
        {
            images.push(resolved);
        }
    }

    images
}

/// Resolve an `<img src>` to an absolute raster image URL, or reject it.
pub fn normalize_image_src(src: &str, base: &Url, page: &Url) -> Option<String> {
    let src = src.trim().split(['?', '#']).next().unwrap_or_default();
    if src.is_empty() {
        return None;
    }

    let lower = src.to_ascii_lowercase();
    if IMAGE_DENYLIST.iter().any(|deny| lower.contains(deny)) {
        return None;
    }

    let absolute = if src.starts_with("//") {
        format!("https:{}", src)
    } else if src.starts_with('/') {
        base.join(src).ok()?.to_string()
    } else {
        page.join(src).ok()?.to_string()
    };

    let file = absolute.rsplit('/').next().unwrap_or_default();
    let extension = file.rsplit_once('.')?.1.to_ascii_lowercase();

    IMAGE_EXTENSIONS
        .contains(&extension.as_str())
        .then_some(absolute)
}

/// Reads the first table whose header cells mention a property keyword.
pub fn properties<N: DomNode>(root: &N) -> Properties {
    let mut props = Properties::default();

    let table = root.find_all("table").into_iter().find(|table| {
        let headers = table
            .find_all("th")
            .iter()
            .map(|th| th.text())
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();
        PROPERTY_KEYWORDS.iter().any(|word| headers.contains(word))
    });

    let Some(table) = table else {
        return props;
    };

    for row in table.find_all("tr") {
        let cells = row.find_all("th, td");
        if cells.len() < 2 {
            continue;
        }

        let value = Some(cells[1].text());
        match cells[0].text().as_str() {
            "Color(s)" => props.color = value,
            "Adhesive" => props.adhesive = value,
            "Carrier" => props.carrier = value,
            "Total Thickness" => props.total_thickness = value,
            _ => {}
        }
    }

    props
}

/// Paragraphs and list items following the first "details" heading, up to
/// the next section heading.
pub fn description_and_applications<N: DomNode>(root: &N) -> (Option<String>, Vec<String>) {
    let mut applications = Vec::new();

    let heading = root
        .find_all("h2, h3, h4, h5")
        .into_iter()
        .find(|h| h.text().to_lowercase().contains("details"));

    let Some(heading) = heading else {
        return (None, applications);
    };

    let mut paragraphs = Vec::new();
    for sibling in heading.next_siblings() {
        match sibling.tag() {
            tag if SECTION_HEADINGS.contains(&tag) => break,
            "p" => {
                let text = sibling.text();
                if !text.is_empty() {
                    paragraphs.push(text);
                }
            }
            "ul" => {
                applications.extend(
                    sibling
                        .find_all("li")
                        .iter()
                        .map(|li| li.text())
                        .filter(|t| !t.is_empty()),
                );
            }
            _ => {}
        }
    }

    let description = (!paragraphs.is_empty()).then(|| paragraphs.join(" "));
    (description, applications)
}

/// Options of the `<select>` that follows each "Tape Width" / "Tape Length"
/// label. A select feeds each list at most once even when nested labels match.
pub fn sizes<N: DomNode>(root: &N) -> Sizes {
    let mut sizes = Sizes::default();
    let mut width_selects: Vec<N> = Vec::new();
    let mut length_selects: Vec<N> = Vec::new();

    for label in root.find_all("label, span, p") {
        let text = label.text().to_lowercase();

        for (needle, target, consumed) in [
            ("tape width", &mut sizes.widths, &mut width_selects),
            ("tape length", &mut sizes.lengths, &mut length_selects),
        ] {
            if !text.contains(needle) {
                continue;
            }
            let Some(select) = label.find_next("select") else {
                continue;
            };
            if consumed.contains(&select) {
                continue;
            }

            target.extend(
                select
                    .find_all("option")
                    .iter()
                    .map(|option| option.text())
                    .filter(|t| !t.to_lowercase().contains("select")),
            );
            consumed.push(select);
        }
    }

    sizes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::HtmlPage;

    fn base() -> Url {
        Url::parse("https://www.example.com").unwrap()
    }

    #[test]
    fn test_title_uses_first_h1() {
        let page = HtmlPage::parse("<h1> Gaffers <em>Tape</em> </h1><h1>Other</h1>");
        assert_eq!(title(&page.root()), Some("Gaffers Tape".to_string()));

        let page = HtmlPage::parse("<h2>No title</h2>");
        assert_eq!(title(&page.root()), None);
    }

    #[test]
    fn test_sku_first_match_wins() {
        let page = HtmlPage::parse(
            "<div><span>Item SKU: BT-1001 </span></div><p>sku: BT-2002</p>",
        );
        assert_eq!(sku(&page.root()), Some("BT-1001".to_string()));
    }

    #[test]
    fn test_sku_label_is_case_sensitive() {
        let page = HtmlPage::parse("<p>sku: BT-2002</p><p>Part SKU: BT-3003</p>");
        assert_eq!(sku(&page.root()), Some("BT-3003".to_string()));
    }

    #[test]
    fn test_sku_missing() {
        let page = HtmlPage::parse("<p>No identifier here</p>");
        assert_eq!(sku(&page.root()), None);
    }

    #[test]
    fn test_price_strips_per_unit_suffix() {
        let page = HtmlPage::parse("<p>Price: $12.99/roll</p>");
        assert_eq!(price(&page.root()), Some("$12.99".to_string()));
    }

    #[test]
    fn test_price_first_amount_on_page() {
        let page = HtmlPage::parse(
            "<div class='related'>$4.50</div><div class='price'>$1,299.00</div>",
        );
        assert_eq!(price(&page.root()), Some("$4.50".to_string()));
    }

    #[test]
    fn test_price_missing_is_none() {
        let page = HtmlPage::parse("<p>Call for pricing</p>");
        assert_eq!(price(&page.root()), None);
    }

    #[test]
    fn test_images_normalized_filtered_and_deduplicated() {
        let page = HtmlPage::parse(
            r#"
            <img src="//cdn.example.com/x.jpg?resize=300">
            <img src="/images/roll.PNG">
            <img src="/images/site-logo.png">
            <img src="/images/cart-icon.jpg">
            <img src="/api/cacheable/abc.jpg">
            <img src="/images/badge.svg">
            <img src="//cdn.example.com/x.jpg">
            <img alt="no source">
            "#,
        );

        let found = images(&page.root(), &base(), "https://www.example.com/BT-1/");
        assert_eq!(
            found,
            vec![
                "https://cdn.example.com/x.jpg".to_string(),
                "https://www.example.com/images/roll.PNG".to_string(),
            ]
        );
    }

    #[test]
    fn test_image_denylist_beats_extension() {
        let page_url = base();
        assert_eq!(normalize_image_src("/logo.jpg", &base(), &page_url), None);
        assert_eq!(normalize_image_src("/x.svg", &base(), &page_url), None);
        assert_eq!(normalize_image_src("/noext", &base(), &page_url), None);
        assert_eq!(
            normalize_image_src("https://img.example.com/a.webp", &base(), &page_url),
            Some("https://img.example.com/a.webp".to_string())
        );
    }

    #[test]
    fn test_properties_table() {
        let page = HtmlPage::parse(
            r#"
            <table><tr><th>Shipping</th></tr><tr><td>Color(s)</td><td>Red</td></tr></table>
            <table>
              <tr><th>Property</th><th>Color</th></tr>
              <tr><td> Color(s) </td><td> Black </td></tr>
              <tr><td>Adhesive</td><td>Natural Rubber</td></tr>
              <tr><td>Carrier</td><td>Cloth</td></tr>
              <tr><td>Total Thickness</td><td>11 mil</td></tr>
              <tr><td>Tensile Strength</td><td>45 lbs/in</td></tr>
              <tr><td>Lonely cell</td></tr>
            </table>
            "#,
        );

        let props = properties(&page.root());
        assert_eq!(props.color.as_deref(), Some("Black"));
        assert_eq!(props.adhesive.as_deref(), Some("Natural Rubber"));
        assert_eq!(props.carrier.as_deref(), Some("Cloth"));
        assert_eq!(props.total_thickness.as_deref(), Some("11 mil"));
    }

    #[test]
    fn test_properties_without_table() {
        let page = HtmlPage::parse("<p>Color(s): Black</p>");
        assert_eq!(properties(&page.root()), Properties::default());
    }

    #[test]
    fn test_description_and_applications() {
        let page = HtmlPage::parse(
            r#"
            <h2>Overview</h2><p>Not this.</p>
            <h3>Product Details</h3>
            <p>Strong cloth tape.</p>
            <div>ignored</div>
            <p>Tears by hand.</p>
            <ul><li>Stage floors</li><li> </li><li>Cable runs</li></ul>
            <h3>Shipping</h3>
            <p>Ships in 2 days.</p>
            "#,
        );

        let (description, applications) = description_and_applications(&page.root());
        assert_eq!(
            description.as_deref(),
            Some("Strong cloth tape. Tears by hand.")
        );
        assert_eq!(applications, vec!["Stage floors", "Cable runs"]);
    }

    #[test]
    fn test_description_missing_heading() {
        let page = HtmlPage::parse("<h2>Overview</h2><p>text</p>");
        let (description, applications) = description_and_applications(&page.root());
        assert!(description.is_none());
        assert!(applications.is_empty());
    }

    #[test]
    fn test_sizes_from_labelled_selects() {
        let page = HtmlPage::parse(
            r#"
            <div><label>Tape Width</label>
              <select><option>Select Width...</option><option>1"</option><option>2"</option></select>
            </div>
            <p><span>Tape Length</span></p>
            <select><option>-- select --</option><option>60 yds</option></select>
            "#,
        );

        let sizes = sizes(&page.root());
        assert_eq!(sizes.widths, vec!["1\"", "2\""]);
        assert_eq!(sizes.lengths, vec!["60 yds"]);
    }

    #[test]
    fn test_sizes_width_select_not_lost_to_earlier_length_mention() {
        let page = HtmlPage::parse(
            r#"
            <p>Cut to any tape length you need.</p>
            <label>Tape Width</label>
            <select><option>Select Width</option><option>2"</option></select>
            <label>Tape Length</label>
            <select><option>Select Length</option><option>60 yds</option></select>
            "#,
        );

        let sizes = sizes(&page.root());
        assert_eq!(sizes.widths, vec!["2\""]);
        assert_eq!(sizes.lengths, vec!["2\"", "60 yds"]);
    }

    #[test]
    fn test_sizes_absent() {
        let page = HtmlPage::parse("<p>One size</p>");
        assert_eq!(sizes(&page.root()), Sizes::default());
    }
}
