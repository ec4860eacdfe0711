//! Address extraction from fetched pages
//!
//! Listing pages link every address to an explorer; the link text is the
//! address itself. Extraction never fails: content that does not parse into
//! anything useful simply yields an empty set.

use crate::state::AddressSet;
use scraper::{Html, Selector};

/// Turns raw page content into the set of addresses listed on it
pub trait PageExtractor: Send + Sync {
    fn extract(&self, body: &str) -> AddressSet;
}

/// Collects the text of every anchor whose href contains a pattern
///
/// # Extraction Rules
///
/// **Include:**
/// - `<a href="...">` whose href contains the configured pattern
///
/// **Exclude:**
/// - Anchors without an href
/// - Anchors whose trimmed text is empty
#[derive(Debug, Clone)]
pub struct LinkTextExtractor {
    href_pattern: String,
}

impl LinkTextExtractor {
    pub fn new(href_pattern: impl Into<String>) -> Self {
        Self {
            href_pattern: href_pattern.into(),
        }
    }
}

impl PageExtractor for LinkTextExtractor {
    fn extract(&self, body: &str) -> AddressSet {
        let Ok(selector) = Selector::parse("a[href]") else {
            return AddressSet::new();
        };
        let document = Html::parse_document(body);

        document
            .select(&selector)
            .filter(|element| {
                element
                    .value()
                    .attr("href")
                    .is_some_and(|href| href.contains(self.href_pattern.as_str()))
            })
            .map(|element| element.text().collect::<String>().trim().to_string())
            .filter(|text| !text.is_empty())
            .collect()
    }
}
