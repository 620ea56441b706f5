//! HTML text and link extraction
//!
//! This module turns rendered markup into:
//! - Readable text, taken from the first content strategy that yields any
//! - Outbound links, resolved against the page URL and deduplicated
//!
//! # Content strategies
//!
//! Strategies are tried in order and the first non-empty result wins. The
//! default chain is `main`, then `.container`, then the whole document.

use crate::config::ExtractConfig;
use crate::ConfigError;
use scraper::{ElementRef, Html, Node, Selector};
use std::collections::HashSet;
use url::Url;

/// Elements whose text never counts as page content
const SKIPPED_TAGS: &[&str] = &["script", "style", "noscript", "template", "head"];

/// Elements that start a new line of text
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "dd", "div", "dl", "dt", "fieldset",
    "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header",
    "hr", "li", "main", "nav", "ol", "p", "pre", "section", "table", "tr", "td", "th", "ul",
];

/// One step of the text extraction fallback chain
#[derive(Debug, Clone)]
pub enum ContentStrategy {
    /// Text of the first element matching a CSS selector
    Region { name: String, selector: Selector },

    /// Text of the whole document body
    WholeDocument,
}

impl ContentStrategy {
    /// Builds a region strategy from a CSS selector
    pub fn region(selector: &str) -> Result<Self, ConfigError> {
        let parsed = Selector::parse(selector)
            .map_err(|e| ConfigError::InvalidSelector(format!("'{}': {:?}", selector, e)))?;

        Ok(Self::Region {
            name: selector.to_string(),
            selector: parsed,
        })
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Region { name, .. } => name,
            Self::WholeDocument => "document",
        }
    }

    /// Returns the strategy's text, or `None` if it yields nothing
    fn apply(&self, document: &Html) -> Option<String> {
        match self {
            Self::Region { selector, .. } => document
                .select(selector)
                .map(element_text)
                .find(|text| !text.is_empty()),
            Self::WholeDocument => {
                let root = document.root_element();
                let body = Selector::parse("body")
                    .ok()
                    .and_then(|sel| document.select(&sel).next())
                    .unwrap_or(root);
                Some(element_text(body)).filter(|text| !text.is_empty())
            }
        }
    }
}

/// Text and links extracted from one page
#[derive(Debug, Clone, Default)]
pub struct ExtractedPage {
    /// Cleaned text; empty when no strategy matched anything
    pub text: String,

    /// Absolute outbound links in document order, without duplicates
    pub links: Vec<String>,

    /// Name of the strategy that produced `text`
    pub strategy: Option<String>,
}

/// Ordered chain of content strategies plus link extraction
#[derive(Debug, Clone)]
pub struct Extractor {
    strategies: Vec<ContentStrategy>,
}

impl Default for Extractor {
    fn default() -> Self {
        // The default selectors are known to parse
        Self::from_config(&ExtractConfig::default()).unwrap_or_else(|_| Self {
            strategies: vec![ContentStrategy::WholeDocument],
        })
    }
}

impl Extractor {
    pub fn new(strategies: Vec<ContentStrategy>) -> Self {
        Self { strategies }
    }

    /// Builds the chain from the configured selectors, ending with the
    /// whole document
    pub fn from_config(config: &ExtractConfig) -> Result<Self, ConfigError> {
        let mut strategies = config
            .content_selectors
            .iter()
            .map(|selector| ContentStrategy::region(selector))
            .collect::<Result<Vec<_>, _>>()?;
        strategies.push(ContentStrategy::WholeDocument);

        Ok(Self { strategies })
    }

    pub fn strategies(&self) -> &[ContentStrategy] {
        &self.strategies
    }

    /// Extracts text and links from rendered markup
    ///
    /// # Arguments
    ///
    /// * `html` - The page markup
    /// * `page_url` - The URL the markup was loaded from, for resolving
    ///   relative links
    ///
    /// # Example
    ///
    /// ```
    /// use sumi_harvest::crawler::Extractor;
    /// use url::Url;
    ///
    /// let html = r#"<html><body><main>Hello</main><a href="/next">Next</a></body></html>"#;
    /// let page = Extractor::default().extract(html, &Url::parse("https://example.com/").unwrap());
    /// assert_eq!(page.text, "Hello");
    /// assert_eq!(page.links, vec!["https://example.com/next".to_string()]);
    /// ```
    pub fn extract(&self, html: &str, page_url: &Url) -> ExtractedPage {
        let document = Html::parse_document(html);

        let (text, strategy) = self
            .strategies
            .iter()
            .find_map(|strategy| {
                strategy
                    .apply(&document)
                    .map(|text| (text, strategy.name().to_string()))
            })
            .map_or((String::new(), None), |(text, name)| (text, Some(name)));

        ExtractedPage {
            text,
            links: extract_links(&document, page_url),
            strategy,
        }
    }
}

/// Collects the text under `element`, one line per block, whitespace
/// collapsed and blank lines dropped
fn element_text(element: ElementRef<'_>) -> String {
    let mut raw = String::new();
    push_text(element, &mut raw);

    raw.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn push_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            // Line breaks come from markup structure, not from the source
            Node::Text(text) => out.extend(
                text.chars()
                    .map(|c| if c.is_whitespace() { ' ' } else { c }),
            ),
            Node::Element(el) => {
                let name = el.name();
                if SKIPPED_TAGS.contains(&name) {
                    continue;
                }
                if name == "br" {
                    out.push('\n');
                    continue;
                }

                let block = BLOCK_TAGS.contains(&name);
                if block {
                    out.push('\n');
                }
                if let Some(child_element) = ElementRef::wrap(child) {
                    push_text(child_element, out);
                }
                if block {
                    out.push('\n');
                }
            }
            _ => {}
        }
    }
}

/// Extracts every anchor target, resolved and deduplicated
///
/// Pseudo-links such as `javascript:` and `mailto:` are returned as-is; the
/// validity filter decides what to do with them. An href that cannot be
/// resolved is logged and skipped without affecting the rest of the page.
fn extract_links(document: &Html, page_url: &Url) -> Vec<String> {
    let mut links = Vec::new();
    let mut seen = HashSet::new();

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            let Some(href) = element.value().attr("href") else {
                continue;
            };

            match resolve_link(href, page_url) {
                Ok(Some(link)) => {
                    if seen.insert(link.clone()) {
                        links.push(link);
                    }
                }
                Ok(None) => {}
                Err(e) => tracing::debug!("Skipping link {:?} on {}: {}", href, page_url, e),
            }
        }
    }

    links
}

/// Resolves an href against the page URL
///
/// Returns `Ok(None)` for empty hrefs.
fn resolve_link(href: &str, page_url: &Url) -> Result<Option<String>, url::ParseError> {
    let href = href.trim();
    if href.is_empty() {
        return Ok(None);
    }

    page_url.join(href).map(|url| Some(url.to_string()))
}
