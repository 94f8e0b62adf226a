//! HTML parsing and DOM querying.
//!
//! This module provides the [`Document`] and [`Element`] types for parsing
//! HTML and reading elements with CSS selectors. A document may carry the URL
//! it was fetched from, which is used to resolve relative references.
//!
//! `Document` wraps [`scraper::Html`], which is not `Send`; parse, read what
//! you need into owned values, and drop the document before any `.await`.
//!
//! # Example
//!
//! ```rust
//! use metaprobe_core::parse::Document;
//!
//! let html = r#"<html><head><link rel="icon" href="/i.png"></head></html>"#;
//! let doc = Document::parse(html).unwrap();
//! let href = doc.select_first("link[rel=\"icon\"]").unwrap().and_then(|el| el.attr("href").map(str::to_string));
//! assert_eq!(href.as_deref(), Some("/i.png"));
//! ```

use scraper::{Html, Selector};
use url::Url;

use crate::{MetaprobeError, Result};

/// Represents a parsed HTML document.
pub struct Document {
    html: Html,
    base_url: Option<Url>,
}

impl Document {
    /// Parses HTML from a string.
    ///
    /// Parsing is lenient: malformed markup still yields a document.
    pub fn parse(html: &str) -> Result<Self> {
        let html = Html::parse_document(html);
        Ok(Self { html, base_url: None })
    }

    /// Parses HTML that was served from `base_url`.
    ///
    /// Relative references returned by [`Document::resolve_url`] are resolved
    /// against this URL.
    pub fn parse_with_base_url(html: &str, base_url: Url) -> Result<Self> {
        let html = Html::parse_document(html);
        Ok(Self { html, base_url: Some(base_url) })
    }

    /// Selects elements using a CSS selector.
    ///
    /// # Errors
    ///
    /// Returns [`MetaprobeError::HtmlParseError`] if the selector is invalid.
    ///
    /// # Example
    ///
    /// ```rust
    /// use metaprobe_core::parse::Document;
    ///
    /// let html = r#"<p class="content">First</p><p class="content">Second</p>"#;
    /// let doc = Document::parse(html).unwrap();
    /// let elements = doc.select("p.content").unwrap();
    /// assert_eq!(elements.len(), 2);
    /// ```
    pub fn select(&'_ self, selector: &str) -> Result<Vec<Element<'_>>> {
        let sel = parse_selector(selector)?;
        Ok(self.html.select(&sel).map(|el| Element { element: el }).collect())
    }

    /// Selects the first element matching a CSS selector.
    pub fn select_first(&'_ self, selector: &str) -> Result<Option<Element<'_>>> {
        let sel = parse_selector(selector)?;
        Ok(self.html.select(&sel).next().map(|el| Element { element: el }))
    }

    /// Gets the title of the document.
    ///
    /// Returns the content of the `<title>` element if present.
    pub fn title(&self) -> Option<String> {
        let selector = Selector::parse("title").ok()?;
        self.html
            .select(&selector)
            .next()
            .map(|el| el.text().collect::<String>())
    }

    /// Gets the `lang` attribute of the root `<html>` element.
    pub fn lang(&self) -> Option<&str> {
        self.html.root_element().value().attr("lang")
    }

    /// Resolves `href` against the document's base URL.
    ///
    /// Without a base URL only absolute references resolve. Returns `None`
    /// for blank or unresolvable references.
    pub fn resolve_url(&self, href: &str) -> Option<Url> {
        let href = href.trim();
        if href.is_empty() {
            return None;
        }

        match &self.base_url {
            Some(base) => base.join(href).ok(),
            None => Url::parse(href).ok(),
        }
    }
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| MetaprobeError::HtmlParseError(format!("Invalid selector: {}", e)))
}

/// A wrapper around scraper's ElementRef.
///
/// # Example
///
/// ```rust
/// use metaprobe_core::parse::Document;
///
/// let html = r#"<a href="https://example.com">Link text</a>"#;
/// let doc = Document::parse(html).unwrap();
/// let link = &doc.select("a").unwrap()[0];
///
/// assert_eq!(link.text(), "Link text");
/// assert_eq!(link.attr("href"), Some("https://example.com"));
/// ```
#[derive(Clone, Debug)]
pub struct Element<'a> {
    element: scraper::ElementRef<'a>,
}

impl<'a> Element<'a> {
    /// Gets the text content of this element.
    pub fn text(&self) -> String {
        self.element.text().collect()
    }

    /// Gets the value of an attribute, or `None` if it is not present.
    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.element.value().attr(name)
    }
}
