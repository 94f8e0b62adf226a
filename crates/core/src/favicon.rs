//! Favicon discovery.

use reqwest::Client;
use url::Url;

use crate::enrich::{ImageInfo, enrich_image};
use crate::fetch::FetchConfig;
use crate::Document;

/// Icon link selectors, in priority order.
const ICON_SELECTORS: [&str; 3] = [
    "link[rel=\"icon\"]",
    "link[rel=\"shortcut icon\"]",
    "link[rel=\"apple-touch-icon\"]",
];

/// Path tried when the page declares no icon.
const DEFAULT_FAVICON: &str = "/favicon.ico";

/// Picks the page's favicon URL.
///
/// The first icon link with a non-blank `href` wins, trying `icon`, then
/// `shortcut icon`, then `apple-touch-icon`; pages without one fall back to
/// `/favicon.ico`. The href is resolved against `page_url`. Returns `None`
/// when `page_url` is malformed or the href cannot be resolved.
pub fn favicon_url(html: &str, page_url: &str) -> Option<Url> {
    let base = Url::parse(page_url).ok()?;
    let doc = Document::parse_with_base_url(html, base).ok()?;

    let href = ICON_SELECTORS
        .iter()
        .find_map(|selector| {
            doc.select(selector)
                .ok()?
                .iter()
                .filter_map(|el| el.attr("href"))
                .map(str::trim)
                .find(|href| !href.is_empty())
                .map(str::to_string)
        })
        .unwrap_or_else(|| DEFAULT_FAVICON.to_string());

    doc.resolve_url(&href)
}

/// Resolves the page favicon and enriches it.
///
/// Returns exactly what [`enrich_image`] returns for the resolved URL, or
/// `None` when no URL could be resolved.
pub async fn detect_favicon(client: &Client, html: &str, page_url: &str, config: &FetchConfig) -> Option<ImageInfo> {
    let Some(url) = favicon_url(html, page_url) else {
        tracing::debug!(page_url, "could not resolve a favicon URL");
        return None;
    };

    tracing::debug!(favicon = %url, "resolved favicon");
    enrich_image(client, url.as_str(), config).await
}
