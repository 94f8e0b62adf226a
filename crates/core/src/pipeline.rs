//! The metadata pipeline.
//!
//! [`Scraper`] is the single entry point: it fetches a URL, decides once
//! whether the response is an image or a document, runs the matching branch,
//! and assembles a [`MetadataRecord`]. Only the primary fetch can fail the
//! call; image and favicon enrichment degrade to empty fields.
//!
//! # Example
//!
//! ```rust,no_run
//! use metaprobe_core::{Scraper, ScraperConfig};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ScraperConfig::builder().timeout(20).image_timeout(5).build();
//! let scraper = Scraper::with_config(config)?;
//! let record = scraper.scrape("https://example.com/article").await?;
//! println!("{} ({})", record.title.unwrap_or_default(), record.publisher);
//! # Ok(())
//! # }
//! ```

use std::fmt;

use reqwest::Client;

use crate::enrich::{ImageInfo, describe_image, enrich_image};
use crate::favicon::detect_favicon;
use crate::fetch::{FetchConfig, FetchedResource, build_client, fetch_resource, parse_http_url};
use crate::metadata::extract_metadata;
use crate::record::MetadataRecord;
use crate::Result;

/// Configuration for a [`Scraper`].
#[derive(Debug, Clone, Default)]
pub struct ScraperConfig {
    /// HTTP settings shared by page and image requests.
    pub fetch: FetchConfig,
}

impl ScraperConfig {
    /// Creates a new builder for ScraperConfig.
    ///
    /// # Example
    ///
    /// ```rust
    /// use metaprobe_core::ScraperConfig;
    ///
    /// let config = ScraperConfig::builder().timeout(30).build();
    /// assert_eq!(config.fetch.timeout, 30);
    /// ```
    pub fn builder() -> ScraperConfigBuilder {
        ScraperConfigBuilder::new()
    }
}

/// Builder for ScraperConfig.
pub struct ScraperConfigBuilder {
    config: ScraperConfig,
}

impl ScraperConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self { config: ScraperConfig::default() }
    }

    /// Sets the page request timeout in seconds.
    pub fn timeout(mut self, secs: u64) -> Self {
        self.config.fetch.timeout = secs;
        self
    }

    /// Sets the image and favicon request timeout in seconds.
    pub fn image_timeout(mut self, secs: u64) -> Self {
        self.config.fetch.image_timeout = secs;
        self
    }

    /// Sets the User-Agent header.
    pub fn user_agent(mut self, value: impl Into<String>) -> Self {
        self.config.fetch.user_agent = value.into();
        self
    }

    /// Sets the maximum number of redirects to follow.
    pub fn max_redirects(mut self, value: usize) -> Self {
        self.config.fetch.max_redirects = value;
        self
    }

    /// Sets the maximum accepted response body size.
    pub fn max_body_bytes(mut self, value: usize) -> Self {
        self.config.fetch.max_body_bytes = value;
        self
    }

    /// Builds the config.
    pub fn build(self) -> ScraperConfig {
        self.config
    }
}

impl Default for ScraperConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Pipeline stages, in order. Used for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Fetching,
    ImageSubject,
    DocumentSubject,
    Assembling,
    Done,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Fetching => "fetching",
            Stage::ImageSubject => "image-subject",
            Stage::DocumentSubject => "document-subject",
            Stage::Assembling => "assembling",
            Stage::Done => "done",
            Stage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Extracts metadata records from URLs.
///
/// A scraper owns one HTTP connection pool and can be shared between tasks;
/// each [`Scraper::scrape`] call is independent.
#[derive(Debug, Clone)]
pub struct Scraper {
    client: Client,
    config: ScraperConfig,
}

impl Scraper {
    /// Creates a scraper with a custom configuration.
    pub fn with_config(config: ScraperConfig) -> Result<Self> {
        let client = build_client(&config.fetch)?;
        Ok(Self { client, config })
    }

    /// Gets the active configuration.
    pub fn config(&self) -> &ScraperConfig {
        &self.config
    }

    /// Fetches `url` and builds its metadata record.
    ///
    /// # Errors
    ///
    /// Returns [`crate::MetaprobeError::InvalidUrl`] for input that is not an
    /// absolute http(s) URL, and a fetch error (see
    /// [`crate::MetaprobeError::is_fetch_error`]) when the page cannot be
    /// retrieved. No partial record is produced in either case.
    pub async fn scrape(&self, url: &str) -> Result<MetadataRecord> {
        let target = parse_http_url(url)?;
        tracing::info!(url = %target, "scraping");
        tracing::debug!(stage = %Stage::Fetching, url = %target);

        let resource = match fetch_resource(&self.client, target, self.config.fetch.timeout, &self.config.fetch).await {
            Ok(resource) => resource,
            Err(e) => {
                tracing::warn!(stage = %Stage::Failed, url, error = %e, "primary fetch failed");
                return Err(e);
            }
        };

        let record = if resource.is_image() {
            self.scrape_image(resource)
        } else {
            self.scrape_document(resource).await
        };

        tracing::info!(stage = %Stage::Done, url = %record.url, "scraped");
        Ok(record)
    }

    /// Enriches a single image URL with this scraper's client and settings.
    pub async fn enrich_image(&self, image_url: &str) -> Option<ImageInfo> {
        enrich_image(&self.client, image_url, &self.config.fetch).await
    }

    /// Resolves and enriches the favicon of a page.
    pub async fn detect_favicon(&self, html: &str, page_url: &str) -> Option<ImageInfo> {
        detect_favicon(&self.client, html, page_url, &self.config.fetch).await
    }

    /// The response is itself the image: describe the bytes already fetched.
    fn scrape_image(&self, resource: FetchedResource) -> MetadataRecord {
        tracing::debug!(stage = %Stage::ImageSubject, content_type = %resource.content_type);

        let image = describe_image(&resource.final_url, &resource);

        tracing::debug!(stage = %Stage::Assembling, has_image = image.is_some());
        MetadataRecord::for_image(&resource.final_url, image, resource.last_modified)
    }

    async fn scrape_document(&self, resource: FetchedResource) -> MetadataRecord {
        tracing::debug!(stage = %Stage::DocumentSubject, content_type = %resource.content_type);

        let html = resource.text();
        let page_url = resource.final_url.as_str();
        let metadata = extract_metadata(&html, &resource.final_url);
        tracing::debug!(?metadata, "extracted page metadata");

        let image_fut = async {
            match metadata.image.as_deref() {
                Some(image_url) => self.enrich_image(image_url).await,
                None => None,
            }
        };
        let logo_fut = self.detect_favicon(&html, page_url);
        let (image, logo) = tokio::join!(image_fut, logo_fut);

        tracing::debug!(
            stage = %Stage::Assembling,
            has_image = image.is_some(),
            has_logo = logo.is_some()
        );
        MetadataRecord::for_document(&resource.final_url, metadata, image, logo, resource.last_modified)
    }
}

/// Convenience function for one-off scrapes with default settings.
///
/// Builds a fresh [`Scraper`]; reuse one when scraping many URLs.
pub async fn scrape(url: &str) -> Result<MetadataRecord> {
    Scraper::with_config(ScraperConfig::default())?.scrape(url).await
}
