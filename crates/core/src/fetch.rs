//! Resource fetching over HTTP.
//!
//! This module wraps [`reqwest`] with the settings the pipeline needs: a
//! per-request timeout, a browser-like User-Agent, bounded redirect following
//! and a hard cap on body size. The body is kept as raw bytes so the same
//! response can be treated as markup or as an image.

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::time::Duration;

use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE, LAST_MODIFIED, USER_AGENT};
use reqwest::{Client, redirect};
use url::Url;

use crate::{MetaprobeError, Result};

/// HTTP client configuration for fetching pages and images.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Timeout for the primary page request, in seconds.
    pub timeout: u64,
    /// Timeout for image and favicon requests, in seconds.
    pub image_timeout: u64,
    /// User-Agent sent with every request.
    pub user_agent: String,
    /// Maximum number of redirects followed.
    pub max_redirects: usize,
    /// Bodies larger than this are abandoned.
    pub max_body_bytes: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: 15,
            image_timeout: 10,
            user_agent: "Mozilla/5.0 (compatible; Metaprobe/1.0)".to_string(),
            max_redirects: 10,
            max_body_bytes: 20 * 1024 * 1024,
        }
    }
}

/// A fetched HTTP response with its body fully read.
#[derive(Debug, Clone)]
pub struct FetchedResource {
    /// URL after all redirects were followed.
    pub final_url: Url,
    /// Declared `Content-Type`, or an empty string when missing.
    pub content_type: String,
    /// Raw `Last-Modified` header value.
    pub last_modified: Option<String>,
    /// Response body.
    pub body: Vec<u8>,
}

impl FetchedResource {
    /// Whether the declared content type is an `image/*` type.
    pub fn is_image(&self) -> bool {
        is_image_content_type(&self.content_type)
    }

    /// Body decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Returns `true` for content types beginning with `image/`, ignoring case.
pub fn is_image_content_type(content_type: &str) -> bool {
    content_type
        .trim_start()
        .get(..6)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("image/"))
}

/// Builds the shared HTTP client.
///
/// The client follows at most `max_redirects` redirects and keeps no cookie
/// store, so pooled connections carry no state between target hosts.
pub fn build_client(config: &FetchConfig) -> Result<Client> {
    Client::builder()
        .redirect(redirect::Policy::limited(config.max_redirects))
        .build()
        .map_err(MetaprobeError::HttpError)
}

/// Parses a user-supplied URL, accepting only absolute http/https URLs.
pub fn parse_http_url(url: &str) -> Result<Url> {
    let parsed = Url::parse(url.trim()).map_err(|e| MetaprobeError::InvalidUrl(format!("{url}: {e}")))?;

    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        scheme => Err(MetaprobeError::InvalidUrl(format!(
            "unsupported scheme '{scheme}', expected http or https"
        ))),
    }
}

/// Performs a GET request and reads the whole body.
///
/// `timeout` (seconds) bounds the entire exchange including the body. Any
/// non-2xx status is reported as [`MetaprobeError::HttpStatus`].
pub async fn fetch_resource(client: &Client, url: Url, timeout: u64, config: &FetchConfig) -> Result<FetchedResource> {
    let map_err = |e: reqwest::Error| {
        if e.is_timeout() { MetaprobeError::Timeout { timeout } } else { MetaprobeError::HttpError(e) }
    };

    let mut response = client
        .get(url)
        .timeout(Duration::from_secs(timeout))
        .header(USER_AGENT, &config.user_agent)
        .header(
            ACCEPT,
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/*;q=0.8,*/*;q=0.7",
        )
        .header(ACCEPT_LANGUAGE, "en-US,en;q=0.9")
        .send()
        .await
        .map_err(map_err)?;

    let final_url = response.url().clone();
    let status = response.status();
    if !status.is_success() {
        return Err(MetaprobeError::HttpStatus { url: final_url.to_string(), status: status.as_u16() });
    }

    let headers = response.headers();
    let content_type = header_string(headers, CONTENT_TYPE).unwrap_or_default();
    let last_modified = header_string(headers, LAST_MODIFIED);

    if response
        .content_length()
        .is_some_and(|len| len > config.max_body_bytes as u64)
    {
        return Err(MetaprobeError::BodyTooLarge { limit: config.max_body_bytes });
    }

    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await.map_err(map_err)? {
        if body.len() + chunk.len() > config.max_body_bytes {
            return Err(MetaprobeError::BodyTooLarge { limit: config.max_body_bytes });
        }
        body.extend_from_slice(&chunk);
    }

    Ok(FetchedResource { final_url, content_type, last_modified, body })
}

fn header_string(headers: &reqwest::header::HeaderMap, name: reqwest::header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Reads HTML markup from a local file.
pub fn read_file(path: &str) -> Result<String> {
    let path_buf = PathBuf::from(path);

    if !path_buf.exists() {
        Err(MetaprobeError::FileNotFound(path_buf))
    } else {
        fs::read_to_string(&path_buf).map_err(MetaprobeError::from)
    }
}

/// Reads HTML markup from standard input until EOF.
pub fn read_stdin() -> Result<String> {
    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    Ok(buffer)
}
