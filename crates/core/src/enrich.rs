//! Image enrichment: fetch an image and describe its format, dimensions and size.
//!
//! Everything here degrades to `None` instead of failing. A broken image link
//! must never fail the page it was found on, so transport errors, HTML error
//! pages served in place of images, and undecodable bytes are logged at
//! `debug` level and dropped.

use std::io::Cursor;

use image::{ImageFormat, ImageReader, Limits};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::fetch::{FetchConfig, FetchedResource, fetch_resource, parse_http_url};
use crate::{MetaprobeError, Result, format_bytes};

/// Format tag reported for `.ico` files, which are never decoded.
pub const ICO_FORMAT: &str = "ico";

/// Format tag reported for SVG images.
pub const SVG_FORMAT: &str = "svg";

const MAX_DIMENSION: u32 = 65_535;
const MAX_DECODER_ALLOC: u64 = 64 * 1024 * 1024;

/// A fetched and measured image.
///
/// `width` and `height` are either both present or both absent (the latter
/// only for `.ico` files). `size` is the exact byte length of the body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageInfo {
    pub url: String,
    #[serde(rename = "type")]
    pub format: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub size: u64,
    #[serde(rename = "sizePretty", alias = "size_pretty")]
    pub size_pretty: String,
}

/// Format and dimensions read from an image header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbedImage {
    pub format: String,
    pub width: u32,
    pub height: u32,
}

/// Fetches `image_url` and describes the image behind it.
///
/// Returns `None` when the URL is malformed, the request fails or times out
/// (`config.image_timeout`), the server answers with a non-image content
/// type, or the bytes cannot be decoded.
pub async fn enrich_image(client: &Client, image_url: &str, config: &FetchConfig) -> Option<ImageInfo> {
    let url = match parse_http_url(image_url) {
        Ok(url) => url,
        Err(e) => {
            tracing::debug!(url = image_url, error = %e, "skipping image with invalid URL");
            return None;
        }
    };

    match fetch_resource(client, url.clone(), config.image_timeout, config).await {
        Ok(resource) => describe_image(&url, &resource).map(|info| ImageInfo { url: image_url.to_string(), ..info }),
        Err(e) => {
            tracing::debug!(url = %url, error = %e, "image fetch failed");
            None
        }
    }
}

/// Describes an already fetched response as an image.
///
/// `.ico` URLs bypass decoding and report only their size. Anything else must
/// declare an `image/*` content type and decode successfully.
pub fn describe_image(url: &Url, resource: &FetchedResource) -> Option<ImageInfo> {
    let size = resource.body.len() as u64;

    if is_ico_url(url) {
        return Some(ImageInfo {
            url: url.to_string(),
            format: ICO_FORMAT.to_string(),
            width: None,
            height: None,
            size,
            size_pretty: format_bytes(size),
        });
    }

    if !resource.is_image() {
        tracing::debug!(url = %url, content_type = %resource.content_type, "not an image response");
        return None;
    }

    match probe_image(&resource.body) {
        Ok(measured) => Some(ImageInfo {
            url: url.to_string(),
            format: measured.format,
            width: Some(measured.width),
            height: Some(measured.height),
            size,
            size_pretty: format_bytes(size),
        }),
        Err(e) => {
            tracing::debug!(url = %url, error = %e, "image could not be decoded");
            None
        }
    }
}

/// Reads the format and dimensions of an encoded image.
///
/// Raster formats are read from the header only. Decoder allocations are
/// capped and images claiming more than 65535 pixels per side are rejected.
/// SVG documents report the size given by their `width`/`height` or
/// `viewBox`, rounded to whole pixels.
///
/// # Errors
///
/// Returns [`MetaprobeError::ImageDecode`] for unknown formats, corrupt or
/// truncated headers, formats without a compiled-in decoder (AVIF among
/// them), and zero-sized images.
pub fn probe_image(bytes: &[u8]) -> Result<ProbedImage> {
    if looks_like_svg(bytes) {
        return measure_svg(bytes);
    }

    let mut reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| MetaprobeError::ImageDecode(e.to_string()))?;

    let format = reader
        .format()
        .ok_or_else(|| MetaprobeError::ImageDecode("unrecognized image format".to_string()))?;

    let mut limits = Limits::default();
    limits.max_image_width = Some(MAX_DIMENSION);
    limits.max_image_height = Some(MAX_DIMENSION);
    limits.max_alloc = Some(MAX_DECODER_ALLOC);
    reader.limits(limits);

    let (width, height) = reader
        .into_dimensions()
        .map_err(|e| MetaprobeError::ImageDecode(e.to_string()))?;

    if width == 0 || height == 0 {
        return Err(MetaprobeError::ImageDecode(format!("empty {width}x{height} image")));
    }

    Ok(ProbedImage { format: format_name(format).to_string(), width, height })
}

fn measure_svg(bytes: &[u8]) -> Result<ProbedImage> {
    let tree = usvg::Tree::from_data(bytes, &usvg::Options::default())
        .map_err(|e| MetaprobeError::ImageDecode(e.to_string()))?;

    let size = tree.size();
    let (width, height) = (size.width().round(), size.height().round());
    if width < 1.0 || height < 1.0 || width > MAX_DIMENSION as f32 || height > MAX_DIMENSION as f32 {
        return Err(MetaprobeError::ImageDecode(format!("unusable {width}x{height} svg")));
    }

    Ok(ProbedImage { format: SVG_FORMAT.to_string(), width: width as u32, height: height as u32 })
}

/// Markup that opens with a tag and has `<svg` as its root element.
fn looks_like_svg(bytes: &[u8]) -> bool {
    let head = String::from_utf8_lossy(&bytes[..bytes.len().min(4096)]);
    let head = head.trim_start_matches('\u{feff}').trim_start();
    if !head.starts_with('<') {
        return false;
    }
    let lower = head.to_ascii_lowercase();
    match (lower.find("<svg"), lower.find("<html")) {
        (Some(svg), Some(html)) => svg < html,
        (Some(_), None) => true,
        _ => false,
    }
}

/// Whether the URL path ends in `.ico`, ignoring case, query and fragment.
pub fn is_ico_url(url: &Url) -> bool {
    url.path().to_ascii_lowercase().ends_with(".ico")
}

fn format_name(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Png => "png",
        ImageFormat::Jpeg => "jpeg",
        ImageFormat::Gif => "gif",
        ImageFormat::WebP => "webp",
        ImageFormat::Bmp => "bmp",
        ImageFormat::Tiff => "tiff",
        ImageFormat::Ico => "ico",
        other => other.extensions_str().first().copied().unwrap_or("unknown"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::build_client;
    use httpmock::prelude::*;
    use image::{DynamicImage, RgbImage};

    fn encode(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
        let image = DynamicImage::ImageRgb8(RgbImage::new(width, height));
        let mut bytes = Cursor::new(Vec::new());
        image.write_to(&mut bytes, format).unwrap();
        bytes.into_inner()
    }

    fn resource(url: &Url, content_type: &str, body: Vec<u8>) -> FetchedResource {
        FetchedResource {
            final_url: url.clone(),
            content_type: content_type.to_string(),
            last_modified: None,
            body,
        }
    }

    #[test]
    fn test_png_dimensions() {
        let measured = probe_image(&encode(37, 12, ImageFormat::Png)).unwrap();
        assert_eq!(measured, ProbedImage { format: "png".to_string(), width: 37, height: 12 });
    }

    #[test]
    fn test_jpeg_dimensions() {
        let measured = probe_image(&encode(64, 48, ImageFormat::Jpeg)).unwrap();
        assert_eq!(measured.format, "jpeg");
        assert_eq!((measured.width, measured.height), (64, 48));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(matches!(probe_image(b"<html>oops</html>"), Err(MetaprobeError::ImageDecode(_))));
        assert!(matches!(probe_image(&[]), Err(MetaprobeError::ImageDecode(_))));
    }

    #[test]
    fn test_rejects_truncated_png() {
        let png = encode(10, 10, ImageFormat::Png);
        assert!(probe_image(&png[..12]).is_err());
    }

    #[test]
    fn test_svg_dimensions() {
        let svg = br#"<?xml version="1.0"?><svg xmlns="http://www.w3.org/2000/svg" width="32" height="24"></svg>"#;
        let measured = probe_image(svg).unwrap();
        assert_eq!(measured, ProbedImage { format: "svg".to_string(), width: 32, height: 24 });
    }

    #[test]
    fn test_svg_view_box() {
        let svg = br#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 180 90"><rect width="10" height="10"/></svg>"#;
        let measured = probe_image(svg).unwrap();
        assert_eq!((measured.width, measured.height), (180, 90));
    }

    #[test]
    fn test_rejects_html_containing_svg() {
        let html = br#"<html><body><svg width="10" height="10"></svg></body></html>"#;
        assert!(probe_image(html).is_err());
    }

    #[test]
    fn test_avif_is_unsupported() {
        let mut avif = vec![0u8, 0, 0, 0x1c];
        avif.extend_from_slice(b"ftypavif\0\0\0\0avifmif1miaf");
        assert!(matches!(probe_image(&avif), Err(MetaprobeError::ImageDecode(_))));
    }

    #[test]
    fn test_describe_svg() {
        let url = Url::parse("https://x.com/icon.svg").unwrap();
        let body = br#"<svg xmlns="http://www.w3.org/2000/svg" width="48" height="48"></svg>"#.to_vec();
        let len = body.len() as u64;
        let info = describe_image(&url, &resource(&url, "image/svg+xml", body)).unwrap();

        assert_eq!(info.format, "svg");
        assert_eq!((info.width, info.height), (Some(48), Some(48)));
        assert_eq!(info.size, len);
    }

    #[test]
    fn test_is_ico_url() {
        assert!(is_ico_url(&Url::parse("https://x.com/favicon.ico").unwrap()));
        assert!(is_ico_url(&Url::parse("https://x.com/FAVICON.ICO?v=2").unwrap()));
        assert!(!is_ico_url(&Url::parse("https://x.com/favicon.png").unwrap()));
        assert!(!is_ico_url(&Url::parse("https://x.com/ico").unwrap()));
    }

    #[test]
    fn test_describe_ico_skips_decoding() {
        let url = Url::parse("https://x.com/favicon.ico").unwrap();
        let info = describe_image(&url, &resource(&url, "text/html", vec![0u8; 2048])).unwrap();

        assert_eq!(info.format, "ico");
        assert_eq!(info.width, None);
        assert_eq!(info.height, None);
        assert_eq!(info.size, 2048);
        assert_eq!(info.size_pretty, "2.0 kB");
    }

    #[test]
    fn test_describe_rejects_non_image_content_type() {
        let url = Url::parse("https://x.com/photo.png").unwrap();
        let body = encode(4, 4, ImageFormat::Png);
        assert!(describe_image(&url, &resource(&url, "text/html; charset=utf-8", body)).is_none());
    }

    #[test]
    fn test_describe_rejects_undecodable_image() {
        let url = Url::parse("https://x.com/photo.png").unwrap();
        assert!(describe_image(&url, &resource(&url, "image/png", b"not a png".to_vec())).is_none());
    }

    #[test]
    fn test_image_info_serialization() {
        let info = ImageInfo {
            url: "https://x.com/a.png".to_string(),
            format: "png".to_string(),
            width: Some(1),
            height: Some(2),
            size: 3,
            size_pretty: "3.0 B".to_string(),
        };
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["type"], "png");
        assert_eq!(json["sizePretty"], "3.0 B");
        assert!(json.get("format").is_none());

        let legacy = r#"{"url":"u","type":"ico","width":null,"height":null,"size":1,"size_pretty":"1.0 B"}"#;
        let parsed: ImageInfo = serde_json::from_str(legacy).unwrap();
        assert_eq!(parsed.size_pretty, "1.0 B");
    }

    #[tokio::test]
    async fn test_enrich_png() {
        let server = MockServer::start_async().await;
        let png = encode(120, 80, ImageFormat::Png);
        let len = png.len() as u64;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/cover.png");
                then.status(200).header("content-type", "image/png").body(png);
            })
            .await;

        let config = FetchConfig::default();
        let client = build_client(&config).unwrap();
        let info = enrich_image(&client, &server.url("/cover.png"), &config).await.unwrap();

        assert_eq!(info.url, server.url("/cover.png"));
        assert_eq!(info.format, "png");
        assert_eq!(info.width, Some(120));
        assert_eq!(info.height, Some(80));
        assert_eq!(info.size, len);
        assert_eq!(info.size_pretty, format_bytes(len));
    }

    #[tokio::test]
    async fn test_enrich_reports_url_as_given() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/cover.png");
                then.status(200).header("content-type", "image/png").body(encode(2, 2, ImageFormat::Png));
            })
            .await;

        let given = server.url("/cover.png").replacen("http://", "HTTP://", 1);
        let config = FetchConfig::default();
        let client = build_client(&config).unwrap();
        let info = enrich_image(&client, &given, &config).await.unwrap();

        assert_eq!(info.url, given);
    }

    #[tokio::test]
    async fn test_enrich_ico() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/favicon.ico");
                then.status(200).header("content-type", "image/x-icon").body([1u8, 2, 3, 4, 5]);
            })
            .await;

        let config = FetchConfig::default();
        let client = build_client(&config).unwrap();
        let info = enrich_image(&client, &server.url("/favicon.ico"), &config).await.unwrap();

        assert_eq!(info.format, "ico");
        assert_eq!((info.width, info.height), (None, None));
        assert_eq!(info.size, 5);
    }

    #[tokio::test]
    async fn test_enrich_html_error_page() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/broken.jpg");
                then.status(200).header("content-type", "text/html").body("<html>Not here</html>");
            })
            .await;

        let config = FetchConfig::default();
        let client = build_client(&config).unwrap();
        assert!(enrich_image(&client, &server.url("/broken.jpg"), &config).await.is_none());
    }

    #[tokio::test]
    async fn test_enrich_error_status() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/gone.png");
                then.status(404);
            })
            .await;

        let config = FetchConfig::default();
        let client = build_client(&config).unwrap();
        assert!(enrich_image(&client, &server.url("/gone.png"), &config).await.is_none());
    }

    #[tokio::test]
    async fn test_enrich_unreachable() {
        let config = FetchConfig { image_timeout: 2, ..Default::default() };
        let client = build_client(&config).unwrap();
        assert!(enrich_image(&client, "http://127.0.0.1:1/x.png", &config).await.is_none());
        assert!(enrich_image(&client, "not a url", &config).await.is_none());
    }
}
