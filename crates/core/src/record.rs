//! The canonical metadata record returned by the pipeline.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::enrich::ImageInfo;
use crate::metadata::Metadata;
use crate::{MetaprobeError, Result};

/// Language reported when nothing better is known.
pub const DEFAULT_LANG: &str = "en";

/// Metadata describing one URL.
///
/// `url` is the location after redirects and `publisher` is always its host,
/// never a value read from the page. Serialises with every key present;
/// missing values are `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataRecord {
    pub lang: String,
    pub author: Option<String>,
    pub title: Option<String>,
    pub publisher: String,
    pub image: Option<ImageInfo>,
    pub date: Option<String>,
    pub description: Option<String>,
    pub url: String,
    pub audio: Option<String>,
    pub logo: Option<ImageInfo>,
    pub iframe: Option<String>,
    pub video: Option<String>,
}

impl MetadataRecord {
    /// Record for a URL that served an image directly.
    ///
    /// The title is the last path segment of `final_url`; there is no page
    /// chrome, so author, description, media and logo stay empty.
    pub fn for_image(final_url: &Url, image: Option<ImageInfo>, last_modified: Option<String>) -> Self {
        Self {
            lang: DEFAULT_LANG.to_string(),
            author: None,
            title: last_path_segment(final_url),
            publisher: publisher_of(final_url),
            image,
            date: last_modified,
            description: None,
            url: final_url.to_string(),
            audio: None,
            logo: None,
            iframe: None,
            video: None,
        }
    }

    /// Record for an HTML document.
    ///
    /// Engine fields are taken as-is except `lang`, which defaults to `"en"`,
    /// and `date`, which falls back to the `Last-Modified` header.
    pub fn for_document(
        final_url: &Url,
        metadata: Metadata,
        image: Option<ImageInfo>,
        logo: Option<ImageInfo>,
        last_modified: Option<String>,
    ) -> Self {
        Self {
            lang: metadata.lang.unwrap_or_else(|| DEFAULT_LANG.to_string()),
            author: metadata.author,
            title: metadata.title,
            publisher: publisher_of(final_url),
            image,
            date: metadata.date.or(last_modified),
            description: metadata.description,
            url: final_url.to_string(),
            audio: metadata.audio,
            logo,
            iframe: metadata.iframe,
            video: metadata.video,
        }
    }

    /// Renders the record as JSON, pretty-printed or on a single line.
    pub fn to_json(&self, pretty: bool) -> Result<String> {
        let json = if pretty { serde_json::to_string_pretty(self) } else { serde_json::to_string(self) };
        json.map_err(MetaprobeError::from)
    }
}

/// Hostname of `url`, or an empty string for host-less URLs.
pub fn publisher_of(url: &Url) -> String {
    url.host_str().unwrap_or_default().to_string()
}

/// Last non-empty path segment of `url`.
pub fn last_path_segment(url: &Url) -> Option<String> {
    url.path_segments()?
        .rev()
        .find(|segment| !segment.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image() -> ImageInfo {
        ImageInfo {
            url: "https://img.example.com/a.png".to_string(),
            format: "png".to_string(),
            width: Some(10),
            height: Some(20),
            size: 2048,
            size_pretty: "2.0 kB".to_string(),
        }
    }

    #[test]
    fn test_last_path_segment() {
        let seg = |u: &str| last_path_segment(&Url::parse(u).unwrap());
        assert_eq!(seg("https://x.com/a/b/photo.jpg"), Some("photo.jpg".to_string()));
        assert_eq!(seg("https://x.com/a/photo.jpg?w=100"), Some("photo.jpg".to_string()));
        assert_eq!(seg("https://x.com/images/"), Some("images".to_string()));
        assert_eq!(seg("https://x.com/"), None);
    }

    #[test]
    fn test_record_for_image() {
        let url = Url::parse("https://cdn.example.com/pics/cat.png").unwrap();
        let record = MetadataRecord::for_image(&url, Some(image()), Some("Tue, 01 Jan 2019 00:00:00 GMT".into()));

        assert_eq!(record.lang, "en");
        assert_eq!(record.title.as_deref(), Some("cat.png"));
        assert_eq!(record.publisher, "cdn.example.com");
        assert_eq!(record.date.as_deref(), Some("Tue, 01 Jan 2019 00:00:00 GMT"));
        assert_eq!(record.description, None);
        assert_eq!(record.logo, None);
        assert_eq!(record.url, "https://cdn.example.com/pics/cat.png");
    }

    #[test]
    fn test_record_for_document_defaults() {
        let url = Url::parse("https://news.example.org/story").unwrap();
        let record = MetadataRecord::for_document(&url, Metadata::default(), None, None, Some("yesterday".into()));

        assert_eq!(record.lang, "en");
        assert_eq!(record.publisher, "news.example.org");
        assert_eq!(record.date.as_deref(), Some("yesterday"));
        assert_eq!(record.title, None);
    }

    #[test]
    fn test_record_for_document_prefers_engine_date() {
        let url = Url::parse("https://news.example.org/story").unwrap();
        let metadata = Metadata {
            lang: Some("fr".to_string()),
            date: Some("2024-01-01".to_string()),
            title: Some("Titre".to_string()),
            ..Default::default()
        };
        let record = MetadataRecord::for_document(&url, metadata, Some(image()), None, Some("yesterday".into()));

        assert_eq!(record.lang, "fr");
        assert_eq!(record.date.as_deref(), Some("2024-01-01"));
        assert_eq!(record.title.as_deref(), Some("Titre"));
        assert_eq!(record.image, Some(image()));
    }

    #[test]
    fn test_json_has_every_key() {
        let url = Url::parse("https://x.com/").unwrap();
        let record = MetadataRecord::for_document(&url, Metadata::default(), None, None, None);
        let json: serde_json::Value = serde_json::from_str(&record.to_json(false).unwrap()).unwrap();

        for key in [
            "lang", "author", "title", "publisher", "image", "date", "description", "url", "audio", "logo", "iframe",
            "video",
        ] {
            assert!(json.get(key).is_some(), "missing key {key}");
        }
        assert!(json["image"].is_null());
        assert_eq!(json["publisher"], "x.com");
    }

    #[test]
    fn test_pretty_json() {
        let url = Url::parse("https://x.com/a.png").unwrap();
        let record = MetadataRecord::for_image(&url, Some(image()), None);
        let pretty = record.to_json(true).unwrap();

        assert!(pretty.contains('\n'));
        assert!(pretty.contains("\"sizePretty\": \"2.0 kB\""));
        let back: MetadataRecord = serde_json::from_str(&pretty).unwrap();
        assert_eq!(back, record);
    }
}
