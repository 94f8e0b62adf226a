use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::Document;

/// Best-effort metadata found in a page's markup.
///
/// Every field is independently optional; absence is the normal outcome for
/// pages that do not declare a given property. URL-valued fields (`image`,
/// `audio`, `video`, `iframe`) are absolute http(s) URLs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Metadata {
    pub lang: Option<String>,
    pub author: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub audio: Option<String>,
    pub iframe: Option<String>,
    pub video: Option<String>,
    pub date: Option<String>,
}

/// Runs the scraping engine over `html` served from `base_url`.
///
/// Never fails: malformed markup only leaves fields empty. The parsed DOM
/// does not outlive this call.
pub fn extract_metadata(html: &str, base_url: &Url) -> Metadata {
    match Document::parse_with_base_url(html, base_url.clone()) {
        Ok(doc) => doc.extract_metadata(),
        Err(_) => Metadata::default(),
    }
}

impl Document {
    /// Extract title with priority fallback:
    /// 1. JSON-LD `headline`
    /// 2. Open Graph `og:title`
    /// 3. Twitter `twitter:title`
    /// 4. Meta `title` / `DC.title`
    /// 5. `<title>` element
    /// 6. First `<h1>` element
    pub fn extract_title(&self) -> Option<String> {
        if let Some(json_ld) = self.extract_json_ld()
            && let Some(headline) = json_ld.get("headline").and_then(Value::as_str)
            && let Some(title) = clean_text(headline)
        {
            return Some(title);
        }

        for key in ["og:title", "twitter:title", "title", "DC.title"] {
            if let Some(title) = self.get_meta_content(key) {
                return Some(title);
            }
        }

        if let Some(title) = self.title().as_deref().and_then(clean_text) {
            return Some(title);
        }

        self.first_text("h1")
    }

    /// Extract author with priority fallback:
    /// 1. JSON-LD `author.name`
    /// 2. Meta `author` / `DC.creator`, then `article:author` unless it is an http(s) URL
    /// 3. `[rel="author"]` link text
    /// 4. `[itemprop="author"]` content
    /// 5. Class/ID containing "author", "byline"
    pub fn extract_author(&self) -> Option<String> {
        if let Some(json_ld) = self.extract_json_ld()
            && let Some(author) = json_ld.get("author")
            && let Some(name) = Self::extract_author_from_json_ld(author)
        {
            return Some(name);
        }

        for key in ["author", "DC.creator"] {
            if let Some(author) = self.get_meta_content(key) {
                return Some(author);
            }
        }

        // article:author is often a profile link rather than a name
        if let Some(author) = self.get_meta_content("article:author")
            && !is_http_url(&author)
        {
            return Some(author);
        }

        if let Some(author) = self.first_text("[rel=\"author\"]") {
            return Some(author);
        }

        if let Some(author) = self.first_text("[itemprop=\"author\"]") {
            return Some(author);
        }

        let patterns = ["author", "byline", "by-author", "writer"];
        for pattern in &patterns {
            for selector in [format!("[class*=\"{}\"]", pattern), format!("[id*=\"{}\"]", pattern)] {
                if let Ok(elements) = self.select(&selector) {
                    for el in elements.iter().take(3) {
                        if let Some(text) = clean_text(&el.text())
                            && text.len() < 100
                        {
                            return Some(text);
                        }
                    }
                }
            }
        }

        None
    }

    /// Extract date with priority fallback:
    /// 1. JSON-LD `datePublished`
    /// 2. Meta `article:published_time`
    /// 3. `<time datetime="">` element
    /// 4. Meta `date` / `DC.date`
    /// 5. Modification dates (JSON-LD `dateModified`, `article:modified_time`, `og:updated_time`)
    pub fn extract_date(&self) -> Option<String> {
        let json_ld = self.extract_json_ld();

        if let Some(date) = json_ld
            .as_ref()
            .and_then(|v| v.get("datePublished"))
            .and_then(Value::as_str)
            .and_then(clean_text)
        {
            return Some(date);
        }

        if let Some(date) = self.get_meta_content("article:published_time") {
            return Some(date);
        }

        if let Ok(Some(time)) = self.select_first("time[datetime]")
            && let Some(datetime) = time.attr("datetime").and_then(clean_text)
        {
            return Some(datetime);
        }

        for key in ["date", "DC.date"] {
            if let Some(date) = self.get_meta_content(key) {
                return Some(date);
            }
        }

        if let Some(date) = json_ld
            .as_ref()
            .and_then(|v| v.get("dateModified"))
            .and_then(Value::as_str)
            .and_then(clean_text)
        {
            return Some(date);
        }

        ["article:modified_time", "og:updated_time"]
            .into_iter()
            .find_map(|key| self.get_meta_content(key))
    }

    /// Extract description with priority fallback:
    /// 1. JSON-LD `description`
    /// 2. Open Graph `og:description`, Twitter `twitter:description`
    /// 3. Meta `description` / `DC.description`
    /// 4. First paragraph of content
    pub fn extract_description(&self) -> Option<String> {
        if let Some(json_ld) = self.extract_json_ld()
            && let Some(desc) = json_ld.get("description").and_then(Value::as_str)
            && let Some(desc) = clean_text(desc)
        {
            return Some(desc);
        }

        for key in ["og:description", "twitter:description", "description", "DC.description"] {
            if let Some(desc) = self.get_meta_content(key) {
                return Some(desc);
            }
        }

        if let Ok(elements) = self.select("p") {
            for el in elements.iter().take(5) {
                if let Some(text) = clean_text(&el.text())
                    && text.chars().count() > 50
                {
                    let excerpt = if text.chars().count() > 300 {
                        format!("{}...", text.chars().take(300).collect::<String>())
                    } else {
                        text
                    };
                    return Some(excerpt);
                }
            }
        }

        None
    }

    /// Extract the page language as a two-letter ISO 639-1 code:
    /// 1. `<html lang="">`
    /// 2. Open Graph `og:locale`
    /// 3. `<meta http-equiv="content-language">`
    /// 4. JSON-LD `inLanguage`
    pub fn extract_lang(&self) -> Option<String> {
        if let Some(lang) = self.lang().and_then(normalize_lang) {
            return Some(lang);
        }

        if let Some(lang) = self.get_meta_content("og:locale").as_deref().and_then(normalize_lang) {
            return Some(lang);
        }

        if let Ok(Some(meta)) = self.select_first("meta[http-equiv=\"content-language\" i]")
            && let Some(lang) = meta.attr("content").and_then(normalize_lang)
        {
            return Some(lang);
        }

        self.extract_json_ld()
            .as_ref()
            .and_then(|v| v.get("inLanguage"))
            .and_then(Value::as_str)
            .and_then(normalize_lang)
    }

    /// Extract the representative image URL with priority fallback:
    /// 1. Open Graph `og:image:secure_url`, `og:image:url`, `og:image`
    /// 2. Twitter `twitter:image`, `twitter:image:src`
    /// 3. JSON-LD `image`
    /// 4. `<link rel="image_src">`, `[itemprop="image"]`
    /// 5. First image inside an `<article>`, then first image in the page
    pub fn extract_image(&self) -> Option<String> {
        for key in ["og:image:secure_url", "og:image:url", "og:image", "twitter:image", "twitter:image:src"] {
            if let Some(image) = self.get_meta_content(key).and_then(|href| self.absolute_http_url(&href)) {
                return Some(image);
            }
        }

        if let Some(json_ld) = self.extract_json_ld()
            && let Some(image) = json_ld.get("image").and_then(Self::extract_image_from_json_ld)
            && let Some(image) = self.absolute_http_url(&image)
        {
            return Some(image);
        }

        self.first_url_attr(&[
            ("link[rel=\"image_src\"]", "href"),
            ("[itemprop=\"image\"][content]", "content"),
            ("[itemprop=\"image\"][src]", "src"),
            ("article img[src]", "src"),
            ("img[src]", "src"),
        ])
    }

    /// Extract an audio stream URL from Open Graph tags or `<audio>` elements.
    pub fn extract_audio(&self) -> Option<String> {
        for key in ["og:audio:secure_url", "og:audio:url", "og:audio"] {
            if let Some(audio) = self.get_meta_content(key).and_then(|href| self.absolute_http_url(&href)) {
                return Some(audio);
            }
        }

        self.first_url_attr(&[("audio[src]", "src"), ("audio source[src]", "src")])
    }

    /// Extract a video URL from Open Graph/Twitter tags or `<video>` elements.
    pub fn extract_video(&self) -> Option<String> {
        for key in ["og:video:secure_url", "og:video:url", "og:video", "twitter:player:stream"] {
            if let Some(video) = self.get_meta_content(key).and_then(|href| self.absolute_http_url(&href)) {
                return Some(video);
            }
        }

        self.first_url_attr(&[("video[src]", "src"), ("video source[src]", "src")])
    }

    /// Extract an embeddable player URL:
    /// 1. Twitter `twitter:player`
    /// 2. Open Graph video when `og:video:type` is `text/html`
    pub fn extract_iframe(&self) -> Option<String> {
        if let Some(player) = self
            .get_meta_content("twitter:player")
            .and_then(|href| self.absolute_http_url(&href))
        {
            return Some(player);
        }

        let is_html_player = self
            .get_meta_content("og:video:type")
            .is_some_and(|kind| kind.eq_ignore_ascii_case("text/html"));
        if !is_html_player {
            return None;
        }

        ["og:video:secure_url", "og:video:url", "og:video"]
            .into_iter()
            .find_map(|key| self.get_meta_content(key).and_then(|href| self.absolute_http_url(&href)))
    }

    /// Extract all metadata at once
    pub fn extract_metadata(&self) -> Metadata {
        Metadata {
            lang: self.extract_lang(),
            author: self.extract_author(),
            title: self.extract_title(),
            description: self.extract_description(),
            image: self.extract_image(),
            audio: self.extract_audio(),
            iframe: self.extract_iframe(),
            video: self.extract_video(),
            date: self.extract_date(),
        }
    }

    /// Get meta tag content by name, property or itemprop attribute
    fn get_meta_content(&self, attr: &str) -> Option<String> {
        for key in ["name", "property", "itemprop"] {
            let selector = format!("meta[{}=\"{}\"]", key, attr);
            if let Ok(elements) = self.select(&selector) {
                for el in elements {
                    if let Some(content) = el.attr("content").and_then(clean_text) {
                        return Some(content);
                    }
                }
            }
        }

        None
    }

    /// First non-blank text of an element matching `selector`
    fn first_text(&self, selector: &str) -> Option<String> {
        self.select(selector)
            .ok()?
            .iter()
            .find_map(|el| clean_text(&el.text()))
    }

    /// First attribute value, across selectors in order, that resolves to an http(s) URL
    fn first_url_attr(&self, candidates: &[(&str, &str)]) -> Option<String> {
        candidates.iter().find_map(|(selector, attr)| {
            self.select(selector)
                .ok()?
                .iter()
                .find_map(|el| el.attr(attr).and_then(|href| self.absolute_http_url(href)))
        })
    }

    fn absolute_http_url(&self, href: &str) -> Option<String> {
        self.resolve_url(href)
            .filter(|url| matches!(url.scheme(), "http" | "https"))
            .map(String::from)
    }

    /// Extract and parse JSON-LD from script tags
    fn extract_json_ld(&self) -> Option<Value> {
        let elements = self.select("script[type=\"application/ld+json\"]").ok()?;
        elements.iter().find_map(|el| {
            let value = serde_json::from_str::<Value>(el.text().trim()).ok()?;
            Self::primary_json_ld_object(value)
        })
    }

    /// Picks the main entity out of a JSON-LD payload: the object itself, the
    /// first object of a top-level array, or the first `@graph` entry that looks
    /// like content rather than site chrome.
    fn primary_json_ld_object(value: Value) -> Option<Value> {
        match value {
            Value::Array(items) => items.into_iter().find(Value::is_object),
            Value::Object(obj) => {
                if let Some(graph) = obj.get("@graph").and_then(Value::as_array) {
                    return graph
                        .iter()
                        .find(|node| node.get("headline").is_some() || node.get("datePublished").is_some())
                        .or_else(|| graph.iter().find(|node| node.is_object()))
                        .cloned();
                }
                Some(Value::Object(obj))
            }
            _ => None,
        }
    }

    /// Extract author name from JSON-LD author field
    /// Handles both string and object formats
    fn extract_author_from_json_ld(author: &Value) -> Option<String> {
        if let Some(name) = author.as_str() {
            return clean_text(name);
        }

        if let Some(name) = author.get("name").and_then(Value::as_str) {
            return clean_text(name);
        }

        if let Some(first) = author.as_array().and_then(|arr| arr.first()) {
            return Self::extract_author_from_json_ld(first);
        }

        None
    }

    /// JSON-LD `image` may be a URL string, an ImageObject, or a list of either
    fn extract_image_from_json_ld(image: &Value) -> Option<String> {
        if let Some(url) = image.as_str() {
            return Some(url.to_string());
        }

        if let Some(url) = image.get("url").and_then(Value::as_str) {
            return Some(url.to_string());
        }

        image
            .as_array()
            .and_then(|arr| arr.first())
            .and_then(Self::extract_image_from_json_ld)
    }
}

/// Trim and collapse internal whitespace; blank input becomes `None`
fn clean_text(text: &str) -> Option<String> {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() { None } else { Some(collapsed) }
}

fn is_http_url(value: &str) -> bool {
    Url::parse(value).is_ok_and(|url| matches!(url.scheme(), "http" | "https"))
}

static LANG_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([A-Za-z]{2})(?:[-_][A-Za-z0-9_-]*)?\s*$").expect("language tag pattern is valid")
});

/// Reduce a language tag like `en-US` or `pt_BR` to its ISO 639-1 code
fn normalize_lang(tag: &str) -> Option<String> {
    LANG_TAG
        .captures(tag)
        .and_then(|caps| caps.get(1))
        .map(|code| code.as_str().to_ascii_lowercase())
}
