use std::fmt::Write as _;

use metaprobe_core::{ImageInfo, Metadata, MetadataRecord};
use owo_colors::OwoColorize;
use url::Url;

use crate::VERSION;

/// Print a styled banner for verbose mode
pub fn print_banner() {
    eprintln!(
        "\n{} {} {}",
        "Metaprobe".bold().bright_blue(),
        "v".dimmed(),
        VERSION.dimmed()
    );
    eprintln!("{}", "Extract link metadata from web pages\n".dimmed());
}

/// Print a styled step message
pub fn print_step(step: usize, total: usize, message: &str) {
    eprintln!("{} {}", format!("[{}/{}]", step, total).dimmed(), message.bright_cyan());
}

/// Print a success message
pub fn print_success(message: &str) {
    eprintln!("{} {}", "✓".green(), message.bright_green());
}

/// Print an info message
pub fn print_info(message: &str) {
    eprintln!("{} {}", "ℹ".blue(), message.bright_blue());
}

/// Print a warning message
pub fn print_warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow(), message.bright_yellow());
}

/// Print a labelled detail line
pub fn print_detail(label: &str, value: &str) {
    eprintln!("  {} {}", format!("{}:", label).dimmed(), value.bright_white());
}

/// Print timing information with color coding
pub fn print_timing(label: &str, duration: std::time::Duration) {
    let ms = duration.as_secs_f64() * 1000.0;
    let label = format!("{}:", label);

    if ms < 500.0 {
        eprintln!("  {} {:>8.2}ms ({})", label.dimmed(), ms, "fast".dimmed());
    } else if ms < 2000.0 {
        eprintln!("  {} {:>8.2}ms ({})", label.dimmed(), ms, "moderate".bright_yellow());
    } else {
        eprintln!("  {} {:>8.2}ms ({})", label.dimmed(), ms, "slow".bright_red());
    }
}

/// Print a short summary of a scraped record
pub fn print_record_summary(record: &MetadataRecord) {
    eprintln!("\n{}", "═".repeat(60).dimmed());
    eprintln!("{}", "Record Summary".bold().cyan());
    eprintln!("{}", "═".repeat(60).dimmed());
    print_detail("Final URL", &record.url);
    print_detail("Publisher", &record.publisher);
    if let Some(title) = &record.title {
        print_detail("Title", title);
    }
    print_detail("Image", &describe_image(record.image.as_ref()));
    print_detail("Logo", &describe_image(record.logo.as_ref()));
    eprintln!();
}

/// Render a record as plain `key: value` lines
pub fn render_record(record: &MetadataRecord) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "url: {}", record.url);
    let _ = writeln!(out, "publisher: {}", record.publisher);
    let _ = writeln!(out, "lang: {}", record.lang);
    push_optional(&mut out, "title", record.title.as_deref());
    push_optional(&mut out, "author", record.author.as_deref());
    push_optional(&mut out, "date", record.date.as_deref());
    push_optional(&mut out, "description", record.description.as_deref());
    let _ = writeln!(out, "image: {}", describe_image(record.image.as_ref()));
    let _ = writeln!(out, "logo: {}", describe_image(record.logo.as_ref()));
    push_optional(&mut out, "audio", record.audio.as_deref());
    push_optional(&mut out, "video", record.video.as_deref());
    push_optional(&mut out, "iframe", record.iframe.as_deref());
    out
}

/// Render offline engine output as plain `key: value` lines
pub fn render_metadata(metadata: &Metadata, base_url: &Url, favicon: Option<&Url>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "url: {}", base_url);
    push_optional(&mut out, "lang", metadata.lang.as_deref());
    push_optional(&mut out, "title", metadata.title.as_deref());
    push_optional(&mut out, "author", metadata.author.as_deref());
    push_optional(&mut out, "date", metadata.date.as_deref());
    push_optional(&mut out, "description", metadata.description.as_deref());
    push_optional(&mut out, "image", metadata.image.as_deref());
    push_optional(&mut out, "favicon", favicon.map(Url::as_str));
    push_optional(&mut out, "audio", metadata.audio.as_deref());
    push_optional(&mut out, "video", metadata.video.as_deref());
    push_optional(&mut out, "iframe", metadata.iframe.as_deref());
    out
}

fn push_optional(out: &mut String, key: &str, value: Option<&str>) {
    let _ = writeln!(out, "{}: {}", key, value.unwrap_or("-"));
}

fn describe_image(image: Option<&ImageInfo>) -> String {
    match image {
        Some(info) => match (info.width, info.height) {
            (Some(w), Some(h)) => format!("{} ({}, {}x{}, {})", info.url, info.format, w, h, info.size_pretty),
            _ => format!("{} ({}, {})", info.url, info.format, info.size_pretty),
        },
        None => "-".to_string(),
    }
}
