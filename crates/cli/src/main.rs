mod echo;

use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use metaprobe_core::{Scraper, ScraperConfig, extract_metadata, favicon_url, format_bytes, read_file, read_stdin};
use owo_colors::OwoColorize;
use url::Url;

use crate::echo::*;

pub(crate) const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Output format for extracted metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Json,
    Text,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "text" | "txt" => Ok(Self::Text),
            _ => Err(format!("Invalid format: {}. Valid options: json, text", s)),
        }
    }
}

/// Extract link metadata, images and favicons from web pages
#[derive(Parser, Debug)]
#[command(name = "metaprobe")]
#[command(author = "Metaprobe Contributors")]
#[command(version = VERSION)]
#[command(about = "Extract link metadata from web pages", long_about = None)]
struct Args {
    /// URL to scrape, local HTML file, or "-" for stdin
    #[arg(value_name = "INPUT")]
    input: String,

    /// Output file (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Output format (json, text)
    #[arg(short, long, default_value = "json", value_name = "FORMAT")]
    format: OutputFormat,

    /// Print JSON on a single line
    #[arg(long)]
    compact: bool,

    /// Base URL for resolving relative links in local input
    #[arg(long, default_value = "http://localhost/", value_name = "URL")]
    base_url: String,

    /// Page fetch timeout in seconds
    #[arg(long, default_value = "15", value_name = "SECS")]
    timeout: u64,

    /// Image and favicon fetch timeout in seconds
    #[arg(long, default_value = "10", value_name = "SECS")]
    image_timeout: u64,

    /// Custom User-Agent for HTTP requests
    #[arg(long, value_name = "UA")]
    user_agent: Option<String>,

    /// Show progress on stderr
    #[arg(short, long)]
    verbose: bool,
}

fn is_remote(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

fn read_local(input: &str) -> anyhow::Result<String> {
    if input == "-" {
        read_stdin().context("Failed to read from stdin")
    } else {
        read_file(input).with_context(|| format!("Failed to read file: {}", input))
    }
}

async fn scrape_remote(args: &Args) -> anyhow::Result<String> {
    if args.verbose {
        print_step(1, 2, &format!("Scraping {}", args.input.bright_white().underline()));
    }

    let mut builder = ScraperConfig::builder()
        .timeout(args.timeout)
        .image_timeout(args.image_timeout);
    if let Some(ua) = &args.user_agent {
        builder = builder.user_agent(ua.as_str());
    }

    let scraper = Scraper::with_config(builder.build()).context("Failed to build HTTP client")?;
    let started = Instant::now();
    let record = scraper.scrape(&args.input).await.context("Failed to scrape URL")?;

    if args.verbose {
        print_timing("Scrape", started.elapsed());
        print_record_summary(&record);
        print_step(2, 2, "Rendering output");
    }

    match args.format {
        OutputFormat::Json => record.to_json(!args.compact).context("Failed to serialize record"),
        OutputFormat::Text => Ok(render_record(&record)),
    }
}

fn extract_local(args: &Args) -> anyhow::Result<String> {
    if args.verbose {
        let source = if args.input == "-" { "stdin" } else { args.input.as_str() };
        print_step(1, 2, &format!("Reading from {}", source.bright_white()));
    }

    let base_url = Url::parse(&args.base_url).with_context(|| format!("Invalid base URL: {}", args.base_url))?;
    let html = read_local(&args.input)?;

    if args.verbose {
        print_detail("Size", &format_bytes(html.len() as u64));
        print_info(&format!("Resolving relative links against {}", base_url));
        print_step(2, 2, "Extracting metadata");
    }

    let metadata = extract_metadata(&html, &base_url);
    let favicon = favicon_url(&html, base_url.as_str());

    if args.verbose && metadata.title.is_none() {
        print_warning("No title found");
    }

    match args.format {
        OutputFormat::Json => {
            let value = serde_json::json!({
                "url": base_url.as_str(),
                "favicon": favicon.as_ref().map(Url::as_str),
                "metadata": metadata,
            });
            let rendered = if args.compact {
                serde_json::to_string(&value)
            } else {
                serde_json::to_string_pretty(&value)
            };
            rendered.context("Failed to serialize metadata")
        }
        OutputFormat::Text => Ok(render_metadata(&metadata, &base_url, favicon.as_ref())),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.verbose {
        print_banner();
    }

    let output = if is_remote(&args.input) { scrape_remote(&args).await? } else { extract_local(&args)? };

    match &args.output {
        Some(path) => {
            fs::write(path, &output).with_context(|| format!("Failed to write to file: {}", path.display()))?;
            print_success(&format!("Output written to {}", path.display().bright_white()));
        }
        None => {
            if output.ends_with('\n') {
                print!("{}", output);
            } else {
                println!("{}", output);
            }
        }
    }

    Ok(())
}
