pub mod enrich;
pub mod error;
pub mod favicon;
pub mod fetch;
pub mod metadata;
pub mod parse;
pub mod pipeline;
pub mod record;
pub mod size;

pub use enrich::{ICO_FORMAT, ImageInfo, ProbedImage, SVG_FORMAT, describe_image, enrich_image, probe_image};
pub use error::{MetaprobeError, Result};
pub use favicon::{detect_favicon, favicon_url};
pub use fetch::{FetchConfig, FetchedResource, build_client, fetch_resource, read_file, read_stdin};
pub use metadata::{Metadata, extract_metadata};
pub use parse::Document;
pub use pipeline::{Scraper, ScraperConfig, ScraperConfigBuilder, Stage, scrape};
pub use record::MetadataRecord;
pub use size::format_bytes;
