use std::sync::Arc;

use metaprobe_core::Scraper;

/// Shared application state passed to all handlers.
/// One scraper, and so one connection pool, serves every request.
#[derive(Clone)]
pub struct AppState {
    pub scraper: Arc<Scraper>,
}

impl AppState {
    pub fn new(scraper: Scraper) -> Self {
        Self { scraper: Arc::new(scraper) }
    }
}
