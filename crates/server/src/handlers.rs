use axum::Json;
use axum::extract::{Query, State};
use metaprobe_core::MetadataRecord;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct MetadataQuery {
    pub url: Option<String>,
}

/// GET /metadata?url=...
pub async fn metadata(
    State(state): State<AppState>,
    Query(query): Query<MetadataQuery>,
) -> ApiResult<Json<MetadataRecord>> {
    let url = query
        .url
        .as_deref()
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .ok_or(ApiError::MissingUrl)?;

    let record = state.scraper.scrape(url).await?;
    Ok(Json(record))
}

/// GET /health
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
