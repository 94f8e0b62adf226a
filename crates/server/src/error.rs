use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use metaprobe_core::MetaprobeError;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Missing url parameter")]
    MissingUrl,

    #[error(transparent)]
    Scrape(#[from] MetaprobeError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::MissingUrl => StatusCode::BAD_REQUEST,
            ApiError::Scrape(MetaprobeError::InvalidUrl(_)) => StatusCode::BAD_REQUEST,
            ApiError::Scrape(e) => {
                tracing::warn!(error = %e, "metadata request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use http_body_util::BodyExt;

    async fn body_json(body: Body) -> serde_json::Value {
        let bytes = body.collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn missing_url_returns_400() {
        let response = ApiError::MissingUrl.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response.into_body()).await;
        assert_eq!(json["error"], "Missing url parameter");
    }

    #[tokio::test]
    async fn invalid_url_returns_400() {
        let response = ApiError::from(MetaprobeError::InvalidUrl("ftp://x".into())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response.into_body()).await;
        assert_eq!(json["error"], "Invalid URL: ftp://x");
    }

    #[tokio::test]
    async fn fetch_failure_returns_500_with_message() {
        let err = MetaprobeError::HttpStatus { url: "https://x.com/".into(), status: 404 };
        let response = ApiError::from(err).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response.into_body()).await;
        assert_eq!(json["error"], "Request to https://x.com/ failed with status 404");
    }

    #[tokio::test]
    async fn timeout_returns_500() {
        let response = ApiError::from(MetaprobeError::Timeout { timeout: 15 }).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
