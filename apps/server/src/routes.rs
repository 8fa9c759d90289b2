//! HTTP routes: request validation, the scrape endpoint, liveness,
//! and the landing page. Everything here is thin plumbing around
//! [`Pipeline`]; the endpoint never fails for scrape-time problems,
//! only for an invalid request URL.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::cors::{Any, CorsLayer};
use url::Url;

use sitescope_pipeline::Pipeline;
use sitescope_shared::{Result, SitescopeError};

/// Static informational landing page.
const INDEX_HTML: &str = include_str!("../assets/index.html");

/// Shared per-process state: one pipeline serving all requests.
pub struct AppState {
    pub pipeline: Pipeline,
}

/// Build the axum Router with all endpoints and a permissive CORS
/// layer (the API may be called from a separate SPA).
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index))
        .route("/healthz", get(healthz))
        .route("/scrape", post(scrape))
        .layer(cors)
        .with_state(state)
}

/// Body of a `POST /scrape` request.
#[derive(Debug, Deserialize)]
pub struct ScrapeRequest {
    pub url: String,
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn healthz() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn scrape(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ScrapeRequest>,
) -> Response {
    let url = match validate_url(&request.url) {
        Ok(url) => url,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "detail": e.to_string() })),
            )
                .into_response();
        }
    };

    let result = state.pipeline.run(&url).await;
    Json(json!({ "result": result })).into_response()
}

/// Accept only absolute http(s) URLs; anything else is a client error
/// answered before any pipeline work begins.
pub fn validate_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw).map_err(|e| SitescopeError::invalid_url(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(SitescopeError::invalid_url(format!(
            "unsupported URL scheme '{other}': only http(s) URLs are supported"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_http_and_https() {
        assert!(validate_url("http://example.com/").is_ok());
        assert!(validate_url("https://example.com/deep/path?q=1").is_ok());
    }

    #[test]
    fn rejects_other_schemes_with_an_invalid_url_error() {
        let err = validate_url("ftp://example.com/").unwrap_err();
        assert!(matches!(err, SitescopeError::InvalidUrl { .. }));
        assert!(err.to_string().contains("ftp"));

        let err = validate_url("file:///etc/passwd").unwrap_err();
        assert!(err.to_string().contains("file"));
    }

    #[test]
    fn rejects_relative_and_malformed_urls() {
        assert!(validate_url("/just/a/path").is_err());
        assert!(validate_url("not a url").is_err());
        assert!(validate_url("").is_err());
    }

    #[tokio::test]
    async fn healthz_answers_ok() {
        let Json(body) = healthz().await;
        assert_eq!(body["status"], "ok");
    }

    #[test]
    fn landing_page_is_embedded() {
        assert!(INDEX_HTML.contains("sitescope"));
        assert!(INDEX_HTML.contains("/scrape"));
    }
}
