//! Static document fetcher.
//!
//! One bounded GET with redirect following and a browser-like
//! User-Agent. Failures never escape this module: they are recorded as
//! fetch-phase [`ErrorRecord`]s and yield empty markup, letting the
//! orchestrator escalate to the rendered path.

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, warn};
use url::Url;

use sitescope_shared::{ErrorRecord, Result, ScrapeConfig, SitescopeError};

/// Build the shared HTTP client from the scrape configuration.
pub fn build_client(config: &ScrapeConfig) -> Result<Client> {
    Client::builder()
        .user_agent(&config.user_agent)
        .redirect(reqwest::redirect::Policy::limited(10))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .build()
        .map_err(|e| SitescopeError::Client(format!("failed to build HTTP client: {e}")))
}

/// Fetch raw markup for `url`. Any transport error or non-2xx status
/// appends a fetch-phase error and returns empty markup.
pub async fn fetch_static(client: &Client, url: &Url, errors: &mut Vec<ErrorRecord>) -> String {
    match try_fetch(client, url).await {
        Ok(body) => {
            debug!(%url, bytes = body.len(), "static fetch succeeded");
            body
        }
        Err(message) => {
            warn!(%url, %message, "static fetch failed");
            errors.push(ErrorRecord::fetch(format!("Static fetch failed: {message}")));
            String::new()
        }
    }
}

async fn try_fetch(client: &Client, url: &Url) -> std::result::Result<String, String> {
    let response = client
        .get(url.as_str())
        .send()
        .await
        .map_err(|e| e.to_string())?;

    let status = response.status();
    if !status.is_success() {
        return Err(format!("HTTP {status}"));
    }

    response
        .text()
        .await
        .map_err(|e| format!("body read failed: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{headers, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config() -> ScrapeConfig {
        ScrapeConfig::default()
    }

    #[tokio::test]
    async fn successful_fetch_returns_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>hi</html>"))
            .mount(&server)
            .await;

        let client = build_client(&test_config()).unwrap();
        let url = Url::parse(&format!("{}/page", server.uri())).unwrap();
        let mut errors = Vec::new();

        let body = fetch_static(&client, &url, &mut errors).await;
        assert_eq!(body, "<html>hi</html>");
        assert!(errors.is_empty());
    }

    #[tokio::test]
    async fn sends_configured_user_agent() {
        let server = MockServer::start().await;
        let config = test_config();
        Mock::given(method("GET"))
            // wiremock's `header` matcher splits values on commas, so the
            // comma in the browser-like UA needs the multi-value form.
            .and(headers(
                "user-agent",
                config.user_agent.split(',').map(str::trim).collect(),
            ))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(1)
            .mount(&server)
            .await;

        let client = build_client(&config).unwrap();
        let url = Url::parse(&server.uri()).unwrap();
        let mut errors = Vec::new();

        fetch_static(&client, &url, &mut errors).await;
        assert!(errors.is_empty());
    }

    #[tokio::test]
    async fn non_success_status_is_recorded() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = build_client(&test_config()).unwrap();
        let url = Url::parse(&server.uri()).unwrap();
        let mut errors = Vec::new();

        let body = fetch_static(&client, &url, &mut errors).await;
        assert!(body.is_empty());
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].phase, sitescope_shared::ErrorPhase::Fetch);
        assert!(errors[0].message.contains("503"));
    }

    #[tokio::test]
    async fn unreachable_host_is_recorded() {
        let client = build_client(&test_config()).unwrap();
        // Port 1 refuses connections immediately.
        let url = Url::parse("http://127.0.0.1:1/").unwrap();
        let mut errors = Vec::new();

        let body = fetch_static(&client, &url, &mut errors).await;
        assert!(body.is_empty());
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.starts_with("Static fetch failed"));
    }

    #[tokio::test]
    async fn redirects_are_followed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/old"))
            .respond_with(
                ResponseTemplate::new(301).insert_header("location", "/new"),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/new"))
            .respond_with(ResponseTemplate::new(200).set_body_string("moved here"))
            .mount(&server)
            .await;

        let client = build_client(&test_config()).unwrap();
        let url = Url::parse(&format!("{}/old", server.uri())).unwrap();
        let mut errors = Vec::new();

        let body = fetch_static(&client, &url, &mut errors).await;
        assert_eq!(body, "moved here");
        assert!(errors.is_empty());
    }
}
