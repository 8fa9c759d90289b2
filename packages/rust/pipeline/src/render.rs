//! Rendered fallback: drive a headless browser through a fixed
//! interaction script before capturing the settled markup.
//!
//! The script order is deliberate and non-adaptive — tabs, then "load
//! more" buttons, then scroll passes, then pagination — because later
//! steps assume earlier ones already ran even if they found nothing.
//! Every step is individually bounded and non-fatal; only a failure of
//! the session itself (connect, navigate, capture) yields empty markup.

use std::time::Duration;

use fantoccini::elements::Element;
use fantoccini::{Client, ClientBuilder, Locator};
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};
use url::Url;

use sitescope_shared::{ErrorRecord, InteractionTrace, ScrapeConfig};

/// Button labels probed for "load more" affordances, in probe order.
const LOAD_MORE_LABELS: &[&str] = &["Load more", "Show more", "More"];

/// Controls exposing a tab role.
const TAB_SELECTOR: &str = "[role='tab']";

/// Next-page link candidates: rel=next, visible "Next", or "›".
const NEXT_PAGE_XPATH: &str =
    "//a[@rel='next'] | //a[contains(normalize-space(.), 'Next')] | //a[contains(., '›')]";

/// Navigate, run the interaction script, and return the settled markup.
///
/// A session-level failure appends one render-phase error and returns
/// empty markup; the caller keeps whatever static result it already
/// had. The browser session is closed on every path.
pub async fn fetch_rendered(
    config: &ScrapeConfig,
    url: &Url,
    trace: &mut InteractionTrace,
    errors: &mut Vec<ErrorRecord>,
) -> String {
    let client = match connect(config).await {
        Ok(client) => client,
        Err(message) => {
            warn!(%url, %message, "rendered fetch failed");
            errors.push(ErrorRecord::render(format!("Rendering failed: {message}")));
            return String::new();
        }
    };

    let html = match drive(&client, config, url, trace, errors).await {
        Ok(html) => html,
        Err(message) => {
            warn!(%url, %message, "rendered fetch failed");
            errors.push(ErrorRecord::render(format!("Rendering failed: {message}")));
            String::new()
        }
    };

    if let Err(e) = client.close().await {
        warn!(error = %e, "failed to close browser session");
    }

    html
}

/// Open an isolated session carrying the configured User-Agent.
async fn connect(config: &ScrapeConfig) -> Result<Client, String> {
    let mut caps = serde_json::map::Map::new();
    caps.insert(
        "goog:chromeOptions".to_string(),
        serde_json::json!({
            "args": [
                "--headless=new",
                "--disable-gpu",
                format!("--user-agent={}", config.user_agent),
            ],
        }),
    );

    ClientBuilder::native()
        .capabilities(caps)
        .connect(&config.webdriver_url)
        .await
        .map_err(|e| format!("WebDriver connect to {} failed: {e}", config.webdriver_url))
}

async fn drive(
    client: &Client,
    config: &ScrapeConfig,
    url: &Url,
    trace: &mut InteractionTrace,
    errors: &mut Vec<ErrorRecord>,
) -> Result<String, String> {
    let navigation_bound = Duration::from_millis(config.navigation_timeout_ms);

    timeout(navigation_bound, client.goto(url.as_str()))
        .await
        .map_err(|_| format!("navigation to {url} timed out"))?
        .map_err(|e| format!("navigation to {url} failed: {e}"))?;

    // The landed URL replaces the requested one as the first page entry.
    if let Ok(current) = client.current_url().await {
        trace.pages = vec![current.to_string()];
    }

    click_tabs(client, config, trace, errors).await;
    click_load_more(client, config, trace, errors).await;
    scroll_to_bottom(client, config, trace, errors).await;
    follow_pagination(client, config, trace, errors).await;

    client
        .source()
        .await
        .map_err(|e| format!("markup capture failed: {e}"))
}

/// Click up to `max_tab_clicks` tab controls, settling after each.
/// A failed click is recorded and does not abort the remaining tabs.
async fn click_tabs(
    client: &Client,
    config: &ScrapeConfig,
    trace: &mut InteractionTrace,
    errors: &mut Vec<ErrorRecord>,
) {
    let tabs = match client.find_all(Locator::Css(TAB_SELECTOR)).await {
        Ok(tabs) => tabs,
        Err(e) => {
            errors.push(ErrorRecord::render(format!("Tab discovery failed: {e}")));
            return;
        }
    };

    for tab in tabs.into_iter().take(config.max_tab_clicks) {
        let label = control_label(&tab, config.click_label_chars).await;
        trace.clicks.push(format!("tab:{label}"));

        if let Err(e) = tab.click().await {
            errors.push(ErrorRecord::render(format!("Tab click failed: {e}")));
            continue;
        }
        sleep(Duration::from_millis(config.tab_settle_ms)).await;
    }
}

/// Probe each "load more" label once; absence is silent, a failed click
/// is recorded.
async fn click_load_more(
    client: &Client,
    config: &ScrapeConfig,
    trace: &mut InteractionTrace,
    errors: &mut Vec<ErrorRecord>,
) {
    for label in LOAD_MORE_LABELS {
        let xpath = format!("//button[contains(normalize-space(.), '{label}')]");
        let found = match client.find_all(Locator::XPath(&xpath)).await {
            Ok(found) => found,
            Err(e) => {
                errors.push(ErrorRecord::render(format!(
                    "Load more lookup \"{label}\" failed: {e}"
                )));
                continue;
            }
        };
        let Some(button) = found.into_iter().next() else {
            continue;
        };

        trace.clicks.push(format!("button:{label}"));
        if let Err(e) = button.click().await {
            errors.push(ErrorRecord::render(format!(
                "Load more click \"{label}\" failed: {e}"
            )));
            continue;
        }
        sleep(Duration::from_millis(config.load_more_settle_ms)).await;
    }
}

/// Simulate infinite scroll: the counter increments on every pass,
/// whether or not the page reacted.
async fn scroll_to_bottom(
    client: &Client,
    config: &ScrapeConfig,
    trace: &mut InteractionTrace,
    errors: &mut Vec<ErrorRecord>,
) {
    for _ in 0..config.scroll_passes {
        if let Err(e) = client
            .execute("window.scrollTo(0, document.body.scrollHeight)", vec![])
            .await
        {
            errors.push(ErrorRecord::render(format!("Scroll failed: {e}")));
        }
        trace.scrolls += 1;
        sleep(Duration::from_millis(config.scroll_settle_ms)).await;
    }
}

/// Follow "next page" links; newly landed URLs are appended to the
/// trace unless already present. Absence stops early, any failure
/// aborts pagination only.
async fn follow_pagination(
    client: &Client,
    config: &ScrapeConfig,
    trace: &mut InteractionTrace,
    errors: &mut Vec<ErrorRecord>,
) {
    let navigation_bound = Duration::from_millis(config.navigation_timeout_ms);

    for _ in 0..config.max_pagination_follows {
        let found = match client.find_all(Locator::XPath(NEXT_PAGE_XPATH)).await {
            Ok(found) => found,
            Err(e) => {
                errors.push(ErrorRecord::render(format!("Pagination failed: {e}")));
                return;
            }
        };
        let Some(next) = found.into_iter().next() else {
            debug!("no next-page control found, stopping pagination");
            break;
        };

        trace.clicks.push("pagination:next".into());
        match timeout(navigation_bound, next.click()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                errors.push(ErrorRecord::render(format!("Pagination failed: {e}")));
                return;
            }
            Err(_) => {
                errors.push(ErrorRecord::render(
                    "Pagination failed: navigation timed out".to_string(),
                ));
                return;
            }
        }

        if let Ok(current) = client.current_url().await {
            let current = current.to_string();
            if !trace.pages.contains(&current) {
                trace.pages.push(current);
            }
        }
    }
}

/// Accessible name of a control, falling back to visible text,
/// truncated for the trace.
async fn control_label(element: &Element, limit: usize) -> String {
    let raw = match element.attr("aria-label").await {
        Ok(Some(label)) if !label.trim().is_empty() => label,
        _ => element.text().await.unwrap_or_default(),
    };
    truncate_chars(raw.trim(), limit)
}

fn truncate_chars(value: &str, limit: usize) -> String {
    value.chars().take(limit).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// A W3C WebDriver success payload wrapping `value`.
    fn webdriver_ok(value: serde_json::Value) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({ "value": value }))
    }

    fn web_element(id: &str) -> serde_json::Value {
        json!({ "element-6066-11e4-a52e-4f735466cecf": id })
    }

    /// Mount the session-lifecycle endpoints every scripted drive needs:
    /// session creation, navigation, current URL, scroll evaluation,
    /// markup capture, and session teardown.
    async fn mount_session(driver: &MockServer, page_html: &str) {
        Mock::given(method("POST"))
            .and(path("/session"))
            .respond_with(webdriver_ok(
                json!({ "sessionId": "s-1", "capabilities": {} }),
            ))
            .mount(driver)
            .await;
        Mock::given(method("POST"))
            .and(path("/session/s-1/url"))
            .respond_with(webdriver_ok(serde_json::Value::Null))
            .mount(driver)
            .await;
        Mock::given(method("GET"))
            .and(path("/session/s-1/url"))
            .respond_with(webdriver_ok(json!("https://example.com/")))
            .mount(driver)
            .await;
        Mock::given(method("POST"))
            .and(path("/session/s-1/execute/sync"))
            .respond_with(webdriver_ok(serde_json::Value::Null))
            .mount(driver)
            .await;
        Mock::given(method("GET"))
            .and(path("/session/s-1/source"))
            .respond_with(webdriver_ok(json!(page_html)))
            .mount(driver)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/session/s-1"))
            .respond_with(webdriver_ok(serde_json::Value::Null))
            .mount(driver)
            .await;
    }

    /// Config pointed at the scripted driver, with settle delays
    /// zeroed so the script runs instantly.
    fn scripted_config(driver: &MockServer) -> ScrapeConfig {
        ScrapeConfig {
            webdriver_url: driver.uri(),
            tab_settle_ms: 0,
            load_more_settle_ms: 0,
            scroll_settle_ms: 0,
            max_pagination_follows: 1,
            ..Default::default()
        }
    }

    #[test]
    fn truncate_chars_respects_char_boundaries() {
        assert_eq!(truncate_chars("short", 40), "short");
        assert_eq!(truncate_chars("abcdef", 3), "abc");
        assert_eq!(truncate_chars("äöüäöü", 3), "äöü");
    }

    #[tokio::test]
    async fn unreachable_webdriver_records_one_render_error() {
        let config = ScrapeConfig {
            webdriver_url: "http://127.0.0.1:1".into(),
            ..Default::default()
        };

        let url = Url::parse("https://example.com/").unwrap();
        let mut trace = InteractionTrace::new(url.as_str());
        let mut errors = Vec::new();

        let html = fetch_rendered(&config, &url, &mut trace, &mut errors).await;

        assert!(html.is_empty());
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].phase, sitescope_shared::ErrorPhase::Render);
        assert!(errors[0].message.starts_with("Rendering failed"));
        // The trace still holds the requested URL and no interactions.
        assert_eq!(trace.pages, vec![url.to_string()]);
        assert_eq!(trace.scrolls, 0);
        assert!(trace.clicks.is_empty());
    }

    #[tokio::test]
    async fn scripted_session_runs_the_full_interaction_sequence() {
        let driver = MockServer::start().await;
        mount_session(&driver, "<html><body><main>rendered</main></body></html>").await;

        // One tab, one "Load more" button, one next-page link; every
        // other control lookup comes back empty.
        Mock::given(method("POST"))
            .and(path("/session/s-1/elements"))
            .and(body_partial_json(json!({ "value": TAB_SELECTOR })))
            .respond_with(webdriver_ok(json!([web_element("el-tab")])))
            .mount(&driver)
            .await;
        Mock::given(method("GET"))
            .and(path("/session/s-1/element/el-tab/attribute/aria-label"))
            .respond_with(webdriver_ok(json!("Pricing")))
            .mount(&driver)
            .await;
        Mock::given(method("POST"))
            .and(path("/session/s-1/elements"))
            .and(body_partial_json(json!({
                "value": "//button[contains(normalize-space(.), 'Load more')]",
            })))
            .respond_with(webdriver_ok(json!([web_element("el-more")])))
            .mount(&driver)
            .await;
        Mock::given(method("POST"))
            .and(path("/session/s-1/elements"))
            .and(body_partial_json(json!({ "value": NEXT_PAGE_XPATH })))
            .respond_with(webdriver_ok(json!([web_element("el-next")])))
            .mount(&driver)
            .await;
        for id in ["el-tab", "el-more", "el-next"] {
            Mock::given(method("POST"))
                .and(path(format!("/session/s-1/element/{id}/click")))
                .respond_with(webdriver_ok(serde_json::Value::Null))
                .mount(&driver)
                .await;
        }
        // Remaining load-more labels match nothing.
        Mock::given(method("POST"))
            .and(path("/session/s-1/elements"))
            .respond_with(webdriver_ok(json!([])))
            .mount(&driver)
            .await;

        let config = scripted_config(&driver);
        let url = Url::parse("https://example.com/").unwrap();
        let mut trace = InteractionTrace::new(url.as_str());
        let mut errors = Vec::new();

        let html = fetch_rendered(&config, &url, &mut trace, &mut errors).await;

        assert!(html.contains("rendered"));
        assert!(errors.is_empty(), "unexpected errors: {errors:?}");

        // The full script ran in order: tab, load-more, scrolls,
        // pagination. Scroll passes always count.
        assert_eq!(
            trace.clicks,
            vec!["tab:Pricing", "button:Load more", "pagination:next"]
        );
        assert_eq!(trace.scrolls, 3);

        // The post-pagination URL matched the landed one, so the page
        // list stays deduplicated.
        assert_eq!(trace.pages, vec!["https://example.com/"]);
    }

    #[tokio::test]
    async fn scroll_passes_run_even_without_clickable_controls() {
        let driver = MockServer::start().await;
        mount_session(&driver, "<html><body>bare</body></html>").await;
        Mock::given(method("POST"))
            .and(path("/session/s-1/elements"))
            .respond_with(webdriver_ok(json!([])))
            .mount(&driver)
            .await;

        let config = scripted_config(&driver);
        let url = Url::parse("https://example.com/").unwrap();
        let mut trace = InteractionTrace::new(url.as_str());
        let mut errors = Vec::new();

        let html = fetch_rendered(&config, &url, &mut trace, &mut errors).await;

        assert!(html.contains("bare"));
        assert!(errors.is_empty(), "unexpected errors: {errors:?}");
        assert_eq!(trace.scrolls, 3);
        assert!(trace.clicks.is_empty());
    }
}
