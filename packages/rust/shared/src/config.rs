//! Application configuration for sitescope.
//!
//! User config lives at `~/.sitescope/sitescope.toml`. CLI flags
//! override config file values, which override defaults. The scrape
//! settings are an explicit, immutable value handed to the pipeline —
//! tests override thresholds instead of patching globals.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SitescopeError};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "sitescope.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".sitescope";

// ---------------------------------------------------------------------------
// Config structs (matching sitescope.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// `[server]` section.
    #[serde(default)]
    pub server: ServerConfig,

    /// `[scrape]` section.
    #[serde(default)]
    pub scrape: ScrapeConfig,
}

/// `[server]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Socket address the HTTP server binds to.
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8000".into()
}

/// `[scrape]` section — every process-wide constant of the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeConfig {
    /// Browser-like User-Agent sent on both fetch paths.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Minimum total section text length for a static fetch to count
    /// as sufficient.
    #[serde(default = "default_text_threshold")]
    pub static_text_threshold: usize,

    /// Character budget for each section's serialized `rawHtml`.
    #[serde(default = "default_raw_html_budget")]
    pub raw_html_budget: usize,

    /// Connect timeout for the static fetch, in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Overall timeout for the static fetch, in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// WebDriver endpoint driving the headless browser.
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,

    /// Bound on page navigation and pagination settling, in ms.
    #[serde(default = "default_navigation_timeout")]
    pub navigation_timeout_ms: u64,

    /// Maximum number of tab controls clicked.
    #[serde(default = "default_max_tab_clicks")]
    pub max_tab_clicks: usize,

    /// Settle delay after each tab click, in ms.
    #[serde(default = "default_tab_settle")]
    pub tab_settle_ms: u64,

    /// Settle delay after each "load more" click, in ms.
    #[serde(default = "default_load_more_settle")]
    pub load_more_settle_ms: u64,

    /// Number of scroll-to-bottom passes for lazy-loaded content.
    #[serde(default = "default_scroll_passes")]
    pub scroll_passes: u32,

    /// Settle delay after each scroll pass, in ms.
    #[serde(default = "default_scroll_settle")]
    pub scroll_settle_ms: u64,

    /// Pagination links followed beyond the first page.
    #[serde(default = "default_pagination_follows")]
    pub max_pagination_follows: u32,

    /// Click labels in the interaction trace are cut to this length.
    #[serde(default = "default_click_label_chars")]
    pub click_label_chars: usize,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            static_text_threshold: default_text_threshold(),
            raw_html_budget: default_raw_html_budget(),
            connect_timeout_secs: default_connect_timeout(),
            request_timeout_secs: default_request_timeout(),
            webdriver_url: default_webdriver_url(),
            navigation_timeout_ms: default_navigation_timeout(),
            max_tab_clicks: default_max_tab_clicks(),
            tab_settle_ms: default_tab_settle(),
            load_more_settle_ms: default_load_more_settle(),
            scroll_passes: default_scroll_passes(),
            scroll_settle_ms: default_scroll_settle(),
            max_pagination_follows: default_pagination_follows(),
            click_label_chars: default_click_label_chars(),
        }
    }
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/124.0 Safari/537.36"
        .into()
}
fn default_text_threshold() -> usize {
    500
}
fn default_raw_html_budget() -> usize {
    3000
}
fn default_connect_timeout() -> u64 {
    5
}
fn default_request_timeout() -> u64 {
    15
}
fn default_webdriver_url() -> String {
    "http://localhost:4444".into()
}
fn default_navigation_timeout() -> u64 {
    20_000
}
fn default_max_tab_clicks() -> usize {
    3
}
fn default_tab_settle() -> u64 {
    1_000
}
fn default_load_more_settle() -> u64 {
    1_500
}
fn default_scroll_passes() -> u32 {
    3
}
fn default_scroll_settle() -> u64 {
    1_500
}
fn default_pagination_follows() -> u32 {
    2
}
fn default_click_label_chars() -> usize {
    40
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.sitescope/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| SitescopeError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.sitescope/sitescope.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| SitescopeError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| SitescopeError::config(format!("failed to parse {}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("static_text_threshold"));
        assert!(toml_str.contains("webdriver_url"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.scrape.static_text_threshold, 500);
        assert_eq!(parsed.scrape.raw_html_budget, 3000);
        assert_eq!(parsed.server.bind, "127.0.0.1:8000");
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[scrape]
static_text_threshold = 42
webdriver_url = "http://localhost:9515"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.scrape.static_text_threshold, 42);
        assert_eq!(config.scrape.webdriver_url, "http://localhost:9515");
        // Untouched fields keep their defaults
        assert_eq!(config.scrape.scroll_passes, 3);
        assert_eq!(config.scrape.max_pagination_follows, 2);
        assert!(config.scrape.user_agent.starts_with("Mozilla/5.0"));
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let err = load_config_from(Path::new("/nonexistent/sitescope.toml")).unwrap_err();
        assert!(err.to_string().contains("I/O error"));
    }
}
