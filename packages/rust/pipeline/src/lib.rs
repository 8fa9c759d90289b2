//! The scrape pipeline: static fetch, sufficiency decision, rendered
//! fallback, and result assembly.
//!
//! One [`Pipeline`] is built at startup and shared across requests; it
//! holds only read-only configuration and a connection-pooled HTTP
//! client, so concurrent runs are independent. Within one run the
//! phases are strictly sequential:
//!
//! ```text
//! START → STATIC_FETCHED → (sufficient? DONE : RENDER_FETCHED → DONE)
//! ```
//!
//! There are no retries and no backtracking beyond the one
//! static→dynamic escalation. Errors from either phase accumulate in
//! the result instead of failing the run — the best available sections
//! are always returned.

pub mod fetch;
pub mod render;

use chrono::{SecondsFormat, Utc};
use scraper::Html;
use tracing::{info, instrument};
use url::Url;

use sitescope_extract::{extract_metadata, extract_sections, is_static_sufficient};
use sitescope_shared::{
    ErrorRecord, InteractionTrace, PageMetadata, Result, ScrapeConfig, ScrapeResult, Section,
};

/// Orchestrates one complete scrape per call to [`Pipeline::run`].
pub struct Pipeline {
    config: ScrapeConfig,
    client: reqwest::Client,
}

impl Pipeline {
    /// Build the pipeline and its HTTP client from the configuration.
    pub fn new(config: ScrapeConfig) -> Result<Self> {
        let client = fetch::build_client(&config)?;
        Ok(Self { config, client })
    }

    /// The immutable configuration this pipeline was built with.
    pub fn config(&self) -> &ScrapeConfig {
        &self.config
    }

    /// Run the full pipeline for one URL.
    ///
    /// Never fails: fetch and render problems are recorded in the
    /// result's error list and partial results are preferred over none.
    #[instrument(skip_all, fields(url = %url))]
    pub async fn run(&self, url: &Url) -> ScrapeResult {
        let mut errors: Vec<ErrorRecord> = Vec::new();
        let mut trace = InteractionTrace::new(url.as_str());

        let mut meta = PageMetadata::default();
        let mut sections: Vec<Section> = Vec::new();

        let static_html = fetch::fetch_static(&self.client, url, &mut errors).await;
        if !static_html.is_empty() {
            let doc = Html::parse_document(&static_html);
            meta = extract_metadata(&doc);
            sections = extract_sections(&doc, url, &self.config);
        }

        if !is_static_sufficient(&sections, self.config.static_text_threshold) {
            info!(
                sections = sections.len(),
                "static content insufficient, escalating to rendered fetch"
            );
            let rendered_html =
                render::fetch_rendered(&self.config, url, &mut trace, &mut errors).await;
            if !rendered_html.is_empty() {
                // The rendered document supersedes the static one wholesale.
                let doc = Html::parse_document(&rendered_html);
                meta = extract_metadata(&doc);
                sections = extract_sections(&doc, url, &self.config);
            }
        }

        ScrapeResult {
            url: url.to_string(),
            scraped_at: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
            meta,
            sections,
            interactions: trace,
            errors,
        }
    }
}
