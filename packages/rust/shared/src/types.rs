//! Core domain types for scrape results.
//!
//! These structs define the JSON contract of the `/scrape` endpoint:
//! a [`ScrapeResult`] carrying page metadata, the ordered extracted
//! [`Section`]s, the [`InteractionTrace`] of the rendered fallback (if
//! any), and the accumulated non-fatal [`ErrorRecord`]s.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// PageMetadata
// ---------------------------------------------------------------------------

/// Page-level metadata, derived once per fetched document version.
///
/// A second (rendered) fetch supersedes the static metadata wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMetadata {
    /// Page title (og:title preferred over `<title>`).
    pub title: String,
    /// Meta description (falling back to og:description).
    pub description: String,
    /// BCP-47-ish language tag from `<html lang>`; defaults to "en".
    pub language: String,
    /// Canonical URL from `<link rel="canonical">`, if declared.
    pub canonical: Option<String>,
}

impl Default for PageMetadata {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            language: "en".into(),
            canonical: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// Classified kind of an extracted section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionType {
    Nav,
    Footer,
    Hero,
    Faq,
    Pricing,
    Section,
}

impl SectionType {
    /// Lowercase wire name, also used in section ids.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Nav => "nav",
            Self::Footer => "footer",
            Self::Hero => "hero",
            Self::Faq => "faq",
            Self::Pricing => "pricing",
            Self::Section => "section",
        }
    }
}

impl std::fmt::Display for SectionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A link extracted from a section, href resolved to an absolute URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub text: String,
    pub href: String,
}

/// An image extracted from a section, src resolved to an absolute URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub src: String,
    /// Alt text; empty string when the attribute is missing.
    pub alt: String,
}

/// The structured content of one section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionContent {
    /// All nested h1–h3 texts, in document order.
    pub headings: Vec<String>,
    /// Visible text, tag-stripped and whitespace-normalized.
    pub text: String,
    /// Links with absolute hrefs, in document order.
    pub links: Vec<Link>,
    /// Images with absolute srcs, in document order.
    pub images: Vec<Image>,
    /// One inner vec per `ul`/`ol`, holding its non-empty item texts.
    pub lists: Vec<Vec<String>>,
    /// Row-major cell text per `table`; only non-empty rows retained.
    pub tables: Vec<Vec<Vec<String>>>,
}

impl SectionContent {
    /// A section is dropped from the output when this returns true.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.headings.is_empty() && self.links.is_empty()
    }
}

/// One logically grouped, classified fragment of a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    /// `"<type>-<index>"` where index is the candidate position.
    pub id: String,
    /// Classified section kind.
    #[serde(rename = "type")]
    pub kind: SectionType,
    /// First heading, first ~7 words of text, or literal "Section".
    pub label: String,
    /// The page URL this section was extracted from.
    pub source_url: String,
    /// Structured content of the section.
    pub content: SectionContent,
    /// Serialized markup, truncated to the configured character budget.
    pub raw_html: String,
    /// Whether `raw_html` was cut at the budget.
    pub truncated: bool,
}

// ---------------------------------------------------------------------------
// Interaction trace and errors
// ---------------------------------------------------------------------------

/// Record of synthetic UI actions performed during the rendered fallback.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionTrace {
    /// Labels describing what was clicked, in click order.
    pub clicks: Vec<String>,
    /// Number of scroll-to-bottom passes performed.
    pub scrolls: u32,
    /// URLs visited, deduplicated in visitation order.
    pub pages: Vec<String>,
}

impl InteractionTrace {
    /// Seed a trace with the requested URL as the first page entry.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            clicks: Vec::new(),
            scrolls: 0,
            pages: vec![url.into()],
        }
    }
}

/// Which pipeline phase an error was recorded in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPhase {
    Fetch,
    Render,
}

/// A non-fatal error captured in the scrape result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub message: String,
    pub phase: ErrorPhase,
}

impl ErrorRecord {
    /// Record a static-fetch-phase error.
    pub fn fetch(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            phase: ErrorPhase::Fetch,
        }
    }

    /// Record a rendered-fetch-phase error.
    pub fn render(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            phase: ErrorPhase::Render,
        }
    }
}

// ---------------------------------------------------------------------------
// ScrapeResult
// ---------------------------------------------------------------------------

/// The fully materialized result of one scrape request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeResult {
    /// The requested URL.
    pub url: String,
    /// ISO-8601 UTC timestamp of result assembly.
    pub scraped_at: String,
    /// Metadata from the final document version.
    pub meta: PageMetadata,
    /// Ordered sections; empty when nothing was extractable.
    pub sections: Vec<Section>,
    /// Trace of the rendered fallback (seeded with the requested URL).
    pub interactions: InteractionTrace,
    /// Errors accumulated across both fetch phases.
    pub errors: Vec<ErrorRecord>,
}
