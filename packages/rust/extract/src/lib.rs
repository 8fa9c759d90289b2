//! Section extraction, page metadata, and the static-sufficiency test.
//!
//! This crate is pure: it takes a parsed HTML document plus the source
//! URL and produces structured data. All network and browser concerns
//! live in `sitescope-pipeline`.
//!
//! - [`sections`] — segments a document into classified [`Section`]s
//! - [`meta`] — title/description/language/canonical extraction
//! - [`sufficiency`] — decides whether a rendered fallback is needed
//!
//! [`Section`]: sitescope_shared::Section

pub mod meta;
pub mod sections;
pub mod sufficiency;

pub use meta::extract_metadata;
pub use sections::extract_sections;
pub use sufficiency::is_static_sufficient;
