//! Shared types, error model, and configuration for sitescope.
//!
//! This crate is the foundation depended on by all other sitescope crates.
//! It provides:
//! - [`SitescopeError`] — the unified error type
//! - The scrape result model ([`ScrapeResult`], [`Section`], [`InteractionTrace`])
//! - Configuration ([`AppConfig`], [`ScrapeConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, ScrapeConfig, ServerConfig, config_dir, config_file_path, load_config,
    load_config_from,
};
pub use error::{Result, SitescopeError};
pub use types::{
    ErrorPhase, ErrorRecord, Image, InteractionTrace, Link, PageMetadata, ScrapeResult, Section,
    SectionContent, SectionType,
};
