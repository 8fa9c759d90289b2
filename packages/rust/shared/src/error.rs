//! Error types for sitescope.
//!
//! Library crates use [`SitescopeError`] via `thiserror`. The server
//! binary wraps this with `color-eyre` for rich diagnostics.
//!
//! Note that most scrape-time failures (transport errors, render
//! failures, interaction misfires) are deliberately *not* represented
//! here — they are recorded as [`crate::ErrorRecord`] entries inside
//! the scrape result and never abort a request.

use std::path::PathBuf;

/// Top-level error type for all sitescope operations.
#[derive(Debug, thiserror::Error)]
pub enum SitescopeError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Failure to construct an HTTP client or other request machinery.
    #[error("client error: {0}")]
    Client(String),

    /// The requested URL is malformed or uses an unsupported scheme.
    #[error("invalid url: {message}")]
    InvalidUrl { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, SitescopeError>;

impl SitescopeError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create an invalid-url error from any displayable message.
    pub fn invalid_url(msg: impl Into<String>) -> Self {
        Self::InvalidUrl {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = SitescopeError::config("missing webdriver url");
        assert_eq!(err.to_string(), "config error: missing webdriver url");

        let err = SitescopeError::invalid_url("scheme 'ftp' not supported");
        assert!(err.to_string().contains("ftp"));
    }
}
