//! Error types for the metadata resolver
//!
//! This module provides structured error types using thiserror for better
//! error handling and actionable error messages.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for resolution, cache and configuration operations
#[derive(Error, Debug)]
pub enum ResolverError {
    /// No source template was ever configured
    #[error("Card metadata source URL was not supplied")]
    MissingSourceTemplate,

    /// The "latest" fetch failed; no further fallback exists
    #[error("Error fetching latest build\n\"{url}\" returned status {}", display_status(.status))]
    LatestUnavailable { url: String, status: Option<u16> },

    /// A fetched body could not be parsed as structured data
    #[error("Catalog fetched from '{source_url}' is not valid JSON: {reason}")]
    MalformedCatalog { source_url: String, reason: String },

    /// Error reading/writing cache files on disk
    #[error("cache io error at '{path}': {source}")]
    CacheIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Cache key would escape the cache directory
    #[error("invalid cache key '{key}': only ASCII letters, digits, '-' and '_' are allowed")]
    InvalidCacheKey { key: String },

    /// The transport could not be constructed
    #[error("Transport setup failed: {reason}")]
    Transport { reason: String },

    /// Configuration errors
    #[error("Invalid configuration: {reason}")]
    Config { reason: String },
}

/// Renders an optional HTTP status for messages.
pub fn display_status(status: &Option<u16>) -> String {
    match status {
        Some(code) => code.to_string(),
        None => "none".to_string(),
    }
}

impl ResolverError {
    pub fn cache_io(path: PathBuf, source: std::io::Error) -> Self {
        Self::CacheIo { path, source }
    }

    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }

    /// Get a stable status code for this error type.
    ///
    /// Returns a string identifier that can be used in JSON responses
    /// for programmatic error handling.
    pub fn status_code(&self) -> String {
        match self {
            Self::MissingSourceTemplate => "MISSING_SOURCE_TEMPLATE",
            Self::LatestUnavailable { .. } => "LATEST_UNAVAILABLE",
            Self::MalformedCatalog { .. } => "MALFORMED_CATALOG",
            Self::CacheIo { .. } => "CACHE_IO",
            Self::InvalidCacheKey { .. } => "INVALID_CACHE_KEY",
            Self::Transport { .. } => "TRANSPORT_ERROR",
            Self::Config { .. } => "CONFIG_ERROR",
        }
        .to_string()
    }

    /// Whether resolution can never succeed without outside intervention.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::MissingSourceTemplate | Self::LatestUnavailable { .. } | Self::Config { .. }
        )
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            Self::MissingSourceTemplate => vec![
                "Set [source] template in .cardmeta/settings.toml",
                "Or pass --source with a URL containing %(build)s and %(locale)s",
            ],
            Self::LatestUnavailable { .. } => vec![
                "Check network connectivity to the metadata source",
                "Verify the source template points at a live endpoint",
            ],
            Self::MalformedCatalog { .. } => vec![
                "The metadata source returned a non-JSON body; check the template path",
            ],
            Self::CacheIo { .. } => vec![
                "Ensure the cache directory exists and is writable",
                "Run 'cardmeta cache clear' to start from an empty cache",
            ],
            Self::InvalidCacheKey { .. } => vec!["Use keys derived from build numbers"],
            Self::Transport { .. } => vec!["Check the [http] section of the configuration"],
            Self::Config { .. } => vec![
                "Run 'cardmeta init --force' to regenerate the configuration file",
            ],
        }
    }
}

/// Result type alias for resolver operations
pub type ResolverResult<T> = Result<T, ResolverError>;
