//! Retrieval of raw catalog text from the remote metadata source
//!
//! The resolver only sees [`Transport`]; the reqwest-backed
//! [`HttpTransport`] is the production implementation.

pub mod http;

pub use http::HttpTransport;

use async_trait::async_trait;
use std::fmt;

/// Placeholder replaced by the build token
pub const BUILD_PLACEHOLDER: &str = "%(build)s";

/// Placeholder replaced by the locale code
pub const LOCALE_PLACEHOLDER: &str = "%(locale)s";

/// Why a retrieval did not produce a body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFailure {
    /// HTTP status when the server answered; `None` for timeouts and
    /// connection errors.
    pub status: Option<u16>,
    pub reason: String,
}

impl FetchFailure {
    pub fn status(code: u16) -> Self {
        Self {
            status: Some(code),
            reason: format!("HTTP {code}"),
        }
    }

    pub fn network(reason: impl Into<String>) -> Self {
        Self {
            status: None,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reason)
    }
}

/// Result of one retrieval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Body text of a successful response
    Completed(String),
    Failed(FetchFailure),
    /// The request was aborted before any status existed; callers must
    /// treat this as neither success nor failure.
    Cancelled,
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn fetch(&self, url: &str) -> FetchOutcome;
}

/// Substitute the first `%(build)s` and the first `%(locale)s`.
pub fn expand_template(template: &str, token: &str, locale: &str) -> String {
    template
        .replacen(BUILD_PLACEHOLDER, token, 1)
        .replacen(LOCALE_PLACEHOLDER, locale, 1)
}
