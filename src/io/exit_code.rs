//! Exit codes for CLI operations following Unix conventions.
//!
//! # Exit Code Semantics
//!
//! - `0`: Success - a catalog was delivered or the command completed
//! - `1`: General error - unspecified failure
//! - `2`: Blocking error - no catalog could be resolved at all
//! - `3-125`: Specific recoverable errors
//! - `126-255`: Reserved by shell

use crate::error::ResolverError;
use crate::resolver::Resolution;

/// Standard exit codes for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    /// Operation succeeded (code 0)
    Success = 0,

    /// Unspecified error occurred (code 1)
    GeneralError = 1,

    /// Neither the requested build nor latest could be fetched (code 2)
    BlockingError = 2,

    /// Requested entry does not exist (code 3)
    NotFound = 3,

    /// Fetched data was not a parseable catalog (code 4)
    ParseError = 4,

    /// Cache I/O error (code 5)
    IoError = 5,

    /// Configuration error (code 6)
    ConfigError = 6,

    /// Request was cancelled before it completed (code 7)
    Cancelled = 7,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code as i32
    }
}

impl ExitCode {
    /// Exit code for a finished resolution.
    pub fn from_resolution(resolution: &Resolution) -> Self {
        match resolution {
            Resolution::Delivered { .. } => ExitCode::Success,
            Resolution::Ignored => ExitCode::Cancelled,
        }
    }

    /// Convert a `ResolverError` to the appropriate exit code.
    ///
    /// Maps specific error types to semantic exit codes that scripts
    /// can use to determine appropriate recovery actions.
    pub fn from_error(error: &ResolverError) -> Self {
        match error {
            ResolverError::LatestUnavailable { .. } => ExitCode::BlockingError,
            ResolverError::MalformedCatalog { .. } => ExitCode::ParseError,
            ResolverError::CacheIo { .. } => ExitCode::IoError,
            ResolverError::MissingSourceTemplate | ResolverError::Config { .. } => {
                ExitCode::ConfigError
            }
            ResolverError::InvalidCacheKey { .. } | ResolverError::Transport { .. } => {
                ExitCode::GeneralError
            }
        }
    }

    /// Check if this exit code indicates a blocking error.
    #[must_use]
    pub fn is_blocking(&self) -> bool {
        matches!(self, ExitCode::BlockingError)
    }

    /// Check if this exit code indicates success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, ExitCode::Success)
    }

    /// Get a human-readable description of the exit code.
    pub fn description(&self) -> &str {
        match self {
            ExitCode::Success => "Success",
            ExitCode::GeneralError => "General error",
            ExitCode::BlockingError => "Blocking error - no catalog available",
            ExitCode::NotFound => "Not found",
            ExitCode::ParseError => "Parse error",
            ExitCode::IoError => "I/O error",
            ExitCode::ConfigError => "Configuration error",
            ExitCode::Cancelled => "Cancelled",
        }
    }
}
