// crates/folio-core/src/error.rs
// Standardized error types for Folio

use std::time::Duration;

use thiserror::Error;

/// Main error type for the Folio runtime
#[derive(Error, Debug)]
pub enum FolioError {
    #[error("host error: {0}")]
    Host(String),

    #[error("configuration error: {0}")]
    Config(#[from] serde_json::Error),

    #[error(transparent)]
    Contact(#[from] ContactError),
}

/// Convenience type alias for Result using FolioError
pub type Result<T> = std::result::Result<T, FolioError>;

impl FolioError {
    pub fn host(message: impl Into<String>) -> Self {
        FolioError::Host(message.into())
    }
}

/// Transport-level failure while fetching a resource
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("HTTP status {0}")]
    Status(u16),

    #[error("network error: {0}")]
    Network(String),
}

/// Failure resolving a single include placeholder
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IncludeError {
    #[error("fragment {src} failed: {source}")]
    Fetch { src: String, source: FetchError },

    #[error("fragment {src} timed out after {}ms", .after.as_millis())]
    Timeout { src: String, after: Duration },

    #[error("fragment {src} is not same-origin or allow-listed")]
    CrossOrigin { src: String },

    #[error("fragment source {src:?} is invalid: {reason}")]
    InvalidSource { src: String, reason: String },

    #[error("fragment {src} could not be injected: {reason}")]
    Inject { src: String, reason: String },
}

impl IncludeError {
    /// Source URL of the placeholder that failed
    pub fn src(&self) -> &str {
        match self {
            IncludeError::Fetch { src, .. }
            | IncludeError::Timeout { src, .. }
            | IncludeError::CrossOrigin { src }
            | IncludeError::InvalidSource { src, .. }
            | IncludeError::Inject { src, .. } => src,
        }
    }
}

/// Contact form submission failure, one variant per user-visible cause
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContactError {
    #[error("invalid field: {0}")]
    Invalid(&'static str),

    #[error("request timed out")]
    Timeout,

    #[error("network error: {0}")]
    Network(String),

    #[error("rejected with status {status}")]
    Rejected {
        status: u16,
        code: Option<String>,
        detail: Option<String>,
    },
}
