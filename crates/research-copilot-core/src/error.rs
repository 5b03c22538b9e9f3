use thiserror::Error;

/// Unified error type for research-copilot-core
///
/// This enum encompasses all error cases that can occur in the library:
/// - Backend API operations (connectivity, rejected requests, bad payloads)
/// - Persisted client cache operations
/// - Configuration loading
/// - Route resolution
/// - General I/O operations
#[derive(Error, Debug)]
pub enum Error {
    // ==========================================================================
    // Backend API Errors
    // ==========================================================================
    /// No response was received from the backend
    #[error("backend unreachable: {0}")]
    Network(String),

    /// The request did not complete within its timeout
    #[error("backend request timed out")]
    Timeout,

    /// The backend answered with a non-success status
    #[error("backend returned HTTP {status}{}", detail.as_ref().map(|d| format!(": {d}")).unwrap_or_default())]
    Api { status: u16, detail: Option<String> },

    /// The backend answered 2xx with a body we could not decode
    #[error("invalid backend response: {0}")]
    InvalidResponse(String),

    // ==========================================================================
    // Cache Errors
    // ==========================================================================
    /// Failed to open the persisted cache
    #[error("failed to initialize cache: {0}")]
    CacheInit(String),

    /// Failed to read from the persisted cache
    #[error("failed to read from cache: {0}")]
    CacheRead(String),

    /// Failed to write to the persisted cache
    #[error("failed to write to cache: {0}")]
    CacheWrite(String),

    // ==========================================================================
    // Configuration Errors
    // ==========================================================================
    /// Failed to load configuration file
    #[error("failed to load config: {0}")]
    ConfigLoad(String),

    /// Invalid configuration value
    #[error("invalid config value for '{field}': {reason}")]
    ConfigInvalid { field: String, reason: String },

    // ==========================================================================
    // Routing Errors
    // ==========================================================================
    /// Path does not match any known view
    #[error("no view matches path '{0}'")]
    UnknownRoute(String),

    // ==========================================================================
    // Validation Errors
    // ==========================================================================
    /// Language code outside the set offered by a view
    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),

    // ==========================================================================
    // I/O Errors
    // ==========================================================================
    /// General I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification used by views to pick a user-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No response received (includes timeouts)
    Network,
    /// 4xx: malformed request or missing resource
    Client,
    /// 5xx: backend-side failure
    Server,
    /// Rejected locally before any request was sent
    Validation,
    /// Cache, config or I/O failure on this machine
    Local,
}

impl Error {
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Network(_) | Self::Timeout => ErrorKind::Network,
            Self::Api { status, .. } if *status >= 500 => ErrorKind::Server,
            Self::Api { .. } => ErrorKind::Client,
            // 2xx with garbage is still the server's fault
            Self::InvalidResponse(_) => ErrorKind::Server,
            Self::UnknownRoute(_) | Self::UnsupportedLanguage(_) => ErrorKind::Validation,
            Self::CacheInit(_)
            | Self::CacheRead(_)
            | Self::CacheWrite(_)
            | Self::ConfigLoad(_)
            | Self::ConfigInvalid { .. }
            | Self::Io(_) => ErrorKind::Local,
        }
    }

    /// HTTP status of a backend rejection, if this error carries one.
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Human-readable `detail` field from the backend error body.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Api { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }

    /// The backend `detail` when present, otherwise `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        self.detail().unwrap_or(fallback).to_string()
    }
}

pub type Result<T> = std::result::Result<T, Error>;
