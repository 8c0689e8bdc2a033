//! Error types for the updater
//!
//! This module defines all error types used throughout the workspace.

use thiserror::Error;

/// Result type alias for updater operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the updater
#[derive(Error, Debug)]
pub enum Error {
    /// IP source-related errors
    #[error("IP source error: {0}")]
    IpSource(String),

    /// DNS provider-related errors
    #[error("DNS provider error: {0}")]
    DnsProvider(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Local I/O errors (key files)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP client errors (from registrar or IP provider endpoints)
    #[error("HTTP error: {0}")]
    Http(String),

    /// Malformed XML-RPC payload
    #[error("XML-RPC protocol error: {0}")]
    Protocol(String),

    /// XML-RPC fault returned by the remote end
    #[error("XML-RPC fault {code}: {message}")]
    Fault {
        /// Fault code
        code: i64,
        /// Fault string
        message: String,
    },

    /// Authentication errors
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Rate limiting errors
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Zone, draft version or record not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Notification delivery errors
    #[error("Notification error: {0}")]
    Notify(String),

    /// Provider-specific error
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },
}

impl Error {
    /// Create an IP source error
    pub fn ip_source(msg: impl Into<String>) -> Self {
        Self::IpSource(msg.into())
    }

    /// Create a DNS provider error
    pub fn dns_provider(msg: impl Into<String>) -> Self {
        Self::DnsProvider(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create an XML-RPC protocol error
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    /// Create an XML-RPC fault error
    pub fn fault(code: i64, message: impl Into<String>) -> Self {
        Self::Fault {
            code,
            message: message.into(),
        }
    }

    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create a rate limit error
    pub fn rate_limited(msg: impl Into<String>) -> Self {
        Self::RateLimited(msg.into())
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a notification error
    pub fn notify(msg: impl Into<String>) -> Self {
        Self::Notify(msg.into())
    }

    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Whether this error means the requested entity does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Map a non-success HTTP status to an error
    ///
    /// Shared by every HTTP client in the workspace so status handling stays
    /// consistent: 401/403 are authentication failures, 404 is "not found",
    /// 429 is rate limiting and everything else is a provider error.
    pub fn from_status(provider: &str, status: u16, context: &str, body: &str) -> Self {
        match status {
            401 | 403 => Self::auth(format!(
                "{}: invalid API key or insufficient permissions (status {})",
                context, status
            )),
            404 => Self::not_found(context.to_string()),
            429 => Self::rate_limited(format!("{}: status {}", context, status)),
            500..=599 => Self::provider(
                provider,
                format!("{}: server error {} - {}", context, status, body),
            ),
            _ => Self::provider(provider, format!("{}: {} - {}", context, status, body)),
        }
    }
}
