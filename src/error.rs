//! Error types for OAuth flows

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for every flow operation
///
/// Each variant maps onto one failure class:
///
/// - [`OAuthError::MissingConfig`] is raised at construction and never retried.
/// - [`OAuthError::Transport`] means no HTTP response was received (status code 0).
/// - [`OAuthError::Protocol`] is a completed exchange the classifier judged an error.
///
/// Use [`OAuthError::status_code`], [`OAuthError::url`] and [`OAuthError::body`] to get the
/// request context regardless of variant.
#[derive(Error, Debug)]
pub enum OAuthError {
    /// A configuration key required by the selected protocol is missing or empty
    #[error("{key} is required.")]
    MissingConfig {
        /// Name of the missing key
        key: &'static str,
    },

    /// The connection could not be completed (DNS, TCP, TLS, timeout)
    #[error("Request to {url} failed: {message}")]
    Transport {
        /// Error message from the HTTP client
        message: String,
        /// URL that was being requested
        url: String,
    },

    /// The provider answered, and the answer is an error
    #[error("{url} responded with HTTP {status}: {message}")]
    Protocol {
        /// Extracted error text, empty when the provider gave none
        message: String,
        /// URL that was requested
        url: String,
        /// Raw response body
        body: String,
        /// HTTP status code
        status: u16,
    },

    /// A file referenced by an upload parameter could not be read
    #[error("Failed to read upload file {} for {url}: {source}", path.display())]
    Upload {
        /// URL the upload was meant for
        url: String,
        /// Path of the file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The HTTP method is not a valid token
    #[error("Invalid HTTP method: {0}")]
    InvalidMethod(String),

    /// A URL could not be parsed
    #[error("Invalid URL {url}: {message}")]
    InvalidUrl {
        /// The offending URL
        url: String,
        /// Parser error message
        message: String,
    },

    /// The request could not be signed
    #[error("Signature error: {0}")]
    Signature(String),
}

/// Result type alias for OAuth operations
pub type Result<T> = std::result::Result<T, OAuthError>;

impl OAuthError {
    /// Create a missing configuration error
    #[must_use]
    pub fn missing_config(key: &'static str) -> Self {
        Self::MissingConfig { key }
    }

    /// Create a transport error
    pub fn transport(msg: impl Into<String>, url: impl Into<String>) -> Self {
        Self::Transport {
            message: msg.into(),
            url: url.into(),
        }
    }

    /// Create a protocol error
    pub fn protocol(
        msg: impl Into<String>,
        url: impl Into<String>,
        body: impl Into<String>,
        status: u16,
    ) -> Self {
        Self::Protocol {
            message: msg.into(),
            url: url.into(),
            body: body.into(),
            status,
        }
    }

    /// Create an invalid URL error
    pub fn invalid_url(url: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            message: msg.into(),
        }
    }

    /// Create a signature error
    pub fn signature(msg: impl Into<String>) -> Self {
        Self::Signature(msg.into())
    }

    /// The bare error text, without the URL and status decoration of `Display`
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Transport { message, .. } | Self::Protocol { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    /// URL of the request that failed, if one was issued
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Transport { url, .. }
            | Self::Protocol { url, .. }
            | Self::Upload { url, .. }
            | Self::InvalidUrl { url, .. } => Some(url),
            _ => None,
        }
    }

    /// Raw response body of the failed request (empty if nothing was received)
    #[must_use]
    pub fn body(&self) -> &str {
        match self {
            Self::Protocol { body, .. } => body,
            _ => "",
        }
    }

    /// HTTP status code of the failed request, 0 if no response was received
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Protocol { status, .. } => *status,
            _ => 0,
        }
    }

    /// Whether the failure happened before any response was received
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Upload { .. })
    }
}

impl From<reqwest::Error> for OAuthError {
    fn from(err: reqwest::Error) -> Self {
        let url = err.url().map(ToString::to_string).unwrap_or_default();
        Self::transport(err.to_string(), url)
    }
}
