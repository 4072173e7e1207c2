//! Error types for Graph requests.
//!
//! Every request either yields parsed items or one of these variants. The
//! walker decides per variant whether to skip the resource or stop the run,
//! so the variants separate systemic failures (a rejected credential) from
//! resource-level ones (a missing or forbidden channel).

use std::time::Duration;

use thiserror::Error;

/// Errors returned by the Graph client.
#[derive(Debug, Error)]
pub enum GraphError {
    /// The bearer credential was rejected (HTTP 401).
    #[error(
        "[AUTH] credential rejected (HTTP 401) requesting {url}\n  Suggestion: obtain a fresh ACCESS_TOKEN and run again"
    )]
    Unauthorized {
        /// The URL that was rejected.
        url: String,
    },

    /// The service asked us to slow down (HTTP 429).
    #[error("throttled (HTTP 429) requesting {url}")]
    Throttled {
        /// The throttled URL.
        url: String,
        /// Parsed Retry-After delay, if the header was present and valid.
        retry_after: Option<Duration>,
    },

    /// Any other non-200 response, including 403 and 404.
    #[error("HTTP {status} requesting {url}")]
    HttpStatus {
        /// The URL that returned the status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// Request timed out.
    #[error("timeout requesting {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// Network-level error (DNS, connection refused, TLS, body read).
    #[error("network error requesting {url}: {source}")]
    Network {
        /// The URL that failed.
        url: String,
        /// The underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The response body was not the expected JSON shape.
    #[error("invalid response body from {url}: {source}")]
    Decode {
        /// The URL whose body failed to decode.
        url: String,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// The request URL could not be built.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The offending URL string.
        url: String,
    },

    /// The HTTP client could not be constructed.
    #[error("HTTP client construction failed: {message}")]
    ClientBuild {
        /// What went wrong.
        message: String,
    },
}

impl GraphError {
    /// Creates an unauthorized error.
    pub fn unauthorized(url: impl Into<String>) -> Self {
        Self::Unauthorized { url: url.into() }
    }

    /// Creates a throttled error.
    pub fn throttled(url: impl Into<String>, retry_after: Option<Duration>) -> Self {
        Self::Throttled {
            url: url.into(),
            retry_after,
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates a network error from a reqwest error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates a decode error.
    pub fn decode(url: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Decode {
            url: url.into(),
            source,
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates a client construction error.
    pub fn client_build(message: impl Into<String>) -> Self {
        Self::ClientBuild {
            message: message.into(),
        }
    }

    /// Returns true when the credential itself was rejected.
    #[must_use]
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    /// Server-requested delay carried by a throttling response.
    #[must_use]
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::Throttled { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    /// HTTP status code behind the error, when there was a response.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { .. } => Some(401),
            Self::Throttled { .. } => Some(429),
            Self::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}
