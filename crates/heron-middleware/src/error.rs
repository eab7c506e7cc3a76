//! Middleware error types.

use heron_core::HeaderError;
use http::StatusCode;
use thiserror::Error;

/// Result type returned by middleware, handlers and [`Next`](crate::Next).
pub type MiddlewareResult<T = ()> = Result<T, MiddlewareError>;

/// Errors that travel back up the middleware chain.
#[derive(Debug, Error)]
pub enum MiddlewareError {
    /// A header or status write was rejected by the response.
    #[error(transparent)]
    Header(#[from] HeaderError),

    /// Writing the response body failed.
    #[error("response body I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The handler reported a failure.
    #[error("handler failed with {status}: {message}")]
    Handler {
        /// Status the host should answer with.
        status: StatusCode,
        /// Human-readable message.
        message: String,
    },
}

impl MiddlewareError {
    /// Create a new handler error.
    pub fn handler(status: StatusCode, message: impl Into<String>) -> Self {
        Self::Handler {
            status,
            message: message.into(),
        }
    }

    /// Returns the status a host should answer with for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Handler { status, .. } => *status,
            Self::Header(_) | Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns a stable machine-readable code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Header(HeaderError::Committed { .. }) => "RESPONSE_COMMITTED",
            Self::Header(_) => "INVALID_HEADER",
            Self::Io(_) => "RESPONSE_IO",
            Self::Handler { .. } => "HANDLER_ERROR",
        }
    }
}
