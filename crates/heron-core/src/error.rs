//! Error types for header mutation.

use thiserror::Error;

/// Errors raised by a response handle when a header write is rejected.
///
/// The applicator never produces these itself; it forwards whatever the
/// underlying handle reports.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HeaderError {
    /// The header name is not a valid HTTP token.
    #[error("invalid header name: {name:?}")]
    InvalidName {
        /// The rejected name.
        name: String,
    },

    /// The header value contains bytes that cannot appear in a header.
    #[error("invalid value for header {name:?}")]
    InvalidValue {
        /// The header the value was destined for.
        name: String,
    },

    /// The response was already committed to the transport.
    #[error("response already committed, cannot modify header {name:?}")]
    Committed {
        /// The header the write targeted.
        name: String,
    },
}

impl HeaderError {
    /// Create a new invalid name error.
    pub fn invalid_name(name: impl Into<String>) -> Self {
        Self::InvalidName { name: name.into() }
    }

    /// Create a new invalid value error.
    pub fn invalid_value(name: impl Into<String>) -> Self {
        Self::InvalidValue { name: name.into() }
    }

    /// Create a new committed response error.
    pub fn committed(name: impl Into<String>) -> Self {
        Self::Committed { name: name.into() }
    }

    /// Returns the header name the failed write targeted.
    #[must_use]
    pub fn header_name(&self) -> &str {
        match self {
            Self::InvalidName { name } | Self::InvalidValue { name } | Self::Committed { name } => {
                name
            }
        }
    }
}
