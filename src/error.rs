use std::sync::Arc;

use crate::configuration::TargetingOperator;

/// Result type used throughout the crate, with [`Error`] as the error variant.
pub type Result<T> = std::result::Result<T, Error>;

/// Enum representing possible errors that can occur in the Varia decision engine.
#[derive(thiserror::Error, Debug, Clone)]
#[non_exhaustive]
pub enum Error {
    /// No configuration has been loaded successfully yet. Returned from a decision call only when
    /// the lazy reload triggered by that call fails as well.
    #[error("environment configuration has not been loaded")]
    ConfigurationMissing,

    /// Invalid base URL configuration.
    #[error("invalid base_url configuration")]
    InvalidBaseUrl(#[source] url::ParseError),

    /// The request was unauthorized, possibly due to an invalid API key.
    #[error("unauthorized, api_key is likely invalid")]
    Unauthorized,

    /// Indicates that the poller thread panicked. This should normally never happen.
    #[error("poller thread panicked")]
    PollerThreadPanicked,

    /// Assignment cache backend failure. The engine treats these as degraded-mode signals, never
    /// as decision failures.
    #[error("assignment cache error: {0}")]
    Cache(String),

    /// An I/O error.
    #[error(transparent)]
    // std::io::Error is not clonable, so we're wrapping it in an Arc.
    Io(Arc<std::io::Error>),

    /// Network error.
    #[error(transparent)]
    Network(Arc<reqwest::Error>),
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Self::Io(Arc::new(value))
    }
}

impl From<reqwest::Error> for Error {
    fn from(value: reqwest::Error) -> Self {
        Error::Network(Arc::new(value.without_url()))
    }
}

/// Errors produced by targeting tree evaluation.
///
/// These abort evaluation of the enclosing variation group's tree and are handled inside the
/// engine (the group is treated as non-matching); they are never surfaced to decision callers.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum TargetingError {
    /// The context value's type disagrees with the targeting operand's type.
    #[error("targeting and context value types mismatch")]
    TypeMismatch,

    /// The operator cannot be applied to values of this type (e.g. STARTS_WITH on numbers).
    #[error("operator {0:?} not handled for this value type")]
    UnhandledOperator(TargetingOperator),
}
