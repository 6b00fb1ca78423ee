//! Error types surfaced by the library.

use thiserror::Error;

/// A payload whose structure cannot be normalized.
///
/// Missing or null numeric leaves never produce this; they count as 0.
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("malformed metrics payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IntervalError {
    #[error("Invalid time interval format. Use '30mins', '15mins', '5mins', or '1min'.")]
    Format,
    #[error("Invalid time interval format: {0}")]
    Number(String),
}

/// Failure of one fetch-and-normalize cycle.
#[derive(Debug, Error)]
pub enum RefreshError<E: std::error::Error + 'static> {
    #[error("metrics fetch failed: {0}")]
    Transport(#[source] E),
    #[error(transparent)]
    Payload(#[from] PayloadError),
}
