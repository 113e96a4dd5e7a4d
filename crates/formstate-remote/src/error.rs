//! Error types for the remote adapters.

use thiserror::Error;

/// Errors talking to the user service.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The request failed or returned an error status.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The response did not have the expected shape.
    #[error("unexpected payload: {0}")]
    UnexpectedPayload(String),

    /// A fetched value could not be placed in the form values.
    #[error("cannot place remote value: {0}")]
    Placement(#[from] formstate::FormError),
}

/// Result type alias for remote operations.
pub type Result<T> = std::result::Result<T, RemoteError>;
