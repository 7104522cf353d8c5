//! Error handling for the Matchpoint client

use thiserror::Error;

/// Unified error type for the Matchpoint client
#[derive(Error, Debug)]
pub enum Error {
    /// Network or connectivity errors (no usable response)
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// A well-formed error response from the backend, or a non-2xx
    /// status with a fallback message
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// A 2xx body that did not match any accepted shape
    #[error("normalization error: {0}")]
    Normalization(#[from] NormalizationError),

    /// JSON serialization or deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing errors
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Token persistence errors
    #[error(transparent)]
    TokenStore(#[from] crate::auth::TokenStoreError),
}

impl Error {
    /// Create a new API error from a status code and message
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Error::Api {
            status,
            message: message.into(),
        }
    }

    /// The message to surface to the user for this error
    pub fn user_message(&self) -> String {
        match self {
            Error::Api { message, .. } => message.clone(),
            Error::Transport(_) => "Could not reach the server".to_string(),
            other => other.to_string(),
        }
    }
}

/// A 2xx response body that decoded as JSON but matched none of the
/// accepted shapes for its response kind
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NormalizationError {
    /// A field the canonical model requires was absent in every strategy
    #[error("missing required field: {field}")]
    MissingRequiredField { field: &'static str },

    /// The body matched none of the known envelope shapes
    #[error("unrecognized response shape")]
    UnrecognizedShape,
}

/// Generic user-facing message for a status code whose error body could
/// not be parsed
pub(crate) fn fallback_message(status: u16) -> String {
    match status {
        400 => "Invalid request".to_string(),
        401 => "Invalid credentials".to_string(),
        403 => "Access denied".to_string(),
        404 => "Not found".to_string(),
        409 => "Already exists".to_string(),
        500..=599 => "Server error, please try again later".to_string(),
        other => format!("Request failed with status {}", other),
    }
}
