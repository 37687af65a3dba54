//! Error type for gateway operations.

/// Error type for gateway operations.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The gateway API returned an error.
    #[error("gateway API error: {error_type} - {message}")]
    Api {
        /// Error type.
        error_type: String,
        /// Error message.
        message: String,
        /// Error code.
        code: Option<String>,
    },
}
