//! Error types for the itch.io provider

use thiserror::Error;

/// itch.io provider errors
#[derive(Error, Debug)]
pub enum ItchError {
    /// Login was rejected or the API key is invalid
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// API request returned an error
    #[error("itch.io API error (status {status_code}): {message}")]
    ApiError { status_code: u16, message: String },

    /// Failed to parse an API response or listing page
    #[error("Failed to parse itch.io response: {0}")]
    ParseError(String),

    /// A game exposes no downloadable upload for its key
    #[error("No upload available for game {game_id}")]
    MissingUpload { game_id: u64 },

    /// An upload carries no content hash, so it cannot be reconciled
    #[error("Upload {upload_id} has no content hash")]
    MissingFingerprint { upload_id: u64 },

    /// Bridge error
    #[error(transparent)]
    BridgeError(#[from] bridge_traits::BridgeError),
}

/// Result type for itch.io operations
pub type Result<T> = std::result::Result<T, ItchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = ItchError::ApiError {
            status_code: 401,
            message: "invalid key".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "itch.io API error (status 401): invalid key"
        );
    }
}
