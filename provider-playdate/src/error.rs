//! Error types for the Playdate portal provider

use thiserror::Error;

/// Playdate portal errors
#[derive(Error, Debug)]
pub enum PlaydateError {
    /// Sign-in was rejected
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The portal returned an error page
    #[error("Playdate portal error (status {status_code}): {message}")]
    PortalError { status_code: u16, message: String },

    /// A scraped page is missing an expected element
    #[error("Failed to parse portal page: {0}")]
    ParseError(String),

    /// No CSRF token on a page that must carry one
    #[error("No CSRF token found on portal page")]
    MissingCsrf,

    /// Bridge error
    #[error(transparent)]
    BridgeError(#[from] bridge_traits::BridgeError),
}

/// Result type for Playdate portal operations
pub type Result<T> = std::result::Result<T, PlaydateError>;
