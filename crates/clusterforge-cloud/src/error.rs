//! Stack provider error types

use thiserror::Error;

/// Stack provider errors
///
/// "Stack already exists" is not an error; it is reported as
/// [`crate::CreateStackOutcome::AlreadyExists`].
#[derive(Error, Debug)]
pub enum CloudError {
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid stack name: {0}")]
    InvalidStackName(String),

    #[error("Timeout: {0}")]
    Timeout(String),
}

pub type Result<T> = std::result::Result<T, CloudError>;
