//! Error types for the account core.

use thiserror::Error;

/// Result type for account and recovery operations.
pub type AuthResult<T> = Result<T, AuthError>;

/// Why a signed reset token was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("token has expired")]
    Expired,

    #[error("token is malformed")]
    Malformed,

    #[error("token signature does not match")]
    BadSignature,

    /// Only raised by single-use redemption.
    #[error("token has already been used")]
    AlreadyUsed,
}

/// Errors surfaced to the caller of an account operation. All of them are
/// recoverable at the request boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("this email address is already registered")]
    DuplicateEmail,

    #[error("this username is already taken")]
    DuplicateUsername,

    #[error("email address is not in a valid format")]
    InvalidEmailShape,

    #[error("username must be between 2 and 20 characters")]
    InvalidUsername,

    #[error("password must be at least {min_length} characters long")]
    WeakPassword { min_length: usize },

    #[error("email address or password is incorrect")]
    BadCredentials,

    #[error("the code is invalid or has expired")]
    ChallengeExpiredOrInvalid,

    #[error("the reset link is invalid or has expired: {0}")]
    TokenExpiredOrInvalid(#[from] TokenError),

    #[error("the new passwords do not match")]
    PasswordMismatch,

    #[error("failed to deliver email: {0}")]
    DeliveryError(String),

    #[error("no account found")]
    AccountNotFound,

    #[error("invalid profile: {0}")]
    InvalidProfile(String),
}

/// Failures of the persistence layer beneath the account store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("encryption error: {0}")]
    Crypto(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("keyring error: {0}")]
    Keyring(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_are_user_facing() {
        assert_eq!(
            AuthError::WeakPassword { min_length: 8 }.to_string(),
            "password must be at least 8 characters long"
        );
        assert_eq!(
            AuthError::from(TokenError::Expired).to_string(),
            "the reset link is invalid or has expired: token has expired"
        );
    }
}
