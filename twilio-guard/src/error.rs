//! Library error type.
//!
//! Only setup and operator-facing failures are errors. Rejected requests
//! (bad signature, wrong method, blacklisted caller) are ordinary responses.

use thiserror::Error;

/// Maximum length of a stored caller phone number.
pub const MAX_PHONE_NUMBER_LEN: usize = 20;

#[derive(Debug, Error)]
pub enum GuardError {
    /// The guard was configured with an HTTP method other than GET or POST.
    #[error("invalid HTTP method `{0}`: a Twilio view accepts only GET or POST")]
    InvalidMethod(String),

    /// A caller phone number is empty or longer than the column allows.
    #[error("invalid phone number `{0}`: must be 1 to {MAX_PHONE_NUMBER_LEN} characters")]
    InvalidPhoneNumber(String),

    /// The blacklist store failed.
    #[error("blacklist store error: {0}")]
    Store(#[from] sqlx::Error),
}

pub type Result<T> = std::result::Result<T, GuardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_method_message() {
        let err = GuardError::InvalidMethod("PUT".to_string());
        assert_eq!(
            err.to_string(),
            "invalid HTTP method `PUT`: a Twilio view accepts only GET or POST"
        );
    }

    #[test]
    fn test_invalid_phone_number_message() {
        let err = GuardError::InvalidPhoneNumber(String::new());
        assert!(err.to_string().contains("1 to 20 characters"));
    }
}
