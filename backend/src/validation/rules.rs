//! Common validation rules shared across request payloads.

use validator::ValidationError;

/// Shortest password accepted at sign-up and on reset.
pub const MIN_PASSWORD_LENGTH: usize = 8;
/// Upper bound that keeps hashing cost predictable.
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// Validates a new password against the account password policy.
///
/// Requirements:
/// - At least 8 characters
/// - At most 128 characters
pub fn validate_password_strength(password: &str) -> Result<(), ValidationError> {
    let length = password.chars().count();
    if length < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::new("password_too_short")
            .with_message("Password must be at least 8 characters".into()));
    }
    if length > MAX_PASSWORD_LENGTH {
        return Err(ValidationError::new("password_too_long")
            .with_message("Password must be at most 128 characters".into()));
    }
    Ok(())
}
