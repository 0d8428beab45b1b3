//! Models for password reset functionality.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::types::{PasswordResetId, UserId};
use crate::validation::rules;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
/// Database representation of a password reset token.
///
/// There is no status column: a token is live while its row exists and
/// `expires_at` lies in the future. Consuming a reset deletes the row.
pub struct PasswordReset {
    /// Unique identifier for the password reset record.
    pub id: PasswordResetId,
    /// User ID associated with this reset token.
    pub user_id: UserId,
    /// SHA-256 hash of the reset token.
    pub token_hash: String,
    /// Timestamp when this token expires.
    pub expires_at: DateTime<Utc>,
    /// Issuance timestamp, also used for the resend cool-down.
    pub created_at: DateTime<Utc>,
}

impl PasswordReset {
    pub fn new(
        user_id: UserId,
        token_hash: String,
        issued_at: DateTime<Utc>,
        ttl: chrono::Duration,
    ) -> Self {
        Self {
            id: PasswordResetId::new(),
            user_id,
            token_hash,
            expires_at: issued_at + ttl,
            created_at: issued_at,
        }
    }

    /// Strictly-after comparison: a token is no longer valid at its expiry instant.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
/// Payload for requesting a password reset.
pub struct RequestPasswordResetPayload {
    /// Email address of the user requesting password reset.
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
/// Payload for checking whether a reset link can still be used.
pub struct ResetTokenValidityPayload {
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ResetTokenValidityResponse {
    pub valid: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
/// Payload for resetting password with a token.
pub struct ResetPasswordPayload {
    /// Password reset token from the email.
    #[validate(length(min = 1, message = "Invalid reset token"))]
    pub token: String,
    #[validate(custom(function = "rules::validate_password_strength"))]
    pub new_password: String,
}
