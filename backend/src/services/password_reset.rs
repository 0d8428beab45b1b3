//! Password reset token lifecycle: issue, check, consume.
//!
//! A token is live while its row exists and `expires_at` is in the future.
//! There is no status flag; consuming a reset deletes every token the
//! account owns.

use std::sync::Arc;

use chrono::{Duration, Utc};

use crate::config::Config;
use crate::error::AppError;
use crate::models::password_reset::PasswordReset;
use crate::repositories::{PasswordResetRepository, ResetOutcome, UserRepository};
use crate::utils::email::{self, Mailer};
use crate::utils::password::{hash_password_blocking, matches_stored_password_blocking};
use crate::utils::security::{generate_token, hash_token, RESET_TOKEN_BYTES};
use crate::validation::rules::validate_password_strength;

#[derive(Debug, thiserror::Error)]
pub enum PasswordResetError {
    #[error("User not found")]
    NotFound,
    #[error("A password reset was already requested. Please try again in an hour")]
    TooManyRequests,
    #[error("Invalid reset token. Please request a new password reset")]
    InvalidToken,
    #[error("Reset token has expired. Please request a new password reset")]
    ExpiredToken,
    #[error("New password must differ from the current password")]
    PasswordUnchanged,
    #[error("Account not found")]
    AccountNotFound,
    #[error("Password must be between 8 and 128 characters")]
    InvalidPassword,
    #[error(transparent)]
    Internal(#[from] AppError),
}

impl From<PasswordResetError> for AppError {
    fn from(err: PasswordResetError) -> Self {
        let message = err.to_string();
        match err {
            PasswordResetError::Internal(inner) => inner,
            PasswordResetError::NotFound => AppError::NotFound(message),
            PasswordResetError::TooManyRequests => AppError::TooManyRequests(message),
            PasswordResetError::InvalidToken
            | PasswordResetError::ExpiredToken
            | PasswordResetError::PasswordUnchanged
            | PasswordResetError::AccountNotFound
            | PasswordResetError::InvalidPassword => AppError::BadRequest(message),
        }
    }
}

impl From<anyhow::Error> for PasswordResetError {
    fn from(err: anyhow::Error) -> Self {
        PasswordResetError::Internal(AppError::InternalServerError(err))
    }
}

/// Durations and link settings for the reset flow.
#[derive(Debug, Clone)]
pub struct ResetPolicy {
    pub token_ttl: Duration,
    pub resend_cooldown: Duration,
    pub app_url: String,
}

impl ResetPolicy {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Ok(Self {
            token_ttl: config.password_reset_token_ttl()?,
            resend_cooldown: config.password_reset_resend_cooldown()?,
            app_url: config.app_url.clone(),
        })
    }

    fn reset_url(&self, token: &str) -> String {
        format!("{}/reset-password/{}", self.app_url, token)
    }
}

#[derive(Clone)]
pub struct PasswordResetService {
    users: Arc<dyn UserRepository>,
    resets: Arc<dyn PasswordResetRepository>,
    mailer: Arc<dyn Mailer>,
    policy: ResetPolicy,
}

impl PasswordResetService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        resets: Arc<dyn PasswordResetRepository>,
        mailer: Arc<dyn Mailer>,
        policy: ResetPolicy,
    ) -> Self {
        Self {
            users,
            resets,
            mailer,
            policy,
        }
    }

    /// Issues a reset token for the account registered under `email` and
    /// mails the link. Returns the raw token; it is never stored.
    ///
    /// Two concurrent calls can both pass the cool-down check and issue a
    /// token each. Both stay single-use through the bulk delete on reset.
    pub async fn request_reset(&self, email: &str) -> Result<String, PasswordResetError> {
        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or(PasswordResetError::NotFound)?;

        let now = Utc::now();
        let recent = self
            .resets
            .find_recent_active(user.id, now, now - self.policy.resend_cooldown)
            .await?;
        if recent.is_some() {
            tracing::info!(user_id = %user.id, "Password reset throttled by resend cool-down");
            return Err(PasswordResetError::TooManyRequests);
        }

        let token = generate_token(RESET_TOKEN_BYTES);
        let reset = PasswordReset::new(user.id, hash_token(&token), now, self.policy.token_ttl);
        let reset = self.resets.create(&reset).await?;
        tracing::info!(
            user_id = %user.id,
            reset_id = %reset.id,
            expires_at = %reset.expires_at,
            "Password reset token issued"
        );

        email::dispatch(
            self.mailer.clone(),
            email::password_reset_email(
                &user.email,
                &self.policy.reset_url(&token),
                self.policy.token_ttl.num_hours(),
            ),
        );

        Ok(token)
    }

    /// Read-only check used to gate the reset page. Never consumes the token.
    pub async fn check_validity(&self, token: &str) -> Result<bool, PasswordResetError> {
        if token.is_empty() {
            return Ok(false);
        }
        let reset = self.resets.find_by_token_hash(&hash_token(token)).await?;
        Ok(reset.is_some_and(|reset| reset.is_valid_at(Utc::now())))
    }

    /// Sets a new password using `token` and revokes every outstanding token
    /// of the account in the same transaction.
    pub async fn consume_reset(
        &self,
        token: &str,
        new_password: &str,
    ) -> Result<(), PasswordResetError> {
        if token.is_empty() {
            return Err(PasswordResetError::InvalidToken);
        }
        validate_password_strength(new_password)
            .map_err(|_| PasswordResetError::InvalidPassword)?;

        let (reset, user) = self
            .resets
            .find_with_user(&hash_token(token))
            .await?
            .ok_or(PasswordResetError::InvalidToken)?;
        let user = user.ok_or(PasswordResetError::AccountNotFound)?;

        let now = Utc::now();
        if reset.is_expired_at(now) {
            return Err(PasswordResetError::ExpiredToken);
        }

        if matches_stored_password_blocking(new_password, user.password_hash.as_deref()).await? {
            return Err(PasswordResetError::PasswordUnchanged);
        }

        let new_hash = hash_password_blocking(new_password).await?;
        match self
            .resets
            .complete_reset(reset.id, user.id, &new_hash, now)
            .await?
        {
            ResetOutcome::Completed { revoked_tokens } => {
                tracing::info!(
                    user_id = %user.id,
                    revoked_tokens,
                    "Password reset completed"
                );
            }
            ResetOutcome::TokenAlreadyConsumed => {
                tracing::warn!(user_id = %user.id, "Reset token consumed concurrently");
                return Err(PasswordResetError::InvalidToken);
            }
            ResetOutcome::AccountMissing => return Err(PasswordResetError::AccountNotFound),
        }

        email::dispatch(
            self.mailer.clone(),
            email::password_changed_email(&user.email, &user.name, now),
        );

        Ok(())
    }
}
