use std::sync::Arc;

use chrono::Utc;

use crate::error::AppError;
use crate::models::user::{SignUpPayload, User};
use crate::repositories::user::{UserRepository, DUPLICATE_EMAIL_MESSAGE};
use crate::services::password_reset::PasswordResetError;
use crate::types::UserId;
use crate::utils::email::{self, Mailer};
use crate::utils::password::{hash_password_blocking, matches_stored_password_blocking};
use crate::validation::rules::validate_password_strength;

pub const USER_NOT_FOUND_MESSAGE: &str = "User not found";
pub const PASSWORD_NOT_SET_MESSAGE: &str = "Password is not set for this account";
pub const CURRENT_PASSWORD_MISMATCH_MESSAGE: &str = "Current password is incorrect";

#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn UserRepository>,
    mailer: Arc<dyn Mailer>,
}

impl AccountService {
    pub fn new(users: Arc<dyn UserRepository>, mailer: Arc<dyn Mailer>) -> Self {
        Self { users, mailer }
    }

    /// Registers a password account. Expects an already validated payload.
    pub async fn sign_up(&self, payload: SignUpPayload) -> Result<User, AppError> {
        let email = payload.email.trim().to_string();
        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict(DUPLICATE_EMAIL_MESSAGE.to_string()));
        }

        let password_hash = hash_password_blocking(&payload.password).await?;
        let user = User::new(payload.name.trim().to_string(), email, Some(password_hash));
        let user = self.users.create(&user).await?;
        tracing::info!(user_id = %user.id, "Account created");
        Ok(user)
    }

    pub async fn find_user(&self, id: UserId) -> Result<Option<User>, AppError> {
        self.users.find_by_id(id).await
    }

    /// Replaces the password of a signed-in account after checking the
    /// current one. Accounts created through OAuth have no password to change.
    pub async fn change_password(
        &self,
        user_id: UserId,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        validate_password_strength(new_password)
            .map_err(|_| AppError::from(PasswordResetError::InvalidPassword))?;

        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::BadRequest(USER_NOT_FOUND_MESSAGE.to_string()))?;
        let Some(stored_hash) = user.password_hash.as_deref() else {
            return Err(AppError::BadRequest(PASSWORD_NOT_SET_MESSAGE.to_string()));
        };

        if !matches_stored_password_blocking(current_password, Some(stored_hash)).await? {
            tracing::warn!(user_id = %user.id, "Password change rejected: wrong current password");
            return Err(AppError::BadRequest(
                CURRENT_PASSWORD_MISMATCH_MESSAGE.to_string(),
            ));
        }
        if matches_stored_password_blocking(new_password, Some(stored_hash)).await? {
            return Err(PasswordResetError::PasswordUnchanged.into());
        }

        let new_hash = hash_password_blocking(new_password).await?;
        let now = Utc::now();
        if !self.users.update_password(user.id, &new_hash, now).await? {
            return Err(AppError::BadRequest(USER_NOT_FOUND_MESSAGE.to_string()));
        }
        tracing::info!(user_id = %user.id, "Password changed");

        email::dispatch(
            self.mailer.clone(),
            email::password_changed_email(&user.email, &user.name, now),
        );
        Ok(())
    }
}
