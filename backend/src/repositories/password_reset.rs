use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use crate::error::AppError;
use crate::models::{password_reset::PasswordReset, user::User};
use crate::types::{PasswordResetId, UserId};

/// Result of the atomic "set new password and revoke every token" write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResetOutcome {
    /// Password updated; `revoked_tokens` rows were deleted for the account.
    Completed { revoked_tokens: u64 },
    /// The token had already been removed by a concurrent reset. Nothing was written.
    TokenAlreadyConsumed,
    /// The owning account no longer exists. Nothing was written.
    AccountMissing,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PasswordResetRepository: Send + Sync {
    async fn create(&self, reset: &PasswordReset) -> Result<PasswordReset, AppError>;

    /// Newest token for `user_id` that is still valid at `now` and was issued after `issued_after`.
    async fn find_recent_active(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
        issued_after: DateTime<Utc>,
    ) -> Result<Option<PasswordReset>, AppError>;

    async fn find_by_token_hash(&self, token_hash: &str)
        -> Result<Option<PasswordReset>, AppError>;

    /// Token row plus its owner. The owner is `None` when the account row is gone.
    async fn find_with_user(
        &self,
        token_hash: &str,
    ) -> Result<Option<(PasswordReset, Option<User>)>, AppError>;

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<PasswordReset>, AppError>;

    /// In one transaction: delete every token owned by `user_id` and, if
    /// `reset_id` was among them, store `new_password_hash` on the account.
    async fn complete_reset(
        &self,
        reset_id: PasswordResetId,
        user_id: UserId,
        new_password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<ResetOutcome, AppError>;

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError>;
}

#[derive(Clone)]
pub struct PgPasswordResetRepository {
    pool: PgPool,
}

impl PgPasswordResetRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ResetWithUserRow {
    id: PasswordResetId,
    user_id: UserId,
    token_hash: String,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
    account_id: Option<UserId>,
    account_name: Option<String>,
    account_email: Option<String>,
    account_password_hash: Option<String>,
    account_image: Option<String>,
    account_created_at: Option<DateTime<Utc>>,
    account_updated_at: Option<DateTime<Utc>>,
}

impl ResetWithUserRow {
    fn into_parts(self) -> (PasswordReset, Option<User>) {
        let user = match (
            self.account_id,
            self.account_name,
            self.account_email,
            self.account_created_at,
            self.account_updated_at,
        ) {
            (Some(id), Some(name), Some(email), Some(created_at), Some(updated_at)) => Some(User {
                id,
                name,
                email,
                password_hash: self.account_password_hash,
                image: self.account_image,
                created_at,
                updated_at,
            }),
            _ => None,
        };
        let reset = PasswordReset {
            id: self.id,
            user_id: self.user_id,
            token_hash: self.token_hash,
            expires_at: self.expires_at,
            created_at: self.created_at,
        };
        (reset, user)
    }
}

#[async_trait]
impl PasswordResetRepository for PgPasswordResetRepository {
    async fn create(&self, reset: &PasswordReset) -> Result<PasswordReset, AppError> {
        let record = sqlx::query_as::<_, PasswordReset>(
            r#"
            INSERT INTO password_reset_tokens (id, user_id, token_hash, expires_at, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, token_hash, expires_at, created_at
            "#,
        )
        .bind(reset.id)
        .bind(reset.user_id)
        .bind(&reset.token_hash)
        .bind(reset.expires_at)
        .bind(reset.created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(record)
    }

    async fn find_recent_active(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
        issued_after: DateTime<Utc>,
    ) -> Result<Option<PasswordReset>, AppError> {
        let record = sqlx::query_as::<_, PasswordReset>(
            r#"
            SELECT id, user_id, token_hash, expires_at, created_at
            FROM password_reset_tokens
            WHERE user_id = $1
            AND expires_at > $2
            AND created_at > $3
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .bind(now)
        .bind(issued_after)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn find_by_token_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<PasswordReset>, AppError> {
        let record = sqlx::query_as::<_, PasswordReset>(
            r#"
            SELECT id, user_id, token_hash, expires_at, created_at
            FROM password_reset_tokens
            WHERE token_hash = $1
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn find_with_user(
        &self,
        token_hash: &str,
    ) -> Result<Option<(PasswordReset, Option<User>)>, AppError> {
        let row = sqlx::query_as::<_, ResetWithUserRow>(
            r#"
            SELECT r.id, r.user_id, r.token_hash, r.expires_at, r.created_at,
                   u.id AS account_id,
                   u.name AS account_name,
                   u.email AS account_email,
                   u.password_hash AS account_password_hash,
                   u.image AS account_image,
                   u.created_at AS account_created_at,
                   u.updated_at AS account_updated_at
            FROM password_reset_tokens r
            LEFT JOIN users u ON u.id = r.user_id
            WHERE r.token_hash = $1
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(ResetWithUserRow::into_parts))
    }

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<PasswordReset>, AppError> {
        let records = sqlx::query_as::<_, PasswordReset>(
            r#"
            SELECT id, user_id, token_hash, expires_at, created_at
            FROM password_reset_tokens
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    async fn complete_reset(
        &self,
        reset_id: PasswordResetId,
        user_id: UserId,
        new_password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<ResetOutcome, AppError> {
        let mut tx = self.pool.begin().await?;

        // Row locks taken here serialize concurrent resets for the same account.
        let revoked: Vec<PasswordResetId> = sqlx::query_scalar(
            "DELETE FROM password_reset_tokens WHERE user_id = $1 RETURNING id",
        )
        .bind(user_id)
        .fetch_all(&mut *tx)
        .await?;

        if !revoked.contains(&reset_id) {
            tx.rollback().await?;
            return Ok(ResetOutcome::TokenAlreadyConsumed);
        }

        let updated =
            sqlx::query("UPDATE users SET password_hash = $1, updated_at = $2 WHERE id = $3")
                .bind(new_password_hash)
                .bind(now)
                .bind(user_id)
                .execute(&mut *tx)
                .await?;

        if updated.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(ResetOutcome::AccountMissing);
        }

        tx.commit().await?;

        Ok(ResetOutcome::Completed {
            revoked_tokens: revoked.len() as u64,
        })
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let result = sqlx::query(
            r#"
            DELETE FROM password_reset_tokens
            WHERE expires_at < $1
            "#,
        )
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
