use chrono::Utc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use scribe_backend::{
    config::Config,
    db::connection::create_pool,
    repositories::{PasswordResetRepository, PgPasswordResetRepository},
};

/// Removes password reset tokens past their expiry. Consumed tokens are
/// already gone, so only abandoned links accumulate.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "token_cleanup=info,scribe_backend=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load()?;
    let pool = create_pool(&config).await?;
    let resets = PgPasswordResetRepository::new(pool.clone());

    let deleted_count = resets
        .delete_expired(Utc::now())
        .await
        .map_err(|err| anyhow::anyhow!("cleanup expired password reset tokens: {err}"))?;
    tracing::info!(deleted_count, "Deleted expired password reset tokens");

    sqlx::query("VACUUM (ANALYZE) password_reset_tokens")
        .execute(&pool)
        .await?;

    Ok(())
}
