use std::net::SocketAddr;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use scribe_backend::{
    build_router,
    config::Config,
    db::connection::{create_pool, run_migrations},
    middleware::create_auth_rate_limiter,
    state::AppState,
    utils::email::build_mailer,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "scribe_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load()?;
    tracing::info!(
        bind_addr = %config.bind_addr,
        app_url = %config.app_url,
        token_ttl_hours = config.password_reset_token_ttl_hours,
        resend_cooldown_minutes = config.password_reset_resend_cooldown_minutes,
        smtp_host = %config.smtp.host,
        smtp_skip_send = config.smtp.skip_send,
        "Loaded configuration from environment/.env"
    );

    let pool = create_pool(&config).await?;
    run_migrations(&pool).await?;

    let mailer = build_mailer(&config.smtp)?;
    let rate_limiter = create_auth_rate_limiter(&config)?;
    let bind_addr = config.bind_addr;

    let state = AppState::with_pool(config, pool, mailer)?;
    let app = build_router(state, Some(rate_limiter));

    tracing::info!("Server listening on {}", bind_addr);
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
