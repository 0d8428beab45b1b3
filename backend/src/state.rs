use std::sync::Arc;

use crate::{
    config::Config,
    db::connection::DbPool,
    repositories::{
        ContentRepository, PasswordResetRepository, PgContentRepository,
        PgPasswordResetRepository, PgUserRepository, UserRepository,
    },
    services::{AccountService, ContentService, PasswordResetService, ResetPolicy},
    utils::email::Mailer,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub accounts: AccountService,
    pub password_resets: PasswordResetService,
    pub content: ContentService,
}

impl AppState {
    pub fn new(
        config: Config,
        users: Arc<dyn UserRepository>,
        resets: Arc<dyn PasswordResetRepository>,
        content: Arc<dyn ContentRepository>,
        mailer: Arc<dyn Mailer>,
    ) -> anyhow::Result<Self> {
        let policy = ResetPolicy::from_config(&config)?;
        Ok(Self {
            accounts: AccountService::new(users.clone(), mailer.clone()),
            content: ContentService::new(content, users.clone()),
            password_resets: PasswordResetService::new(users, resets, mailer, policy),
            config,
        })
    }

    /// Wires every repository to the same Postgres pool.
    pub fn with_pool(
        config: Config,
        pool: DbPool,
        mailer: Arc<dyn Mailer>,
    ) -> anyhow::Result<Self> {
        Self::new(
            config,
            Arc::new(PgUserRepository::new(pool.clone())),
            Arc::new(PgPasswordResetRepository::new(pool.clone())),
            Arc::new(PgContentRepository::new(pool)),
            mailer,
        )
    }
}
