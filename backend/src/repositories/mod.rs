pub mod content;
pub mod memory;
pub mod password_reset;
pub mod user;

pub use content::{ContentRepository, PgContentRepository};
pub use memory::InMemoryStore;
pub use password_reset::{PasswordResetRepository, PgPasswordResetRepository, ResetOutcome};
pub use user::{PgUserRepository, UserRepository};
