pub mod account;
pub mod content;
pub mod password_reset;

pub use account::AccountService;
pub use content::ContentService;
pub use password_reset::{PasswordResetError, PasswordResetService, ResetPolicy};
