pub mod email;
pub mod jwt;
pub mod password;
pub mod security;

pub use password::*;
pub use security::*;
