//! Data models shared across database access and API handlers.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Generic acknowledgement body returned by mutating endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

pub mod comment;
pub mod password_reset;
pub mod post;
pub mod user;
