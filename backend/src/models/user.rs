//! Models that represent user accounts and sign-up payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::types::UserId;
use crate::validation::rules;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
/// Database representation of a registered account.
pub struct User {
    /// Unique identifier for the user.
    pub id: UserId,
    /// Display name shown on posts and comments.
    pub name: String,
    /// Contact address; unique without regard to case.
    pub email: String,
    /// Argon2 PHC string. Accounts created through an OAuth provider have none.
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    /// Avatar URL on the image host, if the user uploaded one.
    pub image: Option<String>,
    /// Creation timestamp for auditing.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp for auditing.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Constructs a new user with a freshly generated identifier.
    pub fn new(name: String, email: String, password_hash: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: UserId::new(),
            name,
            email,
            password_hash,
            image: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
/// Payload for creating a new account.
pub struct SignUpPayload {
    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(custom(function = "rules::validate_password_strength"))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
/// Payload for changing the password of the signed-in account.
pub struct ChangePasswordPayload {
    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,
    #[validate(custom(function = "rules::validate_password_strength"))]
    pub new_password: String,
}

/// The public face of an account as shown next to posts and comments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub id: UserId,
    pub name: String,
    pub image: Option<String>,
}

impl From<&User> for Author {
    fn from(user: &User) -> Self {
        Author {
            id: user.id,
            name: user.name.clone(),
            image: user.image.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthorResponse {
    pub id: String,
    pub name: String,
    pub image: Option<String>,
}

impl From<Author> for AuthorResponse {
    fn from(author: Author) -> Self {
        AuthorResponse {
            id: author.id.to_string(),
            name: author.name,
            image: author.image,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
/// Public-facing representation of an account returned by the API.
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub email: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse {
            id: user.id.to_string(),
            name: user.name,
            email: user.email,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_is_never_serialized() {
        let user = User::new(
            "Alice".to_string(),
            "alice@example.com".to_string(),
            Some("$argon2id$secret".to_string()),
        );
        let json = serde_json::to_value(&user).expect("serialize user");
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["email"], "alice@example.com");
    }

    #[test]
    fn author_view_omits_contact_details() {
        let mut user = User::new("Bob".into(), "bob@example.com".into(), Some("h".into()));
        user.image = Some("https://img.example.com/bob.png".into());
        let json = serde_json::to_value(AuthorResponse::from(Author::from(&user))).unwrap();
        assert_eq!(json["name"], "Bob");
        assert_eq!(json["image"], "https://img.example.com/bob.png");
        assert!(json.get("email").is_none());
    }

    #[test]
    fn change_password_payload_requires_both_fields() {
        let payload = ChangePasswordPayload {
            current_password: "".into(),
            new_password: "short".into(),
        };
        let errors = payload.validate().expect_err("payload should be rejected");
        let fields = errors.field_errors();
        assert!(fields.contains_key("current_password"));
        assert!(fields.contains_key("new_password"));
    }

    #[test]
    fn sign_up_payload_validation() {
        let valid = SignUpPayload {
            name: "Alice".into(),
            email: "alice@example.com".into(),
            password: "longenough".into(),
        };
        assert!(valid.validate().is_ok());

        let invalid = SignUpPayload {
            name: "".into(),
            email: "not-an-email".into(),
            password: "short".into(),
        };
        let errors = invalid.validate().expect_err("payload should be rejected");
        let fields = errors.field_errors();
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("password"));
    }

    #[test]
    fn user_response_exposes_public_fields_only() {
        let user = User::new("Carol".into(), "carol@example.com".into(), Some("h".into()));
        let id = user.id.to_string();
        let resp: UserResponse = user.into();
        assert_eq!(resp.id, id);
        assert_eq!(resp.name, "Carol");
    }
}
