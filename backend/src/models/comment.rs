//! Comments on posts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::models::user::{Author, AuthorResponse};
use crate::types::{CommentId, PostId, UserId};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
/// Database representation of a comment.
pub struct Comment {
    pub id: CommentId,
    pub user_id: UserId,
    pub post_id: PostId,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Comment {
    pub fn new(user_id: UserId, post_id: PostId, content: String) -> Self {
        let now = Utc::now();
        Self {
            id: CommentId::new(),
            user_id,
            post_id,
            content,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CommentWithAuthor {
    pub comment: Comment,
    pub author: Author,
}

/// Body for creating or editing a comment.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CommentPayload {
    #[validate(length(min = 1, max = 2000, message = "Comment must be 1 to 2000 characters"))]
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CommentResponse {
    pub id: String,
    pub user_id: String,
    pub post_id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Comment> for CommentResponse {
    fn from(comment: Comment) -> Self {
        CommentResponse {
            id: comment.id.to_string(),
            user_id: comment.user_id.to_string(),
            post_id: comment.post_id.to_string(),
            content: comment.content,
            created_at: comment.created_at,
            updated_at: comment.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CommentWithAuthorResponse {
    #[serde(flatten)]
    pub comment: CommentResponse,
    pub user: AuthorResponse,
}

impl From<CommentWithAuthor> for CommentWithAuthorResponse {
    fn from(value: CommentWithAuthor) -> Self {
        CommentWithAuthorResponse {
            comment: value.comment.into(),
            user: value.author.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CommentsResponse {
    pub comments: Vec<CommentWithAuthorResponse>,
}
