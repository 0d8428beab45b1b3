//! Blog posts and the author-annotated views served by the public reads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::models::user::{Author, AuthorResponse};
use crate::types::{PostId, UserId};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
/// Database representation of a post.
pub struct Post {
    pub id: PostId,
    /// Author of the post.
    pub user_id: UserId,
    pub title: String,
    pub content: String,
    /// Cover image URL on the image host.
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    pub fn new(user_id: UserId, title: String, content: String) -> Self {
        let now = Utc::now();
        Self {
            id: PostId::new(),
            user_id,
            title,
            content,
            image: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A post together with the public details of its author.
#[derive(Debug, Clone)]
pub struct PostWithAuthor {
    pub post: Post,
    pub author: Author,
}

/// An account together with its posts, newest first.
#[derive(Debug, Clone)]
pub struct AuthorWithPosts {
    pub author: Author,
    pub posts: Vec<Post>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreatePostPayload {
    #[validate(length(min = 1, max = 200, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "Content is required"))]
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PostResponse {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub content: String,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Post> for PostResponse {
    fn from(post: Post) -> Self {
        PostResponse {
            id: post.id.to_string(),
            user_id: post.user_id.to_string(),
            title: post.title,
            content: post.content,
            image: post.image,
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PostWithAuthorResponse {
    #[serde(flatten)]
    pub post: PostResponse,
    pub user: AuthorResponse,
}

impl From<PostWithAuthor> for PostWithAuthorResponse {
    fn from(value: PostWithAuthor) -> Self {
        PostWithAuthorResponse {
            post: value.post.into(),
            user: value.author.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
/// Profile page view: the author's public details plus their posts.
pub struct AuthorPostsResponse {
    #[serde(flatten)]
    pub user: AuthorResponse,
    pub posts: Vec<PostResponse>,
}

impl From<AuthorWithPosts> for AuthorPostsResponse {
    fn from(value: AuthorWithPosts) -> Self {
        AuthorPostsResponse {
            user: value.author.into(),
            posts: value.posts.into_iter().map(PostResponse::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_with_author_flattens_post_fields() {
        let author = Author {
            id: UserId::new(),
            name: "Alice".into(),
            image: None,
        };
        let post = Post::new(author.id, "Hello".into(), "First post".into());
        let json = serde_json::to_value(PostWithAuthorResponse::from(PostWithAuthor {
            post,
            author: author.clone(),
        }))
        .unwrap();
        assert_eq!(json["title"], "Hello");
        assert_eq!(json["user_id"], author.id.to_string());
        assert_eq!(json["user"]["name"], "Alice");
        assert!(json["user"]["image"].is_null());
    }

    #[test]
    fn create_post_payload_requires_title_and_content() {
        let payload = CreatePostPayload {
            title: "".into(),
            content: "".into(),
        };
        let errors = payload.validate().expect_err("rejected");
        assert!(errors.field_errors().contains_key("title"));
        assert!(errors.field_errors().contains_key("content"));
    }
}
