//! Posts and comments.
//!
//! Listings come back newest first: posts and comments by `updated_at`,
//! an author's own posts by `created_at`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use crate::error::AppError;
use crate::models::{
    comment::{Comment, CommentWithAuthor},
    post::{Post, PostWithAuthor},
    user::Author,
};
use crate::types::{CommentId, PostId, UserId};

pub const POST_NOT_FOUND_MESSAGE: &str = "Post not found";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContentRepository: Send + Sync {
    async fn create_post(&self, post: &Post) -> Result<Post, AppError>;

    /// Every post with its author
    async fn list_posts(&self) -> Result<Vec<PostWithAuthor>, AppError>;

    async fn list_posts_by_user(&self, user_id: UserId) -> Result<Vec<Post>, AppError>;

    /// Insert a comment; an unknown post yields `AppError::NotFound`
    async fn create_comment(&self, comment: &Comment) -> Result<Comment, AppError>;

    async fn find_comment(&self, id: CommentId) -> Result<Option<CommentWithAuthor>, AppError>;

    async fn list_comments(&self, post_id: PostId) -> Result<Vec<CommentWithAuthor>, AppError>;

    /// Returns the updated row, or `None` when the comment is gone
    async fn update_comment(
        &self,
        id: CommentId,
        content: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Comment>, AppError>;

    async fn delete_comment(&self, id: CommentId) -> Result<bool, AppError>;
}

#[derive(Clone)]
pub struct PgContentRepository {
    pool: PgPool,
}

impl PgContentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct PostWithAuthorRow {
    #[sqlx(flatten)]
    post: Post,
    author_name: String,
    author_image: Option<String>,
}

impl From<PostWithAuthorRow> for PostWithAuthor {
    fn from(row: PostWithAuthorRow) -> Self {
        let author = Author {
            id: row.post.user_id,
            name: row.author_name,
            image: row.author_image,
        };
        PostWithAuthor {
            post: row.post,
            author,
        }
    }
}

#[derive(FromRow)]
struct CommentWithAuthorRow {
    #[sqlx(flatten)]
    comment: Comment,
    author_name: String,
    author_image: Option<String>,
}

impl From<CommentWithAuthorRow> for CommentWithAuthor {
    fn from(row: CommentWithAuthorRow) -> Self {
        let author = Author {
            id: row.comment.user_id,
            name: row.author_name,
            image: row.author_image,
        };
        CommentWithAuthor {
            comment: row.comment,
            author,
        }
    }
}

const POST_COLUMNS: &str = "id, user_id, title, content, image, created_at, updated_at";
const COMMENT_COLUMNS: &str = "id, user_id, post_id, content, created_at, updated_at";

const COMMENT_WITH_AUTHOR_SELECT: &str = r#"
    SELECT c.id, c.user_id, c.post_id, c.content, c.created_at, c.updated_at,
           u.name AS author_name, u.image AS author_image
    FROM comments c
    JOIN users u ON u.id = c.user_id
"#;

#[async_trait]
impl ContentRepository for PgContentRepository {
    async fn create_post(&self, post: &Post) -> Result<Post, AppError> {
        let query = format!(
            "INSERT INTO posts ({POST_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {POST_COLUMNS}"
        );
        let record = sqlx::query_as::<_, Post>(&query)
            .bind(post.id)
            .bind(post.user_id)
            .bind(&post.title)
            .bind(&post.content)
            .bind(&post.image)
            .bind(post.created_at)
            .bind(post.updated_at)
            .fetch_one(&self.pool)
            .await?;
        Ok(record)
    }

    async fn list_posts(&self) -> Result<Vec<PostWithAuthor>, AppError> {
        let rows = sqlx::query_as::<_, PostWithAuthorRow>(
            r#"
            SELECT p.id, p.user_id, p.title, p.content, p.image, p.created_at, p.updated_at,
                   u.name AS author_name, u.image AS author_image
            FROM posts p
            JOIN users u ON u.id = p.user_id
            ORDER BY p.updated_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(PostWithAuthor::from).collect())
    }

    async fn list_posts_by_user(&self, user_id: UserId) -> Result<Vec<Post>, AppError> {
        let query =
            format!("SELECT {POST_COLUMNS} FROM posts WHERE user_id = $1 ORDER BY created_at DESC");
        let posts = sqlx::query_as::<_, Post>(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(posts)
    }

    async fn create_comment(&self, comment: &Comment) -> Result<Comment, AppError> {
        let query = format!(
            "INSERT INTO comments ({COMMENT_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COMMENT_COLUMNS}"
        );
        sqlx::query_as::<_, Comment>(&query)
            .bind(comment.id)
            .bind(comment.user_id)
            .bind(comment.post_id)
            .bind(&comment.content)
            .bind(comment.created_at)
            .bind(comment.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|err| match err {
                sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
                    AppError::NotFound(POST_NOT_FOUND_MESSAGE.to_string())
                }
                other => other.into(),
            })
    }

    async fn find_comment(&self, id: CommentId) -> Result<Option<CommentWithAuthor>, AppError> {
        let query = format!("{COMMENT_WITH_AUTHOR_SELECT} WHERE c.id = $1");
        let row = sqlx::query_as::<_, CommentWithAuthorRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(CommentWithAuthor::from))
    }

    async fn list_comments(&self, post_id: PostId) -> Result<Vec<CommentWithAuthor>, AppError> {
        let query =
            format!("{COMMENT_WITH_AUTHOR_SELECT} WHERE c.post_id = $1 ORDER BY c.updated_at DESC");
        let rows = sqlx::query_as::<_, CommentWithAuthorRow>(&query)
            .bind(post_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(CommentWithAuthor::from).collect())
    }

    async fn update_comment(
        &self,
        id: CommentId,
        content: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Comment>, AppError> {
        let query = format!(
            "UPDATE comments SET content = $1, updated_at = $2 WHERE id = $3 \
             RETURNING {COMMENT_COLUMNS}"
        );
        let comment = sqlx::query_as::<_, Comment>(&query)
            .bind(content)
            .bind(now)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(comment)
    }

    async fn delete_comment(&self, id: CommentId) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
