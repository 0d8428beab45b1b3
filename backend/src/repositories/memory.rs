//! Process-local store implementing every repository trait.
//!
//! Accounts, tokens, posts and comments live behind one mutex, so every trait method is
//! atomic with respect to every other. Backs the service and API tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::AppError;
use crate::models::{
    comment::{Comment, CommentWithAuthor},
    password_reset::PasswordReset,
    post::{Post, PostWithAuthor},
    user::{Author, User},
};
use crate::repositories::content::{ContentRepository, POST_NOT_FOUND_MESSAGE};
use crate::repositories::password_reset::{PasswordResetRepository, ResetOutcome};
use crate::repositories::user::{UserRepository, DUPLICATE_EMAIL_MESSAGE};
use crate::types::{CommentId, PasswordResetId, PostId, UserId};

#[derive(Default)]
struct StoreState {
    users: HashMap<UserId, User>,
    resets: HashMap<PasswordResetId, PasswordReset>,
    posts: HashMap<PostId, Post>,
    comments: HashMap<CommentId, Comment>,
}

impl StoreState {
    fn author_of(&self, user_id: UserId) -> Option<Author> {
        self.users.get(&user_id).map(Author::from)
    }

    fn comment_with_author(&self, comment: &Comment) -> Option<CommentWithAuthor> {
        self.author_of(comment.user_id).map(|author| CommentWithAuthor {
            comment: comment.clone(),
            author,
        })
    }
}

#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<StoreState>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, StoreState>, AppError> {
        self.state
            .lock()
            .map_err(|_| AppError::InternalServerError(anyhow::anyhow!("store lock poisoned")))
    }

    /// Removes an account row but leaves its tokens behind, which the
    /// Postgres foreign key would never allow. Lets tests reach the
    /// missing-owner branches of the reset flow.
    pub fn remove_user_keeping_tokens(&self, user_id: UserId) -> Result<(), AppError> {
        self.lock()?.users.remove(&user_id);
        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, AppError> {
        Ok(self.lock()?.users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let needle = email.trim().to_lowercase();
        Ok(self
            .lock()?
            .users
            .values()
            .find(|user| user.email.to_lowercase() == needle)
            .cloned())
    }

    async fn create(&self, user: &User) -> Result<User, AppError> {
        let mut state = self.lock()?;
        let email = user.email.to_lowercase();
        if state
            .users
            .values()
            .any(|existing| existing.email.to_lowercase() == email)
        {
            return Err(AppError::Conflict(DUPLICATE_EMAIL_MESSAGE.to_string()));
        }
        state.users.insert(user.id, user.clone());
        Ok(user.clone())
    }

    async fn update_password(
        &self,
        id: UserId,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let mut state = self.lock()?;
        let Some(user) = state.users.get_mut(&id) else {
            return Ok(false);
        };
        user.password_hash = Some(password_hash.to_string());
        user.updated_at = now;
        Ok(true)
    }
}

#[async_trait]
impl ContentRepository for InMemoryStore {
    async fn create_post(&self, post: &Post) -> Result<Post, AppError> {
        let mut state = self.lock()?;
        if !state.users.contains_key(&post.user_id) {
            return Err(AppError::InternalServerError(anyhow::anyhow!(
                "post references unknown user {}",
                post.user_id
            )));
        }
        state.posts.insert(post.id, post.clone());
        Ok(post.clone())
    }

    async fn list_posts(&self) -> Result<Vec<PostWithAuthor>, AppError> {
        let state = self.lock()?;
        let mut posts: Vec<PostWithAuthor> = state
            .posts
            .values()
            .filter_map(|post| {
                state.author_of(post.user_id).map(|author| PostWithAuthor {
                    post: post.clone(),
                    author,
                })
            })
            .collect();
        posts.sort_by(|a, b| b.post.updated_at.cmp(&a.post.updated_at));
        Ok(posts)
    }

    async fn list_posts_by_user(&self, user_id: UserId) -> Result<Vec<Post>, AppError> {
        let mut posts: Vec<Post> = self
            .lock()?
            .posts
            .values()
            .filter(|post| post.user_id == user_id)
            .cloned()
            .collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(posts)
    }

    async fn create_comment(&self, comment: &Comment) -> Result<Comment, AppError> {
        let mut state = self.lock()?;
        if !state.posts.contains_key(&comment.post_id) {
            return Err(AppError::NotFound(POST_NOT_FOUND_MESSAGE.to_string()));
        }
        state.comments.insert(comment.id, comment.clone());
        Ok(comment.clone())
    }

    async fn find_comment(&self, id: CommentId) -> Result<Option<CommentWithAuthor>, AppError> {
        let state = self.lock()?;
        Ok(state
            .comments
            .get(&id)
            .and_then(|comment| state.comment_with_author(comment)))
    }

    async fn list_comments(&self, post_id: PostId) -> Result<Vec<CommentWithAuthor>, AppError> {
        let state = self.lock()?;
        let mut comments: Vec<CommentWithAuthor> = state
            .comments
            .values()
            .filter(|comment| comment.post_id == post_id)
            .filter_map(|comment| state.comment_with_author(comment))
            .collect();
        comments.sort_by(|a, b| b.comment.updated_at.cmp(&a.comment.updated_at));
        Ok(comments)
    }

    async fn update_comment(
        &self,
        id: CommentId,
        content: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Comment>, AppError> {
        let mut state = self.lock()?;
        Ok(state.comments.get_mut(&id).map(|comment| {
            comment.content = content.to_string();
            comment.updated_at = now;
            comment.clone()
        }))
    }

    async fn delete_comment(&self, id: CommentId) -> Result<bool, AppError> {
        Ok(self.lock()?.comments.remove(&id).is_some())
    }
}

#[async_trait]
impl PasswordResetRepository for InMemoryStore {
    async fn create(&self, reset: &PasswordReset) -> Result<PasswordReset, AppError> {
        let mut state = self.lock()?;
        if !state.users.contains_key(&reset.user_id) {
            return Err(AppError::InternalServerError(anyhow::anyhow!(
                "password reset references unknown user {}",
                reset.user_id
            )));
        }
        if state
            .resets
            .values()
            .any(|existing| existing.token_hash == reset.token_hash)
        {
            return Err(AppError::InternalServerError(anyhow::anyhow!(
                "duplicate password reset token hash"
            )));
        }
        state.resets.insert(reset.id, reset.clone());
        Ok(reset.clone())
    }

    async fn find_recent_active(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
        issued_after: DateTime<Utc>,
    ) -> Result<Option<PasswordReset>, AppError> {
        Ok(self
            .lock()?
            .resets
            .values()
            .filter(|reset| {
                reset.user_id == user_id && reset.expires_at > now && reset.created_at > issued_after
            })
            .max_by_key(|reset| reset.created_at)
            .cloned())
    }

    async fn find_by_token_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<PasswordReset>, AppError> {
        Ok(self
            .lock()?
            .resets
            .values()
            .find(|reset| reset.token_hash == token_hash)
            .cloned())
    }

    async fn find_with_user(
        &self,
        token_hash: &str,
    ) -> Result<Option<(PasswordReset, Option<User>)>, AppError> {
        let state = self.lock()?;
        Ok(state
            .resets
            .values()
            .find(|reset| reset.token_hash == token_hash)
            .map(|reset| (reset.clone(), state.users.get(&reset.user_id).cloned())))
    }

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<PasswordReset>, AppError> {
        let mut resets: Vec<PasswordReset> = self
            .lock()?
            .resets
            .values()
            .filter(|reset| reset.user_id == user_id)
            .cloned()
            .collect();
        resets.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(resets)
    }

    async fn complete_reset(
        &self,
        reset_id: PasswordResetId,
        user_id: UserId,
        new_password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<ResetOutcome, AppError> {
        let mut state = self.lock()?;

        let owned_by_user = state
            .resets
            .get(&reset_id)
            .is_some_and(|reset| reset.user_id == user_id);
        if !owned_by_user {
            return Ok(ResetOutcome::TokenAlreadyConsumed);
        }
        let Some(user) = state.users.get_mut(&user_id) else {
            return Ok(ResetOutcome::AccountMissing);
        };

        user.password_hash = Some(new_password_hash.to_string());
        user.updated_at = now;

        let before = state.resets.len();
        state.resets.retain(|_, reset| reset.user_id != user_id);
        let revoked_tokens = (before - state.resets.len()) as u64;

        Ok(ResetOutcome::Completed { revoked_tokens })
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let mut state = self.lock()?;
        let before = state.resets.len();
        state.resets.retain(|_, reset| reset.expires_at >= now);
        Ok((before - state.resets.len()) as u64)
    }
}
