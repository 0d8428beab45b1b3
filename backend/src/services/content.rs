use std::sync::Arc;

use chrono::Utc;

use crate::error::AppError;
use crate::models::{
    comment::{Comment, CommentWithAuthor},
    post::{AuthorWithPosts, Post, PostWithAuthor},
    user::{Author, User},
};
use crate::repositories::{ContentRepository, UserRepository};
use crate::types::{CommentId, PostId, UserId};

pub const COMMENT_NOT_FOUND_MESSAGE: &str = "Comment not found";

/// Posts and comments. Reads are public; writes act on behalf of a
/// signed-in author and comments can only be changed by whoever wrote them.
#[derive(Clone)]
pub struct ContentService {
    content: Arc<dyn ContentRepository>,
    users: Arc<dyn UserRepository>,
}

impl ContentService {
    pub fn new(content: Arc<dyn ContentRepository>, users: Arc<dyn UserRepository>) -> Self {
        Self { content, users }
    }

    pub async fn list_posts(&self) -> Result<Vec<PostWithAuthor>, AppError> {
        self.content.list_posts().await
    }

    /// Profile view of `user_id`. `None` for a missing id or an unknown user.
    pub async fn author_with_posts(
        &self,
        user_id: Option<UserId>,
    ) -> Result<Option<AuthorWithPosts>, AppError> {
        let Some(user_id) = user_id else {
            return Ok(None);
        };
        let Some(user) = self.users.find_by_id(user_id).await? else {
            return Ok(None);
        };
        let posts = self.content.list_posts_by_user(user.id).await?;
        Ok(Some(AuthorWithPosts {
            author: Author::from(&user),
            posts,
        }))
    }

    /// Publishes a text post. Cover images are attached by the image host
    /// integration, so a new post starts without one.
    pub async fn create_post(
        &self,
        author: &User,
        title: &str,
        content: &str,
    ) -> Result<Post, AppError> {
        let post = Post::new(author.id, title.to_string(), content.to_string());
        let post = self.content.create_post(&post).await?;
        tracing::info!(post_id = %post.id, user_id = %author.id, "Post created");
        Ok(post)
    }

    pub async fn list_comments(&self, post_id: PostId) -> Result<Vec<CommentWithAuthor>, AppError> {
        self.content.list_comments(post_id).await
    }

    pub async fn find_comment(
        &self,
        comment_id: CommentId,
    ) -> Result<Option<CommentWithAuthor>, AppError> {
        self.content.find_comment(comment_id).await
    }

    pub async fn create_comment(
        &self,
        author: &User,
        post_id: PostId,
        content: &str,
    ) -> Result<Comment, AppError> {
        let comment = Comment::new(author.id, post_id, content.to_string());
        self.content.create_comment(&comment).await
    }

    pub async fn update_comment(
        &self,
        author: &User,
        comment_id: CommentId,
        content: &str,
    ) -> Result<Comment, AppError> {
        self.owned_comment(author, comment_id).await?;
        self.content
            .update_comment(comment_id, content, Utc::now())
            .await?
            .ok_or_else(|| AppError::NotFound(COMMENT_NOT_FOUND_MESSAGE.to_string()))
    }

    pub async fn delete_comment(&self, author: &User, comment_id: CommentId) -> Result<(), AppError> {
        self.owned_comment(author, comment_id).await?;
        if !self.content.delete_comment(comment_id).await? {
            return Err(AppError::NotFound(COMMENT_NOT_FOUND_MESSAGE.to_string()));
        }
        tracing::info!(comment_id = %comment_id, user_id = %author.id, "Comment deleted");
        Ok(())
    }

    async fn owned_comment(&self, author: &User, comment_id: CommentId) -> Result<(), AppError> {
        let found = self
            .content
            .find_comment(comment_id)
            .await?
            .ok_or_else(|| AppError::NotFound(COMMENT_NOT_FOUND_MESSAGE.to_string()))?;
        if found.comment.user_id != author.id {
            tracing::warn!(
                comment_id = %comment_id,
                user_id = %author.id,
                "Rejected change to another user's comment"
            );
            return Err(AppError::Forbidden(
                "You can only change your own comments".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::content::MockContentRepository;
    use crate::repositories::InMemoryStore;

    struct Fixture {
        store: InMemoryStore,
        service: ContentService,
    }

    impl Fixture {
        fn new() -> Self {
            let store = InMemoryStore::new();
            let service = ContentService::new(Arc::new(store.clone()), Arc::new(store.clone()));
            Self { store, service }
        }

        async fn user(&self, email: &str) -> User {
            UserRepository::create(&self.store, &User::new("Writer".into(), email.into(), None))
                .await
                .expect("seed user")
        }
    }

    #[tokio::test]
    async fn author_with_posts_handles_missing_ids() {
        let f = Fixture::new();
        assert!(f.service.author_with_posts(None).await.unwrap().is_none());
        assert!(f
            .service
            .author_with_posts(Some(UserId::new()))
            .await
            .unwrap()
            .is_none());

        let writer = f.user("w@x.com").await;
        f.service
            .create_post(&writer, "Title", "Body")
            .await
            .expect("post");
        let profile = f
            .service
            .author_with_posts(Some(writer.id))
            .await
            .unwrap()
            .expect("profile");
        assert_eq!(profile.author.name, "Writer");
        assert_eq!(profile.posts.len(), 1);
        assert_eq!(profile.posts[0].title, "Title");
    }

    #[tokio::test]
    async fn only_the_author_may_edit_or_delete_a_comment() {
        let f = Fixture::new();
        let writer = f.user("w@x.com").await;
        let other = f.user("o@x.com").await;
        let post = f.service.create_post(&writer, "T", "B").await.unwrap();
        let comment = f
            .service
            .create_comment(&writer, post.id, "first")
            .await
            .unwrap();

        let err = f
            .service
            .update_comment(&other, comment.id, "hijack")
            .await
            .expect_err("not the author");
        assert!(matches!(err, AppError::Forbidden(_)));
        assert!(matches!(
            f.service.delete_comment(&other, comment.id).await,
            Err(AppError::Forbidden(_))
        ));

        let updated = f
            .service
            .update_comment(&writer, comment.id, "edited")
            .await
            .unwrap();
        assert_eq!(updated.content, "edited");
        assert!(updated.updated_at >= comment.updated_at);

        f.service.delete_comment(&writer, comment.id).await.unwrap();
        assert!(f.service.find_comment(comment.id).await.unwrap().is_none());
        assert!(matches!(
            f.service.delete_comment(&writer, comment.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn comment_vanishing_between_check_and_update_is_not_found() {
        let author = User::new("Writer".into(), "w@x.com".into(), None);
        let comment = Comment::new(author.id, PostId::new(), "text".into());
        let found = CommentWithAuthor {
            comment: comment.clone(),
            author: Author::from(&author),
        };

        let mut content = MockContentRepository::new();
        content
            .expect_find_comment()
            .returning(move |_| Ok(Some(found.clone())));
        content.expect_update_comment().returning(|_, _, _| Ok(None));
        let service = ContentService::new(Arc::new(content), Arc::new(InMemoryStore::new()));

        let err = service
            .update_comment(&author, comment.id, "edited")
            .await
            .expect_err("gone");
        assert!(matches!(err, AppError::NotFound(msg) if msg == COMMENT_NOT_FOUND_MESSAGE));
    }
}
