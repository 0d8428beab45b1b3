use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        comment::{CommentPayload, CommentResponse, CommentWithAuthorResponse, CommentsResponse},
        user::User,
        MessageResponse,
    },
    repositories::content::POST_NOT_FOUND_MESSAGE,
    services::content::COMMENT_NOT_FOUND_MESSAGE,
    state::AppState,
    types::{CommentId, PostId},
};

fn parse_post_id(raw: &str) -> Result<PostId, AppError> {
    raw.parse()
        .map_err(|_| AppError::NotFound(POST_NOT_FOUND_MESSAGE.to_string()))
}

fn parse_comment_id(raw: &str) -> Result<CommentId, AppError> {
    raw.parse()
        .map_err(|_| AppError::NotFound(COMMENT_NOT_FOUND_MESSAGE.to_string()))
}

pub async fn list_comments(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> Result<Json<CommentsResponse>, AppError> {
    let comments = match post_id.parse() {
        Ok(post_id) => state.content.list_comments(post_id).await?,
        Err(_) => Vec::new(),
    };
    Ok(Json(CommentsResponse {
        comments: comments
            .into_iter()
            .map(CommentWithAuthorResponse::from)
            .collect(),
    }))
}

/// Single comment with its author, or `null` when there is none.
pub async fn get_comment(
    State(state): State<AppState>,
    Path(comment_id): Path<String>,
) -> Result<Json<Option<CommentWithAuthorResponse>>, AppError> {
    let comment = match comment_id.parse() {
        Ok(comment_id) => state.content.find_comment(comment_id).await?,
        Err(_) => None,
    };
    Ok(Json(comment.map(CommentWithAuthorResponse::from)))
}

pub async fn create_comment(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(post_id): Path<String>,
    Json(payload): Json<CommentPayload>,
) -> Result<(StatusCode, Json<CommentResponse>), AppError> {
    let post_id = parse_post_id(&post_id)?;
    payload.validate()?;
    let comment = state
        .content
        .create_comment(&user, post_id, &payload.content)
        .await?;
    Ok((StatusCode::CREATED, Json(CommentResponse::from(comment))))
}

pub async fn update_comment(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(comment_id): Path<String>,
    Json(payload): Json<CommentPayload>,
) -> Result<Json<CommentResponse>, AppError> {
    let comment_id = parse_comment_id(&comment_id)?;
    payload.validate()?;
    let comment = state
        .content
        .update_comment(&user, comment_id, &payload.content)
        .await?;
    Ok(Json(CommentResponse::from(comment)))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(comment_id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let comment_id = parse_comment_id(&comment_id)?;
    state.content.delete_comment(&user, comment_id).await?;
    Ok(Json(MessageResponse::new("Comment deleted")))
}
