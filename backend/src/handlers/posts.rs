use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        post::{AuthorPostsResponse, CreatePostPayload, PostResponse, PostWithAuthorResponse},
        user::User,
    },
    state::AppState,
};

pub async fn list_posts(
    State(state): State<AppState>,
) -> Result<Json<Vec<PostWithAuthorResponse>>, AppError> {
    let posts = state.content.list_posts().await?;
    Ok(Json(
        posts.into_iter().map(PostWithAuthorResponse::from).collect(),
    ))
}

pub async fn create_post(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(mut payload): Json<CreatePostPayload>,
) -> Result<(StatusCode, Json<PostResponse>), AppError> {
    payload.title = payload.title.trim().to_string();
    payload.validate()?;
    let post = state
        .content
        .create_post(&user, &payload.title, &payload.content)
        .await?;
    Ok((StatusCode::CREATED, Json(PostResponse::from(post))))
}

/// Profile page data. Unknown or malformed ids yield `null`.
pub async fn user_posts(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Option<AuthorPostsResponse>>, AppError> {
    let profile = state
        .content
        .author_with_posts(user_id.parse().ok())
        .await?;
    Ok(Json(profile.map(AuthorPostsResponse::from)))
}
