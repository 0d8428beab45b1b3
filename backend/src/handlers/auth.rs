use axum::{extract::State, http::StatusCode, Extension, Json};
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        password_reset::{
            RequestPasswordResetPayload, ResetPasswordPayload, ResetTokenValidityPayload,
            ResetTokenValidityResponse,
        },
        user::{ChangePasswordPayload, SignUpPayload, User, UserResponse},
        MessageResponse,
    },
    state::AppState,
};

pub async fn sign_up(
    State(state): State<AppState>,
    Json(mut payload): Json<SignUpPayload>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    payload.name = payload.name.trim().to_string();
    payload.email = payload.email.trim().to_string();
    payload.validate()?;
    let user = state.accounts.sign_up(payload).await?;
    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

pub async fn forgot_password(
    State(state): State<AppState>,
    Json(mut payload): Json<RequestPasswordResetPayload>,
) -> Result<Json<MessageResponse>, AppError> {
    payload.email = payload.email.trim().to_string();
    payload.validate()?;
    state.password_resets.request_reset(&payload.email).await?;
    Ok(Json(MessageResponse::new(
        "Password reset link sent. Check your email",
    )))
}

pub async fn reset_token_validity(
    State(state): State<AppState>,
    Json(payload): Json<ResetTokenValidityPayload>,
) -> Result<Json<ResetTokenValidityResponse>, AppError> {
    let valid = state
        .password_resets
        .check_validity(payload.token.trim())
        .await?;
    Ok(Json(ResetTokenValidityResponse { valid }))
}

pub async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordPayload>,
) -> Result<Json<MessageResponse>, AppError> {
    payload.validate()?;
    state
        .password_resets
        .consume_reset(payload.token.trim(), &payload.new_password)
        .await?;
    Ok(Json(MessageResponse::new("Password has been reset")))
}

/// Changes the signed-in user's password after checking the current one.
pub async fn change_password(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(payload): Json<ChangePasswordPayload>,
) -> Result<Json<MessageResponse>, AppError> {
    payload.validate()?;
    state
        .accounts
        .change_password(user.id, &payload.current_password, &payload.new_password)
        .await?;
    Ok(Json(MessageResponse::new("Password has been changed")))
}
