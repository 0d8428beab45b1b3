use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

use crate::{error::AppError, state::AppState, types::UserId, utils::jwt::verify_access_token};

const SIGN_IN_REQUIRED: &str = "Sign in to continue";

/// Requires a valid bearer token and makes the signed-in `User` available
/// to handlers as an `Extension`.
pub async fn require_user(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let unauthorized = || AppError::Unauthorized(SIGN_IN_REQUIRED.to_string());

    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_bearer_token)
        .ok_or_else(unauthorized)?;

    let claims = verify_access_token(token, &state.config.auth_jwt_secret).map_err(|err| {
        tracing::debug!(error = %err, "Rejected access token");
        unauthorized()
    })?;
    let user_id: UserId = claims.sub.parse().map_err(|_| unauthorized())?;

    let user = state
        .accounts
        .find_user(user_id)
        .await?
        .ok_or_else(unauthorized)?;

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

fn parse_bearer_token(header: &str) -> Option<&str> {
    let (scheme, rest) = header.split_once(' ')?;
    let token = rest.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_scheme_is_case_insensitive() {
        assert_eq!(parse_bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(parse_bearer_token("bearer  abc"), Some("abc"));
        assert_eq!(parse_bearer_token("BEARER abc"), Some("abc"));
    }

    #[test]
    fn other_schemes_and_empty_tokens_are_rejected() {
        assert_eq!(parse_bearer_token("Basic abc"), None);
        assert_eq!(parse_bearer_token("Bearer "), None);
        assert_eq!(parse_bearer_token("Bearer"), None);
    }
}
