pub mod config;
pub mod db;
pub mod docs;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod services;
pub mod state;
pub mod types;
pub mod utils;
pub mod validation;

use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::Config;
use crate::middleware::{AuthRateLimitLayer, REQUEST_ID_HEADER};
use crate::state::AppState;

/// Builds the HTTP application.
///
/// `rate_limiter` is applied to the `/api/auth` routes only. It keys on the
/// peer address, so callers passing one must serve the router with
/// `into_make_service_with_connect_info::<SocketAddr>()`.
///
/// Writes other than sign-up and the reset flow require a bearer token from
/// the session provider.
pub fn build_router(state: AppState, rate_limiter: Option<AuthRateLimitLayer>) -> Router {
    let require_user =
        axum_middleware::from_fn_with_state(state.clone(), middleware::auth::require_user);

    let member_auth_routes = Router::new()
        .route(
            "/api/auth/change-password",
            put(handlers::auth::change_password),
        )
        .route_layer(require_user.clone());

    let mut auth_routes = Router::new()
        .route("/api/auth/signup", post(handlers::auth::sign_up))
        .route(
            "/api/auth/forgot-password",
            post(handlers::auth::forgot_password),
        )
        .route(
            "/api/auth/reset-password/validity",
            post(handlers::auth::reset_token_validity),
        )
        .route(
            "/api/auth/reset-password",
            post(handlers::auth::reset_password),
        )
        .merge(member_auth_routes);
    if let Some(limiter) = rate_limiter {
        auth_routes = auth_routes.layer(limiter);
    }

    let public_content_routes = Router::new()
        .route("/api/posts", get(handlers::posts::list_posts))
        .route("/api/users/{user_id}/posts", get(handlers::posts::user_posts))
        .route(
            "/api/posts/{post_id}/comments",
            get(handlers::comments::list_comments),
        )
        .route(
            "/api/comments/{comment_id}",
            get(handlers::comments::get_comment),
        );

    let member_content_routes = Router::new()
        .route("/api/posts", post(handlers::posts::create_post))
        .route(
            "/api/posts/{post_id}/comments",
            post(handlers::comments::create_comment),
        )
        .route(
            "/api/comments/{comment_id}",
            put(handlers::comments::update_comment).delete(handlers::comments::delete_comment),
        )
        .route_layer(require_user);

    let cors = cors_layer(&state.config);

    Router::new()
        .merge(auth_routes)
        .merge(public_content_routes)
        .merge(member_content_routes)
        .merge(SwaggerUi::new("/api/docs").url("/api-doc/openapi.json", docs::ApiDoc::openapi()))
        .layer(axum_middleware::from_fn(
            middleware::logging::log_error_responses,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(axum_middleware::from_fn(middleware::request_id::request_id))
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_allow_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, REQUEST_ID_HEADER])
        .expose_headers([REQUEST_ID_HEADER])
        .max_age(std::time::Duration::from_secs(24 * 60 * 60))
}
