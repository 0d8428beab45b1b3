#![allow(dead_code)] // OpenAPI doc stubs are only referenced by utoipa macros.

use utoipa::{
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
    Modify, OpenApi,
};

use crate::error::ErrorResponse;
use crate::models::{
    comment::{CommentPayload, CommentResponse, CommentWithAuthorResponse, CommentsResponse},
    password_reset::{
        RequestPasswordResetPayload, ResetPasswordPayload, ResetTokenValidityPayload,
        ResetTokenValidityResponse,
    },
    post::{AuthorPostsResponse, CreatePostPayload, PostResponse, PostWithAuthorResponse},
    user::{AuthorResponse, ChangePasswordPayload, SignUpPayload, UserResponse},
    MessageResponse,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        sign_up_doc,
        forgot_password_doc,
        reset_token_validity_doc,
        reset_password_doc,
        change_password_doc,
        list_posts_doc,
        create_post_doc,
        user_posts_doc,
        list_comments_doc,
        create_comment_doc,
        get_comment_doc,
        update_comment_doc,
        delete_comment_doc
    ),
    components(schemas(
        SignUpPayload,
        UserResponse,
        RequestPasswordResetPayload,
        ResetTokenValidityPayload,
        ResetTokenValidityResponse,
        ResetPasswordPayload,
        ChangePasswordPayload,
        AuthorResponse,
        PostResponse,
        PostWithAuthorResponse,
        AuthorPostsResponse,
        CreatePostPayload,
        CommentPayload,
        CommentResponse,
        CommentWithAuthorResponse,
        CommentsResponse,
        MessageResponse,
        ErrorResponse
    )),
    modifiers(&SecuritySchemes),
    tags(
        (name = "Auth", description = "Account sign-up, password reset and password change"),
        (name = "Posts", description = "Blog posts and author profiles"),
        (name = "Comments", description = "Comments on posts")
    )
)]
pub struct ApiDoc;

struct SecuritySchemes;

impl Modify for SecuritySchemes {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_default();

        let mut bearer = Http::new(HttpAuthScheme::Bearer);
        bearer.bearer_format = Some("JWT".to_string());

        components.add_security_scheme("BearerAuth", SecurityScheme::Http(bearer));
    }
}

#[utoipa::path(
    post,
    path = "/api/auth/signup",
    request_body = SignUpPayload,
    responses(
        (status = 201, description = "Account created", body = UserResponse),
        (status = 400, description = "Invalid payload", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse)
    ),
    tag = "Auth"
)]
fn sign_up_doc() {}

#[utoipa::path(
    post,
    path = "/api/auth/forgot-password",
    request_body = RequestPasswordResetPayload,
    responses(
        (status = 200, description = "Reset link issued and mailed", body = MessageResponse),
        (status = 400, description = "Invalid email", body = ErrorResponse),
        (status = 404, description = "No account for this email", body = ErrorResponse),
        (status = 429, description = "A reset was requested recently", body = ErrorResponse)
    ),
    tag = "Auth"
)]
fn forgot_password_doc() {}

#[utoipa::path(
    post,
    path = "/api/auth/reset-password/validity",
    request_body = ResetTokenValidityPayload,
    responses(
        (status = 200, description = "Whether the token can still be used", body = ResetTokenValidityResponse)
    ),
    tag = "Auth"
)]
fn reset_token_validity_doc() {}

#[utoipa::path(
    post,
    path = "/api/auth/reset-password",
    request_body = ResetPasswordPayload,
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 400, description = "Invalid, expired or unchanged", body = ErrorResponse)
    ),
    tag = "Auth"
)]
fn reset_password_doc() {}

#[utoipa::path(
    put,
    path = "/api/auth/change-password",
    request_body = ChangePasswordPayload,
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 400, description = "Wrong current password, unchanged, or no password set", body = ErrorResponse),
        (status = 401, description = "Not signed in", body = ErrorResponse)
    ),
    tag = "Auth",
    security(("BearerAuth" = []))
)]
fn change_password_doc() {}

#[utoipa::path(
    get,
    path = "/api/posts",
    responses((status = 200, description = "All posts, most recently updated first", body = Vec<PostWithAuthorResponse>)),
    tag = "Posts"
)]
fn list_posts_doc() {}

#[utoipa::path(
    post,
    path = "/api/posts",
    request_body = CreatePostPayload,
    responses(
        (status = 201, description = "Post published", body = PostResponse),
        (status = 400, description = "Invalid payload", body = ErrorResponse),
        (status = 401, description = "Not signed in", body = ErrorResponse)
    ),
    tag = "Posts",
    security(("BearerAuth" = []))
)]
fn create_post_doc() {}

#[utoipa::path(
    get,
    path = "/api/users/{user_id}/posts",
    params(("user_id" = String, Path, description = "Account id")),
    responses((status = 200, description = "Author with posts, newest first; null for unknown accounts", body = AuthorPostsResponse)),
    tag = "Posts"
)]
fn user_posts_doc() {}

#[utoipa::path(
    get,
    path = "/api/posts/{post_id}/comments",
    params(("post_id" = String, Path, description = "Post id")),
    responses((status = 200, description = "Comments, most recently updated first", body = CommentsResponse)),
    tag = "Comments"
)]
fn list_comments_doc() {}

#[utoipa::path(
    post,
    path = "/api/posts/{post_id}/comments",
    params(("post_id" = String, Path, description = "Post id")),
    request_body = CommentPayload,
    responses(
        (status = 201, description = "Comment added", body = CommentResponse),
        (status = 401, description = "Not signed in", body = ErrorResponse),
        (status = 404, description = "Unknown post", body = ErrorResponse)
    ),
    tag = "Comments",
    security(("BearerAuth" = []))
)]
fn create_comment_doc() {}

#[utoipa::path(
    get,
    path = "/api/comments/{comment_id}",
    params(("comment_id" = String, Path, description = "Comment id")),
    responses((status = 200, description = "Comment with its author; null when absent", body = CommentWithAuthorResponse)),
    tag = "Comments"
)]
fn get_comment_doc() {}

#[utoipa::path(
    put,
    path = "/api/comments/{comment_id}",
    params(("comment_id" = String, Path, description = "Comment id")),
    request_body = CommentPayload,
    responses(
        (status = 200, description = "Comment edited", body = CommentResponse),
        (status = 401, description = "Not signed in", body = ErrorResponse),
        (status = 403, description = "Someone else's comment", body = ErrorResponse),
        (status = 404, description = "Unknown comment", body = ErrorResponse)
    ),
    tag = "Comments",
    security(("BearerAuth" = []))
)]
fn update_comment_doc() {}

#[utoipa::path(
    delete,
    path = "/api/comments/{comment_id}",
    params(("comment_id" = String, Path, description = "Comment id")),
    responses(
        (status = 200, description = "Comment deleted", body = MessageResponse),
        (status = 401, description = "Not signed in", body = ErrorResponse),
        (status = 403, description = "Someone else's comment", body = ErrorResponse),
        (status = 404, description = "Unknown comment", body = ErrorResponse)
    ),
    tag = "Comments",
    security(("BearerAuth" = []))
)]
fn delete_comment_doc() {}
