use axum::http::StatusCode;
use scribe_backend::{repositories::UserRepository, utils::password::verify_password};
use serde_json::json;

mod support;

use support::{bearer_token, TestApp};

const PATH: &str = "/api/auth/change-password";

async fn stored_hash(app: &TestApp, email: &str) -> String {
    app.store
        .find_by_email(email)
        .await
        .expect("find user")
        .expect("user exists")
        .password_hash
        .expect("password set")
}

#[tokio::test]
async fn signed_in_user_changes_password_and_is_notified() {
    let mut app = TestApp::new();
    let user = app.seed_user("a@x.com", Some("oldpass1")).await;
    let token = bearer_token(&user);

    let (status, body) = app
        .send_json(
            "PUT",
            PATH,
            Some(json!({ "current_password": "oldpass1", "new_password": "newpass1" })),
            Some(&token),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["message"], "Password has been changed");

    let hash = stored_hash(&app, "a@x.com").await;
    assert!(verify_password("newpass1", &hash).unwrap());

    let email = app.outbox.next().await;
    assert_eq!(email.recipient, "a@x.com");
    assert_eq!(email.subject, "Your Scribe password was changed");
}

#[tokio::test]
async fn change_password_requires_a_valid_session() {
    let app = TestApp::new();
    app.seed_user("a@x.com", Some("oldpass1")).await;
    let body = json!({ "current_password": "oldpass1", "new_password": "newpass1" });

    for token in [None, Some("not-a-jwt")] {
        let (status, resp) = app.send_json("PUT", PATH, Some(body.clone()), token).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{resp}");
        assert_eq!(resp["code"], "UNAUTHORIZED");
    }

    // A token for an account that no longer exists is rejected too.
    let ghost = scribe_backend::models::user::User::new("Ghost".into(), "g@x.com".into(), None);
    let (status, _) = app
        .send_json("PUT", PATH, Some(body), Some(&bearer_token(&ghost)))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let hash = stored_hash(&app, "a@x.com").await;
    assert!(verify_password("oldpass1", &hash).unwrap());
}

#[tokio::test]
async fn wrong_current_or_unchanged_password_is_rejected() {
    let app = TestApp::new();
    let user = app.seed_user("a@x.com", Some("oldpass1")).await;
    let token = bearer_token(&user);

    let (status, body) = app
        .send_json(
            "PUT",
            PATH,
            Some(json!({ "current_password": "wrongpass", "new_password": "newpass1" })),
            Some(&token),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Current password is incorrect");

    let (status, body) = app
        .send_json(
            "PUT",
            PATH,
            Some(json!({ "current_password": "oldpass1", "new_password": "oldpass1" })),
            Some(&token),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        "New password must differ from the current password"
    );

    let (status, body) = app
        .send_json(
            "PUT",
            PATH,
            Some(json!({ "current_password": "oldpass1", "new_password": "short" })),
            Some(&token),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn account_without_password_cannot_change_it() {
    let app = TestApp::new();
    let user = app.seed_user("oauth@x.com", None).await;

    let (status, body) = app
        .send_json(
            "PUT",
            PATH,
            Some(json!({ "current_password": "anything", "new_password": "newpass1" })),
            Some(&bearer_token(&user)),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Password is not set for this account");
}
