//! Integration tests for registration, login, and the auth gateway.

mod common;

use http::StatusCode;

#[tokio::test]
async fn test_register_success() {
    let app = common::TestApp::new().await;

    let response = app.register("a@x.com", "Passw0rd1").await;

    assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
    assert!(response.access_token().is_some());
    assert!(response.refresh_cookie().is_some());
    assert_eq!(
        response.body.get("user").unwrap().get("email").unwrap(),
        "a@x.com"
    );
    // The refresh token never appears in the body.
    assert!(response.body.get("refresh_token").is_none());
}

#[tokio::test]
async fn test_register_duplicate_email_conflicts() {
    let app = common::TestApp::new().await;
    app.register("dup@x.com", "Passw0rd1").await;

    let response = app.register("dup@x.com", "Passw0rd1").await;
    assert_eq!(response.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_register_rejects_weak_password() {
    let app = common::TestApp::new().await;

    // No uppercase, no digit.
    let response = app.register("weak@x.com", "alllowercase").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_register_rejects_invalid_email() {
    let app = common::TestApp::new().await;

    let response = app.register("not-an-email", "Passw0rd1").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_success_returns_same_identity() {
    let app = common::TestApp::new().await;
    let registered = app.register("login@x.com", "Passw0rd1").await;
    let registered_id = registered
        .body
        .pointer("/user/id")
        .unwrap()
        .as_str()
        .unwrap()
        .to_string();

    let token = app.login_token("login@x.com", "Passw0rd1").await;

    let me = app
        .request("GET", "/api/auth/me", None, Some(&token), None)
        .await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body.get("id").unwrap().as_str().unwrap(), registered_id);
}

#[tokio::test]
async fn test_login_wrong_password_unauthorized() {
    let app = common::TestApp::new().await;
    app.register("wrongpw@x.com", "Passw0rd1").await;

    let response = app.login("wrongpw@x.com", "Not-The-Pass1").await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_nonexistent_user_unauthorized() {
    let app = common::TestApp::new().await;

    let response = app.login("nobody@x.com", "Passw0rd1").await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_me_without_token() {
    let app = common::TestApp::new().await;

    let response = app.request("GET", "/api/auth/me", None, None, None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.error_code(), Some("AUTH_NO_TOKEN"));
}

#[tokio::test]
async fn test_me_with_malformed_token() {
    let app = common::TestApp::new().await;

    let response = app
        .request("GET", "/api/auth/me", None, Some("garbage"), None)
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.error_code(), Some("AUTH_MALFORMED"));
}

#[tokio::test]
async fn test_me_with_bad_signature() {
    let app = common::TestApp::new().await;
    app.register("sig@x.com", "Passw0rd1").await;
    let token = app.login_token("sig@x.com", "Passw0rd1").await;

    // Structurally fine, cryptographically broken.
    let tampered = format!("{token}x");
    let response = app
        .request("GET", "/api/auth/me", None, Some(&tampered), None)
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.error_code(), Some("AUTH_MALFORMED"));
}

#[tokio::test]
async fn test_update_profile() {
    let app = common::TestApp::new().await;
    app.register("profile@x.com", "Passw0rd1").await;
    let token = app.login_token("profile@x.com", "Passw0rd1").await;

    let response = app
        .request(
            "PUT",
            "/api/auth/profile",
            Some(serde_json::json!({ "display_name": "Traveler" })),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.body.get("display_name").unwrap().as_str().unwrap(),
        "Traveler"
    );
}

#[tokio::test]
async fn test_health_needs_no_auth() {
    let app = common::TestApp::new().await;

    let response = app.request("GET", "/api/health", None, None, None).await;
    assert_eq!(response.status, StatusCode::OK);
}
