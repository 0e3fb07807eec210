//! Integration tests for refresh, rotation, logout, and password change.

mod common;

use http::StatusCode;

#[tokio::test]
async fn test_refresh_returns_new_access_token() {
    let app = common::TestApp::new().await;
    let registered = app.register("refresh@x.com", "Passw0rd1").await;
    let cookie = registered.refresh_cookie().unwrap();

    let response = app
        .request("POST", "/api/auth/refresh", None, None, Some(&cookie))
        .await;

    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
    assert!(response.access_token().is_some());
    assert!(response.body.get("expires_in").is_some());
}

#[tokio::test]
async fn test_refresh_without_cookie_rejected() {
    let app = common::TestApp::new().await;

    let response = app
        .request("POST", "/api/auth/refresh", None, None, None)
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.error_code(), Some("AUTH_NO_TOKEN"));
}

#[tokio::test]
async fn test_rotation_retires_previous_refresh_token() {
    let app = common::TestApp::with_rotation("always").await;
    let registered = app.register("rotate@x.com", "Passw0rd1").await;
    let old_cookie = registered.refresh_cookie().unwrap();

    let first = app
        .request("POST", "/api/auth/refresh", None, None, Some(&old_cookie))
        .await;
    assert_eq!(first.status, StatusCode::OK);
    let new_cookie = first.refresh_cookie().expect("Rotation must set a new cookie");
    assert_ne!(old_cookie, new_cookie);

    // The retired token no longer matches any session.
    let replay = app
        .request("POST", "/api/auth/refresh", None, None, Some(&old_cookie))
        .await;
    assert_eq!(replay.status, StatusCode::UNAUTHORIZED);
    assert_eq!(replay.error_code(), Some("AUTH_REVOKED"));

    // The rotated token keeps working.
    let second = app
        .request("POST", "/api/auth/refresh", None, None, Some(&new_cookie))
        .await;
    assert_eq!(second.status, StatusCode::OK);
}

#[tokio::test]
async fn test_never_rotation_keeps_cookie_valid() {
    let app = common::TestApp::with_rotation("never").await;
    let registered = app.register("keep@x.com", "Passw0rd1").await;
    let cookie = registered.refresh_cookie().unwrap();

    let first = app
        .request("POST", "/api/auth/refresh", None, None, Some(&cookie))
        .await;
    assert_eq!(first.status, StatusCode::OK);
    // No rotation: no replacement cookie is issued.
    assert!(first.refresh_cookie().is_none());

    let second = app
        .request("POST", "/api/auth/refresh", None, None, Some(&cookie))
        .await;
    assert_eq!(second.status, StatusCode::OK);
}

#[tokio::test]
async fn test_logout_removes_session() {
    let app = common::TestApp::new().await;
    let registered = app.register("logout@x.com", "Passw0rd1").await;
    let cookie = registered.refresh_cookie().unwrap();
    let token = registered.access_token().unwrap();

    let response = app
        .request("POST", "/api/auth/logout", None, Some(&token), Some(&cookie))
        .await;
    assert_eq!(response.status, StatusCode::OK);

    // The refresh token is gone server-side.
    let replay = app
        .request("POST", "/api/auth/refresh", None, None, Some(&cookie))
        .await;
    assert_eq!(replay.status, StatusCode::UNAUTHORIZED);

    // The still-unexpired access token keeps working until natural
    // expiry; revocation acts on sessions only.
    let me = app
        .request("GET", "/api/auth/me", None, Some(&token), None)
        .await;
    assert_eq!(me.status, StatusCode::OK);
}

#[tokio::test]
async fn test_logout_all_removes_every_session() {
    let app = common::TestApp::new().await;
    let registered = app.register("all@x.com", "Passw0rd1").await;
    let first_cookie = registered.refresh_cookie().unwrap();

    let second_login = app.login("all@x.com", "Passw0rd1").await;
    let second_cookie = second_login.refresh_cookie().unwrap();
    let token = second_login.access_token().unwrap();

    let response = app
        .request("POST", "/api/auth/logout-all", None, Some(&token), None)
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.body.get("revoked_count").unwrap().as_u64().unwrap(),
        2
    );

    for cookie in [&first_cookie, &second_cookie] {
        let replay = app
            .request("POST", "/api/auth/refresh", None, None, Some(cookie))
            .await;
        assert_eq!(replay.status, StatusCode::UNAUTHORIZED);
    }
}

#[tokio::test]
async fn test_password_change_invalidates_outstanding_tokens() {
    let app = common::TestApp::new().await;
    let registered = app.register("pwchange@x.com", "Passw0rd1").await;
    let old_cookie = registered.refresh_cookie().unwrap();
    let old_token = registered.access_token().unwrap();

    let response = app
        .request(
            "POST",
            "/api/auth/change-password",
            Some(serde_json::json!({
                "current_password": "Passw0rd1",
                "new_password": "N3w-Passw0rd",
            })),
            Some(&old_token),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);

    // The still-unexpired access token now predates the change.
    let me = app
        .request("GET", "/api/auth/me", None, Some(&old_token), None)
        .await;
    assert_eq!(me.status, StatusCode::UNAUTHORIZED);
    assert_eq!(me.error_code(), Some("AUTH_STALE_PASSWORD"));

    // Every refresh token was revoked.
    let replay = app
        .request("POST", "/api/auth/refresh", None, None, Some(&old_cookie))
        .await;
    assert_eq!(replay.status, StatusCode::UNAUTHORIZED);

    // The new password logs in.
    let login = app.login("pwchange@x.com", "N3w-Passw0rd").await;
    assert_eq!(login.status, StatusCode::OK);
}

#[tokio::test]
async fn test_change_password_requires_current() {
    let app = common::TestApp::new().await;
    let registered = app.register("current@x.com", "Passw0rd1").await;
    let token = registered.access_token().unwrap();

    let response = app
        .request(
            "POST",
            "/api/auth/change-password",
            Some(serde_json::json!({
                "current_password": "Wrong-Pass1",
                "new_password": "N3w-Passw0rd",
            })),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_sessions_listing_shows_devices() {
    let app = common::TestApp::new().await;
    app.register("devices@x.com", "Passw0rd1").await;
    app.login("devices@x.com", "Passw0rd1").await;
    let token = app.login_token("devices@x.com", "Passw0rd1").await;

    let response = app
        .request("GET", "/api/auth/sessions", None, Some(&token), None)
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let sessions = response.body.as_array().unwrap();
    assert_eq!(sessions.len(), 3);
    assert!(sessions.iter().all(|s| s.get("ip_address").is_some()));
}

#[tokio::test]
async fn test_session_cap_evicts_oldest() {
    let app = common::TestApp::new().await;
    let registered = app.register("cap@x.com", "Passw0rd1").await;
    let first_cookie = registered.refresh_cookie().unwrap();

    // The cap is 10; the registration session plus ten logins overflow it.
    for _ in 0..10 {
        let response = app.login("cap@x.com", "Passw0rd1").await;
        assert_eq!(response.status, StatusCode::OK);
    }

    let count: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM sessions s JOIN users u ON u.id = s.user_id \
         WHERE u.email = 'cap@x.com'",
    )
    .fetch_one(&app.db_pool)
    .await
    .unwrap();
    assert_eq!(count.0, 10);

    // The evicted (oldest) refresh token no longer works.
    let replay = app
        .request("POST", "/api/auth/refresh", None, None, Some(&first_cookie))
        .await;
    assert_eq!(replay.status, StatusCode::UNAUTHORIZED);
}
