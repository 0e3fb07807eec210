//! Integration tests for failed-login lockout.
//!
//! The lockout guard keys on (client IP, email); the TestApp sends no
//! X-Forwarded-For header, so every request shares one origin.

mod common;

use http::StatusCode;

#[tokio::test]
async fn test_sixth_attempt_locked_even_with_correct_password() {
    let app = common::TestApp::new().await;
    app.register("locked@x.com", "Passw0rd1").await;

    for _ in 0..5 {
        let response = app.login("locked@x.com", "Wrong-Pass1").await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    }

    // The sixth attempt is refused outright, correct password or not.
    let response = app.login("locked@x.com", "Passw0rd1").await;
    assert_eq!(response.status, StatusCode::LOCKED);
    let retry_after = response
        .body
        .get("retry_after_seconds")
        .and_then(|v| v.as_u64())
        .expect("Locked response must carry retry_after_seconds");
    assert!(retry_after > 0);
}

#[tokio::test]
async fn test_successful_login_resets_counter() {
    let app = common::TestApp::new().await;
    app.register("reset@x.com", "Passw0rd1").await;

    for _ in 0..4 {
        app.login("reset@x.com", "Wrong-Pass1").await;
    }

    // A correct login before the threshold clears the slate.
    let response = app.login("reset@x.com", "Passw0rd1").await;
    assert_eq!(response.status, StatusCode::OK);

    let row: (i32,) =
        sqlx::query_as("SELECT failed_login_attempts FROM users WHERE email = 'reset@x.com'")
            .fetch_one(&app.db_pool)
            .await
            .unwrap();
    assert_eq!(row.0, 0);

    // Four fresh failures still do not lock.
    for _ in 0..4 {
        let response = app.login("reset@x.com", "Wrong-Pass1").await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    }
    let response = app.login("reset@x.com", "Passw0rd1").await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_lockout_does_not_leak_across_accounts() {
    let app = common::TestApp::new().await;
    app.register("victim@x.com", "Passw0rd1").await;
    app.register("bystander@x.com", "Passw0rd1").await;

    for _ in 0..5 {
        app.login("victim@x.com", "Wrong-Pass1").await;
    }
    assert_eq!(
        app.login("victim@x.com", "Passw0rd1").await.status,
        StatusCode::LOCKED
    );

    // Same origin, different account: unaffected.
    assert_eq!(
        app.login("bystander@x.com", "Passw0rd1").await.status,
        StatusCode::OK
    );
}

#[tokio::test]
async fn test_unknown_email_failures_also_lock() {
    let app = common::TestApp::new().await;

    for _ in 0..5 {
        let response = app.login("ghost@x.com", "Whatever1!").await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    }

    let response = app.login("ghost@x.com", "Whatever1!").await;
    assert_eq!(response.status, StatusCode::LOCKED);
}
