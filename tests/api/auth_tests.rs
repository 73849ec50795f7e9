//! Authentication API Tests

use axum::http::StatusCode;
use serde_json::json;

use crate::common::{unique_email, TestApp};

const LOGIN_FAILED: &str = "Unable to login with provided credentials.";

/// Test login with valid credentials returns the registration token
#[tokio::test]
async fn test_login_with_valid_credentials() {
    let app = TestApp::new();
    let email = unique_email();
    let registered = app.register("alice", &email, "ValidPassword123!").await;

    let response = app
        .post(
            "/api/v1/auth/login",
            json!({ "email": email, "password": "ValidPassword123!" }),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["email"], email.as_str());
    assert_eq!(response.body["username"], "alice");
    assert_eq!(response.body["token"], registered["token"]);
}

/// Test login with wrong password is forbidden
#[tokio::test]
async fn test_login_with_wrong_password_fails() {
    let app = TestApp::new();
    let email = unique_email();
    app.register("alice", &email, "ValidPassword123!").await;

    let response = app
        .post(
            "/api/v1/auth/login",
            json!({ "email": email, "password": "WrongPassword123!" }),
        )
        .await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.body["message"], LOGIN_FAILED);
}

/// Test login for an unknown email gives the same answer as a wrong password
#[tokio::test]
async fn test_login_with_unknown_email_fails() {
    let app = TestApp::new();

    let response = app
        .post(
            "/api/v1/auth/login",
            json!({ "email": unique_email(), "password": "ValidPassword123!" }),
        )
        .await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.body["message"], LOGIN_FAILED);
}

/// Test login validates the request body
#[tokio::test]
async fn test_login_with_invalid_email_fails() {
    let app = TestApp::new();

    let response = app
        .post(
            "/api/v1/auth/login",
            json!({ "email": "not-an-email", "password": "ValidPassword123!" }),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["errors"][0]["field"], "email");
}

/// Test the email domain is case-insensitive at login
#[tokio::test]
async fn test_login_normalizes_email_domain() {
    let app = TestApp::new();
    app.register("alice", "alice@Example.COM", "ValidPassword123!")
        .await;

    let response = app
        .post(
            "/api/v1/auth/login",
            json!({ "email": "alice@example.com", "password": "ValidPassword123!" }),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["email"], "alice@example.com");
}
