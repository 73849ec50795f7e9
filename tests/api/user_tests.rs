//! User API Tests

use axum::http::{Method, StatusCode};
use serde_json::json;

use crate::common::{unique_email, TestApp};

/// Test user registration with valid data
#[tokio::test]
async fn test_register_with_valid_data() {
    let app = TestApp::new();

    let body = app
        .register("alice", &unique_email(), "ValidPassword123!")
        .await;

    assert_eq!(body["username"], "alice");
    let tag = body["tag"].as_i64().unwrap();
    assert!((1..=9999).contains(&tag));
    assert!(body["token"].as_str().unwrap().starts_with("v1."));
    assert!(body.get("password").is_none());
    assert_eq!(app.users.len(), 1);
}

/// Test the registration token authenticates immediately
#[tokio::test]
async fn test_register_token_authenticates() {
    let app = TestApp::new();
    let email = unique_email();
    let body = app.register("alice", &email, "ValidPassword123!").await;
    let token = body["token"].as_str().unwrap();

    let response = app.get("/api/v1/users/@me", Some(token)).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["id"], body["id"]);
    assert_eq!(response.body["email"], email.as_str());
    assert_eq!(response.body["token"], token);
}

/// Test registration fails with invalid fields
#[tokio::test]
async fn test_register_with_invalid_data_fails() {
    let app = TestApp::new();

    let response = app
        .post(
            "/api/v1/users",
            json!({ "username": "a", "email": "not-an-email", "password": "short" }),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    let fields: Vec<&str> = response.body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["email", "password", "username"]);
}

/// Test registration fails with duplicate email
#[tokio::test]
async fn test_register_with_duplicate_email_fails() {
    let app = TestApp::new();
    let email = unique_email();
    app.register("alice", &email, "ValidPassword123!").await;

    let response = app
        .post(
            "/api/v1/users",
            json!({ "username": "bob", "email": email, "password": "ValidPassword123!" }),
        )
        .await;

    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.body["message"], "This email is already in use.");
}

/// Test users sharing a username get distinct tags
#[tokio::test]
async fn test_shared_username_distinct_tags() {
    let app = TestApp::new();

    let first = app
        .register("alice", &unique_email(), "ValidPassword123!")
        .await;
    let second = app
        .register("alice", &unique_email(), "ValidPassword123!")
        .await;

    assert_ne!(first["tag"], second["tag"]);
}

/// Test fetching another user's public profile
#[tokio::test]
async fn test_get_user_by_id() {
    let app = TestApp::new();
    let alice = app
        .register("alice", &unique_email(), "ValidPassword123!")
        .await;
    let bob = app.register("bob", &unique_email(), "ValidPassword123!").await;

    let uri = format!("/api/v1/users/{}", alice["id"].as_str().unwrap());
    let response = app.get(&uri, bob["token"].as_str()).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["username"], "alice");
    assert_eq!(response.body["tag"], alice["tag"]);
    assert!(response.body.get("email").is_none());
    assert!(response.body.get("token").is_none());
}

/// Test unknown and non-numeric ids are not found
#[tokio::test]
async fn test_get_unknown_user_not_found() {
    let app = TestApp::new();
    let body = app
        .register("alice", &unique_email(), "ValidPassword123!")
        .await;
    let token = body["token"].as_str();

    for uri in ["/api/v1/users/1", "/api/v1/users/not-a-number"] {
        let response = app.get(uri, token).await;
        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert_eq!(response.body["message"], "User not found.");
    }
}

/// Test profiles require authentication
#[tokio::test]
async fn test_get_user_requires_auth() {
    let app = TestApp::new();

    let response = app.get("/api/v1/users/1", None).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

/// Test a password change revokes earlier tokens
#[tokio::test]
async fn test_change_password_revokes_tokens() {
    let app = TestApp::new();
    let email = unique_email();
    let body = app.register("alice", &email, "ValidPassword123!").await;
    let old_token = body["token"].as_str().unwrap();

    let response = app
        .request(
            Method::PUT,
            "/api/v1/users/@me/password",
            Some(json!({
                "current_password": "ValidPassword123!",
                "new_password": "NewPassword456!"
            })),
            Some(old_token),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let new_token = response.body["token"].as_str().unwrap().to_string();
    assert_ne!(new_token, old_token);

    let response = app.get("/api/v1/users/@me", Some(old_token)).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let response = app.get("/api/v1/users/@me", Some(&new_token)).await;
    assert_eq!(response.status, StatusCode::OK);

    let response = app
        .post(
            "/api/v1/auth/login",
            json!({ "email": email, "password": "NewPassword456!" }),
        )
        .await;
    assert_eq!(response.body["token"], new_token.as_str());
}

/// Test a password change needs the current password
#[tokio::test]
async fn test_change_password_wrong_current() {
    let app = TestApp::new();
    let body = app
        .register("alice", &unique_email(), "ValidPassword123!")
        .await;
    let token = body["token"].as_str().unwrap();

    let response = app
        .request(
            Method::PUT,
            "/api/v1/users/@me/password",
            Some(json!({
                "current_password": "NotMyPassword1",
                "new_password": "NewPassword456!"
            })),
            Some(token),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["errors"][0]["field"], "current_password");

    let response = app.get("/api/v1/users/@me", Some(token)).await;
    assert_eq!(response.status, StatusCode::OK);
}
