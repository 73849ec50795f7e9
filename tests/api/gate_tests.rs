//! Authentication gate behavior over HTTP
//!
//! A header in the wrong shape is an anonymous request (401 "not provided"
//! on a protected route); a `Token` header carrying a bad token is rejected
//! with 401 "Invalid token." and a `Token` challenge.

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
};
use test_case::test_case;

use crate::common::{failing_router, send, TestApp};

const NOT_PROVIDED: &str = "Authentication credentials were not provided.";

async fn me_with_header(app: &TestApp, header: Option<&str>) -> crate::common::TestResponse {
    app.request_with_header(Method::GET, "/api/v1/users/@me", None, header)
        .await
}

#[tokio::test]
async fn test_valid_token_authenticates() {
    let app = TestApp::new();
    let user = app.seed_user(42, "a@b.com", "h1").await;
    let token = app.codec.token_for(&user);

    let response = app.get("/api/v1/users/@me", Some(&token)).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["id"], "42");
    assert_eq!(response.body["token"], token.as_str());
}

#[test_case(None ; "no header")]
#[test_case(Some("Token") ; "scheme only")]
#[test_case(Some("Token abc extra") ; "three words")]
#[test_case(Some("token abc") ; "lowercase scheme")]
#[test_case(Some("") ; "empty header")]
#[tokio::test]
async fn test_wrong_shape_is_anonymous(header: Option<&str>) {
    let app = TestApp::new();

    let response = me_with_header(&app, header).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["message"], NOT_PROVIDED);
    assert_eq!(response.headers["www-authenticate"], "Token");
}

#[tokio::test]
async fn test_bearer_with_valid_token_is_anonymous() {
    let app = TestApp::new();
    let user = app.seed_user(42, "a@b.com", "h1").await;
    let token = app.codec.token_for(&user);

    let response = me_with_header(&app, Some(&format!("Bearer {}", token))).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["message"], NOT_PROVIDED);
}

#[test_case("v2.NDI.AAAA" ; "unknown version")]
#[test_case("v1" ; "single segment")]
#[test_case("v1.NDI" ; "missing signature")]
#[test_case("v1.NDI.AAAA.BBBB" ; "too many segments")]
#[test_case("v1.!!!.AAAA" ; "id not base64")]
#[test_case("v1.OTk5.AAAA" ; "unknown user")]
#[tokio::test]
async fn test_bad_token_is_rejected(token: &str) {
    let app = TestApp::new();
    app.seed_user(42, "a@b.com", "h1").await;

    let response = app.get("/api/v1/users/@me", Some(token)).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["message"], "Invalid token.");
    assert_eq!(response.headers["www-authenticate"], "Token");
}

#[tokio::test]
async fn test_bad_token_rejected_on_public_route() {
    let app = TestApp::new();

    let response = app
        .request(
            Method::POST,
            "/api/v1/auth/login",
            Some(serde_json::json!({ "email": "a@b.com", "password": "password123" })),
            Some("v1.NDI.AAAA"),
        )
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_stops_working_when_hash_changes() {
    let app = TestApp::new();
    let user = app.seed_user(42, "a@b.com", "h1").await;
    let token = app.codec.token_for(&user);
    assert_eq!(app.codec.generate("42", "a@b.com", "h1"), token);

    use siege_server::domain::UserRepository;
    app.users.update_password(42, "h2").await.unwrap();

    let response = app.get("/api/v1/users/@me", Some(&token)).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["message"], "Invalid token.");
}

#[tokio::test]
async fn test_rejected_tokens_are_rate_limited() {
    let app = TestApp::with_rate_limit(3);

    for _ in 0..3 {
        let response = app.get("/api/v1/users/@me", Some("v1.NDI.AAAA")).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    }

    let response = app.get("/api/v1/users/@me", Some("v1.NDI.AAAA")).await;
    assert_eq!(response.status, StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers.contains_key("retry-after"));
    assert_eq!(response.headers["x-ratelimit-remaining"], "0");

    // Without a credential the gate is not consulted
    let response = app.get("/health", None).await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_forwarded_for_cannot_dodge_rate_limit() {
    let app = TestApp::with_rate_limit(2);

    let mut limited = 0;
    for i in 0..20 {
        let request = Request::builder()
            .uri("/api/v1/users/@me")
            .header("Authorization", "Token v1.NDI.AAAA")
            .header("X-Forwarded-For", format!("10.0.0.{}", i))
            .body(Body::empty())
            .unwrap();
        if send(&app.router, request).await.status == StatusCode::TOO_MANY_REQUESTS {
            limited += 1;
        }
    }
    assert_eq!(limited, 18);
}

#[tokio::test]
async fn test_store_failure_is_internal_error() {
    let router = failing_router();
    let request = axum::http::Request::get("/api/v1/users/@me")
        .header("Authorization", "Token v1.NDI.AAAA")
        .body(axum::body::Body::empty())
        .unwrap();

    let response = send(&router, request).await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.body["message"], "Internal server error");
}
