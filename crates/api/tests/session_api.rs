//! HTTP-level tests for session introspection and token handling.

mod common;

use axum::http::StatusCode;
use common::{body_json, get, get_auth, TestApp, ADMIN, ALICE};

#[tokio::test]
async fn test_anonymous_session_is_null() {
    let app = TestApp::new();

    let response = get(&app.router, "/api/v1/session").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_json(response).await["data"].is_null());
}

#[tokio::test]
async fn test_session_returns_profile_and_balance() {
    let app = TestApp::new();

    let token = app.token(ALICE, false);
    let json = body_json(get_auth(&app.router, "/api/v1/session", &token).await).await;

    assert_eq!(json["data"]["id"], ALICE);
    assert_eq!(json["data"]["name"], "Alice");
    assert_eq!(json["data"]["isAdmin"], false);
    assert_eq!(json["data"]["langToken"], 5);

    let token = app.token(ADMIN, true);
    let json = body_json(get_auth(&app.router, "/api/v1/session", &token).await).await;
    assert_eq!(json["data"]["isAdmin"], true);
}

/// A garbage token is treated as anonymous, not as an error.
#[tokio::test]
async fn test_invalid_token_is_anonymous() {
    let app = TestApp::new();

    let response = get_auth(&app.router, "/api/v1/session", "not-a-jwt").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_json(response).await["data"].is_null());
}

#[tokio::test]
async fn test_token_for_unknown_user_is_null() {
    let app = TestApp::new();

    let token = app.token(404, false);
    let json = body_json(get_auth(&app.router, "/api/v1/session", &token).await).await;

    assert!(json["data"].is_null());
}
