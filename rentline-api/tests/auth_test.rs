mod common;

use axum::http::{header, Method, Request, StatusCode};
use common::TestApp;
use serde_json::json;

#[tokio::test]
async fn test_register_returns_public_profile() {
    let app = TestApp::new();

    let (status, body) = app
        .post(
            "/user/register/",
            None,
            json!({ "username": "anna", "password": "pass-1234", "role": "tenant" }),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["username"], "anna");
    assert_eq!(body["role"], "tenant");
    assert!(body["id"].is_i64());
    assert!(body.get("password").is_none());
    assert!(body.get("password_hash").is_none());
}

#[tokio::test]
async fn test_register_rejects_duplicates_and_bad_input() {
    let app = TestApp::new();
    app.signup("anna", "tenant").await;

    let (status, body) = app
        .post(
            "/user/register/",
            None,
            json!({ "username": "anna", "password": "other", "role": "landlord" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("username"));

    let (status, _) = app
        .post(
            "/user/register/",
            None,
            json!({ "username": "ben", "password": "pass", "role": "superuser" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post(
            "/user/register/",
            None,
            json!({ "username": "ben cooper", "password": "pass", "role": "tenant" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_json_is_a_bad_request() {
    let app = TestApp::new();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/user/register/")
        .header(header::CONTENT_TYPE, "application/json")
        .body(axum::body::Body::from("{\"username\": "))
        .unwrap();

    assert_eq!(app.send(request).await, StatusCode::BAD_REQUEST);

    // Same through the helper for a body of the wrong shape.
    let (status, body) = app.post("/user/login/", None, json!("anna")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_login_with_wrong_password_is_unauthorized() {
    let app = TestApp::new();
    app.signup("anna", "tenant").await;

    let (status, body) = app
        .post("/user/login/", None, json!({ "username": "anna", "password": "nope" }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid credentials");

    let (status, _) = app
        .post("/user/login/", None, json!({ "username": "ghost", "password": "nope" }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.post("/user/login/", None, json!({})).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_issues_a_working_access_token() {
    let app = TestApp::new();
    let tenant = app.signup("anna", "tenant").await;

    let (status, body) = app
        .post("/user/token/refresh/", None, json!({ "refresh": tenant.refresh }))
        .await;
    assert_eq!(status, StatusCode::OK);
    let access = body["access"].as_str().unwrap().to_string();

    let (status, _) = app.get("/history/", Some(&access)).await;
    assert_eq!(status, StatusCode::OK);

    // An access token is not a refresh token.
    let (status, _) = app
        .post("/user/token/refresh/", None, json!({ "refresh": tenant.access }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_protected_routes_require_an_access_token() {
    let app = TestApp::new();
    let tenant = app.signup("anna", "tenant").await;

    let (status, body) = app.get("/history/", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Authentication credentials were not provided.");

    let (status, _) = app.get("/history/", Some("not-a-jwt")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.get("/history/", Some(&tenant.refresh)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_public_listing_rejects_invalid_token_but_allows_anonymous() {
    let app = TestApp::new();

    let (status, _) = app.get("/estate/", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.get("/estate/", Some("garbage")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
