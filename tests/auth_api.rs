mod common;

use axum::http::{Method, StatusCode};
use common::app_with_books;
use serde_json::json;

#[tokio::test]
async fn register_login_and_me() {
    let app = app_with_books(vec![]);

    let registered = app
        .request(
            Method::POST,
            "/api/v1/auth/register",
            None,
            Some(json!({ "email": "Reader@Example.com", "name": "Reader", "password": "correct horse" })),
        )
        .await;
    assert_eq!(registered.status, StatusCode::CREATED);
    let user = registered.json();
    assert_eq!(user["email"], "reader@example.com");
    assert!(user.get("password_hash").is_none());

    let duplicate = app
        .request(
            Method::POST,
            "/api/v1/auth/register",
            None,
            Some(json!({ "email": "reader@example.com", "name": "Other", "password": "correct horse" })),
        )
        .await;
    assert_eq!(duplicate.status, StatusCode::CONFLICT);

    let wrong = app
        .request(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({ "email": "reader@example.com", "password": "battery staple" })),
        )
        .await;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);

    let login = app
        .request(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({ "email": "reader@example.com", "password": "correct horse" })),
        )
        .await;
    assert_eq!(login.status, StatusCode::OK);
    let body = login.json();
    assert_eq!(body["token_type"], "Bearer");
    let token = body["token"].as_str().unwrap().to_string();

    let me = app
        .request(Method::GET, "/api/v1/auth/me", Some(&token), None)
        .await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.json()["name"], "Reader");
}

#[tokio::test]
async fn profile_update_requires_current_password_for_password_change() {
    let app = app_with_books(vec![]);
    let token = app.token().await;

    let rejected = app
        .request(
            Method::PUT,
            "/api/v1/users/me",
            Some(&token),
            Some(json!({ "new_password": "a brand new secret" })),
        )
        .await;
    assert_eq!(rejected.status, StatusCode::BAD_REQUEST);

    let renamed = app
        .request(
            Method::PUT,
            "/api/v1/users/me",
            Some(&token),
            Some(json!({ "name": "Renamed" })),
        )
        .await;
    assert_eq!(renamed.status, StatusCode::OK);
    assert_eq!(renamed.json()["name"], "Renamed");
}

#[tokio::test]
async fn lowercase_bearer_scheme_is_accepted() {
    let app = app_with_books(vec![]);
    let token = app.token().await;
    let request = axum::http::Request::builder()
        .uri("/api/v1/auth/me")
        .header(axum::http::header::AUTHORIZATION, format!("bearer {token}"))
        .body(axum::body::Body::empty())
        .unwrap();
    assert_eq!(app.send(request).await.status, StatusCode::OK);
}

#[tokio::test]
async fn garbage_token_is_rejected() {
    let app = app_with_books(vec![]);
    let response = app
        .request(Method::GET, "/api/v1/auth/me", Some("not-a-jwt"), None)
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn health_is_public() {
    let app = app_with_books(vec![]);
    let health = app.request(Method::GET, "/api/v1/health", None, None).await;
    assert_eq!(health.status, StatusCode::OK);
    assert_eq!(health.json()["status"], "healthy");
    assert_eq!(health.json()["store"], "memory");

    let ready = app.request(Method::GET, "/api/v1/ready", None, None).await;
    assert_eq!(ready.status, StatusCode::OK);
    assert_eq!(ready.json()["status"], "ready");
}
