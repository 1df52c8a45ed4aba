//! Shared helpers for API integration tests

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use bookshelf_server::{
    api,
    config::{AppConfig, StoreBackend},
    models::Book,
    repository::{memory::MemoryBookStore, memory::MemoryUserStore, Repository},
    AppState,
};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

pub struct TestApp {
    pub router: Router,
    pub uploads: TempDir,
}

pub fn app_with_books(books: Vec<Book>) -> TestApp {
    let uploads = tempfile::tempdir().expect("tempdir");
    let mut config = AppConfig::default();
    config.database.backend = StoreBackend::Memory;
    config.auth.jwt_secret = "integration-secret".to_string();
    config.uploads.dir = uploads.path().to_path_buf();
    config.uploads.max_size_bytes = 1024;

    let repository = Repository {
        books: Arc::new(MemoryBookStore::with_books(books)),
        users: Arc::new(MemoryUserStore::default()),
    };
    let router = api::create_router(AppState::new(config, repository));
    TestApp { router, uploads }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("JSON body")
    }

    pub fn text(&self) -> String {
        String::from_utf8(self.body.clone()).expect("UTF-8 body")
    }
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body")
            .to_vec();
        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };
        self.send(builder.body(body).expect("request")).await
    }

    /// Register a user and return a bearer token for them
    pub async fn token(&self) -> String {
        let email = format!("{}@example.com", uuid::Uuid::new_v4());
        let registered = self
            .request(
                Method::POST,
                "/api/v1/auth/register",
                None,
                Some(json!({ "email": email, "name": "Tester", "password": "long enough" })),
            )
            .await;
        assert_eq!(registered.status, StatusCode::CREATED);

        let login = self
            .request(
                Method::POST,
                "/api/v1/auth/login",
                None,
                Some(json!({ "email": email, "password": "long enough" })),
            )
            .await;
        assert_eq!(login.status, StatusCode::OK);
        login.json()["token"].as_str().expect("token").to_string()
    }
}

pub fn book(title: &str, author: Option<&str>, publisher: Option<&str>, genre: Option<&str>, available: bool) -> Book {
    let now = chrono::Utc::now();
    Book {
        id: uuid::Uuid::new_v4(),
        title: title.to_string(),
        author: author.map(String::from),
        publisher: publisher.map(String::from),
        genre: genre.map(String::from),
        available,
        image_url: None,
        user_id: None,
        created_at: now,
        updated_at: now,
        deleted_at: None,
    }
}
