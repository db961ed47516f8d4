#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use chrono::{Duration, NaiveDate, Utc};
use rentline_api::{app, state::AuthConfig, AppState};
use serde_json::{json, Value};
use tower::ServiceExt;

pub struct TestApp {
    state: AppState,
}

pub struct Account {
    pub id: i64,
    pub access: String,
    pub refresh: String,
}

impl TestApp {
    pub fn new() -> Self {
        let auth = AuthConfig {
            secret: "integration-secret".to_string(),
            access_token_seconds: 300,
            refresh_token_seconds: 600,
            hash_memory_kib: 64,
            hash_iterations: 1,
        };
        Self {
            state: AppState::in_memory(auth, 20),
        }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app(self.state.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    pub async fn send(&self, request: Request<Body>) -> StatusCode {
        let response = app(self.state.clone()).oneshot(request).await.unwrap();
        response.status()
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn patch(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::PATCH, uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, token, None).await
    }

    /// Registers `username` with `role` and logs in.
    pub async fn signup(&self, username: &str, role: &str) -> Account {
        let (status, user) = self
            .post(
                "/user/register/",
                None,
                json!({ "username": username, "password": "pass-1234", "role": role }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register {username}: {user}");

        let (status, tokens) = self
            .post(
                "/user/login/",
                None,
                json!({ "username": username, "password": "pass-1234" }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login {username}: {tokens}");

        Account {
            id: user["id"].as_i64().unwrap(),
            access: tokens["access"].as_str().unwrap().to_string(),
            refresh: tokens["refresh"].as_str().unwrap().to_string(),
        }
    }

    pub async fn create_estate(&self, owner: &Account, title: &str, location: &str, price: &str) -> i64 {
        let (status, estate) = self
            .post(
                "/estate/create/",
                Some(&owner.access),
                json!({
                    "title": title,
                    "description": "Bright flat with a balcony",
                    "location": location,
                    "price": price,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create estate: {estate}");
        estate["id"].as_i64().unwrap()
    }

    pub async fn book(
        &self,
        tenant: &Account,
        estate: i64,
        check_in: NaiveDate,
        check_out: NaiveDate,
    ) -> (StatusCode, Value) {
        self.post(
            "/booking/create/",
            Some(&tenant.access),
            json!({ "estate": estate, "check_in": check_in, "check_out": check_out }),
        )
        .await
    }

    pub async fn set_status(&self, actor: &Account, booking: i64, status: &str) -> (StatusCode, Value) {
        self.patch(
            &format!("/booking/{}/status/", booking),
            Some(&actor.access),
            json!({ "status": status }),
        )
        .await
    }
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

/// Today shifted by `days` (UTC).
pub fn days_from_today(days: i64) -> NaiveDate {
    Utc::now().date_naive() + Duration::days(days)
}
