#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::collections::HashMap;
use tower::ServiceExt;
use yamdb_api::{AppState, Settings};

pub const TEST_SECRET: &str = "integration-test-secret";

pub fn settings(database_url: &str) -> Settings {
    let mut env = HashMap::new();
    env.insert("DATABASE_URL", database_url.to_string());
    env.insert("JWT_SECRET", TEST_SECRET.to_string());
    env.insert("PAGE_SIZE", "5".to_string());
    Settings::from_lookup(|k| env.get(k).cloned()).unwrap()
}

/// State over a pool that never connects; only routes that stop before the database work.
pub fn offline_state() -> AppState {
    let url = "postgres://postgres@127.0.0.1:1/yamdb_offline";
    let pool = sqlx::postgres::PgPoolOptions::new()
        .acquire_timeout(std::time::Duration::from_millis(200))
        .connect_lazy(url)
        .unwrap();
    AppState::new(pool, settings(url))
}

pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(t) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", t));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}
