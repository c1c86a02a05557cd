#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use clap::Parser;
use residency_backend::{build_state, router, Config};
use serde_json::{json, Value};
use tower::ServiceExt;

pub const SECRET: &str = "integration-test-secret-0123456789abcdef";

pub async fn app() -> Router {
    let config = Config::parse_from([
        "residency",
        "--jwt-secret",
        SECRET,
        "--db-path",
        ":memory:",
        "--bcrypt-cost",
        "4",
    ]);
    router(build_state(&config).await.unwrap())
}

/// Send one request and decode the JSON body (Null when empty).
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let body = match body {
        Some(value) => {
            builder = builder.header("content-type", "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    let resp = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

pub fn admin_body(username: &str) -> Value {
    json!({
        "username": username,
        "password": "admin-pass-123",
        "role": "admin",
        "first_name": "Salma",
        "last_name": "Ben Ali",
    })
}

pub fn student_body(username: &str) -> Value {
    json!({
        "username": username,
        "password": "student-pass-123",
        "role": "student",
        "first_name": "Youssef",
        "last_name": "Trabelsi",
        "year_of_study": 2,
        "university": "ENIT",
    })
}

/// Register and log in; returns the token.
pub async fn signed_in(app: &Router, body: Value) -> String {
    let (status, _) = send(app, Method::POST, "/auth/register", None, Some(body.clone())).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, login) = send(
        app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({"username": body["username"], "password": body["password"]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    login["token"].as_str().unwrap().to_string()
}

pub async fn admin_token(app: &Router) -> String {
    signed_in(app, admin_body("warden")).await
}

pub async fn student_token(app: &Router, username: &str) -> String {
    signed_in(app, student_body(username)).await
}
