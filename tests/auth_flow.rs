//! End-to-end authentication flow over the HTTP router.

mod common;

use axum::http::{Method, StatusCode};
use chrono::Utc;
use common::*;
use jsonwebtoken::{encode, EncodingKey, Header};
use residency_backend::auth::models::Claims;
use residency_backend::auth::UserRole;
use serde_json::json;

#[tokio::test]
async fn register_then_login_yields_role_token() {
    let app = app().await;

    for (body, role) in [
        (admin_body("warden"), "admin"),
        (student_body("amira"), "student"),
    ] {
        let (status, resp) = send(&app, Method::POST, "/auth/register", None, Some(body.clone())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(resp["message"], "User registered successfully");

        let (status, login) = send(
            &app,
            Method::POST,
            "/auth/login",
            None,
            Some(json!({"username": body["username"], "password": body["password"]})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(login["role"], role);
        assert_eq!(login["expires_in"], 3600);

        let token = login["token"].as_str().unwrap();
        let (status, me) = send(&app, Method::GET, "/auth/me", Some(token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(me, json!({"username": body["username"], "role": role}));
    }
}

#[tokio::test]
async fn register_validates_before_uniqueness() {
    let app = app().await;

    let (status, resp) = send(
        &app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({"username": "amira"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(resp["message"], "Missing required fields: password, role");

    let mut bad_role = student_body("amira");
    bad_role["role"] = json!("superuser");
    let (status, resp) = send(&app, Method::POST, "/auth/register", None, Some(bad_role)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(resp["message"], "Invalid role");

    let mut no_university = student_body("amira");
    no_university.as_object_mut().unwrap().remove("university");
    let (status, resp) = send(&app, Method::POST, "/auth/register", None, Some(no_university)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(resp["message"], "Missing required fields: university");

    let (status, _) = send(&app, Method::POST, "/auth/register", None, Some(student_body("amira"))).await;
    assert_eq!(status, StatusCode::CREATED);

    // Incomplete duplicate is still a shape error.
    let (status, _) = send(
        &app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({"username": "amira", "password": "whatever-123"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn duplicate_registration_keeps_first_record() {
    let app = app().await;
    let (status, _) = send(&app, Method::POST, "/auth/register", None, Some(student_body("amira"))).await;
    assert_eq!(status, StatusCode::CREATED);

    let mut second = admin_body("amira");
    second["password"] = json!("another-pass-456");
    let (status, resp) = send(&app, Method::POST, "/auth/register", None, Some(second)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(resp["message"], "User already exists");

    let (status, login) = send(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({"username": "amira", "password": "student-pass-123"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(login["role"], "student");
}

#[tokio::test]
async fn bad_credentials_are_indistinguishable() {
    let app = app().await;
    student_token(&app, "amira").await;

    let (wrong_status, wrong_body) = send(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({"username": "amira", "password": "not-the-password"})),
    )
    .await;
    let (ghost_status, ghost_body) = send(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({"username": "ghost", "password": "not-the-password"})),
    )
    .await;

    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_status, ghost_status);
    assert_eq!(wrong_body, ghost_body);

    let (status, resp) = send(&app, Method::POST, "/auth/login", None, Some(json!({"username": "amira"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(resp["message"], "Missing required fields: password");
}

#[tokio::test]
async fn logout_revokes_and_is_idempotent() {
    let app = app().await;
    let token = student_token(&app, "amira").await;

    let (status, _) = send(&app, Method::GET, "/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, resp) = send(&app, Method::POST, "/auth/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp["message"], "Logged out successfully");

    let (status, resp) = send(&app, Method::GET, "/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(resp["message"], "Invalid token");

    let (status, _) = send(&app, Method::POST, "/auth/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    // A fresh login still works.
    let fresh = send(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({"username": "amira", "password": "student-pass-123"})),
    )
    .await
    .1;
    let fresh = fresh["token"].as_str().unwrap();
    let (status, _) = send(&app, Method::GET, "/auth/me", Some(fresh), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn logout_without_token_is_bad_request() {
    let app = app().await;
    let (status, resp) = send(&app, Method::POST, "/auth/logout", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(resp["message"], "Token is missing");

    let (status, _) = send(&app, Method::POST, "/auth/logout", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn empty_bearer_token_counts_as_missing() {
    let app = app().await;

    // `send` with an empty token produces `Authorization: Bearer `.
    let (status, resp) = send(&app, Method::POST, "/auth/logout", Some(""), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(resp["message"], "Token is missing");

    let (status, resp) = send(&app, Method::GET, "/auth/me", Some(""), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(resp["message"], "Token is missing");
}

#[tokio::test]
async fn gate_rejects_missing_tampered_and_expired_tokens() {
    let app = app().await;
    let token = student_token(&app, "amira").await;

    let (status, resp) = send(&app, Method::GET, "/auth/me", None, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(resp["message"], "Token is missing");

    let mut tampered: Vec<char> = token.chars().collect();
    let i = tampered.len() - 6;
    tampered[i] = if tampered[i] == 'A' { 'B' } else { 'A' };
    let tampered: String = tampered.into_iter().collect();
    let (status, resp) = send(&app, Method::GET, "/auth/me", Some(&tampered), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(resp["message"], "Invalid token");

    let expired = encode(
        &Header::default(),
        &Claims {
            username: "amira".into(),
            role: UserRole::Student,
            exp: Utc::now().timestamp() - 60,
        },
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap();
    let (status, resp) = send(&app, Method::GET, "/auth/me", Some(&expired), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(resp["message"], "Token has expired");
}

#[tokio::test]
async fn token_without_bearer_prefix_is_accepted() {
    use axum::{body::Body, http::Request};
    use tower::ServiceExt;

    let app = app().await;
    let token = student_token(&app, "amira").await;

    let resp = app
        .oneshot(
            Request::get("/auth/me")
                .header("authorization", token)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}
