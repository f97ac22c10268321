use axum::http::Method;
use axum::Router;

use super::http::{request, response_json};

/// Register a fresh account and return its access token.
pub async fn register_and_get_token(app: &Router, role: &str) -> String {
    let (token, _user_id) = register_and_get_token_with_id(app, role).await;
    token
}

/// Returns (access_token, user_id).
pub async fn register_and_get_token_with_id(app: &Router, role: &str) -> (String, String) {
    let email = format!("user-{}@test.com", uuid::Uuid::new_v4());
    let username = format!("user-{}", uuid::Uuid::new_v4().simple());
    let password = "Passw0rd!";

    let response = request(
        app,
        Method::POST,
        "/api/auth/register",
        Some(serde_json::json!({
            "email": email,
            "username": username,
            "password": password,
            "role": role,
        })),
        &[],
    )
    .await;

    let (status, _headers, body) = response_json(response).await;
    assert!(status.is_success(), "register failed: {body}");

    let token = body["data"]["accessToken"]
        .as_str()
        .expect("access token in register response")
        .to_string();
    let user_id = body["data"]["user"]["id"]
        .as_str()
        .expect("user id in register response")
        .to_string();

    (token, user_id)
}

pub async fn student_token(app: &Router) -> String {
    register_and_get_token(app, "student").await
}

pub async fn instructor_token(app: &Router) -> String {
    register_and_get_token(app, "instructor").await
}

pub fn auth_header(token: &str) -> String {
    format!("Bearer {token}")
}
