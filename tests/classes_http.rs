mod common;

use axum::http::Method;
use serde_json::Value;

use common::app::spawn_test_app;
use common::auth::{auth_header, instructor_token, student_token};
use common::http::{assert_json_error, assert_status_ok_json, request, response_json};

async fn create_class(app: &axum::Router, token: &str, name: &str) -> Value {
    let response = request(
        app,
        Method::POST,
        "/api/classes/",
        Some(serde_json::json!({"name": name})),
        &[("authorization", auth_header(token))],
    )
    .await;
    let (status, _, body) = response_json(response).await;
    assert_eq!(status, 201, "create class failed: {body}");
    body["data"].clone()
}

#[tokio::test]
async fn instructor_creates_class_with_invite_code() {
    let test_app = spawn_test_app().await;
    let token = instructor_token(&test_app.app).await;

    let class = create_class(&test_app.app, &token, "Biology 101").await;
    let code = class["inviteCode"].as_str().expect("invite code");
    assert_eq!(code.len(), 6);
    assert!(code
        .bytes()
        .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit()));
}

#[tokio::test]
async fn student_cannot_create_class() {
    let test_app = spawn_test_app().await;
    let token = student_token(&test_app.app).await;

    let response = request(
        &test_app.app,
        Method::POST,
        "/api/classes/",
        Some(serde_json::json!({"name": "Nope"})),
        &[("authorization", auth_header(&token))],
    )
    .await;
    let (status, _, body) = response_json(response).await;
    assert_eq!(status, 403);
    assert_json_error(&body, "FORBIDDEN");
}

#[tokio::test]
async fn student_joins_by_code_case_insensitively() {
    let test_app = spawn_test_app().await;
    let teacher = instructor_token(&test_app.app).await;
    let student = student_token(&test_app.app).await;

    let class = create_class(&test_app.app, &teacher, "Chemistry").await;
    let code = class["inviteCode"].as_str().unwrap().to_lowercase();

    let response = request(
        &test_app.app,
        Method::POST,
        "/api/classes/join",
        Some(serde_json::json!({"inviteCode": code})),
        &[("authorization", auth_header(&student))],
    )
    .await;
    let (status, _, body) = response_json(response).await;
    assert_status_ok_json(status, &body);
    assert_eq!(body["data"]["id"], class["id"]);

    // Joining twice conflicts.
    let again = request(
        &test_app.app,
        Method::POST,
        "/api/classes/join",
        Some(serde_json::json!({"inviteCode": code})),
        &[("authorization", auth_header(&student))],
    )
    .await;
    let (status, _, body) = response_json(again).await;
    assert_eq!(status, 409);
    assert_json_error(&body, "ALREADY_MEMBER");
}

#[tokio::test]
async fn unknown_invite_code_is_not_found() {
    let test_app = spawn_test_app().await;
    let student = student_token(&test_app.app).await;

    let response = request(
        &test_app.app,
        Method::POST,
        "/api/classes/join",
        Some(serde_json::json!({"inviteCode": "ZZZZZZ"})),
        &[("authorization", auth_header(&student))],
    )
    .await;
    let (status, _, body) = response_json(response).await;
    assert_eq!(status, 404);
    assert_json_error(&body, "NOT_FOUND");
}

#[tokio::test]
async fn class_listing_follows_role() {
    let test_app = spawn_test_app().await;
    let teacher = instructor_token(&test_app.app).await;
    let student = student_token(&test_app.app).await;

    let class = create_class(&test_app.app, &teacher, "Physics").await;
    let code = class["inviteCode"].as_str().unwrap().to_string();

    request(
        &test_app.app,
        Method::POST,
        "/api/classes/join",
        Some(serde_json::json!({"inviteCode": code})),
        &[("authorization", auth_header(&student))],
    )
    .await;

    let (status, _, body) = response_json(
        request(
            &test_app.app,
            Method::GET,
            "/api/classes/",
            None,
            &[("authorization", auth_header(&teacher))],
        )
        .await,
    )
    .await;
    assert_status_ok_json(status, &body);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, _, body) = response_json(
        request(
            &test_app.app,
            Method::GET,
            "/api/classes/",
            None,
            &[("authorization", auth_header(&student))],
        )
        .await,
    )
    .await;
    assert_status_ok_json(status, &body);
    assert_eq!(body["data"][0]["name"], "Physics");
}

#[tokio::test]
async fn member_list_is_owner_only() {
    let test_app = spawn_test_app().await;
    let owner = instructor_token(&test_app.app).await;
    let other = instructor_token(&test_app.app).await;
    let student = student_token(&test_app.app).await;

    let class = create_class(&test_app.app, &owner, "History").await;
    let class_id = class["id"].as_str().unwrap();
    let code = class["inviteCode"].as_str().unwrap().to_string();

    request(
        &test_app.app,
        Method::POST,
        "/api/classes/join",
        Some(serde_json::json!({"inviteCode": code})),
        &[("authorization", auth_header(&student))],
    )
    .await;

    let (status, _, body) = response_json(
        request(
            &test_app.app,
            Method::GET,
            &format!("/api/classes/{class_id}/members"),
            None,
            &[("authorization", auth_header(&owner))],
        )
        .await,
    )
    .await;
    assert_status_ok_json(status, &body);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let forbidden = request(
        &test_app.app,
        Method::GET,
        &format!("/api/classes/{class_id}/members"),
        None,
        &[("authorization", auth_header(&other))],
    )
    .await;
    assert_eq!(forbidden.status(), 403);
}
