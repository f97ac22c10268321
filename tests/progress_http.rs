mod common;

use axum::http::Method;
use axum::Router;
use serde_json::Value;

use common::app::spawn_test_app;
use common::auth::{auth_header, instructor_token, student_token};
use common::fixtures::tf_question;
use common::http::{assert_json_error, assert_status_ok_json, request, response_json};
use quizforge_backend::store::operations::quizzes::Difficulty;

async fn run_attempt(app: &Router, token: &str, quiz_id: &str, answers: &[(&str, &str)]) {
    let response = request(
        app,
        Method::POST,
        "/api/attempts/start",
        Some(serde_json::json!({"quizId": quiz_id})),
        &[("authorization", auth_header(token))],
    )
    .await;
    let (status, _, body) = response_json(response).await;
    assert_eq!(status, 201, "start attempt failed: {body}");
    let attempt_id = body["data"]["attemptId"].as_str().unwrap().to_string();

    for (question_id, answer) in answers {
        let response = request(
            app,
            Method::POST,
            &format!("/api/attempts/{attempt_id}/answer"),
            Some(serde_json::json!({
                "questionId": question_id,
                "answer": answer,
                "timeSpentSeconds": 5,
            })),
            &[("authorization", auth_header(token))],
        )
        .await;
        assert!(response.status().is_success());
    }
}

async fn get_json(app: &Router, token: &str, path: &str) -> (axum::http::StatusCode, Value) {
    let response = request(
        app,
        Method::GET,
        path,
        None,
        &[("authorization", auth_header(token))],
    )
    .await;
    let (status, _, body) = response_json(response).await;
    (status, body)
}

#[tokio::test]
async fn per_quiz_progress_tracks_mastery() {
    let test_app = spawn_test_app().await;
    let token = student_token(&test_app.app).await;

    let quiz = common::fixtures::seed_quiz(
        &test_app.state,
        "teacher-1",
        false,
        10,
        vec![
            tf_question("c1", "cells", Difficulty::Easy),
            tf_question("c2", "cells", Difficulty::Easy),
            tf_question("e1", "energy", Difficulty::Easy),
            tf_question("e2", "energy", Difficulty::Easy),
        ],
    );

    // Both cells right, both energy wrong.
    run_attempt(
        &test_app.app,
        &token,
        &quiz.id,
        &[("c1", "true"), ("c2", "true"), ("e1", "false"), ("e2", "false")],
    )
    .await;

    let (status, body) = get_json(
        &test_app.app,
        &token,
        &format!("/api/progress/quiz/{}", quiz.id),
    )
    .await;
    assert_status_ok_json(status, &body);

    let data = &body["data"];
    assert_eq!(data["attemptCount"], 1);
    assert_eq!(data["bestScore"], 50.0);

    let mastery = data["topicMastery"].as_array().unwrap();
    let cells = mastery.iter().find(|t| t["topic"] == "cells").unwrap();
    let energy = mastery.iter().find(|t| t["topic"] == "energy").unwrap();
    assert_eq!(cells["mastery"], 100.0);
    assert_eq!(energy["mastery"], 0.0);

    assert_eq!(data["weakTopics"], serde_json::json!(["energy"]));
    assert_eq!(data["strongTopics"], serde_json::json!(["cells"]));
}

#[tokio::test]
async fn best_score_keeps_the_maximum() {
    let test_app = spawn_test_app().await;
    let token = student_token(&test_app.app).await;

    let quiz = common::fixtures::seed_quiz(
        &test_app.state,
        "teacher-1",
        false,
        10,
        vec![
            tf_question("q1", "biology", Difficulty::Easy),
            tf_question("q2", "biology", Difficulty::Easy),
        ],
    );

    run_attempt(
        &test_app.app,
        &token,
        &quiz.id,
        &[("q1", "true"), ("q2", "true")],
    )
    .await;
    run_attempt(
        &test_app.app,
        &token,
        &quiz.id,
        &[("q1", "false"), ("q2", "false")],
    )
    .await;

    let (status, body) = get_json(
        &test_app.app,
        &token,
        &format!("/api/progress/quiz/{}", quiz.id),
    )
    .await;
    assert_status_ok_json(status, &body);
    assert_eq!(body["data"]["attemptCount"], 2);
    assert_eq!(body["data"]["bestScore"], 100.0);
}

#[tokio::test]
async fn overview_aggregates_topics_across_quizzes() {
    let test_app = spawn_test_app().await;
    let token = student_token(&test_app.app).await;

    let quiz_a = common::fixtures::seed_quiz(
        &test_app.state,
        "teacher-1",
        false,
        10,
        vec![
            tf_question("a1", "cells", Difficulty::Easy),
            tf_question("a2", "cells", Difficulty::Easy),
        ],
    );
    let quiz_b = common::fixtures::seed_quiz(
        &test_app.state,
        "teacher-1",
        false,
        10,
        vec![
            tf_question("b1", "cells", Difficulty::Easy),
            tf_question("b2", "cells", Difficulty::Easy),
        ],
    );

    // 2/2 on the first quiz, 0/2 on the second: combined 2/4 = 50.
    run_attempt(
        &test_app.app,
        &token,
        &quiz_a.id,
        &[("a1", "true"), ("a2", "true")],
    )
    .await;
    run_attempt(
        &test_app.app,
        &token,
        &quiz_b.id,
        &[("b1", "false"), ("b2", "false")],
    )
    .await;

    let (status, body) = get_json(&test_app.app, &token, "/api/progress/overview").await;
    assert_status_ok_json(status, &body);

    let data = &body["data"];
    assert_eq!(data["quizzes"].as_array().unwrap().len(), 2);
    assert_eq!(data["totalAttempts"], 2);

    let mastery = data["topicMastery"].as_array().unwrap();
    let cells = mastery.iter().find(|t| t["topic"] == "cells").unwrap();
    assert_eq!(cells["mastery"], 50.0);
    assert_eq!(cells["questionsAnswered"], 4);
    assert_eq!(cells["correctAnswers"], 2);
}

#[tokio::test]
async fn missing_progress_is_not_found() {
    let test_app = spawn_test_app().await;
    let token = student_token(&test_app.app).await;

    let (status, body) = get_json(
        &test_app.app,
        &token,
        "/api/progress/quiz/no-such-quiz",
    )
    .await;
    assert_eq!(status, 404);
    assert_json_error(&body, "NOT_FOUND");
}

#[tokio::test]
async fn progress_is_for_students_only() {
    let test_app = spawn_test_app().await;
    let token = instructor_token(&test_app.app).await;

    let (status, body) = get_json(&test_app.app, &token, "/api/progress/overview").await;
    assert_eq!(status, 403);
    assert_json_error(&body, "FORBIDDEN");
}
