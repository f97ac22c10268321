use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;

use crate::auth::AuthUser;
use crate::engine::mastery::aggregate_topic_mastery;
use crate::response::{ok, AppError};
use crate::state::AppState;
use crate::store::operations::progress::ProgressRecord;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/overview", get(overview))
        .route("/quiz/:quiz_id", get(quiz_progress))
}

fn progress_view(record: &ProgressRecord) -> serde_json::Value {
    serde_json::json!({
        "quizId": record.quiz_id,
        "attemptCount": record.attempt_count,
        "bestScore": record.best_score,
        "lastAttemptAt": record.last_attempt_at,
        "topicMastery": record.topic_mastery,
        "weakTopics": record.weak_topics,
        "strongTopics": record.strong_topics,
    })
}

async fn quiz_progress(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(quiz_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_student()?;

    let record = state
        .store()
        .get_progress(&auth_user.user_id, &quiz_id)?
        .ok_or_else(|| AppError::not_found("No progress for this quiz"))?;

    Ok(ok(progress_view(&record)))
}

/// Cross-quiz view: per-quiz summaries plus topic mastery aggregated over
/// every quiz the student has attempted.
async fn overview(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_student()?;

    let records = state.store().list_student_progress(&auth_user.user_id)?;

    let combined = aggregate_topic_mastery(&records);
    let quizzes: Vec<serde_json::Value> = records.iter().map(progress_view).collect();

    let total_attempts: u32 = records.iter().map(|r| r.attempt_count).sum();

    Ok(ok(serde_json::json!({
        "quizzes": quizzes,
        "topicMastery": combined,
        "totalAttempts": total_attempts,
    })))
}
