use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::{get, patch, post};
use axum::Router;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::auth::AuthUser;
use crate::constants::MAX_QUESTIONS_PER_QUIZ;
use crate::extract::extract_text;
use crate::extractors::JsonBody;
use crate::response::{created, ok, AppError};
use crate::services::generator::GenerationRequest;
use crate::state::AppState;
use crate::store::operations::quizzes::{
    Difficulty, Question, QuestionType, Quiz, QuizSettings, Topic,
};
use crate::store::operations::users::UserRole;
use crate::validation::validate_title;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_quizzes))
        .route("/generate", post(generate_quiz))
        .route("/upload", post(upload_quiz))
        .route("/:id", get(get_quiz).delete(delete_quiz))
        .route("/:id/status", patch(set_status))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateQuizRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub source_text: String,
    pub topic: String,
    pub question_count: usize,
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
    #[serde(default)]
    pub adaptive: bool,
    #[serde(default = "default_time_limit")]
    pub time_limit_minutes: u32,
    #[serde(default)]
    pub class_id: Option<String>,
}

fn default_time_limit() -> u32 {
    10
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadQuizRequest {
    pub filename: String,
    pub content: String,
    #[serde(flatten)]
    pub quiz: GenerateQuizRequestWithoutSource,
}

/// Same shape as `GenerateQuizRequest` minus the inline source text, which
/// comes from the uploaded file instead.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateQuizRequestWithoutSource {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub topic: String,
    pub question_count: usize,
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
    #[serde(default)]
    pub adaptive: bool,
    #[serde(default = "default_time_limit")]
    pub time_limit_minutes: u32,
    #[serde(default)]
    pub class_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizSummary {
    pub id: String,
    pub title: String,
    pub description: String,
    pub question_count: usize,
    pub topics: Vec<String>,
    pub adaptive: bool,
    pub time_limit_minutes: u32,
    pub is_active: bool,
    pub class_id: Option<String>,
}

impl From<&Quiz> for QuizSummary {
    fn from(value: &Quiz) -> Self {
        Self {
            id: value.id.clone(),
            title: value.title.clone(),
            description: value.description.clone(),
            question_count: value.questions.len(),
            topics: value.topics.iter().map(|t| t.name.clone()).collect(),
            adaptive: value.settings.adaptive,
            time_limit_minutes: value.settings.time_limit_minutes,
            is_active: value.is_active,
            class_id: value.class_id.clone(),
        }
    }
}

/// A question as students see it: no correct answer, no explanation, no
/// per-option correctness flags.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SanitizedQuestion {
    pub id: String,
    pub text: String,
    pub question_type: QuestionType,
    pub options: Vec<String>,
    pub topic: String,
    pub difficulty: Difficulty,
    pub points: u32,
}

impl From<&Question> for SanitizedQuestion {
    fn from(value: &Question) -> Self {
        Self {
            id: value.id.clone(),
            text: value.text.clone(),
            question_type: value.question_type,
            options: value.options.iter().map(|o| o.text.clone()).collect(),
            topic: value.topic.clone(),
            difficulty: value.difficulty,
            points: value.points,
        }
    }
}

async fn generate_quiz(
    auth_user: AuthUser,
    State(state): State<AppState>,
    JsonBody(req): JsonBody<GenerateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_instructor()?;
    build_quiz(&auth_user, &state, req).await
}

async fn upload_quiz(
    auth_user: AuthUser,
    State(state): State<AppState>,
    JsonBody(req): JsonBody<UploadQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_instructor()?;

    let source_text = extract_text(&req.filename, req.content.as_bytes())?;
    let quiz = req.quiz;
    build_quiz(
        &auth_user,
        &state,
        GenerateQuizRequest {
            title: quiz.title,
            description: quiz.description,
            source_text,
            topic: quiz.topic,
            question_count: quiz.question_count,
            difficulty: quiz.difficulty,
            adaptive: quiz.adaptive,
            time_limit_minutes: quiz.time_limit_minutes,
            class_id: quiz.class_id,
        },
    )
    .await
}

async fn build_quiz(
    auth_user: &AuthUser,
    state: &AppState,
    req: GenerateQuizRequest,
) -> Result<axum::response::Response, AppError> {
    let title = req.title.trim();
    if let Err(msg) = validate_title(title) {
        return Err(AppError::validation(msg));
    }
    if req.source_text.trim().is_empty() {
        return Err(AppError::validation("Source text is required"));
    }
    let topic = req.topic.trim();
    if topic.is_empty() {
        return Err(AppError::validation("Topic is required"));
    }
    if req.question_count == 0 || req.question_count > MAX_QUESTIONS_PER_QUIZ {
        return Err(AppError::validation(&format!(
            "questionCount must be between 1 and {MAX_QUESTIONS_PER_QUIZ}"
        )));
    }
    if req.time_limit_minutes == 0 {
        return Err(AppError::validation("timeLimitMinutes must be at least 1"));
    }

    if let Some(class_id) = req.class_id.as_deref() {
        let class = state
            .store()
            .get_class(class_id)?
            .ok_or_else(|| AppError::not_found("Class not found"))?;
        if class.owner_id != auth_user.user_id {
            return Err(AppError::forbidden("Not the owner of this class"));
        }
    }

    let questions = state
        .generator()
        .generate(&GenerationRequest {
            source_text: req.source_text.clone(),
            topic: topic.to_string(),
            count: req.question_count,
            difficulty: req.difficulty,
        })
        .await;

    let mut topic_names: Vec<String> = questions.iter().map(|q| q.topic.clone()).collect();
    topic_names.sort();
    topic_names.dedup();

    let now = Utc::now();
    let quiz = Quiz {
        id: uuid::Uuid::new_v4().to_string(),
        owner_id: auth_user.user_id.clone(),
        class_id: req.class_id,
        title: title.to_string(),
        description: req.description.trim().to_string(),
        questions,
        topics: topic_names
            .into_iter()
            .map(|name| Topic { name, weight: 1.0 })
            .collect(),
        settings: QuizSettings {
            adaptive: req.adaptive,
            time_limit_minutes: req.time_limit_minutes,
        },
        is_active: true,
        created_at: now,
        updated_at: now,
    };

    state.store().create_quiz(&quiz)?;
    tracing::info!(quiz_id = %quiz.id, questions = quiz.questions.len(), "quiz created");

    Ok(created(&quiz).into_response())
}

async fn list_quizzes(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let quizzes = match auth_user.role {
        UserRole::Instructor => state.store().list_quizzes_by_owner(&auth_user.user_id)?,
        UserRole::Student => {
            let mut available = Vec::new();
            for class_id in state.store().list_user_class_ids(&auth_user.user_id)? {
                for quiz in state.store().list_quizzes_by_class(&class_id)? {
                    if quiz.is_active {
                        available.push(quiz);
                    }
                }
            }
            available
        }
    };

    let summaries: Vec<QuizSummary> = quizzes.iter().map(QuizSummary::from).collect();
    Ok(ok(summaries))
}

async fn get_quiz(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(quiz_id): Path<String>,
) -> Result<axum::response::Response, AppError> {
    let quiz = state
        .store()
        .get_quiz(&quiz_id)?
        .ok_or_else(|| AppError::not_found("Quiz not found"))?;

    if quiz.owner_id == auth_user.user_id {
        return Ok(ok(&quiz).into_response());
    }

    ensure_student_access(&auth_user, &state, &quiz)?;

    let sanitized: Vec<SanitizedQuestion> =
        quiz.questions.iter().map(SanitizedQuestion::from).collect();
    Ok(ok(serde_json::json!({
        "quiz": QuizSummary::from(&quiz),
        "questions": sanitized,
    }))
    .into_response())
}

/// Students may see a quiz when it is active and either public or attached
/// to a class they belong to.
pub(crate) fn ensure_student_access(
    auth_user: &AuthUser,
    state: &AppState,
    quiz: &Quiz,
) -> Result<(), AppError> {
    if !quiz.is_active {
        return Err(AppError::conflict("QUIZ_INACTIVE", "Quiz is not active"));
    }
    if let Some(class_id) = quiz.class_id.as_deref() {
        if !state.store().is_class_member(class_id, &auth_user.user_id)? {
            return Err(AppError::forbidden("Not a member of this quiz's class"));
        }
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetStatusRequest {
    pub is_active: bool,
}

async fn set_status(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(quiz_id): Path<String>,
    JsonBody(req): JsonBody<SetStatusRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut quiz = state
        .store()
        .get_quiz(&quiz_id)?
        .ok_or_else(|| AppError::not_found("Quiz not found"))?;

    if quiz.owner_id != auth_user.user_id {
        return Err(AppError::forbidden("Not the owner of this quiz"));
    }

    quiz.is_active = req.is_active;
    quiz.updated_at = Utc::now();
    state.store().update_quiz(&quiz)?;

    Ok(ok(QuizSummary::from(&quiz)))
}

async fn delete_quiz(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(quiz_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = state
        .store()
        .get_quiz(&quiz_id)?
        .ok_or_else(|| AppError::not_found("Quiz not found"))?;

    if quiz.owner_id != auth_user.user_id {
        return Err(AppError::forbidden("Not the owner of this quiz"));
    }

    state.store().delete_quiz(&quiz_id)?;
    Ok(ok(serde_json::json!({"deleted": true})))
}
