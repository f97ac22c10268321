use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::auth::AuthUser;
use crate::engine::attempt::{record_answer, time_remaining_seconds, AttemptError};
use crate::engine::reward::{apply_attempt_reward, RewardOutcome};
use crate::engine::{mastery, selector};
use crate::extractors::JsonBody;
use crate::response::{created, ok, AppError};
use crate::routes::quizzes::{ensure_student_access, QuizSummary, SanitizedQuestion};
use crate::state::AppState;
use crate::store::operations::attempts::AttemptSession;
use crate::store::operations::progress::ProgressRecord;
use crate::store::operations::quizzes::Quiz;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_attempts))
        .route("/start", post(start_attempt))
        .route("/:id/answer", post(submit_answer))
        .route("/:id/results", get(attempt_results))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartAttemptRequest {
    pub quiz_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAnswerRequest {
    pub question_id: String,
    pub answer: String,
    #[serde(default)]
    pub time_spent_seconds: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerFeedback {
    pub correct: bool,
    pub correct_answer: String,
    pub explanation: String,
    pub finished: bool,
    /// Position of the next question while the attempt is in progress.
    pub question_number: Option<usize>,
    pub score: Option<f64>,
    pub correct_answers: Option<u32>,
    pub total_questions: Option<usize>,
    pub time_spent_seconds: Option<u64>,
    pub next_question: Option<SanitizedQuestion>,
    pub time_remaining_seconds: u64,
    pub reward: Option<RewardOutcome>,
}

async fn start_attempt(
    auth_user: AuthUser,
    State(state): State<AppState>,
    JsonBody(req): JsonBody<StartAttemptRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_student()?;

    let quiz = state
        .store()
        .get_quiz(&req.quiz_id)?
        .ok_or_else(|| AppError::not_found("Quiz not found"))?;
    ensure_student_access(&auth_user, &state, &quiz)?;

    if quiz.questions.is_empty() {
        return Err(AppError::invalid_state("Quiz has no questions"));
    }

    let now = Utc::now();
    let attempt = AttemptSession::new(&auth_user.user_id, &quiz.id, now);

    let mut progress = state
        .store()
        .get_progress(&auth_user.user_id, &quiz.id)?
        .unwrap_or_else(|| ProgressRecord::seeded(&auth_user.user_id, &quiz));
    mastery::start_attempt(&mut progress, &attempt.id, now);

    state.store().create_attempt(&attempt)?;
    state.store().put_progress(&progress)?;

    let next = selector::next_question(&quiz, &attempt, &progress.weak_topics)
        .map(SanitizedQuestion::from);

    Ok(created(serde_json::json!({
        "attemptId": attempt.id,
        "quiz": QuizSummary::from(&quiz),
        "nextQuestion": next,
        "questionNumber": 1,
        "timeRemainingSeconds": time_remaining_seconds(&quiz, &attempt, now),
    })))
}

async fn submit_answer(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(attempt_id): Path<String>,
    JsonBody(req): JsonBody<SubmitAnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    // Serialize submissions for this attempt; without the lock two
    // concurrent requests could both pass the duplicate check.
    let lock = state.attempt_locks().acquire(&attempt_id);
    let _guard = lock.lock().await;

    let mut attempt = load_own_attempt(&auth_user, &state, &attempt_id)?;
    let quiz = state
        .store()
        .get_quiz(&attempt.quiz_id)?
        .ok_or_else(|| AppError::not_found("Quiz not found"))?;

    let now = Utc::now();
    let outcome = record_answer(
        &mut attempt,
        &quiz,
        &req.question_id,
        &req.answer,
        req.time_spent_seconds,
        now,
    )
    .map_err(attempt_error_to_app_error)?;

    let question = quiz
        .question_by_id(&req.question_id)
        .ok_or_else(|| AppError::internal("answered question vanished from quiz"))?;

    let mut progress = state
        .store()
        .get_progress(&auth_user.user_id, &quiz.id)?
        .unwrap_or_else(|| ProgressRecord::seeded(&auth_user.user_id, &quiz));
    mastery::record_answer(&mut progress, &question.topic, outcome.is_correct);
    mastery::classify_topics(&mut progress);
    if outcome.finished {
        mastery::complete_attempt(&mut progress, &attempt);
    }

    state.store().update_attempt(&attempt)?;
    state.store().put_progress(&progress)?;

    let reward = if outcome.finished {
        grant_reward(&state, &attempt, &quiz).await
    } else {
        None
    };

    let next = if outcome.finished {
        None
    } else {
        selector::next_question(&quiz, &attempt, &progress.weak_topics)
            .map(SanitizedQuestion::from)
    };

    state.attempt_locks().sweep();

    Ok(ok(AnswerFeedback {
        correct: outcome.is_correct,
        correct_answer: question.correct_answer.clone(),
        explanation: question.explanation.clone(),
        finished: outcome.finished,
        question_number: (!outcome.finished).then_some(attempt.answers.len() + 1),
        score: attempt.score,
        correct_answers: outcome.finished.then_some(attempt.correct_count),
        total_questions: outcome.finished.then_some(quiz.questions.len()),
        time_spent_seconds: outcome.finished.then_some(attempt.time_spent_seconds),
        next_question: next,
        time_remaining_seconds: time_remaining_seconds(&quiz, &attempt, now),
        reward,
    }))
}

/// Apply and persist the reward for a completed attempt. Reward failures
/// never fail the answer submission; the attempt result is already saved,
/// so log and move on.
async fn grant_reward(
    state: &AppState,
    attempt: &AttemptSession,
    quiz: &Quiz,
) -> Option<RewardOutcome> {
    let lock = state.reward_locks().acquire(&attempt.student_id);
    let _guard = lock.lock().await;

    let result = (|| -> Result<RewardOutcome, AppError> {
        let game_state = state
            .store()
            .get_game_state(&attempt.student_id)?
            .unwrap_or_else(|| {
                crate::store::operations::game_states::GameState::new(&attempt.student_id)
            });

        let (next_state, outcome) = apply_attempt_reward(&game_state, attempt, quiz, Utc::now());
        state.store().put_game_state(&next_state)?;
        Ok(outcome)
    })();

    match result {
        Ok(outcome) => Some(outcome),
        Err(err) => {
            tracing::warn!(
                student_id = %attempt.student_id,
                attempt_id = %attempt.id,
                error = %err.message,
                "reward grant failed; attempt result is unaffected"
            );
            None
        }
    }
}

async fn attempt_results(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(attempt_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let attempt = load_own_attempt(&auth_user, &state, &attempt_id)?;
    if !attempt.completed {
        return Err(AppError::invalid_state("Attempt is not completed"));
    }

    let quiz = state
        .store()
        .get_quiz(&attempt.quiz_id)?
        .ok_or_else(|| AppError::not_found("Quiz not found"))?;

    let answers: Vec<serde_json::Value> = attempt
        .answers
        .iter()
        .map(|a| {
            let question = quiz.question_by_id(&a.question_id);
            serde_json::json!({
                "questionId": a.question_id,
                "questionText": question.map(|q| q.text.clone()),
                "topic": question.map(|q| q.topic.clone()),
                "givenAnswer": a.given_answer,
                "correctAnswer": question.map(|q| q.correct_answer.clone()),
                "explanation": question.map(|q| q.explanation.clone()),
                "isCorrect": a.is_correct,
                "timeSpentSeconds": a.time_spent_seconds,
            })
        })
        .collect();

    let progress = state
        .store()
        .get_progress(&auth_user.user_id, &attempt.quiz_id)?;

    Ok(ok(serde_json::json!({
        "attemptId": attempt.id,
        "quizId": attempt.quiz_id,
        "score": attempt.score,
        "correctCount": attempt.correct_count,
        "totalQuestions": quiz.questions.len(),
        "timeSpentSeconds": attempt.time_spent_seconds,
        "completedAt": attempt.completed_at,
        "answers": answers,
        "weakTopics": progress.as_ref().map(|p| p.weak_topics.clone()).unwrap_or_default(),
        "strongTopics": progress.as_ref().map(|p| p.strong_topics.clone()).unwrap_or_default(),
    })))
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    20
}

async fn list_attempts(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let limit = query.limit.clamp(1, 100);
    let attempts = state.store().list_user_attempts(&auth_user.user_id, limit)?;

    let views: Vec<serde_json::Value> = attempts
        .iter()
        .map(|a| {
            serde_json::json!({
                "attemptId": a.id,
                "quizId": a.quiz_id,
                "completed": a.completed,
                "score": a.score,
                "answeredCount": a.answers.len(),
                "startedAt": a.started_at,
                "completedAt": a.completed_at,
            })
        })
        .collect();

    Ok(ok(views))
}

fn load_own_attempt(
    auth_user: &AuthUser,
    state: &AppState,
    attempt_id: &str,
) -> Result<AttemptSession, AppError> {
    let attempt = state
        .store()
        .get_attempt(attempt_id)?
        .ok_or_else(|| AppError::not_found("Attempt not found"))?;

    if attempt.student_id != auth_user.user_id {
        return Err(AppError::forbidden("Not the owner of this attempt"));
    }

    Ok(attempt)
}

fn attempt_error_to_app_error(err: AttemptError) -> AppError {
    match err {
        AttemptError::AlreadyCompleted => AppError::invalid_state("Attempt is already completed"),
        AttemptError::AlreadyAnswered => {
            AppError::invalid_state("Question was already answered in this attempt")
        }
        AttemptError::UnknownQuestion => {
            AppError::not_found("Question is not part of this quiz")
        }
    }
}
