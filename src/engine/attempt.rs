use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::store::operations::attempts::{AnswerRecord, AttemptSession};
use crate::store::operations::quizzes::{Question, QuestionType, Quiz};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AttemptError {
    #[error("attempt is already completed")]
    AlreadyCompleted,
    #[error("question is not part of this quiz")]
    UnknownQuestion,
    #[error("question was already answered in this attempt")]
    AlreadyAnswered,
}

#[derive(Debug, Clone)]
pub struct AnswerOutcome {
    pub is_correct: bool,
    /// True when this answer was the quiz's final question and the attempt
    /// transitioned to Completed.
    pub finished: bool,
}

/// Literal-match grading. Multiple-choice and true/false compare the stored
/// correct-answer string exactly; short answers are compared after trimming
/// and case folding. No fuzzy or semantic grading.
pub fn check_answer(question: &Question, given: &str) -> bool {
    match question.question_type {
        QuestionType::MultipleChoice | QuestionType::TrueFalse => {
            question.correct_answer == given
        }
        QuestionType::ShortAnswer => {
            question.correct_answer.trim().to_lowercase() == given.trim().to_lowercase()
        }
    }
}

/// Record one answer on an in-progress attempt.
///
/// Rejects completed attempts, unknown questions and resubmissions; a
/// duplicate `question_id` is an error, never a silent overwrite. When the
/// answer count reaches the quiz's question count the attempt is finalized
/// in the same call: score computed, completion stamped.
pub fn record_answer(
    attempt: &mut AttemptSession,
    quiz: &Quiz,
    question_id: &str,
    given_answer: &str,
    time_spent_seconds: u64,
    now: DateTime<Utc>,
) -> Result<AnswerOutcome, AttemptError> {
    if attempt.completed {
        return Err(AttemptError::AlreadyCompleted);
    }
    let Some(question) = quiz.question_by_id(question_id) else {
        return Err(AttemptError::UnknownQuestion);
    };
    if attempt.has_answered(question_id) {
        return Err(AttemptError::AlreadyAnswered);
    }

    let is_correct = check_answer(question, given_answer);

    attempt.answers.push(AnswerRecord {
        question_id: question_id.to_string(),
        given_answer: given_answer.to_string(),
        is_correct,
        time_spent_seconds,
        answered_at: now,
    });
    attempt.time_spent_seconds += time_spent_seconds;
    if is_correct {
        attempt.correct_count += 1;
    }

    let finished = attempt.answers.len() >= quiz.questions.len();
    if finished {
        finalize(attempt, quiz, now);
    }

    Ok(AnswerOutcome {
        is_correct,
        finished,
    })
}

fn finalize(attempt: &mut AttemptSession, quiz: &Quiz, now: DateTime<Utc>) {
    let total = quiz.questions.len().max(1) as f64;
    attempt.score = Some((attempt.correct_count as f64 / total * 100.0).round());
    attempt.completed = true;
    attempt.completed_at = Some(now);
}

/// Advisory remaining time; never enforced by rejecting late answers.
pub fn time_remaining_seconds(quiz: &Quiz, attempt: &AttemptSession, now: DateTime<Utc>) -> u64 {
    let limit_secs = quiz.settings.time_limit_minutes as i64 * 60;
    let elapsed = (now - attempt.started_at).num_seconds().max(0);
    (limit_secs - elapsed).max(0) as u64
}
