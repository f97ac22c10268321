use crate::constants::{ADAPTIVE_HARD_ACCURACY, ADAPTIVE_MEDIUM_ACCURACY};
use crate::store::operations::attempts::AttemptSession;
use crate::store::operations::quizzes::{Difficulty, Question, Quiz};

/// Pick the next question for an in-progress attempt, or `None` when every
/// question has been answered.
///
/// Non-adaptive quizzes walk the authored order. Adaptive quizzes first
/// serve any unanswered question from a weak topic, then fall back to a
/// difficulty band derived from the attempt's running accuracy: >= 0.8
/// hard, >= 0.6 medium, below easy, and easy again before anything has
/// been answered. If the band is empty the first unanswered question wins.
/// Candidates always keep authored order, so selection is deterministic.
pub fn next_question<'a>(
    quiz: &'a Quiz,
    attempt: &AttemptSession,
    weak_topics: &[String],
) -> Option<&'a Question> {
    let unanswered: Vec<&Question> = quiz
        .questions
        .iter()
        .filter(|q| !attempt.has_answered(&q.id))
        .collect();

    let first = *unanswered.first()?;

    if !quiz.settings.adaptive {
        return Some(first);
    }

    if let Some(q) = unanswered
        .iter()
        .find(|q| weak_topics.iter().any(|t| t == &q.topic))
    {
        return Some(q);
    }

    let target = target_difficulty(attempt);
    let banded = unanswered.iter().find(|q| q.difficulty == target);
    Some(banded.copied().unwrap_or(first))
}

fn target_difficulty(attempt: &AttemptSession) -> Difficulty {
    let answered = attempt.answers.len();
    if answered == 0 {
        return Difficulty::Easy;
    }
    let accuracy = attempt.correct_count as f64 / answered as f64;
    if accuracy >= ADAPTIVE_HARD_ACCURACY {
        Difficulty::Hard
    } else if accuracy >= ADAPTIVE_MEDIUM_ACCURACY {
        Difficulty::Medium
    } else {
        Difficulty::Easy
    }
}
