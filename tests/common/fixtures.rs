use chrono::Utc;

use quizforge_backend::state::AppState;
use quizforge_backend::store::operations::quizzes::{
    Difficulty, Question, QuestionOption, QuestionType, Quiz, QuizSettings, Topic,
};

/// A true/false question whose correct answer is "true".
pub fn tf_question(id: &str, topic: &str, difficulty: Difficulty) -> Question {
    Question {
        id: id.to_string(),
        text: format!("Statement {id} is correct."),
        question_type: QuestionType::TrueFalse,
        options: vec![
            QuestionOption {
                text: "true".to_string(),
                is_correct: true,
            },
            QuestionOption {
                text: "false".to_string(),
                is_correct: false,
            },
        ],
        correct_answer: "true".to_string(),
        explanation: format!("Statement {id} holds."),
        topic: topic.to_string(),
        difficulty,
        points: difficulty.point_value(),
    }
}

#[allow(dead_code)]
pub fn short_answer_question(id: &str, topic: &str, answer: &str) -> Question {
    Question {
        id: id.to_string(),
        text: format!("Short answer {id}?"),
        question_type: QuestionType::ShortAnswer,
        options: Vec::new(),
        correct_answer: answer.to_string(),
        explanation: String::new(),
        topic: topic.to_string(),
        difficulty: Difficulty::Medium,
        points: Difficulty::Medium.point_value(),
    }
}

/// Seed a quiz owned by `owner_id` directly in the store. `class_id: None`
/// makes it reachable by any student.
pub fn seed_quiz(
    state: &AppState,
    owner_id: &str,
    adaptive: bool,
    time_limit_minutes: u32,
    questions: Vec<Question>,
) -> Quiz {
    let mut topic_names: Vec<String> = questions.iter().map(|q| q.topic.clone()).collect();
    topic_names.sort();
    topic_names.dedup();

    let now = Utc::now();
    let quiz = Quiz {
        id: uuid::Uuid::new_v4().to_string(),
        owner_id: owner_id.to_string(),
        class_id: None,
        title: "Fixture Quiz".to_string(),
        description: String::new(),
        questions,
        topics: topic_names
            .into_iter()
            .map(|name| Topic { name, weight: 1.0 })
            .collect(),
        settings: QuizSettings {
            adaptive,
            time_limit_minutes,
        },
        is_active: true,
        created_at: now,
        updated_at: now,
    };

    state.store().create_quiz(&quiz).expect("seed quiz");
    quiz
}
