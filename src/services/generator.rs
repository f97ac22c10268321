use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::GeneratorConfig;
use crate::store::operations::quizzes::{Difficulty, Question, QuestionOption, QuestionType};

/// Turns source text into quiz questions via an external model API, with a
/// deterministic built-in set as the fallback. Model output is treated as
/// untrusted: every question passes through `repair_question` before it is
/// allowed near a quiz, and any upstream failure falls back instead of
/// failing quiz creation.
#[derive(Debug, Clone)]
pub struct QuestionGenerator {
    config: GeneratorConfig,
    client: reqwest::Client,
}

#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub source_text: String,
    pub topic: String,
    pub count: usize,
    pub difficulty: Option<Difficulty>,
}

#[derive(Debug, thiserror::Error)]
pub enum GeneratorError {
    #[error("generator request timed out")]
    Timeout,
    #[error("generator network error: {0}")]
    Network(String),
    #[error("generator api error: status={status}, message={message}")]
    ApiError { status: u16, message: String },
    #[error("generator returned no usable questions")]
    EmptyOutput,
}

#[derive(Debug, Serialize)]
struct GeneratorApiRequest<'a> {
    source: &'a str,
    topic: &'a str,
    count: usize,
}

/// Whatever shape the model returned; every field is optional and coerced.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawQuestion {
    #[serde(default, alias = "question")]
    text: String,
    #[serde(default, rename = "type", alias = "questionType")]
    question_type: Option<Value>,
    #[serde(default)]
    options: Vec<Value>,
    #[serde(default, alias = "answer")]
    correct_answer: String,
    #[serde(default)]
    explanation: String,
    #[serde(default)]
    topic: String,
    #[serde(default)]
    difficulty: Option<Value>,
}

impl QuestionGenerator {
    pub fn new(config: &GeneratorConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            config: config.clone(),
            client,
        }
    }

    /// Validate generator configuration at startup.
    /// Panics on `enabled=true, mock=false` without an API key, since real
    /// generation cannot work without one.
    pub fn validate_config(config: &GeneratorConfig) {
        if config.enabled && !config.mock && config.api_key.is_empty() {
            panic!(
                "Invalid generator configuration: enabled=true and mock=false \
                 but GENERATOR_API_KEY is empty. \
                 Set GENERATOR_MOCK=true or provide an API key."
            );
        }
    }

    /// Generate questions for a quiz. Never fails: disabled and mock modes
    /// use the built-in set, and a real-API failure logs a warning and
    /// falls back to the built-in set as well.
    pub async fn generate(&self, request: &GenerationRequest) -> Vec<Question> {
        if !self.config.enabled || self.config.mock {
            return fallback_questions(request);
        }

        match self.generate_remote(request).await {
            Ok(questions) => questions,
            Err(err) => {
                tracing::warn!(error = %err, topic = %request.topic, "question generation failed, using fallback set");
                fallback_questions(request)
            }
        }
    }

    async fn generate_remote(
        &self,
        request: &GenerationRequest,
    ) -> Result<Vec<Question>, GeneratorError> {
        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .json(&GeneratorApiRequest {
                source: &request.source_text,
                topic: &request.topic,
                count: request.count,
            })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GeneratorError::Timeout
                } else {
                    GeneratorError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GeneratorError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let raw: Vec<RawQuestion> = response
            .json()
            .await
            .map_err(|e| GeneratorError::Network(e.to_string()))?;

        let questions: Vec<Question> = raw
            .into_iter()
            .filter_map(|r| repair_question(r, &request.topic))
            .take(request.count)
            .collect();

        if questions.is_empty() {
            return Err(GeneratorError::EmptyOutput);
        }
        Ok(questions)
    }
}

/// Normalize one model-produced question into the strict internal shape.
/// Returns `None` when the question is unusable (no text or no answer).
fn repair_question(raw: RawQuestion, fallback_topic: &str) -> Option<Question> {
    let text = raw.text.trim().to_string();
    let correct_answer = raw.correct_answer.trim().to_string();
    if text.is_empty() || correct_answer.is_empty() {
        return None;
    }

    let options = coerce_options(&raw.options, &correct_answer);
    let question_type = coerce_type(raw.question_type.as_ref(), &options, &correct_answer);
    let difficulty = coerce_difficulty(raw.difficulty.as_ref());

    let topic = if raw.topic.trim().is_empty() {
        fallback_topic.to_string()
    } else {
        raw.topic.trim().to_string()
    };

    Some(Question {
        id: uuid::Uuid::new_v4().to_string(),
        text,
        question_type,
        options,
        correct_answer,
        explanation: raw.explanation.trim().to_string(),
        topic,
        difficulty,
        points: difficulty.point_value(),
    })
}

fn coerce_options(raw: &[Value], correct_answer: &str) -> Vec<QuestionOption> {
    raw.iter()
        .filter_map(|v| match v {
            Value::String(s) => Some(QuestionOption {
                text: s.clone(),
                is_correct: s == correct_answer,
            }),
            Value::Object(obj) => {
                let text = obj.get("text")?.as_str()?.to_string();
                let is_correct = obj
                    .get("isCorrect")
                    .and_then(Value::as_bool)
                    .unwrap_or(text == correct_answer);
                Some(QuestionOption { text, is_correct })
            }
            _ => None,
        })
        .collect()
}

fn coerce_type(
    raw: Option<&Value>,
    options: &[QuestionOption],
    correct_answer: &str,
) -> QuestionType {
    if let Some(Value::String(s)) = raw {
        match s.to_lowercase().replace('_', "-").as_str() {
            "multiple-choice" | "mc" | "choice" => return QuestionType::MultipleChoice,
            "true-false" | "boolean" => return QuestionType::TrueFalse,
            "short-answer" | "text" | "open" => return QuestionType::ShortAnswer,
            _ => {}
        }
    }
    if matches!(correct_answer.to_lowercase().as_str(), "true" | "false") {
        QuestionType::TrueFalse
    } else if !options.is_empty() {
        QuestionType::MultipleChoice
    } else {
        QuestionType::ShortAnswer
    }
}

/// Strings map by name; numbers map 1-2 easy, 3 medium, 4-5 hard.
/// Anything else lands on medium.
fn coerce_difficulty(raw: Option<&Value>) -> Difficulty {
    match raw {
        Some(Value::String(s)) => match s.to_lowercase().as_str() {
            "easy" => Difficulty::Easy,
            "medium" => Difficulty::Medium,
            "hard" => Difficulty::Hard,
            _ => Difficulty::Medium,
        },
        Some(Value::Number(n)) => match n.as_i64() {
            Some(1) | Some(2) => Difficulty::Easy,
            Some(3) => Difficulty::Medium,
            Some(4) | Some(5) => Difficulty::Hard,
            _ => Difficulty::Medium,
        },
        _ => Difficulty::Medium,
    }
}

/// Deterministic built-in question set: true/false comprehension checks
/// over the requested topic, alternating easy/medium, capped at the
/// requested count.
fn fallback_questions(request: &GenerationRequest) -> Vec<Question> {
    let count = request.count.max(1);
    (0..count)
        .map(|i| {
            let difficulty = request.difficulty.unwrap_or(if i % 2 == 0 {
                Difficulty::Easy
            } else {
                Difficulty::Medium
            });
            Question {
                id: uuid::Uuid::new_v4().to_string(),
                text: format!(
                    "Statement {} about {} is supported by the source material.",
                    i + 1,
                    request.topic
                ),
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
                explanation: String::new(),
                topic: request.topic.clone(),
                difficulty,
                points: difficulty.point_value(),
            }
        })
        .collect()
}
