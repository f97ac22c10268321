use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sled::Transactional;

use crate::constants::{POINTS_EASY, POINTS_HARD, POINTS_MEDIUM};
use crate::store::keys;
use crate::store::{Store, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionType {
    MultipleChoice,
    TrueFalse,
    ShortAnswer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Fixed point-value table keyed by (repaired) difficulty.
    pub fn point_value(self) -> u32 {
        match self {
            Difficulty::Easy => POINTS_EASY,
            Difficulty::Medium => POINTS_MEDIUM,
            Difficulty::Hard => POINTS_HARD,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionOption {
    pub text: String,
    pub is_correct: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    pub text: String,
    pub question_type: QuestionType,
    pub options: Vec<QuestionOption>,
    pub correct_answer: String,
    pub explanation: String,
    pub topic: String,
    pub difficulty: Difficulty,
    pub points: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    pub name: String,
    pub weight: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizSettings {
    pub adaptive: bool,
    pub time_limit_minutes: u32,
}

/// Immutable once published: attempts reference questions by id, so edits
/// after activation are limited to the `is_active` flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    pub id: String,
    pub owner_id: String,
    pub class_id: Option<String>,
    pub title: String,
    pub description: String,
    pub questions: Vec<Question>,
    pub topics: Vec<Topic>,
    pub settings: QuizSettings,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Quiz {
    pub fn question_by_id(&self, question_id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == question_id)
    }
}

impl Store {
    pub fn create_quiz(&self, quiz: &Quiz) -> Result<(), StoreError> {
        let quiz_key = keys::quiz_key(&quiz.id);
        let quiz_bytes = Self::serialize(quiz)?;
        let owner_index = keys::quiz_owner_index_key(&quiz.owner_id, &quiz.id);
        let class_index = quiz
            .class_id
            .as_deref()
            .map(|class_id| keys::quiz_class_index_key(class_id, &quiz.id));

        let quiz_key_bytes = quiz_key.as_bytes().to_vec();
        let owner_index_bytes = owner_index.as_bytes().to_vec();
        let class_index_bytes = class_index.map(|k| k.as_bytes().to_vec());

        (&self.quizzes, &self.quiz_indexes)
            .transaction(move |(tx_quizzes, tx_indexes)| {
                tx_quizzes.insert(quiz_key_bytes.as_slice(), quiz_bytes.as_slice())?;
                tx_indexes.insert(owner_index_bytes.as_slice(), &[] as &[u8])?;
                if let Some(ref class_key) = class_index_bytes {
                    tx_indexes.insert(class_key.as_slice(), &[] as &[u8])?;
                }
                Ok(())
            })
            .map_err(|e: sled::transaction::TransactionError<()>| match e {
                sled::transaction::TransactionError::Abort(()) => {
                    StoreError::Sled(sled::Error::Unsupported("transaction aborted".into()))
                }
                sled::transaction::TransactionError::Storage(se) => StoreError::Sled(se),
            })?;
        Ok(())
    }

    pub fn get_quiz(&self, quiz_id: &str) -> Result<Option<Quiz>, StoreError> {
        let key = keys::quiz_key(quiz_id);
        match self.quizzes.get(key.as_bytes())? {
            Some(raw) => Ok(Some(Self::deserialize(&raw)?)),
            None => Ok(None),
        }
    }

    pub fn update_quiz(&self, quiz: &Quiz) -> Result<(), StoreError> {
        if self.get_quiz(&quiz.id)?.is_none() {
            return Err(StoreError::NotFound {
                entity: "quiz".to_string(),
                key: quiz.id.clone(),
            });
        }
        let key = keys::quiz_key(&quiz.id);
        self.quizzes
            .insert(key.as_bytes(), Self::serialize(quiz)?)?;
        Ok(())
    }

    pub fn delete_quiz(&self, quiz_id: &str) -> Result<(), StoreError> {
        let Some(quiz) = self.get_quiz(quiz_id)? else {
            return Err(StoreError::NotFound {
                entity: "quiz".to_string(),
                key: quiz_id.to_string(),
            });
        };

        let quiz_key = keys::quiz_key(quiz_id);
        let owner_index = keys::quiz_owner_index_key(&quiz.owner_id, quiz_id);
        let class_index = quiz
            .class_id
            .as_deref()
            .map(|class_id| keys::quiz_class_index_key(class_id, quiz_id));

        let quiz_key_bytes = quiz_key.as_bytes().to_vec();
        let owner_index_bytes = owner_index.as_bytes().to_vec();
        let class_index_bytes = class_index.map(|k| k.as_bytes().to_vec());

        (&self.quizzes, &self.quiz_indexes)
            .transaction(move |(tx_quizzes, tx_indexes)| {
                tx_quizzes.remove(quiz_key_bytes.as_slice())?;
                tx_indexes.remove(owner_index_bytes.as_slice())?;
                if let Some(ref class_key) = class_index_bytes {
                    tx_indexes.remove(class_key.as_slice())?;
                }
                Ok(())
            })
            .map_err(|e: sled::transaction::TransactionError<()>| match e {
                sled::transaction::TransactionError::Abort(()) => {
                    StoreError::Sled(sled::Error::Unsupported("transaction aborted".into()))
                }
                sled::transaction::TransactionError::Storage(se) => StoreError::Sled(se),
            })?;
        Ok(())
    }

    pub fn list_quizzes_by_owner(&self, owner_id: &str) -> Result<Vec<Quiz>, StoreError> {
        let prefix = keys::quiz_owner_prefix(owner_id);
        self.collect_quizzes_from_index(&prefix)
    }

    pub fn list_quizzes_by_class(&self, class_id: &str) -> Result<Vec<Quiz>, StoreError> {
        let prefix = keys::quiz_class_prefix(class_id);
        self.collect_quizzes_from_index(&prefix)
    }

    fn collect_quizzes_from_index(&self, prefix: &str) -> Result<Vec<Quiz>, StoreError> {
        let mut quizzes = Vec::new();
        for item in self.quiz_indexes.scan_prefix(prefix.as_bytes()) {
            let (k, _) = item?;
            let key_str = String::from_utf8(k.to_vec()).unwrap_or_default();
            if let Some(quiz_id) = key_str.rsplit(':').next() {
                if let Some(quiz) = self.get_quiz(quiz_id)? {
                    quizzes.push(quiz);
                }
            }
        }
        Ok(quizzes)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    pub(crate) fn sample_question(id: &str, topic: &str, difficulty: Difficulty) -> Question {
        Question {
            id: id.to_string(),
            text: format!("Question {id}"),
            question_type: QuestionType::MultipleChoice,
            options: vec![
                QuestionOption {
                    text: "A".to_string(),
                    is_correct: true,
                },
                QuestionOption {
                    text: "B".to_string(),
                    is_correct: false,
                },
            ],
            correct_answer: "A".to_string(),
            explanation: "Because A.".to_string(),
            topic: topic.to_string(),
            difficulty,
            points: difficulty.point_value(),
        }
    }

    fn sample_quiz(id: &str, class_id: Option<&str>) -> Quiz {
        let now = Utc::now();
        Quiz {
            id: id.to_string(),
            owner_id: "teacher1".to_string(),
            class_id: class_id.map(str::to_string),
            title: "Cell Biology".to_string(),
            description: String::new(),
            questions: vec![sample_question("q1", "cells", Difficulty::Easy)],
            topics: vec![Topic {
                name: "cells".to_string(),
                weight: 1.0,
            }],
            settings: QuizSettings {
                adaptive: true,
                time_limit_minutes: 10,
            },
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn point_table_matches_difficulty() {
        assert_eq!(Difficulty::Easy.point_value(), 5);
        assert_eq!(Difficulty::Medium.point_value(), 10);
        assert_eq!(Difficulty::Hard.point_value(), 15);
    }

    #[test]
    fn question_type_serializes_kebab_case() {
        let json = serde_json::to_value(QuestionType::MultipleChoice).unwrap();
        assert_eq!(json, "multiple-choice");
        let json = serde_json::to_value(QuestionType::TrueFalse).unwrap();
        assert_eq!(json, "true-false");
    }

    #[test]
    fn class_index_lists_quiz() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path().join("db").to_str().unwrap()).unwrap();

        store.create_quiz(&sample_quiz("qz1", Some("c1"))).unwrap();
        store.create_quiz(&sample_quiz("qz2", None)).unwrap();

        let by_class = store.list_quizzes_by_class("c1").unwrap();
        assert_eq!(by_class.len(), 1);
        assert_eq!(by_class[0].id, "qz1");

        let by_owner = store.list_quizzes_by_owner("teacher1").unwrap();
        assert_eq!(by_owner.len(), 2);
    }

    #[test]
    fn delete_removes_indexes() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path().join("db").to_str().unwrap()).unwrap();

        store.create_quiz(&sample_quiz("qz1", Some("c1"))).unwrap();
        store.delete_quiz("qz1").unwrap();

        assert!(store.get_quiz("qz1").unwrap().is_none());
        assert!(store.list_quizzes_by_class("c1").unwrap().is_empty());
        assert!(store.list_quizzes_by_owner("teacher1").unwrap().is_empty());
    }
}
