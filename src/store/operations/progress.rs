use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::keys;
use crate::store::operations::quizzes::Quiz;
use crate::store::{Store, StoreError};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicMastery {
    pub topic: String,
    /// correct / answered * 100 for this topic; 0 until a question is seen.
    pub mastery: f64,
    pub questions_answered: u32,
    pub correct_answers: u32,
}

/// One per (student, quiz). Created lazily at first attempt start, mutated
/// after every answer, finalized at attempt completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
    pub student_id: String,
    pub quiz_id: String,
    pub attempt_ids: Vec<String>,
    pub best_score: f64,
    pub attempt_count: u32,
    pub last_attempt_at: Option<DateTime<Utc>>,
    pub topic_mastery: Vec<TopicMastery>,
    pub weak_topics: Vec<String>,
    pub strong_topics: Vec<String>,
}

impl ProgressRecord {
    /// Seed with a zeroed mastery entry per quiz topic so classification
    /// never has to guess which topics exist.
    pub fn seeded(student_id: &str, quiz: &Quiz) -> Self {
        Self {
            student_id: student_id.to_string(),
            quiz_id: quiz.id.clone(),
            attempt_ids: Vec::new(),
            best_score: 0.0,
            attempt_count: 0,
            last_attempt_at: None,
            topic_mastery: quiz
                .topics
                .iter()
                .map(|t| TopicMastery {
                    topic: t.name.clone(),
                    mastery: 0.0,
                    questions_answered: 0,
                    correct_answers: 0,
                })
                .collect(),
            weak_topics: Vec::new(),
            strong_topics: Vec::new(),
        }
    }
}

impl Store {
    pub fn get_progress(
        &self,
        student_id: &str,
        quiz_id: &str,
    ) -> Result<Option<ProgressRecord>, StoreError> {
        let key = keys::progress_key(student_id, quiz_id);
        match self.progress.get(key.as_bytes())? {
            Some(raw) => Ok(Some(Self::deserialize(&raw)?)),
            None => Ok(None),
        }
    }

    pub fn put_progress(&self, record: &ProgressRecord) -> Result<(), StoreError> {
        let key = keys::progress_key(&record.student_id, &record.quiz_id);
        self.progress
            .insert(key.as_bytes(), Self::serialize(record)?)?;
        Ok(())
    }

    pub fn list_student_progress(
        &self,
        student_id: &str,
    ) -> Result<Vec<ProgressRecord>, StoreError> {
        let prefix = keys::progress_prefix(student_id);
        let mut records = Vec::new();
        for item in self.progress.scan_prefix(prefix.as_bytes()) {
            let (_, value) = item?;
            records.push(Self::deserialize::<ProgressRecord>(&value)?);
        }
        Ok(records)
    }
}
