use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sled::Transactional;

use crate::store::keys;
use crate::store::{Store, StoreError};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRecord {
    pub question_id: String,
    pub given_answer: String,
    pub is_correct: bool,
    pub time_spent_seconds: u64,
    pub answered_at: DateTime<Utc>,
}

/// One student's single pass through a quiz. Mutable only while
/// `completed == false`; an abandoned attempt simply never completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptSession {
    pub id: String,
    pub student_id: String,
    pub quiz_id: String,
    pub answers: Vec<AnswerRecord>,
    pub time_spent_seconds: u64,
    pub correct_count: u32,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub score: Option<f64>,
    pub started_at: DateTime<Utc>,
}

impl AttemptSession {
    pub fn new(student_id: &str, quiz_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            student_id: student_id.to_string(),
            quiz_id: quiz_id.to_string(),
            answers: Vec::new(),
            time_spent_seconds: 0,
            correct_count: 0,
            completed: false,
            completed_at: None,
            score: None,
            started_at: now,
        }
    }

    pub fn has_answered(&self, question_id: &str) -> bool {
        self.answers.iter().any(|a| a.question_id == question_id)
    }
}

impl Store {
    pub fn create_attempt(&self, attempt: &AttemptSession) -> Result<(), StoreError> {
        let key = keys::attempt_key(&attempt.id);
        let index_key = keys::attempt_user_index_key(
            &attempt.student_id,
            attempt.started_at.timestamp_millis(),
            &attempt.id,
        );
        let attempt_bytes = Self::serialize(attempt)?;

        let key_bytes = key.as_bytes().to_vec();
        let index_key_bytes = index_key.as_bytes().to_vec();
        (&self.attempts, &self.attempts_by_user)
            .transaction(move |(tx_attempts, tx_index)| {
                tx_attempts.insert(key_bytes.as_slice(), attempt_bytes.as_slice())?;
                tx_index.insert(index_key_bytes.as_slice(), &[] as &[u8])?;
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

    pub fn get_attempt(&self, attempt_id: &str) -> Result<Option<AttemptSession>, StoreError> {
        let key = keys::attempt_key(attempt_id);
        match self.attempts.get(key.as_bytes())? {
            Some(raw) => Ok(Some(Self::deserialize(&raw)?)),
            None => Ok(None),
        }
    }

    pub fn update_attempt(&self, attempt: &AttemptSession) -> Result<(), StoreError> {
        let key = keys::attempt_key(&attempt.id);
        self.attempts
            .insert(key.as_bytes(), Self::serialize(attempt)?)?;
        Ok(())
    }

    /// Newest first, via the reverse-timestamp index.
    pub fn list_user_attempts(
        &self,
        student_id: &str,
        limit: usize,
    ) -> Result<Vec<AttemptSession>, StoreError> {
        let prefix = keys::attempt_user_prefix(student_id);
        let mut attempts = Vec::new();
        for item in self.attempts_by_user.scan_prefix(prefix.as_bytes()) {
            let (k, _) = item?;
            let key_str = String::from_utf8(k.to_vec()).unwrap_or_default();
            if let Some(attempt_id) = key_str.rsplit(':').next() {
                if let Some(attempt) = self.get_attempt(attempt_id)? {
                    attempts.push(attempt);
                    if attempts.len() >= limit {
                        break;
                    }
                }
            }
        }
        Ok(attempts)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn attempts_listed_newest_first() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path().join("db").to_str().unwrap()).unwrap();

        let now = Utc::now();
        let mut old = AttemptSession::new("s1", "qz1", now - Duration::minutes(5));
        old.id = "a-old".to_string();
        let mut new = AttemptSession::new("s1", "qz1", now);
        new.id = "a-new".to_string();

        store.create_attempt(&old).unwrap();
        store.create_attempt(&new).unwrap();

        let list = store.list_user_attempts("s1", 10).unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].id, "a-new");
        assert_eq!(list[1].id, "a-old");
    }

    #[test]
    fn has_answered_matches_recorded_answers() {
        let mut attempt = AttemptSession::new("s1", "qz1", Utc::now());
        attempt.answers.push(AnswerRecord {
            question_id: "q1".to_string(),
            given_answer: "A".to_string(),
            is_correct: true,
            time_spent_seconds: 4,
            answered_at: Utc::now(),
        });
        assert!(attempt.has_answered("q1"));
        assert!(!attempt.has_answered("q2"));
    }
}
