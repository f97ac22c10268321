use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::keys;
use crate::store::{Store, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeCategory {
    Milestone,
    Accuracy,
    Streak,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Badge {
    pub id: String,
    pub category: BadgeCategory,
    pub unlocked_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Streak {
    pub current: u32,
    pub longest: u32,
    pub last_activity: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifetimeStats {
    pub quizzes_completed: u32,
    pub questions_answered: u32,
    pub correct_answers: u32,
    pub average_accuracy: f64,
    pub total_time_minutes: f64,
    pub fastest_completion_seconds: Option<u64>,
}

/// Per-student gamification state, one record per student, touched exactly
/// once per completed attempt by the reward engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub user_id: String,
    pub xp: u64,
    pub level: u32,
    pub streak: Streak,
    pub stats: LifetimeStats,
    pub badges: Vec<Badge>,
}

impl GameState {
    pub fn new(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            xp: 0,
            level: 1,
            streak: Streak::default(),
            stats: LifetimeStats::default(),
            badges: Vec::new(),
        }
    }

    pub fn has_badge(&self, badge_id: &str) -> bool {
        self.badges.iter().any(|b| b.id == badge_id)
    }
}

impl Store {
    pub fn get_game_state(&self, user_id: &str) -> Result<Option<GameState>, StoreError> {
        let key = keys::game_state_key(user_id);
        match self.game_states.get(key.as_bytes())? {
            Some(raw) => Ok(Some(Self::deserialize(&raw)?)),
            None => Ok(None),
        }
    }

    /// Whole-record replace; the caller holds the per-student lock across
    /// the read-modify-write.
    pub fn put_game_state(&self, state: &GameState) -> Result<(), StoreError> {
        let key = keys::game_state_key(&state.user_id);
        self.game_states
            .insert(key.as_bytes(), Self::serialize(state)?)?;
        Ok(())
    }
}
