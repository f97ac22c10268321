pub mod keys;
pub mod migrate;
pub mod operations;
pub mod trees;

use serde::de::DeserializeOwned;
use serde::Serialize;
use sled::Db;
use thiserror::Error;

#[derive(Debug)]
pub struct Store {
    db: Db,
    pub users: sled::Tree,
    pub sessions: sled::Tree,
    pub classes: sled::Tree,
    pub class_members: sled::Tree,
    pub quizzes: sled::Tree,
    pub quiz_indexes: sled::Tree,
    pub attempts: sled::Tree,
    pub attempts_by_user: sled::Tree,
    pub progress: sled::Tree,
    pub game_states: sled::Tree,
    pub meta: sled::Tree,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("not found: entity={entity}, key={key}")]
    NotFound { entity: String, key: String },
    #[error("conflict: entity={entity}, key={key}")]
    Conflict { entity: String, key: String },
    #[error("validation error: {0}")]
    Validation(String),
    #[error("migration error at version {version}: {message}")]
    Migration { version: u32, message: String },
}

impl Store {
    pub fn open(sled_path: &str) -> Result<Self, StoreError> {
        let db = sled::open(sled_path)?;
        let users = db.open_tree(trees::USERS)?;
        let sessions = db.open_tree(trees::SESSIONS)?;
        let classes = db.open_tree(trees::CLASSES)?;
        let class_members = db.open_tree(trees::CLASS_MEMBERS)?;
        let quizzes = db.open_tree(trees::QUIZZES)?;
        let quiz_indexes = db.open_tree(trees::QUIZ_INDEXES)?;
        let attempts = db.open_tree(trees::ATTEMPTS)?;
        let attempts_by_user = db.open_tree(trees::ATTEMPTS_BY_USER)?;
        let progress = db.open_tree(trees::PROGRESS)?;
        let game_states = db.open_tree(trees::GAME_STATES)?;
        let meta = db.open_tree(trees::META)?;

        Ok(Self {
            db,
            users,
            sessions,
            classes,
            class_members,
            quizzes,
            quiz_indexes,
            attempts,
            attempts_by_user,
            progress,
            game_states,
            meta,
        })
    }

    pub fn run_migrations(&self) -> Result<(), StoreError> {
        migrate::run(self)
    }

    pub fn flush(&self) -> Result<(), StoreError> {
        self.db.flush()?;
        Ok(())
    }

    pub(crate) fn serialize<T: Serialize>(value: &T) -> Result<Vec<u8>, StoreError> {
        Ok(serde_json::to_vec(value)?)
    }

    pub(crate) fn deserialize<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, StoreError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
