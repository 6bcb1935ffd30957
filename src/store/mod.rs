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
    pub student_profiles: sled::Tree,
    pub training_plans: sled::Tree,
    pub action_library: sled::Tree,
    pub tags: sled::Tree,
    pub permission_logs: sled::Tree,
    pub config_versions: sled::Tree,
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
        let student_profiles = db.open_tree(trees::STUDENT_PROFILES)?;
        let training_plans = db.open_tree(trees::TRAINING_PLANS)?;
        let action_library = db.open_tree(trees::ACTION_LIBRARY)?;
        let tags = db.open_tree(trees::TAGS)?;
        let permission_logs = db.open_tree(trees::PERMISSION_LOGS)?;
        let config_versions = db.open_tree(trees::CONFIG_VERSIONS)?;

        Ok(Self {
            db,
            users,
            sessions,
            student_profiles,
            training_plans,
            action_library,
            tags,
            permission_logs,
            config_versions,
        })
    }

    pub fn run_migrations(&self) -> Result<(), StoreError> {
        migrate::run(self)
    }

    pub fn flush(&self) -> Result<(), StoreError> {
        self.db.flush()?;
        Ok(())
    }

    pub fn raw_db(&self) -> &Db {
        &self.db
    }

    pub(crate) fn serialize<T: Serialize>(value: &T) -> Result<Vec<u8>, StoreError> {
        Ok(serde_json::to_vec(value)?)
    }

    pub(crate) fn deserialize<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, StoreError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
