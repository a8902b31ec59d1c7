//! Hackathon settings
//!
//! A single settings record holds the submission deadline. It does not exist
//! until an administrator first sets a deadline; until then no deadline is
//! enforced.

use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub submission_deadline: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Settings {
    /// Whether submissions are closed at `now`
    pub fn deadline_passed(&self, now: DateTime<Utc>) -> bool {
        now > self.submission_deadline
    }
}

#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn get(&self) -> Result<Option<Settings>, AppError>;

    /// Create the record if absent, otherwise overwrite the deadline
    async fn upsert_deadline(&self, deadline: DateTime<Utc>) -> Result<Settings, AppError>;
}

/// In-memory settings record
#[derive(Default)]
pub struct MemorySettingsStore {
    settings: RwLock<Option<Settings>>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn get(&self) -> Result<Option<Settings>, AppError> {
        Ok(self.settings.read().await.clone())
    }

    async fn upsert_deadline(&self, deadline: DateTime<Utc>) -> Result<Settings, AppError> {
        let mut slot = self.settings.write().await;
        let settings = Settings {
            submission_deadline: deadline,
            updated_at: Utc::now(),
        };
        *slot = Some(settings.clone());
        Ok(settings)
    }
}

/// Single point of access for the settings record
#[derive(Clone)]
pub struct SettingsAccessor {
    store: Arc<dyn SettingsStore>,
}

impl SettingsAccessor {
    pub fn new(store: Arc<dyn SettingsStore>) -> Self {
        Self { store }
    }

    pub async fn get_settings(&self) -> Result<Option<Settings>, AppError> {
        self.store.get().await
    }

    pub async fn upsert_deadline(&self, deadline: DateTime<Utc>) -> Result<Settings, AppError> {
        let settings = self.store.upsert_deadline(deadline).await?;
        info!(deadline = %settings.submission_deadline, "submission deadline updated");
        Ok(settings)
    }
}
