//! Announcements
//!
//! Published by administrators, read by everyone.

use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Medium
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(format!("Unknown announcement priority '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Announcement {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub priority: Priority,
    pub created_at: DateTime<Utc>,
}

/// Announcement creation payload
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewAnnouncement {
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: String,
    #[validate(length(min = 1, message = "Content is required"))]
    pub content: String,
    #[serde(default)]
    pub priority: Priority,
}

impl NewAnnouncement {
    fn into_announcement(self) -> Announcement {
        Announcement {
            id: Uuid::new_v4(),
            title: self.title.trim().to_string(),
            content: self.content,
            priority: self.priority,
            created_at: Utc::now(),
        }
    }
}

#[async_trait]
pub trait AnnouncementStore: Send + Sync {
    async fn insert(&self, announcement: Announcement) -> Result<Announcement, AppError>;

    /// Newest first
    async fn list(&self) -> Result<Vec<Announcement>, AppError>;
}

#[derive(Default)]
pub struct MemoryAnnouncementStore {
    announcements: RwLock<Vec<Announcement>>,
}

impl MemoryAnnouncementStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AnnouncementStore for MemoryAnnouncementStore {
    async fn insert(&self, announcement: Announcement) -> Result<Announcement, AppError> {
        self.announcements.write().await.push(announcement.clone());
        Ok(announcement)
    }

    async fn list(&self) -> Result<Vec<Announcement>, AppError> {
        let mut all = self.announcements.read().await.clone();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }
}

#[derive(Clone)]
pub struct AnnouncementService {
    store: Arc<dyn AnnouncementStore>,
}

impl AnnouncementService {
    pub fn new(store: Arc<dyn AnnouncementStore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, input: NewAnnouncement) -> Result<Announcement, AppError> {
        input.validate()?;
        let announcement = self.store.insert(input.into_announcement()).await?;
        tracing::info!(id = %announcement.id, priority = announcement.priority.as_str(), "announcement published");
        Ok(announcement)
    }

    pub async fn list(&self) -> Result<Vec<Announcement>, AppError> {
        self.store.list().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> AnnouncementService {
        AnnouncementService::new(Arc::new(MemoryAnnouncementStore::new()))
    }

    #[tokio::test]
    async fn test_priority_defaults_to_medium() {
        let input: NewAnnouncement =
            serde_json::from_str(r#"{"title":"Kickoff","content":"Hall A at 9"}"#).unwrap();
        let created = service().create(input).await.unwrap();
        assert_eq!(created.priority, Priority::Medium);
    }

    #[tokio::test]
    async fn test_rejects_empty_content() {
        let err = service()
            .create(NewAnnouncement {
                title: "Empty".to_string(),
                content: String::new(),
                priority: Priority::High,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let service = service();
        for title in ["first", "second"] {
            service
                .create(NewAnnouncement {
                    title: title.to_string(),
                    content: "body".to_string(),
                    priority: Priority::Low,
                })
                .await
                .unwrap();
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        }

        let titles: Vec<String> = service.list().await.unwrap().into_iter().map(|a| a.title).collect();
        assert_eq!(titles, vec!["second".to_string(), "first".to_string()]);
    }

    #[test]
    fn test_unknown_priority() {
        assert!(serde_json::from_str::<NewAnnouncement>(
            r#"{"title":"t","content":"c","priority":"urgent"}"#
        )
        .is_err());
        assert_eq!("high".parse::<Priority>().unwrap(), Priority::High);
    }
}
