//! Application state management
//!
//! Contains shared state accessible across all handlers.

use crate::announcement::{AnnouncementService, AnnouncementStore, MemoryAnnouncementStore};
use crate::auth::AdminGuard;
use crate::config::Config;
use crate::db::{PgAnnouncementStore, PgProposalStore, PgSettingsStore};
use crate::images::{ImageStore, LocalImageStore, UploadPolicy};
use crate::proposal::{MemoryProposalStore, ProposalRepository, SelectionEngine, SubmissionValidator};
use crate::settings::{MemorySettingsStore, SettingsAccessor, SettingsStore};
use deadpool_postgres::Pool;
use std::sync::Arc;

/// Application state shared across all handlers
pub struct AppState {
    /// Every proposal status change goes through here
    pub selection: SelectionEngine,

    /// Guards proposal creation
    pub submissions: SubmissionValidator,

    /// Submission deadline record
    pub settings: SettingsAccessor,

    pub announcements: AnnouncementService,

    /// Team logo blob store
    pub images: Arc<dyn ImageStore>,

    pub upload_policy: UploadPolicy,

    /// Shared-secret check for admin routes
    pub admin: AdminGuard,
}

impl AppState {
    /// Assemble state from explicit stores
    pub fn from_stores(
        proposals: Arc<dyn ProposalRepository>,
        settings: Arc<dyn SettingsStore>,
        announcements: Arc<dyn AnnouncementStore>,
        images: Arc<dyn ImageStore>,
        config: &Config,
    ) -> Self {
        let settings = SettingsAccessor::new(settings);

        Self {
            selection: SelectionEngine::new(proposals.clone()),
            submissions: SubmissionValidator::new(proposals, settings.clone()),
            settings,
            announcements: AnnouncementService::new(announcements),
            images,
            upload_policy: UploadPolicy {
                max_bytes: config.uploads.max_bytes,
            },
            admin: AdminGuard::new(&config.admin.password),
        }
    }

    /// PostgreSQL-backed state
    pub fn with_pool(pool: Pool, config: &Config) -> Self {
        Self::from_stores(
            Arc::new(PgProposalStore::new(pool.clone())),
            Arc::new(PgSettingsStore::new(pool.clone())),
            Arc::new(PgAnnouncementStore::new(pool)),
            Arc::new(local_image_store(config)),
            config,
        )
    }

    /// Process-local state, nothing survives a restart
    pub fn in_memory(config: &Config) -> Self {
        Self::from_stores(
            Arc::new(MemoryProposalStore::new()),
            Arc::new(MemorySettingsStore::new()),
            Arc::new(MemoryAnnouncementStore::new()),
            Arc::new(local_image_store(config)),
            config,
        )
    }
}

fn local_image_store(config: &Config) -> LocalImageStore {
    LocalImageStore::new(&config.uploads.dir, &config.uploads.public_base_url)
}

/// Type alias for shared state
pub type SharedState = Arc<AppState>;
