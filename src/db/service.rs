// PostgreSQL-backed stores
//
// Implements proposal, settings and announcement persistence on a deadpool pool.

use crate::announcement::{Announcement, AnnouncementStore, Priority};
use crate::db::queries;
use crate::error::AppError;
use crate::proposal::store::{ProposalRepository, StatusTransition, TransitionOutcome};
use crate::proposal::{Proposal, ProposalStatus, Student};
use crate::settings::{Settings, SettingsStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use deadpool_postgres::Pool;
use postgres_types::Json;
use tokio_postgres::error::SqlState;
use tokio_postgres::Row;
use uuid::Uuid;

// Proposal store
pub struct PgProposalStore {
    pool: Pool,
}

impl PgProposalStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

fn parse_status(raw: &str) -> Result<ProposalStatus, AppError> {
    raw.parse().map_err(AppError::Storage)
}

fn proposal_from_row(row: &Row) -> Result<Proposal, AppError> {
    let students: Json<Vec<Student>> = row.try_get("students")?;
    let status: String = row.try_get("status")?;

    Ok(Proposal {
        id: row.try_get("id")?,
        team_name: row.try_get("team_name")?,
        students: students.0,
        project_title: row.try_get("project_title")?,
        project_logo: row.try_get("project_logo")?,
        team_composition: row.try_get("team_composition")?,
        problem_statement: row.try_get("problem_statement")?,
        tools_and_methodology: row.try_get("tools_and_methodology")?,
        implementation_plan: row.try_get("implementation_plan")?,
        project_flow_slides: row.try_get("project_flow_slides")?,
        expected_results: row.try_get("expected_results")?,
        additional_details: row.try_get("additional_details")?,
        status: parse_status(&status)?,
        submitted_at: row.try_get("submitted_at")?,
    })
}

fn proposals_from_rows(rows: &[Row]) -> Result<Vec<Proposal>, AppError> {
    rows.iter().map(proposal_from_row).collect()
}

#[async_trait]
impl ProposalRepository for PgProposalStore {
    async fn insert(&self, proposal: Proposal) -> Result<Proposal, AppError> {
        let client = self.pool.get().await?;
        let students = Json(&proposal.students);
        let status = proposal.status.as_str();

        let row = client
            .query_one(
                &queries::insert_proposal(),
                &[
                    &proposal.id,
                    &proposal.team_name,
                    &students,
                    &proposal.project_title,
                    &proposal.project_logo,
                    &proposal.team_composition,
                    &proposal.problem_statement,
                    &proposal.tools_and_methodology,
                    &proposal.implementation_plan,
                    &proposal.project_flow_slides,
                    &proposal.expected_results,
                    &proposal.additional_details,
                    &status,
                    &proposal.submitted_at,
                ],
            )
            .await
            .map_err(|e| {
                if e.code() == Some(&SqlState::UNIQUE_VIOLATION) {
                    AppError::DuplicateTeam(proposal.team_name.clone())
                } else {
                    AppError::Database(e)
                }
            })?;

        proposal_from_row(&row)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Proposal>, AppError> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(&queries::select_proposal_by_id(), &[&id])
            .await?;
        row.as_ref().map(proposal_from_row).transpose()
    }

    async fn find_by_team_name(&self, team_name: &str) -> Result<Option<Proposal>, AppError> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(&queries::select_proposal_by_team_name(), &[&team_name])
            .await?;
        row.as_ref().map(proposal_from_row).transpose()
    }

    async fn list_all(&self) -> Result<Vec<Proposal>, AppError> {
        let client = self.pool.get().await?;
        let rows = client.query(&queries::select_all_proposals(), &[]).await?;
        proposals_from_rows(&rows)
    }

    async fn list_by_status(
        &self,
        status: ProposalStatus,
        limit: usize,
    ) -> Result<Vec<Proposal>, AppError> {
        let client = self.pool.get().await?;
        let limit = limit as i64;
        let rows = client
            .query(&queries::select_proposals_by_status(), &[&status.as_str(), &limit])
            .await?;
        proposals_from_rows(&rows)
    }

    async fn count_by_status(&self, status: ProposalStatus) -> Result<u64, AppError> {
        let client = self.pool.get().await?;
        let row = client
            .query_one(queries::COUNT_BY_STATUS, &[&status.as_str()])
            .await?;
        let count: i64 = row.try_get(0)?;
        Ok(count as u64)
    }

    async fn missing_ids(&self, ids: &[Uuid]) -> Result<Vec<Uuid>, AppError> {
        let client = self.pool.get().await?;
        let rows = client.query(queries::SELECT_EXISTING_IDS, &[&ids]).await?;
        let existing = rows
            .iter()
            .map(|r| r.try_get::<_, Uuid>(0))
            .collect::<Result<std::collections::HashSet<Uuid>, _>>()?;
        Ok(ids.iter().filter(|id| !existing.contains(id)).copied().collect())
    }

    async fn compare_and_set_status(
        &self,
        transition: StatusTransition,
    ) -> Result<TransitionOutcome, AppError> {
        let mut client = self.pool.get().await?;
        let tx = client.transaction().await?;

        // Writers that may grow the selected set queue on one lock, so the
        // count below cannot go stale before commit
        if transition.capacity.is_some() {
            tx.execute(queries::LOCK_SELECTION, &[&queries::SELECTION_LOCK_KEY])
                .await?;
        }

        let current = match tx
            .query_opt(queries::SELECT_STATUS_FOR_UPDATE, &[&transition.id])
            .await?
        {
            Some(row) => parse_status(row.try_get::<_, &str>(0)?)?,
            None => return Ok(TransitionOutcome::NotFound),
        };
        if current != transition.expected {
            return Ok(TransitionOutcome::StatusChanged(current));
        }

        if let Some(capacity) = transition.capacity {
            let row = tx
                .query_one(queries::COUNT_BY_STATUS, &[&ProposalStatus::Selected.as_str()])
                .await?;
            let selected = row.try_get::<_, i64>(0)? as u64;
            if selected >= capacity {
                return Ok(TransitionOutcome::CapacityExceeded { selected });
            }
        }

        let row = tx
            .query_opt(
                &queries::update_status_if_unchanged(),
                &[
                    &transition.id,
                    &transition.expected.as_str(),
                    &transition.next.as_str(),
                ],
            )
            .await?;

        let outcome = match row {
            Some(row) => TransitionOutcome::Applied(proposal_from_row(&row)?),
            None => TransitionOutcome::NotFound,
        };
        tx.commit().await?;
        Ok(outcome)
    }

    async fn replace_selection(&self, ids: &[Uuid]) -> Result<u64, AppError> {
        let mut client = self.pool.get().await?;
        let tx = client.transaction().await?;

        tx.execute(queries::LOCK_SELECTION, &[&queries::SELECTION_LOCK_KEY])
            .await?;
        tx.execute(queries::RESET_ALL_TO_SUBMITTED, &[]).await?;
        let selected = tx.execute(queries::SELECT_IDS, &[&ids]).await?;

        tx.commit().await?;
        Ok(selected)
    }
}

// Settings store
pub struct PgSettingsStore {
    pool: Pool,
}

impl PgSettingsStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

fn settings_from_row(row: &Row) -> Result<Settings, AppError> {
    Ok(Settings {
        submission_deadline: row.try_get("submission_deadline")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl SettingsStore for PgSettingsStore {
    async fn get(&self) -> Result<Option<Settings>, AppError> {
        let client = self.pool.get().await?;
        let row = client.query_opt(queries::SELECT_SETTINGS, &[]).await?;
        row.as_ref().map(settings_from_row).transpose()
    }

    async fn upsert_deadline(&self, deadline: DateTime<Utc>) -> Result<Settings, AppError> {
        let client = self.pool.get().await?;
        let row = client
            .query_one(queries::UPSERT_DEADLINE, &[&deadline, &Utc::now()])
            .await?;
        settings_from_row(&row)
    }
}

// Announcement store
pub struct PgAnnouncementStore {
    pool: Pool,
}

impl PgAnnouncementStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

fn announcement_from_row(row: &Row) -> Result<Announcement, AppError> {
    let priority: String = row.try_get("priority")?;
    Ok(Announcement {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        content: row.try_get("content")?,
        priority: priority.parse::<Priority>().map_err(AppError::Storage)?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl AnnouncementStore for PgAnnouncementStore {
    async fn insert(&self, announcement: Announcement) -> Result<Announcement, AppError> {
        let client = self.pool.get().await?;
        let row = client
            .query_one(
                queries::INSERT_ANNOUNCEMENT,
                &[
                    &announcement.id,
                    &announcement.title,
                    &announcement.content,
                    &announcement.priority.as_str(),
                    &announcement.created_at,
                ],
            )
            .await?;
        announcement_from_row(&row)
    }

    async fn list(&self) -> Result<Vec<Announcement>, AppError> {
        let client = self.pool.get().await?;
        let rows = client.query(queries::SELECT_ANNOUNCEMENTS, &[]).await?;
        rows.iter().map(announcement_from_row).collect()
    }
}
