//! Proposal storage
//!
//! `ProposalRepository` is the persistence seam for proposals. Every
//! implementation must apply `compare_and_set_status` and `replace_selection`
//! as indivisible operations; the selection engine relies on that for the
//! capacity invariant.

use crate::error::AppError;
use crate::proposal::{Proposal, ProposalStatus};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Guarded status transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusTransition {
    pub id: Uuid,
    /// Status the proposal must still hold for the write to apply
    pub expected: ProposalStatus,
    pub next: ProposalStatus,
    /// When set, the write only applies while fewer than this many
    /// proposals are selected
    pub capacity: Option<u64>,
}

/// Result of a guarded status transition
#[derive(Debug, Clone, PartialEq)]
pub enum TransitionOutcome {
    Applied(Proposal),
    NotFound,
    /// Another writer changed the status first
    StatusChanged(ProposalStatus),
    CapacityExceeded { selected: u64 },
}

#[async_trait]
pub trait ProposalRepository: Send + Sync {
    /// Insert a new proposal; fails with `DuplicateTeam` when the team name is taken
    async fn insert(&self, proposal: Proposal) -> Result<Proposal, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Proposal>, AppError>;

    async fn find_by_team_name(&self, team_name: &str) -> Result<Option<Proposal>, AppError>;

    /// All proposals, newest submission first
    async fn list_all(&self) -> Result<Vec<Proposal>, AppError>;

    /// Proposals holding `status`, oldest submission first, at most `limit`
    async fn list_by_status(&self, status: ProposalStatus, limit: usize)
        -> Result<Vec<Proposal>, AppError>;

    async fn count_by_status(&self, status: ProposalStatus) -> Result<u64, AppError>;

    /// Ids from `ids` that do not resolve to a stored proposal
    async fn missing_ids(&self, ids: &[Uuid]) -> Result<Vec<Uuid>, AppError>;

    /// Atomic check-and-write of a single proposal status
    async fn compare_and_set_status(
        &self,
        transition: StatusTransition,
    ) -> Result<TransitionOutcome, AppError>;

    /// Reset every proposal to `submitted`, then select `ids`.
    /// Returns the number of proposals now selected.
    async fn replace_selection(&self, ids: &[Uuid]) -> Result<u64, AppError>;
}

/// Thread-safe in-memory proposal store
pub struct MemoryProposalStore {
    proposals: Arc<RwLock<HashMap<Uuid, Proposal>>>,
}

impl MemoryProposalStore {
    pub fn new() -> Self {
        Self {
            proposals: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for MemoryProposalStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProposalRepository for MemoryProposalStore {
    async fn insert(&self, proposal: Proposal) -> Result<Proposal, AppError> {
        let mut proposals = self.proposals.write().await;
        if proposals.values().any(|p| p.team_name == proposal.team_name) {
            return Err(AppError::DuplicateTeam(proposal.team_name));
        }
        proposals.insert(proposal.id, proposal.clone());
        Ok(proposal)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Proposal>, AppError> {
        let proposals = self.proposals.read().await;
        Ok(proposals.get(&id).cloned())
    }

    async fn find_by_team_name(&self, team_name: &str) -> Result<Option<Proposal>, AppError> {
        let proposals = self.proposals.read().await;
        Ok(proposals.values().find(|p| p.team_name == team_name).cloned())
    }

    async fn list_all(&self) -> Result<Vec<Proposal>, AppError> {
        let proposals = self.proposals.read().await;
        let mut all: Vec<Proposal> = proposals.values().cloned().collect();
        all.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        Ok(all)
    }

    async fn list_by_status(
        &self,
        status: ProposalStatus,
        limit: usize,
    ) -> Result<Vec<Proposal>, AppError> {
        let proposals = self.proposals.read().await;
        let mut matching: Vec<Proposal> = proposals
            .values()
            .filter(|p| p.status == status)
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.submitted_at.cmp(&b.submitted_at));
        matching.truncate(limit);
        Ok(matching)
    }

    async fn count_by_status(&self, status: ProposalStatus) -> Result<u64, AppError> {
        let proposals = self.proposals.read().await;
        Ok(proposals.values().filter(|p| p.status == status).count() as u64)
    }

    async fn missing_ids(&self, ids: &[Uuid]) -> Result<Vec<Uuid>, AppError> {
        let proposals = self.proposals.read().await;
        Ok(ids.iter().filter(|id| !proposals.contains_key(id)).copied().collect())
    }

    async fn compare_and_set_status(
        &self,
        transition: StatusTransition,
    ) -> Result<TransitionOutcome, AppError> {
        // Single write guard covers the count and the write
        let mut proposals = self.proposals.write().await;

        let current = match proposals.get(&transition.id) {
            Some(p) => p.status,
            None => return Ok(TransitionOutcome::NotFound),
        };
        if current != transition.expected {
            return Ok(TransitionOutcome::StatusChanged(current));
        }

        if let Some(capacity) = transition.capacity {
            let selected = proposals
                .values()
                .filter(|p| p.status == ProposalStatus::Selected)
                .count() as u64;
            if selected >= capacity {
                return Ok(TransitionOutcome::CapacityExceeded { selected });
            }
        }

        match proposals.get_mut(&transition.id) {
            Some(proposal) => {
                proposal.status = transition.next;
                Ok(TransitionOutcome::Applied(proposal.clone()))
            }
            None => Ok(TransitionOutcome::NotFound),
        }
    }

    async fn replace_selection(&self, ids: &[Uuid]) -> Result<u64, AppError> {
        let mut proposals = self.proposals.write().await;
        for proposal in proposals.values_mut() {
            proposal.status = ProposalStatus::Submitted;
        }

        let mut selected = 0;
        for id in ids {
            if let Some(proposal) = proposals.get_mut(id) {
                proposal.status = ProposalStatus::Selected;
                selected += 1;
            }
        }
        Ok(selected)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::proposal::{Department, Student};
    use chrono::{Duration, Utc};
    use pretty_assertions::assert_eq;

    /// Build a valid `submitted` proposal for tests
    pub(crate) fn sample_proposal(team_name: &str) -> Proposal {
        Proposal {
            id: Uuid::new_v4(),
            team_name: team_name.to_string(),
            students: Department::ALL
                .into_iter()
                .map(|department| Student {
                    name: format!("{} {}", team_name, department),
                    email: format!("{}@college.edu", department.to_string().to_lowercase()),
                    department,
                })
                .collect(),
            project_title: format!("{} project", team_name),
            project_logo: "https://cdn.example.com/logo.png".to_string(),
            team_composition: "One member per department".to_string(),
            problem_statement: "Problem".to_string(),
            tools_and_methodology: "Rust".to_string(),
            implementation_plan: "Plan".to_string(),
            project_flow_slides: "https://slides.example.com".to_string(),
            expected_results: "Results".to_string(),
            additional_details: None,
            status: ProposalStatus::Submitted,
            submitted_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicate_team() {
        let store = MemoryProposalStore::new();
        store.insert(sample_proposal("Rustaceans")).await.unwrap();

        let err = store.insert(sample_proposal("Rustaceans")).await.unwrap_err();
        assert!(matches!(err, AppError::DuplicateTeam(name) if name == "Rustaceans"));
        assert_eq!(store.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_all_newest_first() {
        let store = MemoryProposalStore::new();
        let mut older = sample_proposal("Older");
        older.submitted_at = Utc::now() - Duration::hours(2);
        let newer = sample_proposal("Newer");
        store.insert(older).await.unwrap();
        store.insert(newer).await.unwrap();

        let names: Vec<String> = store
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.team_name)
            .collect();
        assert_eq!(names, vec!["Newer".to_string(), "Older".to_string()]);
    }

    #[tokio::test]
    async fn test_compare_and_set_detects_stale_status() {
        let store = MemoryProposalStore::new();
        let proposal = store.insert(sample_proposal("Stale")).await.unwrap();

        let outcome = store
            .compare_and_set_status(StatusTransition {
                id: proposal.id,
                expected: ProposalStatus::Selected,
                next: ProposalStatus::Submitted,
                capacity: None,
            })
            .await
            .unwrap();
        assert_eq!(outcome, TransitionOutcome::StatusChanged(ProposalStatus::Submitted));
    }

    #[tokio::test]
    async fn test_compare_and_set_respects_capacity() {
        let store = MemoryProposalStore::new();
        let first = store.insert(sample_proposal("First")).await.unwrap();
        let second = store.insert(sample_proposal("Second")).await.unwrap();

        let select = |id| StatusTransition {
            id,
            expected: ProposalStatus::Submitted,
            next: ProposalStatus::Selected,
            capacity: Some(1),
        };

        assert!(matches!(
            store.compare_and_set_status(select(first.id)).await.unwrap(),
            TransitionOutcome::Applied(_)
        ));
        assert_eq!(
            store.compare_and_set_status(select(second.id)).await.unwrap(),
            TransitionOutcome::CapacityExceeded { selected: 1 }
        );
        assert_eq!(
            store.compare_and_set_status(select(Uuid::new_v4())).await.unwrap(),
            TransitionOutcome::NotFound
        );
    }

    #[tokio::test]
    async fn test_replace_selection_resets_previous_set() {
        let store = MemoryProposalStore::new();
        let a = store.insert(sample_proposal("A")).await.unwrap();
        let b = store.insert(sample_proposal("B")).await.unwrap();

        store.replace_selection(&[a.id]).await.unwrap();
        let selected = store.replace_selection(&[b.id]).await.unwrap();

        assert_eq!(selected, 1);
        assert_eq!(
            store.find_by_id(a.id).await.unwrap().unwrap().status,
            ProposalStatus::Submitted
        );
        assert_eq!(
            store.find_by_id(b.id).await.unwrap().unwrap().status,
            ProposalStatus::Selected
        );
    }
}
