//! Team selection engine
//!
//! Owns every post-submission status change. Transitions into `selected`
//! go through the repository's guarded write, so concurrent requests can
//! never push the selected count past [`MAX_SELECTED_TEAMS`].

use crate::error::{not_found_error, validation_error, AppError};
use crate::proposal::store::{ProposalRepository, StatusTransition, TransitionOutcome};
use crate::proposal::{Proposal, ProposalStatus, SelectedTeam};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Hard cap on simultaneously selected teams
pub const MAX_SELECTED_TEAMS: usize = 15;

/// Attempts before a contended transition gives up
const MAX_TRANSITION_ATTEMPTS: usize = 5;

/// Result of a batch replacement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSelection {
    pub modified_count: u64,
}

#[derive(Clone)]
pub struct SelectionEngine {
    proposals: Arc<dyn ProposalRepository>,
}

impl SelectionEngine {
    pub fn new(proposals: Arc<dyn ProposalRepository>) -> Self {
        Self { proposals }
    }

    /// Number of proposals currently holding `selected`
    pub async fn selected_count(&self) -> Result<u64, AppError> {
        self.proposals.count_by_status(ProposalStatus::Selected).await
    }

    /// Review queue: every proposal, newest submission first
    pub async fn list_proposals(&self) -> Result<Vec<Proposal>, AppError> {
        self.proposals.list_all().await
    }

    /// Public list of selected teams, never more than the cap
    pub async fn selected_teams(&self) -> Result<Vec<SelectedTeam>, AppError> {
        let selected = self
            .proposals
            .list_by_status(ProposalStatus::Selected, MAX_SELECTED_TEAMS)
            .await?;
        Ok(selected.into_iter().map(SelectedTeam::from).collect())
    }

    /// Administrative status override.
    ///
    /// Entering `selected` from another status is capacity-checked like a
    /// toggle; re-applying the current status is a no-op.
    pub async fn set_status(&self, id: Uuid, status: ProposalStatus) -> Result<Proposal, AppError> {
        self.transition(id, "set_status", |_| status).await
    }

    /// Flip a proposal between `selected` and `submitted`.
    ///
    /// A rejected proposal toggles into `selected` when a slot is free.
    pub async fn toggle_selection(&self, id: Uuid) -> Result<Proposal, AppError> {
        self.transition(id, "toggle_selection", |current| current.toggled()).await
    }

    /// Replace the whole selected set with exactly `team_ids`.
    ///
    /// Ids must be exactly [`MAX_SELECTED_TEAMS`] distinct, existing
    /// proposals; nothing is written otherwise.
    pub async fn batch_select(&self, team_ids: &[String]) -> Result<BatchSelection, AppError> {
        if team_ids.len() != MAX_SELECTED_TEAMS {
            return Err(validation_error(format!(
                "Exactly {} team IDs required, got {}",
                MAX_SELECTED_TEAMS,
                team_ids.len()
            )));
        }

        let ids = parse_ids(team_ids)?;

        let unique: HashSet<Uuid> = ids.iter().copied().collect();
        if unique.len() != ids.len() {
            return Err(validation_error("Team IDs must be unique"));
        }

        let missing = self.proposals.missing_ids(&ids).await?;
        if !missing.is_empty() {
            let listed: Vec<String> = missing.iter().map(Uuid::to_string).collect();
            return Err(validation_error(format!(
                "Unknown team IDs: {}",
                listed.join(", ")
            )));
        }

        let modified_count = self.proposals.replace_selection(&ids).await?;
        info!(
            target: "selection",
            operation = "batch_select",
            requested = ids.len(),
            selected = modified_count,
            "selected set replaced"
        );

        Ok(BatchSelection { modified_count })
    }

    /// Read the proposal, compute the target status and apply it with a
    /// guarded write, retrying when another writer got there first.
    async fn transition<F>(
        &self,
        id: Uuid,
        operation: &'static str,
        target: F,
    ) -> Result<Proposal, AppError>
    where
        F: Fn(ProposalStatus) -> ProposalStatus + Send + Sync,
    {
        for attempt in 1..=MAX_TRANSITION_ATTEMPTS {
            let proposal = self
                .proposals
                .find_by_id(id)
                .await?
                .ok_or_else(|| not_found_error("Proposal not found"))?;

            let previous = proposal.status;
            let next = target(previous);
            if next == previous {
                debug!(target: "selection", %id, operation, status = %previous, "status unchanged");
                return Ok(proposal);
            }

            let capacity = (next == ProposalStatus::Selected).then_some(MAX_SELECTED_TEAMS as u64);
            let outcome = self
                .proposals
                .compare_and_set_status(StatusTransition {
                    id,
                    expected: previous,
                    next,
                    capacity,
                })
                .await?;

            match outcome {
                TransitionOutcome::Applied(updated) => {
                    // Already committed; a failed count only loses the log field
                    let selected = self.selected_count().await.ok();
                    info!(
                        target: "selection",
                        %id,
                        operation,
                        from = %previous,
                        to = %next,
                        selected = ?selected,
                        "proposal status changed"
                    );
                    return Ok(updated);
                }
                TransitionOutcome::NotFound => {
                    return Err(not_found_error("Proposal not found"));
                }
                TransitionOutcome::CapacityExceeded { selected } => {
                    warn!(
                        target: "selection",
                        %id,
                        operation,
                        selected,
                        "selection rejected, capacity reached"
                    );
                    return Err(AppError::CapacityExceeded {
                        selected,
                        capacity: MAX_SELECTED_TEAMS as u64,
                    });
                }
                TransitionOutcome::StatusChanged(current) => {
                    debug!(
                        target: "selection",
                        %id,
                        operation,
                        attempt,
                        expected = %previous,
                        found = %current,
                        "concurrent status change, retrying"
                    );
                }
            }
        }

        Err(AppError::Storage(format!(
            "Proposal {} kept changing; gave up after {} attempts",
            id, MAX_TRANSITION_ATTEMPTS
        )))
    }
}

fn parse_ids(raw: &[String]) -> Result<Vec<Uuid>, AppError> {
    raw.iter()
        .map(|s| {
            Uuid::parse_str(s.trim())
                .map_err(|_| validation_error(format!("Invalid team ID '{}'", s)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proposal::store::tests::sample_proposal;
    use crate::proposal::MemoryProposalStore;
    use pretty_assertions::assert_eq;
    use tokio_test::assert_ok;

    async fn seeded(count: usize) -> (SelectionEngine, Arc<MemoryProposalStore>, Vec<Proposal>) {
        let store = Arc::new(MemoryProposalStore::new());
        let mut proposals = Vec::with_capacity(count);
        for i in 0..count {
            proposals.push(store.insert(sample_proposal(&format!("Team {}", i))).await.unwrap());
        }
        (SelectionEngine::new(store.clone()), store, proposals)
    }

    fn ids(proposals: &[Proposal]) -> Vec<String> {
        proposals.iter().map(|p| p.id.to_string()).collect()
    }

    #[tokio::test]
    async fn test_toggle_fills_last_slot_then_rejects() {
        let (engine, _, proposals) = seeded(16).await;
        for p in &proposals[..14] {
            engine.toggle_selection(p.id).await.unwrap();
        }
        assert_eq!(engine.selected_count().await.unwrap(), 14);

        let fifteenth = engine.toggle_selection(proposals[14].id).await.unwrap();
        assert_eq!(fifteenth.status, ProposalStatus::Selected);
        assert_eq!(engine.selected_count().await.unwrap(), 15);

        let err = engine.toggle_selection(proposals[15].id).await.unwrap_err();
        assert!(matches!(err, AppError::CapacityExceeded { selected: 15, capacity: 15 }));
        assert_eq!(engine.selected_count().await.unwrap(), 15);
    }

    #[tokio::test]
    async fn test_toggle_selected_back_to_submitted() {
        let (engine, _, proposals) = seeded(3).await;
        for p in &proposals {
            engine.toggle_selection(p.id).await.unwrap();
        }
        assert_eq!(engine.selected_count().await.unwrap(), 3);

        let toggled = engine.toggle_selection(proposals[1].id).await.unwrap();
        assert_eq!(toggled.status, ProposalStatus::Submitted);
        assert_eq!(engine.selected_count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_toggle_rejected_enters_selection() {
        let (engine, _, proposals) = seeded(1).await;
        engine.set_status(proposals[0].id, ProposalStatus::Rejected).await.unwrap();

        let toggled = engine.toggle_selection(proposals[0].id).await.unwrap();
        assert_eq!(toggled.status, ProposalStatus::Selected);
    }

    /// Delegates to a memory store but cannot count
    struct UncountableStore {
        inner: MemoryProposalStore,
    }

    #[async_trait::async_trait]
    impl ProposalRepository for UncountableStore {
        async fn insert(&self, proposal: Proposal) -> Result<Proposal, AppError> {
            self.inner.insert(proposal).await
        }

        async fn find_by_id(&self, id: Uuid) -> Result<Option<Proposal>, AppError> {
            self.inner.find_by_id(id).await
        }

        async fn find_by_team_name(&self, team_name: &str) -> Result<Option<Proposal>, AppError> {
            self.inner.find_by_team_name(team_name).await
        }

        async fn list_all(&self) -> Result<Vec<Proposal>, AppError> {
            self.inner.list_all().await
        }

        async fn list_by_status(
            &self,
            status: ProposalStatus,
            limit: usize,
        ) -> Result<Vec<Proposal>, AppError> {
            self.inner.list_by_status(status, limit).await
        }

        async fn count_by_status(&self, _status: ProposalStatus) -> Result<u64, AppError> {
            Err(AppError::Storage("connection reset".to_string()))
        }

        async fn missing_ids(&self, ids: &[Uuid]) -> Result<Vec<Uuid>, AppError> {
            self.inner.missing_ids(ids).await
        }

        async fn compare_and_set_status(
            &self,
            transition: StatusTransition,
        ) -> Result<TransitionOutcome, AppError> {
            self.inner.compare_and_set_status(transition).await
        }

        async fn replace_selection(&self, ids: &[Uuid]) -> Result<u64, AppError> {
            self.inner.replace_selection(ids).await
        }
    }

    #[tokio::test]
    async fn test_applied_transition_reports_success_when_count_fails() {
        let store = Arc::new(UncountableStore {
            inner: MemoryProposalStore::new(),
        });
        let proposal = store.insert(sample_proposal("Resilient")).await.unwrap();
        let engine = SelectionEngine::new(store.clone());

        let toggled = engine.toggle_selection(proposal.id).await.unwrap();
        assert_eq!(toggled.status, ProposalStatus::Selected);

        let stored = store.find_by_id(proposal.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ProposalStatus::Selected);

        let rejected = engine.set_status(proposal.id, ProposalStatus::Rejected).await.unwrap();
        assert_eq!(rejected.status, ProposalStatus::Rejected);
    }

    #[tokio::test]
    async fn test_toggle_unknown_proposal() {
        let (engine, _, _) = seeded(0).await;
        let err = engine.toggle_selection(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrent_toggles_never_exceed_capacity() {
        let (engine, _, proposals) = seeded(40).await;

        let handles: Vec<_> = proposals
            .iter()
            .map(|p| {
                let engine = engine.clone();
                let id = p.id;
                tokio::spawn(async move { engine.toggle_selection(id).await })
            })
            .collect();

        let mut succeeded = 0;
        let mut rejected = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => succeeded += 1,
                Err(AppError::CapacityExceeded { .. }) => rejected += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        assert_eq!(succeeded, MAX_SELECTED_TEAMS);
        assert_eq!(rejected, 40 - MAX_SELECTED_TEAMS);
        assert_eq!(engine.selected_count().await.unwrap(), MAX_SELECTED_TEAMS as u64);
    }

    #[tokio::test]
    async fn test_set_status_guards_capacity() {
        let (engine, _, proposals) = seeded(16).await;
        assert_ok!(engine.batch_select(&ids(&proposals[..15])).await);

        let err = engine
            .set_status(proposals[15].id, ProposalStatus::Selected)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::CapacityExceeded { .. }));

        // Re-applying the current status is allowed at capacity
        let same = engine.set_status(proposals[0].id, ProposalStatus::Selected).await.unwrap();
        assert_eq!(same.status, ProposalStatus::Selected);

        let rejected = engine.set_status(proposals[0].id, ProposalStatus::Rejected).await.unwrap();
        assert_eq!(rejected.status, ProposalStatus::Rejected);
        assert_eq!(engine.selected_count().await.unwrap(), 14);
    }

    #[tokio::test]
    async fn test_batch_select_replaces_selected_set() {
        let (engine, store, proposals) = seeded(20).await;
        for p in &proposals[15..] {
            engine.toggle_selection(p.id).await.unwrap();
        }

        let result = engine.batch_select(&ids(&proposals[..15])).await.unwrap();
        assert_eq!(result, BatchSelection { modified_count: 15 });
        assert_eq!(engine.selected_count().await.unwrap(), 15);

        for (i, p) in proposals.iter().enumerate() {
            let status = store.find_by_id(p.id).await.unwrap().unwrap().status;
            let expected = if i < 15 { ProposalStatus::Selected } else { ProposalStatus::Submitted };
            assert_eq!(status, expected, "proposal {}", i);
        }
    }

    #[tokio::test]
    async fn test_batch_select_wrong_length_leaves_store_unchanged() {
        let (engine, store, proposals) = seeded(16).await;
        engine.toggle_selection(proposals[15].id).await.unwrap();
        let before = store.list_all().await.unwrap();

        for count in [0, 14, 16] {
            let err = engine.batch_select(&ids(&proposals[..count])).await.unwrap_err();
            assert!(matches!(err, AppError::Validation(_)), "count {}", count);
        }

        assert_eq!(store.list_all().await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_batch_select_rejects_duplicates_and_unknown_ids() {
        let (engine, _, proposals) = seeded(15).await;

        let mut duplicated = ids(&proposals);
        duplicated[14] = duplicated[0].clone();
        let err = engine.batch_select(&duplicated).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg.contains("unique")));

        let mut unknown = ids(&proposals);
        unknown[3] = Uuid::new_v4().to_string();
        let err = engine.batch_select(&unknown).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg.contains("Unknown")));

        let mut garbage = ids(&proposals);
        garbage[0] = "not-an-id".to_string();
        let err = engine.batch_select(&garbage).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg.contains("not-an-id")));

        assert_eq!(engine.selected_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_selected_teams_only_lists_selected() {
        let (engine, _, proposals) = seeded(18).await;
        engine.batch_select(&ids(&proposals[..15])).await.unwrap();
        engine.set_status(proposals[16].id, ProposalStatus::Rejected).await.unwrap();

        let teams = engine.selected_teams().await.unwrap();
        assert_eq!(teams.len(), 15);
        let selected_ids: HashSet<Uuid> = proposals[..15].iter().map(|p| p.id).collect();
        assert!(teams.iter().all(|t| selected_ids.contains(&t.id)));
    }
}
