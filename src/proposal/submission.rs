//! Proposal submission
//!
//! Checks run in a fixed order so the reported error always names the first
//! precondition that failed: deadline, duplicate team, team composition,
//! then field validation. The body stays untyped until the first three
//! have passed, so a malformed payload cannot mask a closed deadline or a
//! duplicate team.

use crate::error::{validation_error, AppError};
use crate::proposal::store::ProposalRepository;
use crate::proposal::{missing_departments, Proposal, ProposalCandidate, Student};
use crate::settings::SettingsAccessor;
use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};
use validator::Validate;

/// Result of a team-name lookup
#[derive(Debug, Clone)]
pub struct SubmissionCheck {
    pub submitted: bool,
    pub proposal: Option<Proposal>,
}

#[derive(Clone)]
pub struct SubmissionValidator {
    proposals: Arc<dyn ProposalRepository>,
    settings: SettingsAccessor,
}

impl SubmissionValidator {
    pub fn new(proposals: Arc<dyn ProposalRepository>, settings: SettingsAccessor) -> Self {
        Self { proposals, settings }
    }

    /// Validate and store a raw submission body
    pub async fn submit(&self, body: Value) -> Result<Proposal, AppError> {
        let team_name = body
            .get("teamName")
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty());

        if let Some(settings) = self.settings.get_settings().await? {
            if settings.deadline_passed(Utc::now()) {
                debug!(team = team_name.unwrap_or_default(), "submission after deadline");
                return Err(AppError::DeadlinePassed);
            }
        }

        if let Some(team_name) = team_name {
            if self.proposals.find_by_team_name(team_name).await?.is_some() {
                return Err(AppError::DuplicateTeam(team_name.to_string()));
            }
        }

        let students = parse_students(body.get("students"))?;
        let missing = missing_departments(&students);
        if !missing.is_empty() {
            let names: Vec<String> = missing.iter().map(ToString::to_string).collect();
            return Err(validation_error(format!(
                "Team must include members from ECE, CSE, and RAE departments (missing: {})",
                names.join(", ")
            )));
        }

        let candidate: ProposalCandidate = serde_json::from_value(body)
            .map_err(|e| validation_error(format!("Invalid proposal: {}", e)))?;
        candidate.validate()?;

        // The store enforces uniqueness again for racing submissions
        let proposal = self
            .proposals
            .insert(Proposal::from_candidate(candidate))
            .await?;

        info!(id = %proposal.id, team = %proposal.team_name, "proposal submitted");
        Ok(proposal)
    }

    pub async fn check_submitted(&self, team_name: &str) -> Result<SubmissionCheck, AppError> {
        let proposal = self.proposals.find_by_team_name(team_name).await?;
        Ok(SubmissionCheck {
            submitted: proposal.is_some(),
            proposal,
        })
    }
}

/// The students list must be a non-empty array of well-formed members
fn parse_students(raw: Option<&Value>) -> Result<Vec<Student>, AppError> {
    let entries = match raw {
        Some(Value::Array(entries)) if !entries.is_empty() => entries,
        _ => return Err(validation_error("Students list is required")),
    };

    entries
        .iter()
        .map(|entry| {
            Student::deserialize(entry)
                .map_err(|e| validation_error(format!("Invalid student entry: {}", e)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proposal::{Department, MemoryProposalStore, ProposalStatus};
    use crate::settings::MemorySettingsStore;
    use chrono::Duration;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn setup() -> (SubmissionValidator, Arc<MemoryProposalStore>, SettingsAccessor) {
        let store = Arc::new(MemoryProposalStore::new());
        let settings = SettingsAccessor::new(Arc::new(MemorySettingsStore::new()));
        (
            SubmissionValidator::new(store.clone(), settings.clone()),
            store,
            settings,
        )
    }

    fn candidate(team_name: &str, departments: &[Department]) -> Value {
        let students: Vec<Value> = departments
            .iter()
            .enumerate()
            .map(|(i, d)| {
                json!({
                    "name": format!("Member {}", i),
                    "email": format!("member{}@college.edu", i),
                    "department": d.to_string(),
                })
            })
            .collect();

        json!({
            "teamName": team_name,
            "students": students,
            "projectTitle": "Smart Grid",
            "projectLogo": "https://cdn.example.com/grid.png",
            "teamComposition": "Mixed",
            "problemStatement": "Energy waste",
            "toolsAndMethodology": "Rust, sensors",
            "implementationPlan": "Three phases",
            "projectFlowSlides": "https://slides.example.com/grid",
            "expectedResults": "20% savings",
            "additionalDetails": "  "
        })
    }

    #[tokio::test]
    async fn test_submit_creates_submitted_proposal() {
        let (validator, _, _) = setup();
        let proposal = validator.submit(candidate("Grid", &Department::ALL)).await.unwrap();

        assert_eq!(proposal.status, ProposalStatus::Submitted);
        assert_eq!(proposal.students.len(), 3);
        assert_eq!(proposal.additional_details, None);
        assert!(proposal.submitted_at <= Utc::now());
    }

    #[tokio::test]
    async fn test_duplicate_team_keeps_single_proposal() {
        let (validator, store, _) = setup();
        validator.submit(candidate("Grid", &Department::ALL)).await.unwrap();

        let err = validator.submit(candidate("Grid", &Department::ALL)).await.unwrap_err();
        assert!(matches!(err, AppError::DuplicateTeam(_)));
        assert_eq!(store.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_department_rejected() {
        let (validator, store, _) = setup();
        let err = validator
            .submit(candidate("Halfway", &[Department::ECE, Department::CSE]))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(msg) if msg.contains("RAE")));
        assert!(store.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_or_malformed_students_rejected() {
        let (validator, _, _) = setup();
        for students in [Value::Null, json!([]), json!("not-a-list"), json!({ "name": "A" })] {
            let mut c = candidate("Ghosts", &Department::ALL);
            c["students"] = students.clone();
            let err = validator.submit(c).await.unwrap_err();
            assert!(
                matches!(&err, AppError::Validation(msg) if msg == "Students list is required"),
                "students {}: {}",
                students,
                err
            );
        }

        let mut c = candidate("Ghosts", &Department::ALL);
        c["students"][0]["department"] = json!("MECH");
        let err = validator.submit(c).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg.starts_with("Invalid student entry")));
    }

    #[tokio::test]
    async fn test_submit_after_deadline() {
        let (validator, _, settings) = setup();
        settings.upsert_deadline(Utc::now() - Duration::minutes(1)).await.unwrap();

        let err = validator.submit(candidate("Late", &Department::ALL)).await.unwrap_err();
        assert!(matches!(err, AppError::DeadlinePassed));
    }

    #[tokio::test]
    async fn test_submit_before_deadline() {
        let (validator, _, settings) = setup();
        settings.upsert_deadline(Utc::now() + Duration::days(1)).await.unwrap();
        assert!(validator.submit(candidate("Early", &Department::ALL)).await.is_ok());
    }

    #[tokio::test]
    async fn test_checks_run_in_order() {
        let (validator, _, settings) = setup();
        validator.submit(candidate("Grid", &Department::ALL)).await.unwrap();

        // Duplicate team with bad composition reports the duplicate
        let err = validator.submit(candidate("Grid", &[Department::ECE])).await.unwrap_err();
        assert!(matches!(err, AppError::DuplicateTeam(_)));

        // Duplicate team with a students value that is not a list
        let mut c = candidate("Grid", &Department::ALL);
        c["students"] = json!("not-a-list");
        assert!(matches!(validator.submit(c).await, Err(AppError::DuplicateTeam(_))));

        // Once closed, the deadline wins over everything else
        settings.upsert_deadline(Utc::now() - Duration::seconds(5)).await.unwrap();
        let err = validator.submit(candidate("Grid", &[Department::ECE])).await.unwrap_err();
        assert!(matches!(err, AppError::DeadlinePassed));

        let mut c = candidate("Fresh", &Department::ALL);
        c["students"] = json!("not-a-list");
        c["projectTitle"] = json!(42);
        assert!(matches!(validator.submit(c).await, Err(AppError::DeadlinePassed)));
    }

    #[tokio::test]
    async fn test_field_validation_after_composition() {
        let (validator, _, _) = setup();
        let mut c = candidate("Blank", &Department::ALL);
        c["projectTitle"] = json!("");
        let err = validator.submit(c).await.unwrap_err();
        match err {
            AppError::Validation(msg) => assert!(msg.contains("Project title is required")),
            other => panic!("unexpected error: {other}"),
        }

        let mut c = candidate("Untitled", &Department::ALL);
        if let Some(body) = c.as_object_mut() {
            body.remove("projectTitle");
        }
        let err = validator.submit(c).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg.contains("Project title is required")));

        let mut c = candidate("Typo", &Department::ALL);
        c["students"][0]["email"] = json!("not-an-email");
        assert!(matches!(validator.submit(c).await, Err(AppError::Validation(_))));
        assert!(!validator.check_submitted("Typo").await.unwrap().submitted);
    }

    #[tokio::test]
    async fn test_check_submitted() {
        let (validator, _, _) = setup();
        let before = validator.check_submitted("Grid").await.unwrap();
        assert!(!before.submitted);
        assert!(before.proposal.is_none());

        validator.submit(candidate("Grid", &Department::ALL)).await.unwrap();
        let after = validator.check_submitted("Grid").await.unwrap();
        assert!(after.submitted);
        assert_eq!(after.proposal.unwrap().team_name, "Grid");
    }
}
