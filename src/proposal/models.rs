//! Proposal data models
//!
//! Defines team proposals, their members and the review status workflow.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Proposal status in the review workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProposalStatus {
    /// Awaiting review
    Submitted,
    /// Holds one of the limited selection slots
    Selected,
    /// Turned down by a reviewer
    Rejected,
}

impl ProposalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProposalStatus::Submitted => "submitted",
            ProposalStatus::Selected => "selected",
            ProposalStatus::Rejected => "rejected",
        }
    }

    /// Status a toggle moves to: selected teams drop back to submitted,
    /// everything else tries to enter the selection.
    pub fn toggled(&self) -> ProposalStatus {
        match self {
            ProposalStatus::Selected => ProposalStatus::Submitted,
            ProposalStatus::Submitted | ProposalStatus::Rejected => ProposalStatus::Selected,
        }
    }
}

impl Default for ProposalStatus {
    fn default() -> Self {
        ProposalStatus::Submitted
    }
}

impl std::fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProposalStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "submitted" => Ok(ProposalStatus::Submitted),
            "selected" => Ok(ProposalStatus::Selected),
            "rejected" => Ok(ProposalStatus::Rejected),
            other => Err(format!("Unknown proposal status '{}'", other)),
        }
    }
}

/// Academic departments a team must span
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Department {
    ECE,
    CSE,
    RAE,
}

impl Department {
    pub const ALL: [Department; 3] = [Department::ECE, Department::CSE, Department::RAE];
}

impl std::fmt::Display for Department {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Department::ECE => "ECE",
            Department::CSE => "CSE",
            Department::RAE => "RAE",
        };
        f.write_str(name)
    }
}

/// A team member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Student {
    #[validate(length(min = 1, message = "Student name is required"))]
    pub name: String,
    #[validate(email(message = "Student email must be a valid email address"))]
    pub email: String,
    pub department: Department,
}

/// A team's hackathon submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proposal {
    pub id: Uuid,
    pub team_name: String,
    pub students: Vec<Student>,
    pub project_title: String,
    pub project_logo: String,
    pub team_composition: String,
    pub problem_statement: String,
    pub tools_and_methodology: String,
    pub implementation_plan: String,
    pub project_flow_slides: String,
    pub expected_results: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_details: Option<String>,
    pub status: ProposalStatus,
    pub submitted_at: DateTime<Utc>,
}

impl Proposal {
    /// Build a fresh `submitted` proposal from a validated candidate
    pub fn from_candidate(candidate: ProposalCandidate) -> Self {
        Self {
            id: Uuid::new_v4(),
            team_name: candidate.team_name,
            students: candidate.students,
            project_title: candidate.project_title,
            project_logo: candidate.project_logo,
            team_composition: candidate.team_composition,
            problem_statement: candidate.problem_statement,
            tools_and_methodology: candidate.tools_and_methodology,
            implementation_plan: candidate.implementation_plan,
            project_flow_slides: candidate.project_flow_slides,
            expected_results: candidate.expected_results,
            additional_details: candidate.additional_details.filter(|d| !d.trim().is_empty()),
            status: ProposalStatus::Submitted,
            submitted_at: Utc::now(),
        }
    }
}

/// Submission payload for a new proposal
///
/// Missing fields deserialize as empty so that field validation reports them.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct ProposalCandidate {
    #[validate(length(min = 1, message = "Team name is required"))]
    pub team_name: String,
    #[validate(nested)]
    pub students: Vec<Student>,
    #[validate(length(min = 1, message = "Project title is required"))]
    pub project_title: String,
    #[validate(length(min = 1, message = "Project logo is required"))]
    pub project_logo: String,
    #[validate(length(min = 1, message = "Team composition is required"))]
    pub team_composition: String,
    #[validate(length(min = 1, message = "Problem statement is required"))]
    pub problem_statement: String,
    #[validate(length(min = 1, message = "Tools and methodology is required"))]
    pub tools_and_methodology: String,
    #[validate(length(min = 1, message = "Implementation plan is required"))]
    pub implementation_plan: String,
    #[validate(length(min = 1, message = "Project flow slides are required"))]
    pub project_flow_slides: String,
    #[validate(length(min = 1, message = "Expected results are required"))]
    pub expected_results: String,
    pub additional_details: Option<String>,
}

/// Departments absent from a team, in canonical order
pub fn missing_departments(students: &[Student]) -> Vec<Department> {
    Department::ALL
        .into_iter()
        .filter(|dept| !students.iter().any(|s| s.department == *dept))
        .collect()
}

/// Public projection of a selected team
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedTeam {
    pub id: Uuid,
    pub team_name: String,
    pub project_title: String,
    pub project_logo: String,
    pub students: Vec<Student>,
}

impl From<Proposal> for SelectedTeam {
    fn from(p: Proposal) -> Self {
        Self {
            id: p.id,
            team_name: p.team_name,
            project_title: p.project_title,
            project_logo: p.project_logo,
            students: p.students,
        }
    }
}
