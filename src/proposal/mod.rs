//! Proposal module - team submissions and the selection workflow
//!
//! Handles proposal submission, storage and the capped team selection.

mod models;
pub mod selection;
pub mod store;
mod submission;

pub use models::*;
pub use selection::SelectionEngine;
pub use store::{MemoryProposalStore, ProposalRepository};
pub use submission::SubmissionValidator;
