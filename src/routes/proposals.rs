//! Public proposal route handlers
//!
//! Submission and submission-status lookup for teams.

use crate::error::{ApiResult, AppError};
use crate::models::SuccessResponse;
use crate::proposal::Proposal;
use crate::state::SharedState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::WithRejection;
use serde::Serialize;
use tracing::debug;

#[derive(Serialize)]
pub struct SubmittedProposal {
    pub proposal: Proposal,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckResponse {
    pub submitted: bool,
    pub proposal: Option<Proposal>,
}

/// POST /api/proposals/submit
pub async fn submit_proposal(
    State(state): State<SharedState>,
    WithRejection(Json(body), _): WithRejection<Json<serde_json::Value>, AppError>,
) -> ApiResult<(StatusCode, Json<SuccessResponse<SubmittedProposal>>)> {
    debug!(team = ?body.get("teamName"), "Submitting proposal");

    let proposal = state.submissions.submit(body).await?;

    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse::with_data(
            "Proposal submitted successfully",
            SubmittedProposal { proposal },
        )),
    ))
}

/// GET /api/proposals/check/{team_name}
pub async fn check_submitted(
    State(state): State<SharedState>,
    WithRejection(Path(team_name), _): WithRejection<Path<String>, AppError>,
) -> ApiResult<Json<CheckResponse>> {
    let check = state.submissions.check_submitted(&team_name).await?;
    Ok(Json(CheckResponse {
        submitted: check.submitted,
        proposal: check.proposal,
    }))
}
