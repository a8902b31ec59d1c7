//! Admin route handlers
//!
//! Every admin request carries the shared secret as `password` in its JSON
//! body. `AdminJson` checks it before the payload or the path id is parsed.
//! Status changes are delegated to the selection engine.

use crate::announcement::{Announcement, NewAnnouncement};
use crate::auth::{AdminJson, AdminOnly};
use crate::error::{validation_error, ApiResult, AppError};
use crate::models::SuccessResponse;
use crate::proposal::{Proposal, ProposalStatus};
use crate::settings::Settings;
use crate::state::SharedState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::WithRejection;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

// ============================================
// Request/Response Types
// ============================================

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: ProposalStatus,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSelectRequest {
    #[serde(default)]
    pub team_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeadlineRequest {
    pub deadline: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct ToggledProposal {
    pub proposal: Proposal,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSelectResult {
    pub modified_count: u64,
}

#[derive(Serialize)]
pub struct CountResponse {
    pub count: u64,
}

// ============================================
// Route Handlers
// ============================================

/// POST /api/admin/proposals
///
/// All proposals, newest submission first.
pub async fn list_proposals(
    State(state): State<SharedState>,
    _: AdminOnly,
) -> ApiResult<Json<Vec<Proposal>>> {
    let proposals = state.selection.list_proposals().await?;
    debug!("Found {} proposals", proposals.len());
    Ok(Json(proposals))
}

/// POST /api/admin/proposals/{id}/status
pub async fn set_status(
    State(state): State<SharedState>,
    WithRejection(Path(id), _): WithRejection<Path<String>, AppError>,
    AdminJson(req): AdminJson<StatusRequest>,
) -> ApiResult<Json<Proposal>> {
    let id = parse_proposal_id(&id)?;
    let proposal = state.selection.set_status(id, req.status).await?;
    Ok(Json(proposal))
}

/// POST /api/admin/toggle-selection/{id}
pub async fn toggle_selection(
    State(state): State<SharedState>,
    WithRejection(Path(id), _): WithRejection<Path<String>, AppError>,
    _: AdminOnly,
) -> ApiResult<Json<SuccessResponse<ToggledProposal>>> {
    let id = parse_proposal_id(&id)?;
    let proposal = state.selection.toggle_selection(id).await?;
    let verb = if proposal.status == ProposalStatus::Selected {
        "selected"
    } else {
        "deselected"
    };

    Ok(Json(SuccessResponse::with_data(
        format!("Team {} successfully", verb),
        ToggledProposal { proposal },
    )))
}

/// POST /api/admin/select-teams
pub async fn select_teams(
    State(state): State<SharedState>,
    AdminJson(req): AdminJson<BatchSelectRequest>,
) -> ApiResult<Json<SuccessResponse<BatchSelectResult>>> {
    let result = state.selection.batch_select(&req.team_ids).await?;
    Ok(Json(SuccessResponse::with_data(
        "Teams selected successfully",
        BatchSelectResult {
            modified_count: result.modified_count,
        },
    )))
}

/// POST /api/admin/selected-count
pub async fn selected_count(
    State(state): State<SharedState>,
    _: AdminOnly,
) -> ApiResult<Json<CountResponse>> {
    let count = state.selection.selected_count().await?;
    Ok(Json(CountResponse { count }))
}

/// POST /api/admin/announcements
pub async fn create_announcement(
    State(state): State<SharedState>,
    AdminJson(announcement): AdminJson<NewAnnouncement>,
) -> ApiResult<(StatusCode, Json<Announcement>)> {
    let announcement = state.announcements.create(announcement).await?;
    Ok((StatusCode::CREATED, Json(announcement)))
}

/// POST /api/admin/deadline
pub async fn set_deadline(
    State(state): State<SharedState>,
    AdminJson(req): AdminJson<DeadlineRequest>,
) -> ApiResult<Json<Settings>> {
    let settings = state.settings.upsert_deadline(req.deadline).await?;
    info!("Deadline updated to {}", settings.submission_deadline);
    Ok(Json(settings))
}

/// GET /api/admin/settings
///
/// Responds with `null` until a deadline has been set.
pub async fn get_settings(State(state): State<SharedState>) -> ApiResult<Json<Option<Settings>>> {
    Ok(Json(state.settings.get_settings().await?))
}

fn parse_proposal_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim()).map_err(|_| validation_error(format!("Invalid proposal ID '{}'", raw)))
}
