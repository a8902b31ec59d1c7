//! Public announcement listing

use crate::announcement::Announcement;
use crate::error::ApiResult;
use crate::state::SharedState;
use axum::{extract::State, Json};

/// GET /api/announcements
pub async fn list_announcements(
    State(state): State<SharedState>,
) -> ApiResult<Json<Vec<Announcement>>> {
    Ok(Json(state.announcements.list().await?))
}
