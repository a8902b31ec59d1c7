//! Public team listing

use crate::error::ApiResult;
use crate::proposal::SelectedTeam;
use crate::state::SharedState;
use axum::{extract::State, Json};

/// GET /api/teams/selected
pub async fn selected_teams(State(state): State<SharedState>) -> ApiResult<Json<Vec<SelectedTeam>>> {
    Ok(Json(state.selection.selected_teams().await?))
}
