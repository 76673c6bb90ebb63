use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::round::LeaderboardResponse, error::AppError, services::spectator_service,
    state::SharedState,
};

/// Read-only projections for observers.
pub fn router() -> Router<SharedState> {
    Router::new().route("/rounds/{id}/leaderboard", get(leaderboard))
}

/// Rank the round's players by its scoring format.
#[utoipa::path(
    get,
    path = "/rounds/{id}/leaderboard",
    tag = "spectator",
    params(("id" = Uuid, Path, description = "Round identifier")),
    responses(
        (status = 200, description = "Ranked live scores", body = LeaderboardResponse)
    )
)]
pub async fn leaderboard(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<LeaderboardResponse>, AppError> {
    let board = spectator_service::get_leaderboard(&state, id).await?;
    Ok(Json(board))
}
