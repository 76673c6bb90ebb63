use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::{
        round::{CreateRoundRequest, RoundListItem, RoundSnapshot},
        scoring::MarkerActionRequest,
    },
    error::AppError,
    services::round_service,
    state::SharedState,
};

/// Routes handling round lifecycle operations.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/rounds", post(create_round).get(list_rounds))
        .route("/rounds/{id}", get(get_round))
        .route("/rounds/{id}/load", post(load_round))
        .route("/rounds/{id}/complete", post(complete_round))
        .route("/rounds/{id}/abandon", post(abandon_round))
}

/// Create a fresh round from the group-setup payload.
#[utoipa::path(
    post,
    path = "/rounds",
    tag = "round",
    request_body = CreateRoundRequest,
    responses(
        (status = 200, description = "Round created", body = RoundSnapshot)
    )
)]
pub async fn create_round(
    State(state): State<SharedState>,
    Json(payload): Json<CreateRoundRequest>,
) -> Result<Json<RoundSnapshot>, AppError> {
    let snapshot = round_service::create_round(&state, payload).await?;
    Ok(Json(snapshot))
}

/// List stored rounds, newest first.
#[utoipa::path(
    get,
    path = "/rounds",
    tag = "round",
    responses(
        (status = 200, description = "Stored rounds", body = [RoundListItem])
    )
)]
pub async fn list_rounds(
    State(state): State<SharedState>,
) -> Result<Json<Vec<RoundListItem>>, AppError> {
    let rounds = round_service::list_rounds(&state).await?;
    Ok(Json(rounds))
}

/// Read one round: live copy when present, stored document otherwise.
#[utoipa::path(
    get,
    path = "/rounds/{id}",
    tag = "round",
    params(("id" = Uuid, Path, description = "Round identifier")),
    responses(
        (status = 200, description = "Round snapshot", body = RoundSnapshot)
    )
)]
pub async fn get_round(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RoundSnapshot>, AppError> {
    let snapshot = round_service::get_round(&state, id).await?;
    Ok(Json(snapshot))
}

/// Load a persisted round into the live registry.
#[utoipa::path(
    post,
    path = "/rounds/{id}/load",
    tag = "round",
    params(("id" = Uuid, Path, description = "Round identifier")),
    responses(
        (status = 200, description = "Round loaded", body = RoundSnapshot)
    )
)]
pub async fn load_round(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RoundSnapshot>, AppError> {
    let snapshot = round_service::load_round(&state, id).await?;
    Ok(Json(snapshot))
}

/// Confirm the full scorecard and freeze the round.
#[utoipa::path(
    post,
    path = "/rounds/{id}/complete",
    tag = "round",
    params(("id" = Uuid, Path, description = "Round identifier")),
    request_body = MarkerActionRequest,
    responses(
        (status = 200, description = "Round completed", body = RoundSnapshot)
    )
)]
pub async fn complete_round(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<MarkerActionRequest>,
) -> Result<Json<RoundSnapshot>, AppError> {
    let snapshot = round_service::complete_round(&state, id, payload).await?;
    Ok(Json(snapshot))
}

/// Walk off the round; scores are not persisted as final.
#[utoipa::path(
    post,
    path = "/rounds/{id}/abandon",
    tag = "round",
    params(("id" = Uuid, Path, description = "Round identifier")),
    request_body = MarkerActionRequest,
    responses(
        (status = 200, description = "Round abandoned", body = RoundSnapshot)
    )
)]
pub async fn abandon_round(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<MarkerActionRequest>,
) -> Result<Json<RoundSnapshot>, AppError> {
    let snapshot = round_service::abandon_round(&state, id, payload).await?;
    Ok(Json(snapshot))
}
