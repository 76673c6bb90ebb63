use axum::{
    Json, Router,
    extract::{Path, State},
    routing::post,
};
use uuid::Uuid;

use crate::{
    dto::{
        round::RoundSnapshot,
        transfer::{RequestTransferRequest, ResolveTransferRequest, VoluntaryTransferRequest},
    },
    error::AppError,
    services::transfer_service,
    state::SharedState,
};

/// Routes handling the marker-transfer protocol.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/rounds/{id}/transfer", post(voluntary_transfer))
        .route("/rounds/{id}/transfer/request", post(request_transfer))
        .route("/rounds/{id}/transfer/approve", post(approve_transfer))
        .route("/rounds/{id}/transfer/decline", post(decline_transfer))
}

/// Hand the marker role to a co-player directly.
#[utoipa::path(
    post,
    path = "/rounds/{id}/transfer",
    tag = "transfer",
    params(("id" = Uuid, Path, description = "Round identifier")),
    request_body = VoluntaryTransferRequest,
    responses(
        (status = 200, description = "Marker handed off", body = RoundSnapshot)
    )
)]
pub async fn voluntary_transfer(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<VoluntaryTransferRequest>,
) -> Result<Json<RoundSnapshot>, AppError> {
    let snapshot = transfer_service::voluntary_transfer(&state, id, payload).await?;
    Ok(Json(snapshot))
}

/// File a marker-transfer request as a non-marker player.
#[utoipa::path(
    post,
    path = "/rounds/{id}/transfer/request",
    tag = "transfer",
    params(("id" = Uuid, Path, description = "Round identifier")),
    request_body = RequestTransferRequest,
    responses(
        (status = 200, description = "Request filed", body = RoundSnapshot),
        (status = 409, description = "A request is already pending")
    )
)]
pub async fn request_transfer(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RequestTransferRequest>,
) -> Result<Json<RoundSnapshot>, AppError> {
    let snapshot = transfer_service::request_transfer(&state, id, payload).await?;
    Ok(Json(snapshot))
}

/// Approve the pending transfer request as the marker.
#[utoipa::path(
    post,
    path = "/rounds/{id}/transfer/approve",
    tag = "transfer",
    params(("id" = Uuid, Path, description = "Round identifier")),
    request_body = ResolveTransferRequest,
    responses(
        (status = 200, description = "Request approved", body = RoundSnapshot)
    )
)]
pub async fn approve_transfer(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ResolveTransferRequest>,
) -> Result<Json<RoundSnapshot>, AppError> {
    let snapshot = transfer_service::approve_transfer(&state, id, payload).await?;
    Ok(Json(snapshot))
}

/// Decline the pending transfer request as the marker.
#[utoipa::path(
    post,
    path = "/rounds/{id}/transfer/decline",
    tag = "transfer",
    params(("id" = Uuid, Path, description = "Round identifier")),
    request_body = ResolveTransferRequest,
    responses(
        (status = 200, description = "Request declined", body = RoundSnapshot)
    )
)]
pub async fn decline_transfer(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ResolveTransferRequest>,
) -> Result<Json<RoundSnapshot>, AppError> {
    let snapshot = transfer_service::decline_transfer(&state, id, payload).await?;
    Ok(Json(snapshot))
}
