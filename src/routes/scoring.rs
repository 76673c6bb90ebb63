use axum::{
    Json, Router,
    extract::{Path, State},
    routing::post,
};
use uuid::Uuid;

use crate::{
    dto::{
        round::RoundSnapshot,
        scoring::{MarkerActionRequest, RecordHoleStatsRequest, RecordStrokeRequest},
    },
    error::AppError,
    services::scoring_service,
    state::SharedState,
};

/// Routes handling marker-side score and stat entry.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/rounds/{id}/strokes", post(record_stroke))
        .route("/rounds/{id}/holes/{hole}/stats", post(record_hole_stats))
        .route(
            "/rounds/{id}/holes/{hole}/stats/skip",
            post(skip_hole_stats),
        )
        .route("/rounds/{id}/stats/enable", post(enable_stat_prompts))
}

/// Record or correct a stroke count for one player on one hole.
#[utoipa::path(
    post,
    path = "/rounds/{id}/strokes",
    tag = "scoring",
    params(("id" = Uuid, Path, description = "Round identifier")),
    request_body = RecordStrokeRequest,
    responses(
        (status = 200, description = "Stroke recorded", body = RoundSnapshot)
    )
)]
pub async fn record_stroke(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RecordStrokeRequest>,
) -> Result<Json<RoundSnapshot>, AppError> {
    let snapshot = scoring_service::record_stroke(&state, id, payload).await?;
    Ok(Json(snapshot))
}

/// Submit stat collection for the hole the round is paused on.
#[utoipa::path(
    post,
    path = "/rounds/{id}/holes/{hole}/stats",
    tag = "scoring",
    params(
        ("id" = Uuid, Path, description = "Round identifier"),
        ("hole" = u8, Path, description = "Actual hole number")
    ),
    request_body = RecordHoleStatsRequest,
    responses(
        (status = 200, description = "Stats recorded and hole advanced", body = RoundSnapshot)
    )
)]
pub async fn record_hole_stats(
    State(state): State<SharedState>,
    Path((id, hole)): Path<(Uuid, u8)>,
    Json(payload): Json<RecordHoleStatsRequest>,
) -> Result<Json<RoundSnapshot>, AppError> {
    let snapshot = scoring_service::record_hole_stats(&state, id, hole, payload).await?;
    Ok(Json(snapshot))
}

/// Skip stat collection for the hole the round is paused on.
#[utoipa::path(
    post,
    path = "/rounds/{id}/holes/{hole}/stats/skip",
    tag = "scoring",
    params(
        ("id" = Uuid, Path, description = "Round identifier"),
        ("hole" = u8, Path, description = "Actual hole number")
    ),
    request_body = MarkerActionRequest,
    responses(
        (status = 200, description = "Stats skipped and hole advanced", body = RoundSnapshot)
    )
)]
pub async fn skip_hole_stats(
    State(state): State<SharedState>,
    Path((id, hole)): Path<(Uuid, u8)>,
    Json(payload): Json<MarkerActionRequest>,
) -> Result<Json<RoundSnapshot>, AppError> {
    let snapshot = scoring_service::skip_hole_stats(&state, id, hole, payload).await?;
    Ok(Json(snapshot))
}

/// Re-enable stat prompting after the skip throttle silenced it.
#[utoipa::path(
    post,
    path = "/rounds/{id}/stats/enable",
    tag = "scoring",
    params(("id" = Uuid, Path, description = "Round identifier")),
    request_body = MarkerActionRequest,
    responses(
        (status = 200, description = "Prompting re-enabled", body = RoundSnapshot)
    )
)]
pub async fn enable_stat_prompts(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<MarkerActionRequest>,
) -> Result<Json<RoundSnapshot>, AppError> {
    let snapshot = scoring_service::enable_stat_prompts(&state, id, payload).await?;
    Ok(Json(snapshot))
}
