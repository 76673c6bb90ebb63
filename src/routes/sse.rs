use std::convert::Infallible;

use axum::{
    Router,
    extract::{Path, State},
    response::sse::Sse,
    routing::get,
};
use futures::Stream;
use tracing::info;
use uuid::Uuid;

use crate::{error::AppError, services::sse_service, state::SharedState};

/// Stream live round snapshots and events to an observer.
#[utoipa::path(
    get,
    path = "/rounds/{id}/events",
    tag = "sse",
    params(("id" = Uuid, Path, description = "Round identifier")),
    responses((status = 200, description = "Round event stream", content_type = "text/event-stream", body = String))
)]
pub async fn round_stream(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Sse<impl Stream<Item = Result<axum::response::sse::Event, Infallible>>>, AppError> {
    let receiver = sse_service::subscribe(&state, id).await?;
    info!(round_id = %id, "new round stream connection");
    Ok(sse_service::to_sse_stream(receiver, id))
}

/// Configure the SSE endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/rounds/{id}/events", get(round_stream))
}
