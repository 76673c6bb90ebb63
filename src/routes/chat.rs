use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::chat::{ChatMessageSummary, PostChatMessageRequest},
    error::AppError,
    services::chat_service,
    state::SharedState,
};

/// Round chat log routes.
pub fn router() -> Router<SharedState> {
    Router::new().route("/rounds/{id}/chat", post(post_message).get(list_messages))
}

/// Append a message to the round's chat log.
#[utoipa::path(
    post,
    path = "/rounds/{id}/chat",
    tag = "chat",
    params(("id" = Uuid, Path, description = "Round identifier")),
    request_body = PostChatMessageRequest,
    responses(
        (status = 200, description = "Message posted", body = ChatMessageSummary)
    )
)]
pub async fn post_message(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<PostChatMessageRequest>,
) -> Result<Json<ChatMessageSummary>, AppError> {
    let message = chat_service::post_message(&state, id, payload).await?;
    Ok(Json(message))
}

/// Read the round's chat log in posting order.
#[utoipa::path(
    get,
    path = "/rounds/{id}/chat",
    tag = "chat",
    params(("id" = Uuid, Path, description = "Round identifier")),
    responses(
        (status = 200, description = "Chat log", body = [ChatMessageSummary])
    )
)]
pub async fn list_messages(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<ChatMessageSummary>>, AppError> {
    let log = chat_service::list_messages(&state, id).await?;
    Ok(Json(log))
}
