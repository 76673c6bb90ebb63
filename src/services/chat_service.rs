//! Round chat: an append-only, independently timestamped log keyed by round,
//! kept outside the Round document and opaque to scoring.

use std::time::SystemTime;

use uuid::Uuid;

use crate::{
    dto::chat::{ChatMessageSummary, PostChatMessageRequest},
    error::ServiceError,
    services::sse_events,
    state::{SharedState, chat::ChatMessage},
};

/// Longest accepted message body.
const MAX_BODY_LENGTH: usize = 500;

/// Append a message to the round's chat log and broadcast it.
///
/// Any participant may post regardless of marker status; chat never touches
/// scoring state.
pub async fn post_message(
    state: &SharedState,
    round_id: Uuid,
    request: PostChatMessageRequest,
) -> Result<ChatMessageSummary, ServiceError> {
    let handle = state.round(round_id)?;

    let body = request.body.trim().to_owned();
    if body.is_empty() {
        return Err(ServiceError::InvalidInput(
            "chat message must not be empty".into(),
        ));
    }
    if body.chars().count() > MAX_BODY_LENGTH {
        return Err(ServiceError::InvalidInput(format!(
            "chat message must be at most {MAX_BODY_LENGTH} characters"
        )));
    }

    let author_name = {
        let round = handle.round().read().await;
        round
            .slot(request.author_id)
            .map(|slot| slot.display_name.clone())
            .ok_or_else(|| {
                ServiceError::InvalidInput(format!(
                    "player `{}` is not part of this round",
                    request.author_id
                ))
            })?
    };

    let message = ChatMessage {
        id: Uuid::new_v4(),
        round_id,
        author_id: request.author_id,
        author_name,
        body,
        sent_at: SystemTime::now(),
    };

    let summary = ChatMessageSummary::from(&message);
    handle.chat().write().await.push(message);
    sse_events::broadcast_chat_message(&handle, &summary);
    Ok(summary)
}

/// Read the round's chat log in posting order.
pub async fn list_messages(
    state: &SharedState,
    round_id: Uuid,
) -> Result<Vec<ChatMessageSummary>, ServiceError> {
    let handle = state.round(round_id)?;
    let messages = handle.chat().read().await;
    Ok(messages.iter().map(Into::into).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::AppConfig, state::AppState, test_support};

    #[tokio::test]
    async fn messages_append_in_order_for_any_participant() {
        let state = AppState::new(AppConfig::default());
        let (round, players) = test_support::live_round(9, false);
        let round_id = round.id;
        state.install_round(round);

        post_message(
            &state,
            round_id,
            PostChatMessageRequest {
                author_id: players[1],
                body: "nice drive!".into(),
            },
        )
        .await
        .unwrap();
        post_message(
            &state,
            round_id,
            PostChatMessageRequest {
                author_id: players[0],
                body: "cheers".into(),
            },
        )
        .await
        .unwrap();

        let log = list_messages(&state, round_id).await.unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].body, "nice drive!");
        assert_eq!(log[0].author_name, "Bob");
        assert_eq!(log[1].body, "cheers");
    }

    #[tokio::test]
    async fn empty_bodies_and_strangers_are_rejected() {
        let state = AppState::new(AppConfig::default());
        let (round, players) = test_support::live_round(9, false);
        let round_id = round.id;
        state.install_round(round);

        let err = post_message(
            &state,
            round_id,
            PostChatMessageRequest {
                author_id: players[0],
                body: "   ".into(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));

        let err = post_message(
            &state,
            round_id,
            PostChatMessageRequest {
                author_id: Uuid::new_v4(),
                body: "hello".into(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }
}
