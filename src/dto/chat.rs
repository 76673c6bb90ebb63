use serde::Deserialize;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::dto::format_system_time;
use crate::state::chat::ChatMessage;

/// Post a message to a round's chat log.
#[derive(Debug, Deserialize, ToSchema)]
pub struct PostChatMessageRequest {
    /// Author; must be a participant of the round.
    pub author_id: Uuid,
    /// Message text.
    pub body: String,
}

/// Chat message as exposed to clients.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ChatMessageSummary {
    /// Message id.
    pub id: Uuid,
    /// Author's player id.
    pub author_id: Uuid,
    /// Denormalised author name.
    pub author_name: String,
    /// Message text.
    pub body: String,
    /// When the message was posted (RFC 3339).
    pub sent_at: String,
}

impl From<&ChatMessage> for ChatMessageSummary {
    fn from(value: &ChatMessage) -> Self {
        Self {
            id: value.id,
            author_id: value.author_id,
            author_name: value.author_name.clone(),
            body: value.body.clone(),
            sent_at: format_system_time(value.sent_at),
        }
    }
}
