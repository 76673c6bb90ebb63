use std::time::SystemTime;

use uuid::Uuid;

/// One message in a round's chat log.
///
/// Chat lives alongside the Round document, not inside it: it is an
/// append-only, independently timestamped log the scoring core treats as
/// opaque.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    /// Unique message id.
    pub id: Uuid,
    /// Round the message belongs to.
    pub round_id: Uuid,
    /// Author's player id.
    pub author_id: Uuid,
    /// Denormalised author name for display.
    pub author_name: String,
    /// Message text.
    pub body: String,
    /// When the message was posted.
    pub sent_at: SystemTime,
}
