use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

/// Dispatched payload carried across a round's event stream.
#[derive(Clone, Debug)]
pub struct StreamEvent {
    /// SSE event name, when the payload is typed.
    pub event: Option<String>,
    /// Serialized JSON payload.
    pub data: String,
}

impl StreamEvent {
    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }
}

/// Initial metadata sent to a subscriber when it connects.
#[derive(Debug, Serialize, ToSchema)]
pub struct Handshake {
    /// Round the stream belongs to.
    pub round_id: Uuid,
    /// Human-readable message confirming the subscription.
    pub message: String,
    /// Whether the backend is running without a storage connection.
    pub degraded: bool,
}

/// Broadcast when a player files a marker-transfer request.
#[derive(Debug, Serialize, ToSchema)]
pub struct TransferRequestedEvent {
    /// The pending request.
    pub request: crate::dto::round::TransferRequestSummary,
}

/// Broadcast when a transfer request resolves or the marker hands off.
#[derive(Debug, Serialize, ToSchema)]
pub struct TransferResolvedEvent {
    /// Whether the marker role actually moved.
    pub approved: bool,
    /// Marker after resolution.
    pub marker_id: Uuid,
}

/// Broadcast when the round reaches a terminal state.
#[derive(Debug, Serialize, ToSchema)]
pub struct RoundClosedEvent {
    /// Round id.
    pub round_id: Uuid,
    /// Terminal status (`complete` or `abandoned`).
    pub status: crate::state::round::RoundStatus,
}
