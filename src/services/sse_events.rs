//! Broadcast helpers that serialise typed payloads onto a round's event
//! stream. Every mutation ends by pushing a full snapshot so observers can
//! always re-derive state instead of patching deltas.

use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::{
    dto::{
        chat::ChatMessageSummary,
        round::{RoundSnapshot, TransferRequestSummary},
        sse::{RoundClosedEvent, StreamEvent, TransferRequestedEvent, TransferResolvedEvent},
    },
    state::{RoundHandle, SseHub},
};

const EVENT_ROUND_SNAPSHOT: &str = "round.snapshot";
const EVENT_TRANSFER_REQUESTED: &str = "transfer.requested";
const EVENT_TRANSFER_RESOLVED: &str = "transfer.resolved";
const EVENT_ROUND_CLOSED: &str = "round.closed";
const EVENT_CHAT_MESSAGE: &str = "chat.message";

/// Broadcast the full round document plus machine phase.
pub async fn broadcast_round_snapshot(handle: &RoundHandle) {
    let phase = handle.phase().await;
    let round = handle.round().read().await;
    let snapshot = RoundSnapshot::new(&round, phase);
    send_event(handle.hub(), EVENT_ROUND_SNAPSHOT, &snapshot);
}

/// Broadcast a freshly filed marker-transfer request.
pub fn broadcast_transfer_requested(handle: &RoundHandle, request: TransferRequestSummary) {
    let payload = TransferRequestedEvent { request };
    send_event(handle.hub(), EVENT_TRANSFER_REQUESTED, &payload);
}

/// Broadcast the outcome of a transfer request or voluntary handoff.
pub fn broadcast_transfer_resolved(handle: &RoundHandle, approved: bool, marker_id: Uuid) {
    let payload = TransferResolvedEvent {
        approved,
        marker_id,
    };
    send_event(handle.hub(), EVENT_TRANSFER_RESOLVED, &payload);
}

/// Broadcast that the round reached a terminal state.
pub fn broadcast_round_closed(
    handle: &RoundHandle,
    round_id: Uuid,
    status: crate::state::round::RoundStatus,
) {
    let payload = RoundClosedEvent { round_id, status };
    send_event(handle.hub(), EVENT_ROUND_CLOSED, &payload);
}

/// Broadcast a chat message appended to the round's log.
pub fn broadcast_chat_message(handle: &RoundHandle, message: &ChatMessageSummary) {
    send_event(handle.hub(), EVENT_CHAT_MESSAGE, message);
}

fn send_event(hub: &SseHub, event: &str, payload: &impl Serialize) {
    match StreamEvent::json(Some(event.to_string()), payload) {
        Ok(event) => hub.broadcast(event),
        Err(err) => warn!(event, error = %err, "failed to serialize round event payload"),
    }
}
