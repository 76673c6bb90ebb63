//! Service layer: the business logic behind the REST routes. Each module
//! coordinates document mutation, state-machine transitions, persistence,
//! and event broadcasting for one concern.

pub mod chat_service;
pub mod documentation;
pub mod health_service;
pub mod round_service;
pub mod scoring_service;
pub mod spectator_service;
pub mod sse_events;
pub mod sse_service;
pub mod storage_supervisor;
pub mod transfer_service;

use uuid::Uuid;

use crate::{error::ServiceError, state::round::Round};

/// Reject mutations once the round has reached a terminal status.
pub(crate) fn ensure_live(round: &Round) -> Result<(), ServiceError> {
    match round.status {
        crate::state::round::RoundStatus::Live => Ok(()),
        crate::state::round::RoundStatus::Complete => {
            Err(ServiceError::InvalidState("round is already complete".into()))
        }
        crate::state::round::RoundStatus::Abandoned => {
            Err(ServiceError::InvalidState("round was abandoned".into()))
        }
    }
}

/// Marker authorization, evaluated against the freshest `marker_id` under
/// the round's write lock. A stale ex-marker's write fails here even if it
/// believed itself authorized when the request was issued.
pub(crate) fn ensure_marker(round: &Round, acting: Uuid) -> Result<(), ServiceError> {
    if round.is_marker(acting) {
        Ok(())
    } else {
        Err(ServiceError::Unauthorized(format!(
            "player `{acting}` is not the scorekeeper for this round"
        )))
    }
}
