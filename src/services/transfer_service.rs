//! Marker-transfer coordination: voluntary handoff plus the request/approve
//! protocol. Every authorization check re-reads `marker_id` under the round's
//! write lock, so at most one writer is authorized at any instant even while
//! handoff propagation to observers is still in flight.

use std::time::SystemTime;

use tracing::info;
use uuid::Uuid;

use crate::{
    dto::{
        round::{RoundSnapshot, TransferRequestSummary},
        transfer::{RequestTransferRequest, ResolveTransferRequest, VoluntaryTransferRequest},
    },
    error::ServiceError,
    services::{
        ensure_live, ensure_marker,
        round_service::{build_snapshot, persist_round_best_effort},
        sse_events,
    },
    state::{SharedState, round::TransferRequest},
};

/// File a marker-transfer request as a non-marker, non-ghost player.
///
/// At most one request can be pending per round; the first requester wins
/// and later requests fail until the pending one resolves or lapses.
pub async fn request_transfer(
    state: &SharedState,
    round_id: Uuid,
    request: RequestTransferRequest,
) -> Result<RoundSnapshot, ServiceError> {
    let handle = state.round(round_id)?;

    let summary = {
        let mut round = handle.round().write().await;
        round.prune_expired_transfer(SystemTime::now());
        ensure_live(&round)?;

        let slot = round.slot(request.requested_by).ok_or_else(|| {
            ServiceError::InvalidInput(format!(
                "player `{}` is not part of this round",
                request.requested_by
            ))
        })?;
        if slot.is_ghost {
            return Err(ServiceError::InvalidInput(
                "ghost players cannot hold the marker role".into(),
            ));
        }
        if round.is_marker(request.requested_by) {
            return Err(ServiceError::InvalidState(
                "the requester is already the scorekeeper".into(),
            ));
        }
        if round.transfer_request.is_some() {
            return Err(ServiceError::Conflict(
                "a transfer request is already pending".into(),
            ));
        }

        let pending = TransferRequest::pending(
            request.requested_by,
            slot.display_name.clone(),
            state.config().transfer_request_ttl(),
        );
        let summary = TransferRequestSummary::from(&pending);
        round.transfer_request = Some(pending);
        summary
    };

    info!(round_id = %round_id, requested_by = %request.requested_by, "transfer requested");
    persist_round_best_effort(state, &handle).await;
    sse_events::broadcast_transfer_requested(&handle, summary);
    sse_events::broadcast_round_snapshot(&handle).await;
    Ok(build_snapshot(&handle).await)
}

/// Approve the pending request: a handoff to the requester, then clear.
pub async fn approve_transfer(
    state: &SharedState,
    round_id: Uuid,
    request: ResolveTransferRequest,
) -> Result<RoundSnapshot, ServiceError> {
    let handle = state.round(round_id)?;

    let new_marker = {
        let mut round = handle.round().write().await;
        round.prune_expired_transfer(SystemTime::now());
        ensure_live(&round)?;
        ensure_marker(&round, request.acting)?;

        let pending = round.transfer_request.take().ok_or_else(|| {
            ServiceError::InvalidState("no transfer request is pending".into())
        })?;
        round.assign_marker(pending.requested_by);
        pending.requested_by
    };

    info!(round_id = %round_id, new_marker = %new_marker, "transfer approved");
    persist_round_best_effort(state, &handle).await;
    sse_events::broadcast_transfer_resolved(&handle, true, new_marker);
    sse_events::broadcast_round_snapshot(&handle).await;
    Ok(build_snapshot(&handle).await)
}

/// Decline the pending request; the marker role does not move.
pub async fn decline_transfer(
    state: &SharedState,
    round_id: Uuid,
    request: ResolveTransferRequest,
) -> Result<RoundSnapshot, ServiceError> {
    let handle = state.round(round_id)?;

    let marker_id = {
        let mut round = handle.round().write().await;
        round.prune_expired_transfer(SystemTime::now());
        ensure_live(&round)?;
        ensure_marker(&round, request.acting)?;

        if round.transfer_request.take().is_none() {
            return Err(ServiceError::InvalidState(
                "no transfer request is pending".into(),
            ));
        }
        round.marker_id
    };

    info!(round_id = %round_id, "transfer declined");
    persist_round_best_effort(state, &handle).await;
    sse_events::broadcast_transfer_resolved(&handle, false, marker_id);
    sse_events::broadcast_round_snapshot(&handle).await;
    Ok(build_snapshot(&handle).await)
}

/// Direct handoff to a non-ghost co-player. Effective immediately in a
/// single atomic write; any pending request is cleared along the way.
pub async fn voluntary_transfer(
    state: &SharedState,
    round_id: Uuid,
    request: VoluntaryTransferRequest,
) -> Result<RoundSnapshot, ServiceError> {
    let handle = state.round(round_id)?;

    {
        let mut round = handle.round().write().await;
        round.prune_expired_transfer(SystemTime::now());
        ensure_live(&round)?;
        ensure_marker(&round, request.acting)?;

        let target = round.slot(request.new_marker).ok_or_else(|| {
            ServiceError::InvalidInput(format!(
                "player `{}` is not part of this round",
                request.new_marker
            ))
        })?;
        if target.is_ghost {
            return Err(ServiceError::InvalidInput(
                "ghost players cannot hold the marker role".into(),
            ));
        }
        if request.new_marker == request.acting {
            return Err(ServiceError::InvalidState(
                "the acting player already holds the marker role".into(),
            ));
        }

        round.assign_marker(request.new_marker);
        round.transfer_request = None;
    }

    info!(round_id = %round_id, new_marker = %request.new_marker, "marker handed off");
    persist_round_best_effort(state, &handle).await;
    sse_events::broadcast_transfer_resolved(&handle, true, request.new_marker);
    sse_events::broadcast_round_snapshot(&handle).await;
    Ok(build_snapshot(&handle).await)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{
        config::AppConfig,
        dto::scoring::RecordStrokeRequest,
        services::scoring_service,
        state::{AppState, round::TransferStatus},
        test_support,
    };

    async fn setup() -> (crate::state::SharedState, Uuid, Vec<Uuid>) {
        let state = AppState::new(AppConfig::default());
        let (round, players) = test_support::live_round(9, false);
        let round_id = round.id;
        state.install_round(round);
        (state, round_id, players)
    }

    fn assert_single_marker(snapshot: &RoundSnapshot) {
        let markers: Vec<_> = snapshot
            .players
            .iter()
            .filter(|player| player.is_marker)
            .collect();
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].player_id, snapshot.marker_id);
    }

    #[tokio::test]
    async fn second_pending_request_is_rejected() {
        let (state, round_id, players) = setup().await;
        // Add a third player so two non-markers can compete.
        let third = {
            let handle = state.round(round_id).unwrap();
            let mut round = handle.round().write().await;
            let mut slot = round.players[1].clone();
            slot.player_id = Uuid::new_v4();
            slot.display_name = "Cara".into();
            let id = slot.player_id;
            round.players.push(slot);
            id
        };

        request_transfer(
            &state,
            round_id,
            RequestTransferRequest {
                requested_by: players[1],
            },
        )
        .await
        .unwrap();

        let err = request_transfer(
            &state,
            round_id,
            RequestTransferRequest {
                requested_by: third,
            },
        )
        .await
        .unwrap_err();
        match err {
            ServiceError::Conflict(message) => {
                assert!(message.contains("already pending"), "{message}")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn approve_moves_the_marker_exactly_once() {
        let (state, round_id, players) = setup().await;
        let marker = players[0];
        let requester = players[1];

        let snapshot = request_transfer(
            &state,
            round_id,
            RequestTransferRequest {
                requested_by: requester,
            },
        )
        .await
        .unwrap();
        let pending = snapshot.transfer_request.as_ref().unwrap();
        assert_eq!(pending.status, TransferStatus::Pending);
        assert_eq!(pending.requested_by, requester);

        let snapshot = approve_transfer(
            &state,
            round_id,
            ResolveTransferRequest { acting: marker },
        )
        .await
        .unwrap();
        assert_eq!(snapshot.marker_id, requester);
        assert!(snapshot.transfer_request.is_none());
        assert_single_marker(&snapshot);

        // The old marker cannot approve anything anymore.
        let err = approve_transfer(
            &state,
            round_id,
            ResolveTransferRequest { acting: marker },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn decline_keeps_the_marker_and_clears_the_request() {
        let (state, round_id, players) = setup().await;
        let marker = players[0];

        request_transfer(
            &state,
            round_id,
            RequestTransferRequest {
                requested_by: players[1],
            },
        )
        .await
        .unwrap();

        let snapshot = decline_transfer(
            &state,
            round_id,
            ResolveTransferRequest { acting: marker },
        )
        .await
        .unwrap();
        assert_eq!(snapshot.marker_id, marker);
        assert!(snapshot.transfer_request.is_none());

        // A fresh request can now be filed.
        request_transfer(
            &state,
            round_id,
            RequestTransferRequest {
                requested_by: players[1],
            },
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn stale_marker_write_is_rejected_after_handoff() {
        // Voluntary handoff mid-round; a write from the original marker for
        // the next hole bounces while the new marker's write lands.
        let (state, round_id, players) = setup().await;
        let old_marker = players[0];
        let new_marker = players[1];

        for hole in 1..=6u8 {
            for &player in &players {
                scoring_service::record_stroke(
                    &state,
                    round_id,
                    RecordStrokeRequest {
                        recorded_by: old_marker,
                        hole,
                        player_id: player,
                        strokes: 4,
                        suppress_stats: false,
                    },
                )
                .await
                .unwrap();
            }
        }

        let snapshot = voluntary_transfer(
            &state,
            round_id,
            VoluntaryTransferRequest {
                acting: old_marker,
                new_marker,
            },
        )
        .await
        .unwrap();
        assert_eq!(snapshot.marker_id, new_marker);
        assert_single_marker(&snapshot);

        let stale = RecordStrokeRequest {
            recorded_by: old_marker,
            hole: 7,
            player_id: old_marker,
            strokes: 4,
            suppress_stats: false,
        };
        let err = scoring_service::record_stroke(&state, round_id, stale)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));

        let fresh = RecordStrokeRequest {
            recorded_by: new_marker,
            hole: 7,
            player_id: old_marker,
            strokes: 4,
            suppress_stats: false,
        };
        scoring_service::record_stroke(&state, round_id, fresh)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn marker_stays_single_across_transfer_sequences() {
        let (state, round_id, players) = setup().await;
        let a = players[0];
        let b = players[1];

        voluntary_transfer(
            &state,
            round_id,
            VoluntaryTransferRequest {
                acting: a,
                new_marker: b,
            },
        )
        .await
        .unwrap();
        request_transfer(&state, round_id, RequestTransferRequest { requested_by: a })
            .await
            .unwrap();
        let snapshot = approve_transfer(&state, round_id, ResolveTransferRequest { acting: b })
            .await
            .unwrap();
        assert_eq!(snapshot.marker_id, a);
        assert_single_marker(&snapshot);
    }

    #[tokio::test]
    async fn expired_request_counts_as_declined() {
        let (state, round_id, players) = setup().await;
        let marker = players[0];

        // Backdate a pending request past its expiry.
        {
            let handle = state.round(round_id).unwrap();
            let mut round = handle.round().write().await;
            let mut pending = TransferRequest::pending(
                players[1],
                "Bob".into(),
                Duration::from_secs(0),
            );
            pending.expires_at = SystemTime::now() - Duration::from_secs(1);
            round.transfer_request = Some(pending);
        }

        // The expiry is observed by the next operation: approving finds no
        // pending request left to act on.
        let err = approve_transfer(
            &state,
            round_id,
            ResolveTransferRequest { acting: marker },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));

        // And the slot is free for a new request without marker action.
        request_transfer(
            &state,
            round_id,
            RequestTransferRequest {
                requested_by: players[1],
            },
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn ghosts_and_markers_cannot_request() {
        let (state, round_id, players) = setup().await;
        let marker = players[0];

        let ghost = {
            let handle = state.round(round_id).unwrap();
            let mut round = handle.round().write().await;
            let mut slot = round.players[1].clone();
            slot.player_id = Uuid::new_v4();
            slot.display_name = "Ghost".into();
            slot.is_ghost = true;
            let id = slot.player_id;
            round.players.push(slot);
            id
        };

        let err = request_transfer(
            &state,
            round_id,
            RequestTransferRequest {
                requested_by: ghost,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));

        let err = request_transfer(
            &state,
            round_id,
            RequestTransferRequest {
                requested_by: marker,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }
}
