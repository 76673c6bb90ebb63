//! Marker-side scoring flow: stroke entry, the hole-complete advance, and
//! the stat-collection sub-flow.
//!
//! The advance is an explicit state-machine transition fired synchronously
//! by the mutation that completes a hole, never a reactive side effect, so
//! corrections to already-complete holes can never re-trigger it.

use std::time::SystemTime;

use tracing::info;
use uuid::Uuid;

use crate::{
    dto::{
        round::RoundSnapshot,
        scoring::{MarkerActionRequest, RecordHoleStatsRequest, RecordStrokeRequest},
    },
    error::ServiceError,
    services::{
        ensure_live, ensure_marker,
        round_service::{build_snapshot, persist_round_best_effort},
        sse_events,
    },
    state::{
        RoundHandle, SharedState,
        round::{HoleEntry, StatToggle},
        state_machine::{RoundEvent, RoundPhase},
        transitions::run_transition_with_broadcast,
    },
};

/// Lowest stroke count accepted for a hole.
const MIN_STROKES: u8 = 1;
/// Highest stroke count accepted for a hole.
const MAX_STROKES: u8 = 15;

/// What the machine should do after a stroke write lands.
enum AdvanceAction {
    /// Nothing: the write was a correction or the hole is still open.
    Stay,
    /// The current hole just completed and stat prompting is active.
    CollectStats,
    /// The current hole just completed; move straight on.
    Advance {
        /// Whether the caller suppressed the prompt, which counts as a skip.
        counts_as_skip: bool,
    },
}

/// Record or correct a stroke count for one player on one hole.
///
/// Exactly when the write transitions the current hole from incomplete to
/// complete, the advance flow fires; re-entering a score on an already
/// complete hole only recomputes the derived scores.
pub async fn record_stroke(
    state: &SharedState,
    round_id: Uuid,
    request: RecordStrokeRequest,
) -> Result<RoundSnapshot, ServiceError> {
    let handle = state.round(round_id)?;

    let action = {
        let mut round = handle.round().write().await;
        round.prune_expired_transfer(SystemTime::now());
        ensure_live(&round)?;
        ensure_marker(&round, request.recorded_by)?;

        if request.hole == 0 || request.hole > round.hole_count {
            return Err(ServiceError::InvalidInput(format!(
                "hole {} is out of range for a {}-hole round",
                request.hole, round.hole_count
            )));
        }
        if !(MIN_STROKES..=MAX_STROKES).contains(&request.strokes) {
            return Err(ServiceError::InvalidInput(format!(
                "stroke count must be between {MIN_STROKES} and {MAX_STROKES} (got {})",
                request.strokes
            )));
        }
        if round.slot(request.player_id).is_none() {
            return Err(ServiceError::InvalidInput(format!(
                "player `{}` is not part of this round",
                request.player_id
            )));
        }

        let was_complete = round.hole_complete(request.hole);
        let entries = round.hole_data.entry(request.hole).or_default();
        match entries.get_mut(&request.player_id) {
            // A correction keeps any stats already collected for the hole.
            Some(entry) => entry.strokes = request.strokes,
            None => {
                entries.insert(request.player_id, HoleEntry::with_strokes(request.strokes));
            }
        }
        round.refresh_live_scores();

        let completes_current = !was_complete
            && round.hole_complete(request.hole)
            && round.current_hole_number() == Some(request.hole);

        if !completes_current {
            AdvanceAction::Stay
        } else if round.stat_prompts.active() && !request.suppress_stats {
            AdvanceAction::CollectStats
        } else {
            AdvanceAction::Advance {
                counts_as_skip: round.stat_prompts.active(),
            }
        }
    };

    match action {
        AdvanceAction::Stay => {
            persist_round_best_effort(state, &handle).await;
            sse_events::broadcast_round_snapshot(&handle).await;
        }
        AdvanceAction::CollectStats => {
            run_transition_with_broadcast(&handle, RoundEvent::BeginStatCollection, || async {
                persist_round_best_effort(state, &handle).await;
                Ok(())
            })
            .await?;
        }
        AdvanceAction::Advance { counts_as_skip } => {
            advance_once(state, &handle, counts_as_skip).await?;
            cascade_completed_holes(state, &handle).await?;
        }
    }

    Ok(build_snapshot(&handle).await)
}

/// Submit stat collection for the hole the round is paused on, then advance.
pub async fn record_hole_stats(
    state: &SharedState,
    round_id: Uuid,
    hole: u8,
    request: RecordHoleStatsRequest,
) -> Result<RoundSnapshot, ServiceError> {
    let handle = state.round(round_id)?;
    let position = collecting_position(&handle).await?;

    {
        let mut round = handle.round().write().await;
        round.prune_expired_transfer(SystemTime::now());
        ensure_live(&round)?;
        ensure_marker(&round, request.recorded_by)?;
        ensure_collecting_hole(&round.playing_order, position, hole)?;

        let par = round
            .hole_detail(hole)
            .map(|detail| detail.par)
            .unwrap_or(4);

        for input in &request.entries {
            if round.slot(input.player_id).is_none() {
                return Err(ServiceError::InvalidInput(format!(
                    "player `{}` is not part of this round",
                    input.player_id
                )));
            }
            if input.dtp.is_some() && par != 3 {
                return Err(ServiceError::InvalidInput(
                    "distance to pin only applies to par-3 holes".into(),
                ));
            }
        }

        let entries = round.hole_data.get_mut(&hole).ok_or_else(|| {
            ServiceError::InvalidState(format!("hole {hole} has no recorded strokes"))
        })?;
        for input in &request.entries {
            let Some(entry) = entries.get_mut(&input.player_id) else {
                return Err(ServiceError::InvalidState(format!(
                    "player `{}` has no stroke entry for hole {hole}",
                    input.player_id
                )));
            };
            // Fairways are meaningless on par 3s; normalise instead of
            // bouncing the whole submission.
            entry.fir = if par == 3 { StatToggle::Unset } else { input.fir };
            entry.gir = input.gir;
            entry.dtp = if par == 3 { input.dtp } else { None };
        }

        round.stat_prompts.record_collected();
        round.refresh_live_scores();
    }

    advance_once(state, &handle, false).await?;
    cascade_completed_holes(state, &handle).await?;
    Ok(build_snapshot(&handle).await)
}

/// Skip stat collection for the hole the round is paused on, then advance.
/// Enough consecutive skips suppress further prompting for the round.
pub async fn skip_hole_stats(
    state: &SharedState,
    round_id: Uuid,
    hole: u8,
    request: MarkerActionRequest,
) -> Result<RoundSnapshot, ServiceError> {
    let handle = state.round(round_id)?;
    let position = collecting_position(&handle).await?;

    {
        let mut round = handle.round().write().await;
        round.prune_expired_transfer(SystemTime::now());
        ensure_live(&round)?;
        ensure_marker(&round, request.acting)?;
        ensure_collecting_hole(&round.playing_order, position, hole)?;
    }

    advance_once(state, &handle, true).await?;
    cascade_completed_holes(state, &handle).await?;
    Ok(build_snapshot(&handle).await)
}

/// Re-enable stat prompting after the skip throttle silenced it.
pub async fn enable_stat_prompts(
    state: &SharedState,
    round_id: Uuid,
    request: MarkerActionRequest,
) -> Result<RoundSnapshot, ServiceError> {
    let handle = state.round(round_id)?;

    {
        let mut round = handle.round().write().await;
        round.prune_expired_transfer(SystemTime::now());
        ensure_live(&round)?;
        ensure_marker(&round, request.acting)?;
        round.stat_prompts.re_enable();
    }

    persist_round_best_effort(state, &handle).await;
    sse_events::broadcast_round_snapshot(&handle).await;
    Ok(build_snapshot(&handle).await)
}

/// Phase guard: the machine must be paused on stat collection.
async fn collecting_position(handle: &RoundHandle) -> Result<u8, ServiceError> {
    match handle.phase().await {
        RoundPhase::CollectingStats(position) => Ok(position),
        other => Err(ServiceError::InvalidState(format!(
            "stat collection is not open (phase {other:?})"
        ))),
    }
}

fn ensure_collecting_hole(
    playing_order: &[u8],
    position: u8,
    hole: u8,
) -> Result<(), ServiceError> {
    let current = usize::from(position)
        .checked_sub(1)
        .and_then(|index| playing_order.get(index))
        .copied();
    if current != Some(hole) {
        return Err(ServiceError::InvalidState(format!(
            "stats are being collected for a different hole (expected {}, got {hole})",
            current.map_or_else(|| "none".to_string(), |h| h.to_string())
        )));
    }
    Ok(())
}

/// Single `AdvanceHole` transition. The position bump, any skip bookkeeping,
/// and the persisted snapshot all commit inside the planned transition.
async fn advance_once(
    state: &SharedState,
    handle: &RoundHandle,
    counts_as_skip: bool,
) -> Result<(), ServiceError> {
    run_transition_with_broadcast(handle, RoundEvent::AdvanceHole, || async {
        {
            let mut round = handle.round().write().await;
            round.current_hole += 1;
            if counts_as_skip {
                let threshold = state.config().stat_skip_threshold();
                if round.stat_prompts.record_skip(threshold) {
                    info!(
                        round_id = %round.id,
                        threshold,
                        "stat prompting suppressed after consecutive skips"
                    );
                }
            }
        }
        persist_round_best_effort(state, handle).await;
        Ok(())
    })
    .await
}

/// Walk forward over holes that were fully scored ahead of the playing
/// order: prompt for stats when active, otherwise keep advancing, so the
/// round can never strand its position on an already-complete hole.
async fn cascade_completed_holes(
    state: &SharedState,
    handle: &RoundHandle,
) -> Result<(), ServiceError> {
    loop {
        let next = {
            let phase = handle.phase().await;
            let round = handle.round().read().await;
            match phase {
                RoundPhase::EnteringHole(position) if position <= round.hole_count => {
                    let hole = round.playing_order[usize::from(position) - 1];
                    if round.hole_complete(hole) {
                        if round.stat_prompts.active() {
                            Some(RoundEvent::BeginStatCollection)
                        } else {
                            Some(RoundEvent::AdvanceHole)
                        }
                    } else {
                        None
                    }
                }
                _ => None,
            }
        };

        match next {
            None => return Ok(()),
            Some(RoundEvent::BeginStatCollection) => {
                run_transition_with_broadcast(handle, RoundEvent::BeginStatCollection, || async {
                    persist_round_best_effort(state, handle).await;
                    Ok(())
                })
                .await?;
                return Ok(());
            }
            Some(_) => advance_once(state, handle, false).await?,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppConfig,
        dto::scoring::PlayerHoleStatsInput,
        state::{AppState, round::HoleDetail, state_machine::RoundPhase},
        test_support,
    };

    fn stroke(recorded_by: Uuid, hole: u8, player_id: Uuid, strokes: u8) -> RecordStrokeRequest {
        RecordStrokeRequest {
            recorded_by,
            hole,
            player_id,
            strokes,
            suppress_stats: false,
        }
    }

    async fn setup(hole_count: u8, collect_stats: bool) -> (crate::state::SharedState, Uuid, Vec<Uuid>) {
        let state = AppState::new(AppConfig::default());
        let (round, players) = test_support::live_round(hole_count, collect_stats);
        let round_id = round.id;
        state.install_round(round);
        (state, round_id, players)
    }

    #[tokio::test]
    async fn stroke_write_validates_range_hole_and_player() {
        let (state, round_id, players) = setup(9, false).await;
        let marker = players[0];

        let err = record_stroke(&state, round_id, stroke(marker, 1, players[1], 0))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));

        let err = record_stroke(&state, round_id, stroke(marker, 1, players[1], 16))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));

        let err = record_stroke(&state, round_id, stroke(marker, 10, players[1], 4))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));

        let err = record_stroke(&state, round_id, stroke(marker, 1, Uuid::new_v4(), 4))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn non_marker_writes_are_rejected() {
        let (state, round_id, players) = setup(9, false).await;
        let err = record_stroke(&state, round_id, stroke(players[1], 1, players[1], 4))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn completing_the_current_hole_advances_without_stats() {
        let (state, round_id, players) = setup(9, false).await;
        let marker = players[0];

        let snapshot = record_stroke(&state, round_id, stroke(marker, 1, players[0], 4))
            .await
            .unwrap();
        // One player in: the hole is still open.
        assert_eq!(snapshot.current_hole, 1);

        let snapshot = record_stroke(&state, round_id, stroke(marker, 1, players[1], 5))
            .await
            .unwrap();
        assert_eq!(snapshot.current_hole, 2);
        assert_eq!(
            state.round(round_id).unwrap().phase().await,
            RoundPhase::EnteringHole(2)
        );
    }

    #[tokio::test]
    async fn corrections_never_double_advance() {
        let (state, round_id, players) = setup(9, false).await;
        let marker = players[0];
        record_stroke(&state, round_id, stroke(marker, 1, players[0], 4))
            .await
            .unwrap();
        record_stroke(&state, round_id, stroke(marker, 1, players[1], 5))
            .await
            .unwrap();

        // Correct the already-complete hole: scores change, position stays.
        let snapshot = record_stroke(&state, round_id, stroke(marker, 1, players[1], 6))
            .await
            .unwrap();
        assert_eq!(snapshot.current_hole, 2);
        assert_eq!(
            state.round(round_id).unwrap().phase().await,
            RoundPhase::EnteringHole(2)
        );
        let bob = snapshot
            .live_scores
            .iter()
            .find(|entry| entry.player_id == players[1])
            .unwrap();
        assert_eq!(bob.current_gross, 6);
    }

    #[tokio::test]
    async fn completing_a_hole_opens_stat_collection_when_enabled() {
        let (state, round_id, players) = setup(9, true).await;
        let marker = players[0];
        record_stroke(&state, round_id, stroke(marker, 1, players[0], 4))
            .await
            .unwrap();
        let snapshot = record_stroke(&state, round_id, stroke(marker, 1, players[1], 5))
            .await
            .unwrap();

        // Position holds until stats are supplied or skipped.
        assert_eq!(snapshot.current_hole, 1);
        assert_eq!(
            state.round(round_id).unwrap().phase().await,
            RoundPhase::CollectingStats(1)
        );

        let stats = RecordHoleStatsRequest {
            recorded_by: marker,
            entries: vec![
                PlayerHoleStatsInput {
                    player_id: players[0],
                    fir: StatToggle::Hit,
                    gir: StatToggle::Missed,
                    dtp: None,
                },
                PlayerHoleStatsInput {
                    player_id: players[1],
                    fir: StatToggle::Unset,
                    gir: StatToggle::Hit,
                    dtp: None,
                },
            ],
        };
        let snapshot = record_hole_stats(&state, round_id, 1, stats).await.unwrap();
        assert_eq!(snapshot.current_hole, 2);

        let hole_one = snapshot.hole_data.iter().find(|h| h.hole == 1).unwrap();
        let alice = hole_one
            .entries
            .iter()
            .find(|e| e.player_id == players[0])
            .unwrap();
        assert_eq!(alice.fir, StatToggle::Hit);
        assert_eq!(alice.gir, StatToggle::Missed);
    }

    #[tokio::test]
    async fn three_skips_suppress_prompting_until_re_enabled() {
        let (state, round_id, players) = setup(9, true).await;
        let marker = players[0];

        for hole in 1..=3u8 {
            record_stroke(&state, round_id, stroke(marker, hole, players[0], 4))
                .await
                .unwrap();
            record_stroke(&state, round_id, stroke(marker, hole, players[1], 4))
                .await
                .unwrap();
            skip_hole_stats(&state, round_id, hole, MarkerActionRequest { acting: marker })
                .await
                .unwrap();
        }

        // Third consecutive skip crossed the threshold: hole 4 completes
        // straight through without a stats pause.
        record_stroke(&state, round_id, stroke(marker, 4, players[0], 4))
            .await
            .unwrap();
        let snapshot = record_stroke(&state, round_id, stroke(marker, 4, players[1], 4))
            .await
            .unwrap();
        assert!(snapshot.stat_prompts.suppressed);
        assert_eq!(snapshot.current_hole, 5);

        // Re-enabling brings the prompt back for the next completion.
        enable_stat_prompts(&state, round_id, MarkerActionRequest { acting: marker })
            .await
            .unwrap();
        record_stroke(&state, round_id, stroke(marker, 5, players[0], 4))
            .await
            .unwrap();
        record_stroke(&state, round_id, stroke(marker, 5, players[1], 4))
            .await
            .unwrap();
        assert_eq!(
            state.round(round_id).unwrap().phase().await,
            RoundPhase::CollectingStats(5)
        );
    }

    #[tokio::test]
    async fn suppress_flag_on_the_completing_write_counts_as_a_skip() {
        let (state, round_id, players) = setup(9, true).await;
        let marker = players[0];

        for hole in 1..=3u8 {
            record_stroke(&state, round_id, stroke(marker, hole, players[0], 4))
                .await
                .unwrap();
            let mut request = stroke(marker, hole, players[1], 4);
            request.suppress_stats = true;
            let snapshot = record_stroke(&state, round_id, request).await.unwrap();
            assert_eq!(snapshot.current_hole, hole + 1);
        }

        let round = state.round(round_id).unwrap();
        let guard = round.round().read().await;
        assert!(guard.stat_prompts.suppressed);
    }

    #[tokio::test]
    async fn holes_scored_ahead_of_order_cascade_on_advance() {
        let (state, round_id, players) = setup(9, false).await;
        let marker = players[0];

        // Hole 2 is fully scored before hole 1 finishes.
        record_stroke(&state, round_id, stroke(marker, 2, players[0], 3))
            .await
            .unwrap();
        record_stroke(&state, round_id, stroke(marker, 2, players[1], 4))
            .await
            .unwrap();
        assert_eq!(
            state.round(round_id).unwrap().phase().await,
            RoundPhase::EnteringHole(1)
        );

        // Finishing hole 1 must carry the position past the pre-scored hole 2.
        record_stroke(&state, round_id, stroke(marker, 1, players[0], 4))
            .await
            .unwrap();
        let snapshot = record_stroke(&state, round_id, stroke(marker, 1, players[1], 4))
            .await
            .unwrap();
        assert_eq!(snapshot.current_hole, 3);
    }

    #[tokio::test]
    async fn dtp_is_par_three_only_and_fir_is_normalised() {
        let (state, round_id, players) = setup(9, true).await;
        let marker = players[0];
        {
            // Make hole 1 a par 3 for this scenario.
            let handle = state.round(round_id).unwrap();
            let mut round = handle.round().write().await;
            round.hole_details[0] = HoleDetail {
                hole: 1,
                par: 3,
                yardage: Some(165),
                stroke_index: 1,
            };
        }

        record_stroke(&state, round_id, stroke(marker, 1, players[0], 3))
            .await
            .unwrap();
        record_stroke(&state, round_id, stroke(marker, 1, players[1], 4))
            .await
            .unwrap();

        let stats = RecordHoleStatsRequest {
            recorded_by: marker,
            entries: vec![PlayerHoleStatsInput {
                player_id: players[0],
                fir: StatToggle::Hit,
                gir: StatToggle::Hit,
                dtp: Some(240),
            }],
        };
        let snapshot = record_hole_stats(&state, round_id, 1, stats).await.unwrap();
        let hole_one = snapshot.hole_data.iter().find(|h| h.hole == 1).unwrap();
        let alice = hole_one
            .entries
            .iter()
            .find(|e| e.player_id == players[0])
            .unwrap();
        // FIR has no meaning on a par 3; the distance sticks.
        assert_eq!(alice.fir, StatToggle::Unset);
        assert_eq!(alice.dtp, Some(240));

        // On the (par 4) second hole a distance-to-pin is rejected.
        record_stroke(&state, round_id, stroke(marker, 2, players[0], 4))
            .await
            .unwrap();
        record_stroke(&state, round_id, stroke(marker, 2, players[1], 4))
            .await
            .unwrap();
        let err = record_hole_stats(
            &state,
            round_id,
            2,
            RecordHoleStatsRequest {
                recorded_by: marker,
                entries: vec![PlayerHoleStatsInput {
                    player_id: players[0],
                    fir: StatToggle::Hit,
                    gir: StatToggle::Hit,
                    dtp: Some(100),
                }],
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn full_round_reaches_sentinel_and_completes() {
        let (state, round_id, players) = setup(9, false).await;
        let marker = players[0];

        for hole in 1..=9u8 {
            record_stroke(&state, round_id, stroke(marker, hole, players[0], 4))
                .await
                .unwrap();
            record_stroke(&state, round_id, stroke(marker, hole, players[1], 5))
                .await
                .unwrap();
        }

        let handle = state.round(round_id).unwrap();
        assert_eq!(handle.phase().await, RoundPhase::EnteringHole(10));

        let snapshot = crate::services::round_service::complete_round(
            &state,
            round_id,
            MarkerActionRequest { acting: marker },
        )
        .await
        .unwrap();
        assert_eq!(snapshot.status, crate::state::round::RoundStatus::Complete);

        // The frozen card rejects further writes.
        let err = record_stroke(&state, round_id, stroke(marker, 1, players[0], 4))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }
}
