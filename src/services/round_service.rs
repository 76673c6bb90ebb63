//! Round lifecycle: creation from the group-setup payload, loading persisted
//! rounds into the live registry, and the terminal complete/abandon
//! transitions.

use std::collections::HashSet;
use std::time::SystemTime;

use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::RoundEntity,
    dto::{
        round::{CreateRoundRequest, RoundListItem, RoundSnapshot},
        scoring::MarkerActionRequest,
    },
    error::ServiceError,
    scoring::format::ScoringFormat,
    scoring::handicap::course_handicap,
    services::{ensure_live, ensure_marker, sse_events},
    state::{
        RoundHandle, SharedState, resume_phase,
        round::{HoleDetail, PlayerSlot, Round, RoundStatus, StatPromptState, Team},
        state_machine::RoundEvent,
        transitions::run_transition_with_broadcast,
    },
};

/// Project the current document plus machine phase into the wire shape.
pub(crate) async fn build_snapshot(handle: &RoundHandle) -> RoundSnapshot {
    let phase = handle.phase().await;
    let round = handle.round().read().await;
    RoundSnapshot::new(&round, phase)
}

/// Persist the current document; failures only log and flip degraded mode.
/// The in-memory round stays authoritative while the supervisor reconnects.
pub(crate) async fn persist_round_best_effort(state: &SharedState, handle: &RoundHandle) {
    let Some(store) = state.round_store().await else {
        return;
    };
    let entity: RoundEntity = handle.round().read().await.clone().into();
    if let Err(err) = store.save_round(entity).await {
        warn!(error = %err, "failed to persist round snapshot; continuing from memory");
        state.update_degraded(true);
    }
}

/// Persist the current document, propagating failures to the caller. Used
/// inside lifecycle transitions where a failed save must abort the commit.
pub(crate) async fn persist_round_strict(
    state: &SharedState,
    handle: &RoundHandle,
) -> Result<(), ServiceError> {
    let Some(store) = state.round_store().await else {
        warn!("no storage installed; round changes kept in memory only");
        return Ok(());
    };
    let entity: RoundEntity = handle.round().read().await.clone().into();
    store.save_round(entity).await.map_err(Into::into)
}

/// Bootstrap a fresh round from the external group-setup payload.
pub async fn create_round(
    state: &SharedState,
    request: CreateRoundRequest,
) -> Result<RoundSnapshot, ServiceError> {
    request.validate()?;
    let round = build_round(request)?;

    if let Some(store) = state.round_store().await {
        store.save_round(round.clone().into()).await?;
    } else {
        warn!(round_id = %round.id, "creating round without storage (degraded mode)");
    }

    info!(round_id = %round.id, course = %round.course_name, "round created");
    let handle = state.install_round(round);
    Ok(build_snapshot(&handle).await)
}

/// Load a persisted round into the live registry, or return the live copy.
pub async fn load_round(state: &SharedState, id: Uuid) -> Result<RoundSnapshot, ServiceError> {
    if let Ok(handle) = state.round(id) {
        return Ok(build_snapshot(&handle).await);
    }

    let store = state.require_round_store().await?;
    let Some(entity) = store.find_round(id).await? else {
        return Err(ServiceError::NotFound(format!("round `{id}` not found")));
    };

    let handle = state.install_round(entity.into());
    info!(round_id = %id, "round loaded from storage");
    Ok(build_snapshot(&handle).await)
}

/// Read one round: the live copy when present, otherwise the stored document.
pub async fn get_round(state: &SharedState, id: Uuid) -> Result<RoundSnapshot, ServiceError> {
    if let Ok(handle) = state.round(id) {
        return Ok(build_snapshot(&handle).await);
    }

    let store = state.require_round_store().await?;
    let Some(entity) = store.find_round(id).await? else {
        return Err(ServiceError::NotFound(format!("round `{id}` not found")));
    };

    let round: Round = entity.into();
    let phase = resume_phase(&round);
    Ok(RoundSnapshot::new(&round, phase))
}

/// List stored rounds, newest first.
pub async fn list_rounds(state: &SharedState) -> Result<Vec<RoundListItem>, ServiceError> {
    let store = state.require_round_store().await?;
    let entries = store.list_rounds().await?;
    Ok(entries.into_iter().map(Into::into).collect())
}

/// Confirm the full scorecard and freeze the round.
///
/// Requires the sentinel position (every hole entered) and a complete card;
/// the card re-scan names the first missing hole and player when it is not.
pub async fn complete_round(
    state: &SharedState,
    round_id: Uuid,
    request: MarkerActionRequest,
) -> Result<RoundSnapshot, ServiceError> {
    let handle = state.round(round_id)?;

    run_transition_with_broadcast(&handle, RoundEvent::Complete, || async {
        {
            let mut round = handle.round().write().await;
            round.prune_expired_transfer(SystemTime::now());
            ensure_live(&round)?;
            ensure_marker(&round, request.acting)?;

            if let Some((hole, player_id)) = round.first_missing_entry() {
                let name = round
                    .slot(player_id)
                    .map(|slot| slot.display_name.clone())
                    .unwrap_or_else(|| player_id.to_string());
                return Err(ServiceError::InvalidState(format!(
                    "incomplete scorecard: hole {hole} has no score for {name}"
                )));
            }

            round.status = RoundStatus::Complete;
            round.completed_at = Some(SystemTime::now());
        }

        if let Err(err) = persist_round_strict(state, &handle).await {
            // Roll the document back so an aborted transition leaves no
            // half-completed state behind.
            let mut round = handle.round().write().await;
            round.status = RoundStatus::Live;
            round.completed_at = None;
            return Err(err);
        }

        Ok(())
    })
    .await?;

    info!(round_id = %round_id, "round completed");
    sse_events::broadcast_round_closed(&handle, round_id, RoundStatus::Complete);
    Ok(build_snapshot(&handle).await)
}

/// Terminal walk-off. Valid from any live phase, unconditional, and never
/// blocked by storage: the abandon wins by being the last accepted write.
pub async fn abandon_round(
    state: &SharedState,
    round_id: Uuid,
    request: MarkerActionRequest,
) -> Result<RoundSnapshot, ServiceError> {
    let handle = state.round(round_id)?;

    run_transition_with_broadcast(&handle, RoundEvent::Abandon, || async {
        {
            let mut round = handle.round().write().await;
            round.prune_expired_transfer(SystemTime::now());
            ensure_live(&round)?;
            ensure_marker(&round, request.acting)?;

            round.status = RoundStatus::Abandoned;
            round.abandoned_at = Some(SystemTime::now());
            round.abandoned_by = Some(request.acting);
            round.transfer_request = None;
        }

        persist_round_best_effort(state, &handle).await;
        Ok(())
    })
    .await?;

    info!(round_id = %round_id, "round abandoned");
    sse_events::broadcast_round_closed(&handle, round_id, RoundStatus::Abandoned);
    Ok(build_snapshot(&handle).await)
}

fn build_round(request: CreateRoundRequest) -> Result<Round, ServiceError> {
    let CreateRoundRequest {
        course_id,
        course_name,
        hole_count,
        format_id,
        playing_order,
        hole_details,
        players,
        teams,
        marker,
        privacy,
        round_type,
        collect_stats,
    } = request;

    if hole_count != 9 && hole_count != 18 {
        return Err(ServiceError::InvalidInput(format!(
            "hole count must be 9 or 18 (got {hole_count})"
        )));
    }

    let format: ScoringFormat = format_id.parse()?;

    let playing_order = playing_order.unwrap_or_else(|| (1..=hole_count).collect());
    validate_permutation(&playing_order, hole_count, "playing order")?;

    if hole_details.len() != usize::from(hole_count) {
        return Err(ServiceError::InvalidInput(format!(
            "expected {hole_count} hole details, got {}",
            hole_details.len()
        )));
    }
    for (detail, &expected_hole) in hole_details.iter().zip(&playing_order) {
        if detail.hole != expected_hole {
            return Err(ServiceError::InvalidInput(format!(
                "hole details must follow the playing order (expected hole {expected_hole}, got {})",
                detail.hole
            )));
        }
    }
    let stroke_indexes: Vec<u8> = hole_details.iter().map(|detail| detail.stroke_index).collect();
    validate_permutation(&stroke_indexes, hole_count, "stroke indexes")?;

    if players.is_empty() {
        return Err(ServiceError::InvalidInput(
            "a round requires at least one player".into(),
        ));
    }

    let hole_details: Vec<HoleDetail> = hole_details
        .into_iter()
        .map(|input| HoleDetail {
            hole: input.hole,
            par: input.par,
            yardage: input.yardage,
            stroke_index: input.stroke_index,
        })
        .collect();
    let par_total: u16 = hole_details.iter().map(|detail| u16::from(detail.par)).sum();

    let team_defs: Vec<Team> = teams
        .iter()
        .map(|input| Team {
            id: Uuid::new_v4(),
            name: input.name.clone(),
            player_ids: Vec::new(),
        })
        .collect();

    if format.is_team() && team_defs.is_empty() {
        return Err(ServiceError::InvalidInput(format!(
            "format `{format}` requires team definitions"
        )));
    }
    if !format.is_team() && !team_defs.is_empty() {
        return Err(ServiceError::InvalidInput(format!(
            "format `{format}` does not take teams"
        )));
    }

    let mut seen_ids = HashSet::new();
    let mut slots = Vec::with_capacity(players.len());
    let mut team_members: Vec<Vec<Uuid>> = vec![Vec::new(); team_defs.len()];

    for player in players {
        // Ghosts get a generated id so they key hole data like everyone else.
        let player_id = player.player_id.unwrap_or_else(Uuid::new_v4);
        if !seen_ids.insert(player_id) {
            return Err(ServiceError::InvalidInput(format!(
                "duplicate player id `{player_id}` in round setup"
            )));
        }

        let team_id = match player.team_index {
            Some(index) => {
                if !format.is_team() {
                    return Err(ServiceError::InvalidInput(format!(
                        "player `{}` has a team but format `{format}` is individual",
                        player.display_name
                    )));
                }
                let team = team_defs.get(index).ok_or_else(|| {
                    ServiceError::InvalidInput(format!(
                        "player `{}` references team index {index}, but only {} teams are defined",
                        player.display_name,
                        team_defs.len()
                    ))
                })?;
                team_members[index].push(player_id);
                Some(team.id)
            }
            None => {
                if format.is_team() {
                    return Err(ServiceError::InvalidInput(format!(
                        "player `{}` must belong to a team in format `{format}`",
                        player.display_name
                    )));
                }
                None
            }
        };

        slots.push(PlayerSlot {
            player_id,
            display_name: player.display_name,
            avatar: player.avatar,
            is_ghost: player.is_ghost,
            is_marker: false,
            handicap_index: player.handicap_index,
            course_handicap: course_handicap(
                player.handicap_index,
                player.slope_rating,
                player.course_rating,
                par_total,
                hole_count,
            ),
            tee_name: player.tee_name,
            slope_rating: player.slope_rating,
            course_rating: player.course_rating,
            team_id,
        });
    }

    let mut teams = team_defs;
    for (team, members) in teams.iter_mut().zip(team_members) {
        if members.is_empty() {
            return Err(ServiceError::InvalidInput(format!(
                "team `{}` has no players",
                team.name
            )));
        }
        team.player_ids = members;
    }

    let marker_id = match marker {
        Some(id) => id,
        None => slots
            .iter()
            .find(|slot| !slot.is_ghost)
            .map(|slot| slot.player_id)
            .ok_or_else(|| {
                ServiceError::InvalidInput(
                    "a round needs at least one non-ghost player to act as marker".into(),
                )
            })?,
    };
    let marker_slot = slots
        .iter()
        .find(|slot| slot.player_id == marker_id)
        .ok_or_else(|| {
            ServiceError::InvalidInput(format!("marker `{marker_id}` is not a participant"))
        })?;
    if marker_slot.is_ghost {
        return Err(ServiceError::InvalidInput(
            "ghost players cannot hold the marker role".into(),
        ));
    }

    let mut round = Round {
        id: Uuid::new_v4(),
        status: RoundStatus::Live,
        marker_id,
        course_id,
        course_name,
        hole_count,
        format,
        playing_order,
        hole_details,
        players: slots,
        teams,
        current_hole: 1,
        hole_data: Default::default(),
        live_scores: Default::default(),
        transfer_request: None,
        stat_prompts: StatPromptState::new(collect_stats),
        privacy,
        round_type,
        started_at: SystemTime::now(),
        completed_at: None,
        abandoned_at: None,
        abandoned_by: None,
    };
    round.assign_marker(marker_id);
    round.refresh_live_scores();
    Ok(round)
}

fn validate_permutation(values: &[u8], hole_count: u8, what: &str) -> Result<(), ServiceError> {
    if values.len() != usize::from(hole_count) {
        return Err(ServiceError::InvalidInput(format!(
            "{what} must cover all {hole_count} holes (got {})",
            values.len()
        )));
    }
    let mut sorted: Vec<u8> = values.to_vec();
    sorted.sort_unstable();
    let expected: Vec<u8> = (1..=hole_count).collect();
    if sorted != expected {
        return Err(ServiceError::InvalidInput(format!(
            "{what} must be a permutation of 1..={hole_count}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppConfig,
        dto::round::{HoleDetailInput, PlayerSlotInput},
        state::{AppState, round::Privacy},
        test_support,
    };

    fn player_input(name: &str) -> PlayerSlotInput {
        PlayerSlotInput {
            player_id: Some(Uuid::new_v4()),
            display_name: name.into(),
            avatar: None,
            is_ghost: false,
            handicap_index: 0.0,
            tee_name: "white".into(),
            slope_rating: 113,
            course_rating: 72.0,
            team_index: None,
        }
    }

    fn create_request(hole_count: u8, format_id: &str) -> CreateRoundRequest {
        CreateRoundRequest {
            course_id: "course-1".into(),
            course_name: "Test Links".into(),
            hole_count,
            format_id: format_id.into(),
            playing_order: None,
            hole_details: (1..=hole_count)
                .map(|hole| HoleDetailInput {
                    hole,
                    par: 4,
                    yardage: None,
                    stroke_index: hole,
                })
                .collect(),
            players: vec![player_input("Alice"), player_input("Bob")],
            teams: vec![],
            marker: None,
            privacy: Privacy::Public,
            round_type: "casual".into(),
            collect_stats: false,
        }
    }

    #[tokio::test]
    async fn create_round_starts_live_on_the_first_hole() {
        let state = AppState::new(AppConfig::default());
        let snapshot = create_round(&state, create_request(18, "stroke_play"))
            .await
            .unwrap();
        assert_eq!(snapshot.current_hole, 1);
        assert_eq!(snapshot.status, RoundStatus::Live);
        assert_eq!(snapshot.live_scores.len(), 2);
        assert!(snapshot.hole_data.is_empty());
        // First player defaults to marker and the cached flags agree.
        assert_eq!(snapshot.players[0].player_id, snapshot.marker_id);
        assert!(snapshot.players[0].is_marker);
        assert!(!snapshot.players[1].is_marker);
    }

    #[tokio::test]
    async fn create_round_rejects_unknown_format() {
        let state = AppState::new(AppConfig::default());
        let err = create_round(&state, create_request(18, "match_play"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)), "{err:?}");
    }

    #[tokio::test]
    async fn create_round_rejects_bad_hole_count() {
        let state = AppState::new(AppConfig::default());
        let mut request = create_request(9, "stroke_play");
        request.hole_count = 12;
        let err = create_round(&state, request).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn create_round_rejects_non_permutation_playing_order() {
        let state = AppState::new(AppConfig::default());
        let mut request = create_request(9, "stroke_play");
        request.playing_order = Some(vec![1, 2, 3, 4, 5, 6, 7, 8, 8]);
        let err = create_round(&state, request).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn create_round_rejects_teams_for_individual_format() {
        let state = AppState::new(AppConfig::default());
        let mut request = create_request(9, "stroke_play");
        request.teams = vec![crate::dto::round::TeamInput { name: "pair".into() }];
        let err = create_round(&state, request).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn complete_rejects_missing_entry_naming_hole_and_player() {
        // An 18-hole card positioned at the sentinel but with hole 14 missing
        // a score for Bob; completion must name both.
        let state = AppState::new(AppConfig::default());
        let (round, players) = test_support::round_at_sentinel_missing(18, 14, 1);
        let marker = players[0];
        let round_id = round.id;
        state.install_round(round);

        let err = complete_round(&state, round_id, MarkerActionRequest { acting: marker })
            .await
            .unwrap_err();
        match err {
            ServiceError::InvalidState(message) => {
                assert!(message.contains("hole 14"), "{message}");
                assert!(message.contains("Bob"), "{message}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn complete_freezes_a_full_card() {
        let state = AppState::new(AppConfig::default());
        let (round, players) = test_support::round_with_full_card(9);
        let marker = players[0];
        let round_id = round.id;
        state.install_round(round);

        let snapshot = complete_round(&state, round_id, MarkerActionRequest { acting: marker })
            .await
            .unwrap();
        assert_eq!(snapshot.status, RoundStatus::Complete);
        assert!(snapshot.completed_at.is_some());

        // Terminal status: a second completion is rejected.
        let err = complete_round(&state, round_id, MarkerActionRequest { acting: marker })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }

    #[tokio::test]
    async fn abandon_is_marker_only_and_terminal() {
        let state = AppState::new(AppConfig::default());
        let snapshot = create_round(&state, create_request(9, "stroke_play"))
            .await
            .unwrap();
        let marker = snapshot.marker_id;
        let other = snapshot.players[1].player_id;

        let err = abandon_round(&state, snapshot.id, MarkerActionRequest { acting: other })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));

        let abandoned = abandon_round(&state, snapshot.id, MarkerActionRequest { acting: marker })
            .await
            .unwrap();
        assert_eq!(abandoned.status, RoundStatus::Abandoned);
        assert_eq!(abandoned.abandoned_by, Some(marker));

        let err = abandon_round(&state, snapshot.id, MarkerActionRequest { acting: marker })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }
}
