//! Round fixtures shared by service-layer tests.

use std::time::SystemTime;

use uuid::Uuid;

use crate::scoring::format::ScoringFormat;
use crate::state::round::{
    HoleDetail, HoleEntry, PlayerSlot, Privacy, Round, RoundStatus, StatPromptState,
};

/// Two-player live round fixture. Marker is the first player; every hole is
/// a par 4 whose stroke index equals its number.
pub(crate) fn live_round(hole_count: u8, collect_stats: bool) -> (Round, Vec<Uuid>) {
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();
    let players = vec![
        player_slot(alice, "Alice", true, 0),
        player_slot(bob, "Bob", false, 18),
    ];

    let round = Round {
        id: Uuid::new_v4(),
        status: RoundStatus::Live,
        marker_id: alice,
        course_id: "course-1".into(),
        course_name: "Test Links".into(),
        hole_count,
        format: ScoringFormat::StrokePlay,
        playing_order: (1..=hole_count).collect(),
        hole_details: (1..=hole_count)
            .map(|hole| HoleDetail {
                hole,
                par: 4,
                yardage: None,
                stroke_index: hole,
            })
            .collect(),
        players,
        teams: vec![],
        current_hole: 1,
        hole_data: Default::default(),
        live_scores: Default::default(),
        transfer_request: None,
        stat_prompts: StatPromptState::new(collect_stats),
        privacy: Privacy::Public,
        round_type: "casual".into(),
        started_at: SystemTime::now(),
        completed_at: None,
        abandoned_at: None,
        abandoned_by: None,
    };

    (round, vec![alice, bob])
}

/// Live round with every hole scored par and the position at the sentinel.
pub(crate) fn round_with_full_card(hole_count: u8) -> (Round, Vec<Uuid>) {
    let (mut round, players) = live_round(hole_count, false);
    for hole in 1..=hole_count {
        let entries = round.hole_data.entry(hole).or_default();
        for &player in &players {
            entries.insert(player, HoleEntry::with_strokes(4));
        }
    }
    round.current_hole = hole_count + 1;
    round.refresh_live_scores();
    (round, players)
}

/// Full card except one `(hole, player)` entry, positioned at the sentinel.
pub(crate) fn round_at_sentinel_missing(
    hole_count: u8,
    missing_hole: u8,
    missing_player_index: usize,
) -> (Round, Vec<Uuid>) {
    let (mut round, players) = round_with_full_card(hole_count);
    let missing_player = players[missing_player_index];
    if let Some(entries) = round.hole_data.get_mut(&missing_hole) {
        entries.shift_remove(&missing_player);
    }
    round.refresh_live_scores();
    (round, players)
}

fn player_slot(player_id: Uuid, name: &str, is_marker: bool, course_handicap: i32) -> PlayerSlot {
    PlayerSlot {
        player_id,
        display_name: name.into(),
        avatar: None,
        is_ghost: false,
        is_marker,
        handicap_index: course_handicap as f32,
        course_handicap,
        tee_name: "white".into(),
        slope_rating: 113,
        course_rating: 72.0,
        team_id: None,
    }
}
