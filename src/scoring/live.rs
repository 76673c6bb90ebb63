//! Recomputation of the derived `live_scores` block from raw hole data.
//!
//! Everything here is pure over the Round document: partial rounds produce
//! well-defined partial scores over completed holes only, and nothing is
//! ever averaged over missing holes.

use indexmap::IndexMap;
use uuid::Uuid;

use crate::scoring::format::{ScoringFormat, stableford_points};
use crate::scoring::handicap::strokes_received;
use crate::state::round::{HoleDetail, LiveScoreEntry, Round};

/// Gross and net result for one player on one hole.
struct HoleResult {
    gross: u32,
    net: i32,
    par: u8,
}

/// Derive the full `live_scores` map for a round, in player order.
pub fn compute_live_scores(round: &Round) -> IndexMap<Uuid, LiveScoreEntry> {
    let mut scores: IndexMap<Uuid, LiveScoreEntry> = round
        .players
        .iter()
        .map(|slot| (slot.player_id, individual_entry(round, slot.player_id)))
        .collect();

    if round.format.is_team() {
        for team in &round.teams {
            let (gross, net, to_par) = team_totals(round, &team.player_ids);
            for player_id in &team.player_ids {
                if let Some(entry) = scores.get_mut(player_id) {
                    entry.team_gross = Some(gross);
                    entry.team_net = Some(net);
                    entry.team_score_to_par = Some(to_par);
                }
            }
        }
    }

    scores
}

/// Accumulate one player's result over a contiguous stretch of the playing
/// order, 0-based and clamped to the round's length. Front nine is
/// `score_over_range(round, id, 0, 9)`, back nine `(round, id, 9, 9)`.
/// Subtotals are true sums over the range's completed holes, never an
/// approximation from round totals.
pub fn score_over_range(
    round: &Round,
    player_id: Uuid,
    start: usize,
    len: usize,
) -> LiveScoreEntry {
    let end = start.saturating_add(len).min(round.hole_details.len());
    let details = round.hole_details.get(start..end).unwrap_or(&[]);
    accumulate(round, player_id, details)
}

/// Per-player accumulation over completed holes, walked in playing order.
fn individual_entry(round: &Round, player_id: Uuid) -> LiveScoreEntry {
    accumulate(round, player_id, &round.hole_details)
}

fn accumulate(round: &Round, player_id: Uuid, details: &[HoleDetail]) -> LiveScoreEntry {
    let mut entry = LiveScoreEntry::default();
    let mut points = 0;
    let mut streak_alive = true;

    for detail in details {
        let Some(result) = hole_result(round, player_id, detail) else {
            streak_alive = false;
            continue;
        };

        entry.holes_completed += 1;
        entry.current_gross += result.gross;
        entry.current_net += result.net;
        entry.score_to_par += result.gross as i32 - i32::from(result.par);
        if streak_alive {
            entry.thru += 1;
        }
        points += stableford_points(result.net - i32::from(result.par));
    }

    if round.format == ScoringFormat::Stableford {
        entry.stableford_points = Some(points);
    }
    entry
}

/// Hole-by-hole team combination. Better-ball counts a hole as soon as one
/// teammate has an entry and takes the best net; aggregate counts a hole
/// only when every teammate has an entry so the sum is well-defined.
fn team_totals(round: &Round, player_ids: &[Uuid]) -> (u32, i32, i32) {
    let mut gross = 0u32;
    let mut net = 0i32;
    let mut to_par = 0i32;

    for detail in &round.hole_details {
        let results: Vec<HoleResult> = player_ids
            .iter()
            .filter_map(|&player_id| hole_result(round, player_id, detail))
            .collect();

        match round.format {
            ScoringFormat::BetterBall => {
                if let Some(best) = results.iter().min_by_key(|result| result.net) {
                    gross += best.gross;
                    net += best.net;
                    to_par += best.net - i32::from(detail.par);
                }
            }
            ScoringFormat::Aggregate => {
                if results.len() == player_ids.len() && !results.is_empty() {
                    for result in &results {
                        gross += result.gross;
                        net += result.net;
                        to_par += result.net - i32::from(detail.par);
                    }
                }
            }
            ScoringFormat::StrokePlay | ScoringFormat::Stableford => {}
        }
    }

    (gross, net, to_par)
}

fn hole_result(round: &Round, player_id: Uuid, detail: &HoleDetail) -> Option<HoleResult> {
    let entry = round.hole_data.get(&detail.hole)?.get(&player_id)?;
    let slot = round.slot(player_id)?;
    let received = strokes_received(detail.stroke_index, slot.course_handicap, round.hole_count);
    let gross = u32::from(entry.strokes);
    Some(HoleResult {
        gross,
        net: gross as i32 - received,
        par: detail.par,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::time::SystemTime;

    use super::*;
    use crate::state::round::{
        HoleEntry, PlayerSlot, Privacy, Round, RoundStatus, StatPromptState, Team,
    };

    fn slot(player_id: Uuid, course_handicap: i32, team_id: Option<Uuid>) -> PlayerSlot {
        PlayerSlot {
            player_id,
            display_name: format!("player-{course_handicap}"),
            avatar: None,
            is_ghost: false,
            is_marker: false,
            handicap_index: course_handicap as f32,
            course_handicap,
            tee_name: "white".into(),
            slope_rating: 113,
            course_rating: 72.0,
            team_id,
        }
    }

    fn round_fixture(
        hole_count: u8,
        format: ScoringFormat,
        players: Vec<PlayerSlot>,
        teams: Vec<Team>,
    ) -> Round {
        let marker_id = players[0].player_id;
        let hole_details = (1..=hole_count)
            .map(|hole| HoleDetail {
                hole,
                par: 4,
                yardage: None,
                stroke_index: hole,
            })
            .collect();
        Round {
            id: Uuid::new_v4(),
            status: RoundStatus::Live,
            marker_id,
            course_id: "course-1".into(),
            course_name: "Test Links".into(),
            hole_count,
            format,
            playing_order: (1..=hole_count).collect(),
            hole_details,
            players,
            teams,
            current_hole: 1,
            hole_data: BTreeMap::new(),
            live_scores: IndexMap::new(),
            transfer_request: None,
            stat_prompts: StatPromptState::new(false),
            privacy: Privacy::Public,
            round_type: "casual".into(),
            started_at: SystemTime::now(),
            completed_at: None,
            abandoned_at: None,
            abandoned_by: None,
        }
    }

    fn record(round: &mut Round, hole: u8, player_id: Uuid, strokes: u8) {
        round
            .hole_data
            .entry(hole)
            .or_default()
            .insert(player_id, HoleEntry::with_strokes(strokes));
    }

    #[test]
    fn net_equals_gross_minus_strokes_received() {
        // 18-hole stroke play, handicaps 0 and 18: the 18 player nets one
        // stroke everywhere, so a 5 on the stroke-index-9 par 4 nets 4.
        let scratch = Uuid::new_v4();
        let eighteen = Uuid::new_v4();
        let mut round = round_fixture(
            18,
            ScoringFormat::StrokePlay,
            vec![slot(scratch, 0, None), slot(eighteen, 18, None)],
            vec![],
        );
        record(&mut round, 9, scratch, 5);
        record(&mut round, 9, eighteen, 5);

        let scores = compute_live_scores(&round);
        assert_eq!(scores[&scratch].current_net, 5);
        assert_eq!(scores[&eighteen].current_net, 4);
        assert_eq!(scores[&eighteen].current_gross, 5);
        assert_eq!(scores[&eighteen].stableford_points, None);
    }

    #[test]
    fn net_total_is_sum_of_per_hole_nets() {
        let player = Uuid::new_v4();
        let mut round = round_fixture(18, ScoringFormat::StrokePlay, vec![slot(player, 7, None)], vec![]);
        for hole in 1..=18 {
            record(&mut round, hole, player, 5);
        }

        let scores = compute_live_scores(&round);
        let expected_received: i32 = (1..=18).map(|si| strokes_received(si, 7, 18)).sum();
        assert_eq!(expected_received, 7);
        assert_eq!(scores[&player].current_gross, 90);
        assert_eq!(scores[&player].current_net, 90 - 7);
        assert_eq!(scores[&player].holes_completed, 18);
        assert_eq!(scores[&player].thru, 18);
    }

    #[test]
    fn stableford_nine_hole_scenario() {
        // Net-to-par sequence [0,-1,+2,-1,0,+1,-2,0,+3] scores
        // 2+3+0+3+2+1+4+2+0 = 17 points.
        let player = Uuid::new_v4();
        let mut round = round_fixture(9, ScoringFormat::Stableford, vec![slot(player, 0, None)], vec![]);
        let diffs = [0i32, -1, 2, -1, 0, 1, -2, 0, 3];
        for (index, diff) in diffs.iter().enumerate() {
            let strokes = (4 + diff) as u8;
            record(&mut round, index as u8 + 1, player, strokes);
        }

        let scores = compute_live_scores(&round);
        assert_eq!(scores[&player].stableford_points, Some(17));
        assert_eq!(scores[&player].holes_completed, 9);
    }

    #[test]
    fn partial_round_scores_completed_holes_only() {
        let player = Uuid::new_v4();
        let mut round = round_fixture(18, ScoringFormat::StrokePlay, vec![slot(player, 0, None)], vec![]);
        record(&mut round, 1, player, 4);
        record(&mut round, 2, player, 6);
        record(&mut round, 5, player, 3);

        let scores = compute_live_scores(&round);
        let entry = &scores[&player];
        assert_eq!(entry.holes_completed, 3);
        assert_eq!(entry.current_gross, 13);
        assert_eq!(entry.score_to_par, 1);
        // Thru stops at the first gap even though hole 5 is scored.
        assert_eq!(entry.thru, 2);
    }

    #[test]
    fn thru_respects_playing_order() {
        // Back-nine start: holes 10..18 then 1..9.
        let player = Uuid::new_v4();
        let mut round = round_fixture(18, ScoringFormat::StrokePlay, vec![slot(player, 0, None)], vec![]);
        let order: Vec<u8> = (10..=18).chain(1..=9).collect();
        round.playing_order = order.clone();
        round.hole_details = order
            .iter()
            .map(|&hole| HoleDetail {
                hole,
                par: 4,
                yardage: None,
                stroke_index: hole,
            })
            .collect();
        record(&mut round, 10, player, 4);
        record(&mut round, 11, player, 4);

        let scores = compute_live_scores(&round);
        assert_eq!(scores[&player].thru, 2);
    }

    #[test]
    fn better_ball_takes_best_net_per_hole() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let team_id = Uuid::new_v4();
        let team = Team {
            id: team_id,
            name: "pair".into(),
            player_ids: vec![a, b],
        };
        let mut round = round_fixture(
            9,
            ScoringFormat::BetterBall,
            vec![slot(a, 0, Some(team_id)), slot(b, 0, Some(team_id))],
            vec![team],
        );
        // Hole 1: a=4, b=6 -> 4 counts. Hole 2: only b has an entry -> 5 counts.
        record(&mut round, 1, a, 4);
        record(&mut round, 1, b, 6);
        record(&mut round, 2, b, 5);

        let scores = compute_live_scores(&round);
        assert_eq!(scores[&a].team_net, Some(9));
        assert_eq!(scores[&a].team_gross, Some(9));
        assert_eq!(scores[&a].team_score_to_par, Some(1));
        assert_eq!(scores[&b].team_net, Some(9));
        // Individual accumulations stay per player.
        assert_eq!(scores[&a].current_gross, 4);
        assert_eq!(scores[&b].current_gross, 11);
    }

    #[test]
    fn aggregate_counts_hole_only_when_every_teammate_scored() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let team_id = Uuid::new_v4();
        let team = Team {
            id: team_id,
            name: "pair".into(),
            player_ids: vec![a, b],
        };
        let mut round = round_fixture(
            9,
            ScoringFormat::Aggregate,
            vec![slot(a, 0, Some(team_id)), slot(b, 0, Some(team_id))],
            vec![team],
        );
        record(&mut round, 1, a, 4);
        record(&mut round, 1, b, 5);
        // Hole 2 has only one entry and must not count.
        record(&mut round, 2, a, 3);

        let scores = compute_live_scores(&round);
        assert_eq!(scores[&a].team_gross, Some(9));
        assert_eq!(scores[&a].team_net, Some(9));
        assert_eq!(scores[&a].team_score_to_par, Some(1));
    }

    #[test]
    fn range_subtotals_cover_only_their_stretch() {
        let player = Uuid::new_v4();
        let mut round = round_fixture(18, ScoringFormat::StrokePlay, vec![slot(player, 0, None)], vec![]);
        for hole in 1..=18 {
            let strokes = if hole <= 9 { 4 } else { 5 };
            record(&mut round, hole, player, strokes);
        }

        let front = score_over_range(&round, player, 0, 9);
        assert_eq!(front.current_gross, 36);
        assert_eq!(front.score_to_par, 0);
        assert_eq!(front.holes_completed, 9);

        let back = score_over_range(&round, player, 9, 9);
        assert_eq!(back.current_gross, 45);
        assert_eq!(back.score_to_par, 9);

        // A range beyond the card is empty, not an error.
        let overflow = score_over_range(&round, player, 18, 9);
        assert_eq!(overflow.holes_completed, 0);
    }

    #[test]
    fn individual_formats_leave_team_fields_absent() {
        let player = Uuid::new_v4();
        let mut round = round_fixture(9, ScoringFormat::StrokePlay, vec![slot(player, 0, None)], vec![]);
        record(&mut round, 1, player, 4);
        let scores = compute_live_scores(&round);
        assert_eq!(scores[&player].team_gross, None);
        assert_eq!(scores[&player].team_net, None);
        assert_eq!(scores[&player].stableford_points, None);
    }
}
