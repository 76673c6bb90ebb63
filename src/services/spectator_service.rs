//! Read-only projections for observers: snapshots and the live leaderboard.
//! Spectators never mutate the round; everything here derives from the
//! latest document under a read lock.

use uuid::Uuid;

use crate::{
    dto::round::{LeaderboardEntry, LeaderboardResponse, LiveScoreSummary, RoundSnapshot},
    error::ServiceError,
    scoring::format::ScoringFormat,
    services::round_service::build_snapshot,
    state::{SharedState, round::Round},
};

/// Current full snapshot of a live round.
pub async fn get_snapshot(
    state: &SharedState,
    round_id: Uuid,
) -> Result<RoundSnapshot, ServiceError> {
    let handle = state.round(round_id)?;
    Ok(build_snapshot(&handle).await)
}

/// Rank players by the round's format: points descending for Stableford,
/// net ascending otherwise. Ties share a rank.
pub async fn get_leaderboard(
    state: &SharedState,
    round_id: Uuid,
) -> Result<LeaderboardResponse, ServiceError> {
    let handle = state.round(round_id)?;
    let round = handle.round().read().await;
    Ok(build_leaderboard(&round))
}

fn build_leaderboard(round: &Round) -> LeaderboardResponse {
    let mut ranked: Vec<(i64, LeaderboardEntry)> = round
        .live_scores
        .iter()
        .map(|(&player_id, entry)| {
            let slot = round.slot(player_id);
            let display_name = slot
                .map(|slot| slot.display_name.clone())
                .unwrap_or_else(|| player_id.to_string());
            let team_name = slot
                .and_then(|slot| slot.team_id)
                .and_then(|team_id| round.teams.iter().find(|team| team.id == team_id))
                .map(|team| team.name.clone());

            let key = ranking_key(round.format, entry);
            (
                key,
                LeaderboardEntry {
                    position: 0,
                    display_name,
                    team_name,
                    score: LiveScoreSummary::new(player_id, entry),
                },
            )
        })
        .collect();

    ranked.sort_by_key(|(key, _)| *key);

    let mut entries = Vec::with_capacity(ranked.len());
    let mut previous_key = None;
    let mut position = 0;
    for (index, (key, mut entry)) in ranked.into_iter().enumerate() {
        if previous_key != Some(key) {
            position = index + 1;
            previous_key = Some(key);
        }
        entry.position = position;
        entries.push(entry);
    }

    LeaderboardResponse {
        round_id: round.id,
        format: round.format,
        entries,
    }
}

/// Lower is better. Stableford inverts its points; team formats rank on the
/// shared team net so teammates sit together.
fn ranking_key(format: ScoringFormat, entry: &crate::state::round::LiveScoreEntry) -> i64 {
    match format {
        ScoringFormat::Stableford => -i64::from(entry.stableford_points.unwrap_or(0)),
        ScoringFormat::BetterBall | ScoringFormat::Aggregate => {
            i64::from(entry.team_net.unwrap_or(entry.current_net))
        }
        ScoringFormat::StrokePlay => i64::from(entry.current_net),
    }
}
