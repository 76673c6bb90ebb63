//! The Round aggregate: one collaborative scoring session and everything the
//! marker is allowed to mutate on it.

use std::collections::BTreeMap;
use std::time::{Duration, SystemTime};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::dao::models::{
    HoleDetailEntity, HoleEntryRecordEntity, HoleRecordEntity, PlayerSlotEntity, RoundEntity,
    StatPromptEntity, TeamEntity, TransferRequestEntity,
};
use crate::scoring::format::ScoringFormat;
use crate::scoring::live::compute_live_scores;

/// Lifecycle status of a round. Monotonic: `Complete` and `Abandoned` are
/// terminal and freeze the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RoundStatus {
    /// Scoring in progress.
    Live,
    /// Every hole holed out and the marker confirmed the card.
    Complete,
    /// The marker walked off; scores are not final.
    Abandoned,
}

/// Visibility scope enforced by the surrounding read-authorization layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Privacy {
    /// Anyone may observe the round.
    Public,
    /// Only playing partners may observe.
    Partners,
    /// Only the players themselves.
    Private,
}

/// Tri-state per-hole statistic (fairway or green in regulation).
///
/// Modelled as an explicit three-value cycle rather than a nullable boolean
/// so the toggle logic stays exhaustive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum StatToggle {
    /// Not recorded (or explicitly skipped).
    #[default]
    Unset,
    /// Statistic achieved.
    Hit,
    /// Statistic missed.
    Missed,
}

impl StatToggle {
    /// Advance the toggle one step: unset, hit, missed, unset.
    pub fn cycle(self) -> Self {
        match self {
            StatToggle::Unset => StatToggle::Hit,
            StatToggle::Hit => StatToggle::Missed,
            StatToggle::Missed => StatToggle::Unset,
        }
    }
}

/// Par, yardage and difficulty rank for one hole, listed in playing order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoleDetail {
    /// Actual hole number on the course (1..=hole_count).
    pub hole: u8,
    /// Par for the hole.
    pub par: u8,
    /// Yardage from the round's tee, when known.
    pub yardage: Option<u16>,
    /// Difficulty rank used for handicap allocation (1 = hardest).
    pub stroke_index: u8,
}

/// One participant's identity and frozen handicap context for this round.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSlot {
    /// Platform user id, or a generated id for ghost players.
    pub player_id: Uuid,
    /// Name shown on the scorecard.
    pub display_name: String,
    /// Optional avatar URL.
    pub avatar: Option<String>,
    /// Whether this participant has no platform account.
    pub is_ghost: bool,
    /// Cache of `marker_id == player_id`, re-stamped on every transfer.
    pub is_marker: bool,
    /// Handicap index carried into the round.
    pub handicap_index: f32,
    /// Course handicap computed once at creation; never recomputed mid-round.
    pub course_handicap: i32,
    /// Tee the player is playing from.
    pub tee_name: String,
    /// Slope rating of that tee.
    pub slope_rating: u16,
    /// Course rating of that tee.
    pub course_rating: f32,
    /// Team membership for team formats.
    pub team_id: Option<Uuid>,
}

/// A team grouping for team formats.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Team {
    /// Stable identifier for the team.
    pub id: Uuid,
    /// Display name for the team.
    pub name: String,
    /// Members, referencing `Round::players`.
    pub player_ids: Vec<Uuid>,
}

/// One player's recorded result for one hole.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoleEntry {
    /// Strokes taken, always in `[1, 15]` once present.
    pub strokes: u8,
    /// Fairway in regulation; meaningless on par 3s.
    pub fir: StatToggle,
    /// Green in regulation.
    pub gir: StatToggle,
    /// Distance to pin in centimetres, par-3 holes only.
    pub dtp: Option<u32>,
}

impl HoleEntry {
    /// Fresh entry holding only a stroke count.
    pub fn with_strokes(strokes: u8) -> Self {
        Self {
            strokes,
            fir: StatToggle::Unset,
            gir: StatToggle::Unset,
            dtp: None,
        }
    }
}

/// Fully derived live score for one player; recomputed after every write and
/// never hand-edited. Format-specific fields are `None` when the round's
/// format does not produce them, so consumers can tell "not applicable" from
/// "zero".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LiveScoreEntry {
    /// Holes with a recorded stroke count.
    pub holes_completed: u8,
    /// Gross strokes over completed holes.
    pub current_gross: u32,
    /// Net strokes (gross minus handicap strokes received) over completed holes.
    pub current_net: i32,
    /// Gross strokes relative to par over completed holes.
    pub score_to_par: i32,
    /// Consecutive holes finished from the round's starting hole.
    pub thru: u8,
    /// Stableford points; populated for points formats only.
    pub stableford_points: Option<i32>,
    /// Team gross over counted holes; team formats only.
    pub team_gross: Option<u32>,
    /// Team net over counted holes; team formats only.
    pub team_net: Option<i32>,
    /// Team net relative to par over counted holes; team formats only.
    pub team_score_to_par: Option<i32>,
}

/// Resolution state of a marker-transfer request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TransferStatus {
    /// Waiting on the current marker.
    Pending,
    /// Granted; the requester is now the marker.
    Approved,
    /// Refused, or lapsed past its expiry.
    Declined,
}

/// An in-flight request to take over scorekeeping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    /// Player asking to become the marker.
    pub requested_by: Uuid,
    /// Display name of the requester, denormalised for observers.
    pub requested_by_name: String,
    /// When the request was filed.
    pub requested_at: SystemTime,
    /// Current resolution state.
    pub status: TransferStatus,
    /// Instant after which an unresolved request counts as declined.
    pub expires_at: SystemTime,
}

impl TransferRequest {
    /// File a new pending request expiring after `ttl`.
    pub fn pending(requested_by: Uuid, requested_by_name: String, ttl: Duration) -> Self {
        let now = SystemTime::now();
        Self {
            requested_by,
            requested_by_name,
            requested_at: now,
            status: TransferStatus::Pending,
            expires_at: now + ttl,
        }
    }

    /// Whether the request has lapsed at `now`.
    pub fn is_expired(&self, now: SystemTime) -> bool {
        now >= self.expires_at
    }
}

/// Stat-collection prompting state for the round.
///
/// Suppression is a UX throttle only; it never affects score computation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatPromptState {
    /// Whether the round collects stats at all.
    pub enabled: bool,
    /// Consecutive times the marker skipped the prompt.
    pub consecutive_skips: u8,
    /// Set once skips reach the configured threshold.
    pub suppressed: bool,
}

impl StatPromptState {
    /// Initial prompting state for a new round.
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            consecutive_skips: 0,
            suppressed: false,
        }
    }

    /// Whether the machine should enter stat collection after a hole completes.
    pub fn active(&self) -> bool {
        self.enabled && !self.suppressed
    }

    /// Register an explicit skip; returns true when this skip crossed the
    /// suppression threshold.
    pub fn record_skip(&mut self, threshold: u8) -> bool {
        self.consecutive_skips = self.consecutive_skips.saturating_add(1);
        if !self.suppressed && self.consecutive_skips >= threshold {
            self.suppressed = true;
            return true;
        }
        false
    }

    /// Stats were supplied; the skip streak resets.
    pub fn record_collected(&mut self) {
        self.consecutive_skips = 0;
    }

    /// Re-enable prompting after suppression.
    pub fn re_enable(&mut self) {
        self.suppressed = false;
        self.consecutive_skips = 0;
    }
}

/// Aggregate root for one scoring session.
#[derive(Debug, Clone, PartialEq)]
pub struct Round {
    /// Primary key of the round.
    pub id: Uuid,
    /// Lifecycle status.
    pub status: RoundStatus,
    /// The single participant currently authorized to write scores.
    pub marker_id: Uuid,
    /// Course identifier from the (external) course catalogue.
    pub course_id: String,
    /// Course display name, denormalised for observers.
    pub course_name: String,
    /// 9 or 18.
    pub hole_count: u8,
    /// Scoring format, parsed at creation.
    pub format: ScoringFormat,
    /// Hole numbers in the order they are played (supports shotgun starts).
    pub playing_order: Vec<u8>,
    /// Par/yardage/stroke-index per hole, aligned with `playing_order`.
    pub hole_details: Vec<HoleDetail>,
    /// Participants, frozen at creation.
    pub players: Vec<PlayerSlot>,
    /// Team groupings; empty for individual formats.
    pub teams: Vec<Team>,
    /// 1-based position in `playing_order` the marker is entering;
    /// `hole_count + 1` is the all-holes-entered sentinel.
    pub current_hole: u8,
    /// Sparse per-hole results keyed by actual hole number, then player.
    pub hole_data: BTreeMap<u8, IndexMap<Uuid, HoleEntry>>,
    /// Derived scores, recomputed on every write.
    pub live_scores: IndexMap<Uuid, LiveScoreEntry>,
    /// At most one in-flight marker handoff.
    pub transfer_request: Option<TransferRequest>,
    /// Stat-collection prompting state.
    pub stat_prompts: StatPromptState,
    /// Visibility scope.
    pub privacy: Privacy,
    /// Free-form round category from setup (casual, competition, ...).
    pub round_type: String,
    /// When scoring began.
    pub started_at: SystemTime,
    /// When the card was confirmed, for completed rounds.
    pub completed_at: Option<SystemTime>,
    /// When the round was abandoned, if it was.
    pub abandoned_at: Option<SystemTime>,
    /// Who abandoned it.
    pub abandoned_by: Option<Uuid>,
}

impl Round {
    /// Look up a participant slot.
    pub fn slot(&self, player_id: Uuid) -> Option<&PlayerSlot> {
        self.players.iter().find(|slot| slot.player_id == player_id)
    }

    /// Whether `player_id` is the current marker.
    pub fn is_marker(&self, player_id: Uuid) -> bool {
        self.marker_id == player_id
    }

    /// Reassign the marker and re-stamp every slot's cached flag.
    pub fn assign_marker(&mut self, new_marker: Uuid) {
        self.marker_id = new_marker;
        for slot in &mut self.players {
            slot.is_marker = slot.player_id == new_marker;
        }
    }

    /// Hole number currently being entered, or `None` at the sentinel.
    pub fn current_hole_number(&self) -> Option<u8> {
        self.playing_order
            .get(usize::from(self.current_hole).checked_sub(1)?)
            .copied()
    }

    /// Detail record for an actual hole number.
    pub fn hole_detail(&self, hole: u8) -> Option<&HoleDetail> {
        self.hole_details.iter().find(|detail| detail.hole == hole)
    }

    /// Total par over every hole of the round.
    pub fn par_total(&self) -> u16 {
        self.hole_details
            .iter()
            .map(|detail| u16::from(detail.par))
            .sum()
    }

    /// Hole-complete predicate: every player has a stroke entry for `hole`.
    pub fn hole_complete(&self, hole: u8) -> bool {
        let Some(entries) = self.hole_data.get(&hole) else {
            return false;
        };
        self.players
            .iter()
            .all(|slot| entries.contains_key(&slot.player_id))
    }

    /// First `(hole, player)` missing a stroke entry, scanning holes in
    /// playing order and players in scorecard order. `None` means the card
    /// is full.
    pub fn first_missing_entry(&self) -> Option<(u8, Uuid)> {
        for &hole in &self.playing_order {
            let entries = self.hole_data.get(&hole);
            for slot in &self.players {
                let present = entries
                    .map(|map| map.contains_key(&slot.player_id))
                    .unwrap_or(false);
                if !present {
                    return Some((hole, slot.player_id));
                }
            }
        }
        None
    }

    /// Drop a pending transfer request that has lapsed. Expiry counts as a
    /// decline and needs no marker action; returns true when one was pruned.
    pub fn prune_expired_transfer(&mut self, now: SystemTime) -> bool {
        match &self.transfer_request {
            Some(request)
                if request.status == TransferStatus::Pending && request.is_expired(now) =>
            {
                self.transfer_request = None;
                true
            }
            _ => false,
        }
    }

    /// Recompute the derived `live_scores` block from `hole_data`.
    pub fn refresh_live_scores(&mut self) {
        self.live_scores = compute_live_scores(self);
    }
}

impl From<Round> for RoundEntity {
    fn from(value: Round) -> Self {
        Self {
            id: value.id,
            status: value.status,
            marker_id: value.marker_id,
            course_id: value.course_id,
            course_name: value.course_name,
            hole_count: value.hole_count,
            format: value.format,
            playing_order: value.playing_order,
            hole_details: value.hole_details.into_iter().map(Into::into).collect(),
            players: value.players.into_iter().map(Into::into).collect(),
            teams: value.teams.into_iter().map(Into::into).collect(),
            current_hole: value.current_hole,
            hole_data: value
                .hole_data
                .into_iter()
                .map(|(hole, entries)| HoleRecordEntity {
                    hole,
                    entries: entries
                        .into_iter()
                        .map(|(player_id, entry)| HoleEntryRecordEntity {
                            player_id,
                            strokes: entry.strokes,
                            fir: entry.fir,
                            gir: entry.gir,
                            dtp: entry.dtp,
                        })
                        .collect(),
                })
                .collect(),
            transfer_request: value.transfer_request.map(Into::into),
            stat_prompts: value.stat_prompts.into(),
            privacy: value.privacy,
            round_type: value.round_type,
            started_at: value.started_at,
            completed_at: value.completed_at,
            abandoned_at: value.abandoned_at,
            abandoned_by: value.abandoned_by,
        }
    }
}

impl From<RoundEntity> for Round {
    fn from(value: RoundEntity) -> Self {
        let mut round = Self {
            id: value.id,
            status: value.status,
            marker_id: value.marker_id,
            course_id: value.course_id,
            course_name: value.course_name,
            hole_count: value.hole_count,
            format: value.format,
            playing_order: value.playing_order,
            hole_details: value.hole_details.into_iter().map(Into::into).collect(),
            players: value.players.into_iter().map(Into::into).collect(),
            teams: value.teams.into_iter().map(Into::into).collect(),
            current_hole: value.current_hole,
            hole_data: value
                .hole_data
                .into_iter()
                .map(|record| {
                    let entries = record
                        .entries
                        .into_iter()
                        .map(|entry| {
                            (
                                entry.player_id,
                                HoleEntry {
                                    strokes: entry.strokes,
                                    fir: entry.fir,
                                    gir: entry.gir,
                                    dtp: entry.dtp,
                                },
                            )
                        })
                        .collect();
                    (record.hole, entries)
                })
                .collect(),
            live_scores: IndexMap::new(),
            transfer_request: value.transfer_request.map(Into::into),
            stat_prompts: value.stat_prompts.into(),
            privacy: value.privacy,
            round_type: value.round_type,
            started_at: value.started_at,
            completed_at: value.completed_at,
            abandoned_at: value.abandoned_at,
            abandoned_by: value.abandoned_by,
        };
        // Derived state is never trusted from storage.
        round.refresh_live_scores();
        round
    }
}

impl From<HoleDetail> for HoleDetailEntity {
    fn from(value: HoleDetail) -> Self {
        Self {
            hole: value.hole,
            par: value.par,
            yardage: value.yardage,
            stroke_index: value.stroke_index,
        }
    }
}

impl From<HoleDetailEntity> for HoleDetail {
    fn from(value: HoleDetailEntity) -> Self {
        Self {
            hole: value.hole,
            par: value.par,
            yardage: value.yardage,
            stroke_index: value.stroke_index,
        }
    }
}

impl From<PlayerSlot> for PlayerSlotEntity {
    fn from(value: PlayerSlot) -> Self {
        Self {
            player_id: value.player_id,
            display_name: value.display_name,
            avatar: value.avatar,
            is_ghost: value.is_ghost,
            is_marker: value.is_marker,
            handicap_index: value.handicap_index,
            course_handicap: value.course_handicap,
            tee_name: value.tee_name,
            slope_rating: value.slope_rating,
            course_rating: value.course_rating,
            team_id: value.team_id,
        }
    }
}

impl From<PlayerSlotEntity> for PlayerSlot {
    fn from(value: PlayerSlotEntity) -> Self {
        Self {
            player_id: value.player_id,
            display_name: value.display_name,
            avatar: value.avatar,
            is_ghost: value.is_ghost,
            is_marker: value.is_marker,
            handicap_index: value.handicap_index,
            course_handicap: value.course_handicap,
            tee_name: value.tee_name,
            slope_rating: value.slope_rating,
            course_rating: value.course_rating,
            team_id: value.team_id,
        }
    }
}

impl From<Team> for TeamEntity {
    fn from(value: Team) -> Self {
        Self {
            id: value.id,
            name: value.name,
            player_ids: value.player_ids,
        }
    }
}

impl From<TeamEntity> for Team {
    fn from(value: TeamEntity) -> Self {
        Self {
            id: value.id,
            name: value.name,
            player_ids: value.player_ids,
        }
    }
}

impl From<TransferRequest> for TransferRequestEntity {
    fn from(value: TransferRequest) -> Self {
        Self {
            requested_by: value.requested_by,
            requested_by_name: value.requested_by_name,
            requested_at: value.requested_at,
            status: value.status,
            expires_at: value.expires_at,
        }
    }
}

impl From<TransferRequestEntity> for TransferRequest {
    fn from(value: TransferRequestEntity) -> Self {
        Self {
            requested_by: value.requested_by,
            requested_by_name: value.requested_by_name,
            requested_at: value.requested_at,
            status: value.status,
            expires_at: value.expires_at,
        }
    }
}

impl From<StatPromptState> for StatPromptEntity {
    fn from(value: StatPromptState) -> Self {
        Self {
            enabled: value.enabled,
            consecutive_skips: value.consecutive_skips,
            suppressed: value.suppressed,
        }
    }
}

impl From<StatPromptEntity> for StatPromptState {
    fn from(value: StatPromptEntity) -> Self {
        Self {
            enabled: value.enabled,
            consecutive_skips: value.consecutive_skips,
            suppressed: value.suppressed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stat_toggle_cycle_is_exhaustive() {
        assert_eq!(StatToggle::Unset.cycle(), StatToggle::Hit);
        assert_eq!(StatToggle::Hit.cycle(), StatToggle::Missed);
        assert_eq!(StatToggle::Missed.cycle(), StatToggle::Unset);
        // Three applications always return to the starting point.
        for start in [StatToggle::Unset, StatToggle::Hit, StatToggle::Missed] {
            assert_eq!(start.cycle().cycle().cycle(), start);
        }
    }

    #[test]
    fn skip_streak_suppresses_at_threshold() {
        let mut prompts = StatPromptState::new(true);
        assert!(!prompts.record_skip(3));
        assert!(!prompts.record_skip(3));
        assert!(prompts.record_skip(3));
        assert!(prompts.suppressed);
        assert!(!prompts.active());

        prompts.re_enable();
        assert!(prompts.active());
        assert_eq!(prompts.consecutive_skips, 0);
    }

    #[test]
    fn collected_stats_reset_the_streak() {
        let mut prompts = StatPromptState::new(true);
        prompts.record_skip(3);
        prompts.record_skip(3);
        prompts.record_collected();
        assert!(!prompts.record_skip(3));
        assert!(!prompts.suppressed);
    }
}
