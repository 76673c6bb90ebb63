use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::{
    dao::models::RoundListItemEntity,
    dto::{
        common::RoundPhaseSnapshot,
        format_system_time,
        validation::{validate_display_name, validate_par, validate_slope},
    },
    scoring::format::ScoringFormat,
    state::{
        round::{
            HoleDetail, HoleEntry, LiveScoreEntry, PlayerSlot, Privacy, Round, StatPromptState,
            StatToggle, Team, TransferRequest,
        },
        state_machine::RoundPhase,
    },
};

/// Payload assembled by the external group-setup flow to start a round.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateRoundRequest {
    /// Course identifier from the course catalogue.
    pub course_id: String,
    /// Course display name.
    #[validate(custom(function = validate_display_name))]
    pub course_name: String,
    /// 9 or 18.
    pub hole_count: u8,
    /// Scoring format identifier (`stroke_play`, `stableford`, ...).
    pub format_id: String,
    /// Hole numbers in play order; omit for a standard hole-1 start.
    #[serde(default)]
    pub playing_order: Option<Vec<u8>>,
    /// Par/yardage/stroke-index per hole, in playing order.
    #[validate(nested)]
    pub hole_details: Vec<HoleDetailInput>,
    /// Participants in scorecard order.
    #[validate(nested)]
    pub players: Vec<PlayerSlotInput>,
    /// Team definitions for team formats.
    #[serde(default)]
    #[validate(nested)]
    pub teams: Vec<TeamInput>,
    /// Initial marker; defaults to the first non-ghost player.
    #[serde(default)]
    pub marker: Option<Uuid>,
    /// Visibility scope.
    pub privacy: Privacy,
    /// Free-form round category.
    #[serde(default = "default_round_type")]
    pub round_type: String,
    /// Whether the round collects per-hole stats.
    #[serde(default = "default_collect_stats")]
    pub collect_stats: bool,
}

fn default_round_type() -> String {
    "casual".into()
}

fn default_collect_stats() -> bool {
    true
}

/// Incoming hole description for the round bootstrap.
#[derive(Debug, Deserialize, ToSchema)]
pub struct HoleDetailInput {
    /// Actual hole number on the course.
    pub hole: u8,
    /// Par for the hole.
    pub par: u8,
    /// Yardage from the chosen tee.
    #[serde(default)]
    pub yardage: Option<u16>,
    /// Difficulty rank (1 = hardest).
    pub stroke_index: u8,
}

impl Validate for HoleDetailInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Err(err) = validate_par(self.par) {
            errors.add("par", err);
        }
        if self.hole == 0 {
            errors.add("hole", validator::ValidationError::new("hole_zero"));
        }
        if self.stroke_index == 0 {
            errors.add(
                "stroke_index",
                validator::ValidationError::new("stroke_index_zero"),
            );
        }
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Incoming participant definition for the round bootstrap.
#[derive(Debug, Deserialize, ToSchema)]
pub struct PlayerSlotInput {
    /// Platform user id; omit for ghost players (an id is generated).
    #[serde(default)]
    pub player_id: Option<Uuid>,
    /// Name shown on the scorecard.
    pub display_name: String,
    /// Optional avatar URL.
    #[serde(default)]
    pub avatar: Option<String>,
    /// Whether this participant has no platform account.
    #[serde(default)]
    pub is_ghost: bool,
    /// Handicap index carried into the round.
    pub handicap_index: f32,
    /// Tee the player plays from.
    pub tee_name: String,
    /// Slope rating of that tee.
    pub slope_rating: u16,
    /// Course rating of that tee.
    pub course_rating: f32,
    /// Index into the request's `teams` list, for team formats.
    #[serde(default)]
    pub team_index: Option<usize>,
}

impl Validate for PlayerSlotInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Err(err) = validate_display_name(&self.display_name) {
            errors.add("display_name", err);
        }
        if let Err(err) = validate_slope(self.slope_rating) {
            errors.add("slope_rating", err);
        }
        if !self.is_ghost && self.player_id.is_none() {
            let mut err = validator::ValidationError::new("player_id_missing");
            err.message = Some("Non-ghost players must carry a platform user id".into());
            errors.add("player_id", err);
        }
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Incoming team definition for team formats.
#[derive(Debug, Deserialize, ToSchema)]
pub struct TeamInput {
    /// Display name for the team.
    pub name: String,
}

impl Validate for TeamInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Err(err) = validate_display_name(&self.name) {
            errors.add("name", err);
        }
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Full round document as exposed to REST and SSE consumers.
///
/// `live_scores` is always derived from `hole_data` within the same
/// snapshot, so observers never see the two out of sync.
#[derive(Debug, Serialize, ToSchema)]
pub struct RoundSnapshot {
    /// Round id.
    pub id: Uuid,
    /// Lifecycle status.
    pub status: crate::state::round::RoundStatus,
    /// Hole-advance phase.
    pub phase: RoundPhaseSnapshot,
    /// Current marker.
    pub marker_id: Uuid,
    /// Course identifier.
    pub course_id: String,
    /// Course display name.
    pub course_name: String,
    /// 9 or 18.
    pub hole_count: u8,
    /// Scoring format identifier.
    pub format: ScoringFormat,
    /// Hole numbers in play order.
    pub playing_order: Vec<u8>,
    /// Hole details in playing order.
    pub hole_details: Vec<HoleDetailSummary>,
    /// Participants in scorecard order.
    pub players: Vec<PlayerSlotSummary>,
    /// Teams, empty for individual formats.
    pub teams: Vec<TeamSummary>,
    /// Playing-order position being entered (sentinel = hole_count + 1).
    pub current_hole: u8,
    /// Recorded hole results.
    pub hole_data: Vec<HoleDataSummary>,
    /// Derived live scores in scorecard order.
    pub live_scores: Vec<LiveScoreSummary>,
    /// Pending marker handoff, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transfer_request: Option<TransferRequestSummary>,
    /// Stat prompting state.
    pub stat_prompts: StatPromptSummary,
    /// Visibility scope.
    pub privacy: Privacy,
    /// Free-form round category.
    pub round_type: String,
    /// When scoring began (RFC 3339).
    pub started_at: String,
    /// When the card was confirmed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
    /// When the round was abandoned.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub abandoned_at: Option<String>,
    /// Who abandoned it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub abandoned_by: Option<Uuid>,
}

impl RoundSnapshot {
    /// Project a round document plus its machine phase into the wire shape.
    pub fn new(round: &Round, phase: RoundPhase) -> Self {
        Self {
            id: round.id,
            status: round.status,
            phase: phase.into(),
            marker_id: round.marker_id,
            course_id: round.course_id.clone(),
            course_name: round.course_name.clone(),
            hole_count: round.hole_count,
            format: round.format,
            playing_order: round.playing_order.clone(),
            hole_details: round.hole_details.iter().map(Into::into).collect(),
            players: round.players.iter().map(Into::into).collect(),
            teams: round.teams.iter().map(Into::into).collect(),
            current_hole: round.current_hole,
            hole_data: round
                .hole_data
                .iter()
                .map(|(&hole, entries)| HoleDataSummary {
                    hole,
                    entries: entries
                        .iter()
                        .map(|(&player_id, entry)| HoleEntrySummary::new(player_id, entry))
                        .collect(),
                })
                .collect(),
            live_scores: round
                .live_scores
                .iter()
                .map(|(&player_id, entry)| LiveScoreSummary::new(player_id, entry))
                .collect(),
            transfer_request: round.transfer_request.as_ref().map(Into::into),
            stat_prompts: (&round.stat_prompts).into(),
            privacy: round.privacy,
            round_type: round.round_type.clone(),
            started_at: format_system_time(round.started_at),
            completed_at: round.completed_at.map(format_system_time),
            abandoned_at: round.abandoned_at.map(format_system_time),
            abandoned_by: round.abandoned_by,
        }
    }
}

/// Hole description exposed to clients.
#[derive(Debug, Serialize, ToSchema)]
pub struct HoleDetailSummary {
    /// Actual hole number.
    pub hole: u8,
    /// Par for the hole.
    pub par: u8,
    /// Yardage, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yardage: Option<u16>,
    /// Difficulty rank (1 = hardest).
    pub stroke_index: u8,
}

impl From<&HoleDetail> for HoleDetailSummary {
    fn from(value: &HoleDetail) -> Self {
        Self {
            hole: value.hole,
            par: value.par,
            yardage: value.yardage,
            stroke_index: value.stroke_index,
        }
    }
}

/// Participant slot exposed to clients.
#[derive(Debug, Serialize, ToSchema)]
pub struct PlayerSlotSummary {
    /// Player id.
    pub player_id: Uuid,
    /// Name shown on the scorecard.
    pub display_name: String,
    /// Optional avatar URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    /// Whether this is a ghost participant.
    pub is_ghost: bool,
    /// Whether this player currently holds the marker role.
    pub is_marker: bool,
    /// Handicap index.
    pub handicap_index: f32,
    /// Frozen course handicap.
    pub course_handicap: i32,
    /// Tee name.
    pub tee_name: String,
    /// Slope rating of the tee.
    pub slope_rating: u16,
    /// Course rating of the tee.
    pub course_rating: f32,
    /// Team membership, for team formats.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_id: Option<Uuid>,
}

impl From<&PlayerSlot> for PlayerSlotSummary {
    fn from(value: &PlayerSlot) -> Self {
        Self {
            player_id: value.player_id,
            display_name: value.display_name.clone(),
            avatar: value.avatar.clone(),
            is_ghost: value.is_ghost,
            is_marker: value.is_marker,
            handicap_index: value.handicap_index,
            course_handicap: value.course_handicap,
            tee_name: value.tee_name.clone(),
            slope_rating: value.slope_rating,
            course_rating: value.course_rating,
            team_id: value.team_id,
        }
    }
}

/// Team exposed to clients.
#[derive(Debug, Serialize, ToSchema)]
pub struct TeamSummary {
    /// Team id.
    pub id: Uuid,
    /// Team display name.
    pub name: String,
    /// Member player ids.
    pub player_ids: Vec<Uuid>,
}

impl From<&Team> for TeamSummary {
    fn from(value: &Team) -> Self {
        Self {
            id: value.id,
            name: value.name.clone(),
            player_ids: value.player_ids.clone(),
        }
    }
}

/// One player's entry on one hole, as exposed to clients.
#[derive(Debug, Serialize, ToSchema)]
pub struct HoleEntrySummary {
    /// Player the entry belongs to.
    pub player_id: Uuid,
    /// Strokes taken.
    pub strokes: u8,
    /// Fairway in regulation.
    pub fir: StatToggle,
    /// Green in regulation.
    pub gir: StatToggle,
    /// Distance to pin, par-3 holes only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dtp: Option<u32>,
}

impl HoleEntrySummary {
    fn new(player_id: Uuid, entry: &HoleEntry) -> Self {
        Self {
            player_id,
            strokes: entry.strokes,
            fir: entry.fir,
            gir: entry.gir,
            dtp: entry.dtp,
        }
    }
}

/// All entries for one hole.
#[derive(Debug, Serialize, ToSchema)]
pub struct HoleDataSummary {
    /// Actual hole number.
    pub hole: u8,
    /// Entries in scorecard order.
    pub entries: Vec<HoleEntrySummary>,
}

/// Derived live score for one player.
#[derive(Debug, Serialize, ToSchema)]
pub struct LiveScoreSummary {
    /// Player the entry belongs to.
    pub player_id: Uuid,
    /// Holes with a recorded stroke count.
    pub holes_completed: u8,
    /// Gross strokes over completed holes.
    pub current_gross: u32,
    /// Net strokes over completed holes.
    pub current_net: i32,
    /// Gross relative to par over completed holes.
    pub score_to_par: i32,
    /// Consecutive holes finished from the starting hole.
    pub thru: u8,
    /// Stableford points, points formats only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stableford_points: Option<i32>,
    /// Team gross, team formats only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_gross: Option<u32>,
    /// Team net, team formats only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_net: Option<i32>,
    /// Team net relative to par, team formats only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_score_to_par: Option<i32>,
}

impl LiveScoreSummary {
    /// Attach a player id to a derived score entry.
    pub fn new(player_id: Uuid, entry: &LiveScoreEntry) -> Self {
        Self {
            player_id,
            holes_completed: entry.holes_completed,
            current_gross: entry.current_gross,
            current_net: entry.current_net,
            score_to_par: entry.score_to_par,
            thru: entry.thru,
            stableford_points: entry.stableford_points,
            team_gross: entry.team_gross,
            team_net: entry.team_net,
            team_score_to_par: entry.team_score_to_par,
        }
    }
}

/// Pending marker handoff exposed to clients.
#[derive(Debug, Serialize, ToSchema)]
pub struct TransferRequestSummary {
    /// Player asking to become the marker.
    pub requested_by: Uuid,
    /// Denormalised requester name.
    pub requested_by_name: String,
    /// When the request was filed (RFC 3339).
    pub requested_at: String,
    /// Resolution state.
    pub status: crate::state::round::TransferStatus,
    /// Expiry instant (RFC 3339).
    pub expires_at: String,
}

impl From<&TransferRequest> for TransferRequestSummary {
    fn from(value: &TransferRequest) -> Self {
        Self {
            requested_by: value.requested_by,
            requested_by_name: value.requested_by_name.clone(),
            requested_at: format_system_time(value.requested_at),
            status: value.status,
            expires_at: format_system_time(value.expires_at),
        }
    }
}

/// Stat prompting state exposed to clients.
#[derive(Debug, Serialize, ToSchema)]
pub struct StatPromptSummary {
    /// Whether the round collects stats at all.
    pub enabled: bool,
    /// Current skip streak.
    pub consecutive_skips: u8,
    /// Whether prompting is suppressed.
    pub suppressed: bool,
}

impl From<&StatPromptState> for StatPromptSummary {
    fn from(value: &StatPromptState) -> Self {
        Self {
            enabled: value.enabled,
            consecutive_skips: value.consecutive_skips,
            suppressed: value.suppressed,
        }
    }
}

/// Spectator projection ranking players by the round's format.
#[derive(Debug, Serialize, ToSchema)]
pub struct LeaderboardResponse {
    /// Round id.
    pub round_id: Uuid,
    /// Scoring format the ordering follows.
    pub format: ScoringFormat,
    /// Ranked entries, best first.
    pub entries: Vec<LeaderboardEntry>,
}

/// One ranked player on the leaderboard.
#[derive(Debug, Serialize, ToSchema)]
pub struct LeaderboardEntry {
    /// 1-based rank, best first; ties share a rank.
    pub position: usize,
    /// Name shown on the board.
    pub display_name: String,
    /// Team name, for team formats.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_name: Option<String>,
    /// The player's derived live score.
    pub score: LiveScoreSummary,
}

/// Round listing entry.
#[derive(Debug, Serialize, ToSchema)]
pub struct RoundListItem {
    /// Round id.
    pub id: Uuid,
    /// Lifecycle status.
    pub status: crate::state::round::RoundStatus,
    /// Course display name.
    pub course_name: String,
    /// Scoring format identifier.
    pub format: ScoringFormat,
    /// 9 or 18.
    pub hole_count: u8,
    /// Participant names in scorecard order.
    pub player_names: Vec<String>,
    /// When scoring began (RFC 3339).
    pub started_at: String,
}

impl From<RoundListItemEntity> for RoundListItem {
    fn from(value: RoundListItemEntity) -> Self {
        Self {
            id: value.id,
            status: value.status,
            course_name: value.course_name,
            format: value.format,
            hole_count: value.hole_count,
            player_names: value.player_names,
            started_at: format_system_time(value.started_at),
        }
    }
}
