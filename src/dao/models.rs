use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use uuid::Uuid;

use crate::scoring::format::ScoringFormat;
use crate::state::round::{Privacy, RoundStatus, StatToggle, TransferStatus};

/// Par, yardage and stroke index for one hole, in playing order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HoleDetailEntity {
    /// Actual hole number on the course.
    pub hole: u8,
    /// Par for the hole.
    pub par: u8,
    /// Yardage from the round's tee, when known.
    pub yardage: Option<u16>,
    /// Difficulty rank (1 = hardest).
    pub stroke_index: u8,
}

/// Participant slot persisted with the round.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerSlotEntity {
    /// Platform user id, or a generated id for ghosts.
    pub player_id: Uuid,
    /// Name shown on the scorecard.
    pub display_name: String,
    /// Optional avatar URL.
    pub avatar: Option<String>,
    /// Whether this participant has no platform account.
    pub is_ghost: bool,
    /// Cached marker flag, re-stamped on every transfer.
    pub is_marker: bool,
    /// Handicap index carried into the round.
    pub handicap_index: f32,
    /// Course handicap frozen at creation.
    pub course_handicap: i32,
    /// Tee the player plays from.
    pub tee_name: String,
    /// Slope rating of that tee.
    pub slope_rating: u16,
    /// Course rating of that tee.
    pub course_rating: f32,
    /// Team membership for team formats.
    pub team_id: Option<Uuid>,
}

/// Team grouping persisted with the round.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TeamEntity {
    /// Stable identifier for the team.
    pub id: Uuid,
    /// Display name for the team.
    pub name: String,
    /// Member player ids.
    pub player_ids: Vec<Uuid>,
}

/// One player's recorded result on one hole.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HoleEntryRecordEntity {
    /// Player the entry belongs to.
    pub player_id: Uuid,
    /// Strokes taken, in `[1, 15]`.
    pub strokes: u8,
    /// Fairway in regulation.
    pub fir: StatToggle,
    /// Green in regulation.
    pub gir: StatToggle,
    /// Distance to pin, par-3 holes only.
    pub dtp: Option<u32>,
}

/// All entries recorded for one hole, flattened for storage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HoleRecordEntity {
    /// Actual hole number.
    pub hole: u8,
    /// Player entries in scorecard order.
    pub entries: Vec<HoleEntryRecordEntity>,
}

/// In-flight marker handoff persisted with the round.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransferRequestEntity {
    /// Player asking to become the marker.
    pub requested_by: Uuid,
    /// Denormalised requester name.
    pub requested_by_name: String,
    /// When the request was filed.
    pub requested_at: SystemTime,
    /// Resolution state.
    pub status: TransferStatus,
    /// Expiry instant.
    pub expires_at: SystemTime,
}

/// Stat-collection prompting state persisted with the round.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatPromptEntity {
    /// Whether the round collects stats at all.
    pub enabled: bool,
    /// Consecutive skip streak.
    pub consecutive_skips: u8,
    /// Whether prompting is currently suppressed.
    pub suppressed: bool,
}

/// Aggregate round entity persisted by the storage layer.
///
/// Derived live scores are deliberately absent: they are recomputed from
/// `hole_data` on load so stored documents can never forge a score.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoundEntity {
    /// Primary key of the round.
    pub id: Uuid,
    /// Lifecycle status.
    pub status: RoundStatus,
    /// Current marker.
    pub marker_id: Uuid,
    /// Course identifier.
    pub course_id: String,
    /// Course display name.
    pub course_name: String,
    /// 9 or 18.
    pub hole_count: u8,
    /// Scoring format.
    pub format: ScoringFormat,
    /// Hole numbers in play order.
    pub playing_order: Vec<u8>,
    /// Hole details aligned with the playing order.
    pub hole_details: Vec<HoleDetailEntity>,
    /// Participants in scorecard order.
    pub players: Vec<PlayerSlotEntity>,
    /// Team groupings; empty for individual formats.
    pub teams: Vec<TeamEntity>,
    /// Playing-order position being entered (sentinel = hole_count + 1).
    pub current_hole: u8,
    /// Recorded hole results.
    pub hole_data: Vec<HoleRecordEntity>,
    /// Pending marker handoff, if any.
    pub transfer_request: Option<TransferRequestEntity>,
    /// Stat prompting state.
    pub stat_prompts: StatPromptEntity,
    /// Visibility scope.
    pub privacy: Privacy,
    /// Free-form round category.
    pub round_type: String,
    /// When scoring began.
    pub started_at: SystemTime,
    /// When the card was confirmed.
    pub completed_at: Option<SystemTime>,
    /// When the round was abandoned.
    pub abandoned_at: Option<SystemTime>,
    /// Who abandoned it.
    pub abandoned_by: Option<Uuid>,
}

/// Subset of [`RoundEntity`] used for round listings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoundListItemEntity {
    /// Primary key of the round.
    pub id: Uuid,
    /// Lifecycle status.
    pub status: RoundStatus,
    /// Course display name.
    pub course_name: String,
    /// Scoring format.
    pub format: ScoringFormat,
    /// 9 or 18.
    pub hole_count: u8,
    /// Participant display names in scorecard order.
    pub player_names: Vec<String>,
    /// When scoring began.
    pub started_at: SystemTime,
}

impl From<RoundEntity> for RoundListItemEntity {
    fn from(entity: RoundEntity) -> Self {
        Self {
            id: entity.id,
            status: entity.status,
            course_name: entity.course_name,
            format: entity.format,
            hole_count: entity.hole_count,
            player_names: entity
                .players
                .into_iter()
                .map(|slot| slot.display_name)
                .collect(),
            started_at: entity.started_at,
        }
    }
}
