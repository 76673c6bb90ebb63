use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::state::round::StatToggle;

/// Record (or correct) a stroke count for one player on one hole.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RecordStrokeRequest {
    /// Acting player; must be the current marker at commit time.
    pub recorded_by: Uuid,
    /// Actual hole number, `1..=hole_count`.
    pub hole: u8,
    /// Player the strokes belong to.
    pub player_id: Uuid,
    /// Strokes taken, `1..=15`.
    pub strokes: u8,
    /// Suppress the stat-collection prompt if this write completes the
    /// current hole; counts as an explicit skip.
    #[serde(default)]
    pub suppress_stats: bool,
}

/// Per-player stat toggles collected after a hole completes.
#[derive(Debug, Deserialize, ToSchema)]
pub struct PlayerHoleStatsInput {
    /// Player the stats belong to.
    pub player_id: Uuid,
    /// Fairway in regulation.
    #[serde(default)]
    pub fir: StatToggle,
    /// Green in regulation.
    #[serde(default)]
    pub gir: StatToggle,
    /// Distance to pin, par-3 holes only.
    #[serde(default)]
    pub dtp: Option<u32>,
}

/// Submit stat collection for the hole the round is paused on.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RecordHoleStatsRequest {
    /// Acting player; must be the current marker at commit time.
    pub recorded_by: Uuid,
    /// One entry per player; omitted players keep their toggles unset.
    pub entries: Vec<PlayerHoleStatsInput>,
}

/// Marker-identified request body for parameterless scoring actions
/// (skip stats, re-enable prompts, complete, abandon).
#[derive(Debug, Deserialize, ToSchema)]
pub struct MarkerActionRequest {
    /// Acting player; must be the current marker at commit time.
    pub acting: Uuid,
}
