use serde::Serialize;
use utoipa::ToSchema;

use crate::state::state_machine::RoundPhase;

/// Publicly visible round phase exposed to clients (REST/SSE).
#[derive(Debug, Serialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VisibleRoundPhase {
    /// The marker is entering strokes.
    EnteringHole,
    /// The marker is supplying or skipping per-hole stats.
    CollectingStats,
    /// Scorecard confirmed.
    Complete,
    /// Round walked off.
    Abandoned,
}

/// Phase plus the playing-order position it refers to, when applicable.
#[derive(Debug, Serialize, ToSchema, Clone, Copy)]
pub struct RoundPhaseSnapshot {
    /// Phase discriminant.
    pub phase: VisibleRoundPhase,
    /// 1-based playing-order position for the live phases.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<u8>,
}

impl From<RoundPhase> for RoundPhaseSnapshot {
    fn from(value: RoundPhase) -> Self {
        match value {
            RoundPhase::EnteringHole(position) => Self {
                phase: VisibleRoundPhase::EnteringHole,
                position: Some(position),
            },
            RoundPhase::CollectingStats(position) => Self {
                phase: VisibleRoundPhase::CollectingStats,
                position: Some(position),
            },
            RoundPhase::Complete => Self {
                phase: VisibleRoundPhase::Complete,
                position: None,
            },
            RoundPhase::Abandoned => Self {
                phase: VisibleRoundPhase::Abandoned,
                position: None,
            },
        }
    }
}
