//! Scoring formats and their per-hole derivations.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Scoring format selected for a round.
///
/// The wire identifier (snake_case) is what external setup flows carry; an
/// unrecognised identifier is a configuration error and fails round creation
/// rather than silently defaulting to stroke play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ScoringFormat {
    /// Lowest net total wins; no derived fields beyond gross/net.
    StrokePlay,
    /// Points per hole from net score relative to par.
    Stableford,
    /// Team format: the best teammate net counts on each hole.
    BetterBall,
    /// Team format: teammates' nets are summed on each hole.
    Aggregate,
}

/// Error raised when a format identifier is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown scoring format `{0}`")]
pub struct UnknownFormat(pub String);

impl ScoringFormat {
    /// Stable wire identifier for this format.
    pub fn id(self) -> &'static str {
        match self {
            ScoringFormat::StrokePlay => "stroke_play",
            ScoringFormat::Stableford => "stableford",
            ScoringFormat::BetterBall => "better_ball",
            ScoringFormat::Aggregate => "aggregate",
        }
    }

    /// Whether the format combines teammates' results hole-by-hole.
    pub fn is_team(self) -> bool {
        matches!(self, ScoringFormat::BetterBall | ScoringFormat::Aggregate)
    }
}

impl FromStr for ScoringFormat {
    type Err = UnknownFormat;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "stroke_play" => Ok(ScoringFormat::StrokePlay),
            "stableford" => Ok(ScoringFormat::Stableford),
            "better_ball" => Ok(ScoringFormat::BetterBall),
            "aggregate" => Ok(ScoringFormat::Aggregate),
            other => Err(UnknownFormat(other.to_owned())),
        }
    }
}

impl fmt::Display for ScoringFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Stableford points for a single hole given net score minus par.
///
/// The table covers net-to-par differences in `[-2, +1]`; anything three or
/// more under par clips to the 5-point maximum and anything two or more over
/// par scores zero. Never negative, never absent.
pub fn stableford_points(net_to_par: i32) -> i32 {
    match net_to_par {
        i32::MIN..=-3 => 5,
        -2 => 4,
        -1 => 3,
        0 => 2,
        1 => 1,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_ids_round_trip() {
        for format in [
            ScoringFormat::StrokePlay,
            ScoringFormat::Stableford,
            ScoringFormat::BetterBall,
            ScoringFormat::Aggregate,
        ] {
            assert_eq!(format.id().parse::<ScoringFormat>().unwrap(), format);
        }
    }

    #[test]
    fn unknown_format_is_rejected() {
        let err = "match_play".parse::<ScoringFormat>().unwrap_err();
        assert_eq!(err, UnknownFormat("match_play".into()));
    }

    #[test]
    fn stableford_table_interior() {
        assert_eq!(stableford_points(-2), 4);
        assert_eq!(stableford_points(-1), 3);
        assert_eq!(stableford_points(0), 2);
        assert_eq!(stableford_points(1), 1);
    }

    #[test]
    fn stableford_table_clips_at_boundaries() {
        // Outside [-2, +1] the boundary values apply exactly.
        assert_eq!(stableford_points(-3), 5);
        assert_eq!(stableford_points(-8), 5);
        assert_eq!(stableford_points(2), 0);
        assert_eq!(stableford_points(7), 0);
        for diff in -10..=10 {
            assert!(stableford_points(diff) >= 0);
        }
    }

    #[test]
    fn team_flag_matches_format() {
        assert!(!ScoringFormat::StrokePlay.is_team());
        assert!(!ScoringFormat::Stableford.is_team());
        assert!(ScoringFormat::BetterBall.is_team());
        assert!(ScoringFormat::Aggregate.is_team());
    }
}
