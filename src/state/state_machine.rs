use std::time::Instant;

use thiserror::Error;
use uuid::Uuid;

/// Phases a live round moves through while the marker enters scores.
///
/// The hole index is the 1-based position in the round's playing order;
/// `EnteringHole(hole_count + 1)` is the sentinel meaning every hole has
/// been entered and the round is waiting for an explicit completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundPhase {
    /// The marker is entering strokes for the given playing-order position.
    EnteringHole(u8),
    /// All players scored the hole; the marker is supplying or skipping stats.
    CollectingStats(u8),
    /// Scorecard confirmed; terminal.
    Complete,
    /// Round walked off by the marker; terminal.
    Abandoned,
}

impl RoundPhase {
    /// Whether the phase still accepts mutations.
    pub fn is_live(self) -> bool {
        matches!(
            self,
            RoundPhase::EnteringHole(_) | RoundPhase::CollectingStats(_)
        )
    }
}

/// Events that can be applied to the round state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundEvent {
    /// The current hole just completed and stat prompting is active.
    BeginStatCollection,
    /// Move on to the next playing-order position (or the sentinel).
    AdvanceHole,
    /// Confirm the full scorecard from the sentinel position.
    Complete,
    /// Terminal walk-off, valid from any live phase.
    Abandon,
}

/// Error returned when attempting to apply an invalid transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// Phase the machine was in when the event was received.
    pub from: RoundPhase,
    /// Event that cannot be applied from that phase.
    pub event: RoundEvent,
}

/// Errors raised while planning a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    /// A planned transition is already awaiting apply or abort.
    AlreadyPending,
    /// The event is not valid from the current phase.
    InvalidTransition(InvalidTransition),
}

/// Errors raised while applying a planned transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyError {
    /// No transition is currently pending.
    NoPending,
    /// Plan id does not match the pending plan.
    IdMismatch {
        /// Id of the plan actually pending.
        expected: PlanId,
        /// Id the caller supplied.
        got: PlanId,
    },
    /// Phase moved since the plan was created.
    PhaseMismatch {
        /// Phase the plan was created from.
        expected: RoundPhase,
        /// Phase the machine is in now.
        actual: RoundPhase,
    },
    /// Version moved since the plan was created.
    VersionMismatch {
        /// Version the plan expected to install.
        expected: usize,
        /// Version that would be installed now.
        actual: usize,
    },
}

/// Errors raised while aborting a planned transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortError {
    /// No transition is currently pending.
    NoPending,
    /// Plan id does not match the pending plan.
    IdMismatch {
        /// Id of the plan actually pending.
        expected: PlanId,
        /// Id the caller supplied.
        got: PlanId,
    },
}

/// Unique identifier for a planned transition.
pub type PlanId = Uuid;

/// A validated transition waiting to be applied or aborted, letting callers
/// interleave persistence work between validation and commit.
#[derive(Debug, Clone)]
pub struct Plan {
    /// Unique identifier for this plan.
    pub id: PlanId,
    /// Phase the machine is currently in.
    pub from: RoundPhase,
    /// Phase the machine will move to.
    pub to: RoundPhase,
    /// Event that triggered the transition.
    pub event: RoundEvent,
    /// Version number after applying.
    pub version_next: usize,
    /// When the plan was created.
    pub pending_since: Instant,
}

/// Snapshot of the machine for observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Current phase.
    pub phase: RoundPhase,
    /// Transition counter; increments on every applied transition.
    pub version: usize,
    /// Target phase of a planned-but-unapplied transition, if any.
    pub pending: Option<RoundPhase>,
}

/// Hole-advance state machine for one round.
#[derive(Debug, Clone)]
pub struct RoundStateMachine {
    hole_count: u8,
    phase: RoundPhase,
    version: usize,
    pending: Option<Plan>,
}

impl RoundStateMachine {
    /// Fresh machine positioned on the first hole of the playing order.
    pub fn new(hole_count: u8) -> Self {
        Self {
            hole_count,
            phase: RoundPhase::EnteringHole(1),
            version: 0,
            pending: None,
        }
    }

    /// Rebuild a machine for a round loaded from storage.
    pub fn resume(hole_count: u8, phase: RoundPhase) -> Self {
        Self {
            hole_count,
            phase,
            version: 0,
            pending: None,
        }
    }

    /// Inspect the current phase.
    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    /// Snapshot phase, version and any pending target.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            phase: self.phase,
            version: self.version,
            pending: self.pending.as_ref().map(|plan| plan.to),
        }
    }

    /// Validate an event against the current phase and stage it as a plan.
    pub fn plan(&mut self, event: RoundEvent) -> Result<Plan, PlanError> {
        if self.pending.is_some() {
            return Err(PlanError::AlreadyPending);
        }

        let next = self
            .compute_transition(event)
            .map_err(PlanError::InvalidTransition)?;

        let plan = Plan {
            id: Uuid::new_v4(),
            from: self.phase,
            to: next,
            event,
            version_next: self.version + 1,
            pending_since: Instant::now(),
        };

        self.pending = Some(plan.clone());
        Ok(plan)
    }

    /// Commit a planned transition.
    pub fn apply(&mut self, plan_id: PlanId) -> Result<RoundPhase, ApplyError> {
        let plan = self.pending.take().ok_or(ApplyError::NoPending)?;

        if plan.id != plan_id {
            let expected = plan.id;
            self.pending = Some(plan);
            return Err(ApplyError::IdMismatch {
                expected,
                got: plan_id,
            });
        }

        if self.phase != plan.from {
            return Err(ApplyError::PhaseMismatch {
                expected: plan.from,
                actual: self.phase,
            });
        }

        if self.version + 1 != plan.version_next {
            return Err(ApplyError::VersionMismatch {
                expected: plan.version_next,
                actual: self.version + 1,
            });
        }

        self.phase = plan.to;
        self.version = plan.version_next;
        Ok(self.phase)
    }

    /// Discard a planned transition without applying it.
    pub fn abort(&mut self, plan_id: PlanId) -> Result<(), AbortError> {
        let plan = self.pending.as_ref().ok_or(AbortError::NoPending)?;

        if plan.id != plan_id {
            return Err(AbortError::IdMismatch {
                expected: plan.id,
                got: plan_id,
            });
        }

        self.pending = None;
        Ok(())
    }

    fn compute_transition(&self, event: RoundEvent) -> Result<RoundPhase, InvalidTransition> {
        let sentinel = self.hole_count + 1;
        let next = match (self.phase, event) {
            (RoundPhase::EnteringHole(hole), RoundEvent::BeginStatCollection)
                if hole <= self.hole_count =>
            {
                RoundPhase::CollectingStats(hole)
            }
            (RoundPhase::EnteringHole(hole), RoundEvent::AdvanceHole) if hole < sentinel => {
                RoundPhase::EnteringHole(hole + 1)
            }
            (RoundPhase::CollectingStats(hole), RoundEvent::AdvanceHole) => {
                RoundPhase::EnteringHole(hole + 1)
            }
            (RoundPhase::EnteringHole(hole), RoundEvent::Complete) if hole == sentinel => {
                RoundPhase::Complete
            }
            (from, RoundEvent::Abandon) if from.is_live() => RoundPhase::Abandoned,
            (from, event) => return Err(InvalidTransition { from, event }),
        };

        Ok(next)
    }
}
