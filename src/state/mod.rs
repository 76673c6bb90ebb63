pub mod chat;
pub mod round;
mod sse;
pub mod state_machine;
pub mod transitions;

use std::{sync::Arc, time::Duration};

use dashmap::DashMap;
use tokio::sync::{Mutex, RwLock, watch};
use tokio::time::timeout;
use tracing::warn;
use uuid::Uuid;

use crate::{
    config::AppConfig,
    dao::round_store::RoundStore,
    error::ServiceError,
    state::{
        chat::ChatMessage,
        round::Round,
        state_machine::{RoundEvent, RoundPhase, RoundStateMachine},
    },
};

pub use self::sse::SseHub;
pub use self::state_machine::{AbortError, ApplyError, Plan, PlanError, PlanId, Snapshot};

/// Cheaply cloneable handle to the whole application state.
pub type SharedState = Arc<AppState>;

/// Upper bound on the persistence work a transition may perform.
pub const DEFAULT_TRANSITION_TIMEOUT: Duration = Duration::from_secs(5);

/// Central application state: the live round registry, storage handle, and
/// degraded-mode flag.
pub struct AppState {
    round_store: RwLock<Option<Arc<dyn RoundStore>>>,
    rounds: DashMap<Uuid, Arc<RoundHandle>>,
    config: AppConfig,
    degraded: watch::Sender<bool>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`].
    ///
    /// The application starts in degraded mode until a storage backend is
    /// installed by the supervisor.
    pub fn new(config: AppConfig) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            round_store: RwLock::new(None),
            rounds: DashMap::new(),
            config,
            degraded: degraded_tx,
        })
    }

    /// Runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Obtain a handle to the current round store, if one is installed.
    pub async fn round_store(&self) -> Option<Arc<dyn RoundStore>> {
        let guard = self.round_store.read().await;
        guard.as_ref().cloned()
    }

    /// Round store or a degraded-mode error.
    pub async fn require_round_store(&self) -> Result<Arc<dyn RoundStore>, ServiceError> {
        self.round_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new round store implementation and leave degraded mode.
    pub async fn set_round_store(&self, store: Arc<dyn RoundStore>) {
        {
            let mut guard = self.round_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false);
    }

    /// Remove the current round store and enter degraded mode.
    pub async fn clear_round_store(&self) {
        {
            let mut guard = self.round_store.write().await;
            guard.take();
        }
        self.update_degraded(true);
    }

    /// Current degraded flag.
    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current != value {
                *current = value;
                true
            } else {
                false
            }
        });
    }

    /// Register a round in the live registry, building its state machine
    /// from the document's persisted position.
    pub fn install_round(&self, round: Round) -> Arc<RoundHandle> {
        let id = round.id;
        let machine = RoundStateMachine::resume(round.hole_count, resume_phase(&round));
        let handle = Arc::new(RoundHandle {
            machine: RwLock::new(machine),
            round: RwLock::new(round),
            chat: RwLock::new(Vec::new()),
            hub: SseHub::new(self.config.stream_capacity()),
            transition_gate: Mutex::new(()),
            transition_timeout: Some(DEFAULT_TRANSITION_TIMEOUT),
        });
        self.rounds.insert(id, handle.clone());
        handle
    }

    /// Look up a live round by id.
    pub fn round(&self, id: Uuid) -> Result<Arc<RoundHandle>, ServiceError> {
        self.rounds
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| ServiceError::NotFound(format!("round `{id}` is not live here")))
    }

    /// Whether a round is present in the live registry.
    pub fn contains_round(&self, id: Uuid) -> bool {
        self.rounds.contains_key(&id)
    }

    /// Number of rounds currently in the live registry.
    pub fn live_round_count(&self) -> usize {
        self.rounds.len()
    }
}

/// Rebuild the machine phase for a round loaded from storage.
///
/// A live document whose current hole is already fully scored can only have
/// been persisted mid stat-collection, so it resumes in `CollectingStats`;
/// everything else resumes where `current_hole` points.
pub(crate) fn resume_phase(round: &Round) -> RoundPhase {
    match round.status {
        round::RoundStatus::Complete => RoundPhase::Complete,
        round::RoundStatus::Abandoned => RoundPhase::Abandoned,
        round::RoundStatus::Live => match round.current_hole_number() {
            Some(hole) if round.hole_complete(hole) => {
                RoundPhase::CollectingStats(round.current_hole)
            }
            _ => RoundPhase::EnteringHole(round.current_hole),
        },
    }
}

/// Per-round shared state: the document, its state machine, chat log, and
/// event hub. The round document is the single shared resource; exactly one
/// writer (the current marker) mutates it while everyone else observes.
pub struct RoundHandle {
    machine: RwLock<RoundStateMachine>,
    round: RwLock<Round>,
    chat: RwLock<Vec<ChatMessage>>,
    hub: SseHub,
    transition_gate: Mutex<()>,
    transition_timeout: Option<Duration>,
}

impl RoundHandle {
    /// The round document lock.
    pub fn round(&self) -> &RwLock<Round> {
        &self.round
    }

    /// The append-only chat log lock.
    pub fn chat(&self) -> &RwLock<Vec<ChatMessage>> {
        &self.chat
    }

    /// Broadcast hub for this round's event stream.
    pub fn hub(&self) -> &SseHub {
        &self.hub
    }

    /// Snapshot the current phase of the round's state machine.
    pub async fn phase(&self) -> RoundPhase {
        self.machine.read().await.phase()
    }

    /// Snapshot phase, version and pending transition.
    pub async fn machine_snapshot(&self) -> Snapshot {
        self.machine.read().await.snapshot()
    }

    async fn plan_transition(&self, event: RoundEvent) -> Result<Plan, PlanError> {
        let mut machine = self.machine.write().await;
        machine.plan(event)
    }

    async fn apply_planned_transition(&self, plan_id: PlanId) -> Result<RoundPhase, ApplyError> {
        let mut machine = self.machine.write().await;
        machine.apply(plan_id)
    }

    async fn abort_transition(&self, plan_id: PlanId) -> Result<(), AbortError> {
        let mut machine = self.machine.write().await;
        machine.abort(plan_id)
    }

    /// Plan `event`, run `work` (document mutation plus persistence), then
    /// apply the transition — or abort it when the work fails or times out.
    /// A per-round gate serializes transitions so at most one is in flight.
    pub async fn run_transition<F, Fut, T>(
        &self,
        event: RoundEvent,
        work: F,
    ) -> Result<(T, RoundPhase), ServiceError>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<T, ServiceError>>,
    {
        let gate = self.transition_gate.lock().await;
        let Plan { id: plan_id, .. } = self.plan_transition(event).await?;

        let work_future = work();
        let outcome = if let Some(limit) = self.transition_timeout {
            match timeout(limit, work_future).await {
                Ok(result) => result,
                Err(_) => {
                    if let Err(abort_err) = self.abort_transition(plan_id).await {
                        warn!(
                            event = ?event,
                            plan_id = %plan_id,
                            error = ?abort_err,
                            "failed to abort transition after timeout"
                        );
                    }
                    drop(gate);
                    return Err(ServiceError::Timeout);
                }
            }
        } else {
            work_future.await
        };

        match outcome {
            Ok(value) => {
                let next = self.apply_planned_transition(plan_id).await?;
                drop(gate);
                Ok((value, next))
            }
            Err(err) => {
                if let Err(abort_err) = self.abort_transition(plan_id).await {
                    warn!(
                        event = ?event,
                        plan_id = %plan_id,
                        error = ?abort_err,
                        "failed to abort transition after work error"
                    );
                }
                drop(gate);
                Err(err)
            }
        }
    }
}
