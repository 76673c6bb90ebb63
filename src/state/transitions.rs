use crate::{
    error::ServiceError,
    services::sse_events::broadcast_round_snapshot,
    state::{RoundHandle, state_machine::RoundEvent},
};

/// Execute a planned state-machine transition, then broadcast the resulting
/// round snapshot to the round's subscribers.
pub async fn run_transition_with_broadcast<F, Fut, T>(
    handle: &RoundHandle,
    event: RoundEvent,
    work: F,
) -> Result<T, ServiceError>
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = Result<T, ServiceError>>,
{
    let (result, _next) = handle.run_transition(event, work).await?;
    broadcast_round_snapshot(handle).await;
    Ok(result)
}
