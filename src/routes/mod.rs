use axum::Router;

use crate::state::SharedState;

pub mod chat;
pub mod docs;
pub mod health;
pub mod round;
pub mod scoring;
pub mod spectator;
pub mod sse;
pub mod transfer;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(round::router())
        .merge(scoring::router())
        .merge(transfer::router())
        .merge(spectator::router())
        .merge(chat::router())
        .merge(sse::router());

    let docs_router = docs::router(state.clone());

    api_router.merge(docs_router).with_state(state)
}
