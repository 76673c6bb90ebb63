use serde::Serialize;
use utoipa::ToSchema;

/// Simple health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status ("ok" or "degraded").
    pub status: String,
    /// Number of rounds currently live in this process.
    pub live_rounds: usize,
}

impl HealthResponse {
    /// Health response indicating the system is fully operational.
    pub fn ok(live_rounds: usize) -> Self {
        Self {
            status: "ok".to_string(),
            live_rounds,
        }
    }

    /// Health response indicating the system runs without storage.
    pub fn degraded(live_rounds: usize) -> Self {
        Self {
            status: "degraded".to_string(),
            live_rounds,
        }
    }
}
