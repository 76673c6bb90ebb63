use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

/// File a marker-transfer request as a non-marker player.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RequestTransferRequest {
    /// Player asking to take over scorekeeping.
    pub requested_by: Uuid,
}

/// Approve or decline the pending transfer request as the marker.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ResolveTransferRequest {
    /// Acting player; must be the current marker at commit time.
    pub acting: Uuid,
}

/// Hand the marker role to a co-player directly.
#[derive(Debug, Deserialize, ToSchema)]
pub struct VoluntaryTransferRequest {
    /// Acting player; must be the current marker at commit time.
    pub acting: Uuid,
    /// Non-ghost co-player receiving the marker role.
    pub new_marker: Uuid,
}
