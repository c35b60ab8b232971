use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Response for diagnostics information
#[derive(Serialize, Deserialize, ToSchema)]
pub struct DiagnosticsResponse {
    pub success: bool,
    /// Live realtime connections
    pub connections: u32,
    /// Rooms with at least one member
    pub rooms: u32,
    /// Room memberships summed over all connections
    pub memberships: u32,
}
