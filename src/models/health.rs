use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// API response for health check
#[derive(Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    /// RFC 3339 server time
    pub timestamp: String,
    pub version: String,
}
