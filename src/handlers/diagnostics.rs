use axum::{extract::State, Json};
use tracing::info;

use crate::models::DiagnosticsResponse;
use crate::state::AppState;

/// Live connection and room counts
pub async fn diagnostics(State(state): State<AppState>) -> Json<DiagnosticsResponse> {
    let (connections, rooms, memberships) = {
        let registry = state.relay.registry();
        let memberships: usize = registry
            .connection_ids()
            .iter()
            .map(|id| registry.rooms_of(id).len())
            .sum();
        (
            registry.connection_count() as u32,
            registry.room_count() as u32,
            memberships as u32,
        )
    };
    info!(
        "Diagnostics: Conn: {}, Rooms: {}, Memberships: {}",
        connections, rooms, memberships
    );
    Json(DiagnosticsResponse {
        success: true,
        connections,
        rooms,
        memberships,
    })
}
