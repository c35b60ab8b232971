use chrono::Utc;
use tracing::{debug, error};

use crate::models::{PongMessage, SendMessage};
use crate::ws::BroadcastRelay;

/// Handle ping - send a pong back on the same connection
pub fn handle_ping_message(connection_id: &str, relay: &BroadcastRelay) {
    debug!("Ping message received from {}", connection_id);
    let pong = SendMessage::Pong(PongMessage {
        date: Utc::now().to_rfc3339(),
    });
    if !relay.send_to(connection_id, pong) {
        error!("Failed to send Pong message to {}", connection_id);
    }
}
