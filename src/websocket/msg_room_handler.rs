use tracing::{debug, info};

use crate::models::RoomMessage;
use crate::ws::BroadcastRelay;

/// Handle join_room
pub fn handle_join_message(msg: &RoomMessage, connection_id: &str, relay: &BroadcastRelay) {
    if relay.join_room(connection_id, &msg.room_id) {
        info!("Connection {} joined room {}", connection_id, msg.room_id);
    } else {
        debug!("Connection {} already in room {}", connection_id, msg.room_id);
    }
}

/// Handle leave_room
pub fn handle_leave_message(msg: &RoomMessage, connection_id: &str, relay: &BroadcastRelay) {
    if relay.leave_room(connection_id, &msg.room_id) {
        info!("Connection {} left room {}", connection_id, msg.room_id);
    } else {
        debug!("Connection {} was not in room {}", connection_id, msg.room_id);
    }
}
