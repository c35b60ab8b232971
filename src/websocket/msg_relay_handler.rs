use tracing::debug;

use crate::models::{CursorEvent, EditEvent, SendMessage};
use crate::ws::BroadcastRelay;

/// Handle file_change - forward to the rest of the room
pub fn handle_file_change_message(event: EditEvent, connection_id: &str, relay: &BroadcastRelay) {
    let room_id = event.room_id.clone();
    let n = relay.relay_to_room(&room_id, SendMessage::FileChange(event), connection_id);
    debug!("file_change from {} relayed to {} peer(s) in {}", connection_id, n, room_id);
}

/// Handle cursor_move - forward to the rest of the room
pub fn handle_cursor_move_message(event: CursorEvent, connection_id: &str, relay: &BroadcastRelay) {
    let room_id = event.room_id.clone();
    let n = relay.relay_to_room(&room_id, SendMessage::CursorMove(event), connection_id);
    debug!("cursor_move from {} relayed to {} peer(s) in {}", connection_id, n, room_id);
}
