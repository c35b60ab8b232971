pub mod handler;
pub mod msg_ping_handler;
pub mod msg_relay_handler;
pub mod msg_room_handler;

pub use handler::websocket_handler;
