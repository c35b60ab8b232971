pub mod registry;
pub mod relay;

pub use registry::{Connection, ConnectionId, ConnectionRegistry, RoomId};
pub use relay::BroadcastRelay;
