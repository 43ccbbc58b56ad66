pub mod backend;
pub mod frontend;
pub mod messages;
pub mod notice;
pub mod packet;
pub mod proto;
pub mod resultset;
pub mod row;

pub use messages::{BackendMessage, FrontendMessage, Packet};
pub use packet::{PacketIo, DEFAULT_MAX_PACKET_SIZE};
