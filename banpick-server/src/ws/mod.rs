//! WebSocket gateway: protocol types, rooms, and connection handling

pub mod connection;
pub mod protocol;
pub mod rooms;
