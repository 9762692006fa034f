//! Per-user real-time delivery. The registry maps users to their live
//! connections; the websocket session in `app::socket` drives it.

pub mod registry;

pub use registry::{ConnectionId, ConnectionRegistry};

use crate::types::UserId;

pub const NEW_NOTIFICATION_EVENT: &str = "new_notification";
pub const JOIN_EVENT: &str = "join_room";

/// Lifecycle of a single client connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Joined(UserId),
    Disconnected,
}
