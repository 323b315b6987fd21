//! Lifecycle observer for the daemon
//!
//! Narrates relay events through tracing and vetoes nothing. This is the
//! hook set relayd runs with; embedders replace it with their own.

use pewter_core::{ClientId, ClientInfo, RelayHooks};
use tracing::info;

/// Hooks that log every lifecycle event.
#[derive(Debug, Clone, Copy, Default)]
pub struct EventLog;

impl RelayHooks for EventLog {
    fn on_new_client(&self, id: ClientId) {
        info!(id, "client connected");
    }

    fn on_identified(&self, client: &ClientInfo) {
        info!(id = client.id, nick = %client.nick, "client identified");
    }

    fn on_join(&self, client: &ClientInfo, room: &str) {
        info!(nick = %client.nick, room, "joined room");
    }

    fn on_part(&self, client: &ClientInfo, room: &str) {
        info!(nick = %client.nick, room, "left room");
    }

    fn on_disconnect(&self, client: &ClientInfo, reason: &str) {
        info!(nick = %client.nick, reason, "client disconnected");
    }

    fn on_kicked(&self, client: &ClientInfo, source: &ClientInfo, reason: &str) {
        info!(nick = %client.nick, by = %source.nick, reason, "client kicked");
    }

    fn on_chat(&self, client: &ClientInfo, text: &str) {
        info!(nick = %client.nick, text, "chat");
    }

    fn on_room_create(&self, room: &str) {
        info!(room, "room created");
    }

    fn on_room_delete(&self, room: &str) {
        info!(room, "room deleted");
    }
}
