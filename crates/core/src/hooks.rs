//! Embedding surface: lifecycle observers and veto hooks
//!
//! The registry stays authoritative for all state; hooks observe its
//! transitions and may veto a few of them. Callbacks run on the session
//! task that triggered the transition, while the registry lock is held,
//! so keep them quick and do not call back into the server.

use crate::models::{ClientId, ClientInfo};

/// Observer and veto surface for a host process embedding the relay.
///
/// Every method has a default implementation, so an embedder only
/// overrides what it cares about.
pub trait RelayHooks: Send + Sync {
    /// A connection was admitted and assigned an id (pre-handshake).
    fn on_new_client(&self, _id: ClientId) {}

    /// Handshake completed; the client now has a nickname.
    fn on_identified(&self, _client: &ClientInfo) {}

    /// The client entered a room.
    fn on_join(&self, _client: &ClientInfo, _room: &str) {}

    /// The client left a room (including during disconnect teardown).
    fn on_part(&self, _client: &ClientInfo, _room: &str) {}

    /// The client is gone; its id and nickname have been released.
    fn on_disconnect(&self, _client: &ClientInfo, _reason: &str) {}

    /// The client was kicked by `source`.
    fn on_kicked(&self, _client: &ClientInfo, _source: &ClientInfo, _reason: &str) {}

    /// A chat or emote message passed validation and the veto hook.
    fn on_chat(&self, _client: &ClientInfo, _text: &str) {}

    /// A room came into existence for its first member.
    fn on_room_create(&self, _room: &str) {}

    /// The last member left and the room was dropped.
    fn on_room_delete(&self, _room: &str) {}

    /// Veto: runs after a successful handshake, before the lobby join.
    /// Returning false terminates the connection silently.
    fn allow_connect(&self, _client: &ClientInfo) -> bool {
        true
    }

    /// Veto: runs before a room change. Returning false leaves the
    /// client where it is.
    fn allow_join(&self, _client: &ClientInfo, _room: &str) -> bool {
        true
    }

    /// Veto: runs before a chat or emote relays. Returning false drops
    /// the message.
    fn allow_message(&self, _client: &ClientInfo, _text: &str) -> bool {
        true
    }
}

/// Hook set that observes nothing and allows everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHooks;

impl RelayHooks for NoHooks {}
