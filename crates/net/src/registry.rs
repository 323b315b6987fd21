//! Global client and room tables
//!
//! Every lifecycle transition (admit, identify, join, part, kick,
//! disconnect) runs under the single lock guarding this struct, so the
//! table invariants hold at each release point. No socket I/O happens
//! here: delivery is a non-blocking push onto each peer's outbound
//! queue, drained by that peer's own session task.

use std::collections::HashMap;
use std::sync::Arc;

use pewter_core::{
    invariants, ClientId, ClientInfo, ClientMirror, RelayHooks, MAX_CLIENTS,
};
use tokio::sync::mpsc;

use crate::protocol;
use crate::room::Room;

/// One connected (or still handshaking) client as the registry tracks
/// it.
pub(crate) struct ClientEntry {
    pub id: ClientId,
    /// None until the handshake claims a nickname.
    pub nick: Option<String>,
    /// Outbound frame queue drained by the session task.
    pub tx: mpsc::UnboundedSender<Vec<u8>>,
    /// Mirrored simulation state for the join replay.
    pub mirror: ClientMirror,
    /// Name of the room the client currently inhabits.
    pub room: Option<String>,
}

impl ClientEntry {
    pub fn info(&self) -> ClientInfo {
        ClientInfo {
            id: self.id,
            nick: self.nick.clone().unwrap_or_default(),
        }
    }

    /// Queue a frame for delivery; drops silently if the session died.
    pub fn send(&self, frame: Vec<u8>) {
        let _ = self.tx.send(frame);
    }
}

pub(crate) struct Registry {
    clients: HashMap<ClientId, ClientEntry>,
    rooms: HashMap<String, Room>,
    hooks: Arc<dyn RelayHooks>,
}

impl Registry {
    pub fn new(hooks: Arc<dyn RelayHooks>) -> Self {
        Self {
            clients: HashMap::new(),
            rooms: HashMap::new(),
            hooks,
        }
    }

    pub fn hooks(&self) -> &dyn RelayHooks {
        self.hooks.as_ref()
    }

    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    pub fn client_ids(&self) -> Vec<ClientId> {
        self.clients.keys().copied().collect()
    }

    pub fn info(&self, id: ClientId) -> Option<ClientInfo> {
        self.clients.get(&id).map(ClientEntry::info)
    }

    pub fn room_of(&self, id: ClientId) -> Option<&str> {
        self.clients.get(&id).and_then(|c| c.room.as_deref())
    }

    pub fn room_names(&self) -> Vec<String> {
        self.rooms.keys().cloned().collect()
    }

    pub fn room_members(&self, name: &str) -> Option<Vec<ClientInfo>> {
        let room = self.rooms.get(name)?;
        Some(
            room.members()
                .iter()
                .filter_map(|id| self.info(*id))
                .collect(),
        )
    }

    // --- admission ------------------------------------------------------

    /// Admit a new connection: allocate the lowest free id and insert a
    /// handshaking entry. Returns None when the table is at the cap.
    pub fn admit(&mut self, tx: mpsc::UnboundedSender<Vec<u8>>) -> Option<ClientId> {
        if self.clients.len() >= MAX_CLIENTS {
            return None;
        }
        let id = (0..MAX_CLIENTS as u8).find(|id| !self.clients.contains_key(id))?;
        self.clients.insert(
            id,
            ClientEntry {
                id,
                nick: None,
                tx,
                mirror: ClientMirror::default(),
                room: None,
            },
        );
        self.hooks.on_new_client(id);
        self.debug_check();
        Some(id)
    }

    /// Claim a nickname for a handshaking client. Fails if any other
    /// connected client holds it.
    pub fn claim_nick(&mut self, id: ClientId, nick: &str) -> bool {
        let taken = self
            .clients
            .values()
            .any(|c| c.id != id && c.nick.as_deref() == Some(nick));
        if taken {
            return false;
        }
        match self.clients.get_mut(&id) {
            Some(entry) => {
                entry.nick = Some(nick.to_string());
                self.debug_check();
                true
            }
            None => false,
        }
    }

    /// Emit the identified event once the acceptance byte is on the
    /// wire.
    pub fn identified(&self, id: ClientId) {
        if let Some(entry) = self.clients.get(&id) {
            self.hooks.on_identified(&entry.info());
        }
    }

    // --- rooms ----------------------------------------------------------

    /// Move a client into the room called `name`, creating it on first
    /// join and tearing down the old room if it empties. No-op when the
    /// client is already there.
    pub fn join_room(&mut self, id: ClientId, name: &str) {
        let Some(entry) = self.clients.get(&id) else {
            return;
        };
        if entry.room.as_deref() == Some(name) {
            return;
        }
        self.part_room(id);

        if !self.rooms.contains_key(name) {
            self.hooks.on_room_create(name);
        }
        let room = self
            .rooms
            .entry(name.to_string())
            .or_insert_with(|| Room::new(name));
        room.join(id, &self.clients);

        if let Some(entry) = self.clients.get_mut(&id) {
            entry.room = Some(name.to_string());
        }
        if let Some(info) = self.info(id) {
            self.hooks.on_join(&info, name);
        }
        self.debug_check();
    }

    /// Remove a client from its current room, if any.
    pub fn part_room(&mut self, id: ClientId) {
        let Some(name) = self.clients.get(&id).and_then(|c| c.room.clone()) else {
            return;
        };
        if let Some(entry) = self.clients.get_mut(&id) {
            entry.room = None;
        }
        if let Some(info) = self.info(id) {
            self.hooks.on_part(&info, &name);
        }
        self.room_part(id, &name);
        self.debug_check();
    }

    /// Room-side part: notice to survivors, operator re-election, and
    /// room deletion when the last member leaves.
    fn room_part(&mut self, id: ClientId, name: &str) {
        let now_empty = match self.rooms.get_mut(name) {
            Some(room) => {
                room.part(id, &self.clients);
                room.is_empty()
            }
            None => false,
        };
        if now_empty {
            self.rooms.remove(name);
            self.hooks.on_room_delete(name);
        }
    }

    // --- teardown -------------------------------------------------------

    /// Tear a client down: release the id and nickname, emit the
    /// disconnect event, and part the room. Safe to call more than
    /// once; only the first call does anything.
    pub fn disconnect(&mut self, id: ClientId, reason: &str) {
        let Some(entry) = self.clients.remove(&id) else {
            return;
        };
        tracing::info!(id, nick = entry.nick.as_deref().unwrap_or(""), reason, "client disconnected");
        self.hooks.on_disconnect(&entry.info(), reason);
        if let Some(name) = entry.room.as_deref() {
            self.hooks.on_part(&entry.info(), name);
            self.room_part(id, name);
        }
        self.debug_check();
    }

    /// Kick `target` on behalf of `source`: a red notice, then teardown
    /// with a kick reason. An empty reason falls back to the default.
    pub fn kick(&mut self, target: ClientId, source: ClientId, reason: &str) {
        let reason = if reason.is_empty() {
            "No reason given"
        } else {
            reason
        };
        let (Some(source_info), Some(target_info)) = (self.info(source), self.info(target)) else {
            return;
        };
        self.send_to(
            target,
            protocol::server_message(
                &format!("You were kicked by {} ({})", source_info.nick, reason),
                protocol::KICK_RGB,
            ),
        );
        self.hooks.on_kicked(&target_info, &source_info, reason);
        self.disconnect(
            target,
            &format!("Kicked by {} ({})", source_info.nick, reason),
        );
    }

    // --- delivery -------------------------------------------------------

    /// Relay `frame` to every member of the sender's room except the
    /// sender itself.
    pub fn broadcast_from(&self, sender: ClientId, frame: &[u8]) {
        let Some(name) = self.room_of(sender) else {
            return;
        };
        if let Some(room) = self.rooms.get(name) {
            room.send(&self.clients, frame, Some(sender));
        }
    }

    /// Queue a frame for one client; dropped silently if the id is
    /// gone.
    pub fn send_to(&self, id: ClientId, frame: Vec<u8>) {
        if let Some(entry) = self.clients.get(&id) {
            entry.send(frame);
        }
    }

    /// Mutable mirror state for a session's own dispatch updates.
    pub fn mirror_mut(&mut self, id: ClientId) -> Option<&mut ClientMirror> {
        self.clients.get_mut(&id).map(|c| &mut c.mirror)
    }

    /// Operator check for the sender's current room.
    pub fn is_operator(&self, id: ClientId) -> bool {
        self.room_of(id)
            .and_then(|name| self.rooms.get(name))
            .map(|room| room.operator() == Some(id))
            .unwrap_or(false)
    }

    /// First member of the sender's room with the given nickname, in
    /// join order.
    pub fn kick_target(&self, sender: ClientId, nick: &str) -> Option<ClientId> {
        let room = self.rooms.get(self.room_of(sender)?)?;
        room.members().iter().copied().find(|member| {
            self.clients.get(member).and_then(|c| c.nick.as_deref()) == Some(nick)
        })
    }

    /// Debug-assert the table invariants; compiled out in release.
    fn debug_check(&self) {
        if cfg!(debug_assertions) {
            let ids: Vec<ClientId> = self.clients.keys().copied().collect();
            let nicks: Vec<&str> = self
                .clients
                .values()
                .filter_map(|c| c.nick.as_deref())
                .collect();
            invariants::assert_client_table_invariants(&ids, &nicks);
            for (name, room) in &self.rooms {
                invariants::assert_room_invariants(name, room.members(), room.operator());
            }
            for entry in self.clients.values() {
                let containing = self
                    .rooms
                    .values()
                    .filter(|room| room.contains(entry.id))
                    .count();
                invariants::assert_single_membership(entry.id, containing);
            }
        }
    }
}
