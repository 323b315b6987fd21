//! Room membership, operator election, and the join replay
//!
//! A room is a named fan-out group. Joining streams a replay of every
//! existing member's mirrored state to the joiner so a late viewer can
//! reconstruct the world. The first member becomes operator; the role
//! passes down join order on departure.

use std::collections::HashMap;

use pewter_core::ClientId;

use crate::protocol::{op, relay};
use crate::registry::ClientEntry;

pub(crate) struct Room {
    name: String,
    /// Join order; the replay and operator succession both follow it.
    members: Vec<ClientId>,
    operator: Option<ClientId>,
}

impl Room {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            members: Vec::new(),
            operator: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, id: ClientId) -> bool {
        self.members.contains(&id)
    }

    pub fn members(&self) -> &[ClientId] {
        &self.members
    }

    pub fn operator(&self) -> Option<ClientId> {
        self.operator
    }

    /// Add `joiner`, streaming the replay protocol first. No-op if the
    /// client is already a member. The snapshot covers members before
    /// the join, so the joiner never sees itself in the roster and the
    /// existing members are notified exactly once.
    pub fn join(&mut self, joiner: ClientId, clients: &HashMap<ClientId, ClientEntry>) {
        if self.contains(joiner) {
            return;
        }
        let Some(joiner_entry) = clients.get(&joiner) else {
            return;
        };
        if self.members.is_empty() {
            self.operator = Some(joiner);
        }

        // Roster: header with the member count, then one record per
        // existing member.
        joiner_entry.send(vec![op::JOIN, self.members.len() as u8]);
        for member in &self.members {
            if let Some(m) = clients.get(member) {
                let mut record = vec![m.id];
                record.extend_from_slice(m.nick.as_deref().unwrap_or_default().as_bytes());
                record.push(0);
                joiner_entry.send(record);
            }
        }

        // Per-member state replay in roster order. Shape is re-derived
        // on the client by counting shape-change frames from zero.
        for member in &self.members {
            let Some(m) = clients.get(member) else {
                continue;
            };
            for _ in 0..m.mirror.brush_shape {
                joiner_entry.send(vec![op::BRUSH_SHAPE, m.id]);
            }
            joiner_entry.send(relay(op::BRUSH_SIZE, m.id, &m.mirror.brush_size));
            for selection in &m.mirror.selections {
                joiner_entry.send(relay(op::SELECT_ELEMENT, m.id, selection));
            }
            joiner_entry.send(relay(op::REPLACE_MODE, m.id, &[m.mirror.replace_mode]));
            joiner_entry.send(relay(op::DECO_COLOR, m.id, &m.mirror.deco_color));
        }

        // Announce the joiner to the existing members.
        let mut notice = vec![op::JOIN_NOTICE, joiner];
        notice.extend_from_slice(joiner_entry.nick.as_deref().unwrap_or_default().as_bytes());
        notice.push(0);
        self.send(clients, &notice, None);

        // Ask one member whose chat window is not focused to seed the
        // joiner's simulation state (ops 128/130 round trip).
        let sync_source = self.members.iter().copied().find(|member| {
            clients
                .get(member)
                .map(|c| !c.mirror.chat_focused)
                .unwrap_or(false)
        });
        if let Some(source) = sync_source {
            if let Some(src) = clients.get(&source) {
                src.send(vec![op::SYNC_REQUEST, joiner]);
            }
        }

        self.members.push(joiner);
        tracing::debug!(
            room = %self.name,
            client = joiner,
            members = self.members.len(),
            "client joined room"
        );
    }

    /// Remove `id`, re-elect the operator if it left, and notify the
    /// survivors.
    pub fn part(&mut self, id: ClientId, clients: &HashMap<ClientId, ClientEntry>) {
        let Some(pos) = self.members.iter().position(|&m| m == id) else {
            return;
        };
        self.members.remove(pos);
        if self.operator == Some(id) {
            self.operator = self.members.first().copied();
        }
        self.send(clients, &[op::PART_NOTICE, id], None);
        tracing::debug!(
            room = %self.name,
            client = id,
            members = self.members.len(),
            "client left room"
        );
    }

    /// Fan `frame` out to every member except `except`. Members whose
    /// session is gone are skipped silently.
    pub fn send(
        &self,
        clients: &HashMap<ClientId, ClientEntry>,
        frame: &[u8],
        except: Option<ClientId>,
    ) {
        for member in &self.members {
            if Some(*member) == except {
                continue;
            }
            if let Some(entry) = clients.get(member) {
                entry.send(frame.to_vec());
            }
        }
    }
}
