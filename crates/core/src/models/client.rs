//! Client identity and mirrored simulation state

use std::fmt;

/// Byte-sized client id, used as the addressing tag in the wire protocol.
/// Allocated lowest-free from the pool `[0, MAX_CLIENTS)`.
pub type ClientId = u8;

/// Hard cap on concurrent clients; ids must fit in a single byte.
pub const MAX_CLIENTS: usize = 255;

/// A connected client as observed by hooks and registry snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientInfo {
    pub id: ClientId,
    /// Empty until the handshake claims a nickname.
    pub nick: String,
}

impl fmt::Display for ClientInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (#{})", self.nick, self.id)
    }
}

/// Per-client derived state, replayed to a room's joiners so a late
/// viewer can reconstruct every peer's brush.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientMirror {
    /// Brush shape as steps from the client's initial shape. The replay
    /// emits this many shape-change frames, so it cycles through 1..=3.
    pub brush_shape: u8,
    /// Brush size (x, y).
    pub brush_size: [u8; 2],
    /// Element selections per mouse-button slot.
    pub selections: [[u8; 2]; 4],
    /// Replace-mode flag byte as last sent by the client.
    pub replace_mode: u8,
    /// Decoration color, RGBA.
    pub deco_color: [u8; 4],
    /// Set once the client reports chat-window focus; such clients are
    /// skipped when picking a sync source for joiners.
    pub chat_focused: bool,
}

impl Default for ClientMirror {
    fn default() -> Self {
        Self {
            brush_shape: 0,
            brush_size: [4, 4],
            selections: [[0, 1], [64, 0], [128, 0], [192, 0]],
            replace_mode: b'0',
            deco_color: [0; 4],
            chat_focused: false,
        }
    }
}

impl ClientMirror {
    /// Advance the shape counter the way a shape-change frame does on
    /// the client: 0 → 1 → 2 → 3 → 1 → …
    pub fn cycle_brush_shape(&mut self) {
        self.brush_shape = (self.brush_shape % 3) + 1;
    }

    /// Store an element selection. The slot comes from the high bits of
    /// the first byte; a write past the last slot is discarded.
    pub fn set_selection(&mut self, a: u8, b: u8) {
        let slot = (a / 64) as usize + 1;
        if let Some(sel) = self.selections.get_mut(slot) {
            *sel = [a, b];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mirror_initial_state() {
        let mirror = ClientMirror::default();
        assert_eq!(mirror.brush_shape, 0);
        assert_eq!(mirror.brush_size, [4, 4]);
        assert_eq!(mirror.selections, [[0, 1], [64, 0], [128, 0], [192, 0]]);
        assert_eq!(mirror.replace_mode, b'0');
        assert_eq!(mirror.deco_color, [0, 0, 0, 0]);
        assert!(!mirror.chat_focused);
    }

    #[test]
    fn test_brush_shape_cycles_one_two_three() {
        let mut mirror = ClientMirror::default();
        let mut seen = Vec::new();
        for _ in 0..7 {
            mirror.cycle_brush_shape();
            seen.push(mirror.brush_shape);
        }
        assert_eq!(seen, vec![1, 2, 3, 1, 2, 3, 1]);
    }

    #[test]
    fn test_selection_slot_from_high_bits() {
        let mut mirror = ClientMirror::default();
        mirror.set_selection(10, 5);
        assert_eq!(mirror.selections[1], [10, 5]);
        mirror.set_selection(70, 6);
        assert_eq!(mirror.selections[2], [70, 6]);
        mirror.set_selection(130, 7);
        assert_eq!(mirror.selections[3], [130, 7]);
        // Slot zero keeps its initial value.
        assert_eq!(mirror.selections[0], [0, 1]);
    }

    #[test]
    fn test_selection_past_last_slot_discarded() {
        let mut mirror = ClientMirror::default();
        let before = mirror.selections;
        mirror.set_selection(200, 9);
        assert_eq!(mirror.selections, before);
    }

    #[test]
    fn test_client_info_display() {
        let info = ClientInfo {
            id: 3,
            nick: "alice".to_string(),
        };
        assert_eq!(info.to_string(), "alice (#3)");
    }
}
