//! Opcode table and frame builders
//!
//! Byte-level layout for every frame the server reads or writes.
//! Multi-byte integers are big-endian; they occur only in the 3-byte
//! length fields of stamp and sync frames. Text fields are printable
//! ASCII, NUL-terminated.

use pewter_core::ClientId;

/// Handshake acceptance byte.
pub const HANDSHAKE_OK: u8 = 1;

/// Wire opcodes. Client opcodes double as relay opcodes: a relayed
/// frame keeps its opcode and gains the origin id as its second byte.
pub mod op {
    /// Keep-alive; resets the idle timer just by arriving.
    pub const PING: u8 = 2;

    /// Join a named room. Server → joiner, it opens the replay stream
    /// with the roster count.
    pub const JOIN: u8 = 16;
    /// A peer joined the room (server → client).
    pub const JOIN_NOTICE: u8 = 17;
    /// A peer left the room (server → client).
    pub const PART_NOTICE: u8 = 18;
    /// Chat line.
    pub const CHAT: u8 = 19;
    /// Emote; observers render it as `"* "` + text.
    pub const EMOTE: u8 = 20;
    /// Kick a room member by nickname (operator only).
    pub const KICK: u8 = 21;
    /// Colored server notice (server → client).
    pub const SERVER_MESSAGE: u8 = 22;

    pub const MOUSE_POS: u8 = 32;
    pub const MOUSE_CLICK: u8 = 33;
    pub const BRUSH_SIZE: u8 = 34;
    pub const BRUSH_SHAPE: u8 = 35;
    pub const MODIFIER: u8 = 36;
    pub const SELECT_ELEMENT: u8 = 37;
    pub const REPLACE_MODE: u8 = 38;

    pub const CMODE: u8 = 48;
    pub const PAUSE: u8 = 49;
    pub const STEP_FRAME: u8 = 50;
    pub const DECO_MODE: u8 = 51;
    /// Deprecated on the client; still relayed.
    pub const HUD_MODE: u8 = 52;
    pub const AMBIENT_HEAT: u8 = 53;
    pub const NEWTONIAN_GRAVITY: u8 = 54;
    pub const DEBUG_MODE: u8 = 55;
    pub const LEGACY_HEAT: u8 = 56;
    pub const WATER_EQUALIZATION: u8 = 57;
    pub const GRAVITY_MODE: u8 = 58;
    pub const AIR_MODE: u8 = 59;
    pub const CLEAR_SPARKS: u8 = 60;
    pub const CLEAR_PRESSURE: u8 = 61;
    pub const INVERT_PRESSURE: u8 = 62;
    pub const CLEAR_SIM: u8 = 63;
    pub const MANUAL_GRAPHICS: u8 = 64;
    pub const DECO_COLOR: u8 = 65;
    /// Stamp placement: 3-byte location, 3-byte length, payload.
    pub const STAMP: u8 = 66;
    pub const CLEAR_AREA: u8 = 67;
    pub const EDGE_MODE: u8 = 68;
    pub const LOAD_SAVE: u8 = 69;
    pub const RELOAD_SAVE: u8 = 70;

    /// Server → peer: request a sync stamp for a joiner.
    /// Client → server: the reply carrying that stamp.
    pub const SYNC_REQUEST: u8 = 128;
    /// Forwarded sync stamp (server → joiner).
    pub const SYNC_STAMP: u8 = 129;
    /// Property-snapshot reply; unpacks into whitelisted state opcodes.
    pub const SYNC_PROPS: u8 = 130;
}

/// Fixed payload length (bytes after the opcode) for plain relay
/// opcodes. Opcodes with structured payloads or server-side effects are
/// dispatched explicitly and are not listed here.
pub fn relay_payload_len(opcode: u8) -> Option<usize> {
    Some(match opcode {
        op::MOUSE_CLICK
        | op::MODIFIER
        | op::CMODE
        | op::PAUSE
        | op::DECO_MODE
        | op::HUD_MODE
        | op::AMBIENT_HEAT
        | op::NEWTONIAN_GRAVITY
        | op::DEBUG_MODE
        | op::LEGACY_HEAT
        | op::WATER_EQUALIZATION
        | op::GRAVITY_MODE
        | op::AIR_MODE
        | op::EDGE_MODE => 1,
        op::MOUSE_POS | op::MANUAL_GRAPHICS | op::LOAD_SAVE => 3,
        op::CLEAR_AREA => 6,
        op::STEP_FRAME
        | op::CLEAR_SPARKS
        | op::CLEAR_PRESSURE
        | op::INVERT_PRESSURE
        | op::CLEAR_SIM
        | op::RELOAD_SAVE => 0,
        _ => return None,
    })
}

/// Opcodes a sync-properties reply may unpack into: exactly the state
/// the server mirrors for replay.
pub const SYNC_PROP_OPS: [u8; 5] = [
    op::BRUSH_SIZE,
    op::BRUSH_SHAPE,
    op::SELECT_ELEMENT,
    op::REPLACE_MODE,
    op::DECO_COLOR,
];

/// True if a sync-properties reply may carry `opcode`.
pub fn sync_prop_allowed(opcode: u8) -> bool {
    SYNC_PROP_OPS.contains(&opcode)
}

/// Default foreground color for server notices.
pub const NOTICE_RGB: [u8; 3] = [127, 255, 255];

/// Red used for kick notices.
pub const KICK_RGB: [u8; 3] = [255, 50, 50];

/// Chat-window focus sentinel carried by a select-element frame.
pub const CHAT_SENTINEL: [u8; 2] = [194, 195];

/// Decode a 3-byte big-endian length field.
pub fn len_be3(bytes: &[u8]) -> usize {
    ((bytes[0] as usize) << 16) | ((bytes[1] as usize) << 8) | bytes[2] as usize
}

/// Relay frame: `[opcode, origin, payload…]`.
pub fn relay(opcode: u8, origin: ClientId, payload: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(2 + payload.len());
    frame.push(opcode);
    frame.push(origin);
    frame.extend_from_slice(payload);
    frame
}

/// Relay frame with a trailing NUL: `[opcode, origin, text…, 0]`
/// (chat and emote).
pub fn relay_text(opcode: u8, origin: ClientId, text: &[u8]) -> Vec<u8> {
    let mut frame = relay(opcode, origin, text);
    frame.push(0);
    frame
}

/// Server notice: `[22, text…, 0, r, g, b]`.
pub fn server_message(text: &str, rgb: [u8; 3]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(text.len() + 5);
    frame.push(op::SERVER_MESSAGE);
    frame.extend_from_slice(text.as_bytes());
    frame.push(0);
    frame.extend_from_slice(&rgb);
    frame
}

/// Pre-close error frame: `[0, reason…, 0]`.
pub fn error_frame(reason: &str) -> Vec<u8> {
    let mut frame = Vec::with_capacity(reason.len() + 2);
    frame.push(0);
    frame.extend_from_slice(reason.as_bytes());
    frame.push(0);
    frame
}
