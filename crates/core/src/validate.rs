//! Field validation for wire text
//!
//! The frame layer reads unbounded NUL-terminated strings; these rules
//! are enforced by the callers that give the bytes meaning.

/// Maximum nickname / room-name length in bytes.
pub const MAX_NAME_LEN: usize = 32;

/// Maximum chat / emote / kick-reason length in bytes.
pub const MAX_MESSAGE_LEN: usize = 200;

/// Nickname and room-name charset: `[A-Za-z0-9_-]`, at least one byte.
pub fn valid_name_charset(name: &[u8]) -> bool {
    !name.is_empty()
        && name
            .iter()
            .all(|&b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

/// Full nickname / room-name rule: charset plus the length cap.
pub fn valid_name(name: &[u8]) -> bool {
    valid_name_charset(name) && name.len() <= MAX_NAME_LEN
}

/// Printable-ASCII rule for message text: every byte in `0x20..=0x7E`.
/// An empty message is allowed.
pub fn printable(text: &[u8]) -> bool {
    text.iter().all(|&b| (0x20..=0x7E).contains(&b))
}

/// Full message rule: printable and within the length cap.
pub fn valid_message(text: &[u8]) -> bool {
    printable(text) && text.len() <= MAX_MESSAGE_LEN
}
