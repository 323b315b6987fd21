//! Room naming
//!
//! Room names follow the same charset and length rules as nicknames
//! (see `validate`). Rooms are created on first join and deleted on last
//! part; only the lobby name is special.

/// The implicit lobby room every client joins right after the handshake.
pub const LOBBY: &str = "null";

/// True if `name` is the implicit lobby.
pub fn is_lobby(name: &str) -> bool {
    name == LOBBY
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lobby_name() {
        assert!(is_lobby(LOBBY));
        assert!(!is_lobby("nulls"));
        assert!(!is_lobby(""));
    }
}
