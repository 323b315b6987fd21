//! Developer guardrails and invariants
//!
//! Debug assertions for detecting impossible registry states during
//! development. These checks are compiled out in release builds.

use crate::models::{ClientId, MAX_CLIENTS};

/// Validate the client table: ids in range and pairwise distinct,
/// nicknames pairwise distinct, count within the cap.
pub fn assert_client_table_invariants(ids: &[ClientId], nicks: &[&str]) {
    debug_assert!(
        ids.len() <= MAX_CLIENTS,
        "client table holds {} entries, cap is {}",
        ids.len(),
        MAX_CLIENTS
    );

    for (i, id) in ids.iter().enumerate() {
        debug_assert!(
            (*id as usize) < MAX_CLIENTS,
            "client id {id} outside the allocation pool"
        );
        debug_assert!(!ids[i + 1..].contains(id), "duplicate client id {id}");
    }

    for (i, nick) in nicks.iter().enumerate() {
        debug_assert!(
            !nicks[i + 1..].contains(nick),
            "duplicate nickname {nick:?}"
        );
    }
}

/// Validate a room: non-empty membership, no duplicate members, and an
/// operator who is a member.
pub fn assert_room_invariants(name: &str, members: &[ClientId], operator: Option<ClientId>) {
    debug_assert!(
        !members.is_empty(),
        "room {name:?} retained with no members"
    );

    if let Some(op) = operator {
        debug_assert!(
            members.contains(&op),
            "room {name:?} operator {op} is not a member"
        );
    }

    for (i, member) in members.iter().enumerate() {
        debug_assert!(
            !members[i + 1..].contains(member),
            "room {name:?} lists client {member} twice"
        );
    }
}

/// Validate that a client sits in at most one room (zero while
/// handshaking, one thereafter).
pub fn assert_single_membership(id: ClientId, containing_rooms: usize) {
    debug_assert!(
        containing_rooms <= 1,
        "client {id} is a member of {containing_rooms} rooms"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_client_table() {
        assert_client_table_invariants(&[0, 1, 5], &["a", "b", "c"]);
        assert_client_table_invariants(&[], &[]);
    }

    #[test]
    #[should_panic(expected = "duplicate client id")]
    fn test_duplicate_id_panics() {
        assert_client_table_invariants(&[0, 1, 1], &[]);
    }

    #[test]
    #[should_panic(expected = "duplicate nickname")]
    fn test_duplicate_nick_panics() {
        assert_client_table_invariants(&[0, 1], &["same", "same"]);
    }

    #[test]
    #[should_panic(expected = "outside the allocation pool")]
    fn test_id_out_of_range_panics() {
        assert_client_table_invariants(&[255], &[]);
    }

    #[test]
    fn test_valid_room() {
        assert_room_invariants("r1", &[3, 7], Some(3));
    }

    #[test]
    #[should_panic(expected = "retained with no members")]
    fn test_empty_room_panics() {
        assert_room_invariants("r1", &[], None);
    }

    #[test]
    #[should_panic(expected = "is not a member")]
    fn test_foreign_operator_panics() {
        assert_room_invariants("r1", &[3, 7], Some(9));
    }

    #[test]
    #[should_panic(expected = "is a member of 2 rooms")]
    fn test_double_membership_panics() {
        assert_single_membership(4, 2);
    }
}
