use anishelf_types::{EntryId, IdentityId, GUEST_NAMESPACE};
use proptest::prelude::*;
use std::collections::HashSet;
use std::str::FromStr;

// ── EntryId ──────────────────────────────────────────────────────

#[test]
fn entry_id_display_and_parse() {
    let id = EntryId::new(42);
    assert_eq!(id.to_string(), "42");
    assert_eq!(EntryId::parse("42").unwrap(), id);
}

#[test]
fn entry_id_parse_trims_whitespace() {
    assert_eq!(EntryId::parse(" 7 ").unwrap(), EntryId::new(7));
}

#[test]
fn entry_id_parse_invalid() {
    assert!(EntryId::parse("seven").is_err());
    assert!(EntryId::from_str("").is_err());
}

#[test]
fn entry_id_serializes_as_plain_number() {
    let json = serde_json::to_string(&EntryId::new(12)).unwrap();
    assert_eq!(json, "12");
    let back: EntryId = serde_json::from_str("12").unwrap();
    assert_eq!(back.get(), 12);
}

#[test]
fn entry_id_ordering_follows_raw_value() {
    assert!(EntryId::new(1) < EntryId::new(2));
}

// ── IdentityId ───────────────────────────────────────────────────

#[test]
fn identity_id_new_is_unique() {
    assert_ne!(IdentityId::new(), IdentityId::new());
}

#[test]
fn identity_id_display_and_parse() {
    let id = IdentityId::new();
    let parsed = IdentityId::parse(&id.to_string()).unwrap();
    assert_eq!(id, parsed);
}

#[test]
fn identity_id_parse_invalid() {
    assert!(IdentityId::parse("not-a-uuid").is_err());
}

#[test]
fn identity_id_hash_and_eq() {
    let id = IdentityId::new();
    let mut set = HashSet::new();
    set.insert(id);
    set.insert(id);
    assert_eq!(set.len(), 1);
}

#[test]
fn identity_id_short_prefix() {
    let id = IdentityId::parse("0f8fad5b-d9cb-469f-a165-70867728950e").unwrap();
    assert_eq!(id.short(6), "0f8fad");
}

#[test]
fn namespace_falls_back_to_guest() {
    assert_eq!(IdentityId::namespace(None), GUEST_NAMESPACE);
    let id = IdentityId::new();
    assert_eq!(IdentityId::namespace(Some(&id)), id.to_string());
}

proptest! {
    #[test]
    fn entry_id_parse_inverts_display(raw in any::<i64>()) {
        let id = EntryId::new(raw);
        prop_assert_eq!(EntryId::parse(&id.to_string()).unwrap(), id);
    }
}
