use anishelf_model::{parse_genres, Entry, EntryDraft, EntryPatch, EntryStatus};
use anishelf_types::{EntryId, IdentityId};
use pretty_assertions::assert_eq;
use serde_json::json;

fn make_entry(synopsis: &str, genres: &[&str]) -> Entry {
    Entry {
        id: EntryId::new(1),
        owner_id: IdentityId::new(),
        title: "Frieren".to_string(),
        cover_url: "https://example.com/frieren.jpg".to_string(),
        synopsis: synopsis.to_string(),
        genres: genres.iter().map(|g| g.to_string()).collect(),
        status: EntryStatus::Favorite,
        rating: 9.5,
        watched_on: None,
        created_at: None,
        updated_at: None,
    }
}

// ── EntryStatus ──────────────────────────────────────────────────

#[test]
fn status_wire_strings() {
    assert_eq!(EntryStatus::Seen.as_wire(), "Visto");
    assert_eq!(EntryStatus::Watching.as_wire(), "Viéndolo");
    assert_eq!(EntryStatus::ToWatch.as_wire(), "Por ver");
    assert_eq!(EntryStatus::Favorite.as_wire(), "Favorito");
    assert_eq!(EntryStatus::Dropped.as_wire(), "Dropped");
}

#[test]
fn status_serde_uses_wire_strings() {
    assert_eq!(serde_json::to_value(EntryStatus::ToWatch).unwrap(), json!("Por ver"));
    let parsed: EntryStatus = serde_json::from_value(json!("Viéndolo")).unwrap();
    assert_eq!(parsed, EntryStatus::Watching);
}

#[test]
fn status_parse_accepts_names() {
    assert_eq!(EntryStatus::parse("favorite"), Some(EntryStatus::Favorite));
    assert_eq!(EntryStatus::parse("TO_WATCH"), Some(EntryStatus::ToWatch));
    assert_eq!(EntryStatus::parse(" Favorito "), Some(EntryStatus::Favorite));
    assert_eq!(EntryStatus::parse("abandoned"), None);
    assert!("abandoned".parse::<EntryStatus>().is_err());
}

#[test]
fn status_default_is_seen() {
    assert_eq!(EntryStatus::default(), EntryStatus::Seen);
    assert!(EntryStatus::Favorite.is_favorite());
    assert!(!EntryStatus::Seen.is_favorite());
}

// ── Presentation helpers ─────────────────────────────────────────

#[test]
fn synopsis_preview_truncates_on_chars() {
    let e = make_entry("Élfica maga", &[]);
    assert_eq!(e.synopsis_preview(5), "Élfic...");
    assert_eq!(e.synopsis_preview(100), "Élfica maga");
}

#[test]
fn synopsis_preview_exact_length_has_no_ellipsis() {
    let e = make_entry("abc", &[]);
    assert_eq!(e.synopsis_preview(3), "abc");
}

#[test]
fn genre_preview_reports_overflow() {
    let e = make_entry("", &["A", "B", "C", "D", "E"]);
    let (shown, rest) = e.genre_preview(3);
    assert_eq!(shown.len(), 3);
    assert_eq!(rest, 2);

    let short = make_entry("", &["A"]);
    let (shown, rest) = short.genre_preview(3);
    assert_eq!(shown, &["A".to_string()]);
    assert_eq!(rest, 0);
}

// ── Drafts & patches ─────────────────────────────────────────────

#[test]
fn draft_defaults() {
    let d = EntryDraft::new("Mushishi");
    assert_eq!(d.status, EntryStatus::Seen);
    assert_eq!(d.rating, 0.0);
    assert!(d.genres.is_empty());
    assert!(d.validate().is_ok());
}

#[test]
fn draft_rejects_blank_title() {
    assert!(EntryDraft::new("   ").validate().is_err());
}

#[test]
fn draft_to_record_uses_wire_columns() {
    let owner = IdentityId::new();
    let mut d = EntryDraft::new("Mushishi");
    d.genres = vec!["Misterio".to_string()];
    d.rating = 8.5;
    let record = d.to_record(&owner);
    assert_eq!(record["user_id"], json!(owner.to_string()));
    assert_eq!(record["titulo"], json!("Mushishi"));
    assert_eq!(record["generos"], json!(["Misterio"]));
    assert_eq!(record["estado"], json!("Visto"));
    assert_eq!(record["rating"], json!(8.5));
}

#[test]
fn patch_only_sends_present_fields() {
    let patch = EntryPatch {
        rating: Some(7.0),
        status: Some(EntryStatus::Dropped),
        ..Default::default()
    };
    assert_eq!(patch.to_record(), json!({"rating": 7.0, "estado": "Dropped"}));
}

#[test]
fn patch_validation() {
    assert!(EntryPatch::default().validate().is_err());
    let blank_title = EntryPatch {
        title: Some(" ".to_string()),
        ..Default::default()
    };
    assert!(blank_title.validate().is_err());
    let ok = EntryPatch {
        rating: Some(1.0),
        ..Default::default()
    };
    assert!(ok.validate().is_ok());
}

// ── Genre parsing ────────────────────────────────────────────────

#[test]
fn parse_genres_trims_and_drops_empty() {
    assert_eq!(
        parse_genres("Acción, Comedia ,, Drama,"),
        vec!["Acción".to_string(), "Comedia".to_string(), "Drama".to_string()]
    );
    assert!(parse_genres("").is_empty());
    assert!(parse_genres(" , ").is_empty());
}
