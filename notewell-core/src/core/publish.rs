//! Deterministic public paths for published pages.
//!
//! A published page is world-readable at a path derived from its IDs; no
//! further access control applies. The derivation must stay stable because
//! stored `published_url` values are compared against it.

/// Returns the public path for a note or one of its subpages.
///
/// Top-level notes publish at `/published/{noteId}`, subpages at
/// `/published/{noteId}/{subpageId}`.
#[must_use]
pub fn published_path(note_id: &str, subpage_id: Option<&str>) -> String {
    match subpage_id {
        Some(sub) => format!("/published/{note_id}/{sub}"),
        None => format!("/published/{note_id}"),
    }
}
