//! Page entities: top-level notes and their embedded-one-level subpages.

use crate::BlockDocument;
use serde::{Deserialize, Serialize};

/// Emoji assigned to freshly created pages.
pub const DEFAULT_EMOJI: &str = "📄";

/// Title assigned to freshly created pages.
pub const DEFAULT_TITLE: &str = "Untitled";

/// A top-level user-owned page.
///
/// Visibility and mutation are gated only by `author` equality; there is no
/// role or permission model. `is_trash` excludes the note from normal
/// listings until it is restored or permanently deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteEntity {
    pub id: String,
    pub title: String,
    pub emoji: String,
    /// Asset URL of the banner image, if one was uploaded.
    pub banner: Option<String>,
    /// Owner identity — an opaque email-equivalent string.
    pub author: String,
    pub is_trash: bool,
    pub deleted_at: Option<i64>,
    pub is_published: bool,
    /// Deterministic public path; set iff `is_published`.
    pub published_url: Option<String>,
    pub created_at: i64,
    pub modified_at: i64,
    pub content: BlockDocument,
    /// One level of nesting only — subpages have no subpages of their own.
    pub subpages: Vec<SubpageEntity>,
}

/// A child page of a [`NoteEntity`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubpageEntity {
    pub id: String,
    pub title: String,
    pub emoji: String,
    pub banner: Option<String>,
    pub is_trash: bool,
    pub deleted_at: Option<i64>,
    pub is_published: bool,
    pub published_url: Option<String>,
    pub created_at: i64,
    pub modified_at: i64,
    pub content: BlockDocument,
}

/// A row in a note listing — metadata only, no content.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteSummary {
    pub id: String,
    pub title: String,
    pub emoji: String,
    pub banner: Option<String>,
    pub is_trash: bool,
    pub deleted_at: Option<i64>,
    pub is_published: bool,
    pub published_url: Option<String>,
    pub modified_at: i64,
}

/// One hit from a substring search over a user's notes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteSearchResult {
    pub note_id: String,
    /// Set when the match was found inside a subpage.
    pub subpage_id: Option<String>,
    pub title: String,
    /// Plain-text fragment around the match.
    pub snippet: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_serializes_camel_case() {
        let note = NoteEntity {
            id: "n1".to_string(),
            title: DEFAULT_TITLE.to_string(),
            emoji: DEFAULT_EMOJI.to_string(),
            banner: None,
            author: "ada@example.com".to_string(),
            is_trash: false,
            deleted_at: None,
            is_published: false,
            published_url: None,
            created_at: 1,
            modified_at: 1,
            content: BlockDocument::empty(),
            subpages: vec![],
        };
        let json = serde_json::to_string(&note).unwrap();
        assert!(json.contains("\"isTrash\":false"));
        assert!(json.contains("\"publishedUrl\":null"));
        assert!(json.contains("\"subpages\":[]"));
    }

    #[test]
    fn test_search_result_round_trip() {
        let hit = NoteSearchResult {
            note_id: "n1".to_string(),
            subpage_id: Some("s1".to_string()),
            title: "Plans".to_string(),
            snippet: "meeting notes".to_string(),
        };
        let json = serde_json::to_string(&hit).unwrap();
        assert!(json.contains("\"subpageId\":\"s1\""));
        let back: NoteSearchResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back.note_id, "n1");
    }
}
