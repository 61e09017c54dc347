//! High-level note operations over a Notewell SQLite database.
//!
//! [`NoteStore`] is the primary interface for all page mutations: content
//! load/save, metadata field updates, publish state, trash lifecycle, and
//! search. It owns a [`Storage`] connection constructed by the caller —
//! there are no module-level singleton clients, so tests substitute a
//! temporary database freely.

use crate::core::publish::published_path;
use crate::{
    BlockDocument, NoteEntity, NoteSearchResult, NoteSummary, NotewellError, Result, Storage,
    SubpageEntity, DEFAULT_EMOJI, DEFAULT_TITLE,
};
use rusqlite::types::Value as SqlValue;
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;
use uuid::Uuid;

/// A single metadata field update, the generic single-field write used for
/// title, emoji, and banner changes.
#[derive(Debug, Clone)]
pub enum NoteField {
    Title(String),
    Emoji(String),
    /// `None` clears the banner.
    Banner(Option<String>),
}

impl NoteField {
    fn column(&self) -> &'static str {
        match self {
            Self::Title(_) => "title",
            Self::Emoji(_) => "emoji",
            Self::Banner(_) => "banner",
        }
    }

    fn value(self) -> SqlValue {
        match self {
            Self::Title(t) | Self::Emoji(t) | Self::Banner(Some(t)) => SqlValue::Text(t),
            Self::Banner(None) => SqlValue::Null,
        }
    }
}

/// The world-readable view of a published page.
#[derive(Debug, Clone)]
pub struct PublishedPage {
    pub title: String,
    pub emoji: String,
    pub content: BlockDocument,
}

/// An open Notewell store backed by a SQLite database.
///
/// Every operation that touches an owned page takes the caller's identity
/// (an opaque email-equivalent string) and checks it against the note's
/// `author` through a single [`authorize`](NoteStore::authorize) guard, so
/// no code path can forget the ownership filter. The public read path
/// ([`load_published`](NoteStore::load_published)) is the one deliberate
/// exception.
pub struct NoteStore {
    storage: Storage,
}

impl NoteStore {
    /// Creates a new store database at `path` and initialises the schema.
    ///
    /// # Errors
    ///
    /// Returns [`crate::NotewellError::Database`] for any SQLite failure.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self {
            storage: Storage::create(path)?,
        })
    }

    /// Opens an existing store database at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::NotewellError::InvalidStore`] if the file is not a
    /// Notewell database, or [`crate::NotewellError::Database`] for any
    /// SQLite failure.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self {
            storage: Storage::open(path)?,
        })
    }

    /// Returns the underlying SQLite connection.
    pub fn connection(&self) -> &Connection {
        self.storage.connection()
    }

    /// Verifies that `identity` owns `note_id`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::NotewellError::NoteNotFound`] if the note does not
    /// exist, or [`crate::NotewellError::Unauthorized`] if the owner does
    /// not match.
    fn authorize(&self, identity: &str, note_id: &str) -> Result<()> {
        let author: Option<String> = self
            .connection()
            .query_row(
                "SELECT author FROM notes WHERE id = ?1",
                [note_id],
                |row| row.get(0),
            )
            .optional()?;
        match author {
            None => Err(NotewellError::NoteNotFound(note_id.to_string())),
            Some(a) if a != identity => Err(NotewellError::Unauthorized(note_id.to_string())),
            Some(_) => Ok(()),
        }
    }

    // ── Page lifecycle ────────────────────────────────────────────

    /// Creates an empty top-level note owned by `author` and returns its ID.
    ///
    /// The note starts with the default title and emoji and an empty block
    /// document, matching the explicit "new page" user action.
    pub fn create_note(&mut self, author: &str) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        let now = chrono::Utc::now().timestamp();
        let content = BlockDocument::empty().to_json()?;
        self.connection().execute(
            "INSERT INTO notes (id, title, emoji, banner, author, created_at, modified_at, content_json)
             VALUES (?1, ?2, ?3, NULL, ?4, ?5, ?5, ?6)",
            rusqlite::params![id, DEFAULT_TITLE, DEFAULT_EMOJI, author, now, content],
        )?;
        Ok(id)
    }

    /// Creates an empty subpage under `note_id` and returns its ID.
    ///
    /// The new subpage is appended after the existing subpages.
    pub fn create_subpage(&mut self, identity: &str, note_id: &str) -> Result<String> {
        self.authorize(identity, note_id)?;

        let id = Uuid::new_v4().to_string();
        let now = chrono::Utc::now().timestamp();
        let content = BlockDocument::empty().to_json()?;

        let tx = self.storage.connection_mut().transaction()?;
        let position: i64 = tx.query_row(
            "SELECT COALESCE(MAX(position) + 1, 0) FROM subpages WHERE parent_id = ?1",
            [note_id],
            |row| row.get(0),
        )?;
        tx.execute(
            "INSERT INTO subpages (id, parent_id, position, title, emoji, banner, created_at, modified_at, content_json)
             VALUES (?1, ?2, ?3, ?4, ?5, NULL, ?6, ?6, ?7)",
            rusqlite::params![id, note_id, position, DEFAULT_TITLE, DEFAULT_EMOJI, now, content],
        )?;
        tx.commit()?;
        Ok(id)
    }

    /// Fetches a full note with all of its subpages in position order.
    ///
    /// Trashed subpages are included with their `is_trash` flag set;
    /// listings are responsible for filtering.
    pub fn get_note(&self, identity: &str, note_id: &str) -> Result<NoteEntity> {
        self.authorize(identity, note_id)?;

        let mut note = self.connection().query_row(
            "SELECT id, title, emoji, banner, author, is_trash, deleted_at,
                    is_published, published_url, created_at, modified_at, content_json
             FROM notes WHERE id = ?1",
            [note_id],
            |row| {
                Ok(NoteEntity {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    emoji: row.get(2)?,
                    banner: row.get(3)?,
                    author: row.get(4)?,
                    is_trash: row.get::<_, i64>(5)? != 0,
                    deleted_at: row.get(6)?,
                    is_published: row.get::<_, i64>(7)? != 0,
                    published_url: row.get(8)?,
                    created_at: row.get(9)?,
                    modified_at: row.get(10)?,
                    content: BlockDocument::empty(),
                    subpages: Vec::new(),
                })
            },
        )?;

        let raw: String = self.connection().query_row(
            "SELECT content_json FROM notes WHERE id = ?1",
            [note_id],
            |row| row.get(0),
        )?;
        note.content = parse_content_lossy(&raw);

        let mut stmt = self.connection().prepare(
            "SELECT id, title, emoji, banner, is_trash, deleted_at,
                    is_published, published_url, created_at, modified_at, content_json
             FROM subpages WHERE parent_id = ?1 ORDER BY position ASC",
        )?;
        let subpages: Vec<SubpageEntity> = stmt
            .query_map([note_id], |row| {
                Ok((
                    SubpageEntity {
                        id: row.get(0)?,
                        title: row.get(1)?,
                        emoji: row.get(2)?,
                        banner: row.get(3)?,
                        is_trash: row.get::<_, i64>(4)? != 0,
                        deleted_at: row.get(5)?,
                        is_published: row.get::<_, i64>(6)? != 0,
                        published_url: row.get(7)?,
                        created_at: row.get(8)?,
                        modified_at: row.get(9)?,
                        content: BlockDocument::empty(),
                    },
                    row.get::<_, String>(10)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?
            .into_iter()
            .map(|(mut sub, raw)| {
                sub.content = parse_content_lossy(&raw);
                sub
            })
            .collect();
        note.subpages = subpages;

        Ok(note)
    }

    /// Lists the caller's notes, excluding trashed ones, most recently
    /// modified first.
    pub fn list_notes(&self, identity: &str) -> Result<Vec<NoteSummary>> {
        self.list_by_trash(identity, false)
    }

    /// Lists the caller's trashed notes, most recently modified first.
    pub fn list_trash(&self, identity: &str) -> Result<Vec<NoteSummary>> {
        self.list_by_trash(identity, true)
    }

    fn list_by_trash(&self, identity: &str, trashed: bool) -> Result<Vec<NoteSummary>> {
        let mut stmt = self.connection().prepare(
            "SELECT id, title, emoji, banner, is_trash, deleted_at,
                    is_published, published_url, modified_at
             FROM notes WHERE author = ?1 AND is_trash = ?2
             ORDER BY modified_at DESC",
        )?;
        let rows = stmt
            .query_map(rusqlite::params![identity, trashed as i64], |row| {
                Ok(NoteSummary {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    emoji: row.get(2)?,
                    banner: row.get(3)?,
                    is_trash: row.get::<_, i64>(4)? != 0,
                    deleted_at: row.get(5)?,
                    is_published: row.get::<_, i64>(6)? != 0,
                    published_url: row.get(7)?,
                    modified_at: row.get(8)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    // ── Content load/save ─────────────────────────────────────────

    /// Loads the block document of a note or subpage.
    ///
    /// Malformed stored content is recovered locally: the raw payload is
    /// moved into the row's `content_recovery` column, an empty document is
    /// written in its place, and the empty document is returned. The
    /// original bytes stay retrievable for manual repair instead of being
    /// overwritten by the next save.
    ///
    /// # Errors
    ///
    /// Returns [`crate::NotewellError::NoteNotFound`] /
    /// [`crate::NotewellError::SubpageNotFound`] if the target does not
    /// exist, or [`crate::NotewellError::Unauthorized`] for a non-owner.
    pub fn load_content(
        &self,
        identity: &str,
        note_id: &str,
        subpage_id: Option<&str>,
    ) -> Result<BlockDocument> {
        self.authorize(identity, note_id)?;

        let raw: String = match subpage_id {
            None => self.connection().query_row(
                "SELECT content_json FROM notes WHERE id = ?1",
                [note_id],
                |row| row.get(0),
            )?,
            Some(sub) => self
                .connection()
                .query_row(
                    "SELECT content_json FROM subpages WHERE parent_id = ?1 AND id = ?2",
                    [note_id, sub],
                    |row| row.get(0),
                )
                .optional()?
                .ok_or_else(|| NotewellError::SubpageNotFound(sub.to_string()))?,
        };

        match BlockDocument::from_json(&raw) {
            Ok(doc) => Ok(doc),
            Err(NotewellError::MalformedDocument) | Err(NotewellError::Json(_)) => {
                log::warn!(
                    "malformed content for note {note_id} (subpage {subpage_id:?}); \
                     moving raw payload to recovery column"
                );
                let empty = BlockDocument::empty();
                let empty_json = empty.to_json()?;
                match subpage_id {
                    None => self.connection().execute(
                        "UPDATE notes SET content_recovery = ?1, content_json = ?2 WHERE id = ?3",
                        rusqlite::params![raw, empty_json, note_id],
                    )?,
                    Some(sub) => self.connection().execute(
                        "UPDATE subpages SET content_recovery = ?1, content_json = ?2
                         WHERE parent_id = ?3 AND id = ?4",
                        rusqlite::params![raw, empty_json, note_id, sub],
                    )?,
                };
                Ok(empty)
            }
            Err(e) => Err(e),
        }
    }

    /// Replaces the block document of a note or subpage.
    ///
    /// Both targets are single-row updates: a subpage save cannot clobber a
    /// sibling subpage's content, so concurrent saves to different subpages
    /// of the same parent both land.
    pub fn save_content(
        &mut self,
        identity: &str,
        note_id: &str,
        subpage_id: Option<&str>,
        content: &BlockDocument,
    ) -> Result<()> {
        self.authorize(identity, note_id)?;

        let json = content.to_json()?;
        let now = chrono::Utc::now().timestamp();
        let changed = match subpage_id {
            None => self.connection().execute(
                "UPDATE notes SET content_json = ?1, modified_at = ?2 WHERE id = ?3",
                rusqlite::params![json, now, note_id],
            )?,
            Some(sub) => self.connection().execute(
                "UPDATE subpages SET content_json = ?1, modified_at = ?2
                 WHERE parent_id = ?3 AND id = ?4",
                rusqlite::params![json, now, note_id, sub],
            )?,
        };
        if changed == 0 {
            return Err(missing_target(note_id, subpage_id));
        }
        Ok(())
    }

    // ── Metadata fields ───────────────────────────────────────────

    /// Updates a single metadata field (title, emoji, or banner) on a note
    /// or subpage, refreshing `modified_at`.
    pub fn update_field(
        &mut self,
        identity: &str,
        note_id: &str,
        subpage_id: Option<&str>,
        field: NoteField,
    ) -> Result<()> {
        self.authorize(identity, note_id)?;

        let column = field.column();
        let value = field.value();
        let now = chrono::Utc::now().timestamp();
        let changed = match subpage_id {
            None => self.connection().execute(
                &format!("UPDATE notes SET {column} = ?1, modified_at = ?2 WHERE id = ?3"),
                rusqlite::params![value, now, note_id],
            )?,
            Some(sub) => self.connection().execute(
                &format!(
                    "UPDATE subpages SET {column} = ?1, modified_at = ?2
                     WHERE parent_id = ?3 AND id = ?4"
                ),
                rusqlite::params![value, now, note_id, sub],
            )?,
        };
        if changed == 0 {
            return Err(missing_target(note_id, subpage_id));
        }
        Ok(())
    }

    // ── Publish state ─────────────────────────────────────────────

    /// Publishes a note or subpage and returns its public path.
    ///
    /// `is_published` and `published_url` are written by one UPDATE
    /// statement, so the pair can never be observed half-set.
    pub fn publish(
        &mut self,
        identity: &str,
        note_id: &str,
        subpage_id: Option<&str>,
    ) -> Result<String> {
        self.authorize(identity, note_id)?;

        let url = published_path(note_id, subpage_id);
        let changed = match subpage_id {
            None => self.connection().execute(
                "UPDATE notes SET is_published = 1, published_url = ?1 WHERE id = ?2",
                rusqlite::params![url, note_id],
            )?,
            Some(sub) => self.connection().execute(
                "UPDATE subpages SET is_published = 1, published_url = ?1
                 WHERE parent_id = ?2 AND id = ?3",
                rusqlite::params![url, note_id, sub],
            )?,
        };
        if changed == 0 {
            return Err(missing_target(note_id, subpage_id));
        }
        Ok(url)
    }

    /// Unpublishes a note or subpage, clearing both publish fields together.
    pub fn unpublish(
        &mut self,
        identity: &str,
        note_id: &str,
        subpage_id: Option<&str>,
    ) -> Result<()> {
        self.authorize(identity, note_id)?;

        let changed = match subpage_id {
            None => self.connection().execute(
                "UPDATE notes SET is_published = 0, published_url = NULL WHERE id = ?1",
                [note_id],
            )?,
            Some(sub) => self.connection().execute(
                "UPDATE subpages SET is_published = 0, published_url = NULL
                 WHERE parent_id = ?1 AND id = ?2",
                [note_id, sub],
            )?,
        };
        if changed == 0 {
            return Err(missing_target(note_id, subpage_id));
        }
        Ok(())
    }

    // ── Trash lifecycle ───────────────────────────────────────────

    /// Moves a note or subpage to the trash.
    ///
    /// The row is retained until [`delete_permanent`](Self::delete_permanent);
    /// listings exclude it in the meantime.
    pub fn trash(&mut self, identity: &str, note_id: &str, subpage_id: Option<&str>) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        self.set_trash_state(identity, note_id, subpage_id, true, Some(now))
    }

    /// Restores a note or subpage from the trash.
    pub fn restore(
        &mut self,
        identity: &str,
        note_id: &str,
        subpage_id: Option<&str>,
    ) -> Result<()> {
        self.set_trash_state(identity, note_id, subpage_id, false, None)
    }

    fn set_trash_state(
        &mut self,
        identity: &str,
        note_id: &str,
        subpage_id: Option<&str>,
        trashed: bool,
        deleted_at: Option<i64>,
    ) -> Result<()> {
        self.authorize(identity, note_id)?;

        let changed = match subpage_id {
            None => self.connection().execute(
                "UPDATE notes SET is_trash = ?1, deleted_at = ?2 WHERE id = ?3",
                rusqlite::params![trashed as i64, deleted_at, note_id],
            )?,
            Some(sub) => self.connection().execute(
                "UPDATE subpages SET is_trash = ?1, deleted_at = ?2
                 WHERE parent_id = ?3 AND id = ?4",
                rusqlite::params![trashed as i64, deleted_at, note_id, sub],
            )?,
        };
        if changed == 0 {
            return Err(missing_target(note_id, subpage_id));
        }
        Ok(())
    }

    /// Permanently deletes a note (with all of its subpages) or one subpage.
    pub fn delete_permanent(
        &mut self,
        identity: &str,
        note_id: &str,
        subpage_id: Option<&str>,
    ) -> Result<()> {
        self.authorize(identity, note_id)?;

        let changed = match subpage_id {
            // Subpage rows go with the parent via ON DELETE CASCADE.
            None => self
                .connection()
                .execute("DELETE FROM notes WHERE id = ?1", [note_id])?,
            Some(sub) => self.connection().execute(
                "DELETE FROM subpages WHERE parent_id = ?1 AND id = ?2",
                [note_id, sub],
            )?,
        };
        if changed == 0 {
            return Err(missing_target(note_id, subpage_id));
        }
        Ok(())
    }

    // ── Public read path ──────────────────────────────────────────

    /// Loads a published page by its IDs, with no identity check.
    ///
    /// Publishing makes the page world-readable at its public path; a page
    /// that is unpublished, trashed, or whose parent is trashed reads as
    /// not found.
    pub fn load_published(
        &self,
        note_id: &str,
        subpage_id: Option<&str>,
    ) -> Result<PublishedPage> {
        let row: Option<(String, String, String)> = match subpage_id {
            None => self
                .connection()
                .query_row(
                    "SELECT title, emoji, content_json FROM notes
                     WHERE id = ?1 AND is_published = 1 AND is_trash = 0",
                    [note_id],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
                )
                .optional()?,
            Some(sub) => self
                .connection()
                .query_row(
                    "SELECT s.title, s.emoji, s.content_json
                     FROM subpages s JOIN notes n ON n.id = s.parent_id
                     WHERE s.parent_id = ?1 AND s.id = ?2
                       AND s.is_published = 1 AND s.is_trash = 0 AND n.is_trash = 0",
                    [note_id, sub],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
                )
                .optional()?,
        };

        let (title, emoji, raw) = row.ok_or_else(|| missing_target(note_id, subpage_id))?;
        Ok(PublishedPage {
            title,
            emoji,
            content: parse_content_lossy(&raw),
        })
    }

    // ── Search ────────────────────────────────────────────────────

    /// Case-insensitive substring search over the caller's non-trashed
    /// pages: titles and block plain text. No relevance ranking.
    pub fn search_notes(&self, identity: &str, query: &str) -> Result<Vec<NoteSearchResult>> {
        let needle = query.to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }
        let mut results = Vec::new();

        let mut stmt = self.connection().prepare(
            "SELECT id, title, content_json FROM notes
             WHERE author = ?1 AND is_trash = 0 ORDER BY modified_at DESC",
        )?;
        let notes = stmt
            .query_map([identity], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        for (id, title, raw) in notes {
            if let Some(snippet) = match_page(&needle, &title, &raw) {
                results.push(NoteSearchResult {
                    note_id: id,
                    subpage_id: None,
                    title,
                    snippet,
                });
            }
        }

        let mut stmt = self.connection().prepare(
            "SELECT s.parent_id, s.id, s.title, s.content_json
             FROM subpages s JOIN notes n ON n.id = s.parent_id
             WHERE n.author = ?1 AND n.is_trash = 0 AND s.is_trash = 0
             ORDER BY s.modified_at DESC",
        )?;
        let subpages = stmt
            .query_map([identity], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        for (parent_id, id, title, raw) in subpages {
            if let Some(snippet) = match_page(&needle, &title, &raw) {
                results.push(NoteSearchResult {
                    note_id: parent_id,
                    subpage_id: Some(id),
                    title,
                    snippet,
                });
            }
        }

        Ok(results)
    }
}

/// Parses stored content, substituting an empty document when unreadable.
/// Read-only paths use this; the editor load path goes through
/// [`NoteStore::load_content`] which additionally preserves the raw bytes.
fn parse_content_lossy(raw: &str) -> BlockDocument {
    BlockDocument::from_json(raw).unwrap_or_else(|_| BlockDocument {
        time: 0,
        blocks: Vec::new(),
        version: String::new(),
    })
}

fn missing_target(note_id: &str, subpage_id: Option<&str>) -> NotewellError {
    match subpage_id {
        Some(sub) => NotewellError::SubpageNotFound(sub.to_string()),
        None => NotewellError::NoteNotFound(note_id.to_string()),
    }
}

/// Returns a plain-text snippet when `needle` matches the title or any
/// block's plain text. A match found only in the title yields the title
/// itself, so the snippet is never empty for a hit.
fn match_page(needle: &str, title: &str, raw_content: &str) -> Option<String> {
    const SNIPPET_LEN: usize = 120;

    let doc = parse_content_lossy(raw_content);
    for block in &doc.blocks {
        let text = block.plain_text();
        if text.to_lowercase().contains(needle) {
            let snippet: String = text.chars().take(SNIPPET_LEN).collect();
            return Some(snippet);
        }
    }
    if title.to_lowercase().contains(needle) {
        return Some(title.chars().take(SNIPPET_LEN).collect());
    }
    None
}
