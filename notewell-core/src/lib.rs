//! Core library for Notewell — a block-based, page-oriented note-taking
//! application.
//!
//! The primary entry point is [`NoteStore`], which represents an open
//! Notewell SQLite database. All page mutations go through `NoteStore`
//! methods; interactive editing layers a debounced [`EditorSession`] on
//! top, and the published read path renders stored [`BlockDocument`]s to
//! HTML via [`render_document`].
//!
//! Types are re-exported from their respective sub-modules for convenience;
//! consumers should import from the crate root rather than the `core` module.

pub mod core;

// Re-export commonly used types.
#[doc(inline)]
pub use core::{
    assets::{AssetKind, AssetStore},
    block::{Block, BlockData, BlockDocument, SCHEMA_VERSION},
    error::{NotewellError, Result},
    note::{NoteEntity, NoteSearchResult, NoteSummary, SubpageEntity, DEFAULT_EMOJI, DEFAULT_TITLE},
    process::process_document,
    publish::published_path,
    render::{render_block, render_document},
    session::{EditorSession, SessionState},
    storage::Storage,
    store::{NoteField, NoteStore, PublishedPage},
};
