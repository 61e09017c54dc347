//! Editor session lifecycle: load, change-triggered save, teardown.
//!
//! An [`EditorSession`] binds one editing surface to one page identity
//! (`note_id` plus optional `subpage_id`). The session moves through
//! `Uninitialized → Loading → Ready → Saving → Ready … → Destroyed`; a
//! destroyed session cannot be reused, and switching to a different page
//! tears the current state down (flushing pending edits) before loading
//! the new one.
//!
//! Change events are debounced: each [`apply_change`](EditorSession::apply_change)
//! replaces the pending document rather than issuing an immediate write,
//! and a save happens on [`flush`](EditorSession::flush), on
//! [`flush_if_quiet`](EditorSession::flush_if_quiet) after the quiet period,
//! on a page switch, and on [`close`](EditorSession::close). The state that
//! finally persists after a burst of edits is always the last change's
//! state.

use crate::core::process::process_document;
use crate::{BlockDocument, NoteStore, NotewellError, Result};
use std::time::{Duration, Instant};

/// How long a session waits after the last change before
/// [`flush_if_quiet`](EditorSession::flush_if_quiet) writes it out.
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(800);

/// The lifecycle state of an [`EditorSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Loading,
    Ready,
    Saving,
    Destroyed,
}

/// One interactive editing surface bound to one page.
pub struct EditorSession<'a> {
    store: &'a mut NoteStore,
    identity: String,
    note_id: String,
    subpage_id: Option<String>,
    state: SessionState,
    document: Option<BlockDocument>,
    pending: Option<BlockDocument>,
    last_change: Option<Instant>,
    quiet_period: Duration,
}

impl<'a> EditorSession<'a> {
    /// Creates an unopened session for the given page identity.
    pub fn new(
        store: &'a mut NoteStore,
        identity: &str,
        note_id: &str,
        subpage_id: Option<&str>,
    ) -> Self {
        Self {
            store,
            identity: identity.to_string(),
            note_id: note_id.to_string(),
            subpage_id: subpage_id.map(str::to_string),
            state: SessionState::Uninitialized,
            document: None,
            pending: None,
            last_change: None,
            quiet_period: DEFAULT_QUIET_PERIOD,
        }
    }

    /// Overrides the debounce quiet period (mainly for tests).
    pub fn set_quiet_period(&mut self, period: Duration) {
        self.quiet_period = period;
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The working document, once the session is `Ready`.
    #[must_use]
    pub fn document(&self) -> Option<&BlockDocument> {
        self.document.as_ref()
    }

    /// Loads the page content and initializes the editing surface.
    ///
    /// Malformed stored content arrives as an empty document (the store
    /// preserves the raw payload for recovery), so the surface always
    /// initializes.
    ///
    /// # Errors
    ///
    /// Returns [`crate::NotewellError::SessionDestroyed`] after [`close`](Self::close),
    /// or any load error from the store.
    pub fn open(&mut self) -> Result<()> {
        if self.state == SessionState::Destroyed {
            return Err(NotewellError::SessionDestroyed);
        }
        self.state = SessionState::Loading;
        let doc = match self
            .store
            .load_content(&self.identity, &self.note_id, self.subpage_id.as_deref())
        {
            Ok(doc) => doc,
            Err(e) => {
                self.state = SessionState::Uninitialized;
                return Err(e);
            }
        };
        self.document = Some(doc);
        self.state = SessionState::Ready;
        Ok(())
    }

    /// Re-binds the session to a different page.
    ///
    /// Treated as a full re-entry into loading, not an incremental update:
    /// pending edits for the old page are flushed first, then the old
    /// surface is discarded and the new page is loaded.
    pub fn switch(&mut self, note_id: &str, subpage_id: Option<&str>) -> Result<()> {
        if self.state == SessionState::Destroyed {
            return Err(NotewellError::SessionDestroyed);
        }
        self.flush()?;
        self.document = None;
        self.note_id = note_id.to_string();
        self.subpage_id = subpage_id.map(str::to_string);
        self.open()
    }

    /// Records a content-change event from the editing surface.
    ///
    /// The document is normalized through the content post-processor and
    /// kept as the pending state; it is persisted on the next flush. Only
    /// the most recent change is retained.
    pub fn apply_change(&mut self, doc: BlockDocument) -> Result<()> {
        match self.state {
            SessionState::Ready | SessionState::Saving => {}
            SessionState::Destroyed => return Err(NotewellError::SessionDestroyed),
            _ => return Err(NotewellError::SessionNotReady),
        }
        let processed = process_document(doc);
        self.document = Some(processed.clone());
        self.pending = Some(processed);
        self.last_change = Some(Instant::now());
        Ok(())
    }

    /// Persists the pending document, if any.
    ///
    /// A save failure leaves the pending state in place so a later flush
    /// can retry; processing is idempotent, so the retry writes the same
    /// bytes.
    pub fn flush(&mut self) -> Result<()> {
        let Some(doc) = self.pending.take() else {
            return Ok(());
        };
        self.state = SessionState::Saving;
        let result = self.store.save_content(
            &self.identity,
            &self.note_id,
            self.subpage_id.as_deref(),
            &doc,
        );
        match result {
            Ok(()) => {
                self.state = SessionState::Ready;
                self.last_change = None;
                Ok(())
            }
            Err(e) => {
                self.pending = Some(doc);
                self.state = SessionState::Ready;
                Err(e)
            }
        }
    }

    /// Flushes only if the quiet period has elapsed since the last change.
    ///
    /// Returns `true` when a save was performed.
    pub fn flush_if_quiet(&mut self) -> Result<bool> {
        match self.last_change {
            Some(at) if at.elapsed() >= self.quiet_period => {
                self.flush()?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Accepts externally generated content (e.g. from an AI collaborator).
    ///
    /// This is a forced content injection, not a user edit: the post-
    /// processor is bypassed, because the generating collaborator is
    /// responsible for supplying already-normalized block data. If the
    /// surface has not been created yet the injection initializes it;
    /// the document is persisted immediately either way.
    pub fn inject_generated(&mut self, doc: BlockDocument) -> Result<()> {
        if self.state == SessionState::Destroyed {
            return Err(NotewellError::SessionDestroyed);
        }
        let prior = self.state;
        self.state = SessionState::Saving;
        let result = self.store.save_content(
            &self.identity,
            &self.note_id,
            self.subpage_id.as_deref(),
            &doc,
        );
        match result {
            Ok(()) => {
                self.document = Some(doc);
                self.pending = None;
                self.last_change = None;
                self.state = SessionState::Ready;
                Ok(())
            }
            Err(e) => {
                // A failed injection on a never-opened session must not
                // leave it Ready with no document behind it.
                self.state = prior;
                Err(e)
            }
        }
    }

    /// Flushes pending edits and tears the session down.
    ///
    /// After `close`, every other operation fails with
    /// [`crate::NotewellError::SessionDestroyed`]; a new session must be
    /// constructed to edit again, which guarantees the old surface is gone
    /// before a new one exists.
    pub fn close(&mut self) -> Result<()> {
        if self.state == SessionState::Destroyed {
            return Ok(());
        }
        let flush_result = self.flush();
        self.document = None;
        self.pending = None;
        self.state = SessionState::Destroyed;
        flush_result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::block::{Block, BlockData, HeaderData, ParagraphData};
    use crate::NoteStore;
    use tempfile::NamedTempFile;

    const ADA: &str = "ada@example.com";

    fn store_with_note() -> (NamedTempFile, NoteStore, String) {
        let temp = NamedTempFile::new().unwrap();
        let mut store = NoteStore::create(temp.path()).unwrap();
        let id = store.create_note(ADA).unwrap();
        (temp, store, id)
    }

    fn paragraph_doc(text: &str) -> BlockDocument {
        BlockDocument::from_blocks(vec![Block::new(BlockData::Paragraph(ParagraphData {
            text: text.to_string(),
        }))])
    }

    #[test]
    fn test_open_reaches_ready_with_empty_document() {
        let (_t, mut store, id) = store_with_note();
        let mut session = EditorSession::new(&mut store, ADA, &id, None);
        assert_eq!(session.state(), SessionState::Uninitialized);
        session.open().unwrap();
        assert_eq!(session.state(), SessionState::Ready);
        assert!(session.document().unwrap().blocks.is_empty());
    }

    #[test]
    fn test_change_is_processed_and_flushed() {
        let (_t, mut store, id) = store_with_note();
        {
            let mut session = EditorSession::new(&mut store, ADA, &id, None);
            session.open().unwrap();
            session
                .apply_change(BlockDocument::from_blocks(vec![Block::new(
                    BlockData::Header(HeaderData {
                        text: "## Title".to_string(),
                        level: 2,
                    }),
                )]))
                .unwrap();
            session.flush().unwrap();
        }
        let loaded = store.load_content(ADA, &id, None).unwrap();
        match &loaded.blocks[0].data {
            BlockData::Header(h) => assert_eq!(h.text, "Title"),
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[test]
    fn test_burst_of_changes_persists_last_state() {
        let (_t, mut store, id) = store_with_note();
        {
            let mut session = EditorSession::new(&mut store, ADA, &id, None);
            session.open().unwrap();
            session.apply_change(paragraph_doc("first")).unwrap();
            session.apply_change(paragraph_doc("second")).unwrap();
            session.apply_change(paragraph_doc("final")).unwrap();
            session.close().unwrap();
        }
        let loaded = store.load_content(ADA, &id, None).unwrap();
        assert_eq!(loaded.blocks[0].plain_text(), "final");
    }

    #[test]
    fn test_flush_if_quiet_respects_quiet_period() {
        let (_t, mut store, id) = store_with_note();
        let mut session = EditorSession::new(&mut store, ADA, &id, None);
        session.open().unwrap();

        session.set_quiet_period(Duration::from_secs(3600));
        session.apply_change(paragraph_doc("typing")).unwrap();
        assert!(!session.flush_if_quiet().unwrap());

        session.set_quiet_period(Duration::ZERO);
        assert!(session.flush_if_quiet().unwrap());
        // Nothing pending afterwards.
        assert!(!session.flush_if_quiet().unwrap());
    }

    #[test]
    fn test_switch_flushes_old_page_before_loading_new() {
        let (_t, mut store, note_a) = store_with_note();
        let note_b = store.create_note(ADA).unwrap();
        {
            let mut session = EditorSession::new(&mut store, ADA, &note_a, None);
            session.open().unwrap();
            session.apply_change(paragraph_doc("edits on a")).unwrap();
            session.switch(&note_b, None).unwrap();
            assert_eq!(session.state(), SessionState::Ready);
            assert!(session.document().unwrap().blocks.is_empty());
        }
        let a = store.load_content(ADA, &note_a, None).unwrap();
        assert_eq!(a.blocks[0].plain_text(), "edits on a");
    }

    #[test]
    fn test_inject_generated_bypasses_post_processor() {
        let (_t, mut store, id) = store_with_note();
        {
            let mut session = EditorSession::new(&mut store, ADA, &id, None);
            session.open().unwrap();
            // A user edit would have its heading prefix stripped; an
            // injection persists verbatim.
            session
                .inject_generated(BlockDocument::from_blocks(vec![Block::new(
                    BlockData::Header(HeaderData {
                        text: "## kept as-is".to_string(),
                        level: 2,
                    }),
                )]))
                .unwrap();
        }
        let loaded = store.load_content(ADA, &id, None).unwrap();
        match &loaded.blocks[0].data {
            BlockData::Header(h) => assert_eq!(h.text, "## kept as-is"),
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[test]
    fn test_inject_generated_initializes_unopened_session() {
        let (_t, mut store, id) = store_with_note();
        let mut session = EditorSession::new(&mut store, ADA, &id, None);
        session.inject_generated(paragraph_doc("generated")).unwrap();
        assert_eq!(session.state(), SessionState::Ready);
        assert_eq!(session.document().unwrap().blocks[0].plain_text(), "generated");
    }

    #[test]
    fn test_failed_injection_on_unopened_session_stays_uninitialized() {
        let temp = NamedTempFile::new().unwrap();
        let mut store = NoteStore::create(temp.path()).unwrap();
        let mut session = EditorSession::new(&mut store, ADA, "missing", None);
        assert!(matches!(
            session.inject_generated(paragraph_doc("generated")),
            Err(NotewellError::NoteNotFound(_))
        ));
        assert_eq!(session.state(), SessionState::Uninitialized);
        assert!(session.document().is_none());
        // A change event still cannot sneak in on the unloaded surface.
        assert!(matches!(
            session.apply_change(paragraph_doc("x")),
            Err(NotewellError::SessionNotReady)
        ));
    }

    #[test]
    fn test_destroyed_session_rejects_use() {
        let (_t, mut store, id) = store_with_note();
        let mut session = EditorSession::new(&mut store, ADA, &id, None);
        session.open().unwrap();
        session.close().unwrap();
        assert_eq!(session.state(), SessionState::Destroyed);
        assert!(matches!(
            session.open(),
            Err(NotewellError::SessionDestroyed)
        ));
        assert!(matches!(
            session.apply_change(paragraph_doc("x")),
            Err(NotewellError::SessionDestroyed)
        ));
        // Closing twice is harmless.
        session.close().unwrap();
    }

    #[test]
    fn test_open_missing_note_fails() {
        let temp = NamedTempFile::new().unwrap();
        let mut store = NoteStore::create(temp.path()).unwrap();
        let mut session = EditorSession::new(&mut store, ADA, "missing", None);
        assert!(matches!(
            session.open(),
            Err(NotewellError::NoteNotFound(_))
        ));
        assert_eq!(session.state(), SessionState::Uninitialized);
    }

    #[test]
    fn test_subpage_session_round_trip() {
        let (_t, mut store, note) = store_with_note();
        let sub = store.create_subpage(ADA, &note).unwrap();
        {
            let mut session = EditorSession::new(&mut store, ADA, &note, Some(&sub));
            session.open().unwrap();
            session.apply_change(paragraph_doc("sub content")).unwrap();
            session.close().unwrap();
        }
        let loaded = store.load_content(ADA, &note, Some(&sub)).unwrap();
        assert_eq!(loaded.blocks[0].plain_text(), "sub content");
    }
}
