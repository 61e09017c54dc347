//! Error types for the Notewell core library.

use thiserror::Error;

/// All errors that can occur within the Notewell core library.
#[derive(Debug, Error)]
pub enum NotewellError {
    /// Stored content failed minimal shape validation (missing `blocks`).
    ///
    /// Recovered locally: the raw payload is moved into the row's
    /// `content_recovery` column and an empty document is substituted.
    #[error("Malformed document: stored content has no block list")]
    MalformedDocument,

    /// A note ID was requested that does not exist in the database.
    #[error("Note not found: {0}")]
    NoteNotFound(String),

    /// A subpage ID was requested that does not exist under its parent note.
    #[error("Subpage not found: {0}")]
    SubpageNotFound(String),

    /// The caller's identity does not match the note's owner.
    #[error("Not authorized to access note: {0}")]
    Unauthorized(String),

    /// The backing store is temporarily unavailable (busy or locked).
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// An asset could not be written to the asset store.
    #[error("Upload failed: {0}")]
    UploadFailure(String),

    /// An asset URL does not use the `asset://` scheme or escapes the store root.
    #[error("Invalid asset reference: {0}")]
    InvalidAssetRef(String),

    /// The opened file is not a valid Notewell store.
    #[error("Invalid store: {0}")]
    InvalidStore(String),

    /// An editor session was used after it was destroyed.
    #[error("Editor session already destroyed")]
    SessionDestroyed,

    /// An editor session received a change event before it was ready.
    #[error("Editor session is not ready")]
    SessionNotReady,

    /// A SQLite operation failed.
    #[error("Database error: {0}")]
    Database(rusqlite::Error),

    /// Stored note data could not be deserialized from JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An I/O operation on the filesystem failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias that pins the error type to [`NotewellError`].
pub type Result<T> = std::result::Result<T, NotewellError>;

// Transient busy/locked failures become `StoreUnavailable` so callers can
// distinguish "retry later" from a real database error.
impl From<rusqlite::Error> for NotewellError {
    fn from(e: rusqlite::Error) -> Self {
        match e.sqlite_error_code() {
            Some(rusqlite::ErrorCode::DatabaseBusy) | Some(rusqlite::ErrorCode::DatabaseLocked) => {
                Self::StoreUnavailable(e.to_string())
            }
            _ => Self::Database(e),
        }
    }
}

impl NotewellError {
    /// Returns a short, human-readable message suitable for display to the end user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::MalformedDocument => "Note content could not be read".to_string(),
            Self::NoteNotFound(_) => "Note no longer exists".to_string(),
            Self::SubpageNotFound(_) => "Page no longer exists".to_string(),
            Self::Unauthorized(_) => "You don't have access to this note".to_string(),
            Self::StoreUnavailable(_) => "Could not reach storage — please try again".to_string(),
            Self::UploadFailure(_) => "Upload failed — please try again".to_string(),
            Self::InvalidAssetRef(_) => "File reference is invalid".to_string(),
            Self::InvalidStore(_) => "Could not open notes database".to_string(),
            Self::SessionDestroyed => "This editor is no longer active".to_string(),
            Self::SessionNotReady => "The editor is still loading".to_string(),
            Self::Database(e) => format!("Failed to save: {e}"),
            Self::Json(e) => format!("Data format error: {e}"),
            Self::Io(e) => format!("File error: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_document_message() {
        let e = NotewellError::MalformedDocument;
        assert!(e.to_string().contains("block list"));
    }

    #[test]
    fn test_user_message_hides_internal_detail() {
        let e = NotewellError::NoteNotFound("abc-123".to_string());
        assert!(!e.user_message().contains("abc-123"));
    }
}
