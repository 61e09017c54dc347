//! Internal domain modules for the Notewell core library.
//!
//! All public types from these modules are re-exported at the crate root
//! with `#[doc(inline)]`; import from there in preference to this module.

pub mod assets;
pub mod block;
pub mod error;
pub mod note;
pub mod process;
pub mod publish;
pub mod render;
pub mod session;
pub mod storage;
pub mod store;

#[doc(inline)]
pub use assets::{AssetKind, AssetStore};
#[doc(inline)]
pub use block::{Block, BlockData, BlockDocument, SCHEMA_VERSION};
#[doc(inline)]
pub use error::{NotewellError, Result};
#[doc(inline)]
pub use note::{
    NoteEntity, NoteSearchResult, NoteSummary, SubpageEntity, DEFAULT_EMOJI, DEFAULT_TITLE,
};
#[doc(inline)]
pub use process::process_document;
#[doc(inline)]
pub use publish::published_path;
#[doc(inline)]
pub use render::{render_block, render_document};
#[doc(inline)]
pub use session::{EditorSession, SessionState};
#[doc(inline)]
pub use storage::Storage;
#[doc(inline)]
pub use store::{NoteField, NoteStore, PublishedPage};
