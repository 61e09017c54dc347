//! Write-path normalization of freshly authored content.
//!
//! These transforms run between the interactive editor and the store; the
//! read/render path never applies them. Each block is transformed
//! independently and every transform is idempotent, so a retried save that
//! re-processes already-normalized content is a no-op.

use crate::core::block::{Block, BlockData};
use crate::BlockDocument;
use regex::Regex;
use std::sync::OnceLock;

/// Normalizes a document before it is treated as canonical.
///
/// Per block, in document order:
/// - `table`: collapse whitespace runs in each cell and trim the ends.
/// - `header`: strip a leading Markdown-style `#` run and following whitespace.
/// - `paragraph`: rewrite `**bold**` spans into `<b>` tags.
///
/// All other block types pass through unchanged.
#[must_use]
pub fn process_document(doc: BlockDocument) -> BlockDocument {
    BlockDocument {
        time: doc.time,
        blocks: doc.blocks.into_iter().map(process_block).collect(),
        version: doc.version,
    }
}

fn process_block(mut block: Block) -> Block {
    match &mut block.data {
        BlockData::Table(table) => {
            for row in &mut table.content {
                for cell in row.iter_mut() {
                    *cell = normalize_whitespace(cell);
                }
            }
        }
        BlockData::Header(header) => {
            header.text = strip_heading_prefix(&header.text);
        }
        BlockData::Paragraph(para) => {
            para.text = bold_markup_to_tag(&para.text);
        }
        _ => {}
    }
    block
}

/// Collapses runs of whitespace to a single space and trims the ends.
#[must_use]
pub fn normalize_whitespace(text: &str) -> String {
    static WS_RE: OnceLock<Regex> = OnceLock::new();
    let re = WS_RE.get_or_init(|| Regex::new(r"\s+").unwrap());
    re.replace_all(text.trim(), " ").into_owned()
}

/// Strips leading `#` runs and the whitespace after them.
///
/// The whole repeated prefix is consumed in one pass (`"# # Title"` becomes
/// `"Title"`), so the result never starts with `#` and re-processing cannot
/// strip further. Text with no leading `#` is returned unchanged.
#[must_use]
pub fn strip_heading_prefix(text: &str) -> String {
    static HEADING_RE: OnceLock<Regex> = OnceLock::new();
    let re = HEADING_RE.get_or_init(|| Regex::new(r"^(#+\s*)+").unwrap());
    re.replace(text, "").into_owned()
}

/// Rewrites `**bold**` spans into an explicit `<b>` tag encoding.
///
/// The rewrite is applied until it reaches a fixpoint: a replacement never
/// introduces `*`, so each pass strictly reduces the number of asterisks
/// until no `**` pair remains. Without this, pathological inputs such as
/// `"****bold****"` would leave a `**…**` pair spanning the emitted tags
/// and a re-processed retry would rewrite the text a second time.
#[must_use]
pub fn bold_markup_to_tag(text: &str) -> String {
    static BOLD_RE: OnceLock<Regex> = OnceLock::new();
    let re = BOLD_RE.get_or_init(|| Regex::new(r"\*\*(.+?)\*\*").unwrap());
    let mut current = text.to_string();
    loop {
        let next = re.replace_all(&current, "<b>$1</b>").into_owned();
        if next == current {
            return next;
        }
        current = next;
    }
}
