//! The block document schema: an ordered list of typed content blocks.
//!
//! A [`BlockDocument`] is the canonical representation of a page body. Each
//! [`Block`] carries a discriminated payload ([`BlockData`]) whose shape
//! depends on the block type. The external JSON encoding is the editor's
//! `{ "id", "type", "data" }` shape; serde bridges it through [`RawBlock`]
//! so that blocks with types this library does not understand survive a
//! load/save cycle byte-compatibly as [`BlockData::Unknown`].

use crate::{NotewellError, Result};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::sync::OnceLock;
use uuid::Uuid;

/// Version tag written into documents produced by this library.
///
/// Carried through unchanged when re-saving documents produced elsewhere.
pub const SCHEMA_VERSION: &str = "2.30.0";

/// An ordered collection of blocks plus metadata — the canonical body of a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockDocument {
    /// Creation/update timestamp in milliseconds.
    #[serde(default)]
    pub time: i64,
    /// Display-ordered content blocks.
    pub blocks: Vec<Block>,
    /// Opaque version tag of the tooling that produced the document.
    #[serde(default)]
    pub version: String,
}

impl BlockDocument {
    /// Returns an empty document stamped with the current time.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            time: chrono::Utc::now().timestamp_millis(),
            blocks: Vec::new(),
            version: SCHEMA_VERSION.to_string(),
        }
    }

    /// Builds a document from blocks, stamping the current time.
    #[must_use]
    pub fn from_blocks(blocks: Vec<Block>) -> Self {
        Self {
            time: chrono::Utc::now().timestamp_millis(),
            blocks,
            version: SCHEMA_VERSION.to_string(),
        }
    }

    /// Parses a document from its stored string encoding.
    ///
    /// # Errors
    ///
    /// Returns [`crate::NotewellError::Json`] if `raw` is not valid JSON, or
    /// [`crate::NotewellError::MalformedDocument`] if the parsed value has no
    /// `blocks` array. Callers on the load path substitute an empty document
    /// for the latter rather than surfacing it to the user.
    pub fn from_json(raw: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(raw)?;
        if !value.get("blocks").map_or(false, Value::is_array) {
            return Err(NotewellError::MalformedDocument);
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Serializes the document for storage in a single text field.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// One typed unit of page content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawBlock", into = "RawBlock")]
pub struct Block {
    /// Opaque identifier, unique within a document, assigned at creation.
    pub id: String,
    /// Type-discriminated payload.
    pub data: BlockData,
}

impl Block {
    /// Creates a block with a fresh ID.
    #[must_use]
    pub fn new(data: BlockData) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            data,
        }
    }

    /// Extracts the plain-text content of this block with inline markup
    /// tags stripped, for use in search indexing. Display rendering keeps
    /// the original markup; this is the only place tags are removed.
    #[must_use]
    pub fn plain_text(&self) -> String {
        match &self.data {
            BlockData::Header(d) => strip_tags(&d.text),
            BlockData::Paragraph(d) => strip_tags(&d.text),
            BlockData::List(d) => d
                .items
                .iter()
                .map(|i| strip_tags(i))
                .collect::<Vec<_>>()
                .join(" "),
            BlockData::Checklist(d) => d
                .items
                .iter()
                .map(|i| strip_tags(&i.text))
                .collect::<Vec<_>>()
                .join(" "),
            BlockData::Table(d) => d
                .content
                .iter()
                .flat_map(|row| row.iter())
                .map(|cell| strip_tags(cell))
                .collect::<Vec<_>>()
                .join(" "),
            BlockData::Image(d) => d.caption.as_deref().map(strip_tags).unwrap_or_default(),
            BlockData::Code(d) => d.code.clone(),
            BlockData::Quote(d) => strip_tags(&d.text),
            BlockData::Embed(d) => d.caption.as_deref().map(strip_tags).unwrap_or_default(),
            BlockData::Alert(d) => strip_tags(&d.message),
            BlockData::LinkTool(d) => strip_tags(&d.meta.title),
            BlockData::Marker(d) => strip_tags(&d.text),
            BlockData::InlineCode(d) => d.text.clone(),
            BlockData::Delimiter | BlockData::Raw(_) | BlockData::Unknown { .. } => String::new(),
        }
    }
}

/// Removes inline markup tags, leaving text content only.
fn strip_tags(text: &str) -> String {
    static TAG_RE: OnceLock<Regex> = OnceLock::new();
    let re = TAG_RE.get_or_init(|| Regex::new(r"</?[^>]+>").unwrap());
    re.replace_all(text, "").into_owned()
}

/// The closed set of block payloads, plus an opaque passthrough for types
/// this library does not yet understand.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockData {
    Header(HeaderData),
    Paragraph(ParagraphData),
    List(ListData),
    Checklist(ChecklistData),
    Table(TableData),
    Image(ImageData),
    Code(CodeData),
    Quote(QuoteData),
    Embed(EmbedData),
    Alert(AlertData),
    Delimiter,
    LinkTool(LinkToolData),
    Raw(RawData),
    Marker(MarkerData),
    InlineCode(InlineCodeData),
    /// A block type this library does not recognize. The raw payload is
    /// carried through unchanged so it round-trips without interpretation.
    Unknown { kind: String, data: Value },
}

impl BlockData {
    /// Returns the wire-format type tag for this payload.
    #[must_use]
    pub fn kind(&self) -> &str {
        match self {
            Self::Header(_) => "header",
            Self::Paragraph(_) => "paragraph",
            Self::List(_) => "list",
            Self::Checklist(_) => "checklist",
            Self::Table(_) => "table",
            Self::Image(_) => "image",
            Self::Code(_) => "code",
            Self::Quote(_) => "quote",
            Self::Embed(_) => "embed",
            Self::Alert(_) => "alert",
            Self::Delimiter => "delimiter",
            Self::LinkTool(_) => "linkTool",
            Self::Raw(_) => "raw",
            Self::Marker(_) => "marker",
            Self::InlineCode(_) => "inlineCode",
            Self::Unknown { kind, .. } => kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaderData {
    pub text: String,
    /// Heading depth, bounded 1–6. Out-of-range values are clamped at render time.
    #[serde(default = "default_header_level")]
    pub level: u8,
}

fn default_header_level() -> u8 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParagraphData {
    /// May embed limited inline markup (`<b>`, `<i>`, `<a>`, …).
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListStyle {
    Ordered,
    #[default]
    Unordered,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListData {
    #[serde(default)]
    pub style: ListStyle,
    #[serde(default)]
    pub items: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub text: String,
    #[serde(default)]
    pub checked: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChecklistData {
    #[serde(default)]
    pub items: Vec<ChecklistItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableData {
    /// When true, the first content row renders as the header row.
    #[serde(default)]
    pub with_headings: bool,
    #[serde(default)]
    pub content: Vec<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageFile {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageData {
    pub file: ImageFile,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(default)]
    pub stretched: bool,
    #[serde(default)]
    pub with_background: bool,
    #[serde(default)]
    pub with_border: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeData {
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteData {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alignment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedData {
    #[serde(default)]
    pub service: String,
    #[serde(default)]
    pub source: String,
    /// The resolved embeddable URL, used as the iframe source.
    #[serde(default)]
    pub embed: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

/// Alert severity. Unrecognized or absent values fall back to [`AlertType::Info`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertType {
    Primary,
    Secondary,
    #[default]
    Info,
    Success,
    Warning,
    Danger,
    Light,
    Dark,
}

impl AlertType {
    fn parse(s: &str) -> Self {
        match s {
            "primary" => Self::Primary,
            "secondary" => Self::Secondary,
            "info" => Self::Info,
            "success" => Self::Success,
            "warning" => Self::Warning,
            "danger" => Self::Danger,
            "light" => Self::Light,
            "dark" => Self::Dark,
            _ => Self::default(),
        }
    }

    /// CSS-friendly lowercase name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Secondary => "secondary",
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Danger => "danger",
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }
}

/// Alert alignment. Unrecognized or absent values fall back to [`AlertAlign::Left`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertAlign {
    #[default]
    Left,
    Center,
    Right,
}

impl AlertAlign {
    fn parse(s: &str) -> Self {
        match s {
            "left" => Self::Left,
            "center" => Self::Center,
            "right" => Self::Right,
            _ => Self::default(),
        }
    }

    /// CSS-friendly lowercase name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
        }
    }
}

fn alert_type_lenient<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<AlertType, D::Error> {
    let v = Value::deserialize(d)?;
    Ok(v.as_str().map(AlertType::parse).unwrap_or_default())
}

fn alert_align_lenient<'de, D: Deserializer<'de>>(
    d: D,
) -> std::result::Result<AlertAlign, D::Error> {
    let v = Value::deserialize(d)?;
    Ok(v.as_str().map(AlertAlign::parse).unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertData {
    #[serde(
        rename = "type",
        default,
        deserialize_with = "alert_type_lenient"
    )]
    pub alert_type: AlertType,
    #[serde(default, deserialize_with = "alert_align_lenient")]
    pub align: AlertAlign,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LinkMeta {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageFile>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkToolData {
    pub link: String,
    #[serde(default)]
    pub meta: LinkMeta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawData {
    pub html: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerData {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InlineCodeData {
    pub text: String,
}

/// The external `{ id, type, data }` wire shape of a block.
#[derive(Serialize, Deserialize)]
struct RawBlock {
    #[serde(default)]
    id: String,
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    data: Value,
}

impl From<RawBlock> for Block {
    fn from(raw: RawBlock) -> Self {
        let data = decode_payload(&raw.kind, raw.data);
        Self { id: raw.id, data }
    }
}

impl From<Block> for RawBlock {
    fn from(block: Block) -> Self {
        let kind = block.data.kind().to_string();
        let data = encode_payload(block.data);
        Self {
            id: block.id,
            kind,
            data,
        }
    }
}

/// Decodes a typed payload from a raw `(type, data)` pair.
///
/// A known type whose payload fails deserialization degrades to
/// [`BlockData::Unknown`] rather than erroring: one malformed block must
/// never make the whole document unreadable.
fn decode_payload(kind: &str, data: Value) -> BlockData {
    fn typed<T: serde::de::DeserializeOwned>(
        data: &Value,
        wrap: impl FnOnce(T) -> BlockData,
    ) -> Option<BlockData> {
        serde_json::from_value(data.clone()).ok().map(wrap)
    }

    let decoded = match kind {
        "header" => typed(&data, BlockData::Header),
        "paragraph" => typed(&data, BlockData::Paragraph),
        "list" => typed(&data, BlockData::List),
        "checklist" => typed(&data, BlockData::Checklist),
        "table" => typed(&data, BlockData::Table),
        "image" => typed(&data, BlockData::Image),
        "code" => typed(&data, BlockData::Code),
        "quote" => typed(&data, BlockData::Quote),
        "embed" => typed(&data, BlockData::Embed),
        "alert" => typed(&data, BlockData::Alert),
        "delimiter" => Some(BlockData::Delimiter),
        "linkTool" => typed(&data, BlockData::LinkTool),
        "raw" => typed(&data, BlockData::Raw),
        "marker" => typed(&data, BlockData::Marker),
        "inlineCode" => typed(&data, BlockData::InlineCode),
        _ => None,
    };

    decoded.unwrap_or(BlockData::Unknown {
        kind: kind.to_string(),
        data,
    })
}

fn encode_payload(data: BlockData) -> Value {
    let result = match data {
        BlockData::Header(d) => serde_json::to_value(d),
        BlockData::Paragraph(d) => serde_json::to_value(d),
        BlockData::List(d) => serde_json::to_value(d),
        BlockData::Checklist(d) => serde_json::to_value(d),
        BlockData::Table(d) => serde_json::to_value(d),
        BlockData::Image(d) => serde_json::to_value(d),
        BlockData::Code(d) => serde_json::to_value(d),
        BlockData::Quote(d) => serde_json::to_value(d),
        BlockData::Embed(d) => serde_json::to_value(d),
        BlockData::Alert(d) => serde_json::to_value(d),
        BlockData::Delimiter => Ok(Value::Object(serde_json::Map::new())),
        BlockData::LinkTool(d) => serde_json::to_value(d),
        BlockData::Raw(d) => serde_json::to_value(d),
        BlockData::Marker(d) => serde_json::to_value(d),
        BlockData::InlineCode(d) => serde_json::to_value(d),
        BlockData::Unknown { data, .. } => Ok(data),
    };
    result.unwrap_or(Value::Null)
}
