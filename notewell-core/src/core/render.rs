//! Read-only HTML rendering of block documents.
//!
//! The registry is a closed pattern match over [`BlockData`]: every known
//! block type maps to one pure rendering function, and unknown types render
//! to nothing so a single unrecognized block never aborts the rest of the
//! document. Rendering is used for the published read path and never
//! mutates content; the write-path normalization lives in
//! [`process`](super::process).

use crate::core::block::{
    AlertData, Block, BlockData, ChecklistData, CodeData, EmbedData, HeaderData, ImageData,
    LinkToolData, ListData, ListStyle, ParagraphData, QuoteData, TableData,
};

/// Renders a whole document, skipping blocks that produce no output.
#[must_use]
pub fn render_document(doc: &crate::BlockDocument) -> String {
    doc.blocks
        .iter()
        .filter_map(render_block)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Renders one block, or `None` for block types with no known renderer.
///
/// Skipping rather than erroring is a deliberate resilience contract:
/// documents written by newer tooling stay readable here.
#[must_use]
pub fn render_block(block: &Block) -> Option<String> {
    match &block.data {
        BlockData::Header(d) => Some(render_header(d)),
        BlockData::Paragraph(d) => Some(render_paragraph(d)),
        BlockData::List(d) => Some(render_list(d)),
        BlockData::Checklist(d) => Some(render_checklist(d)),
        BlockData::Table(d) => Some(render_table(d)),
        BlockData::Image(d) => Some(render_image(d)),
        BlockData::Code(d) => Some(render_code(d)),
        BlockData::Quote(d) => Some(render_quote(d)),
        BlockData::Embed(d) => Some(render_embed(d)),
        BlockData::Alert(d) => Some(render_alert(d)),
        BlockData::Delimiter => Some("<hr class=\"delimiter\">".to_string()),
        BlockData::LinkTool(d) => Some(render_link_tool(d)),
        BlockData::Raw(d) => Some(d.html.clone()),
        BlockData::Marker(d) => Some(format!("<mark>{}</mark>", d.text)),
        BlockData::InlineCode(d) => Some(format!(
            "<code class=\"inline-code\">{}</code>",
            escape_html(&d.text)
        )),
        BlockData::Unknown { .. } => None,
    }
}

/// Escapes text for HTML text and attribute positions.
///
/// Paragraph, header, and list text is *not* passed through here: it
/// carries the editor's limited inline markup and must render as written.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn render_header(d: &HeaderData) -> String {
    let level = d.level.clamp(1, 6);
    format!("<h{level}>{}</h{level}>", d.text)
}

fn render_paragraph(d: &ParagraphData) -> String {
    format!("<p>{}</p>", d.text)
}

fn render_list(d: &ListData) -> String {
    let tag = match d.style {
        ListStyle::Ordered => "ol",
        ListStyle::Unordered => "ul",
    };
    let items: String = d
        .items
        .iter()
        .map(|item| format!("<li>{item}</li>"))
        .collect();
    format!("<{tag}>{items}</{tag}>")
}

fn render_checklist(d: &ChecklistData) -> String {
    let items: String = d
        .items
        .iter()
        .map(|item| {
            let class = if item.checked {
                "checklist-item checked"
            } else {
                "checklist-item"
            };
            format!("<li class=\"{class}\">{}</li>", item.text)
        })
        .collect();
    format!("<ul class=\"checklist\">{items}</ul>")
}

fn render_table(d: &TableData) -> String {
    let mut rows = d.content.iter();
    let mut out = String::from("<table>");

    // First row becomes the header row only when the flag says so.
    if d.with_headings {
        if let Some(head) = rows.next() {
            out.push_str("<thead><tr>");
            for cell in head {
                out.push_str(&format!("<th>{}</th>", escape_html(cell)));
            }
            out.push_str("</tr></thead>");
        }
    }

    out.push_str("<tbody>");
    for (i, row) in rows.enumerate() {
        // Striping class is cosmetic only.
        let class = if i % 2 == 0 { "row-even" } else { "row-odd" };
        out.push_str(&format!("<tr class=\"{class}\">"));
        for cell in row {
            out.push_str(&format!("<td>{}</td>", escape_html(cell)));
        }
        out.push_str("</tr>");
    }
    out.push_str("</tbody></table>");
    out
}

fn render_image(d: &ImageData) -> String {
    let mut classes = vec!["image-block"];
    if d.stretched {
        classes.push("stretched");
    }
    if d.with_background {
        classes.push("with-background");
    }
    if d.with_border {
        classes.push("with-border");
    }
    let caption_attr = d.caption.as_deref().unwrap_or_default();
    let mut out = format!(
        "<figure class=\"{}\"><img src=\"{}\" alt=\"{}\">",
        classes.join(" "),
        escape_html(&d.file.url),
        escape_html(caption_attr)
    );
    if let Some(caption) = d.caption.as_deref().filter(|c| !c.is_empty()) {
        out.push_str(&format!("<figcaption>{}</figcaption>", escape_html(caption)));
    }
    out.push_str("</figure>");
    out
}

fn render_code(d: &CodeData) -> String {
    match d.language.as_deref().filter(|l| !l.is_empty()) {
        Some(lang) => format!(
            "<pre><code class=\"language-{}\">{}</code></pre>",
            escape_html(lang),
            escape_html(&d.code)
        ),
        None => format!("<pre><code>{}</code></pre>", escape_html(&d.code)),
    }
}

fn render_quote(d: &QuoteData) -> String {
    let mut out = format!("<blockquote><p>{}</p>", d.text);
    if let Some(caption) = d.caption.as_deref().filter(|c| !c.is_empty()) {
        out.push_str(&format!("<footer>{}</footer>", escape_html(caption)));
    }
    out.push_str("</blockquote>");
    out
}

fn render_embed(d: &EmbedData) -> String {
    let mut out = format!(
        "<figure class=\"embed-block\"><iframe src=\"{}\"",
        escape_html(&d.embed)
    );
    if let Some(w) = d.width {
        out.push_str(&format!(" width=\"{w}\""));
    }
    if let Some(h) = d.height {
        out.push_str(&format!(" height=\"{h}\""));
    }
    out.push_str(" frameborder=\"0\" allowfullscreen></iframe>");
    if let Some(caption) = d.caption.as_deref().filter(|c| !c.is_empty()) {
        out.push_str(&format!("<figcaption>{}</figcaption>", escape_html(caption)));
    }
    out.push_str("</figure>");
    out
}

fn render_alert(d: &AlertData) -> String {
    format!(
        "<div class=\"alert alert-{} align-{}\">{}</div>",
        d.alert_type.as_str(),
        d.align.as_str(),
        d.message
    )
}

fn render_link_tool(d: &LinkToolData) -> String {
    let title = if d.meta.title.is_empty() {
        &d.link
    } else {
        &d.meta.title
    };
    let mut out = format!(
        "<a class=\"link-block\" href=\"{}\"><span class=\"link-title\">{}</span>",
        escape_html(&d.link),
        escape_html(title)
    );
    if !d.meta.description.is_empty() {
        out.push_str(&format!(
            "<span class=\"link-description\">{}</span>",
            escape_html(&d.meta.description)
        ));
    }
    out.push_str("</a>");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::block::{AlertAlign, AlertType, ChecklistItem, ImageFile};
    use crate::{Block, BlockDocument};

    fn doc_of(blocks: Vec<Block>) -> BlockDocument {
        BlockDocument::from_blocks(blocks)
    }

    #[test]
    fn test_unknown_block_is_skipped() {
        let raw = r#"{"time":1,"blocks":[
            {"id":"a","type":"paragraph","data":{"text":"one"}},
            {"id":"b","type":"unknown_future_type","data":{"x":1}},
            {"id":"c","type":"paragraph","data":{"text":"two"}}
        ],"version":"v"}"#;
        let doc = BlockDocument::from_json(raw).unwrap();
        let html = render_document(&doc);
        assert_eq!(html, "<p>one</p>\n<p>two</p>");
    }

    #[test]
    fn test_header_level_is_clamped() {
        let block = Block::new(BlockData::Header(HeaderData {
            text: "Hi".to_string(),
            level: 9,
        }));
        assert_eq!(render_block(&block).unwrap(), "<h6>Hi</h6>");
    }

    #[test]
    fn test_paragraph_preserves_inline_markup() {
        let block = Block::new(BlockData::Paragraph(ParagraphData {
            text: "a <b>bold</b> word".to_string(),
        }));
        assert_eq!(render_block(&block).unwrap(), "<p>a <b>bold</b> word</p>");
    }

    #[test]
    fn test_table_with_headings_uses_th() {
        let block = Block::new(BlockData::Table(TableData {
            with_headings: true,
            content: vec![
                vec!["Name".to_string(), "Age".to_string()],
                vec!["Ada".to_string(), "36".to_string()],
            ],
        }));
        let html = render_block(&block).unwrap();
        assert!(html.contains("<thead><tr><th>Name</th><th>Age</th></tr></thead>"));
        assert!(html.contains("<td>Ada</td>"));
    }

    #[test]
    fn test_table_without_headings_has_no_thead() {
        let block = Block::new(BlockData::Table(TableData {
            with_headings: false,
            content: vec![vec!["a".to_string()], vec!["b".to_string()]],
        }));
        let html = render_block(&block).unwrap();
        assert!(!html.contains("<thead>"));
        assert!(html.contains("<td>a</td>"));
        assert!(html.contains("<td>b</td>"));
    }

    #[test]
    fn test_ordered_and_unordered_lists() {
        let ordered = Block::new(BlockData::List(ListData {
            style: ListStyle::Ordered,
            items: vec!["x".to_string()],
        }));
        let unordered = Block::new(BlockData::List(ListData {
            style: ListStyle::Unordered,
            items: vec!["x".to_string()],
        }));
        assert_eq!(render_block(&ordered).unwrap(), "<ol><li>x</li></ol>");
        assert_eq!(render_block(&unordered).unwrap(), "<ul><li>x</li></ul>");
    }

    #[test]
    fn test_code_is_escaped() {
        let block = Block::new(BlockData::Code(CodeData {
            code: "if a < b { }".to_string(),
            language: Some("rust".to_string()),
        }));
        let html = render_block(&block).unwrap();
        assert!(html.contains("if a &lt; b { }"));
        assert!(html.contains("language-rust"));
    }

    #[test]
    fn test_alert_classes_from_defaults() {
        let block = Block::new(BlockData::Alert(AlertData {
            alert_type: AlertType::Info,
            align: AlertAlign::Left,
            message: "note this".to_string(),
        }));
        assert_eq!(
            render_block(&block).unwrap(),
            "<div class=\"alert alert-info align-left\">note this</div>"
        );
    }

    #[test]
    fn test_image_modifiers_and_caption() {
        let block = Block::new(BlockData::Image(ImageData {
            file: ImageFile {
                url: "asset://n1/images/abc.png".to_string(),
            },
            caption: Some("A diagram".to_string()),
            stretched: true,
            with_background: false,
            with_border: true,
        }));
        let html = render_block(&block).unwrap();
        assert!(html.contains("stretched"));
        assert!(html.contains("with-border"));
        assert!(!html.contains("with-background"));
        assert!(html.contains("<figcaption>A diagram</figcaption>"));
    }

    #[test]
    fn test_checklist_checked_class() {
        let block = Block::new(BlockData::Checklist(ChecklistData {
            items: vec![
                ChecklistItem {
                    text: "done".to_string(),
                    checked: true,
                },
                ChecklistItem {
                    text: "todo".to_string(),
                    checked: false,
                },
            ],
        }));
        let html = render_block(&block).unwrap();
        assert!(html.contains("checklist-item checked\">done"));
        assert!(html.contains("checklist-item\">todo"));
    }

    #[test]
    fn test_empty_document_renders_empty() {
        assert_eq!(render_document(&doc_of(vec![])), "");
    }
}
