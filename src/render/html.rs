use crate::ast::*;
use html_escape::{encode_double_quoted_attribute, encode_text};

/// Render a document as an HTML fragment.
///
/// Blocks are concatenated without separators, which is what the editor
/// surface emits itself. Verbatim bodies are escaped, never interpreted.
pub fn render_html(doc: &Document) -> String {
    let mut out = String::new();
    for block in &doc.blocks {
        render_block(block, &mut out);
    }
    out
}

fn render_block(block: &Block, out: &mut String) {
    match block {
        Block::Heading { level, content } => {
            let level = (*level).clamp(2, 6);
            out.push_str(&format!("<h{}>", level));
            render_inlines(content, out);
            out.push_str(&format!("</h{}>", level));
        }
        Block::Paragraph { content } => {
            out.push_str("<p>");
            render_inlines(content, out);
            out.push_str("</p>");
        }
        Block::List { marker, items } => {
            let tag = marker.html_tag();
            out.push_str(&format!("<{}>", tag));
            for item in items {
                out.push_str("<li>");
                render_inlines(&item.content, out);
                out.push_str("</li>");
            }
            out.push_str(&format!("</{}>", tag));
        }
        Block::BlockQuote { content } => {
            out.push_str("<blockquote>");
            render_inlines(content, out);
            out.push_str("</blockquote>");
        }
        Block::Preformatted { text } => {
            out.push_str("<pre>");
            out.push_str(&encode_text(text));
            out.push_str("</pre>");
        }
    }
}

fn render_inlines(nodes: &[Inline], out: &mut String) {
    for node in nodes {
        render_inline(node, out);
    }
}

fn render_inline(node: &Inline, out: &mut String) {
    match node {
        Inline::Text { value } => out.push_str(&encode_text(value)),
        Inline::Bold { content } => wrap("strong", content, out),
        Inline::Italic { content } => wrap("em", content, out),
        Inline::Underline { content } => wrap("u", content, out),
        Inline::Strike { content } => wrap("s", content, out),
        Inline::Insert { content } => wrap("ins", content, out),
        Inline::Code { value } => {
            out.push_str("<code>");
            out.push_str(&encode_text(value));
            out.push_str("</code>");
        }
        Inline::Link { link } => {
            out.push_str("<a href=\"");
            out.push_str(&encode_double_quoted_attribute(&link.href));
            out.push_str("\">");
            out.push_str(&encode_text(&link.label));
            out.push_str("</a>");
        }
        Inline::LineBreak => out.push_str("<br>"),
    }
}

fn wrap(tag: &str, content: &[Inline], out: &mut String) {
    out.push('<');
    out.push_str(tag);
    out.push('>');
    render_inlines(content, out);
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}
