//! `Document` -> markup renderers.
//!
//! This module operates **only** on the document model; it never looks at
//! the markup a document was parsed from.

mod html;
mod wikitext;

pub use html::render_html;
pub use wikitext::render_wikitext;

use crate::ast::Document;

/// Rendering options that control formatting decisions.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// If true, headings render as `== Title ==`; otherwise `==Title==`.
    /// Both forms parse back to the same heading.
    pub pad_headings: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self { pad_headings: true }
    }
}

/// Convert a document to wikitext with default options.
pub fn to_wikitext(doc: &Document) -> String {
    render_wikitext(doc, &RenderOptions::default())
}

/// Wikitext -> HTML, via the document model.
pub fn wikitext_to_html(src: &str) -> String {
    render_html(&crate::parse::to_rich_text(src))
}

/// HTML -> wikitext, via the document model.
pub fn html_to_wikitext(src: &str) -> String {
    html_to_wikitext_with_options(src, &RenderOptions::default())
}

pub fn html_to_wikitext_with_options(src: &str, opts: &RenderOptions) -> String {
    render_wikitext(&crate::html::parse_html(src), opts)
}
