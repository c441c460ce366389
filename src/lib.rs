pub mod ast;
pub mod html;
pub mod locate;
pub mod parse;
pub mod reference;
pub mod render;

pub use locate::{
    TemplateSpan, find_section_by_title, find_section_range, find_template_range,
    find_template_ranges,
};
pub use parse::{parse_wikitext, to_rich_text};
pub use render::{RenderOptions, html_to_wikitext, to_wikitext, wikitext_to_html};

use std::error::Error;
use std::fs;
use std::io::{self, Read};
use std::path::Path;

/// Read a whole input: the file at `path`, or stdin when `path` is `None`.
pub fn read_input(path: Option<&Path>) -> Result<String, Box<dyn Error>> {
    match path {
        Some(p) => {
            log::debug!("reading {}", p.display());
            Ok(fs::read_to_string(p)?)
        }
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

/// Parse `src` in the given format and wrap the result in a JSON envelope.
pub fn document_file(src: &str, format: ast::SourceFormat) -> ast::DocumentFile {
    let (document, diagnostics) = match format {
        ast::SourceFormat::Wikitext => {
            let out = parse::parse_wikitext(src);
            (out.document, out.diagnostics)
        }
        ast::SourceFormat::Html => (html::parse_html(src), Vec::new()),
    };
    for d in &diagnostics {
        log::debug!("diagnostic {:?}: {}", d.code, d.message);
    }
    ast::DocumentFile {
        schema_version: ast::SCHEMA_VERSION,
        generator: ast::GeneratorInfo::current(),
        source_format: format,
        diagnostics,
        document,
    }
}
