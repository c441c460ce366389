//! Wikitext -> `Document` parser.
//!
//! This parser is **total** and **error-tolerant**: every input produces a
//! document, and anything it cannot make sense of stays as plain text.
//!
//! Rule order matters and is fixed:
//! 1. `<pre>` and `<blockquote>` bodies are lifted out first and kept
//!    verbatim, so no other rule ever touches them.
//! 2. The remaining text is split into candidates on blank lines.
//! 3. Heading lines (`==` .. `======`) become their own blocks.
//! 4. A candidate whose first line starts with `* ` or `# ` is a list;
//!    anything else is a paragraph.
//! 5. Inline markup is scanned per line (see [`util::parse_inlines`]).

pub(crate) mod util;

use crate::ast::*;

use util::{LineRange, collect_lines, find_closing_tag, heading_line, line_span, strip_cr};

/// Result of parsing a document.
#[derive(Debug, Clone)]
pub struct ParseOutput {
    pub document: Document,
    pub diagnostics: Vec<Diagnostic>,
}

/// Lowest and highest heading level the editor supports.
pub const MIN_HEADING_LEVEL: usize = 2;
pub const MAX_HEADING_LEVEL: usize = 6;

/// Tags whose bodies are copied verbatim into a block.
const VERBATIM_TAGS: [&str; 2] = ["pre", "blockquote"];

/// Convert wikitext into a rich-text document.
pub fn to_rich_text(src: &str) -> Document {
    parse_wikitext(src).document
}

/// Parse wikitext into a `Document`, keeping any diagnostics.
///
/// Diagnostic spans are byte offsets into `src`.
pub fn parse_wikitext(src: &str) -> ParseOutput {
    let mut parser = BlockParser {
        blocks: Vec::new(),
        diagnostics: Vec::new(),
    };

    let mut pos = 0usize;
    while pos < src.len() {
        match find_verbatim_block(src, pos, &mut parser.diagnostics) {
            Some(found) => {
                parser.parse_markup(&src[pos..found.start], pos);
                parser.blocks.push(found.block);
                pos = found.end;
            }
            None => {
                parser.parse_markup(&src[pos..], pos);
                pos = src.len();
            }
        }
    }

    log::trace!(
        "parsed {} bytes of wikitext into {} blocks ({} diagnostics)",
        src.len(),
        parser.blocks.len(),
        parser.diagnostics.len()
    );

    ParseOutput {
        document: Document::new(parser.blocks),
        diagnostics: parser.diagnostics,
    }
}

struct VerbatimBlock {
    start: usize,
    end: usize,
    block: Block,
}

/// Find the next complete `<pre>...</pre>` or `<blockquote>...</blockquote>`
/// at or after `from`.
///
/// An opening tag without a matching close is reported and skipped; its text
/// stays in the surrounding markup.
fn find_verbatim_block(
    src: &str,
    from: usize,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<VerbatimBlock> {
    let mut search = from;
    loop {
        let (open_start, tag) = find_verbatim_open(src, search)?;
        let open_end = match src[open_start..].find('>') {
            Some(rel) => open_start + rel + 1,
            None => return None,
        };
        let Some(close_rel) = find_closing_tag(&src[open_end..], tag) else {
            diagnostics.push(Diagnostic::warning(
                &format!("wikitext.{}.unclosed", tag),
                format!("Unclosed <{}> tag; kept as text", tag),
                Span::new(open_start, open_end),
            ));
            search = open_end;
            continue;
        };
        let body = src[open_end..open_end + close_rel].to_string();
        let end = open_end + close_rel + tag.len() + 3;
        let block = match tag {
            "pre" => Block::Preformatted { text: body },
            _ => Block::BlockQuote {
                content: if body.is_empty() {
                    Vec::new()
                } else {
                    vec![Inline::text(body)]
                },
            },
        };
        return Some(VerbatimBlock {
            start: open_start,
            end,
            block,
        });
    }
}

/// Case-insensitive search for `<pre` / `<blockquote` followed by `>` or
/// attributes.
fn find_verbatim_open(src: &str, from: usize) -> Option<(usize, &'static str)> {
    let bytes = src.as_bytes();
    let mut i = from;
    while i < bytes.len() {
        if bytes[i] == b'<' {
            for tag in VERBATIM_TAGS {
                let name_end = i + 1 + tag.len();
                if name_end < bytes.len()
                    && bytes[i + 1..name_end].eq_ignore_ascii_case(tag.as_bytes())
                    && matches!(bytes[name_end], b'>' | b' ' | b'\t' | b'\n')
                {
                    return Some((i, tag));
                }
            }
        }
        i += 1;
    }
    None
}

struct BlockParser {
    blocks: Vec<Block>,
    diagnostics: Vec<Diagnostic>,
}

impl BlockParser {
    /// Segment a stretch of markup (no verbatim blocks inside) into blocks.
    fn parse_markup(&mut self, src: &str, base: usize) {
        let lines = collect_lines(src);
        let mut candidate: Vec<LineRange> = Vec::new();

        for line in lines {
            let text = strip_cr(&src[line.start..line.end]);

            // blank lines close the current candidate.
            if text.trim().is_empty() {
                self.flush_candidate(src, base, &mut candidate);
                continue;
            }

            if let Some(heading) = heading_line(text) {
                if (MIN_HEADING_LEVEL..=MAX_HEADING_LEVEL).contains(&heading.level) {
                    self.flush_candidate(src, base, &mut candidate);
                    let title_abs = base + line.start + heading.title_offset;
                    let content =
                        util::parse_inlines(heading.title, title_abs, &mut self.diagnostics);
                    self.blocks.push(Block::Heading {
                        level: heading.level as u8,
                        content,
                    });
                    continue;
                }
                self.diagnostics.push(Diagnostic::info(
                    "wikitext.heading.level_out_of_range",
                    format!(
                        "Heading level {} is outside {}..={}; kept as text",
                        heading.level, MIN_HEADING_LEVEL, MAX_HEADING_LEVEL
                    ),
                    line_span(base, line),
                ));
            }

            candidate.push(line);
        }

        self.flush_candidate(src, base, &mut candidate);
    }

    fn flush_candidate(&mut self, src: &str, base: usize, candidate: &mut Vec<LineRange>) {
        if candidate.is_empty() {
            return;
        }
        let lines = std::mem::take(candidate);
        let first = strip_cr(&src[lines[0].start..lines[0].end]).trim_start();
        if list_marker(first).is_some() {
            self.parse_list(src, base, &lines);
        } else {
            self.parse_paragraph(src, base, &lines);
        }
    }

    fn parse_paragraph(&mut self, src: &str, base: usize, lines: &[LineRange]) {
        let mut content: Vec<Inline> = Vec::new();
        for (idx, line) in lines.iter().enumerate() {
            if idx > 0 {
                content.push(Inline::LineBreak);
            }
            let text = strip_cr(&src[line.start..line.end]);
            content.extend(util::parse_inlines(
                text,
                base + line.start,
                &mut self.diagnostics,
            ));
        }
        self.blocks.push(Block::Paragraph { content });
    }

    /// A list candidate: `*` and `#` runs become sibling lists, lines without
    /// a marker continue the previous item.
    fn parse_list(&mut self, src: &str, base: usize, lines: &[LineRange]) {
        let mut current: Option<(ListMarker, Vec<ListItem>)> = None;

        for line in lines {
            let text = strip_cr(&src[line.start..line.end]);
            let trimmed = text.trim_start();
            let lead = text.len() - trimmed.len();

            let Some(marker) = leading_marker(trimmed) else {
                // continuation of the previous item.
                if let Some((_, items)) = current.as_mut()
                    && let Some(item) = items.last_mut()
                {
                    item.content.push(Inline::LineBreak);
                    item.content.extend(util::parse_inlines(
                        text.trim(),
                        base + line.start + lead,
                        &mut self.diagnostics,
                    ));
                }
                continue;
            };

            let body = trimmed[1..].trim();
            let body_abs = base + line.start + lead + (trimmed.len() - trimmed[1..].trim_start().len());

            if body.is_empty() {
                self.diagnostics.push(Diagnostic::info(
                    "wikitext.list.empty_item",
                    "List marker without content; emitted an empty item",
                    line_span(base, *line),
                ));
            }

            let item = ListItem {
                content: util::parse_inlines(body, body_abs, &mut self.diagnostics),
            };

            match current.as_mut() {
                Some((m, items)) if *m == marker => items.push(item),
                _ => {
                    if let Some((m, items)) = current.take() {
                        self.blocks.push(Block::List { marker: m, items });
                    }
                    current = Some((marker, vec![item]));
                }
            }
        }

        if let Some((marker, items)) = current {
            self.blocks.push(Block::List { marker, items });
        }
    }
}

/// `* item` / `# item` (or a lone marker) at the start of a candidate.
fn list_marker(line: &str) -> Option<ListMarker> {
    let marker = leading_marker(line)?;
    let rest = &line[1..];
    if rest.trim().is_empty() || rest.starts_with(' ') || rest.starts_with('\t') {
        Some(marker)
    } else {
        None
    }
}

fn leading_marker(line: &str) -> Option<ListMarker> {
    match line.as_bytes().first() {
        Some(b'*') => Some(ListMarker::Unordered),
        Some(b'#') => Some(ListMarker::Ordered),
        _ => None,
    }
}
