//! Template and section boundaries inside a wikitext document.
//!
//! Nothing here mutates the input. Callers get a [`TemplateSpan`] back and
//! splice the host text themselves (or via [`TemplateSpan::splice`]).

use crate::ast::Span;
use crate::parse::util::{collect_lines, heading_line, strip_cr};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// A located template or section: `content == text[span]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateSpan {
    pub span: Span,
    pub content: String,
}

impl TemplateSpan {
    fn from_text(text: &str, start: usize, end: usize) -> Self {
        Self {
            span: Span::new(start, end),
            content: text[start..end].to_string(),
        }
    }

    pub fn start(&self) -> usize {
        self.span.start
    }

    pub fn end(&self) -> usize {
        self.span.end
    }

    /// Return `text` with this span replaced by `replacement`.
    ///
    /// `text` must be the document the span was located in; a span that no
    /// longer fits leaves the text unchanged.
    pub fn splice(&self, text: &str, replacement: &str) -> String {
        let Some(before) = text.get(..self.span.start) else {
            return text.to_string();
        };
        let Some(after) = text.get(self.span.end..) else {
            return text.to_string();
        };
        let mut out = String::with_capacity(before.len() + replacement.len() + after.len());
        out.push_str(before);
        out.push_str(replacement);
        out.push_str(after);
        out
    }
}

fn template_open_regex(name: &str) -> Option<Regex> {
    Regex::new(&format!(r"(?i)\{{\{{\s*{}", regex::escape(name))).ok()
}

/// Find the first `{{name ...}}` in `text`, nesting-aware.
///
/// The name match is case-insensitive. Returns `None` when the name does not
/// occur or the braces after the first occurrence never balance.
pub fn find_template_range(text: &str, name: &str) -> Option<TemplateSpan> {
    let re = template_open_regex(name)?;
    let Some(m) = re.find(text) else {
        log::debug!("template {:?} not found", name);
        return None;
    };
    let Some(end) = match_braces(text, m.start()) else {
        log::debug!("template {:?} at byte {} never closes", name, m.start());
        return None;
    };
    Some(TemplateSpan::from_text(text, m.start(), end))
}

/// Every top-level occurrence of `{{name ...}}`, in document order.
///
/// Matches nested inside an earlier match are skipped. An occurrence whose
/// braces never balance ends the search.
pub fn find_template_ranges(text: &str, name: &str) -> Vec<TemplateSpan> {
    let Some(re) = template_open_regex(name) else {
        return Vec::new();
    };
    let mut out = Vec::new();
    let mut from = 0usize;
    while let Some(m) = re.find_at(text, from) {
        let Some(end) = match_braces(text, m.start()) else {
            log::debug!("template {:?} at byte {} never closes", name, m.start());
            break;
        };
        out.push(TemplateSpan::from_text(text, m.start(), end));
        from = end;
    }
    out
}

/// Depth-counted scan from the `{{` at `start`. Returns the offset just past
/// the `}}` that brings the depth back to zero.
fn match_braces(text: &str, start: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut i = start;
    while i + 1 < bytes.len() {
        match (bytes[i], bytes[i + 1]) {
            (b'{', b'{') => {
                depth += 1;
                i += 2;
            }
            (b'}', b'}') => {
                depth = depth.saturating_sub(1);
                i += 2;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => i += 1,
        }
    }
    None
}

/// Find the section whose heading line matches `header`.
///
/// The section runs from the start of that heading line to the start of the
/// next heading of the same or a shallower level, or to end of text.
/// Deeper headings are subsections and stay inside.
pub fn find_section_range(text: &str, header: &Regex) -> Option<TemplateSpan> {
    let lines = collect_lines(text);

    let mut found: Option<(usize, usize)> = None;
    for line in &lines {
        let raw = strip_cr(&text[line.start..line.end]);
        let Some(heading) = heading_line(raw) else {
            continue;
        };
        match found {
            None => {
                if header.is_match(raw) {
                    found = Some((line.start, heading.level));
                }
            }
            Some((start, level)) => {
                if heading.level <= level {
                    return Some(TemplateSpan::from_text(text, start, line.start));
                }
            }
        }
    }

    match found {
        Some((start, _)) => Some(TemplateSpan::from_text(text, start, text.len())),
        None => {
            log::debug!("no heading matches {:?}", header.as_str());
            None
        }
    }
}

/// Find the section whose heading title equals `title` (trimmed,
/// case-insensitive).
pub fn find_section_by_title(text: &str, title: &str) -> Option<TemplateSpan> {
    let pattern = format!(r"(?i)^\s*=+\s*{}\s*=+\s*$", regex::escape(title.trim()));
    let re = Regex::new(&pattern).ok()?;
    find_section_range(text, &re)
}
