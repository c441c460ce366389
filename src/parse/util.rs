use crate::ast::{Diagnostic, Inline, Link, Span, has_url_scheme};

/// A byte range for a single line in the source, excluding the trailing `\n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRange {
    pub start: usize,
    pub end: usize,
}

pub fn collect_lines(src: &str) -> Vec<LineRange> {
    let bytes = src.as_bytes();
    let mut out: Vec<LineRange> = Vec::new();
    let mut start = 0usize;
    for (i, b) in bytes.iter().enumerate() {
        if *b == b'\n' {
            out.push(LineRange { start, end: i });
            start = i + 1;
        }
    }
    if start < src.len() {
        out.push(LineRange {
            start,
            end: src.len(),
        });
    }
    out
}

pub fn strip_cr(s: &str) -> &str {
    s.strip_suffix('\r').unwrap_or(s)
}

/// A heading line split into its marker level and trimmed title.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadingLine<'a> {
    pub level: usize,
    pub title: &'a str,
    /// Byte offset of `title` within the line passed to `heading_line`.
    pub title_offset: usize,
}

/// Recognize `== Title ==` style lines.
///
/// The leading run of `=` fixes the level; the line must end with a run of
/// the same length (trailing whitespace ignored) and have a non-empty title.
/// Any level is reported here; callers decide which levels they accept.
pub fn heading_line(line: &str) -> Option<HeadingLine<'_>> {
    let line = strip_cr(line);
    let lead_ws = line.len() - line.trim_start().len();
    let body = line.trim();
    let n = body.bytes().take_while(|b| *b == b'=').count();
    if n == 0 || body.len() < n * 2 + 1 {
        return None;
    }
    // check the closing run first so the slice below lands on ASCII `=`.
    if !body.ends_with(&"=".repeat(n)) {
        return None;
    }
    let inner = &body[n..body.len() - n];
    // a longer closing run belongs to the title, e.g. `==a===` is not a heading.
    if inner.ends_with('=') {
        return None;
    }
    let title = inner.trim();
    if title.is_empty() {
        return None;
    }
    let title_offset = lead_ws + n + (inner.len() - inner.trim_start().len());
    Some(HeadingLine {
        level: n,
        title,
        title_offset,
    })
}

/// Deepest span nesting parsed structurally; deeper content stays text.
pub const MAX_INLINE_DEPTH: usize = 64;

/// Quote runs longer than this are never emphasis delimiters.
pub const MAX_QUOTE_RUN: usize = 16;

/// Parse inline content for paragraphs, headings and list items.
///
/// `base_abs` is the absolute byte offset of `slice` within the original source
/// and is only used for diagnostic spans.
///
/// Rule precedence: `'''''`, `'''`, `''`, then HTML-ish tags, then `[[...]]`
/// internal links, then `[url label]` external links. Everything a rule
/// consumes is final; later rules never see it.
pub fn parse_inlines(slice: &str, base_abs: usize, diagnostics: &mut Vec<Diagnostic>) -> Vec<Inline> {
    scan_inlines(slice, base_abs, 0, diagnostics)
}

fn scan_inlines(
    slice: &str,
    base_abs: usize,
    depth: usize,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<Inline> {
    if depth > MAX_INLINE_DEPTH {
        diagnostics.push(Diagnostic::warning(
            "wikitext.inline.nesting_too_deep",
            format!("Inline markup nested deeper than {MAX_INLINE_DEPTH} levels; kept as text"),
            Span::new(base_abs, base_abs + slice.len()),
        ));
        return vec![Inline::text(slice)];
    }

    let mut out: Vec<Inline> = Vec::new();
    let mut i: usize = 0;
    let mut text_start: usize = 0;
    // tag names with no closing tag in the rest of `slice`.
    let mut unclosed: Vec<String> = Vec::new();

    let flush_text = |out: &mut Vec<Inline>, text_start: usize, i: usize| {
        if text_start < i {
            push_text(out, &slice[text_start..i]);
        }
    };

    while i < slice.len() {
        let rem = &slice[i..];

        // emphasis: `'''''bold italic'''''`, `'''bold'''`, `''italic''`.
        if rem.starts_with("''") {
            let run = quote_run_len(rem);
            if run > MAX_QUOTE_RUN {
                // guard against quadratic rescans of the same run.
                diagnostics.push(Diagnostic::warning(
                    "wikitext.inline.pathological_delim_run",
                    format!("Run of {run} quotes treated as text"),
                    Span::new(base_abs + i, base_abs + i + run),
                ));
                i += run;
                continue;
            }
        }
        if rem.starts_with("''")
            && let Some((node, consumed)) =
                try_parse_emphasis(rem, base_abs + i, depth, diagnostics)
        {
            flush_text(&mut out, text_start, i);
            out.push(node);
            i += consumed;
            text_start = i;
            continue;
        }

        // <br>, <u>, <s>, <del>, <strike>, <ins>, <code>
        if rem.starts_with('<')
            && let Some((node, consumed)) =
                try_parse_inline_tag(rem, base_abs + i, depth, &mut unclosed, diagnostics)
        {
            flush_text(&mut out, text_start, i);
            out.push(node);
            i += consumed;
            text_start = i;
            continue;
        }

        // internal links [[Page|Label]]
        if rem.starts_with("[[")
            && let Some((node, consumed)) = try_parse_internal_link(rem)
        {
            flush_text(&mut out, text_start, i);
            out.push(node);
            i += consumed;
            text_start = i;
            continue;
        }

        // external links [https://... label]
        if rem.starts_with('[')
            && let Some((node, consumed)) = try_parse_external_link(rem)
        {
            flush_text(&mut out, text_start, i);
            out.push(node);
            i += consumed;
            text_start = i;
            continue;
        }

        // default: advance by one char.
        let ch_len = rem.chars().next().map(|c| c.len_utf8()).unwrap_or(1);
        i += ch_len;
    }

    flush_text(&mut out, text_start, i);
    out
}

/// Append text, merging with a preceding text node.
fn push_text(out: &mut Vec<Inline>, text: &str) {
    if let Some(Inline::Text { value }) = out.last_mut() {
        value.push_str(text);
        return;
    }
    out.push(Inline::text(text));
}

fn try_parse_emphasis(
    rem: &str,
    abs_start: usize,
    depth: usize,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<(Inline, usize)> {
    let run = quote_run_len(rem);
    // prefer longer delimiters. A `'''''` opener without a matching run is
    // split by whichever run closes first: `'''` closes an inner bold, so the
    // outer span is italic.
    let order = if run >= 5 && next_quote_run_len(&rem[5..]) == Some(3) {
        [5usize, 2, 3]
    } else {
        [5usize, 3, 2]
    };
    for delim_len in order {
        if run < delim_len {
            continue;
        }
        let after = &rem[delim_len..];
        let Some(close_rel) = find_quote_run(after, delim_len) else {
            continue;
        };
        if close_rel == 0 {
            // `''''` style runs with nothing inside are plain text.
            continue;
        }
        let inner = &after[..close_rel];
        let children = scan_inlines(inner, abs_start + delim_len, depth + 1, diagnostics);
        let consumed = delim_len + close_rel + delim_len;
        let node = match delim_len {
            5 => Inline::Bold {
                content: vec![Inline::Italic { content: children }],
            },
            3 => Inline::Bold { content: children },
            _ => Inline::Italic { content: children },
        };
        return Some((node, consumed));
    }
    None
}

fn quote_run_len(s: &str) -> usize {
    s.bytes().take_while(|b| *b == b'\'').count()
}

fn next_quote_run_len(s: &str) -> Option<usize> {
    let start = s.find('\'')?;
    Some(quote_run_len(&s[start..]))
}

/// Find where the closing delimiter of length `n` starts.
///
/// A run of exactly `n` quotes wins. For bold (`n == 3`) and italic (`n == 2`),
/// runs of the other length open and close a nested span and are skipped.
/// A `'''''` run while that nested span is open closes both: the nested span
/// takes the front of the run and this span ends on its last `n` quotes.
/// Otherwise, if nothing matches exactly, the first longer run closes.
fn find_quote_run(s: &str, n: usize) -> Option<usize> {
    let other = match n {
        2 => Some(3),
        3 => Some(2),
        _ => None,
    };
    let bytes = s.as_bytes();
    let mut fallback: Option<usize> = None;
    let mut nested = false;
    let mut i = 0usize;
    while i < bytes.len() {
        if bytes[i] != b'\'' {
            i += 1;
            continue;
        }
        let len = quote_run_len(&s[i..]);
        if len == n {
            return Some(i);
        }
        if Some(len) == other {
            nested = !nested;
        } else if other.is_some_and(|o| len == n + o) && nested {
            return Some(i + len - n);
        } else if len > n && fallback.is_none() {
            fallback = Some(i);
        }
        i += len;
    }
    fallback
}

/// Read an HTML-ish tag name right after `<` (or `</`). Returns the lowercase
/// name and the byte length of the whole tag including `>`.
fn read_tag(rem: &str) -> Option<(String, usize, bool)> {
    let after_lt = rem.strip_prefix('<')?;
    let (closing, body) = match after_lt.strip_prefix('/') {
        Some(b) => (true, b),
        None => (false, after_lt),
    };
    let name_len = body
        .bytes()
        .take_while(|b| b.is_ascii_alphanumeric())
        .count();
    if name_len == 0 || !body.as_bytes()[0].is_ascii_alphabetic() {
        return None;
    }
    // the name must end at whitespace, `/` or `>`.
    match body.as_bytes().get(name_len) {
        Some(b'>' | b'/' | b' ' | b'\t') => {}
        _ => return None,
    }
    let gt = rem.find('>')?;
    Some((body[..name_len].to_ascii_lowercase(), gt + 1, closing))
}

/// Case-insensitive search for `</name>`, returning its byte offset.
pub fn find_closing_tag(haystack: &str, name: &str) -> Option<usize> {
    let close_pat = format!("</{}>", name);
    // search using byte windows
    // this replaces .to_ascii_lowercase().find() without the allocation
    haystack
        .as_bytes()
        .windows(close_pat.len())
        .position(|window| window.eq_ignore_ascii_case(close_pat.as_bytes()))
}

/// Parse `<br>` or a paired inline tag at the start of `rem`.
///
/// `unclosed` remembers names whose closing tag is missing from the rest of
/// the slice, so later openers of the same name fail without rescanning.
fn try_parse_inline_tag(
    rem: &str,
    abs_start: usize,
    depth: usize,
    unclosed: &mut Vec<String>,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<(Inline, usize)> {
    let (name, open_len, closing) = read_tag(rem)?;
    if closing {
        return None;
    }
    if name == "br" {
        return Some((Inline::LineBreak, open_len));
    }
    let wraps: Option<fn(Vec<Inline>) -> Inline> = match name.as_str() {
        "u" => Some(|content| Inline::Underline { content }),
        "s" | "strike" | "del" => Some(|content| Inline::Strike { content }),
        "ins" => Some(|content| Inline::Insert { content }),
        "code" => None,
        _ => return None,
    };
    if unclosed.contains(&name) {
        return None;
    }
    let body = &rem[open_len..];
    let Some(close_rel) = find_closing_tag(body, &name) else {
        diagnostics.push(Diagnostic::warning(
            &format!("wikitext.{}.unclosed", name),
            format!("Unclosed <{}> tag; kept as text", name),
            Span::new(abs_start, abs_start + open_len),
        ));
        unclosed.push(name);
        return None;
    };
    let consumed = open_len + close_rel + name.len() + 3;
    let node = match wraps {
        Some(wraps) => wraps(scan_inlines(
            &body[..close_rel],
            abs_start + open_len,
            depth + 1,
            diagnostics,
        )),
        // <code> bodies are verbatim.
        None => Inline::Code {
            value: body[..close_rel].to_string(),
        },
    };
    Some((node, consumed))
}

fn try_parse_internal_link(rem: &str) -> Option<(Inline, usize)> {
    let close_rel = rem[2..].find("]]")?;
    let inner = &rem[2..2 + close_rel];
    if inner.contains('[') || inner.contains('\n') {
        return None;
    }
    let (page, label) = match inner.split_once('|') {
        Some((p, l)) => (p.trim(), l.trim()),
        None => (inner.trim(), ""),
    };
    if page.is_empty() {
        return None;
    }
    let label = if label.is_empty() { page } else { label };
    Some((
        Inline::Link {
            link: Link::new(page, label),
        },
        2 + close_rel + 2,
    ))
}

fn try_parse_external_link(rem: &str) -> Option<(Inline, usize)> {
    let end_rel = rem[1..].find(']')?;
    let inner = &rem[1..1 + end_rel];
    let inner_trim = inner.trim();
    if !has_url_scheme(inner_trim) || inner_trim.contains('\n') {
        return None;
    }
    let (url, label) = split_first_ws(inner_trim);
    // bare `[url]` shows the url itself.
    let label = label.unwrap_or(url);
    Some((
        Inline::Link {
            link: Link::new(url, label),
        },
        1 + end_rel + 1,
    ))
}

fn split_first_ws(s: &str) -> (&str, Option<&str>) {
    match s.find(char::is_whitespace) {
        Some(i) => {
            let rest = s[i..].trim_start();
            if rest.is_empty() {
                (&s[..i], None)
            } else {
                (&s[..i], Some(rest))
            }
        }
        None => (s, None),
    }
}

/// Absolute span of a line, for diagnostics.
pub fn line_span(base: usize, line: LineRange) -> Span {
    Span::new(base + line.start, base + line.end)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inlines(s: &str) -> Vec<Inline> {
        let mut diagnostics = Vec::new();
        parse_inlines(s, 0, &mut diagnostics)
    }

    #[test]
    fn heading_line_levels() {
        let h = heading_line("== Title ==").unwrap();
        assert_eq!((h.level, h.title), (2, "Title"));
        let h = heading_line("======Deep======").unwrap();
        assert_eq!((h.level, h.title), (6, "Deep"));
        let h = heading_line("  === Spaced ===  ").unwrap();
        assert_eq!(h.level, 3);
        assert_eq!(&"  === Spaced ===  "[h.title_offset..h.title_offset + h.title.len()], "Spaced");
        assert!(heading_line("==a===").is_none());
        assert!(heading_line("====").is_none());
        assert!(heading_line("== unbalanced").is_none());
        assert!(heading_line("plain").is_none());
        assert!(heading_line("==€").is_none());
    }

    #[test]
    fn bold_before_italic() {
        assert_eq!(
            inlines("'''Bold Text'''"),
            vec![Inline::Bold {
                content: vec![Inline::text("Bold Text")]
            }]
        );
        assert_eq!(
            inlines("''it''"),
            vec![Inline::Italic {
                content: vec![Inline::text("it")]
            }]
        );
    }

    #[test]
    fn bold_nested_in_italic() {
        assert_eq!(
            inlines("''a '''b''' c''"),
            vec![Inline::Italic {
                content: vec![
                    Inline::text("a "),
                    Inline::Bold {
                        content: vec![Inline::text("b")]
                    },
                    Inline::text(" c"),
                ]
            }]
        );
    }

    #[test]
    fn five_quotes_are_bold_italic() {
        assert_eq!(
            inlines("'''''x'''''"),
            vec![Inline::Bold {
                content: vec![Inline::Italic {
                    content: vec![Inline::text("x")]
                }]
            }]
        );
    }

    #[test]
    fn unterminated_emphasis_is_text() {
        assert_eq!(inlines("it''s"), vec![Inline::text("it''s")]);
    }

    fn italic(content: Vec<Inline>) -> Inline {
        Inline::Italic { content }
    }

    fn bold(content: Vec<Inline>) -> Inline {
        Inline::Bold { content }
    }

    #[test]
    fn nested_span_closing_on_shared_run() {
        assert_eq!(
            inlines("''a '''b'''''"),
            vec![italic(vec![
                Inline::text("a "),
                bold(vec![Inline::text("b")])
            ])]
        );
        assert_eq!(
            inlines("'''a ''b'''''"),
            vec![bold(vec![
                Inline::text("a "),
                italic(vec![Inline::text("b")])
            ])]
        );
    }

    #[test]
    fn five_quote_opener_splits_on_first_closer() {
        assert_eq!(
            inlines("'''''a''' b''"),
            vec![italic(vec![
                bold(vec![Inline::text("a")]),
                Inline::text(" b")
            ])]
        );
        assert_eq!(
            inlines("'''''a'' b'''"),
            vec![bold(vec![
                italic(vec![Inline::text("a")]),
                Inline::text(" b")
            ])]
        );
    }

    #[test]
    fn quote_run_closer_positions() {
        assert_eq!(find_quote_run("a '''b'''''", 2), Some(9));
        assert_eq!(find_quote_run("a ''b'''''", 3), Some(7));
        assert_eq!(find_quote_run("a'''''", 2), Some(1));
        assert_eq!(find_quote_run("a '''b''' c''", 2), Some(11));
        assert_eq!(find_quote_run("a '''b", 2), None);
    }

    #[test]
    fn long_quote_runs_are_text() {
        let src = format!("a{}b", "'".repeat(MAX_QUOTE_RUN + 1));
        let mut diagnostics = Vec::new();
        let out = parse_inlines(&src, 10, &mut diagnostics);
        assert_eq!(out, vec![Inline::text(src.as_str())]);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].code.as_deref(),
            Some("wikitext.inline.pathological_delim_run")
        );
        assert_eq!(diagnostics[0].span, Some(Span::new(11, 12 + MAX_QUOTE_RUN)));
    }

    #[test]
    fn unclosed_tags_are_reported_once() {
        let mut diagnostics = Vec::new();
        let out = parse_inlines("x <u>a <u>b <code>c", 5, &mut diagnostics);
        assert_eq!(out, vec![Inline::text("x <u>a <u>b <code>c")]);
        let found: Vec<_> = diagnostics
            .iter()
            .map(|d| (d.code.as_deref(), d.span))
            .collect();
        assert_eq!(
            found,
            vec![
                (Some("wikitext.u.unclosed"), Some(Span::new(7, 10))),
                (Some("wikitext.code.unclosed"), Some(Span::new(17, 23))),
            ]
        );
    }

    #[test]
    fn nesting_past_the_limit_stays_text() {
        let mut diagnostics = Vec::new();
        let out = scan_inlines("<u>x</u>", 3, MAX_INLINE_DEPTH, &mut diagnostics);
        assert_eq!(
            out,
            vec![Inline::Underline {
                content: vec![Inline::text("x")]
            }]
        );
        assert_eq!(
            diagnostics[0].code.as_deref(),
            Some("wikitext.inline.nesting_too_deep")
        );
        assert_eq!(diagnostics[0].span, Some(Span::new(6, 7)));
    }

    #[test]
    fn strike_tags_normalize() {
        for src in ["<s>x</s>", "<del>x</del>", "<STRIKE>x</strike>"] {
            assert_eq!(
                inlines(src),
                vec![Inline::Strike {
                    content: vec![Inline::text("x")]
                }],
                "{src}"
            );
        }
    }

    #[test]
    fn code_body_is_verbatim() {
        assert_eq!(
            inlines("<code>'''not bold'''</code>"),
            vec![Inline::Code {
                value: "'''not bold'''".to_string()
            }]
        );
    }

    #[test]
    fn internal_links_default_label_to_page() {
        assert_eq!(
            inlines("[[Page]]"),
            vec![Inline::Link {
                link: Link::new("Page", "Page")
            }]
        );
        assert_eq!(
            inlines("see [[Page|the page]]!"),
            vec![
                Inline::text("see "),
                Inline::Link {
                    link: Link::new("Page", "the page")
                },
                Inline::text("!"),
            ]
        );
    }

    #[test]
    fn external_links_with_and_without_label() {
        assert_eq!(
            inlines("[https://example.org Example site]"),
            vec![Inline::Link {
                link: Link::new("https://example.org", "Example site")
            }]
        );
        assert_eq!(
            inlines("[https://example.org]"),
            vec![Inline::Link {
                link: Link::new("https://example.org", "https://example.org")
            }]
        );
        assert_eq!(inlines("[not a link]"), vec![Inline::text("[not a link]")]);
    }

    #[test]
    fn unknown_tags_stay_text() {
        assert_eq!(
            inlines("<span>x</span>"),
            vec![Inline::text("<span>x</span>")]
        );
    }
}
