use super::RenderOptions;
use crate::ast::*;
use regex::Regex;
use std::sync::LazyLock;

static BLANK_RUN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

/// Render a document as wikitext.
pub fn render_wikitext(doc: &Document, opts: &RenderOptions) -> String {
    let blocks: Vec<String> = doc
        .blocks
        .iter()
        .map(|b| render_block(b, opts))
        .filter(|s| !s.trim().is_empty())
        .collect();

    let joined = blocks.join("\n\n");
    BLANK_RUN_RE.replace_all(&joined, "\n\n").trim().to_string()
}

fn render_block(block: &Block, opts: &RenderOptions) -> String {
    match block {
        Block::Heading { level, content } => {
            let marks = "=".repeat((*level).clamp(2, 6) as usize);
            // a heading must stay on one line to parse back as a heading.
            let title = render_inlines(content).replace('\n', " ");
            let title = title.trim();
            if opts.pad_headings {
                format!("{marks} {title} {marks}")
            } else {
                format!("{marks}{title}{marks}")
            }
        }
        Block::Paragraph { content } => {
            let mut end = content.len();
            while end > 0 && matches!(content[end - 1], Inline::LineBreak) {
                end -= 1;
            }
            render_inlines(&content[..end])
        }
        Block::List { marker, items } => {
            let prefix = marker.wikitext_prefix();
            items
                .iter()
                .map(|item| {
                    let text = render_inlines(&item.content);
                    let text = text.trim_end();
                    if text.is_empty() {
                        prefix.to_string()
                    } else {
                        format!("{prefix} {text}")
                    }
                })
                .collect::<Vec<_>>()
                .join("\n")
        }
        Block::BlockQuote { content } => {
            format!("<blockquote>{}</blockquote>", render_inlines(content))
        }
        Block::Preformatted { text } => format!("<pre>{text}</pre>"),
    }
}

fn render_inlines(nodes: &[Inline]) -> String {
    let mut out = String::new();
    for node in nodes {
        render_inline(node, &mut out);
    }
    out
}

fn render_inline(node: &Inline, out: &mut String) {
    match node {
        Inline::Text { value } => out.push_str(value),
        Inline::Bold { content } => wrap("'''", "'''", content, out),
        Inline::Italic { content } => wrap("''", "''", content, out),
        Inline::Underline { content } => wrap("<u>", "</u>", content, out),
        Inline::Strike { content } => wrap("<s>", "</s>", content, out),
        Inline::Insert { content } => wrap("<ins>", "</ins>", content, out),
        Inline::Code { value } => {
            out.push_str("<code>");
            out.push_str(value);
            out.push_str("</code>");
        }
        Inline::Link { link } => {
            if link.is_external() {
                out.push_str(&format!("[{} {}]", link.href, link.label));
            } else {
                out.push_str(&format!("[[{}|{}]]", link.href, link.label));
            }
        }
        Inline::LineBreak => out.push('\n'),
    }
}

fn wrap(open: &str, close: &str, content: &[Inline], out: &mut String) {
    out.push_str(open);
    out.push_str(&render_inlines(content));
    out.push_str(close);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::to_rich_text;

    fn round_trip(src: &str) -> String {
        render_wikitext(&to_rich_text(src), &RenderOptions::default())
    }

    #[test]
    fn canonical_inlines_round_trip() {
        for src in [
            "'''Bold Text'''",
            "''italic''",
            "<u>under</u>",
            "<s>gone</s>",
            "<code>x = 1</code>",
            "[https://example.org Example]",
            "[[Main Page|Home]]",
        ] {
            assert_eq!(round_trip(src), src);
        }
    }

    #[test]
    fn strike_variants_normalize_to_s() {
        assert_eq!(round_trip("<del>a</del> <strike>b</strike>"), "<s>a</s> <s>b</s>");
    }

    #[test]
    fn blocks_separated_by_blank_line() {
        let src = "== Intro ==\n\nHello\nworld\n\n* a\n* b\n\n# one";
        assert_eq!(round_trip(src), src);
    }

    #[test]
    fn bare_links_gain_labels() {
        assert_eq!(round_trip("[https://x.org]"), "[https://x.org https://x.org]");
        assert_eq!(round_trip("[[Page]]"), "[[Page|Page]]");
    }

    #[test]
    fn text_is_written_literally() {
        let doc = Document::new(vec![Block::Paragraph {
            content: vec![
                Inline::text("a <b> & c "),
                Inline::Insert {
                    content: vec![Inline::text("new")],
                },
            ],
        }]);
        assert_eq!(
            render_wikitext(&doc, &RenderOptions::default()),
            "a <b> & c <ins>new</ins>"
        );
    }

    #[test]
    fn blank_runs_collapse() {
        let doc = Document::new(vec![
            Block::Preformatted {
                text: "a\n\n\n\nb".to_string(),
            },
            Block::Paragraph {
                content: vec![Inline::text("   ")],
            },
            Block::Paragraph {
                content: vec![Inline::text("c")],
            },
        ]);
        assert_eq!(
            render_wikitext(&doc, &RenderOptions::default()),
            "<pre>a\n\nb</pre>\n\nc"
        );
    }

    #[test]
    fn trailing_line_breaks_are_dropped() {
        let doc = Document::new(vec![Block::Paragraph {
            content: vec![Inline::text("x"), Inline::LineBreak, Inline::LineBreak],
        }]);
        assert_eq!(render_wikitext(&doc, &RenderOptions::default()), "x");
    }

    #[test]
    fn heading_line_breaks_become_spaces() {
        let doc = Document::new(vec![Block::Heading {
            level: 2,
            content: vec![Inline::text("a"), Inline::LineBreak, Inline::text("b")],
        }]);
        let out = render_wikitext(&doc, &RenderOptions::default());
        assert_eq!(out, "== a b ==");
        assert_eq!(
            to_rich_text(&out).blocks,
            vec![Block::Heading {
                level: 2,
                content: vec![Inline::text("a b")],
            }]
        );
    }

    #[test]
    fn quote_inlines_render_as_markup() {
        let doc = Document::new(vec![Block::BlockQuote {
            content: vec![
                Inline::Bold {
                    content: vec![Inline::text("x")],
                },
                Inline::text(" said"),
                Inline::LineBreak,
                Inline::text("so"),
            ],
        }]);
        assert_eq!(
            render_wikitext(&doc, &RenderOptions::default()),
            "<blockquote>'''x''' said\nso</blockquote>"
        );
    }

    #[test]
    fn verbatim_blocks_keep_their_bodies() {
        let src = "<pre>'''not bold'''</pre>\n\n<blockquote>quoted</blockquote>";
        assert_eq!(round_trip(src), src);
    }
}
