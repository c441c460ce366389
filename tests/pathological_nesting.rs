use wikicodec::ast::{Block, Inline};
use wikicodec::{html, parse, render};

fn has_code(out: &parse::ParseOutput, code: &str) -> bool {
    out.diagnostics
        .iter()
        .any(|d| d.code.as_deref() == Some(code))
}

#[test]
fn pathological_wikitext_runs_are_treated_as_text() {
    // Huge runs of openers with no closers. Each opener used to rescan the
    // rest of the line for its closer.
    let cases = [
        ("quotes", "'".repeat(20_000), "wikitext.inline.pathological_delim_run"),
        ("underline", "<u>".repeat(20_000), "wikitext.u.unclosed"),
        ("code", "<code>".repeat(20_000), "wikitext.code.unclosed"),
    ];

    for (name, src, code) in cases {
        let out = parse::parse_wikitext(&src);

        assert!(has_code(&out, code), "expected {code} for case '{name}'");
        assert_eq!(
            out.diagnostics.len(),
            1,
            "expected one diagnostic for case '{name}'"
        );

        let Some(first_block) = out.document.blocks.first() else {
            panic!("expected at least one block for case '{name}'");
        };
        match first_block {
            Block::Paragraph { content } => {
                assert_eq!(content, &vec![Inline::text(src.as_str())], "case '{name}'");
            }
            other => panic!("expected Paragraph for '{name}', got {other:?}"),
        }
    }
}

#[test]
fn deeply_nested_wikitext_tags_stay_total() {
    let depth = 5_000;
    let src = format!(
        "{}x{}",
        "<u><s><ins>".repeat(depth),
        "</ins></s></u>".repeat(depth)
    );
    let out = parse::parse_wikitext(&src);
    assert_eq!(out.document.blocks.len(), 1);
    for d in &out.diagnostics {
        let span = d.span.expect("inline diagnostics carry a span");
        assert!(span.end <= src.len(), "{span:?}");
    }
    assert!(render::render_html(&out.document).contains('x'));
}

#[test]
fn deeply_nested_html_is_flattened_past_the_limit() {
    let depth = 20_000;
    let cases = [
        ("bold", format!("<p>{}x{}</p>", "<b>".repeat(depth), "</b>".repeat(depth))),
        ("divs", format!("{}x{}", "<div>".repeat(depth), "</div>".repeat(depth))),
        (
            "quote",
            format!(
                "<blockquote>{}x{}</blockquote>",
                "<em>".repeat(depth),
                "</em>".repeat(depth)
            ),
        ),
        ("pre", format!("<pre>{}x{}</pre>", "<i>".repeat(depth), "</i>".repeat(depth))),
    ];

    for (name, src) in cases {
        let doc = html::parse_html(&src);
        assert_eq!(doc.blocks.len(), 1, "case '{name}'");

        let wikitext = render::render_wikitext(&doc, &render::RenderOptions::default());
        assert!(wikitext.contains('x'), "case '{name}': {wikitext:?}");

        // the rendered markup must itself parse without blowing up.
        let again = parse::to_rich_text(&wikitext);
        assert!(!again.blocks.is_empty(), "case '{name}'");
    }
}
