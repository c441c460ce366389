//! AFL++ fuzz target for `wikicodec`.
//!
//! This binary is stdin-driven, so it can be used with AFL++.
//! Build and run it via `cargo-afl`:
//!
//! ```bash
//! cargo install cargo-afl
//!
//! cargo afl build --release --features afl_fuzz --bin wikicodec_afl_parse
//!
//! mkdir -p fuzz/afl/out
//!
//! cargo afl fuzz \
//!   -i fuzz/afl/in \
//!   -o fuzz/afl/out \
//!   target/release/wikicodec_afl_parse
//! ```
//!
//! Rust panics normally unwind and exit with a non-crashing status code.
//! AFL++ only treats crashes as signals/aborts. We therefore catch any unwind
//! and turn it into `abort()`.

use std::io::Read;

use wikicodec::ast::*;
use wikicodec::{html, locate, parse, reference, render};

const MAX_INPUT_LEN: usize = 1_000_000; // 1MB guardrail; AFL++ will typically cap this anyway.

fn check_span(span: &Span, len: usize) {
    assert!(span.start <= span.end, "invalid span: start > end: {span:?}");
    assert!(span.end <= len, "span out of bounds (len={len}): {span:?}");
}

fn run_one_input(data: &[u8]) {
    if data.len() > MAX_INPUT_LEN {
        return;
    }

    // lossy conversion keeps the harness total (no early returns that reduce coverage).
    let src = String::from_utf8_lossy(data).to_string();

    // markup codec, both directions.
    let out = parse::parse_wikitext(&src);
    for d in &out.diagnostics {
        if let Some(span) = &d.span {
            check_span(span, src.len());
        }
    }
    let html_out = render::render_html(&out.document);
    let wikitext = render::to_wikitext(&html::parse_html(&html_out));
    let _ = parse::to_rich_text(&wikitext);
    let _ = render::html_to_wikitext(&src);

    // JSON round-trip must never panic.
    let json = serde_json::to_vec(&out.document).unwrap();
    let back: Document = serde_json::from_slice(&json).unwrap();
    assert_eq!(back, out.document);

    // locator: every span must slice back to its content.
    let name = src.split(|c: char| !c.is_alphanumeric()).find(|w| !w.is_empty()).unwrap_or("x");
    for s in locate::find_template_ranges(&src, name) {
        check_span(&s.span, src.len());
        assert_eq!(&src[s.span.range()], s.content);
    }
    if let Some(s) = locate::find_section_by_title(&src, name) {
        check_span(&s.span, src.len());
    }

    // reference codec.
    let items = reference::parse(&src);
    for item in &items {
        assert_eq!(item.kind.is_template(), item.content.is_none());
        assert!(item.params.values().all(|v| !v.trim().is_empty()));
    }
    let _ = reference::parse(&reference::serialize(&items));
}

fn main() {
    let mut data = Vec::new();
    std::io::stdin().read_to_end(&mut data).unwrap();

    // convert any panic into an abort().
    if std::panic::catch_unwind(|| run_one_input(&data)).is_err() {
        std::process::abort();
    }
}
