//! HTML -> `Document` parser.
//!
//! The editor surface hands us an HTML fragment. We let `scraper` build the
//! DOM (it already decodes entities and repairs unbalanced tags), then walk it
//! into the closed block/inline model. Elements we have no kind for are
//! dropped, but their children are kept.
//!
//! The walk is recursive, so it stops descending at [`MAX_NESTING`]; anything
//! deeper is kept as its plain text.

use crate::ast::{Block, Document, Inline, Link, ListItem, ListMarker, plain_text};
use scraper::{ElementRef, Html, Node};

/// Deepest element nesting converted structurally.
pub const MAX_NESTING: usize = 64;

/// Parse an HTML fragment into a rich-text document.
pub fn parse_html(src: &str) -> Document {
    let fragment = Html::parse_fragment(src);
    let mut builder = BlockBuilder::default();
    builder.visit_children(fragment.root_element(), 0);
    builder.finish()
}

/// Collects blocks, gathering stray top-level inline content into an
/// implicit paragraph.
#[derive(Default)]
struct BlockBuilder {
    blocks: Vec<Block>,
    pending: Vec<Inline>,
}

impl BlockBuilder {
    fn visit_children(&mut self, parent: ElementRef<'_>, depth: usize) {
        for node in parent.children() {
            match node.value() {
                Node::Text(text) => {
                    if self.pending.is_empty() && text.trim().is_empty() {
                        continue;
                    }
                    push_text(&mut self.pending, text);
                }
                Node::Element(_) => {
                    let Some(el) = ElementRef::wrap(node) else {
                        continue;
                    };
                    if depth >= MAX_NESTING {
                        push_text(&mut self.pending, &el.text().collect::<String>());
                    } else {
                        self.visit_element(el, depth + 1);
                    }
                }
                _ => {}
            }
        }
    }

    fn visit_element(&mut self, el: ElementRef<'_>, depth: usize) {
        let name = el.value().name();
        match name {
            "p" => {
                self.flush_pending();
                self.blocks.push(Block::Paragraph {
                    content: trim_inlines(collect_inlines(el, depth)),
                });
            }
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                self.flush_pending();
                // h1 is the page title; the body starts at level 2.
                let level = name[1..].parse::<u8>().unwrap_or(2).max(2);
                self.blocks.push(Block::Heading {
                    level,
                    content: trim_inlines(collect_inlines(el, depth)),
                });
            }
            "ul" | "ol" => {
                self.flush_pending();
                let marker = if name == "ol" {
                    ListMarker::Ordered
                } else {
                    ListMarker::Unordered
                };
                let items = el
                    .children()
                    .filter_map(ElementRef::wrap)
                    .filter(|child| child.value().name() == "li")
                    .map(|li| ListItem {
                        content: trim_inlines(collect_inlines(li, depth + 1)),
                    })
                    .collect();
                self.blocks.push(Block::List { marker, items });
            }
            "blockquote" => {
                self.flush_pending();
                let mut content = trim_inlines(quote_inlines(el, depth));
                while matches!(content.last(), Some(Inline::LineBreak)) {
                    content.pop();
                }
                self.blocks.push(Block::BlockQuote { content });
            }
            "pre" => {
                self.flush_pending();
                self.blocks.push(Block::Preformatted {
                    text: verbatim_text(el, depth),
                });
            }
            // transparent block containers.
            "div" | "section" | "article" | "main" | "header" | "footer" | "body" | "html" => {
                self.flush_pending();
                self.visit_children(el, depth);
                self.flush_pending();
            }
            _ => extend_inlines(&mut self.pending, inline_element(el, depth)),
        }
    }

    fn flush_pending(&mut self) {
        let content = std::mem::take(&mut self.pending);
        if !plain_text(&content).trim().is_empty() {
            self.blocks.push(Block::Paragraph {
                content: trim_inlines(content),
            });
        }
    }

    fn finish(mut self) -> Document {
        self.flush_pending();
        Document::new(self.blocks)
    }
}

/// Convert the children of `el`, which sits `depth` elements deep.
fn collect_inlines(el: ElementRef<'_>, depth: usize) -> Vec<Inline> {
    let mut out = Vec::new();
    for child in el.children() {
        match child.value() {
            Node::Text(text) => push_text(&mut out, text),
            Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    extend_inlines(&mut out, inline_element(child_el, depth + 1));
                }
            }
            _ => {}
        }
    }
    out
}

/// Convert one inline element. Unsupported tags are stripped: the result is
/// just their converted children.
fn inline_element(el: ElementRef<'_>, depth: usize) -> Vec<Inline> {
    if depth > MAX_NESTING {
        return vec![Inline::text(el.text().collect::<String>())];
    }
    let node = match el.value().name() {
        "strong" | "b" => Inline::Bold {
            content: collect_inlines(el, depth),
        },
        "em" | "i" => Inline::Italic {
            content: collect_inlines(el, depth),
        },
        "u" => Inline::Underline {
            content: collect_inlines(el, depth),
        },
        "s" | "strike" | "del" => Inline::Strike {
            content: collect_inlines(el, depth),
        },
        "ins" => Inline::Insert {
            content: collect_inlines(el, depth),
        },
        "code" | "tt" => Inline::Code {
            value: el.text().collect(),
        },
        "br" => Inline::LineBreak,
        "a" => match el.value().attr("href") {
            Some(href) if !href.trim().is_empty() => {
                let href = href.trim();
                let label: String = el.text().collect();
                let label = label.trim();
                let label = if label.is_empty() { href } else { label };
                Inline::Link {
                    link: Link::new(href, label),
                }
            }
            _ => return collect_inlines(el, depth),
        },
        _ => return collect_inlines(el, depth),
    };
    vec![node]
}

/// Inline content of a `<blockquote>`. Nested `<p>`/`<div>` blocks start a
/// new line.
fn quote_inlines(el: ElementRef<'_>, depth: usize) -> Vec<Inline> {
    let mut out = Vec::new();
    for child in el.children() {
        match child.value() {
            Node::Text(text) => push_text(&mut out, text),
            Node::Element(_) => {
                let Some(child_el) = ElementRef::wrap(child) else {
                    continue;
                };
                match child_el.value().name() {
                    "p" | "div" if depth < MAX_NESTING => {
                        start_line(&mut out);
                        extend_inlines(&mut out, quote_inlines(child_el, depth + 1));
                        start_line(&mut out);
                    }
                    _ => extend_inlines(&mut out, inline_element(child_el, depth + 1)),
                }
            }
            _ => {}
        }
    }
    out
}

/// End the current line of a quote unless it is blank.
fn start_line(out: &mut Vec<Inline>) {
    if let Some(Inline::Text { value }) = out.last_mut() {
        let trimmed = value.trim_end().len();
        value.truncate(trimmed);
        if value.is_empty() {
            out.pop();
        }
    }
    match out.last() {
        None | Some(Inline::LineBreak) => {}
        Some(_) => out.push(Inline::LineBreak),
    }
}

/// Text of a `<pre>` block: descendant text, `<br>` as a newline, and a
/// newline between nested block elements.
fn verbatim_text(el: ElementRef<'_>, depth: usize) -> String {
    let mut out = String::new();
    append_verbatim(el, depth, &mut out);
    out
}

fn append_verbatim(el: ElementRef<'_>, depth: usize, out: &mut String) {
    for child in el.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(_) => {
                let Some(child_el) = ElementRef::wrap(child) else {
                    continue;
                };
                if depth >= MAX_NESTING {
                    out.extend(child_el.text());
                    continue;
                }
                match child_el.value().name() {
                    "br" => out.push('\n'),
                    "p" | "div" => {
                        if !out.is_empty() && !out.ends_with('\n') {
                            out.push('\n');
                        }
                        append_verbatim(child_el, depth + 1, out);
                    }
                    _ => append_verbatim(child_el, depth + 1, out),
                }
            }
            _ => {}
        }
    }
}

fn extend_inlines(out: &mut Vec<Inline>, nodes: Vec<Inline>) {
    for node in nodes {
        match node {
            Inline::Text { value } => push_text(out, &value),
            other => out.push(other),
        }
    }
}

/// Append text, merging with a preceding text node. Source newlines are
/// formatting whitespace in HTML, so they become spaces.
fn push_text(out: &mut Vec<Inline>, text: &str) {
    let text = text.replace("\r\n", " ").replace('\n', " ");
    if let Some(Inline::Text { value }) = out.last_mut() {
        value.push_str(&text);
        return;
    }
    out.push(Inline::text(text));
}

/// Drop leading/trailing whitespace at the edges of a run of inlines.
fn trim_inlines(mut nodes: Vec<Inline>) -> Vec<Inline> {
    if let Some(Inline::Text { value }) = nodes.first_mut() {
        *value = value.trim_start().to_string();
    }
    if let Some(Inline::Text { value }) = nodes.last_mut() {
        *value = value.trim_end().to_string();
    }
    nodes.retain(|n| !matches!(n, Inline::Text { value } if value.is_empty()));
    nodes
}
