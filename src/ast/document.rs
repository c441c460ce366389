use serde::{Deserialize, Serialize};

/// Root node of a rich-text document.
///
/// A document is an ordered sequence of blocks. It carries no source spans:
/// documents built from HTML have no wikitext offsets to point at, and the
/// editor surface never asks for them.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub blocks: Vec<Block>,
}

impl Document {
    pub fn new(blocks: Vec<Block>) -> Self {
        Self { blocks }
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

/// Block-level node kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Heading {
        /// Heading level (2..=6). Level 1 is reserved for the page title.
        level: u8,
        content: Vec<Inline>,
    },

    /// Paragraph text. Single line breaks inside the source paragraph are
    /// kept as `Inline::LineBreak`.
    Paragraph { content: Vec<Inline> },

    /// A flat list. Mixed `*`/`#` runs produce sibling lists, never one
    /// merged list.
    List {
        marker: ListMarker,
        items: Vec<ListItem>,
    },

    /// `<blockquote>` body. Wikitext bodies are one verbatim text node;
    /// HTML bodies keep their inline formatting.
    BlockQuote { content: Vec<Inline> },

    /// `<pre>` body, kept verbatim.
    Preformatted { text: String },
}

/// List marker types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListMarker {
    /// `*` bullet list.
    Unordered,
    /// `#` numbered list.
    Ordered,
}

impl ListMarker {
    /// The wikitext line prefix for this marker.
    pub fn wikitext_prefix(self) -> char {
        match self {
            ListMarker::Unordered => '*',
            ListMarker::Ordered => '#',
        }
    }

    /// The HTML container tag for this marker.
    pub fn html_tag(self) -> &'static str {
        match self {
            ListMarker::Unordered => "ul",
            ListMarker::Ordered => "ol",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ListItem {
    #[serde(default)]
    pub content: Vec<Inline>,
}

/// Inline-level node kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Inline {
    Text { value: String },

    Bold { content: Vec<Inline> },
    Italic { content: Vec<Inline> },
    Underline { content: Vec<Inline> },

    /// `<s>`, `<strike>` and `<del>` all land here.
    Strike { content: Vec<Inline> },

    /// `<ins>`.
    Insert { content: Vec<Inline> },

    /// `<code>` body, kept verbatim.
    Code { value: String },

    Link { link: Link },

    /// `<br>` in HTML, a single newline inside a wikitext paragraph.
    LineBreak,
}

impl Inline {
    pub fn text(value: impl Into<String>) -> Self {
        Inline::Text {
            value: value.into(),
        }
    }

    /// Concatenated visible text of this node, without any markup.
    pub fn plain_text(&self) -> String {
        match self {
            Inline::Text { value } | Inline::Code { value } => value.clone(),
            Inline::Bold { content }
            | Inline::Italic { content }
            | Inline::Underline { content }
            | Inline::Strike { content }
            | Inline::Insert { content } => plain_text(content),
            Inline::Link { link } => link.label.clone(),
            Inline::LineBreak => "\n".to_string(),
        }
    }
}

/// Concatenated visible text of a run of inlines.
pub fn plain_text(nodes: &[Inline]) -> String {
    nodes.iter().map(Inline::plain_text).collect()
}

/// A hyperlink: either an external URL or an internal page name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub href: String,
    /// Visible text. Defaults to the href/page name when the source has no label.
    pub label: String,
}

impl Link {
    pub fn new(href: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            label: label.into(),
        }
    }

    /// True when `href` carries a URL scheme (`https://`, protocol-relative
    /// `//`, `mailto:`). Anything else is treated as a wiki page name.
    pub fn is_external(&self) -> bool {
        has_url_scheme(&self.href)
    }
}

/// Returns true if `s` starts with something that looks like a URL scheme.
///
/// `Category:Foo` and other namespaced page names are deliberately not URLs:
/// a scheme is only recognized when followed by `//`, or for `mailto:`.
pub fn has_url_scheme(s: &str) -> bool {
    let s = s.trim_start();
    if s.starts_with("//") {
        return true;
    }
    if s.get(..7).is_some_and(|p| p.eq_ignore_ascii_case("mailto:")) {
        return true;
    }
    let Some((scheme, rest)) = s.split_once(':') else {
        return false;
    };
    let mut chars = scheme.chars();
    let starts_alpha = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
    starts_alpha
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        && rest.starts_with("//")
}
