//! Reference-field codec.
//!
//! A reference field is prose with a few citation templates mixed in:
//! `Source text {{Refcheck|user=Bob|date=2024}} {{cn}}`. [`parse`] splits it
//! into typed items, [`serialize`] joins them back.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicU64, Ordering};

static TEMPLATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\{\{\s*(Refcheck|Refurl|cn)\s*(?:\|(.*?))?\}\}").unwrap()
});

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque identity for a parsed item. Unique within the process; carries no
/// meaning beyond giving list bindings something stable to key on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(u64);

impl ItemId {
    pub fn fresh() -> Self {
        ItemId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ref-{}", self.0)
    }
}

/// Item kinds. Template kinds keep the exact template name casing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReferenceKind {
    #[serde(rename = "text")]
    Text,
    #[serde(rename = "Refcheck")]
    Refcheck,
    #[serde(rename = "Refurl")]
    Refurl,
    #[serde(rename = "cn")]
    Cn,
}

impl ReferenceKind {
    pub const TEMPLATES: [ReferenceKind; 3] =
        [ReferenceKind::Refcheck, ReferenceKind::Refurl, ReferenceKind::Cn];

    pub fn as_str(self) -> &'static str {
        match self {
            ReferenceKind::Text => "text",
            ReferenceKind::Refcheck => "Refcheck",
            ReferenceKind::Refurl => "Refurl",
            ReferenceKind::Cn => "cn",
        }
    }

    pub fn is_template(self) -> bool {
        self != ReferenceKind::Text
    }
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownKind(pub String);

impl fmt::Display for UnknownKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown reference kind: {}", self.0)
    }
}

impl std::error::Error for UnknownKind {}

impl FromStr for ReferenceKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(ReferenceKind::Text),
            "Refcheck" => Ok(ReferenceKind::Refcheck),
            "Refurl" => Ok(ReferenceKind::Refurl),
            "cn" => Ok(ReferenceKind::Cn),
            other => Err(UnknownKind(other.to_string())),
        }
    }
}

/// One piece of a reference field: plain text or a citation template.
///
/// Text items have no params; template items have no content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceItem {
    pub id: ItemId,
    #[serde(rename = "type")]
    pub kind: ReferenceKind,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl ReferenceItem {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            id: ItemId::fresh(),
            kind: ReferenceKind::Text,
            params: BTreeMap::new(),
            content: Some(content.into()),
        }
    }

    /// A template item. Params are normalized with [`clean_params`].
    /// Passing `ReferenceKind::Text` yields an empty text item.
    pub fn template(kind: ReferenceKind, params: BTreeMap<String, String>) -> Self {
        if !kind.is_template() {
            return Self::text("");
        }
        Self {
            id: ItemId::fresh(),
            kind,
            params: clean_params(&params),
            content: None,
        }
    }

    /// Structural equality, ignoring ids.
    pub fn is_equivalent(&self, other: &ReferenceItem) -> bool {
        self.kind == other.kind && self.params == other.params && self.content == other.content
    }

    /// Wikitext for this item alone.
    pub fn to_wikitext(&self) -> String {
        if !self.kind.is_template() {
            return self.content.clone().unwrap_or_default();
        }
        let mut out = format!("{{{{{}", self.kind);
        for (k, v) in &self.params {
            if v.trim().is_empty() {
                continue;
            }
            out.push('|');
            out.push_str(k);
            out.push('=');
            out.push_str(v);
        }
        out.push_str("}}");
        out
    }
}

/// Split a reference field into text and template items, in order.
///
/// Unknown or unterminated templates are left inside the surrounding text.
/// Text runs between templates are trimmed and dropped when blank.
pub fn parse(text: &str) -> Vec<ReferenceItem> {
    if !text.contains("{{") {
        return vec![ReferenceItem::text(text)];
    }

    let mut items = Vec::new();
    let mut last = 0usize;
    for caps in TEMPLATE_RE.captures_iter(text) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        // an unrecognized match stays in the next text run.
        let Ok(kind) = caps[1].parse::<ReferenceKind>() else {
            continue;
        };
        push_text_run(&mut items, &text[last..whole.start()]);

        let params = caps.get(2).map(|m| parse_params(m.as_str())).unwrap_or_default();
        items.push(ReferenceItem::template(kind, params));
        last = whole.end();
    }
    push_text_run(&mut items, &text[last..]);

    log::trace!("parsed reference field into {} items", items.len());
    items
}

fn push_text_run(items: &mut Vec<ReferenceItem>, run: &str) {
    let run = run.trim();
    if !run.is_empty() {
        items.push(ReferenceItem::text(run));
    }
}

/// `k1=v1|k2=v2`; pieces without `=` (positional params) are dropped.
fn parse_params(tail: &str) -> BTreeMap<String, String> {
    let mut params = BTreeMap::new();
    for piece in tail.split('|') {
        let Some((key, value)) = piece.split_once('=') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        params.insert(key.to_string(), value.trim().to_string());
    }
    params
}

/// Join items back into a reference field, separated by single spaces.
pub fn serialize(items: &[ReferenceItem]) -> String {
    items
        .iter()
        .map(ReferenceItem::to_wikitext)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Keep only params whose trimmed value is non-empty, with values trimmed.
pub fn clean_params(params: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    params
        .iter()
        .filter_map(|(k, v)| {
            let v = v.trim();
            (!v.is_empty()).then(|| (k.clone(), v.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn plain_text_is_one_item() {
        let items = parse("No templates here");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].kind, ReferenceKind::Text);
        assert_eq!(items[0].content.as_deref(), Some("No templates here"));
        assert!(items[0].params.is_empty());
    }

    #[test]
    fn fast_path_keeps_braces_and_whitespace() {
        let items = parse("  f(x) = { y }  ");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].content.as_deref(), Some("  f(x) = { y }  "));
    }

    #[test]
    fn refcheck_params() {
        let items = parse("{{Refcheck|user=Bob|date=2024}}");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].kind, ReferenceKind::Refcheck);
        assert_eq!(items[0].params, params(&[("user", "Bob"), ("date", "2024")]));
        assert_eq!(items[0].content, None);

        let again = parse(&serialize(&items));
        assert_eq!(again.len(), 1);
        assert!(again[0].is_equivalent(&items[0]));
        assert_ne!(again[0].id, items[0].id);
    }

    #[test]
    fn mixed_text_and_templates() {
        let items = parse("Seen in game {{cn}} and {{Refurl| url = https://x.org | bare }} ");
        let kinds: Vec<ReferenceKind> = items.iter().map(|i| i.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ReferenceKind::Text,
                ReferenceKind::Cn,
                ReferenceKind::Text,
                ReferenceKind::Refurl
            ]
        );
        assert_eq!(items[0].content.as_deref(), Some("Seen in game"));
        assert_eq!(items[2].content.as_deref(), Some("and"));
        assert_eq!(items[3].params, params(&[("url", "https://x.org")]));
    }

    #[test]
    fn each_text_run_appears_once() {
        let items = parse("a {{cn}} b {{cn}}{{Refcheck|user=Bob}} c");
        let texts: Vec<&str> = items.iter().filter_map(|i| i.content.as_deref()).collect();
        assert_eq!(texts, vec!["a", "b", "c"]);
        assert_eq!(items.len(), 6);
        assert_eq!(serialize(&items), "a {{cn}} b {{cn}} {{Refcheck|user=Bob}} c");
    }

    #[test]
    fn unknown_and_unterminated_templates_stay_text() {
        let items = parse("{{Other|a=1}} {{Refcheck|user=Bob");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].kind, ReferenceKind::Text);
        assert_eq!(items[0].content.as_deref(), Some("{{Other|a=1}} {{Refcheck|user=Bob"));
    }

    #[test]
    fn template_name_needs_a_boundary() {
        let items = parse("{{cnx}}");
        assert_eq!(items[0].kind, ReferenceKind::Text);
    }

    #[test]
    fn serialize_filters_empty_values() {
        let mut item = ReferenceItem::template(ReferenceKind::Refcheck, BTreeMap::new());
        item.params = params(&[("user", "Bob"), ("date", "")]);
        assert_eq!(serialize(&[item]), "{{Refcheck|user=Bob}}");

        let cn = ReferenceItem::template(ReferenceKind::Cn, params(&[("x", "  ")]));
        assert_eq!(serialize(&[cn]), "{{cn}}");
    }

    #[test]
    fn serialize_text_without_content_is_empty() {
        let mut item = ReferenceItem::text("x");
        item.content = None;
        assert_eq!(serialize(&[item, ReferenceItem::text("y")]), " y");
    }

    #[test]
    fn round_trip_is_idempotent() {
        let src = "  lead {{Refcheck|date=2024|user=Bob}}{{cn}}mid {{Refurl|url=u}}  ";
        let once = serialize(&parse(src));
        let twice = serialize(&parse(&once));
        assert_eq!(once, twice);
        assert_eq!(once, "lead {{Refcheck|date=2024|user=Bob}} {{cn}} mid {{Refurl|url=u}}");
    }

    #[test]
    fn clean_params_trims_and_drops() {
        let cleaned = clean_params(&params(&[("a", " 1 "), ("b", ""), ("c", "   ")]));
        assert_eq!(cleaned, params(&[("a", "1")]));
    }

    #[test]
    fn kind_names_round_trip_through_from_str() {
        for kind in ReferenceKind::TEMPLATES {
            assert_eq!(kind.as_str().parse::<ReferenceKind>().unwrap(), kind);
        }
        assert!("Cn".parse::<ReferenceKind>().is_err());
    }

    #[test]
    fn json_uses_type_names() {
        let item = ReferenceItem::template(ReferenceKind::Cn, BTreeMap::new());
        let v = serde_json::to_value(&item).unwrap();
        assert_eq!(v["type"], "cn");
        assert!(v.get("content").is_none());
        assert!(v.get("params").is_none());
    }
}
