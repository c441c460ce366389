use crate::ast::Span;
use serde::{Deserialize, Serialize};

/// Severity level of a diagnostic emitted while parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Info,
}

/// A structured note about a recovery decision the parser made.
///
/// Diagnostics never stop a conversion; they exist so callers can see why
/// the output looks the way it does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,

    /// A stable identifier like `wikitext.pre.unclosed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    /// Human readable message.
    pub message: String,

    /// The source span this diagnostic refers to, if available.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span: Option<Span>,
}

impl Diagnostic {
    pub fn warning(code: &str, message: impl Into<String>, span: Span) -> Self {
        Self {
            severity: Severity::Warning,
            code: Some(code.to_string()),
            message: message.into(),
            span: Some(span),
        }
    }

    pub fn info(code: &str, message: impl Into<String>, span: Span) -> Self {
        Self {
            severity: Severity::Info,
            code: Some(code.to_string()),
            message: message.into(),
            span: Some(span),
        }
    }
}
