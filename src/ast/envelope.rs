use crate::ast::{Diagnostic, Document, GENERATOR_NAME, GENERATOR_VERSION};
use serde::{Deserialize, Serialize};

/// Top-level JSON written by `wikicodec ast`.
///
/// This wraps a `Document` with metadata that makes debugging easier
/// (schema versioning, which codec produced it, diagnostics).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentFile {
    /// Schema version for this JSON payload.
    pub schema_version: u32,

    pub generator: GeneratorInfo,

    /// Which markup the document was parsed from.
    pub source_format: SourceFormat,

    /// Parser diagnostics. Always empty for HTML input.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,

    pub document: Document,
}

/// Identifies the program that produced the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorInfo {
    pub name: String,
    pub version: String,
}

impl GeneratorInfo {
    pub fn current() -> Self {
        Self {
            name: GENERATOR_NAME.to_string(),
            version: GENERATOR_VERSION.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceFormat {
    Wikitext,
    Html,
}
