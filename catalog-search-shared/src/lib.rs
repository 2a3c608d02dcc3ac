//! # Catalog Search Shared
//!
//! Response types shared between the search repository and the HTTP service.
//! Everything here is constructed per response and never persisted.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Whether a highlighted span is a matched term or surrounding context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HighlightKind {
    /// The span matched the query.
    Hit,
    /// Unmatched context around a hit.
    Text,
}

/// A single span of a highlighted field value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighlightText {
    pub value: String,
    #[serde(rename = "type")]
    pub kind: HighlightKind,
}

impl HighlightText {
    pub fn hit(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            kind: HighlightKind::Hit,
        }
    }

    pub fn text(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            kind: HighlightKind::Text,
        }
    }
}

/// Matched-span metadata for one highlighted document path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Highlight {
    /// The document path the spans were taken from (e.g. `creator.name`).
    pub path: String,
    /// The ordered spans making up the highlighted fragment.
    pub texts: Vec<HighlightText>,
}

/// A projected search hit.
///
/// The document's own fields are flattened into the top level next to
/// `score` and `highlights`. The internal store identifier is never present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// The document fields, minus internal ones.
    #[serde(flatten)]
    pub document: Map<String, Value>,
    /// Relevance score computed by the search stage.
    pub score: f64,
    /// Highlighted spans; empty when nothing matched a highlight path.
    pub highlights: Vec<Highlight>,
}

/// A typeahead suggestion: a reduced view of a resource document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeaheadSuggestion {
    pub name: Option<String>,
    pub description: Option<String>,
    pub keywords: Vec<String>,
    pub highlights: Vec<Highlight>,
}
