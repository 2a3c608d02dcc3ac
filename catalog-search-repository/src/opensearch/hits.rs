//! Conversion of OpenSearch hits into pipeline documents.

use serde_json::{json, Map, Value};

use catalog_search_shared::{Highlight, HighlightText};

use crate::errors::SearchError;
use crate::opensearch::queries::{HitShaping, HIGHLIGHT_POST_TAG, HIGHLIGHT_PRE_TAG};
use crate::pipeline::{HIGHLIGHTS_FIELD, INTERNAL_ID_FIELD, SCORE_FIELD};

/// Pull the hit list out of a search response.
pub fn extract_hits(response: &Value) -> Result<&[Value], SearchError> {
    response["hits"]["hits"]
        .as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| SearchError::backend("search response is missing hits.hits"))
}

/// Turn one hit into a document shaped by the pipeline's field-shaping stages.
pub fn normalize_hit(hit: &Value, shaping: &HitShaping) -> Value {
    let mut document = match hit.get("_source") {
        Some(Value::Object(source)) => source.clone(),
        None => Map::new(),
        // Left as-is; the projector reports it.
        Some(other) => return other.clone(),
    };

    for field in &shaping.exclude {
        document.remove(field);
    }

    if shaping.keep_id {
        if let Some(id) = hit.get("_id") {
            document.insert(INTERNAL_ID_FIELD.to_string(), id.clone());
        }
    }

    if shaping.score {
        let score = hit.get("_score").cloned().unwrap_or(Value::Null);
        document.insert(SCORE_FIELD.to_string(), score);
    }

    if let Some(paths) = &shaping.highlight_paths {
        let highlights = parse_highlights(hit.get("highlight"), paths);
        document.insert(HIGHLIGHTS_FIELD.to_string(), json!(highlights));
    }

    Value::Object(document)
}

/// Collect highlight fragments for the configured paths, in path order.
///
/// Each fragment becomes its own `Highlight`, so multi-valued fields such as
/// `keywords` yield one entry per matching value.
fn parse_highlights(highlight: Option<&Value>, paths: &[String]) -> Vec<Highlight> {
    let Some(Value::Object(fields)) = highlight else {
        return Vec::new();
    };

    let mut highlights = Vec::new();
    for path in paths {
        let Some(fragments) = fields.get(path).and_then(Value::as_array) else {
            continue;
        };
        for fragment in fragments.iter().filter_map(Value::as_str) {
            highlights.push(Highlight {
                path: path.clone(),
                texts: parse_fragment(fragment),
            });
        }
    }
    highlights
}

/// Split a tagged fragment into matched and unmatched spans.
pub fn parse_fragment(fragment: &str) -> Vec<HighlightText> {
    let mut texts = Vec::new();
    let mut rest = fragment;

    while let Some(start) = rest.find(HIGHLIGHT_PRE_TAG) {
        if start > 0 {
            texts.push(HighlightText::text(&rest[..start]));
        }
        let after = &rest[start + HIGHLIGHT_PRE_TAG.len()..];
        match after.find(HIGHLIGHT_POST_TAG) {
            Some(end) => {
                if end > 0 {
                    texts.push(HighlightText::hit(&after[..end]));
                }
                rest = &after[end + HIGHLIGHT_POST_TAG.len()..];
            }
            None => {
                // Unterminated tag: the remainder is the match.
                if !after.is_empty() {
                    texts.push(HighlightText::hit(after));
                }
                rest = "";
            }
        }
    }

    if !rest.is_empty() {
        texts.push(HighlightText::text(rest));
    }
    texts
}
