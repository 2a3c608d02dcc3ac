//! Result projection.
//!
//! Turns executor documents into response-safe shapes. The projector never
//! touches the store and never reorders: output order is executor order.
//! A document that cannot be represented is skipped and logged rather than
//! failing the whole page.

use serde_json::{Map, Value};
use tracing::warn;

use catalog_search_shared::{Highlight, SearchResult, TypeaheadSuggestion};

use crate::errors::SearchError;
use crate::pipeline::{HIGHLIGHTS_FIELD, INTERNAL_ID_FIELD, SCORE_FIELD};

/// Project full search documents, keeping at most `page_size` results.
pub fn project_results(documents: Vec<Value>, page_size: usize) -> Vec<SearchResult> {
    documents
        .into_iter()
        .take(page_size)
        .enumerate()
        .filter_map(|(position, document)| {
            project_result(document)
                .map_err(|e| warn!(position, error = %e, "Skipping unrepresentable search result"))
                .ok()
        })
        .collect()
}

/// Project typeahead documents, keeping at most `limit` suggestions.
pub fn project_suggestions(documents: Vec<Value>, limit: usize) -> Vec<TypeaheadSuggestion> {
    documents
        .into_iter()
        .take(limit)
        .enumerate()
        .filter_map(|(position, document)| {
            project_suggestion(document)
                .map_err(|e| warn!(position, error = %e, "Skipping unrepresentable suggestion"))
                .ok()
        })
        .collect()
}

/// Project a single search document.
///
/// Strips the internal identifier and lifts `score` and `highlights` out of the
/// document. A missing or null score is reported as `0.0`; missing highlights
/// become an empty list.
pub fn project_result(document: Value) -> Result<SearchResult, SearchError> {
    let mut fields = into_object(document)?;
    fields.remove(INTERNAL_ID_FIELD);

    let score = take_score(&mut fields)?;
    let highlights = take_highlights(&mut fields)?;

    Ok(SearchResult {
        document: fields,
        score,
        highlights,
    })
}

/// Project a single typeahead document.
pub fn project_suggestion(document: Value) -> Result<TypeaheadSuggestion, SearchError> {
    let mut fields = into_object(document)?;

    Ok(TypeaheadSuggestion {
        name: optional_string(&fields, "name")?,
        description: optional_string(&fields, "description")?,
        keywords: string_list(&fields, "keywords")?,
        highlights: take_highlights(&mut fields)?,
    })
}

fn into_object(document: Value) -> Result<Map<String, Value>, SearchError> {
    match document {
        Value::Object(fields) => Ok(fields),
        other => Err(SearchError::serialization(format!(
            "expected a document object, got {}",
            type_name(&other)
        ))),
    }
}

fn take_score(fields: &mut Map<String, Value>) -> Result<f64, SearchError> {
    match fields.remove(SCORE_FIELD) {
        None | Some(Value::Null) => Ok(0.0),
        Some(Value::Number(number)) => number
            .as_f64()
            .filter(|score| score.is_finite())
            .ok_or_else(|| SearchError::serialization(format!("score {} is not finite", number))),
        Some(other) => Err(SearchError::serialization(format!(
            "score must be a number, got {}",
            type_name(&other)
        ))),
    }
}

fn take_highlights(fields: &mut Map<String, Value>) -> Result<Vec<Highlight>, SearchError> {
    match fields.remove(HIGHLIGHTS_FIELD) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(value) => serde_json::from_value(value)
            .map_err(|e| SearchError::serialization(format!("malformed highlights: {}", e))),
    }
}

fn optional_string(fields: &Map<String, Value>, key: &str) -> Result<Option<String>, SearchError> {
    match fields.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(value)) => Ok(Some(value.clone())),
        Some(other) => Err(SearchError::serialization(format!(
            "{} must be a string, got {}",
            key,
            type_name(other)
        ))),
    }
}

fn string_list(fields: &Map<String, Value>, key: &str) -> Result<Vec<String>, SearchError> {
    match fields.get(key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::String(value)) => Ok(vec![value.clone()]),
        Some(Value::Array(values)) => values
            .iter()
            .map(|value| {
                value.as_str().map(str::to_string).ok_or_else(|| {
                    SearchError::serialization(format!(
                        "{} entries must be strings, got {}",
                        key,
                        type_name(value)
                    ))
                })
            })
            .collect(),
        Some(other) => Err(SearchError::serialization(format!(
            "{} must be a list, got {}",
            key,
            type_name(other)
        ))),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_search_shared::HighlightText;
    use serde_json::json;

    #[test]
    fn test_project_result_strips_id() {
        let result = project_result(json!({
            "_id": "65f0c0ffee",
            "name": "Soil moisture",
            "score": 1.5,
            "highlights": [
                { "path": "name", "texts": [{ "value": "Soil", "type": "hit" }] }
            ]
        }))
        .unwrap();

        assert!(!result.document.contains_key("_id"));
        assert!(!result.document.contains_key("score"));
        assert_eq!(result.document["name"], "Soil moisture");
        assert_eq!(result.score, 1.5);
        assert_eq!(result.highlights[0].texts, vec![HighlightText::hit("Soil")]);
    }

    #[test]
    fn test_serialized_result_has_score_and_highlights() {
        let result = project_result(json!({ "_id": "x", "name": "n" })).unwrap();
        let value = serde_json::to_value(&result).unwrap();

        assert!(value.get("_id").is_none());
        assert_eq!(value["score"], 0.0);
        assert_eq!(value["highlights"], json!([]));
    }

    #[test]
    fn test_bad_documents_are_skipped() {
        let documents = vec![
            json!({ "name": "first", "score": 2.0 }),
            json!("not a document"),
            json!({ "name": "bad score", "score": "high" }),
            json!({ "name": "bad highlights", "score": 1.0, "highlights": 7 }),
            json!({ "name": "last", "score": 1.0 }),
        ];

        let results = project_results(documents, 10);
        let names: Vec<&Value> = results.iter().map(|r| &r.document["name"]).collect();
        assert_eq!(names, vec!["first", "last"]);
    }

    #[test]
    fn test_order_preserved_and_truncated() {
        let documents = vec![
            json!({ "name": "a", "score": 1.0 }),
            json!({ "name": "b", "score": 3.0 }),
            json!({ "name": "c", "score": 2.0 }),
        ];

        let results = project_results(documents, 2);
        let names: Vec<&Value> = results.iter().map(|r| &r.document["name"]).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_project_suggestion() {
        let suggestion = project_suggestion(json!({
            "name": "Soil moisture",
            "keywords": ["soil", "water"],
            "highlights": []
        }))
        .unwrap();

        assert_eq!(suggestion.name.as_deref(), Some("Soil moisture"));
        assert!(suggestion.description.is_none());
        assert_eq!(suggestion.keywords, vec!["soil", "water"]);
        assert!(suggestion.highlights.is_empty());
    }

    #[test]
    fn test_project_suggestions_skips_wrong_types() {
        let documents = vec![
            json!({ "name": 42 }),
            json!({ "name": "ok", "keywords": ["a", 1] }),
            json!({ "name": "fine", "keywords": "single" }),
        ];

        let suggestions = project_suggestions(documents, 10);
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].keywords, vec!["single"]);
    }
}
