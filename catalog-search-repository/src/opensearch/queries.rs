//! OpenSearch request builders.
//!
//! This module renders a compiled `Pipeline` into a single OpenSearch
//! `_search` body, and records the per-hit shaping the executor applies to
//! the response.

use serde_json::{json, Map, Value};

use crate::errors::SearchError;
use crate::pipeline::{
    format_instant, Clause, Compound, HighlightConfig, Pipeline, Stage, HIGHLIGHTS_FIELD,
    INTERNAL_ID_FIELD, SCORE_FIELD,
};
use crate::types::SortDirection;

/// Tag opening a matched span in highlight fragments.
pub const HIGHLIGHT_PRE_TAG: &str = "<em>";

/// Tag closing a matched span in highlight fragments.
pub const HIGHLIGHT_POST_TAG: &str = "</em>";

/// OpenSearch's default `index.max_result_window`: `from + size` may not exceed it.
pub const MAX_RESULT_WINDOW: u64 = 10_000;

/// How each raw hit is turned into a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HitShaping {
    /// Keep the internal identifier under `_id`.
    pub keep_id: bool,
    /// Attach `_score` under `score`.
    pub score: bool,
    /// Attach parsed highlight fragments under `highlights`, in this path order.
    pub highlight_paths: Option<Vec<String>>,
    /// Source fields removed after retrieval.
    pub exclude: Vec<String>,
}

impl Default for HitShaping {
    fn default() -> Self {
        Self {
            keep_id: true,
            score: false,
            highlight_paths: None,
            exclude: Vec::new(),
        }
    }
}

/// A rendered request and the shaping for its hits.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchPlan {
    pub body: Value,
    pub shaping: HitShaping,
    /// Hits requested. Zero means the store need not be asked.
    pub size: u64,
}

/// Build an OpenSearch search body from a pipeline.
///
/// The stage order is checked first; malformed pipelines never reach the
/// store. `ceiling` clamps the limit stage (or stands in for it when absent),
/// and the size shrinks so the page ends inside the result window.
pub fn build_search_body(pipeline: &Pipeline, ceiling: usize) -> Result<SearchPlan, SearchError> {
    pipeline.validate()?;

    let mut body = Map::new();
    let mut shaping = HitShaping::default();
    let mut highlight: Option<&HighlightConfig> = None;
    let mut includes: Vec<String> = Vec::new();
    let mut sorted = false;
    let mut size = ceiling as u64;
    let mut from = 0;

    for stage in pipeline.stages() {
        match stage {
            Stage::Search(search) => {
                body.insert("query".to_string(), build_compound_query(&search.compound));
                highlight = search.highlight.as_ref();
            }
            Stage::Sort(sort) => {
                let order = match sort.direction {
                    SortDirection::Ascending => "asc",
                    SortDirection::Descending => "desc",
                };
                let mut field = Map::new();
                field.insert(sort.field.clone(), json!({ "order": order }));
                body.insert("sort".to_string(), json!([field]));
                sorted = true;
            }
            Stage::Skip(skip) => {
                body.insert("from".to_string(), json!(skip));
                from = *skip;
            }
            Stage::Limit(limit) => {
                size = size.min(*limit);
            }
            Stage::Project(projection) => {
                if !projection.include.is_empty() {
                    includes = projection.include.clone();
                }
                if projection.exclude_id {
                    shaping.keep_id = false;
                }
                shaping.score |= projection.score;
                if projection.highlights {
                    shaping.highlight_paths = Some(
                        highlight
                            .map(|config| config.path.clone())
                            .unwrap_or_default(),
                    );
                }
            }
            Stage::Unset(fields) => {
                for field in fields {
                    match field.as_str() {
                        INTERNAL_ID_FIELD => shaping.keep_id = false,
                        SCORE_FIELD => shaping.score = false,
                        HIGHLIGHTS_FIELD => shaping.highlight_paths = None,
                        _ => shaping.exclude.push(field.clone()),
                    }
                }
            }
        }
    }

    if !body.contains_key("query") {
        body.insert("query".to_string(), json!({ "match_all": {} }));
    }
    size = size.min(MAX_RESULT_WINDOW.saturating_sub(from));
    body.insert("size".to_string(), json!(size));

    // Field sorts skip scoring unless asked.
    if sorted && shaping.score {
        body.insert("track_scores".to_string(), json!(true));
    }

    if let (Some(config), Some(_)) = (highlight, &shaping.highlight_paths) {
        body.insert("highlight".to_string(), build_highlight(config));
    }

    let mut source = Map::new();
    if !includes.is_empty() {
        source.insert("includes".to_string(), json!(includes));
    }
    if !shaping.exclude.is_empty() {
        source.insert("excludes".to_string(), json!(shaping.exclude));
    }
    if !source.is_empty() {
        body.insert("_source".to_string(), Value::Object(source));
    }

    Ok(SearchPlan {
        body: Value::Object(body),
        shaping,
        size,
    })
}

/// Build the bool query for a compound search stage.
///
/// With only `should` clauses OpenSearch requires at least one to match; once
/// `must` or `filter` clauses are present the `should` clauses only add score.
fn build_compound_query(compound: &Compound) -> Value {
    let render = |clauses: &[Clause]| -> Vec<Value> { clauses.iter().map(build_clause).collect() };

    json!({
        "bool": {
            "should": render(&compound.should),
            "must": render(&compound.must),
            "filter": render(&compound.filter)
        }
    })
}

fn build_clause(clause: &Clause) -> Value {
    let mut field = Map::new();
    match clause {
        Clause::Autocomplete(autocomplete) => {
            field.insert(
                autocomplete.path.clone(),
                json!({
                    "query": autocomplete.query,
                    "fuzziness": autocomplete.fuzzy.max_edits.to_string()
                }),
            );
            json!({ "match_bool_prefix": field })
        }
        Clause::Text(text) => {
            field.insert(text.path.clone(), json!({ "query": text.query }));
            json!({ "match": field })
        }
        Clause::Range(range) => {
            let mut bounds = Map::new();
            if let Some(gte) = &range.gte {
                bounds.insert("gte".to_string(), json!(format_instant(gte)));
            }
            if let Some(lt) = &range.lt {
                bounds.insert("lt".to_string(), json!(format_instant(lt)));
            }
            field.insert(range.path.clone(), Value::Object(bounds));
            json!({ "range": field })
        }
    }
}

/// Highlight the whole field value so every matched span comes back.
fn build_highlight(config: &HighlightConfig) -> Value {
    let mut fields = Map::new();
    for path in &config.path {
        fields.insert(path.clone(), json!({ "number_of_fragments": 0 }));
    }

    json!({
        "pre_tags": [HIGHLIGHT_PRE_TAG],
        "post_tags": [HIGHLIGHT_POST_TAG],
        "fields": fields
    })
}

/// Build a `terms` aggregation listing distinct values of a field.
pub fn build_distinct_query(field: &str, limit: usize) -> Value {
    json!({
        "size": 0,
        "aggs": {
            "distinct": {
                "terms": {
                    "field": field,
                    "size": limit
                }
            }
        }
    })
}
