//! Pipeline stage and clause types.
//!
//! A `Pipeline` is an ordered, immutable list of typed stages. Stages never
//! carry backend syntax; executors render them into whatever request their
//! store understands.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::errors::SearchError;
use crate::types::{SortDirection, SortSpec};

/// Fields matched by the fuzzy autocomplete `should` clauses.
pub const AUTOCOMPLETE_PATHS: [&str; 3] = ["name", "description", "keywords"];

/// Fuzzy edit-distance tolerance for autocomplete clauses.
pub const FUZZY_MAX_EDITS: u8 = 1;

/// Internal store identifier; never part of a response.
pub const INTERNAL_ID_FIELD: &str = "_id";

/// Document key carrying the relevance score after projection.
pub const SCORE_FIELD: &str = "score";

/// Document key carrying highlight metadata after projection.
pub const HIGHLIGHTS_FIELD: &str = "highlights";

/// Fuzzy matching options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Fuzzy {
    #[serde(rename = "maxEdits")]
    pub max_edits: u8,
}

/// Prefix match on one path tolerant of `fuzzy.max_edits` edits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AutocompleteClause {
    pub query: String,
    pub path: String,
    pub fuzzy: Fuzzy,
}

/// Analyzed text match on one path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextClause {
    pub path: String,
    pub query: String,
}

/// Half-open instant range on one path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RangeClause {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gte: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lt: Option<DateTime<Utc>>,
}

/// A single condition inside a compound search stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Clause {
    Autocomplete(AutocompleteClause),
    Text(TextClause),
    Range(RangeClause),
}

impl Clause {
    pub fn autocomplete(path: impl Into<String>, query: impl Into<String>) -> Self {
        Self::Autocomplete(AutocompleteClause {
            query: query.into(),
            path: path.into(),
            fuzzy: Fuzzy {
                max_edits: FUZZY_MAX_EDITS,
            },
        })
    }

    pub fn text(path: impl Into<String>, query: impl Into<String>) -> Self {
        Self::Text(TextClause {
            path: path.into(),
            query: query.into(),
        })
    }

    pub fn range(
        path: impl Into<String>,
        gte: Option<DateTime<Utc>>,
        lt: Option<DateTime<Utc>>,
    ) -> Self {
        Self::Range(RangeClause {
            path: path.into(),
            gte,
            lt,
        })
    }

    /// The document path this clause targets.
    pub fn path(&self) -> &str {
        match self {
            Self::Autocomplete(clause) => &clause.path,
            Self::Text(clause) => &clause.path,
            Self::Range(clause) => &clause.path,
        }
    }
}

/// One fuzzy autocomplete clause per autocomplete path.
pub fn autocomplete_clauses(term: &str) -> Vec<Clause> {
    AUTOCOMPLETE_PATHS
        .iter()
        .map(|path| Clause::autocomplete(*path, term))
        .collect()
}

/// `should` clauses boost relevance, `must` clauses are required and scored,
/// `filter` clauses are required and unscored.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Compound {
    pub should: Vec<Clause>,
    pub must: Vec<Clause>,
    pub filter: Vec<Clause>,
}

/// Paths whose matched spans are returned with each hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HighlightConfig {
    pub path: Vec<String>,
}

impl HighlightConfig {
    pub fn new(paths: &[&str]) -> Self {
        Self {
            path: paths.iter().map(|path| path.to_string()).collect(),
        }
    }
}

/// The compound search stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchStage {
    pub compound: Compound,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlight: Option<HighlightConfig>,
}

/// Sort on a single field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortStage {
    pub field: String,
    pub direction: SortDirection,
}

impl From<&SortSpec> for SortStage {
    fn from(spec: &SortSpec) -> Self {
        Self {
            field: spec.field.clone(),
            direction: spec.direction,
        }
    }
}

/// Field shaping applied to each surviving document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Projection {
    /// Source fields to keep; empty keeps every field.
    pub include: Vec<String>,
    /// Attach the relevance score under `score`.
    pub score: bool,
    /// Attach highlight metadata under `highlights`.
    pub highlights: bool,
    /// Drop the internal identifier.
    pub exclude_id: bool,
}

impl Projection {
    /// Full search results: every source field plus score and highlights.
    pub fn search_result() -> Self {
        Self {
            include: Vec::new(),
            score: true,
            highlights: true,
            exclude_id: true,
        }
    }

    /// Typeahead suggestions: the autocomplete fields plus highlights.
    pub fn suggestion() -> Self {
        Self {
            include: AUTOCOMPLETE_PATHS.iter().map(|path| path.to_string()).collect(),
            score: false,
            highlights: true,
            exclude_id: true,
        }
    }
}

/// Tag identifying a stage's kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageKind {
    Search,
    Sort,
    Skip,
    Limit,
    Project,
    Unset,
}

impl StageKind {
    /// Position in the fixed stage order. Field shaping stages share a rank.
    fn rank(self) -> u8 {
        match self {
            Self::Search => 0,
            Self::Sort => 1,
            Self::Skip => 2,
            Self::Limit => 3,
            Self::Project | Self::Unset => 4,
        }
    }
}

/// A tagged pipeline operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    Search(SearchStage),
    Sort(SortStage),
    Skip(u64),
    Limit(u64),
    Project(Projection),
    Unset(Vec<String>),
}

impl Stage {
    pub fn kind(&self) -> StageKind {
        match self {
            Self::Search(_) => StageKind::Search,
            Self::Sort(_) => StageKind::Sort,
            Self::Skip(_) => StageKind::Skip,
            Self::Limit(_) => StageKind::Limit,
            Self::Project(_) => StageKind::Project,
            Self::Unset(_) => StageKind::Unset,
        }
    }

    /// Render the stage as an aggregation-pipeline document.
    pub fn to_document(&self) -> Value {
        match self {
            Self::Search(search) => json!({ "$search": search }),
            Self::Sort(sort) => {
                let order = match sort.direction {
                    SortDirection::Ascending => 1,
                    SortDirection::Descending => -1,
                };
                let mut fields = Map::new();
                fields.insert(sort.field.clone(), json!(order));
                json!({ "$sort": fields })
            }
            Self::Skip(skip) => json!({ "$skip": skip }),
            Self::Limit(limit) => json!({ "$limit": limit }),
            Self::Project(projection) => {
                let mut fields = Map::new();
                for path in &projection.include {
                    fields.insert(path.clone(), json!(1));
                }
                if projection.exclude_id {
                    fields.insert(INTERNAL_ID_FIELD.to_string(), json!(0));
                }
                if projection.score {
                    fields.insert(SCORE_FIELD.to_string(), json!({ "$meta": "searchScore" }));
                }
                if projection.highlights {
                    fields.insert(
                        HIGHLIGHTS_FIELD.to_string(),
                        json!({ "$meta": "searchHighlights" }),
                    );
                }
                json!({ "$project": fields })
            }
            Self::Unset(fields) => json!({ "$unset": fields }),
        }
    }
}

/// An ordered, immutable stage sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    stages: Vec<Stage>,
}

impl Pipeline {
    pub fn new(stages: Vec<Stage>) -> Self {
        Self { stages }
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn kinds(&self) -> Vec<StageKind> {
        self.stages.iter().map(Stage::kind).collect()
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// The compound search stage, if any.
    pub fn search(&self) -> Option<&SearchStage> {
        self.stages.iter().find_map(|stage| match stage {
            Stage::Search(search) => Some(search),
            _ => None,
        })
    }

    /// The page size bound, if any.
    pub fn limit(&self) -> Option<u64> {
        self.stages.iter().find_map(|stage| match stage {
            Stage::Limit(limit) => Some(*limit),
            _ => None,
        })
    }

    /// Check the fixed stage order: search, sort, skip, limit, then shaping.
    ///
    /// Search, sort, skip and limit may each appear at most once.
    pub fn validate(&self) -> Result<(), SearchError> {
        let mut previous: Option<StageKind> = None;
        for stage in &self.stages {
            let kind = stage.kind();
            if let Some(prev) = previous {
                let repeated = prev == kind && kind.rank() < 4;
                if kind.rank() < prev.rank() || repeated {
                    return Err(SearchError::backend(format!(
                        "malformed pipeline: {:?} stage cannot follow {:?}",
                        kind, prev
                    )));
                }
            }
            previous = Some(kind);
        }
        Ok(())
    }

    /// Render the whole pipeline as an aggregation-pipeline document.
    pub fn to_document(&self) -> Value {
        Value::Array(self.stages.iter().map(Stage::to_document).collect())
    }
}

/// RFC 3339 rendering used for range bounds on the wire.
pub fn format_instant(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_autocomplete_clauses() {
        let clauses = autocomplete_clauses("soil");

        assert_eq!(clauses.len(), 3);
        let paths: Vec<&str> = clauses.iter().map(Clause::path).collect();
        assert_eq!(paths, vec!["name", "description", "keywords"]);
        for clause in &clauses {
            match clause {
                Clause::Autocomplete(clause) => {
                    assert_eq!(clause.query, "soil");
                    assert_eq!(clause.fuzzy.max_edits, 1);
                }
                other => panic!("unexpected clause {:?}", other),
            }
        }
    }

    #[test]
    fn test_clause_document_shape() {
        let value = serde_json::to_value(Clause::autocomplete("name", "soil")).unwrap();
        assert_eq!(value["autocomplete"]["path"], "name");
        assert_eq!(value["autocomplete"]["fuzzy"]["maxEdits"], 1);

        let start = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let value = serde_json::to_value(Clause::range("datePublished", Some(start), None)).unwrap();
        assert_eq!(value["range"]["path"], "datePublished");
        assert!(value["range"].get("gte").is_some());
        assert!(value["range"].get("lt").is_none());
    }

    #[test]
    fn test_stage_documents() {
        let sort = Stage::Sort(SortStage {
            field: "datePublished".to_string(),
            direction: SortDirection::Descending,
        });
        assert_eq!(sort.to_document(), json!({ "$sort": { "datePublished": -1 } }));
        assert_eq!(Stage::Skip(10).to_document(), json!({ "$skip": 10 }));
        assert_eq!(Stage::Limit(5).to_document(), json!({ "$limit": 5 }));

        let project = Stage::Project(Projection::search_result()).to_document();
        assert_eq!(project["$project"]["_id"], 0);
        assert_eq!(project["$project"]["score"]["$meta"], "searchScore");
        assert_eq!(project["$project"]["highlights"]["$meta"], "searchHighlights");
    }

    #[test]
    fn test_validate_accepts_fixed_order() {
        let pipeline = Pipeline::new(vec![
            Stage::Search(SearchStage {
                compound: Compound::default(),
                highlight: None,
            }),
            Stage::Sort(SortStage {
                field: "name".to_string(),
                direction: SortDirection::Ascending,
            }),
            Stage::Skip(0),
            Stage::Limit(10),
            Stage::Project(Projection::search_result()),
            Stage::Unset(vec!["_id".to_string()]),
        ]);
        assert!(pipeline.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_sort_after_skip() {
        let pipeline = Pipeline::new(vec![
            Stage::Skip(0),
            Stage::Sort(SortStage {
                field: "name".to_string(),
                direction: SortDirection::Ascending,
            }),
        ]);
        assert!(matches!(
            pipeline.validate(),
            Err(SearchError::BackendQueryError(_))
        ));
    }

    #[test]
    fn test_validate_rejects_repeated_limit() {
        let pipeline = Pipeline::new(vec![Stage::Limit(1), Stage::Limit(2)]);
        assert!(pipeline.validate().is_err());
    }

    #[test]
    fn test_format_instant() {
        let instant = Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(format_instant(&instant), "2021-01-01T00:00:00Z");
    }
}
