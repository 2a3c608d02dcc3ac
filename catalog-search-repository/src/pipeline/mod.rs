//! Pipeline model and compilers.
//!
//! Validated request parameters are compiled into backend-neutral stage
//! sequences; executors render those for their store.

mod compiler;
mod stage;
mod typeahead;

pub use compiler::{
    compile_compound, compile_export, compile_search, CONTENT_TYPE_PATH, COVERAGE_END_PATH,
    COVERAGE_START_PATH, CREATOR_NAME_PATH, DATE_PUBLISHED_PATH, PROVIDER_NAME_PATH,
    SEARCH_HIGHLIGHT_PATHS,
};
pub use stage::{
    autocomplete_clauses, format_instant, AutocompleteClause, Clause, Compound, Fuzzy,
    HighlightConfig, Pipeline, Projection, RangeClause, SearchStage, SortStage, Stage, StageKind,
    TextClause, AUTOCOMPLETE_PATHS, FUZZY_MAX_EDITS, HIGHLIGHTS_FIELD, INTERNAL_ID_FIELD,
    SCORE_FIELD,
};
pub use typeahead::{compile_typeahead, TYPEAHEAD_HIGHLIGHT_PATHS};
