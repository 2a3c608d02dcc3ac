//! Pipeline compiler for full search and catalog export.
//!
//! Compilation is a pure translation of validated parameters: the same input
//! always yields a structurally identical pipeline.

use crate::pipeline::stage::{
    autocomplete_clauses, Clause, Compound, HighlightConfig, Pipeline, Projection, SearchStage,
    SortStage, Stage, AUTOCOMPLETE_PATHS, INTERNAL_ID_FIELD,
};
use crate::types::SearchParams;

/// Paths whose matched spans are returned with full search results.
pub const SEARCH_HIGHLIGHT_PATHS: [&str; 4] = ["name", "description", "keywords", "creator.name"];

pub const CREATOR_NAME_PATH: &str = "creator.name";
pub const PROVIDER_NAME_PATH: &str = "provider.name";
pub const CONTENT_TYPE_PATH: &str = "@type";
pub const DATE_PUBLISHED_PATH: &str = "datePublished";
pub const COVERAGE_START_PATH: &str = "temporalCoverage.start";
pub const COVERAGE_END_PATH: &str = "temporalCoverage.end";

/// Compile a validated search request into its stage sequence.
///
/// Stage order is fixed: search, optional sort, skip, limit, then field
/// shaping. Shaping runs last so it only touches the final page.
pub fn compile_search(params: &SearchParams) -> Pipeline {
    let mut stages = vec![Stage::Search(SearchStage {
        compound: compile_compound(params),
        highlight: Some(HighlightConfig::new(&SEARCH_HIGHLIGHT_PATHS)),
    })];

    // Absent sortBy keeps the search stage's relevance order.
    if let Some(sort) = &params.sort {
        stages.push(Stage::Sort(SortStage::from(sort)));
    }

    stages.push(Stage::Skip(params.page.skip()));
    stages.push(Stage::Limit(params.page.size()));
    stages.push(Stage::Project(Projection::search_result()));

    Pipeline::new(stages)
}

/// Build the should/must/filter clause sets for a search request.
///
/// `must` and `filter` only receive clauses for filters that are present.
pub fn compile_compound(params: &SearchParams) -> Compound {
    Compound {
        should: autocomplete_clauses(&params.term),
        must: must_clauses(params),
        filter: filter_clauses(params),
    }
}

fn must_clauses(params: &SearchParams) -> Vec<Clause> {
    [
        (CREATOR_NAME_PATH, &params.creator_name),
        (PROVIDER_NAME_PATH, &params.provider_name),
        (CONTENT_TYPE_PATH, &params.content_type),
    ]
    .into_iter()
    .filter_map(|(path, query)| query.as_ref().map(|query| Clause::text(path, query)))
    .collect()
}

fn filter_clauses(params: &SearchParams) -> Vec<Clause> {
    let mut filter = Vec::new();

    if !params.published.is_unbounded() {
        filter.push(Clause::range(
            DATE_PUBLISHED_PATH,
            params.published.gte,
            params.published.lt,
        ));
    }
    if let Some(gte) = params.data_coverage.gte {
        filter.push(Clause::range(COVERAGE_START_PATH, Some(gte), None));
    }
    if let Some(lt) = params.data_coverage.lt {
        filter.push(Clause::range(COVERAGE_END_PATH, None, Some(lt)));
    }

    filter
}

/// Compile the catalog export: every document, reduced to the autocomplete
/// fields, without the internal identifier.
pub fn compile_export() -> Pipeline {
    Pipeline::new(vec![
        Stage::Project(Projection {
            include: AUTOCOMPLETE_PATHS.iter().map(|path| path.to_string()).collect(),
            ..Default::default()
        }),
        Stage::Unset(vec![INTERNAL_ID_FIELD.to_string()]),
    ])
}
