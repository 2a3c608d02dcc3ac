//! Typeahead compiler.
//!
//! A lighter path than full search: only the fuzzy autocomplete `should`
//! clauses, no filters, no sort and no skip. The page size bounds a plain limit.

use crate::pipeline::stage::{
    autocomplete_clauses, Compound, HighlightConfig, Pipeline, Projection, SearchStage, Stage,
};
use crate::types::TypeaheadParams;

/// Paths whose matched spans are returned with suggestions.
pub const TYPEAHEAD_HIGHLIGHT_PATHS: [&str; 3] = ["name", "description", "keywords"];

/// Compile a validated typeahead request.
pub fn compile_typeahead(params: &TypeaheadParams) -> Pipeline {
    let search = SearchStage {
        compound: Compound {
            should: autocomplete_clauses(&params.term),
            ..Default::default()
        },
        highlight: Some(HighlightConfig::new(&TYPEAHEAD_HIGHLIGHT_PATHS)),
    };

    Pipeline::new(vec![
        Stage::Search(search),
        Stage::Limit(params.limit),
        Stage::Project(Projection::suggestion()),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::stage::StageKind;

    fn params(term: &str, limit: u64) -> TypeaheadParams {
        TypeaheadParams {
            term: term.to_string(),
            limit,
        }
    }

    #[test]
    fn test_stage_order() {
        let pipeline = compile_typeahead(&params("soi", 5));

        assert_eq!(
            pipeline.kinds(),
            vec![StageKind::Search, StageKind::Limit, StageKind::Project]
        );
        assert_eq!(pipeline.limit(), Some(5));
        assert!(pipeline.validate().is_ok());
    }

    #[test]
    fn test_should_only() {
        let pipeline = compile_typeahead(&params("soi", 5));
        let search = pipeline.search().unwrap();

        assert_eq!(search.compound.should.len(), 3);
        assert!(search.compound.must.is_empty());
        assert!(search.compound.filter.is_empty());
        assert_eq!(
            search.highlight.as_ref().unwrap().path,
            vec!["name", "description", "keywords"]
        );
    }

    #[test]
    fn test_projection_restricted() {
        let pipeline = compile_typeahead(&params("soi", 5));

        match pipeline.stages().last() {
            Some(Stage::Project(projection)) => {
                assert_eq!(projection.include, vec!["name", "description", "keywords"]);
                assert!(projection.highlights);
                assert!(!projection.score);
                assert!(projection.exclude_id);
            }
            other => panic!("expected project stage, got {:?}", other),
        }
    }
}
