//! Request types for search and typeahead operations.
//!
//! Raw inputs arrive from the transport layer as optional strings. They are
//! validated into `SearchParams` / `TypeaheadParams`, which are the only shapes
//! the pipeline compilers accept.

use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use tracing::debug;

use crate::config::SearchConfig;
use crate::errors::SearchError;

/// Page number used when `pageNumber` is absent.
pub const DEFAULT_PAGE_NUMBER: u64 = 1;

/// Page size used when `pageSize` is absent.
pub const DEFAULT_PAGE_SIZE: u64 = 30;

/// Unvalidated `/search` query parameters, exactly as received.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSearchQuery {
    pub term: Option<String>,
    pub sort_by: Option<String>,
    pub content_type: Option<String>,
    pub provider_name: Option<String>,
    pub creator_name: Option<String>,
    pub data_coverage_start: Option<String>,
    pub data_coverage_end: Option<String>,
    pub published_start: Option<String>,
    pub published_end: Option<String>,
    pub page_number: Option<String>,
    pub page_size: Option<String>,
}

/// Unvalidated `/typeahead` query parameters.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTypeaheadQuery {
    pub term: Option<String>,
    pub page_size: Option<String>,
}

/// Sort direction for the optional sort stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// A syntactically valid sort field and its direction.
///
/// Whether the field exists is left to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub field: String,
    pub direction: SortDirection,
}

impl SortSpec {
    /// Parse a `sortBy` value. A single leading `-` selects descending order.
    pub fn parse(raw: &str) -> Result<Self, SearchError> {
        let raw = raw.trim();
        let (field, direction) = match raw.strip_prefix('-') {
            Some(rest) => (rest, SortDirection::Descending),
            None => (raw, SortDirection::Ascending),
        };

        if !is_field_path(field) {
            return Err(SearchError::validation(format!(
                "sortBy must be a field name, got '{}'",
                raw
            )));
        }

        Ok(Self {
            field: field.to_string(),
            direction,
        })
    }
}

fn is_field_path(field: &str) -> bool {
    !field.is_empty()
        && !field.starts_with('.')
        && !field.ends_with('.')
        && !field.contains("..")
        && field
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '@' | '-'))
}

/// A half-open instant range `[gte, lt)` derived from year-only bounds.
///
/// A start year `Y` becomes `>= Jan 1 Y`; an end year `Y` becomes
/// `< Jan 1 Y+1`, so the whole end year is included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InstantRange {
    pub gte: Option<DateTime<Utc>>,
    pub lt: Option<DateTime<Utc>>,
}

impl InstantRange {
    /// Convert optional start/end years into an instant range.
    ///
    /// Bounds are converted independently. A start year after the end year
    /// yields a range that matches nothing.
    pub fn from_years(start: Option<i32>, end: Option<i32>) -> Result<Self, SearchError> {
        Ok(Self {
            gte: start.map(start_of_year).transpose()?,
            lt: end.map(|year| start_of_year(year + 1)).transpose()?,
        })
    }

    /// True when neither bound is set.
    pub fn is_unbounded(&self) -> bool {
        self.gte.is_none() && self.lt.is_none()
    }
}

fn start_of_year(year: i32) -> Result<DateTime<Utc>, SearchError> {
    Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0)
        .single()
        .ok_or_else(|| SearchError::validation(format!("year {} is out of range", year)))
}

/// A validated pagination window.
///
/// Both values are at least 1 and `(number - 1) * size` fits in a `u64`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    number: u64,
    size: u64,
}

impl Page {
    /// Validate a page window.
    pub fn new(number: u64, size: u64) -> Result<Self, SearchError> {
        if number < 1 {
            return Err(SearchError::validation("pageNumber must be at least 1"));
        }
        if size < 1 {
            return Err(SearchError::validation("pageSize must be at least 1"));
        }
        (number - 1)
            .checked_mul(size)
            .ok_or_else(|| SearchError::validation("pageNumber * pageSize is too large"))?;

        Ok(Self { number, size })
    }

    pub fn number(&self) -> u64 {
        self.number
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Number of documents preceding this page.
    pub fn skip(&self) -> u64 {
        (self.number - 1) * self.size
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            number: DEFAULT_PAGE_NUMBER,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Validated `/search` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchParams {
    /// Free-text term, trimmed and non-empty.
    pub term: String,
    pub sort: Option<SortSpec>,
    pub content_type: Option<String>,
    pub provider_name: Option<String>,
    pub creator_name: Option<String>,
    /// Bounds on `datePublished`.
    pub published: InstantRange,
    /// `gte` bounds `temporalCoverage.start`, `lt` bounds `temporalCoverage.end`.
    pub data_coverage: InstantRange,
    pub page: Page,
}

impl SearchParams {
    /// Create params for a bare term with default pagination and no filters.
    pub fn new(term: impl Into<String>) -> Result<Self, SearchError> {
        Ok(Self {
            term: required_term(Some(term.into()))?,
            sort: None,
            content_type: None,
            provider_name: None,
            creator_name: None,
            published: InstantRange::default(),
            data_coverage: InstantRange::default(),
            page: Page::default(),
        })
    }

    /// Validate raw transport input.
    ///
    /// # Errors
    ///
    /// * `SearchError::ValidationError` - when `term` is missing or blank, a
    ///   year bound is not a 4-digit year, `sortBy` is not a field name, or the
    ///   page window is out of bounds
    pub fn parse(raw: RawSearchQuery, config: &SearchConfig) -> Result<Self, SearchError> {
        let term = required_term(raw.term)?;

        let sort = optional_text(raw.sort_by)
            .map(|value| SortSpec::parse(&value))
            .transpose()?;

        let published = InstantRange::from_years(
            parse_year("publishedStart", raw.published_start)?,
            parse_year("publishedEnd", raw.published_end)?,
        )?;
        let data_coverage = InstantRange::from_years(
            parse_year("dataCoverageStart", raw.data_coverage_start)?,
            parse_year("dataCoverageEnd", raw.data_coverage_end)?,
        )?;

        let page = Page::new(
            parse_positive("pageNumber", raw.page_number, DEFAULT_PAGE_NUMBER)?,
            parse_page_size(raw.page_size, config)?,
        )?;

        Ok(Self {
            term,
            sort,
            content_type: optional_text(raw.content_type),
            provider_name: optional_text(raw.provider_name),
            creator_name: optional_text(raw.creator_name),
            published,
            data_coverage,
            page,
        })
    }

}

#[cfg(test)]
impl SearchParams {
    /// Set the creator filter.
    pub(crate) fn with_creator(mut self, creator_name: impl Into<String>) -> Self {
        self.creator_name = Some(creator_name.into());
        self
    }

    /// Set the provider filter.
    pub(crate) fn with_provider(mut self, provider_name: impl Into<String>) -> Self {
        self.provider_name = Some(provider_name.into());
        self
    }

    /// Set the content type filter.
    pub(crate) fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Set the sort order.
    pub(crate) fn with_sort(mut self, sort: SortSpec) -> Self {
        self.sort = Some(sort);
        self
    }

    /// Set the pagination window.
    pub(crate) fn with_page(mut self, page: Page) -> Self {
        self.page = page;
        self
    }
}

/// Validated `/typeahead` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeaheadParams {
    pub term: String,
    /// Maximum number of suggestions.
    pub limit: u64,
}

impl TypeaheadParams {
    /// Validate raw transport input.
    pub fn parse(raw: RawTypeaheadQuery, config: &SearchConfig) -> Result<Self, SearchError> {
        Ok(Self {
            term: required_term(raw.term)?,
            limit: parse_page_size(raw.page_size, config)?,
        })
    }
}

fn required_term(raw: Option<String>) -> Result<String, SearchError> {
    optional_text(raw).ok_or_else(|| SearchError::validation("term is required"))
}

/// Trim a text parameter; blank values count as absent.
fn optional_text(raw: Option<String>) -> Option<String> {
    raw.map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_year(name: &str, raw: Option<String>) -> Result<Option<i32>, SearchError> {
    let Some(value) = optional_text(raw) else {
        return Ok(None);
    };

    if value.len() != 4 || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(SearchError::validation(format!(
            "{} must be a 4-digit year, got '{}'",
            name, value
        )));
    }

    let year: i32 = value
        .parse()
        .map_err(|e| SearchError::validation(format!("{}: {}", name, e)))?;
    if year < 1 {
        return Err(SearchError::validation(format!(
            "{} must be a positive year",
            name
        )));
    }

    Ok(Some(year))
}

fn parse_positive(name: &str, raw: Option<String>, default: u64) -> Result<u64, SearchError> {
    let Some(value) = optional_text(raw) else {
        return Ok(default);
    };

    // Parse signed so that "-3" reports as out of range rather than malformed.
    let parsed: i128 = value.parse().map_err(|_| {
        SearchError::validation(format!("{} must be an integer, got '{}'", name, value))
    })?;
    if parsed < 1 {
        return Err(SearchError::validation(format!(
            "{} must be at least 1",
            name
        )));
    }

    u64::try_from(parsed)
        .map_err(|_| SearchError::validation(format!("{} is too large", name)))
}

/// Parse `pageSize`, clamping it to the configured ceiling.
fn parse_page_size(raw: Option<String>, config: &SearchConfig) -> Result<u64, SearchError> {
    let size = parse_positive("pageSize", raw, DEFAULT_PAGE_SIZE)?;
    match config.max_page_size {
        Some(max) if size > max => {
            debug!(requested = size, max, "Clamping pageSize to ceiling");
            Ok(max)
        }
        _ => Ok(size),
    }
}
