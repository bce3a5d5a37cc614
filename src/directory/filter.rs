//! Charity search filters.
//!
//! Query strings arrive as [`CharityQuery`] (raw text) and are parsed into a
//! typed [`CharityFilter`]. Every supplied filter must match; results keep
//! catalog order and are truncated to the limit last.

use serde::Deserialize;
use thiserror::Error;

use crate::directory::record::CharityRecord;

/// Raw query parameters of `GET /charities`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharityQuery {
    pub category: Option<String>,
    pub featured: Option<String>,
    pub verified: Option<String>,
    pub limit: Option<String>,
    pub accepts_zakat: Option<String>,
    pub emergency_response: Option<String>,
    pub location: Option<String>,
    pub min_rating: Option<String>,
}

/// A query parameter that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid value '{value}' for '{field}'")]
pub struct FilterError {
    pub field: &'static str,
    pub value: String,
}

/// Typed filter set. `None` means "do not filter on this field".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CharityFilter {
    /// Case-insensitive substring of the category.
    pub category: Option<String>,
    pub featured: Option<bool>,
    pub verified: Option<bool>,
    pub limit: Option<usize>,
    pub accepts_zakat: Option<bool>,
    pub emergency_response: Option<bool>,
    /// Case-insensitive substring of the location.
    pub location: Option<String>,
    pub min_rating: Option<f32>,
}

impl CharityFilter {
    /// Whether `record` satisfies every supplied filter (the limit aside).
    pub fn matches(&self, record: &CharityRecord) -> bool {
        if let Some(category) = &self.category {
            if !contains_ignore_case(&record.category, category) {
                return false;
            }
        }
        if let Some(location) = &self.location {
            match &record.location {
                Some(l) if contains_ignore_case(l, location) => {}
                _ => return false,
            }
        }
        if self.featured.is_some_and(|f| record.featured != f) {
            return false;
        }
        if self.verified.is_some_and(|v| record.verified != v) {
            return false;
        }
        if self.accepts_zakat.is_some_and(|z| record.accepts_zakat != z) {
            return false;
        }
        if self.emergency_response.is_some_and(|e| record.emergency_response != e) {
            return false;
        }
        if self.min_rating.is_some_and(|min| record.rating < min) {
            return false;
        }
        true
    }

    /// Matching records in input order, truncated to the limit.
    pub fn apply<'a>(&self, records: &'a [CharityRecord]) -> Vec<&'a CharityRecord> {
        records
            .iter()
            .filter(|r| self.matches(r))
            .take(self.limit.unwrap_or(usize::MAX))
            .collect()
    }
}

impl TryFrom<CharityQuery> for CharityFilter {
    type Error = FilterError;

    fn try_from(query: CharityQuery) -> Result<Self, Self::Error> {
        Ok(Self {
            category: non_empty(query.category),
            featured: parse_bool("featured", query.featured)?,
            verified: parse_bool("verified", query.verified)?,
            limit: parse_num("limit", query.limit)?,
            accepts_zakat: parse_bool("acceptsZakat", query.accepts_zakat)?,
            emergency_response: parse_bool("emergencyResponse", query.emergency_response)?,
            location: non_empty(query.location),
            min_rating: parse_num("minRating", query.min_rating)?,
        })
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_bool(field: &'static str, value: Option<String>) -> Result<Option<bool>, FilterError> {
    match non_empty(value) {
        None => Ok(None),
        Some(v) => match v.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(Some(true)),
            "false" | "0" => Ok(Some(false)),
            _ => Err(FilterError { field, value: v }),
        },
    }
}

fn parse_num<T: std::str::FromStr>(
    field: &'static str,
    value: Option<String>,
) -> Result<Option<T>, FilterError> {
    match non_empty(value) {
        None => Ok(None),
        Some(v) => v
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| FilterError { field, value: v }),
    }
}
