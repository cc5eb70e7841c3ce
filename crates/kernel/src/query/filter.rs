//! Filter string parsing.
//!
//! Grammar: `filter := group (',' group)*`, `group := field ':' value`.
//! Parsing runs in three passes so that errors are reported in a stable
//! order: syntax first, then unknown fields, then value coercion.

use std::collections::BTreeMap;

use serde::{Serialize, Serializer};
use tracing::debug;

use super::coerce::{FilterValue, coerce_value};
use super::error::QueryError;

const GROUP_SEPARATOR: char = ',';
const PAIR_SEPARATOR: char = ':';

/// One `field:value` pair before coercion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterToken<'a> {
    pub field: &'a str,
    pub raw_value: &'a str,
}

/// Validated filter predicate: field name → typed value.
///
/// The caller's text for each field is kept alongside the typed value, so
/// phrase and text comparisons see `007` rather than `7`. Equality and
/// serialization use the typed values only.
#[derive(Debug, Clone, Default)]
pub struct FilterSpec {
    values: BTreeMap<String, FilterValue>,
    raw: BTreeMap<String, String>,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn get(&self, field: &str) -> Option<&FilterValue> {
        self.values.get(field)
    }

    /// The value as the caller wrote it.
    pub fn raw_value(&self, field: &str) -> Option<&str> {
        self.raw.get(field).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FilterValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Render back into filter-string syntax, fields in sorted order.
    pub fn to_filter_string(&self) -> String {
        self.values
            .iter()
            .map(|(field, value)| format!("{field}{PAIR_SEPARATOR}{value}"))
            .collect::<Vec<_>>()
            .join(&GROUP_SEPARATOR.to_string())
    }

    fn insert(&mut self, field: &str, value: FilterValue, raw: &str) {
        self.values.insert(field.to_string(), value);
        self.raw.insert(field.to_string(), raw.to_string());
    }
}

impl PartialEq for FilterSpec {
    fn eq(&self, other: &Self) -> bool {
        self.values == other.values
    }
}

impl Serialize for FilterSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.values.serialize(serializer)
    }
}

impl FromIterator<(String, FilterValue)> for FilterSpec {
    fn from_iter<I: IntoIterator<Item = (String, FilterValue)>>(iter: I) -> Self {
        let mut spec = Self::new();
        for (field, value) in iter {
            let raw = value.to_string();
            spec.insert(&field, value, &raw);
        }
        spec
    }
}

/// Split a raw filter string into tokens.
///
/// Any group that does not split into exactly two non-empty parts fails
/// with the whole original string attached.
pub fn split_filter(raw: &str) -> Result<Vec<FilterToken<'_>>, QueryError> {
    raw.split(GROUP_SEPARATOR)
        .map(|group| {
            let parts: Vec<&str> = group.split(PAIR_SEPARATOR).collect();
            match parts.as_slice() {
                [field, raw_value] if !field.is_empty() && !raw_value.is_empty() => {
                    Ok(FilterToken {
                        field: *field,
                        raw_value: *raw_value,
                    })
                }
                _ => Err(QueryError::InvalidFilterSyntax {
                    filter: raw.to_string(),
                }),
            }
        })
        .collect()
}

/// Check every token's field against the allow-list.
///
/// Offending fields are reported once each, in input order.
pub fn check_allowed<S: AsRef<str>>(
    tokens: &[FilterToken<'_>],
    allowed: &[S],
) -> Result<(), QueryError> {
    let mut unknown: Vec<String> = Vec::new();
    for token in tokens {
        let permitted = allowed.iter().any(|a| a.as_ref() == token.field);
        if !permitted && !unknown.iter().any(|u| u == token.field) {
            unknown.push(token.field.to_string());
        }
    }

    if unknown.is_empty() {
        Ok(())
    } else {
        Err(QueryError::UnknownFilterFields {
            unknown,
            allowed: allowed.iter().map(|a| a.as_ref().to_string()).collect(),
        })
    }
}

/// Parse a filter string for an entity with the given allow-list.
///
/// `None` and the empty string both mean "no filter".
pub fn parse_filter<S: AsRef<str>>(
    raw: Option<&str>,
    allowed: &[S],
) -> Result<FilterSpec, QueryError> {
    let Some(raw) = raw.filter(|r| !r.is_empty()) else {
        return Ok(FilterSpec::new());
    };

    let tokens = split_filter(raw)?;
    check_allowed(&tokens, allowed)?;

    let mut spec = FilterSpec::new();
    for token in tokens {
        let value = coerce_value(token.raw_value)?;
        debug!(field = token.field, kind = value.type_name(), "coerced filter value");
        spec.insert(token.field, value, token.raw_value);
    }

    Ok(spec)
}
