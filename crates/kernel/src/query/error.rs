//! Errors raised while parsing filter, ordering and pagination input.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Pagination clause that carried an invalid value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Clause {
    Skip,
    Limit,
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Clause::Skip => f.write_str("SKIP"),
            Clause::Limit => f.write_str("LIMIT"),
        }
    }
}

/// Malformed or disallowed query input.
///
/// Every variant maps to a 400 response; none of them are retryable.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    /// A `key:value` group did not split into exactly two non-empty parts.
    #[error("invalid filter string '{filter}', expected 'field:value[,field:value...]'")]
    InvalidFilterSyntax { filter: String },

    /// One or more filter keys are not in the entity's allow-list.
    #[error(
        "unknown filter fields: {}; allowed fields: {}",
        unknown.join(", "),
        allowed.join(", ")
    )]
    UnknownFilterFields {
        unknown: Vec<String>,
        allowed: Vec<String>,
    },

    /// A value that cannot be compared with the field's column type.
    #[error("filter field '{field}' expects {data_type} values, got '{value}'")]
    InvalidFilterValue {
        field: String,
        data_type: String,
        value: String,
    },

    /// Stray or nested brackets in a value.
    #[error("invalid list syntax in '{fragment}'")]
    InvalidListSyntax { fragment: String },

    /// The ordering column is not in the entity's ordering allow-list.
    #[error("cannot order by '{column}'; allowed columns: {}", allowed.join(", "))]
    InvalidOrderingColumn {
        column: String,
        allowed: Vec<String>,
    },

    /// The column exists but its type has no ordering.
    #[error("ordering is not supported for column '{column}' of type {data_type}")]
    UnsupportedOrderingType { column: String, data_type: String },

    /// Negative offset or limit.
    #[error("invalid value {value} for {clause} clause, expected a non-negative integer")]
    InvalidPaginationValue { clause: Clause, value: i64 },
}

impl QueryError {
    /// Short title used in error response bodies.
    pub fn title(&self) -> &'static str {
        match self {
            QueryError::InvalidFilterSyntax { .. } => "Invalid filter string",
            QueryError::UnknownFilterFields { .. } => "Unknown filter fields",
            QueryError::InvalidFilterValue { .. } => "Invalid filter value",
            QueryError::InvalidListSyntax { .. } => "Invalid list syntax",
            QueryError::InvalidOrderingColumn { .. } => "Invalid ordering column",
            QueryError::UnsupportedOrderingType { .. } => "Unsupported ordering for data type",
            QueryError::InvalidPaginationValue { .. } => "Invalid value for clause",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_fields_message_names_both_lists() {
        let err = QueryError::UnknownFilterFields {
            unknown: vec!["pers_type".to_string()],
            allowed: vec!["person_type".to_string(), "first_name_phrase".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "unknown filter fields: pers_type; allowed fields: person_type, first_name_phrase"
        );
    }

    #[test]
    fn filter_value_message_names_type() {
        let err = QueryError::InvalidFilterValue {
            field: "person_ids".to_string(),
            data_type: "integer".to_string(),
            value: "abc".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "filter field 'person_ids' expects integer values, got 'abc'"
        );
        assert_eq!(err.title(), "Invalid filter value");
    }

    #[test]
    fn pagination_message_names_clause() {
        let err = QueryError::InvalidPaginationValue {
            clause: Clause::Skip,
            value: -1,
        };
        assert!(err.to_string().contains("SKIP"));
        assert_eq!(err.title(), "Invalid value for clause");
    }
}
