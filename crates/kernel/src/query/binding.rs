//! Typing of coerced filter values against their column types.
//!
//! Coercion guesses a type from the text alone. Binding decides what the
//! column can actually be compared with: integer columns take integers,
//! numeric columns take any number, boolean columns take `true`/`false`,
//! and every other column compares as text using the caller's spelling.

use sea_query::Value;

use super::coerce::FilterValue;
use super::error::QueryError;
use crate::catalog::{ColumnType, FilterField, MatchKind};

/// A single value ready to be compared with a column.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SqlScalar {
    Int(i64),
    Float(f64),
    Text(String),
    Bool(bool),
}

impl From<SqlScalar> for Value {
    fn from(scalar: SqlScalar) -> Self {
        match scalar {
            SqlScalar::Int(i) => i.into(),
            SqlScalar::Float(x) => x.into(),
            SqlScalar::Text(s) => s.into(),
            SqlScalar::Bool(b) => b.into(),
        }
    }
}

/// Right-hand side of one filter predicate.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Operand {
    Scalar(SqlScalar),
    List(Vec<SqlScalar>),
    /// Substring to look for, exactly as the caller typed it.
    Phrase(String),
}

/// Whether the column is compared through its `::text` rendering.
pub(crate) fn compares_as_text(data_type: ColumnType) -> bool {
    !matches!(
        data_type,
        ColumnType::Integer
            | ColumnType::Float
            | ColumnType::Numeric
            | ColumnType::Boolean
            | ColumnType::Text
    )
}

/// Bind a coerced value to `field`, using `raw` where the caller's text matters.
pub(crate) fn bind_value(
    field: &FilterField,
    value: &FilterValue,
    raw: &str,
) -> Result<Operand, QueryError> {
    if field.match_kind == MatchKind::Phrase && !value.is_list() {
        return Ok(Operand::Phrase(raw.to_string()));
    }

    let mismatch = || QueryError::InvalidFilterValue {
        field: field.name.clone(),
        data_type: field.data_type.to_string(),
        value: raw.to_string(),
    };

    let operand = match (field.data_type, value) {
        (_, FilterValue::StringList(items)) if items.is_empty() => Operand::List(Vec::new()),

        (ColumnType::Integer, FilterValue::Int(i)) => Operand::Scalar(SqlScalar::Int(*i)),
        (ColumnType::Integer, FilterValue::IntList(items)) => {
            Operand::List(items.iter().copied().map(SqlScalar::Int).collect())
        }
        (ColumnType::Integer, _) => return Err(mismatch()),

        (ColumnType::Float | ColumnType::Numeric, FilterValue::Int(i)) => {
            Operand::Scalar(SqlScalar::Float(*i as f64))
        }
        (ColumnType::Float | ColumnType::Numeric, FilterValue::Float(x)) => {
            Operand::Scalar(SqlScalar::Float(*x))
        }
        (ColumnType::Float | ColumnType::Numeric, FilterValue::IntList(items)) => {
            Operand::List(items.iter().map(|i| SqlScalar::Float(*i as f64)).collect())
        }
        (ColumnType::Float | ColumnType::Numeric, FilterValue::FloatList(items)) => {
            Operand::List(items.iter().copied().map(SqlScalar::Float).collect())
        }
        (ColumnType::Float | ColumnType::Numeric, _) => return Err(mismatch()),

        (ColumnType::Boolean, FilterValue::String(s)) => {
            Operand::Scalar(parse_bool(s).ok_or_else(mismatch)?)
        }
        (ColumnType::Boolean, FilterValue::StringList(items)) => Operand::List(
            items
                .iter()
                .map(|s| parse_bool(s))
                .collect::<Option<Vec<_>>>()
                .ok_or_else(mismatch)?,
        ),
        (ColumnType::Boolean, _) => return Err(mismatch()),

        (_, list) if list.is_list() => Operand::List(
            raw_list_elements(raw)
                .into_iter()
                .map(|e| SqlScalar::Text(e.to_string()))
                .collect(),
        ),
        (_, _) => Operand::Scalar(SqlScalar::Text(raw.to_string())),
    };

    Ok(operand)
}

fn parse_bool(text: &str) -> Option<SqlScalar> {
    if text.eq_ignore_ascii_case("true") {
        Some(SqlScalar::Bool(true))
    } else if text.eq_ignore_ascii_case("false") {
        Some(SqlScalar::Bool(false))
    } else {
        None
    }
}

/// Elements of a `[a|b|c]` token as written.
fn raw_list_elements(raw: &str) -> Vec<&str> {
    let inner = raw
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .unwrap_or(raw);
    if inner.is_empty() {
        return Vec::new();
    }
    inner.split('|').collect()
}
