//! Ordering and pagination validation.

use serde::{Deserialize, Serialize};

use super::error::{Clause, QueryError};
use crate::catalog::EntityDefinition;

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// Validated ordering: a caller-facing column name and a direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderSpec {
    pub column: String,
    pub direction: SortDirection,
}

/// Validate an optional ordering column against the entity's allow-list.
///
/// A column missing from the allow-list and a column whose type cannot be
/// ordered are reported as different errors.
pub fn validate_order(
    entity: &EntityDefinition,
    column: Option<&str>,
    direction: SortDirection,
) -> Result<Option<OrderSpec>, QueryError> {
    let Some(column) = column else {
        return Ok(None);
    };

    let Some(definition) = entity.order_column(column) else {
        return Err(QueryError::InvalidOrderingColumn {
            column: column.to_string(),
            allowed: entity.order_names().into_iter().map(String::from).collect(),
        });
    };

    if !definition.data_type.is_orderable() {
        return Err(QueryError::UnsupportedOrderingType {
            column: column.to_string(),
            data_type: definition.data_type.to_string(),
        });
    }

    Ok(Some(OrderSpec {
        column: column.to_string(),
        direction,
    }))
}

/// Validated offset/limit pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Pagination {
    /// Validate raw offset and limit. The offset is checked first.
    pub fn new(offset: i64, limit: i64) -> Result<Self, QueryError> {
        let offset = u64::try_from(offset).map_err(|_| QueryError::InvalidPaginationValue {
            clause: Clause::Skip,
            value: offset,
        })?;
        let limit = u64::try_from(limit).map_err(|_| QueryError::InvalidPaginationValue {
            clause: Clause::Limit,
            value: limit,
        })?;
        Ok(Self { offset, limit })
    }

    /// Validate optional values, falling back to offset 0 and `default_limit`.
    pub fn from_params(
        offset: Option<i64>,
        limit: Option<i64>,
        default_limit: u64,
    ) -> Result<Self, QueryError> {
        let limit = match limit {
            Some(limit) => limit,
            None => i64::try_from(default_limit).unwrap_or(i64::MAX),
        };
        Self::new(offset.unwrap_or(0), limit)
    }
}
