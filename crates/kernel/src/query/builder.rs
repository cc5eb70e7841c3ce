//! SQL rendering for validated entity queries using SeaQuery.
//!
//! The builder only renders; execution belongs to the store. Names in a
//! [`FilterSpec`] are caller-facing and are mapped to table columns through
//! the entity catalog here.

use sea_query::{
    Alias, Asterisk, Expr, ExprTrait, Order, PostgresQueryBuilder, Query, SelectStatement,
    SimpleExpr,
};
use serde::Serialize;

use super::binding::{Operand, bind_value, compares_as_text};
use super::error::QueryError;
use super::filter::FilterSpec;
use super::ordering::{OrderSpec, Pagination, SortDirection};
use crate::catalog::{EntityDefinition, FilterField};

/// A filter field paired with its typed right-hand side.
#[derive(Debug, Clone)]
struct Condition<'a> {
    field: &'a FilterField,
    operand: Operand,
}

/// A validated filter, ordering and page for one entity.
#[derive(Debug, Clone, Serialize)]
pub struct EntityQuery<'a> {
    #[serde(skip)]
    entity: &'a EntityDefinition,
    filter: FilterSpec,
    order: Option<OrderSpec>,
    pagination: Pagination,
    #[serde(skip)]
    conditions: Vec<Condition<'a>>,
}

impl<'a> EntityQuery<'a> {
    /// Check every filter value against its column type.
    ///
    /// Fails with [`QueryError::InvalidFilterValue`] when a value cannot be
    /// compared with its column, so no SQL is ever rendered from it.
    pub fn new(
        entity: &'a EntityDefinition,
        filter: FilterSpec,
        order: Option<OrderSpec>,
        pagination: Pagination,
    ) -> Result<Self, QueryError> {
        let conditions = filter
            .iter()
            .map(|(name, value)| {
                let field = entity.filter_field(name).ok_or_else(|| {
                    QueryError::UnknownFilterFields {
                        unknown: vec![name.to_string()],
                        allowed: entity.filter_names().into_iter().map(String::from).collect(),
                    }
                })?;
                let raw = filter.raw_value(name).map_or_else(|| value.to_string(), String::from);
                let operand = bind_value(field, value, &raw)?;
                Ok::<_, QueryError>(Condition { field, operand })
            })
            .collect::<Result<Vec<_>, QueryError>>()?;

        Ok(Self {
            entity,
            filter,
            order,
            pagination,
            conditions,
        })
    }

    pub fn entity(&self) -> &EntityDefinition {
        self.entity
    }

    pub fn filter(&self) -> &FilterSpec {
        &self.filter
    }

    pub fn order(&self) -> Option<&OrderSpec> {
        self.order.as_ref()
    }

    pub fn pagination(&self) -> Pagination {
        self.pagination
    }

    /// Render the paged SELECT.
    pub fn build_select(&self) -> String {
        let mut query = Query::select();
        query.column((Alias::new(&self.entity.table), Asterisk));
        self.add_from(&mut query);
        self.add_filters(&mut query);
        self.add_order(&mut query);
        query.limit(self.pagination.limit);
        query.offset(self.pagination.offset);
        query.to_string(PostgresQueryBuilder)
    }

    /// Render the COUNT over the same predicate, ignoring order and page.
    pub fn build_count(&self) -> String {
        let mut query = Query::select();
        query.expr(Expr::col(Asterisk).count());
        self.add_from(&mut query);
        self.add_filters(&mut query);
        query.to_string(PostgresQueryBuilder)
    }

    fn add_from(&self, query: &mut SelectStatement) {
        let table = Alias::new(&self.entity.table);
        match self.entity.schema {
            Some(ref schema) => query.from((Alias::new(schema), table)),
            None => query.from(table),
        };
    }

    fn add_filters(&self, query: &mut SelectStatement) {
        for condition in &self.conditions {
            query.and_where(self.condition_expr(condition));
        }
    }

    fn condition_expr(&self, condition: &Condition<'_>) -> SimpleExpr {
        let field = condition.field;
        match condition.operand {
            Operand::Phrase(ref text) => Expr::cust_with_values(
                format!("{}::text ILIKE $1", self.qualified(&field.column)),
                [format!("%{}%", escape_like_wildcards(text))],
            ),
            Operand::Scalar(ref value) => self.filter_column(field).eq(value.clone()),
            Operand::List(ref items) => in_list(self.filter_column(field), items.iter().cloned()),
        }
    }

    /// The filter column, cast to text for types compared by their rendering.
    fn filter_column(&self, field: &FilterField) -> SimpleExpr {
        if compares_as_text(field.data_type) {
            Expr::cust(format!("{}::text", self.qualified(&field.column)))
        } else {
            Expr::col((Alias::new(&self.entity.table), Alias::new(&field.column))).into()
        }
    }

    /// `"table"."column"`, quoted the way SeaQuery quotes identifiers.
    fn qualified(&self, column: &str) -> String {
        format!(
            r#""{}"."{}""#,
            self.entity.table.replace('"', "\"\""),
            column.replace('"', "\"\"")
        )
    }

    fn add_order(&self, query: &mut SelectStatement) {
        let Some(ref order) = self.order else {
            return;
        };
        let Some(column) = self.entity.order_column(&order.column) else {
            return;
        };
        let direction = match order.direction {
            SortDirection::Asc => Order::Asc,
            SortDirection::Desc => Order::Desc,
        };
        query.order_by(
            (Alias::new(&self.entity.table), Alias::new(&column.column)),
            direction,
        );
    }
}

/// `column IN (...)`, or `FALSE` for an empty list.
fn in_list<V, I>(column: SimpleExpr, items: I) -> SimpleExpr
where
    V: Into<SimpleExpr>,
    I: IntoIterator<Item = V>,
{
    let values: Vec<V> = items.into_iter().collect();
    if values.is_empty() {
        return Expr::cust("FALSE");
    }
    column.is_in(values)
}

/// Escape LIKE wildcards so user text matches literally.
fn escape_like_wildcards(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
