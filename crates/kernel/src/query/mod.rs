//! Filter/order query DSL.
//!
//! This module provides:
//! - coerce: raw token → typed `FilterValue`
//! - filter: `field:value[,field:value...]` parsing against an allow-list
//! - ordering: ordering column and offset/limit validation
//! - binding: typing of filter values against their column types
//! - builder: SeaQuery rendering of a validated `EntityQuery`

mod binding;
mod builder;
mod coerce;
mod error;
mod filter;
mod ordering;

pub use builder::EntityQuery;
pub use coerce::{FilterValue, coerce_value};
pub use error::{Clause, QueryError};
pub use filter::{FilterSpec, FilterToken, check_allowed, parse_filter, split_filter};
pub use ordering::{OrderSpec, Pagination, SortDirection, validate_order};
