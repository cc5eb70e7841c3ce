//! Diagnostic message classification.
//!
//! The persistence backend reports constraint violations as free text.
//! Extractors turn one known text shape each into a structured
//! [`ErrorDetail`]. An extractor handed text of another shape returns
//! [`UnrecognizedShape`] rather than guessing.

mod postgres;

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

pub use postgres::{
    ForeignKeyExtractor, PrimaryKeyExtractor, ReadonlyAccessExtractor, UniqueConstraintExtractor,
    ValidationExtractor, WrongPasswordExtractor,
};
pub(crate) use postgres::split_key_list;

/// Structured detail recovered from a diagnostic message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ErrorDetail {
    UniqueConstraint {
        field: String,
        value: String,
    },
    PrimaryKey {
        key_columns: Vec<String>,
        key_values: Vec<String>,
    },
    ForeignKey {
        entity: String,
        key_column: String,
        key_value: String,
    },
    Validation {
        title: String,
        field_messages: BTreeMap<String, String>,
    },
    ReadonlyAccess {
        username: String,
    },
    WrongPassword {
        username: String,
    },
}

impl ErrorDetail {
    /// Human-readable description for response bodies.
    pub fn description(&self) -> String {
        match self {
            ErrorDetail::UniqueConstraint { field, value } => format!(
                "Field '{field}' must have unique values. Provided value '{value}' already exists."
            ),
            ErrorDetail::PrimaryKey {
                key_columns,
                key_values,
            } => format!(
                "A record with key ({}) = ({}) already exists.",
                key_columns.join(", "),
                key_values.join(", ")
            ),
            ErrorDetail::ForeignKey {
                entity,
                key_column,
                key_value,
            } => format!("Referenced {entity} with {key_column} = {key_value} does not exist."),
            ErrorDetail::Validation {
                title,
                field_messages,
            } => {
                if field_messages.is_empty() {
                    return title.clone();
                }
                let fields: Vec<String> = field_messages
                    .iter()
                    .map(|(field, message)| format!("{field}: {message}"))
                    .collect();
                format!("{title}: {}", fields.join("; "))
            }
            ErrorDetail::ReadonlyAccess { username } => {
                format!("User '{username}' has read-only access.")
            }
            ErrorDetail::WrongPassword { username } => {
                format!("Wrong password for user '{username}'.")
            }
        }
    }
}

/// Text did not have the shape an extractor expects.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{extractor} extractor: {reason}")]
pub struct UnrecognizedShape {
    pub extractor: &'static str,
    pub reason: &'static str,
}

/// Caller-supplied hints that change how text is read.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractContext {
    /// The caller filled in default values for missing fields, so
    /// "field required" complaints no longer apply.
    pub defaults_substituted: bool,
}

/// Parses one fixed diagnostic shape into an [`ErrorDetail`].
pub trait DiagnosticExtractor: Send + Sync {
    /// Extractor name for logs and errors.
    fn name(&self) -> &'static str;

    /// Extract structured detail from `raw`, the message with any routing
    /// prefix already removed.
    fn extract(&self, raw: &str, ctx: &ExtractContext) -> Result<ErrorDetail, UnrecognizedShape>;
}
