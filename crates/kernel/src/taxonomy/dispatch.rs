//! Routing of internal error messages to diagnostic extractors.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use axum::http::StatusCode;
use serde::Serialize;
use tracing::{debug, warn};

use super::code::ErrorCode;
use crate::diagnostic::{
    DiagnosticExtractor, ErrorDetail, ExtractContext, ForeignKeyExtractor, PrimaryKeyExtractor,
    ReadonlyAccessExtractor, UniqueConstraintExtractor, ValidationExtractor,
    WrongPasswordExtractor,
};

/// Terminal classification of an internal error message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    UniqueConstraintViolation,
    PrimaryKeyViolation,
    ForeignKeyViolation,
    ValidationFailure,
    ReadonlyAccessViolation,
    WrongPassword,
    NotFound,
    Unauthenticated,
    Uncategorized,
}

impl ErrorKind {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorKind::UniqueConstraintViolation
            | ErrorKind::PrimaryKeyViolation
            | ErrorKind::ForeignKeyViolation => StatusCode::BAD_REQUEST,
            ErrorKind::ValidationFailure => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::ReadonlyAccessViolation
            | ErrorKind::WrongPassword
            | ErrorKind::Unauthenticated => StatusCode::UNAUTHORIZED,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Uncategorized => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            ErrorKind::UniqueConstraintViolation => "Unique constraint violation",
            ErrorKind::PrimaryKeyViolation => "Primary key violation",
            ErrorKind::ForeignKeyViolation => "Foreign key violation",
            ErrorKind::ValidationFailure => "Validation error",
            ErrorKind::ReadonlyAccessViolation => "Read-only access",
            ErrorKind::WrongPassword => "Wrong password",
            ErrorKind::NotFound => "Not found",
            ErrorKind::Unauthenticated => "Authentication required",
            ErrorKind::Uncategorized => "Internal server error",
        }
    }
}

impl From<ErrorCode> for ErrorKind {
    fn from(code: ErrorCode) -> Self {
        match code {
            ErrorCode::UniqueConstraint => ErrorKind::UniqueConstraintViolation,
            ErrorCode::PrimaryKey => ErrorKind::PrimaryKeyViolation,
            ErrorCode::ForeignKey => ErrorKind::ForeignKeyViolation,
            ErrorCode::Validation => ErrorKind::ValidationFailure,
            ErrorCode::ReadonlyAccess => ErrorKind::ReadonlyAccessViolation,
            ErrorCode::WrongPassword => ErrorKind::WrongPassword,
            ErrorCode::NotFound => ErrorKind::NotFound,
            ErrorCode::Unauthenticated => ErrorKind::Unauthenticated,
        }
    }
}

/// User-facing error produced by the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassifiedError {
    pub kind: ErrorKind,
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<ErrorDetail>,
}

impl ClassifiedError {
    pub fn status(&self) -> StatusCode {
        self.kind.status()
    }

    fn from_detail(kind: ErrorKind, detail: ErrorDetail) -> Self {
        Self {
            kind,
            title: kind.title().to_string(),
            description: detail.description(),
            detail: Some(detail),
        }
    }

    fn plain(kind: ErrorKind, description: impl Into<String>) -> Self {
        Self {
            kind,
            title: kind.title().to_string(),
            description: description.into(),
            detail: None,
        }
    }

    /// The catch-all terminal. The raw message is never exposed.
    pub fn uncategorized() -> Self {
        Self::plain(
            ErrorKind::Uncategorized,
            "An unexpected error occurred while processing the request.",
        )
    }
}

impl fmt::Display for ClassifiedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title, self.description)
    }
}

impl std::error::Error for ClassifiedError {}

/// Extractors paired with the codes that route to them.
///
/// Swapping the set changes which backend wording is understood without
/// touching the dispatcher.
#[derive(Clone, Default)]
pub struct ExtractorSet {
    extractors: HashMap<ErrorCode, Arc<dyn DiagnosticExtractor>>,
}

impl ExtractorSet {
    /// An empty set. Codes that need an extractor classify as uncategorized.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the extractor for a code.
    pub fn with<E: DiagnosticExtractor + 'static>(mut self, code: ErrorCode, extractor: E) -> Self {
        self.extractors.insert(code, Arc::new(extractor));
        self
    }

    /// Extractors for the PostgreSQL driver and the API's own checks.
    pub fn postgres() -> Self {
        Self::new()
            .with(ErrorCode::UniqueConstraint, UniqueConstraintExtractor)
            .with(ErrorCode::PrimaryKey, PrimaryKeyExtractor)
            .with(ErrorCode::ForeignKey, ForeignKeyExtractor)
            .with(ErrorCode::Validation, ValidationExtractor)
            .with(ErrorCode::ReadonlyAccess, ReadonlyAccessExtractor)
            .with(ErrorCode::WrongPassword, WrongPasswordExtractor)
    }

    pub fn get(&self, code: ErrorCode) -> Option<&dyn DiagnosticExtractor> {
        self.extractors.get(&code).map(|e| e.as_ref())
    }
}

impl fmt::Debug for ExtractorSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<(&str, &str)> = self
            .extractors
            .iter()
            .map(|(code, e)| (code.as_str(), e.name()))
            .collect();
        names.sort_unstable();
        f.debug_struct("ExtractorSet")
            .field("extractors", &names)
            .finish()
    }
}

/// Whether a code needs structured extraction or carries plain text.
fn needs_extractor(code: ErrorCode) -> bool {
    !matches!(code, ErrorCode::NotFound | ErrorCode::Unauthenticated)
}

/// Classify an internal error message.
///
/// The first [`ErrorCode::PREFIX_LEN`] characters select the extractor.
/// An unknown prefix, a missing extractor or an extractor that does not
/// recognise the text all end in [`ErrorKind::Uncategorized`].
pub fn classify(message: &str, extractors: &ExtractorSet, ctx: &ExtractContext) -> ClassifiedError {
    let Some((code, rest)) = ErrorCode::split_message(message) else {
        warn!(raw = message, "internal error message carries no known code");
        return ClassifiedError::uncategorized();
    };
    let kind = ErrorKind::from(code);

    if !needs_extractor(code) {
        let text = rest.trim();
        let description = if text.is_empty() { kind.title() } else { text };
        return ClassifiedError::plain(kind, description);
    }

    let Some(extractor) = extractors.get(code) else {
        warn!(%code, "no extractor registered for code");
        return ClassifiedError::uncategorized();
    };

    match extractor.extract(rest, ctx) {
        Ok(detail) => {
            debug!(%code, extractor = extractor.name(), "diagnostic classified");
            ClassifiedError::from_detail(kind, detail)
        }
        Err(e) => {
            warn!(%code, error = %e, "diagnostic text did not match its code");
            ClassifiedError::uncategorized()
        }
    }
}
