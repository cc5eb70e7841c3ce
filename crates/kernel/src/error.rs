//! Application error types.

use std::sync::LazyLock;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

use crate::diagnostic::ExtractContext;
use crate::query::QueryError;
use crate::taxonomy::{ClassifiedError, ErrorKind, ExtractorSet, classify, tag_database_error};

static POSTGRES_EXTRACTORS: LazyLock<ExtractorSet> = LazyLock::new(ExtractorSet::postgres);

/// Application errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Query(#[from] QueryError),

    #[error("{0}")]
    Classified(#[from] ClassifiedError),

    #[error("unknown entity '{0}'")]
    UnknownEntity(String),

    #[error("internal server error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Classify a database error through the taxonomy dispatcher.
    pub fn from_database(err: sqlx::Error, extractors: &ExtractorSet) -> Self {
        match tag_database_error(&err) {
            Some(message) => {
                AppError::Classified(classify(&message, extractors, &ExtractContext::default()))
            }
            None => {
                tracing::error!(error = %err, "unclassified database error");
                AppError::Classified(ClassifiedError::uncategorized())
            }
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Query(_) => StatusCode::BAD_REQUEST,
            AppError::Classified(c) => c.status(),
            AppError::UnknownEntity(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        Self::from_database(err, &POSTGRES_EXTRACTORS)
    }
}

/// JSON error body: `{title, description, code}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub title: String,
    pub description: String,
    pub code: u16,
}

impl From<&AppError> for ErrorBody {
    fn from(err: &AppError) -> Self {
        let code = err.status().as_u16();
        match err {
            AppError::Query(e) => Self {
                title: e.title().to_string(),
                description: e.to_string(),
                code,
            },
            AppError::Classified(c) => Self {
                title: c.title.clone(),
                description: c.description.clone(),
                code,
            },
            AppError::UnknownEntity(_) => Self {
                title: ErrorKind::NotFound.title().to_string(),
                description: err.to_string(),
                code,
            },
            AppError::Internal(_) => {
                let vague = ClassifiedError::uncategorized();
                Self {
                    title: vague.title,
                    description: vague.description,
                    code,
                }
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Internal(e) => tracing::error!(error = %e, "internal server error"),
            AppError::Classified(c) if c.kind == ErrorKind::Uncategorized => {
                tracing::error!(error = %c, "uncategorized error");
            }
            _ => tracing::debug!(error = %self, "request rejected"),
        }

        (self.status(), Json(ErrorBody::from(&self))).into_response()
    }
}

/// Result type alias using AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::query::Clause;

    #[test]
    fn query_errors_are_bad_request() {
        let err = AppError::from(QueryError::InvalidPaginationValue {
            clause: Clause::Limit,
            value: -2,
        });
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        let body = ErrorBody::from(&err);
        assert_eq!(body.title, "Invalid value for clause");
        assert_eq!(body.code, 400);
    }

    #[test]
    fn unknown_entity_is_not_found() {
        let err = AppError::UnknownEntity("spaceship".to_string());
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert!(ErrorBody::from(&err).description.contains("spaceship"));
    }

    #[test]
    fn internal_errors_are_vague() {
        let err = AppError::from(anyhow::anyhow!("connection string leaked here"));
        let body = ErrorBody::from(&err);
        assert_eq!(body.code, 500);
        assert!(!body.description.contains("leaked"));
    }

    #[test]
    fn row_not_found_classifies_as_404() {
        let err = AppError::from_database(sqlx::Error::RowNotFound, &ExtractorSet::postgres());
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn untagged_database_error_is_500() {
        let err = AppError::from(sqlx::Error::PoolTimedOut);
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
