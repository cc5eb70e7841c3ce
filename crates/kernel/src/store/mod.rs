//! Query execution backends.
//!
//! The query layer only renders SQL. A store runs it and turns driver
//! failures into classified application errors.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use tracing::debug;

use crate::db;
use crate::error::{AppError, AppResult};
use crate::query::EntityQuery;
use crate::taxonomy::ExtractorSet;

/// Executes validated entity queries.
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Number of rows matching the query's filter.
    async fn count(&self, query: &EntityQuery<'_>) -> AppResult<u64>;

    /// One page of matching rows, each as a JSON object.
    async fn fetch(&self, query: &EntityQuery<'_>) -> AppResult<Vec<JsonValue>>;

    /// Whether the backend is reachable.
    async fn healthy(&self) -> bool;
}

/// PostgreSQL-backed store.
pub struct PgStore {
    pool: PgPool,
    extractors: Arc<ExtractorSet>,
}

impl PgStore {
    pub fn new(pool: PgPool, extractors: Arc<ExtractorSet>) -> Self {
        Self { pool, extractors }
    }

    fn classify(&self, err: sqlx::Error) -> AppError {
        AppError::from_database(err, &self.extractors)
    }
}

#[async_trait]
impl EntityStore for PgStore {
    async fn count(&self, query: &EntityQuery<'_>) -> AppResult<u64> {
        let sql = query.build_count();
        debug!(entity = %query.entity().name, %sql, "count");

        let total: i64 = sqlx::query_scalar(&sql)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| self.classify(e))?;

        Ok(u64::try_from(total).unwrap_or_default())
    }

    async fn fetch(&self, query: &EntityQuery<'_>) -> AppResult<Vec<JsonValue>> {
        let sql = format!("SELECT row_to_json(q) FROM ({}) q", query.build_select());
        debug!(entity = %query.entity().name, %sql, "fetch");

        sqlx::query_scalar::<_, JsonValue>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| self.classify(e))
    }

    async fn healthy(&self) -> bool {
        db::check_health(&self.pool).await
    }
}
