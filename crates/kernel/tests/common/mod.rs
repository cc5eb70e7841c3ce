#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Common test utilities for integration tests.
//!
//! Routes run against the real router and state. Only the store is
//! replaced, by [`MockStore`], which records the queries it receives and
//! answers with canned rows.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use quarry_kernel::AppResult;
use quarry_kernel::catalog::EntityCatalog;
use quarry_kernel::diagnostic::ExtractContext;
use quarry_kernel::query::EntityQuery;
use quarry_kernel::routes;
use quarry_kernel::state::AppState;
use quarry_kernel::store::EntityStore;
use quarry_kernel::taxonomy::{ExtractorSet, classify};

/// What the store saw for one call.
#[derive(Debug, Clone)]
pub struct RecordedQuery {
    pub entity: String,
    pub filter: String,
    pub offset: u64,
    pub limit: u64,
    pub select_sql: String,
    pub count_sql: String,
}

/// In-memory store returning a fixed total and row set.
#[derive(Default)]
pub struct MockStore {
    pub total: u64,
    pub rows: Vec<Value>,
    /// Tagged internal message to fail every call with.
    pub failure: Option<String>,
    pub unhealthy: bool,
    recorded: Mutex<Vec<RecordedQuery>>,
}

impl MockStore {
    pub fn with_rows(total: u64, rows: Vec<Value>) -> Self {
        Self {
            total,
            rows,
            ..Self::default()
        }
    }

    pub fn failing(message: String) -> Self {
        Self {
            failure: Some(message),
            ..Self::default()
        }
    }

    pub fn unhealthy() -> Self {
        Self {
            unhealthy: true,
            ..Self::default()
        }
    }

    pub fn recorded(&self) -> Vec<RecordedQuery> {
        self.recorded.lock().unwrap().clone()
    }

    fn record(&self, query: &EntityQuery<'_>) -> AppResult<()> {
        self.recorded.lock().unwrap().push(RecordedQuery {
            entity: query.entity().name.clone(),
            filter: query.filter().to_filter_string(),
            offset: query.pagination().offset,
            limit: query.pagination().limit,
            select_sql: query.build_select(),
            count_sql: query.build_count(),
        });
        match self.failure {
            Some(ref message) => Err(classify(
                message,
                &ExtractorSet::postgres(),
                &ExtractContext::default(),
            )
            .into()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl EntityStore for MockStore {
    async fn count(&self, query: &EntityQuery<'_>) -> AppResult<u64> {
        self.record(query)?;
        Ok(self.total)
    }

    async fn fetch(&self, query: &EntityQuery<'_>) -> AppResult<Vec<Value>> {
        self.record(query)?;
        let limit = usize::try_from(query.pagination().limit).unwrap_or(usize::MAX);
        Ok(self.rows.iter().take(limit).cloned().collect())
    }

    async fn healthy(&self) -> bool {
        !self.unhealthy
    }
}

/// Router plus a handle on its store.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MockStore>,
}

impl TestApp {
    /// App over the built-in catalog.
    pub fn new(store: MockStore) -> Self {
        Self::with_catalog(EntityCatalog::builtin().unwrap(), store)
    }

    pub fn with_catalog(catalog: EntityCatalog, store: MockStore) -> Self {
        let store = Arc::new(store);
        let state = AppState::from_parts(
            catalog,
            store.clone(),
            Arc::new(ExtractorSet::postgres()),
            100,
        );
        Self {
            router: routes::app(state),
            store,
        }
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        self.send(request).await
    }

    pub async fn post_json(&self, uri: &str, body: &Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }
}

/// Percent-encode a filter string for use in a query string.
pub fn encode(raw: &str) -> String {
    urlencoding::encode(raw).into_owned()
}
