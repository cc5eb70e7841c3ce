//! Application state shared across all handlers.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::catalog::EntityCatalog;
use crate::config::Config;
use crate::db;
use crate::store::{EntityStore, PgStore};
use crate::taxonomy::ExtractorSet;

/// Shared application state.
///
/// Wrapped in Arc internally so Clone is cheap.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Entities exposed through the API.
    catalog: EntityCatalog,

    /// Query execution backend.
    store: Arc<dyn EntityStore>,

    /// Extractors used to classify diagnostic messages.
    extractors: Arc<ExtractorSet>,

    /// Page size when a request gives no limit.
    default_page_limit: u64,
}

impl AppState {
    /// Build state from configuration: load the catalog and connect to PostgreSQL.
    pub async fn new(config: &Config) -> Result<Self> {
        let catalog = match config.entity_catalog {
            Some(ref path) => EntityCatalog::from_path(path)
                .with_context(|| format!("failed to load entity catalog {}", path.display()))?,
            None => EntityCatalog::builtin().context("failed to load built-in entity catalog")?,
        };
        info!(entities = catalog.len(), "Entity catalog loaded");

        let pool = db::create_pool(config)
            .await
            .context("failed to create database pool")?;

        let extractors = Arc::new(ExtractorSet::postgres());
        let store = Arc::new(PgStore::new(pool, Arc::clone(&extractors)));

        Ok(Self::from_parts(
            catalog,
            store,
            extractors,
            config.default_page_limit,
        ))
    }

    /// Assemble state from already-built parts.
    pub fn from_parts(
        catalog: EntityCatalog,
        store: Arc<dyn EntityStore>,
        extractors: Arc<ExtractorSet>,
        default_page_limit: u64,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                catalog,
                store,
                extractors,
                default_page_limit,
            }),
        }
    }

    pub fn catalog(&self) -> &EntityCatalog {
        &self.inner.catalog
    }

    pub fn store(&self) -> &Arc<dyn EntityStore> {
        &self.inner.store
    }

    pub fn extractors(&self) -> &ExtractorSet {
        &self.inner.extractors
    }

    pub fn default_page_limit(&self) -> u64 {
        self.inner.default_page_limit
    }
}
