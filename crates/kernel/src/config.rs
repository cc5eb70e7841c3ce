//! Configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port (default: 3000).
    pub port: u16,

    /// PostgreSQL connection URL.
    pub database_url: String,

    /// Maximum database connections in pool (default: 10).
    pub database_max_connections: u32,

    /// YAML entity catalog. When None, the built-in catalog is used.
    pub entity_catalog: Option<PathBuf>,

    /// Page size used when a request gives no limit (default: 100).
    pub default_page_limit: u64,

    /// CORS allowed origins (comma-separated, default: "*").
    pub cors_allowed_origins: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .context("PORT must be a valid u16")?;

        let database_url =
            env::var("DATABASE_URL").context("DATABASE_URL environment variable is required")?;

        let database_max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .context("DATABASE_MAX_CONNECTIONS must be a valid u32")?;

        let entity_catalog = env::var("ENTITY_CATALOG")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        let default_page_limit = env::var("DEFAULT_PAGE_LIMIT")
            .unwrap_or_else(|_| "100".to_string())
            .parse()
            .context("DEFAULT_PAGE_LIMIT must be a non-negative integer")?;

        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .map(|v| {
                v.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_else(|_| vec!["*".to_string()]);

        Ok(Self {
            port,
            database_url,
            database_max_connections,
            entity_catalog,
            default_page_limit,
            cors_allowed_origins,
        })
    }

    /// Whether CORS should allow any origin.
    pub fn cors_allows_any(&self) -> bool {
        self.cors_allowed_origins.is_empty()
            || (self.cors_allowed_origins.len() == 1 && self.cors_allowed_origins[0] == "*")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn config(origins: &[&str]) -> Config {
        Config {
            port: 3000,
            database_url: "postgres://localhost/adventureworks".to_string(),
            database_max_connections: 10,
            entity_catalog: None,
            default_page_limit: 100,
            cors_allowed_origins: origins.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn wildcard_origin_allows_any() {
        assert!(config(&["*"]).cors_allows_any());
        assert!(config(&[]).cors_allows_any());
        assert!(!config(&["https://example.com"]).cors_allows_any());
        assert!(!config(&["*", "https://example.com"]).cors_allows_any());
    }
}
