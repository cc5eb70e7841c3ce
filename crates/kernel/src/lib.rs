//! Quarry kernel library.
//!
//! Filter and ordering parsing for entity queries, SQL rendering, and the
//! classification of backend diagnostics into HTTP errors. The `quarry`
//! binary serves these over HTTP.

pub mod catalog;
pub mod config;
pub mod db;
pub mod diagnostic;
pub mod error;
pub mod query;
pub mod routes;
pub mod state;
pub mod store;
pub mod taxonomy;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use state::AppState;
