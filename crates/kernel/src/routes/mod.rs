//! HTTP route handlers.

pub mod diagnostics;
pub mod entity;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// All application routes bound to `state`, without middleware layers.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(entity::router())
        .merge(diagnostics::router())
        .with_state(state)
}
