//! Diagnostic message classification endpoint.

use axum::{Json, Router, extract::State, routing::post};
use serde::Deserialize;

use crate::diagnostic::ExtractContext;
use crate::state::AppState;
use crate::taxonomy::{ClassifiedError, classify};

/// Create the diagnostics router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/diagnostics/classify", post(classify_message))
}

/// Classification request body.
#[derive(Debug, Deserialize)]
pub struct ClassifyRequest {
    /// Internal message, routing code first.
    pub message: String,
    /// Whether the caller substituted defaults for missing fields.
    #[serde(default)]
    pub defaults_substituted: bool,
}

/// Run the dispatcher over a message and return what it produced.
///
/// The endpoint itself always succeeds; the status the message would carry
/// is reported in the body.
async fn classify_message(
    State(state): State<AppState>,
    Json(request): Json<ClassifyRequest>,
) -> Json<serde_json::Value> {
    let ctx = ExtractContext {
        defaults_substituted: request.defaults_substituted,
    };
    let classified: ClassifiedError = classify(&request.message, state.extractors(), &ctx);

    Json(serde_json::json!({
        "status": classified.status().as_u16(),
        "classification": classified,
    }))
}
