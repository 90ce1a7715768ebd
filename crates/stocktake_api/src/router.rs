//! Router assembly.

use axum::http::{StatusCode, Uri};
use axum::{Json, Router};
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::routes;
use crate::state::AppState;

/// Build the full application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(routes::tasks::routes())
        .merge(routes::reports::routes())
        .merge(routes::catalog::routes())
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn not_found(uri: Uri) -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": {
                "code": "not_found",
                "message": format!("No route for {uri}"),
            }
        })),
    )
}
