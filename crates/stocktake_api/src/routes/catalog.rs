//! Catalog and location routes backed by the external platform.

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use stocktake_gateway::{InventoryLookup, Location};
use tracing::info;

use crate::error::ApiResult;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/locations", get(list_locations))
        .route("/locations/sync", post(sync_locations))
        .route("/inventory/:barcode/:location_id", get(lookup_inventory))
}

async fn list_locations(State(state): State<AppState>) -> ApiResult<Json<Vec<Location>>> {
    Ok(Json(state.gateway.list_locations().await?))
}

#[derive(Serialize)]
struct SyncResponse {
    success: bool,
    synced: usize,
}

/// Refresh the location name -> external id map from the platform.
async fn sync_locations(State(state): State<AppState>) -> ApiResult<Json<SyncResponse>> {
    let locations = state.gateway.list_locations().await?;
    let pairs: Vec<(String, String)> = locations
        .iter()
        .map(|l| (l.name.clone(), l.id.clone()))
        .collect();

    state.db.sync_locations(&pairs).await?;
    info!(count = pairs.len(), "Location map synced");

    Ok(Json(SyncResponse {
        success: true,
        synced: pairs.len(),
    }))
}

/// Baseline read for the scan cycle. `location_id` is the external system's
/// id, percent-encoded by the client.
async fn lookup_inventory(
    State(state): State<AppState>,
    Path((barcode, location_id)): Path<(String, String)>,
) -> ApiResult<Json<InventoryLookup>> {
    Ok(Json(
        state.gateway.lookup_inventory(&barcode, &location_id).await?,
    ))
}
