//! Zero-quantity report routes.
//!
//! Entries arrive already reduced by the client-held draft buffer
//! (`stocktake_core::draft`); the server materializes them as `reviewing`
//! rows and pushes their deltas on commit.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use stocktake_core::ReportStatus;
use stocktake_db::{NewReportEntry, ReportFilter, ZeroQtyReport};
use tracing::{info, warn};

use crate::commit::{commit_delta, CommitOutcome};
use crate::error::{ApiError, ApiResult};
use crate::routes::ListQuery;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/reports", get(list_reports).delete(delete_reports))
        .route("/reports/submit", post(submit_reports))
        .route("/reports/archive", patch(archive_reports))
        .route("/reports/commit", patch(commit_many))
        .route("/reports/:id/commit", patch(commit_one))
}

async fn list_reports(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<ZeroQtyReport>>> {
    let mut statuses = Vec::new();
    for raw in query.status_values() {
        let status = ReportStatus::parse(&raw)
            .ok_or_else(|| ApiError::Validation(format!("Unknown report status: {raw}")))?;
        statuses.push(status);
    }

    let filter = ReportFilter {
        department: query.department(),
        locations: query.locations(),
        statuses,
        submitted_within: query.date_window(),
    };

    Ok(Json(state.db.list_reports(filter).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitRequest {
    items: Vec<EntryRequest>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EntryRequest {
    barcode: String,
    name: Option<String>,
    department: Option<String>,
    location: String,
    soh: Option<i64>,
    poh: Option<i64>,
}

#[derive(Serialize)]
struct SubmitResponse {
    success: bool,
    ids: Vec<i64>,
}

async fn submit_reports(
    State(state): State<AppState>,
    Json(req): Json<SubmitRequest>,
) -> ApiResult<(StatusCode, Json<SubmitResponse>)> {
    if req.items.is_empty() {
        return Err(ApiError::validation("items must not be empty"));
    }

    let location_map = state.db.location_map().await?;
    let mut entries = Vec::with_capacity(req.items.len());
    for item in req.items {
        if item.barcode.trim().is_empty() {
            return Err(ApiError::validation("every entry needs a barcode"));
        }
        let external_location_id = location_map
            .get(&item.location)
            .cloned()
            .ok_or_else(|| {
                ApiError::Validation(format!("Unknown location: {}", item.location))
            })?;

        entries.push(NewReportEntry {
            barcode: item.barcode.trim().to_string(),
            name: item.name,
            department: item.department,
            location: item.location,
            external_location_id,
            soh: item.soh,
            poh: item.poh,
        });
    }

    let ids = state.db.insert_reports(&entries).await?;
    info!(count = ids.len(), "Zero-quantity reports submitted");

    Ok((
        StatusCode::CREATED,
        Json(SubmitResponse { success: true, ids }),
    ))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CommitOneResponse {
    success: bool,
    status: ReportStatus,
}

/// Push one report's delta. Committing a report that is no longer
/// `reviewing` is a no-op success.
async fn commit_one(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<CommitOneResponse>> {
    let status = push_report(&state, id).await?;
    Ok(Json(CommitOneResponse {
        success: true,
        status,
    }))
}

#[derive(Debug, Deserialize)]
struct IdsRequest {
    ids: Vec<i64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CommitManyResponse {
    success: bool,
    committed: usize,
    failed: usize,
}

/// Sequential, best-effort batch: one entry's failure never blocks the rest.
async fn commit_many(
    State(state): State<AppState>,
    Json(req): Json<IdsRequest>,
) -> ApiResult<Json<CommitManyResponse>> {
    if req.ids.is_empty() {
        return Err(ApiError::validation("ids must not be empty"));
    }

    let mut committed = 0;
    let mut failed = 0;
    for id in &req.ids {
        match push_report(&state, *id).await {
            Ok(_) => committed += 1,
            Err(err) => {
                warn!(report_id = id, "Report commit failed: {err}");
                failed += 1;
            }
        }
    }

    Ok(Json(CommitManyResponse {
        success: true,
        committed,
        failed,
    }))
}

/// Commit a single report entry, returning its resulting status.
async fn push_report(state: &AppState, id: i64) -> ApiResult<ReportStatus> {
    let report = state.db.get_report(id).await?;
    if report.status != ReportStatus::Reviewing {
        return Ok(report.status);
    }

    let delta = report.delta().unwrap_or(0);
    let outcome = commit_delta(
        &*state.gateway,
        &report.barcode,
        &report.external_location_id,
        delta,
    )
    .await;

    match outcome {
        CommitOutcome::Applied | CommitOutcome::NoChange => {
            state.db.mark_report_committed(id).await?;
            Ok(ReportStatus::Committed)
        }
        CommitOutcome::NotFound => Err(ApiError::NotFound(format!(
            "Barcode {} not found in external catalog",
            report.barcode
        ))),
        CommitOutcome::Failed(err) => Err(err.into()),
    }
}

#[derive(Serialize)]
struct BulkResponse {
    success: bool,
    affected: u64,
}

async fn delete_reports(
    State(state): State<AppState>,
    Json(req): Json<IdsRequest>,
) -> ApiResult<Json<BulkResponse>> {
    if req.ids.is_empty() {
        return Err(ApiError::validation("ids must not be empty"));
    }
    let affected = state.db.delete_reports(&req.ids).await?;
    Ok(Json(BulkResponse {
        success: true,
        affected,
    }))
}

async fn archive_reports(
    State(state): State<AppState>,
    Json(req): Json<IdsRequest>,
) -> ApiResult<Json<BulkResponse>> {
    if req.ids.is_empty() {
        return Err(ApiError::validation("ids must not be empty"));
    }
    let affected = state.db.archive_reports(&req.ids).await?;
    Ok(Json(BulkResponse {
        success: true,
        affected,
    }))
}
