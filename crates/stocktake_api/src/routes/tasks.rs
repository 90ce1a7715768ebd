//! Counting-task routes: creation, scanning, lifecycle, commit.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use stocktake_core::{ScanEvent, TaskStatus};
use stocktake_db::{NewTask, NewTaskItem, Note, Task, TaskFilter, TaskItem, TaskSummary};
use tracing::{info, warn};

use crate::commit::commit_delta;
use crate::error::{ApiError, ApiResult};
use crate::routes::ListQuery;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/tasks", post(create_tasks).get(list_tasks).delete(delete_tasks))
        .route("/tasks/archive", patch(archive_tasks))
        .route("/tasks/:id", get(get_task))
        .route("/tasks/:id/notes", patch(update_notes))
        .route("/tasks/:id/submit", patch(submit_task))
        .route("/tasks/:id/commit", patch(commit_task))
        .route("/tasks/:id/items/:item_id/scan", patch(record_scan))
}

// ============================================================================
// Creation and listing
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateTasksRequest {
    department: String,
    locations: Vec<String>,
    filter_summary: Option<String>,
    #[serde(default)]
    notes: Vec<Note>,
    #[serde(default)]
    publish: bool,
    items: Vec<ItemRequest>,
}

#[derive(Debug, Deserialize)]
struct ItemRequest {
    barcode: String,
    name: Option<String>,
}

#[derive(Serialize)]
struct CreateTasksResponse {
    success: bool,
    tasks: Vec<Task>,
}

/// One task row is created per target location, all sharing the item list,
/// each with its own task number.
async fn create_tasks(
    State(state): State<AppState>,
    Json(req): Json<CreateTasksRequest>,
) -> ApiResult<(StatusCode, Json<CreateTasksResponse>)> {
    if req.department.trim().is_empty() {
        return Err(ApiError::validation("department must not be empty"));
    }
    if req.locations.iter().all(|l| l.trim().is_empty()) {
        return Err(ApiError::validation("at least one location is required"));
    }
    if req.items.is_empty() {
        return Err(ApiError::validation("at least one item is required"));
    }
    if req.items.iter().any(|i| i.barcode.trim().is_empty()) {
        return Err(ApiError::validation("every item needs a barcode"));
    }

    let new = NewTask {
        department: req.department.trim().to_string(),
        locations: req
            .locations
            .iter()
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect(),
        filter_summary: req.filter_summary,
        notes: req.notes,
        publish: req.publish,
        items: req
            .items
            .into_iter()
            .map(|i| NewTaskItem {
                barcode: i.barcode.trim().to_string(),
                name: i.name,
            })
            .collect(),
    };

    let tasks = state.db.create_tasks(new).await?;
    info!(
        count = tasks.len(),
        numbers = ?tasks.iter().map(|t| t.task_no.as_str()).collect::<Vec<_>>(),
        "Tasks created"
    );

    Ok((
        StatusCode::CREATED,
        Json(CreateTasksResponse {
            success: true,
            tasks,
        }),
    ))
}

async fn list_tasks(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<TaskSummary>>> {
    let mut statuses = Vec::new();
    for raw in query.status_values() {
        let status = TaskStatus::parse(&raw)
            .ok_or_else(|| ApiError::Validation(format!("Unknown task status: {raw}")))?;
        statuses.push(status);
    }

    let filter = TaskFilter {
        department: query.department(),
        locations: query.locations(),
        statuses,
        created_within: query.date_window(),
    };

    Ok(Json(state.db.list_tasks(filter).await?))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TaskDetail {
    #[serde(flatten)]
    task: Task,
    items: Vec<TaskItem>,
}

async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<TaskDetail>> {
    let (task, items) = state.db.get_task(id).await?;
    Ok(Json(TaskDetail { task, items }))
}

// ============================================================================
// Scanning
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ScanKind {
    Confirmed,
    Counted,
}

/// The scan cycle re-reads the live baseline before posting, so the body
/// carries the fresh SOH alongside the event.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScanRequest {
    kind: ScanKind,
    value: Option<i64>,
    soh: i64,
}

async fn record_scan(
    State(state): State<AppState>,
    Path((task_id, item_id)): Path<(i64, i64)>,
    Json(req): Json<ScanRequest>,
) -> ApiResult<Json<TaskItem>> {
    let event = match req.kind {
        ScanKind::Confirmed => ScanEvent::confirmed_now(),
        ScanKind::Counted => {
            let value = req
                .value
                .ok_or_else(|| ApiError::validation("counted scans require a value"))?;
            if value < 0 {
                return Err(ApiError::validation("counted value must not be negative"));
            }
            ScanEvent::counted_now(value)
        }
    };

    let item = state.db.record_scan(task_id, item_id, event, req.soh).await?;
    Ok(Json(item))
}

// ============================================================================
// Lifecycle
// ============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmitResponse {
    success: bool,
    status: TaskStatus,
    /// Items never scanned; surfaced as a warning, not an error.
    unscanned_items: i64,
}

async fn submit_task(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<SubmitResponse>> {
    let (task, _) = state.db.get_task(id).await?;
    if task.status != TaskStatus::Counting {
        return Err(ApiError::Validation(format!(
            "Only counting tasks can be submitted (task {} is {})",
            task.task_no, task.status
        )));
    }

    let unscanned = state.db.unscanned_count(id).await?;
    state.db.set_task_status(id, TaskStatus::Reviewing).await?;

    if unscanned > 0 {
        warn!(task_no = %task.task_no, unscanned, "Task submitted with unscanned items");
    }

    Ok(Json(SubmitResponse {
        success: true,
        status: TaskStatus::Reviewing,
        unscanned_items: unscanned,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommitRequest {
    /// Restrict the commit to these items; absent means all eligible items.
    item_ids: Option<Vec<i64>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CommitResponse {
    success: bool,
    committed: usize,
    failed: usize,
    status: TaskStatus,
}

/// Push eligible item deltas to the external ledger, sequentially and
/// best-effort: one item's failure never blocks its siblings. When nothing
/// eligible remains afterwards, the task reaches its committed terminal --
/// `committed` if it had been submitted for review, `auto_committed` if the
/// commit cleared it straight from counting.
async fn commit_task(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<CommitRequest>,
) -> ApiResult<Json<CommitResponse>> {
    let (task, _) = state.db.get_task(id).await?;
    if !matches!(task.status, TaskStatus::Counting | TaskStatus::Reviewing) {
        return Err(ApiError::Validation(format!(
            "Task {} is {} and cannot be committed",
            task.task_no, task.status
        )));
    }

    let items = state.db.eligible_items(id, req.item_ids.as_deref()).await?;

    let mut committed = 0;
    let mut failed = 0;
    for item in &items {
        // Eligible items always carry both quantities.
        let Some(delta) = item.delta() else { continue };

        let outcome =
            commit_delta(&*state.gateway, &item.barcode, &task.external_location_id, delta).await;
        if outcome.is_settled() {
            state.db.mark_item_committed(item.id).await?;
            committed += 1;
        } else {
            warn!(
                task_no = %task.task_no,
                barcode = %item.barcode,
                "Item left uncommitted: {outcome:?}"
            );
            failed += 1;
        }
    }

    let mut status = task.status;
    if state.db.eligible_uncommitted_count(id).await? == 0 {
        status = if task.status == TaskStatus::Reviewing {
            TaskStatus::Committed
        } else {
            TaskStatus::AutoCommitted
        };
        state.db.set_task_status(id, status).await?;
        info!(task_no = %task.task_no, status = %status, "Task fully committed");
    }

    Ok(Json(CommitResponse {
        success: true,
        committed,
        failed,
        status,
    }))
}

#[derive(Debug, Deserialize)]
struct NotesRequest {
    notes: Vec<Note>,
}

#[derive(Serialize)]
struct OkResponse {
    success: bool,
}

/// The notes array is replaced wholesale; append and delete are client-side
/// edits of the array.
async fn update_notes(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<NotesRequest>,
) -> ApiResult<Json<OkResponse>> {
    state.db.update_task_notes(id, &req.notes).await?;
    Ok(Json(OkResponse { success: true }))
}

// ============================================================================
// Bulk delete / archive
// ============================================================================

#[derive(Debug, Deserialize)]
struct IdsRequest {
    ids: Vec<i64>,
}

#[derive(Serialize)]
struct BulkResponse {
    success: bool,
    affected: u64,
}

async fn delete_tasks(
    State(state): State<AppState>,
    Json(req): Json<IdsRequest>,
) -> ApiResult<Json<BulkResponse>> {
    if req.ids.is_empty() {
        return Err(ApiError::validation("ids must not be empty"));
    }
    let affected = state.db.delete_tasks(&req.ids).await?;
    info!(affected, "Tasks deleted");
    Ok(Json(BulkResponse {
        success: true,
        affected,
    }))
}

async fn archive_tasks(
    State(state): State<AppState>,
    Json(req): Json<IdsRequest>,
) -> ApiResult<Json<BulkResponse>> {
    if req.ids.is_empty() {
        return Err(ApiError::validation("ids must not be empty"));
    }
    let affected = state.db.archive_tasks(&req.ids).await?;
    Ok(Json(BulkResponse {
        success: true,
        affected,
    }))
}
