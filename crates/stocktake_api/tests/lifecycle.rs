//! End-to-end lifecycle tests over the HTTP router with an in-memory
//! gateway and a temporary database.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use stocktake_api::{router, AppState};
use stocktake_db::StocktakeDb;
use stocktake_gateway::MemoryGateway;
use tempfile::TempDir;
use tower::ServiceExt;

struct TestApp {
    _tmp: TempDir,
    app: Router,
    gateway: Arc<MemoryGateway>,
}

async fn setup() -> TestApp {
    let tmp = TempDir::new().unwrap();
    let db = StocktakeDb::open(tmp.path().join("test.db")).await.unwrap();
    db.sync_locations(&[
        ("Front".into(), "loc/front".into()),
        ("Back".into(), "loc/back".into()),
    ])
    .await
    .unwrap();

    let gateway = Arc::new(MemoryGateway::new());
    let state = AppState::new(db, gateway.clone());

    TestApp {
        _tmp: tmp,
        app: router(state),
        gateway,
    }
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(value) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, value)
}

fn create_body(locations: &[&str], barcodes: &[&str]) -> Value {
    json!({
        "department": "HAIR",
        "locations": locations,
        "filterSummary": "type is BRAID",
        "publish": true,
        "items": barcodes.iter().map(|b| json!({ "barcode": b, "name": format!("Item {b}") })).collect::<Vec<_>>(),
    })
}

async fn create_task(app: &Router, locations: &[&str], barcodes: &[&str]) -> Value {
    let (status, body) = send(
        app,
        Method::POST,
        "/tasks",
        Some(create_body(locations, barcodes)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body
}

async fn task_detail(app: &Router, id: i64) -> Value {
    let (status, body) = send(app, Method::GET, &format!("/tasks/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    body
}

async fn scan_counted(app: &Router, task_id: i64, item_id: i64, value: i64, soh: i64) {
    let (status, _) = send(
        app,
        Method::PATCH,
        &format!("/tasks/{task_id}/items/{item_id}/scan"),
        Some(json!({ "kind": "counted", "value": value, "soh": soh })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

async fn scan_confirmed(app: &Router, task_id: i64, item_id: i64, soh: i64) {
    let (status, _) = send(
        app,
        Method::PATCH,
        &format!("/tasks/{task_id}/items/{item_id}/scan"),
        Some(json!({ "kind": "confirmed", "soh": soh })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn create_fans_out_one_task_per_location() {
    let t = setup().await;

    let body = create_task(&t.app, &["Front", "Back"], &["111", "222", "333"]).await;
    let tasks = body["tasks"].as_array().unwrap();
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0]["taskNo"], "A0001");
    assert_eq!(tasks[1]["taskNo"], "A0002");
    assert_eq!(tasks[0]["externalLocationId"], "loc/front");
    assert_eq!(tasks[1]["externalLocationId"], "loc/back");

    for task in tasks {
        let detail = task_detail(&t.app, task["id"].as_i64().unwrap()).await;
        assert_eq!(detail["items"].as_array().unwrap().len(), 3);
        assert_eq!(detail["status"], "counting");
    }
}

#[tokio::test]
async fn create_rejects_empty_item_lists() {
    let t = setup().await;

    let (status, body) = send(
        &t.app,
        Method::POST,
        "/tasks",
        Some(json!({
            "department": "HAIR",
            "locations": ["Front"],
            "items": [],
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "validation_error");
}

#[tokio::test]
async fn exact_counts_commit_without_touching_the_gateway() {
    let t = setup().await;

    let body = create_task(&t.app, &["Front"], &["111"]).await;
    let task_id = body["tasks"][0]["id"].as_i64().unwrap();
    let detail = task_detail(&t.app, task_id).await;
    let item_id = detail["items"][0]["id"].as_i64().unwrap();

    // Over-count, then confirm: the confirmation wins.
    scan_counted(&t.app, task_id, item_id, 7, 10).await;
    scan_confirmed(&t.app, task_id, item_id, 10).await;

    let detail = task_detail(&t.app, task_id).await;
    assert_eq!(detail["items"][0]["poh"], 10);
    assert_eq!(detail["items"][0]["isExact"], true);

    let (status, body) = send(
        &t.app,
        Method::PATCH,
        &format!("/tasks/{task_id}/submit"),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["unscannedItems"], 0);

    let (status, body) = send(
        &t.app,
        Method::PATCH,
        &format!("/tasks/{task_id}/commit"),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "committed");
    assert!(t.gateway.adjustments().is_empty());
}

#[tokio::test]
async fn commit_straight_from_counting_is_auto_committed() {
    let t = setup().await;
    t.gateway.add_item("111", "inv/1", "Braid", "BRAID");
    t.gateway.set_stock("inv/1", "loc/front", 5);

    let body = create_task(&t.app, &["Front"], &["111"]).await;
    let task_id = body["tasks"][0]["id"].as_i64().unwrap();
    let detail = task_detail(&t.app, task_id).await;
    let item_id = detail["items"][0]["id"].as_i64().unwrap();

    scan_counted(&t.app, task_id, item_id, 2, 5).await;

    let (status, body) = send(
        &t.app,
        Method::PATCH,
        &format!("/tasks/{task_id}/commit"),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["committed"], 1);
    assert_eq!(body["status"], "auto_committed");
    assert_eq!(t.gateway.stock("inv/1", "loc/front"), 2);
}

#[tokio::test]
async fn partial_gateway_failure_leaves_the_item_retryable() {
    let t = setup().await;
    for (barcode, inv) in [("111", "inv/1"), ("222", "inv/2"), ("333", "inv/3"), ("444", "inv/4"), ("555", "inv/5")] {
        t.gateway.add_item(barcode, inv, "Braid", "BRAID");
        t.gateway.set_stock(inv, "loc/front", 5);
    }
    t.gateway.fail_adjustments_for("inv/2");

    let body = create_task(&t.app, &["Front"], &["111", "222", "333", "444", "555"]).await;
    let task_id = body["tasks"][0]["id"].as_i64().unwrap();
    let detail = task_detail(&t.app, task_id).await;
    let items = detail["items"].as_array().unwrap().clone();

    // Two discrepancies, three exact confirmations.
    scan_counted(&t.app, task_id, items[0]["id"].as_i64().unwrap(), 3, 5).await;
    scan_counted(&t.app, task_id, items[1]["id"].as_i64().unwrap(), 7, 5).await;
    for item in &items[2..] {
        scan_confirmed(&t.app, task_id, item["id"].as_i64().unwrap(), 5).await;
    }

    let (status, _) = send(
        &t.app,
        Method::PATCH,
        &format!("/tasks/{task_id}/submit"),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &t.app,
        Method::PATCH,
        &format!("/tasks/{task_id}/commit"),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["committed"], 1);
    assert_eq!(body["failed"], 1);
    assert_eq!(body["status"], "reviewing");

    // Exactly one adjustment reached the ledger.
    let adjustments = t.gateway.adjustments();
    assert_eq!(adjustments.len(), 1);
    assert_eq!(adjustments[0].inventory_item_id, "inv/1");
    assert_eq!(adjustments[0].delta, -2);

    // The failing item is still uncommitted and will be retried.
    let detail = task_detail(&t.app, task_id).await;
    assert_eq!(detail["status"], "reviewing");
    assert_eq!(detail["items"][0]["isCommitted"], true);
    assert_eq!(detail["items"][1]["isCommitted"], false);

    let (status, body) = send(
        &t.app,
        Method::PATCH,
        &format!("/tasks/{task_id}/commit"),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["failed"], 1);
}

#[tokio::test]
async fn submit_reports_unscanned_items_as_a_warning() {
    let t = setup().await;

    let body = create_task(&t.app, &["Front"], &["111", "222", "333"]).await;
    let task_id = body["tasks"][0]["id"].as_i64().unwrap();
    let detail = task_detail(&t.app, task_id).await;
    let item_id = detail["items"][0]["id"].as_i64().unwrap();

    scan_confirmed(&t.app, task_id, item_id, 5).await;

    let (status, body) = send(
        &t.app,
        Method::PATCH,
        &format!("/tasks/{task_id}/submit"),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["unscannedItems"], 2);
    assert_eq!(body["status"], "reviewing");
}

#[tokio::test]
async fn submitting_a_reviewing_task_is_rejected() {
    let t = setup().await;

    let body = create_task(&t.app, &["Front"], &["111"]).await;
    let task_id = body["tasks"][0]["id"].as_i64().unwrap();

    let uri = format!("/tasks/{task_id}/submit");
    let (status, _) = send(&t.app, Method::PATCH, &uri, Some(json!({}))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&t.app, Method::PATCH, &uri, Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "validation_error");
}

#[tokio::test]
async fn zero_quantity_reports_commit_their_deltas() {
    let t = setup().await;
    t.gateway.add_item("111", "inv/1", "Braid", "BRAID");
    t.gateway.set_stock("inv/1", "loc/front", 4);

    let (status, body) = send(
        &t.app,
        Method::POST,
        "/reports/submit",
        Some(json!({
            "items": [
                { "barcode": "111", "name": "Braid", "department": "HAIR",
                  "location": "Front", "soh": 4, "poh": 0 }
            ]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["ids"][0].as_i64().unwrap();

    let uri = format!("/reports/{id}/commit");
    let (status, body) = send(&t.app, Method::PATCH, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "committed");
    assert_eq!(t.gateway.stock("inv/1", "loc/front"), 0);

    // Committing again is a no-op success.
    let (status, body) = send(&t.app, Method::PATCH, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "committed");
    assert_eq!(t.gateway.adjustments().len(), 1);
}

#[tokio::test]
async fn report_submission_rejects_unknown_locations() {
    let t = setup().await;

    let (status, body) = send(
        &t.app,
        Method::POST,
        "/reports/submit",
        Some(json!({
            "items": [
                { "barcode": "111", "location": "Warehouse 9", "soh": 4, "poh": 0 }
            ]
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "validation_error");
}

#[tokio::test]
async fn archive_hides_tasks_from_default_views_but_keeps_rows() {
    let t = setup().await;

    let body = create_task(&t.app, &["Front"], &["111"]).await;
    let task_id = body["tasks"][0]["id"].as_i64().unwrap();

    let (status, _) = send(
        &t.app,
        Method::PATCH,
        "/tasks/archive",
        Some(json!({ "ids": [task_id] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let detail = task_detail(&t.app, task_id).await;
    assert_eq!(detail["status"], "archived");

    let (status, body) = send(&t.app, Method::GET, "/tasks?status=counting", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 0);
}
