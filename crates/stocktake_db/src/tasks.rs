//! Counting-task database operations.

use sqlx::{QueryBuilder, Row, Sqlite};
use stocktake_core::{interpret_history, ScanEvent, TaskStatus};

use crate::counter;
use crate::error::{DbError, Result};
use crate::types::*;
use crate::StocktakeDb;

impl StocktakeDb {
    // ========================================================================
    // Creation
    // ========================================================================

    /// Create one task per target location, all in a single transaction.
    ///
    /// Each task gets its own number from the shared counter and its own
    /// copy of the item list. A failure anywhere rolls back every row and
    /// the counter advance together.
    pub async fn create_tasks(&self, new: NewTask) -> Result<Vec<Task>> {
        let location_map = self.location_map().await?;

        let now = Self::now_millis();
        let status = if new.publish {
            TaskStatus::Counting
        } else {
            TaskStatus::Draft
        };
        let notes_json = serde_json::to_string(&new.notes)?;

        let mut tx = self.pool.begin().await?;
        let mut created = Vec::with_capacity(new.locations.len());

        for location in &new.locations {
            let external_location_id = location_map.get(location).cloned().unwrap_or_default();
            let task_no = counter::allocate_task_no(&mut tx).await?;

            let result = sqlx::query(
                r#"
                INSERT INTO tasks
                    (task_no, department, location, external_location_id,
                     status, filter_summary, notes, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&task_no)
            .bind(&new.department)
            .bind(location)
            .bind(&external_location_id)
            .bind(status.as_str())
            .bind(&new.filter_summary)
            .bind(&notes_json)
            .bind(now)
            .bind(now)
            .execute(&mut *tx)
            .await?;

            let task_id = result.last_insert_rowid();

            for item in &new.items {
                sqlx::query(
                    "INSERT INTO task_items (task_id, barcode, name) VALUES (?, ?, ?)",
                )
                .bind(task_id)
                .bind(&item.barcode)
                .bind(&item.name)
                .execute(&mut *tx)
                .await?;
            }

            created.push(Task {
                id: task_id,
                task_no,
                department: new.department.clone(),
                location: location.clone(),
                external_location_id,
                status,
                filter_summary: new.filter_summary.clone(),
                notes: new.notes.clone(),
                created_at: Self::millis_to_datetime(now),
                updated_at: Self::millis_to_datetime(now),
            });
        }

        tx.commit().await?;
        Ok(created)
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Get a task with its items, ordered by item id.
    pub async fn get_task(&self, id: i64) -> Result<(Task, Vec<TaskItem>)> {
        let row = sqlx::query("SELECT * FROM tasks WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found(format!("Task not found: {id}")))?;
        let task = row_to_task(&row)?;

        let rows = sqlx::query("SELECT * FROM task_items WHERE task_id = ? ORDER BY id")
            .bind(id)
            .fetch_all(&self.pool)
            .await?;
        let items = rows.iter().map(row_to_item).collect::<Result<Vec<_>>>()?;

        Ok((task, items))
    }

    /// List tasks with per-task item tallies, newest first.
    ///
    /// A status filter naming `committed` also matches `auto_committed`.
    pub async fn list_tasks(&self, filter: TaskFilter) -> Result<Vec<TaskSummary>> {
        let mut statuses: Vec<TaskStatus> = filter.statuses.clone();
        if statuses.contains(&TaskStatus::Committed)
            && !statuses.contains(&TaskStatus::AutoCommitted)
        {
            statuses.push(TaskStatus::AutoCommitted);
        }

        let mut qb: QueryBuilder<'_, Sqlite> = QueryBuilder::new(
            r#"
            SELECT
                t.*,
                COALESCE(SUM(CASE WHEN ti.soh IS NOT NULL AND ti.is_exact = 0
                                   AND ti.poh IS NOT NULL THEN 1 ELSE 0 END), 0)
                    AS inaccurate_count,
                COALESCE(SUM(CASE WHEN ti.soh IS NOT NULL THEN 1 ELSE 0 END), 0)
                    AS processed_count,
                COUNT(ti.id) AS total_count
            FROM tasks t
            LEFT JOIN task_items ti ON ti.task_id = t.id
            WHERE 1=1
            "#,
        );

        if let Some(department) = &filter.department {
            qb.push(" AND t.department = ").push_bind(department.clone());
        }
        if !filter.locations.is_empty() {
            qb.push(" AND t.location IN (");
            let mut sep = qb.separated(", ");
            for location in &filter.locations {
                sep.push_bind(location.clone());
            }
            qb.push(")");
        }
        if !statuses.is_empty() {
            qb.push(" AND t.status IN (");
            let mut sep = qb.separated(", ");
            for status in &statuses {
                sep.push_bind(status.as_str());
            }
            qb.push(")");
        }
        if let Some(window) = filter.created_within {
            qb.push(" AND t.created_at >= ")
                .push_bind(window.cutoff_millis(chrono::Utc::now()));
        }

        qb.push(" GROUP BY t.id ORDER BY t.created_at DESC, t.id DESC");

        let rows = qb.build().fetch_all(&self.pool).await?;
        rows.iter()
            .map(|row| {
                Ok(TaskSummary {
                    task: row_to_task(row)?,
                    inaccurate_count: row.get("inaccurate_count"),
                    processed_count: row.get("processed_count"),
                    total_count: row.get("total_count"),
                })
            })
            .collect()
    }

    // ========================================================================
    // Scan append
    // ========================================================================

    /// Append a scan event to an item, refresh its baseline, and persist the
    /// recomputed derived fields atomically.
    ///
    /// Concurrent scans of the same item are last-write-wins: physical
    /// scanning is single-actor-per-item in practice, so no version token is
    /// kept.
    pub async fn record_scan(
        &self,
        task_id: i64,
        item_id: i64,
        event: ScanEvent,
        soh: i64,
    ) -> Result<TaskItem> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query("SELECT * FROM task_items WHERE id = ? AND task_id = ?")
            .bind(item_id)
            .bind(task_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DbError::not_found(format!("Task item not found: {item_id}")))?;
        let mut item = row_to_item(&row)?;

        item.scan_history.push(event);
        item.soh = Some(soh);
        let interp = interpret_history(soh, &item.scan_history);
        item.poh = interp.poh;
        item.is_exact = interp.is_exact;

        sqlx::query(
            r#"
            UPDATE task_items
            SET scan_history = ?, soh = ?, poh = ?, is_exact = ?
            WHERE id = ?
            "#,
        )
        .bind(serde_json::to_string(&item.scan_history)?)
        .bind(item.soh)
        .bind(item.poh)
        .bind(item.is_exact)
        .bind(item_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE tasks SET updated_at = ? WHERE id = ?")
            .bind(Self::now_millis())
            .bind(task_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(item)
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Set a task's status.
    pub async fn set_task_status(&self, id: i64, status: TaskStatus) -> Result<()> {
        let result = sqlx::query("UPDATE tasks SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(Self::now_millis())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(format!("Task not found: {id}")));
        }
        Ok(())
    }

    /// Replace a task's notes array.
    pub async fn update_task_notes(&self, id: i64, notes: &[Note]) -> Result<()> {
        let result = sqlx::query("UPDATE tasks SET notes = ?, updated_at = ? WHERE id = ?")
            .bind(serde_json::to_string(notes)?)
            .bind(Self::now_millis())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(format!("Task not found: {id}")));
        }
        Ok(())
    }

    /// Hard-delete tasks; items cascade.
    pub async fn delete_tasks(&self, ids: &[i64]) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let mut qb: QueryBuilder<'_, Sqlite> = QueryBuilder::new("DELETE FROM tasks WHERE id IN (");
        let mut sep = qb.separated(", ");
        for id in ids {
            sep.push_bind(*id);
        }
        qb.push(")");

        let result = qb.build().execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    /// Soft-delete tasks (status becomes `archived`, rows retained).
    pub async fn archive_tasks(&self, ids: &[i64]) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let now = Self::now_millis();
        let mut qb: QueryBuilder<'_, Sqlite> =
            QueryBuilder::new("UPDATE tasks SET status = 'archived', updated_at = ");
        qb.push_bind(now).push(" WHERE id IN (");
        let mut sep = qb.separated(", ");
        for id in ids {
            sep.push_bind(*id);
        }
        qb.push(")");

        let result = qb.build().execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    // ========================================================================
    // Commit support
    // ========================================================================

    /// Items of a task that are candidates for the commit protocol,
    /// optionally restricted to a selection.
    pub async fn eligible_items(
        &self,
        task_id: i64,
        item_ids: Option<&[i64]>,
    ) -> Result<Vec<TaskItem>> {
        let mut qb: QueryBuilder<'_, Sqlite> = QueryBuilder::new(
            r#"
            SELECT * FROM task_items
            WHERE task_id = "#,
        );
        qb.push_bind(task_id).push(
            " AND is_committed = 0 AND is_exact = 0 \
             AND poh IS NOT NULL AND soh IS NOT NULL",
        );
        if let Some(ids) = item_ids {
            if ids.is_empty() {
                return Ok(Vec::new());
            }
            qb.push(" AND id IN (");
            let mut sep = qb.separated(", ");
            for id in ids {
                sep.push_bind(*id);
            }
            qb.push(")");
        }
        qb.push(" ORDER BY id");

        let rows = qb.build().fetch_all(&self.pool).await?;
        rows.iter().map(row_to_item).collect()
    }

    /// Mark an item as pushed to the external ledger.
    pub async fn mark_item_committed(&self, item_id: i64) -> Result<()> {
        let result = sqlx::query("UPDATE task_items SET is_committed = 1 WHERE id = ?")
            .bind(item_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(format!("Task item not found: {item_id}")));
        }
        Ok(())
    }

    /// Count of eligible items not yet committed; zero means the task may
    /// transition to a committed terminal.
    pub async fn eligible_uncommitted_count(&self, task_id: i64) -> Result<i64> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS remaining FROM task_items
            WHERE task_id = ? AND is_exact = 0 AND poh IS NOT NULL
              AND soh IS NOT NULL AND is_committed = 0
            "#,
        )
        .bind(task_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get("remaining"))
    }

    /// Count of items never scanned (used for the submit warning).
    pub async fn unscanned_count(&self, task_id: i64) -> Result<i64> {
        let row =
            sqlx::query("SELECT COUNT(*) AS unscanned FROM task_items WHERE task_id = ? AND soh IS NULL")
                .bind(task_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(row.get("unscanned"))
    }
}

fn row_to_task(row: &sqlx::sqlite::SqliteRow) -> Result<Task> {
    let status_str: String = row.get("status");
    let status = TaskStatus::parse(&status_str)
        .ok_or_else(|| DbError::invalid_state(format!("Unknown task status: {status_str}")))?;
    let notes_json: String = row.get("notes");

    Ok(Task {
        id: row.get("id"),
        task_no: row.get("task_no"),
        department: row.get("department"),
        location: row.get("location"),
        external_location_id: row.get("external_location_id"),
        status,
        filter_summary: row.get("filter_summary"),
        notes: serde_json::from_str(&notes_json)?,
        created_at: StocktakeDb::millis_to_datetime(row.get("created_at")),
        updated_at: StocktakeDb::millis_to_datetime(row.get("updated_at")),
    })
}

fn row_to_item(row: &sqlx::sqlite::SqliteRow) -> Result<TaskItem> {
    let history_json: String = row.get("scan_history");

    Ok(TaskItem {
        id: row.get("id"),
        task_id: row.get("task_id"),
        barcode: row.get("barcode"),
        name: row.get("name"),
        soh: row.get("soh"),
        scan_history: serde_json::from_str(&history_json)?,
        poh: row.get("poh"),
        is_exact: row.get("is_exact"),
        is_committed: row.get("is_committed"),
    })
}
