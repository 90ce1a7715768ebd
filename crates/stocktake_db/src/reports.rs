//! Zero-quantity report database operations.

use sqlx::{QueryBuilder, Row, Sqlite};
use stocktake_core::ReportStatus;

use crate::error::{DbError, Result};
use crate::types::*;
use crate::StocktakeDb;

impl StocktakeDb {
    /// Materialize submitted draft entries as `reviewing` report rows.
    pub async fn insert_reports(&self, entries: &[NewReportEntry]) -> Result<Vec<i64>> {
        let now = Self::now_millis();
        let mut tx = self.pool.begin().await?;
        let mut ids = Vec::with_capacity(entries.len());

        for entry in entries {
            let result = sqlx::query(
                r#"
                INSERT INTO zero_qty_reports
                    (barcode, name, department, location, external_location_id,
                     soh, poh, status, submitted_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, 'reviewing', ?)
                "#,
            )
            .bind(&entry.barcode)
            .bind(&entry.name)
            .bind(&entry.department)
            .bind(&entry.location)
            .bind(&entry.external_location_id)
            .bind(entry.soh)
            .bind(entry.poh)
            .bind(now)
            .execute(&mut *tx)
            .await?;

            ids.push(result.last_insert_rowid());
        }

        tx.commit().await?;
        Ok(ids)
    }

    /// Get a single report entry.
    pub async fn get_report(&self, id: i64) -> Result<ZeroQtyReport> {
        let row = sqlx::query("SELECT * FROM zero_qty_reports WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found(format!("Report not found: {id}")))?;

        row_to_report(&row)
    }

    /// List report entries, newest submission first.
    pub async fn list_reports(&self, filter: ReportFilter) -> Result<Vec<ZeroQtyReport>> {
        let mut qb: QueryBuilder<'_, Sqlite> =
            QueryBuilder::new("SELECT * FROM zero_qty_reports WHERE 1=1");

        if let Some(department) = &filter.department {
            qb.push(" AND department = ").push_bind(department.clone());
        }
        if !filter.locations.is_empty() {
            qb.push(" AND location IN (");
            let mut sep = qb.separated(", ");
            for location in &filter.locations {
                sep.push_bind(location.clone());
            }
            qb.push(")");
        }
        if !filter.statuses.is_empty() {
            qb.push(" AND status IN (");
            let mut sep = qb.separated(", ");
            for status in &filter.statuses {
                sep.push_bind(status.as_str());
            }
            qb.push(")");
        }
        if let Some(window) = filter.submitted_within {
            qb.push(" AND submitted_at >= ")
                .push_bind(window.cutoff_millis(chrono::Utc::now()));
        }

        qb.push(" ORDER BY submitted_at DESC, id DESC");

        let rows = qb.build().fetch_all(&self.pool).await?;
        rows.iter().map(row_to_report).collect()
    }

    /// Mark a report committed, stamping the commit time.
    pub async fn mark_report_committed(&self, id: i64) -> Result<()> {
        let result = sqlx::query(
            "UPDATE zero_qty_reports SET status = 'committed', committed_at = ? WHERE id = ?",
        )
        .bind(Self::now_millis())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(format!("Report not found: {id}")));
        }
        Ok(())
    }

    /// Hard-delete report entries.
    pub async fn delete_reports(&self, ids: &[i64]) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let mut qb: QueryBuilder<'_, Sqlite> =
            QueryBuilder::new("DELETE FROM zero_qty_reports WHERE id IN (");
        let mut sep = qb.separated(", ");
        for id in ids {
            sep.push_bind(*id);
        }
        qb.push(")");

        let result = qb.build().execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    /// Soft-delete report entries.
    pub async fn archive_reports(&self, ids: &[i64]) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let mut qb: QueryBuilder<'_, Sqlite> =
            QueryBuilder::new("UPDATE zero_qty_reports SET status = 'archived' WHERE id IN (");
        let mut sep = qb.separated(", ");
        for id in ids {
            sep.push_bind(*id);
        }
        qb.push(")");

        let result = qb.build().execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}

fn row_to_report(row: &sqlx::sqlite::SqliteRow) -> Result<ZeroQtyReport> {
    let status_str: String = row.get("status");
    let status = ReportStatus::parse(&status_str)
        .ok_or_else(|| DbError::invalid_state(format!("Unknown report status: {status_str}")))?;

    Ok(ZeroQtyReport {
        id: row.get("id"),
        barcode: row.get("barcode"),
        name: row.get("name"),
        department: row.get("department"),
        location: row.get("location"),
        external_location_id: row.get("external_location_id"),
        soh: row.get("soh"),
        poh: row.get("poh"),
        status,
        submitted_at: StocktakeDb::millis_to_datetime(row.get("submitted_at")),
        committed_at: row
            .get::<Option<i64>, _>("committed_at")
            .map(StocktakeDb::millis_to_datetime),
    })
}
