//! Database schema creation for all Stocktake tables.
//!
//! All CREATE TABLE statements live here - single source of truth. DDL is
//! idempotent; there is no migration machinery.

use crate::error::Result;
use crate::StocktakeDb;
use tracing::info;

impl StocktakeDb {
    /// Ensure all tables exist.
    pub(crate) async fn ensure_schema(&self) -> Result<()> {
        self.create_task_tables().await?;
        self.create_report_tables().await?;
        self.create_counter_table().await?;
        self.create_location_map().await?;

        info!("Database schema verified");
        Ok(())
    }

    /// Counting tasks and their line items.
    async fn create_task_tables(&self) -> Result<()> {
        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS tasks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                task_no TEXT NOT NULL UNIQUE,
                department TEXT NOT NULL,
                location TEXT NOT NULL,
                external_location_id TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'draft',
                filter_summary TEXT,
                notes TEXT NOT NULL DEFAULT '[]',
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            )"#,
        )
        .execute(&self.pool)
        .await?;

        // scan_history is an append-only JSON array; poh/is_exact are caches
        // of the interpreter over (soh, scan_history).
        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS task_items (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                task_id INTEGER NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
                barcode TEXT NOT NULL,
                name TEXT,
                soh INTEGER,
                scan_history TEXT NOT NULL DEFAULT '[]',
                poh INTEGER,
                is_exact INTEGER NOT NULL DEFAULT 0,
                is_committed INTEGER NOT NULL DEFAULT 0
            )"#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_task_items_task ON task_items(task_id)")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_tasks_status ON tasks(status)")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_tasks_created ON tasks(created_at)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Standalone zero-quantity report entries.
    async fn create_report_tables(&self) -> Result<()> {
        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS zero_qty_reports (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                barcode TEXT NOT NULL,
                name TEXT,
                department TEXT,
                location TEXT NOT NULL,
                external_location_id TEXT NOT NULL,
                soh INTEGER,
                poh INTEGER,
                status TEXT NOT NULL DEFAULT 'reviewing',
                submitted_at INTEGER NOT NULL,
                committed_at INTEGER
            )"#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_reports_status ON zero_qty_reports(status)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Singleton task-number counter, seeded once.
    async fn create_counter_table(&self) -> Result<()> {
        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS task_counter (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                last_number INTEGER NOT NULL DEFAULT 0,
                last_letter TEXT NOT NULL DEFAULT 'A'
            )"#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "INSERT OR IGNORE INTO task_counter (id, last_number, last_letter) VALUES (1, 0, 'A')",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Location name -> external system id map, refreshed from the gateway.
    async fn create_location_map(&self) -> Result<()> {
        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS location_map (
                location_name TEXT PRIMARY KEY,
                external_location_id TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            )"#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
