//! Location name -> external system id map.
//!
//! Refreshed from the gateway's location enumeration; consumed at task
//! creation and report submission to resolve the target location.

use std::collections::HashMap;

use sqlx::Row;

use crate::error::Result;
use crate::StocktakeDb;

impl StocktakeDb {
    /// Upsert location mappings from the external system.
    pub async fn sync_locations(&self, locations: &[(String, String)]) -> Result<()> {
        let now = Self::now_millis();
        let mut tx = self.pool.begin().await?;

        for (name, external_id) in locations {
            sqlx::query(
                r#"
                INSERT INTO location_map (location_name, external_location_id, updated_at)
                VALUES (?, ?, ?)
                ON CONFLICT (location_name)
                DO UPDATE SET external_location_id = excluded.external_location_id,
                              updated_at = excluded.updated_at
                "#,
            )
            .bind(name)
            .bind(external_id)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// The full location map.
    pub async fn location_map(&self) -> Result<HashMap<String, String>> {
        let rows = sqlx::query("SELECT location_name, external_location_id FROM location_map")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .iter()
            .map(|row| (row.get("location_name"), row.get("external_location_id")))
            .collect())
    }
}
