//! Task-number allocation against the singleton counter row.
//!
//! Allocation runs inside the caller's transaction - the same transaction
//! that inserts the task rows - so a failed insert rolls the counter back
//! with it.

use sqlx::{Row, Sqlite, Transaction};
use stocktake_core::TaskCounter;

use crate::error::{DbError, Result};

/// Advance the counter and return the next task number.
///
/// The first statement is a write on the counter row, so this transaction
/// holds SQLite's write lock before the value is read back. Concurrent
/// creators serialize here; no two allocations ever observe the same value.
pub(crate) async fn allocate_task_no(tx: &mut Transaction<'_, Sqlite>) -> Result<String> {
    sqlx::query("UPDATE task_counter SET last_number = last_number WHERE id = 1")
        .execute(&mut **tx)
        .await?;

    let row = sqlx::query("SELECT last_number, last_letter FROM task_counter WHERE id = 1")
        .fetch_one(&mut **tx)
        .await?;

    let number: i64 = row.get("last_number");
    let letter: String = row.get("last_letter");
    let letter = letter
        .chars()
        .next()
        .ok_or_else(|| DbError::invalid_state("task counter letter is empty"))?;
    if !(0..=i64::from(stocktake_core::task_no::MAX_NUMBER)).contains(&number) {
        return Err(DbError::invalid_state(format!(
            "task counter number out of range: {number}"
        )));
    }

    let next = TaskCounter {
        letter,
        number: number as u16,
    }
    .advance();

    sqlx::query("UPDATE task_counter SET last_number = ?, last_letter = ? WHERE id = 1")
        .bind(i64::from(next.number))
        .bind(next.letter.to_string())
        .execute(&mut **tx)
        .await?;

    Ok(next.task_no())
}
