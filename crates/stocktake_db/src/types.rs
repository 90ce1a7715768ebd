//! Persisted entities for the counting reconciliation engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stocktake_core::{ReportStatus, ScanEvent, TaskStatus};

/// A free-text note attached to a counting task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// A counting task: one row per (creation request, target location).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: i64,
    pub task_no: String,
    pub department: String,
    pub location: String,
    /// External system's id for `location`, resolved at creation time.
    pub external_location_id: String,
    pub status: TaskStatus,
    pub filter_summary: Option<String>,
    pub notes: Vec<Note>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A catalog entry being counted within a task.
///
/// `poh` and `is_exact` are caches of the interpreter output over
/// `(soh, scan_history)`; they are recomputed on every scan append and never
/// written independently.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskItem {
    pub id: i64,
    pub task_id: i64,
    pub barcode: String,
    pub name: Option<String>,
    /// Baseline stock-on-hand; null until the first scan cycle reads it.
    pub soh: Option<i64>,
    pub scan_history: Vec<ScanEvent>,
    /// Physical on hand, derived from the scan history.
    pub poh: Option<i64>,
    pub is_exact: bool,
    pub is_committed: bool,
}

impl TaskItem {
    /// Candidate for the commit protocol: counted, off from baseline, and
    /// not yet pushed to the external ledger.
    pub fn is_eligible(&self) -> bool {
        !self.is_exact && self.poh.is_some() && self.soh.is_some() && !self.is_committed
    }

    /// Relative adjustment to apply on commit.
    pub fn delta(&self) -> Option<i64> {
        Some(self.poh? - self.soh?)
    }
}

/// A task list row with per-task item tallies.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSummary {
    #[serde(flatten)]
    pub task: Task,
    /// Items counted off from baseline.
    pub inaccurate_count: i64,
    /// Items with at least one scan cycle.
    pub processed_count: i64,
    pub total_count: i64,
}

/// A standalone zero-quantity report entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZeroQtyReport {
    pub id: i64,
    pub barcode: String,
    pub name: Option<String>,
    pub department: Option<String>,
    pub location: String,
    pub external_location_id: String,
    pub soh: Option<i64>,
    pub poh: Option<i64>,
    pub status: ReportStatus,
    pub submitted_at: DateTime<Utc>,
    pub committed_at: Option<DateTime<Utc>>,
}

impl ZeroQtyReport {
    pub fn delta(&self) -> Option<i64> {
        Some(self.poh? - self.soh?)
    }
}

/// Payload for creating tasks; fans out to one task row per location.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub department: String,
    pub locations: Vec<String>,
    pub filter_summary: Option<String>,
    pub notes: Vec<Note>,
    pub publish: bool,
    pub items: Vec<NewTaskItem>,
}

#[derive(Debug, Clone)]
pub struct NewTaskItem {
    pub barcode: String,
    pub name: Option<String>,
}

/// Payload for materializing a zero-quantity report entry.
#[derive(Debug, Clone)]
pub struct NewReportEntry {
    pub barcode: String,
    pub name: Option<String>,
    pub department: Option<String>,
    pub location: String,
    pub external_location_id: String,
    pub soh: Option<i64>,
    pub poh: Option<i64>,
}

/// Relative creation-date window for list filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateWindow {
    Today,
    Last7Days,
    Last30Days,
}

impl DateWindow {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "today" => Some(Self::Today),
            "7days" => Some(Self::Last7Days),
            "30days" => Some(Self::Last30Days),
            _ => None,
        }
    }

    /// Inclusive lower bound in millis, relative to `now`.
    pub fn cutoff_millis(&self, now: DateTime<Utc>) -> i64 {
        let days = match self {
            Self::Today => 1,
            Self::Last7Days => 7,
            Self::Last30Days => 30,
        };
        (now - chrono::Duration::days(days)).timestamp_millis()
    }
}

/// Filter for listing tasks.
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub department: Option<String>,
    pub locations: Vec<String>,
    pub statuses: Vec<TaskStatus>,
    pub created_within: Option<DateWindow>,
}

/// Filter for listing zero-quantity reports.
#[derive(Debug, Clone, Default)]
pub struct ReportFilter {
    pub department: Option<String>,
    pub locations: Vec<String>,
    pub statuses: Vec<ReportStatus>,
    pub submitted_within: Option<DateWindow>,
}
