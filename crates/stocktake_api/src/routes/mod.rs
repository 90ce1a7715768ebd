//! Route groups, one module per resource.

pub mod catalog;
pub mod reports;
pub mod tasks;

use serde::Deserialize;

/// Shared list-filter query parameters.
///
/// `location` and `status` accept comma-separated lists; the sentinel `ALL`
/// (any case) and empty segments are ignored.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ListQuery {
    pub department: Option<String>,
    pub location: Option<String>,
    pub status: Option<String>,
    pub date: Option<String>,
}

impl ListQuery {
    pub(crate) fn department(&self) -> Option<String> {
        self.department
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("ALL"))
            .map(str::to_string)
    }

    pub(crate) fn locations(&self) -> Vec<String> {
        csv_values(self.location.as_deref())
    }

    pub(crate) fn status_values(&self) -> Vec<String> {
        csv_values(self.status.as_deref())
    }

    pub(crate) fn date_window(&self) -> Option<stocktake_db::DateWindow> {
        // Unrecognized windows fall back to "no filter".
        self.date
            .as_deref()
            .and_then(stocktake_db::DateWindow::parse)
    }
}

fn csv_values(raw: Option<&str>) -> Vec<String> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("ALL"))
        .map(str::to_string)
        .collect()
}
