//! Lifecycle statuses for counting tasks and zero-quantity reports.
//!
//! Display metadata lives here with the enum, so call sites never
//! string-match statuses to pick labels or badge tones.

use serde::{Deserialize, Serialize};

/// Display metadata for a status badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusDisplay {
    pub label: &'static str,
    pub tone: &'static str,
}

/// Status of a counting task.
///
/// `AutoCommitted` is an alternate terminal reached when a commit clears
/// every flagged item without the task ever being submitted for review; for
/// querying purposes it is equivalent to `Committed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Draft,
    Counting,
    Reviewing,
    Committed,
    AutoCommitted,
    Archived,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Counting => "counting",
            Self::Reviewing => "reviewing",
            Self::Committed => "committed",
            Self::AutoCommitted => "auto_committed",
            Self::Archived => "archived",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "draft" => Some(Self::Draft),
            "counting" => Some(Self::Counting),
            "reviewing" => Some(Self::Reviewing),
            "committed" => Some(Self::Committed),
            "auto_committed" => Some(Self::AutoCommitted),
            "archived" => Some(Self::Archived),
            _ => None,
        }
    }

    /// Terminal states in which every flagged item has been pushed to the
    /// external ledger.
    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Committed | Self::AutoCommitted)
    }

    pub fn display(&self) -> StatusDisplay {
        match self {
            Self::Draft => StatusDisplay {
                label: "Draft",
                tone: "info",
            },
            Self::Counting => StatusDisplay {
                label: "Counting",
                tone: "attention",
            },
            Self::Reviewing => StatusDisplay {
                label: "Reviewing",
                tone: "warning",
            },
            Self::Committed => StatusDisplay {
                label: "Committed",
                tone: "success",
            },
            Self::AutoCommitted => StatusDisplay {
                label: "Auto committed",
                tone: "success",
            },
            Self::Archived => StatusDisplay {
                label: "Archived",
                tone: "subdued",
            },
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Status of a zero-quantity report entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Reviewing,
    Committed,
    Archived,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reviewing => "reviewing",
            Self::Committed => "committed",
            Self::Archived => "archived",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "reviewing" => Some(Self::Reviewing),
            "committed" => Some(Self::Committed),
            "archived" => Some(Self::Archived),
            _ => None,
        }
    }

    pub fn display(&self) -> StatusDisplay {
        match self {
            Self::Reviewing => StatusDisplay {
                label: "Reviewing",
                tone: "warning",
            },
            Self::Committed => StatusDisplay {
                label: "Committed",
                tone: "success",
            },
            Self::Archived => StatusDisplay {
                label: "Archived",
                tone: "subdued",
            },
        }
    }
}

impl std::fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
