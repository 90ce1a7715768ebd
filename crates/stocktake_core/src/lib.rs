//! Core domain for Stocktake: scan events, the reconciliation reducer,
//! lifecycle statuses and task numbering.
//!
//! Everything in this crate is pure and synchronous. The scan history is the
//! source of truth; physical-on-hand is always derived by replaying it
//! through [`interpret`], never hand-edited.

pub mod draft;
pub mod scan;
pub mod status;
pub mod task_no;

pub use draft::{DraftEntry, ZeroQtyDraft};
pub use scan::{interpret, interpret_history, Interpretation, ScanEvent};
pub use status::{ReportStatus, StatusDisplay, TaskStatus};
pub use task_no::TaskCounter;
