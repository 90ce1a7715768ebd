//! HTTP surface for the Stocktake counting reconciliation engine.
//!
//! Route handlers stay thin: persistence lives in `stocktake_db`, the pure
//! counting semantics in `stocktake_core`, and external-ledger access behind
//! the `stocktake_gateway` trait. The commit protocol in [`commit`] is the
//! one place the three meet.

pub mod commit;
pub mod error;
pub mod router;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use router::router;
pub use state::AppState;
