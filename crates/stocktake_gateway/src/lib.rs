//! External inventory gateway for Stocktake.
//!
//! The engine treats the external platform as the system of record for
//! stock levels. This crate defines the [`InventoryGateway`] contract, a
//! GraphQL-backed implementation for the hosted platform, and an in-memory
//! fake for tests.

mod department;
mod error;
mod memory;
mod shopify;

pub use department::department_for;
pub use error::{GatewayError, Result};
pub use memory::MemoryGateway;
pub use shopify::ShopifyGateway;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A catalog entry resolved from a scannable code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedItem {
    /// The platform's stock-item handle, target of adjustments.
    pub inventory_item_id: String,
    pub name: String,
    pub product_type: Option<String>,
}

/// A full inventory lookup for one (item, location) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryLookup {
    pub barcode: String,
    pub name: String,
    /// Current stock-on-hand at the location; absent levels read as 0.
    pub soh: i64,
    pub department: Option<String>,
    pub product_type: Option<String>,
    pub inventory_item_id: String,
}

/// A stock location known to the external platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: String,
    pub name: String,
}

/// Read/write access to the external system of record for stock levels.
///
/// Adjustments are always relative deltas, never absolute sets: an absolute
/// set would race with any stock change between the baseline read and the
/// commit.
#[async_trait]
pub trait InventoryGateway: Send + Sync + 'static {
    /// Resolve a scannable code to the platform's stock-item handle.
    ///
    /// Returns `Ok(None)` when the platform doesn't know the code.
    async fn resolve_item(&self, barcode: &str) -> Result<Option<ResolvedItem>>;

    /// Read current stock for a barcode at a location, with display fields
    /// for the scan popup. Missing inventory levels read as 0.
    async fn lookup_inventory(&self, barcode: &str, location_id: &str)
        -> Result<InventoryLookup>;

    /// Apply a relative stock adjustment. `reason` is the platform's audit
    /// tag, e.g. `correction`.
    ///
    /// Fails with [`GatewayError::Throttled`] when rate-limited so callers
    /// can back off.
    async fn adjust_quantity(
        &self,
        inventory_item_id: &str,
        location_id: &str,
        delta: i64,
        reason: &str,
    ) -> Result<()>;

    /// Enumerate the platform's stock locations.
    async fn list_locations(&self) -> Result<Vec<Location>>;
}
