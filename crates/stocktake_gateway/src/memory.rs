//! In-memory gateway for tests.
//!
//! Mirrors the contract of the hosted platform: items resolve by barcode,
//! stock levels default to 0, adjustments are recorded, and failures or
//! throttles can be scripted per call.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{GatewayError, Result};
use crate::{department_for, InventoryGateway, InventoryLookup, Location, ResolvedItem};

/// One recorded adjustment call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedAdjustment {
    pub inventory_item_id: String,
    pub location_id: String,
    pub delta: i64,
    pub reason: String,
}

#[derive(Default)]
struct Inner {
    items: HashMap<String, ResolvedItem>,
    stock: HashMap<(String, String), i64>,
    locations: Vec<Location>,
    adjustments: Vec<RecordedAdjustment>,
    /// Remaining adjust calls to answer with `Throttled`.
    throttle_remaining: u32,
    /// Inventory item ids whose adjustments fail with a business error.
    failing_items: Vec<String>,
}

/// In-memory [`InventoryGateway`] for tests.
#[derive(Default)]
pub struct MemoryGateway {
    inner: Mutex<Inner>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a catalog item resolvable by barcode.
    pub fn add_item(&self, barcode: &str, inventory_item_id: &str, name: &str, product_type: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.items.insert(
            barcode.to_string(),
            ResolvedItem {
                inventory_item_id: inventory_item_id.to_string(),
                name: name.to_string(),
                product_type: Some(product_type.to_string()),
            },
        );
    }

    /// Set the stock level for an (item, location) pair.
    pub fn set_stock(&self, inventory_item_id: &str, location_id: &str, quantity: i64) {
        let mut inner = self.inner.lock().unwrap();
        inner
            .stock
            .insert((inventory_item_id.to_string(), location_id.to_string()), quantity);
    }

    /// Register a stock location.
    pub fn add_location(&self, id: &str, name: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.locations.push(Location {
            id: id.to_string(),
            name: name.to_string(),
        });
    }

    /// Answer the next `n` adjustment calls with a throttle.
    pub fn throttle_next(&self, n: u32) {
        self.inner.lock().unwrap().throttle_remaining = n;
    }

    /// Make adjustments against this inventory item fail with a business
    /// error.
    pub fn fail_adjustments_for(&self, inventory_item_id: &str) {
        self.inner
            .lock()
            .unwrap()
            .failing_items
            .push(inventory_item_id.to_string());
    }

    /// Adjustment calls recorded so far.
    pub fn adjustments(&self) -> Vec<RecordedAdjustment> {
        self.inner.lock().unwrap().adjustments.clone()
    }

    /// Current stock for an (item, location) pair; absent reads as 0.
    pub fn stock(&self, inventory_item_id: &str, location_id: &str) -> i64 {
        self.inner
            .lock()
            .unwrap()
            .stock
            .get(&(inventory_item_id.to_string(), location_id.to_string()))
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl InventoryGateway for MemoryGateway {
    async fn resolve_item(&self, barcode: &str) -> Result<Option<ResolvedItem>> {
        Ok(self.inner.lock().unwrap().items.get(barcode).cloned())
    }

    async fn lookup_inventory(
        &self,
        barcode: &str,
        location_id: &str,
    ) -> Result<InventoryLookup> {
        let inner = self.inner.lock().unwrap();
        let item = inner
            .items
            .get(barcode)
            .ok_or_else(|| GatewayError::NotFound(format!("No catalog entry for barcode {barcode}")))?;

        let soh = inner
            .stock
            .get(&(item.inventory_item_id.clone(), location_id.to_string()))
            .copied()
            .unwrap_or(0);

        Ok(InventoryLookup {
            barcode: barcode.to_string(),
            name: item.name.clone(),
            soh,
            department: item
                .product_type
                .as_deref()
                .and_then(department_for)
                .map(str::to_string),
            product_type: item.product_type.clone(),
            inventory_item_id: item.inventory_item_id.clone(),
        })
    }

    async fn adjust_quantity(
        &self,
        inventory_item_id: &str,
        location_id: &str,
        delta: i64,
        reason: &str,
    ) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();

        if inner.throttle_remaining > 0 {
            inner.throttle_remaining -= 1;
            return Err(GatewayError::Throttled);
        }
        if inner.failing_items.iter().any(|id| id == inventory_item_id) {
            return Err(GatewayError::Api(format!(
                "Adjustment rejected for {inventory_item_id}"
            )));
        }

        let key = (inventory_item_id.to_string(), location_id.to_string());
        *inner.stock.entry(key).or_insert(0) += delta;
        inner.adjustments.push(RecordedAdjustment {
            inventory_item_id: inventory_item_id.to_string(),
            location_id: location_id.to_string(),
            delta,
            reason: reason.to_string(),
        });

        Ok(())
    }

    async fn list_locations(&self) -> Result<Vec<Location>> {
        Ok(self.inner.lock().unwrap().locations.clone())
    }
}
