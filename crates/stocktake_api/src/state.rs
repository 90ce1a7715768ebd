//! Shared application state.

use std::sync::Arc;

use stocktake_db::StocktakeDb;
use stocktake_gateway::InventoryGateway;

/// State handed to every handler. Cheap to clone: the pool is shared and the
/// gateway sits behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub db: StocktakeDb,
    pub gateway: Arc<dyn InventoryGateway>,
}

impl AppState {
    pub fn new(db: StocktakeDb, gateway: Arc<dyn InventoryGateway>) -> Self {
        Self { db, gateway }
    }
}
