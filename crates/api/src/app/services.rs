use std::sync::Arc;
use std::time::Duration;

use siteledger_catalog::{MaterialCatalog, WarehouseRegistry};
use siteledger_stock::{InMemoryMovementStore, StockLedger, WriteOffProcessor};

/// Concrete engine wiring used by the HTTP layer.
pub type AppStockLedger =
    StockLedger<Arc<MaterialCatalog>, Arc<WarehouseRegistry>, Arc<InMemoryMovementStore>>;
pub type AppWriteOffProcessor =
    WriteOffProcessor<Arc<MaterialCatalog>, Arc<WarehouseRegistry>, Arc<InMemoryMovementStore>>;

/// Application services shared by all handlers.
pub struct AppServices {
    pub materials: Arc<MaterialCatalog>,
    pub warehouses: Arc<WarehouseRegistry>,
    pub stock: Arc<AppStockLedger>,
    pub write_offs: AppWriteOffProcessor,
}

/// Wire the in-memory stores into one service bundle.
pub fn build_services(max_lock_wait: Duration) -> AppServices {
    let materials = Arc::new(MaterialCatalog::new());
    let warehouses = Arc::new(WarehouseRegistry::new());
    let store = Arc::new(InMemoryMovementStore::new());

    let stock = Arc::new(StockLedger::new(
        materials.clone(),
        warehouses.clone(),
        store,
        max_lock_wait,
    ));
    let write_offs = WriteOffProcessor::new(stock.clone());

    AppServices {
        materials,
        warehouses,
        stock,
        write_offs,
    }
}
