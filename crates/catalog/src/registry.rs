//! In-memory registries for reference data.
//!
//! Registries enforce code uniqueness on create and serve lock-free-ish
//! snapshot reads; the stock engine consumes them through the lookup traits.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::Utc;

use siteledger_core::{MaterialId, Page, StockError, StockResult, WarehouseId};

use crate::material::{Material, NewMaterial};
use crate::warehouse::{NewWarehouse, Warehouse};

/// Read-only material access used by the stock engine for validation joins.
pub trait MaterialLookup: Send + Sync {
    fn get(&self, id: MaterialId) -> Option<Material>;
}

impl<S> MaterialLookup for Arc<S>
where
    S: MaterialLookup + ?Sized,
{
    fn get(&self, id: MaterialId) -> Option<Material> {
        (**self).get(id)
    }
}

/// Read-only warehouse access used by the stock engine for validation joins.
pub trait WarehouseLookup: Send + Sync {
    fn get(&self, id: WarehouseId) -> Option<Warehouse>;
}

impl<S> WarehouseLookup for Arc<S>
where
    S: WarehouseLookup + ?Sized,
{
    fn get(&self, id: WarehouseId) -> Option<Warehouse> {
        (**self).get(id)
    }
}

#[derive(Debug, Default)]
struct MaterialCatalogInner {
    by_id: HashMap<MaterialId, Material>,
    id_by_code: HashMap<String, MaterialId>,
}

/// In-memory material catalog.
#[derive(Debug, Default)]
pub struct MaterialCatalog {
    inner: RwLock<MaterialCatalogInner>,
}

impl MaterialCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new material. Codes are unique across the catalog.
    pub fn create(&self, new: NewMaterial) -> StockResult<Material> {
        let material = Material::create(MaterialId::new(), new, Utc::now())?;

        let mut inner = self
            .inner
            .write()
            .map_err(|_| StockError::storage("material catalog lock poisoned"))?;

        if inner.id_by_code.contains_key(&material.code) {
            return Err(StockError::invalid(format!(
                "material code '{}' already exists",
                material.code
            )));
        }

        inner.id_by_code.insert(material.code.clone(), material.id);
        inner.by_id.insert(material.id, material.clone());
        Ok(material)
    }

    pub fn get_by_code(&self, code: &str) -> Option<Material> {
        let inner = self.inner.read().ok()?;
        let id = inner.id_by_code.get(code)?;
        inner.by_id.get(id).cloned()
    }

    /// List catalog entries ordered by code (stable across pages).
    pub fn list(&self, page: Page) -> Vec<Material> {
        let inner = match self.inner.read() {
            Ok(inner) => inner,
            Err(_) => return vec![],
        };

        let mut all: Vec<Material> = inner.by_id.values().cloned().collect();
        all.sort_by(|a, b| a.code.cmp(&b.code));
        page.slice(&all)
    }

    /// Retire a material. It stays resolvable for history joins but is no
    /// longer accepted on new movements.
    pub fn deactivate(&self, id: MaterialId) -> StockResult<()> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| StockError::storage("material catalog lock poisoned"))?;

        let material = inner
            .by_id
            .get_mut(&id)
            .ok_or_else(|| StockError::not_found("material", id))?;
        material.deactivate(Utc::now());
        Ok(())
    }
}

impl MaterialLookup for MaterialCatalog {
    fn get(&self, id: MaterialId) -> Option<Material> {
        let inner = self.inner.read().ok()?;
        inner.by_id.get(&id).cloned()
    }
}

#[derive(Debug, Default)]
struct WarehouseRegistryInner {
    by_id: HashMap<WarehouseId, Warehouse>,
    id_by_code: HashMap<String, WarehouseId>,
}

/// In-memory warehouse registry.
#[derive(Debug, Default)]
pub struct WarehouseRegistry {
    inner: RwLock<WarehouseRegistryInner>,
}

impl WarehouseRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new warehouse. Codes are unique across the registry.
    pub fn create(&self, new: NewWarehouse) -> StockResult<Warehouse> {
        let warehouse = Warehouse::create(WarehouseId::new(), new, Utc::now())?;

        let mut inner = self
            .inner
            .write()
            .map_err(|_| StockError::storage("warehouse registry lock poisoned"))?;

        if inner.id_by_code.contains_key(&warehouse.code) {
            return Err(StockError::invalid(format!(
                "warehouse code '{}' already exists",
                warehouse.code
            )));
        }

        inner.id_by_code.insert(warehouse.code.clone(), warehouse.id);
        inner.by_id.insert(warehouse.id, warehouse.clone());
        Ok(warehouse)
    }

    pub fn get_by_code(&self, code: &str) -> Option<Warehouse> {
        let inner = self.inner.read().ok()?;
        let id = inner.id_by_code.get(code)?;
        inner.by_id.get(id).cloned()
    }

    /// List registry entries ordered by code (stable across pages).
    pub fn list(&self, page: Page) -> Vec<Warehouse> {
        let inner = match self.inner.read() {
            Ok(inner) => inner,
            Err(_) => return vec![],
        };

        let mut all: Vec<Warehouse> = inner.by_id.values().cloned().collect();
        all.sort_by(|a, b| a.code.cmp(&b.code));
        page.slice(&all)
    }

    pub fn deactivate(&self, id: WarehouseId) -> StockResult<()> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| StockError::storage("warehouse registry lock poisoned"))?;

        let warehouse = inner
            .by_id
            .get_mut(&id)
            .ok_or_else(|| StockError::not_found("warehouse", id))?;
        warehouse.deactivate(Utc::now());
        Ok(())
    }
}

impl WarehouseLookup for WarehouseRegistry {
    fn get(&self, id: WarehouseId) -> Option<Warehouse> {
        let inner = self.inner.read().ok()?;
        inner.by_id.get(&id).cloned()
    }
}
