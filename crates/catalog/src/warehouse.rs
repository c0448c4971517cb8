use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use siteledger_core::{Entity, StockError, StockResult, WarehouseId};

/// Caller-supplied attributes for a new warehouse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewWarehouse {
    pub code: String,
    pub name: String,
    pub location: Option<String>,
    pub responsible: Option<String>,
    pub notes: Option<String>,
}

/// Named storage location.
///
/// Same deletion policy as [`crate::Material`]: deactivated, never removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warehouse {
    pub id: WarehouseId,
    pub code: String,
    pub name: String,
    pub location: Option<String>,
    pub responsible: Option<String>,
    pub is_active: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Warehouse {
    pub(crate) fn create(id: WarehouseId, new: NewWarehouse, now: DateTime<Utc>) -> StockResult<Self> {
        if new.code.trim().is_empty() {
            return Err(StockError::invalid("warehouse code cannot be empty"));
        }
        if new.name.trim().is_empty() {
            return Err(StockError::invalid("warehouse name cannot be empty"));
        }

        Ok(Self {
            id,
            code: new.code,
            name: new.name,
            location: new.location,
            responsible: new.responsible,
            is_active: true,
            notes: new.notes,
            created_at: now,
            updated_at: None,
        })
    }

    pub(crate) fn deactivate(&mut self, now: DateTime<Utc>) {
        self.is_active = false;
        self.updated_at = Some(now);
    }
}

impl Entity for Warehouse {
    type Id = WarehouseId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
