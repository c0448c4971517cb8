use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use siteledger_core::{Entity, MaterialId, StockError, StockResult};

/// Material category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaterialCategory {
    Material,
    Equipment,
    Tool,
    Consumable,
    Other,
}

/// Caller-supplied attributes for a new catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMaterial {
    pub code: String,
    pub name: String,
    pub category: MaterialCategory,
    pub unit: String,
    pub specification: Option<String>,
    pub standard_price: Option<Decimal>,
    pub notes: Option<String>,
}

/// Catalog entry for a trackable material.
///
/// `code` is unique and immutable. Once a material is referenced by a
/// movement it is never deleted; `deactivate` retires it instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Material {
    pub id: MaterialId,
    pub code: String,
    pub name: String,
    pub category: MaterialCategory,
    pub unit: String,
    pub specification: Option<String>,
    pub standard_price: Option<Decimal>,
    pub is_active: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Material {
    pub(crate) fn create(id: MaterialId, new: NewMaterial, now: DateTime<Utc>) -> StockResult<Self> {
        if new.code.trim().is_empty() {
            return Err(StockError::invalid("material code cannot be empty"));
        }
        if new.name.trim().is_empty() {
            return Err(StockError::invalid("material name cannot be empty"));
        }
        if new.unit.trim().is_empty() {
            return Err(StockError::invalid("material unit cannot be empty"));
        }
        if let Some(price) = new.standard_price {
            if price < Decimal::ZERO {
                return Err(StockError::invalid("standard price cannot be negative"));
            }
        }

        Ok(Self {
            id,
            code: new.code,
            name: new.name,
            category: new.category,
            unit: new.unit,
            specification: new.specification,
            standard_price: new.standard_price,
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

impl Entity for Material {
    type Id = MaterialId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
