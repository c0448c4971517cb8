//! Ledger entry types: one record per stock-affecting event.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use siteledger_core::{MaterialId, MovementId, ProjectId, StockError, StockResult, WarehouseId};

/// Stock-affecting event kind.
///
/// A closed tagged variant: each kind carries exactly the warehouses it
/// requires, so there is no nullable from/to pair to check ad hoc. A transfer
/// is one logical event touching two warehouses, not two rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MovementKind {
    Receipt {
        to_warehouse: WarehouseId,
    },
    Expense {
        from_warehouse: WarehouseId,
    },
    Transfer {
        from_warehouse: WarehouseId,
        to_warehouse: WarehouseId,
    },
}

impl MovementKind {
    /// Warehouse this movement draws from, if any.
    pub fn source(&self) -> Option<WarehouseId> {
        match self {
            MovementKind::Receipt { .. } => None,
            MovementKind::Expense { from_warehouse } => Some(*from_warehouse),
            MovementKind::Transfer { from_warehouse, .. } => Some(*from_warehouse),
        }
    }

    /// Warehouse this movement delivers into, if any.
    pub fn target(&self) -> Option<WarehouseId> {
        match self {
            MovementKind::Receipt { to_warehouse } => Some(*to_warehouse),
            MovementKind::Expense { .. } => None,
            MovementKind::Transfer { to_warehouse, .. } => Some(*to_warehouse),
        }
    }

    pub fn touches(&self, warehouse_id: WarehouseId) -> bool {
        self.source() == Some(warehouse_id) || self.target() == Some(warehouse_id)
    }

    pub fn label(&self) -> &'static str {
        match self {
            MovementKind::Receipt { .. } => "receipt",
            MovementKind::Expense { .. } => "expense",
            MovementKind::Transfer { .. } => "transfer",
        }
    }
}

/// Document metadata shared by all movement kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementDoc {
    pub document_number: String,
    pub movement_date: NaiveDate,
    /// Opaque project linkage, stored and returned verbatim for reporting.
    pub project_id: Option<ProjectId>,
    pub supplier: Option<String>,
    pub batch_number: Option<String>,
    pub responsible: Option<String>,
    pub notes: Option<String>,
}

/// A movement accepted for validation but not yet committed (no id/sequence).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMovement {
    pub material_id: MaterialId,
    pub kind: MovementKind,
    pub quantity: Decimal,
    pub price: Option<Decimal>,
    pub doc: MovementDoc,
}

impl NewMovement {
    /// Validate quantity, price, and the per-kind warehouse shape.
    pub fn new(
        material_id: MaterialId,
        kind: MovementKind,
        quantity: Decimal,
        price: Option<Decimal>,
        doc: MovementDoc,
    ) -> StockResult<Self> {
        if quantity <= Decimal::ZERO {
            return Err(StockError::invalid("movement quantity must be positive"));
        }
        if let Some(price) = price {
            if price < Decimal::ZERO {
                return Err(StockError::invalid("movement price cannot be negative"));
            }
        }
        if let MovementKind::Transfer {
            from_warehouse,
            to_warehouse,
        } = kind
        {
            if from_warehouse == to_warehouse {
                return Err(StockError::invalid(
                    "transfer source and target warehouses must differ",
                ));
            }
        }
        if doc.document_number.trim().is_empty() {
            return Err(StockError::invalid("document number cannot be empty"));
        }

        Ok(Self {
            material_id,
            kind,
            quantity,
            price,
            doc,
        })
    }

    /// Line amount, recomputed from quantity and price. Caller-supplied
    /// amounts are never trusted.
    pub fn amount(&self) -> Option<Decimal> {
        self.price.map(|price| price * self.quantity)
    }
}

/// A committed ledger entry. Immutable once written; the ledger exposes no
/// update or delete operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementRecord {
    pub id: MovementId,
    /// Store-assigned position. Monotonically increasing across the whole
    /// ledger; with `movement_date` it gives the stable total order history
    /// queries rely on.
    pub sequence: u64,
    pub material_id: MaterialId,
    pub kind: MovementKind,
    pub quantity: Decimal,
    pub price: Option<Decimal>,
    pub amount: Option<Decimal>,
    pub doc: MovementDoc,
    pub recorded_at: DateTime<Utc>,
}

/// Filter for movement history queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementFilter {
    /// Keep movements touching this warehouse (as source or target).
    pub warehouse_id: Option<WarehouseId>,
    /// Inclusive lower bound on movement date.
    pub date_from: Option<NaiveDate>,
    /// Inclusive upper bound on movement date.
    pub date_to: Option<NaiveDate>,
}

impl MovementFilter {
    pub fn matches(&self, record: &MovementRecord) -> bool {
        if let Some(warehouse_id) = self.warehouse_id {
            if !record.kind.touches(warehouse_id) {
                return false;
            }
        }
        if let Some(from) = self.date_from {
            if record.doc.movement_date < from {
                return false;
            }
        }
        if let Some(to) = self.date_to {
            if record.doc.movement_date > to {
                return false;
            }
        }
        true
    }
}
