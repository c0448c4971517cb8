use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;

use siteledger_core::{MaterialId, ProjectId, WarehouseId};
use siteledger_ledger::{MovementDoc, MovementKind};

// -------------------------
// Request DTOs
// -------------------------

/// Body of `POST /movements`. The movement kind is the tagged `type` field
/// plus its per-kind warehouse fields; amounts are recomputed by the core.
#[derive(Debug, Deserialize)]
pub struct CreateMovementRequest {
    pub material_id: MaterialId,
    #[serde(flatten)]
    pub kind: MovementKind,
    pub quantity: Decimal,
    pub price: Option<Decimal>,
    pub document_number: String,
    pub movement_date: NaiveDate,
    pub project_id: Option<ProjectId>,
    pub supplier: Option<String>,
    pub batch_number: Option<String>,
    pub responsible: Option<String>,
    pub notes: Option<String>,
    /// Authorizes an expense to consume the caller's own reservation.
    #[serde(default)]
    pub from_reservation: bool,
}

impl CreateMovementRequest {
    pub fn doc(&self) -> MovementDoc {
        MovementDoc {
            document_number: self.document_number.clone(),
            movement_date: self.movement_date,
            project_id: self.project_id,
            supplier: self.supplier.clone(),
            batch_number: self.batch_number.clone(),
            responsible: self.responsible.clone(),
            notes: self.notes.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ReservationRequest {
    pub material_id: MaterialId,
    pub warehouse_id: WarehouseId,
    pub quantity: Decimal,
}

// -------------------------
// Query DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct StockQuery {
    pub material_id: MaterialId,
    pub warehouse_id: WarehouseId,
}

#[derive(Debug, Deserialize)]
pub struct MovementHistoryQuery {
    pub material_id: MaterialId,
    pub warehouse_id: Option<WarehouseId>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct WriteOffListQuery {
    pub project_id: Option<ProjectId>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}
