//! Stock aggregation engine: the only writer of materialized stock rows.
//!
//! Every mutating call computes the set of (material, warehouse) keys it
//! touches, acquires their locks in the registry's fixed order, re-reads
//! current state under lock, validates invariants, then commits the ledger
//! append and the row update as one atomic unit. Reads are plain snapshot
//! reads of the materialized rows and can never observe a half-applied
//! mutation.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockWriteGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use siteledger_catalog::{MaterialLookup, WarehouseLookup};
use siteledger_core::{MaterialId, MovementId, Page, StockError, StockResult, WarehouseId};
use siteledger_ledger::{MovementDoc, MovementFilter, MovementKind, MovementRecord, NewMovement};

use crate::locks::{LockRegistry, StockKey};
use crate::store::MovementStore;

/// One materialized stock row. Created lazily on first movement, never
/// deleted; zero-quantity rows persist as history anchors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct StockRow {
    quantity: Decimal,
    reserved: Decimal,
    last_movement_at: Option<DateTime<Utc>>,
}

/// Current stock of one (material, warehouse) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLevel {
    pub quantity: Decimal,
    pub reserved: Decimal,
    /// `quantity - reserved`; derived on read, never stored.
    pub available: Decimal,
}

impl StockLevel {
    fn of(quantity: Decimal, reserved: Decimal) -> Self {
        Self {
            quantity,
            reserved,
            available: quantity - reserved,
        }
    }
}

/// Stock row snapshot for warehouse-wide listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockSnapshot {
    pub material_id: MaterialId,
    pub warehouse_id: WarehouseId,
    pub quantity: Decimal,
    pub reserved: Decimal,
    pub available: Decimal,
    pub last_movement_at: Option<DateTime<Utc>>,
}

/// How an expense may draw on the pair's stock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExpensePolicy {
    /// Consume available stock only (`quantity - reserved`).
    #[default]
    AvailableOnly,
    /// The expense fulfils the caller's own reservation: quantity and
    /// reserved quantity decrease together. Requires `qty <= reserved`.
    FromReservation,
}

/// One line of an expense batch (write-off posting).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpenseLine {
    pub material_id: MaterialId,
    pub quantity: Decimal,
    pub price: Option<Decimal>,
    pub doc: MovementDoc,
}

/// The stock aggregator.
///
/// Owns the materialized rows exclusively: no other component may write them.
/// Write-off posting goes through [`StockLedger::apply_expense_batch`] rather
/// than touching rows itself.
#[derive(Debug)]
pub struct StockLedger<M, W, S> {
    materials: M,
    warehouses: W,
    store: S,
    rows: RwLock<HashMap<StockKey, StockRow>>,
    locks: LockRegistry,
}

impl<M, W, S> StockLedger<M, W, S>
where
    M: MaterialLookup,
    W: WarehouseLookup,
    S: MovementStore,
{
    pub fn new(materials: M, warehouses: W, store: S, max_lock_wait: Duration) -> Self {
        Self {
            materials,
            warehouses,
            store,
            rows: RwLock::new(HashMap::new()),
            locks: LockRegistry::new(max_lock_wait),
        }
    }

    /// Current stock of one pair. Never blocks on writers beyond the snapshot
    /// read; returns zero values if the pair has no activity yet.
    pub fn get_stock(&self, material_id: MaterialId, warehouse_id: WarehouseId) -> StockResult<StockLevel> {
        let rows = self
            .rows
            .read()
            .map_err(|_| StockError::storage("stock rows lock poisoned"))?;
        let row = rows
            .get(&StockKey::new(material_id, warehouse_id))
            .copied()
            .unwrap_or_default();
        Ok(StockLevel::of(row.quantity, row.reserved))
    }

    /// Snapshot of every materialized row of one warehouse, ordered by
    /// material id.
    pub fn list_for_warehouse(&self, warehouse_id: WarehouseId) -> StockResult<Vec<StockSnapshot>> {
        let rows = self
            .rows
            .read()
            .map_err(|_| StockError::storage("stock rows lock poisoned"))?;

        let mut snapshots: Vec<StockSnapshot> = rows
            .iter()
            .filter(|(key, _)| key.warehouse_id == warehouse_id)
            .map(|(key, row)| StockSnapshot {
                material_id: key.material_id,
                warehouse_id: key.warehouse_id,
                quantity: row.quantity,
                reserved: row.reserved,
                available: row.quantity - row.reserved,
                last_movement_at: row.last_movement_at,
            })
            .collect();
        snapshots.sort_by_key(|s| s.material_id);
        Ok(snapshots)
    }

    /// Movement history for one material (ledger read path).
    pub fn movement_history(
        &self,
        material_id: MaterialId,
        filter: MovementFilter,
        page: Page,
    ) -> StockResult<Vec<MovementRecord>> {
        self.store.list_by_material(material_id, filter, page)
    }

    /// Record a receipt into a warehouse. No upper bound on quantity.
    pub fn apply_receipt(
        &self,
        material_id: MaterialId,
        warehouse_id: WarehouseId,
        quantity: Decimal,
        price: Option<Decimal>,
        doc: MovementDoc,
    ) -> StockResult<MovementId> {
        let movement = NewMovement::new(
            material_id,
            MovementKind::Receipt {
                to_warehouse: warehouse_id,
            },
            quantity,
            price,
            doc,
        )?;
        self.ensure_material_active(material_id)?;
        self.ensure_warehouse_active(warehouse_id)?;

        let key = StockKey::new(material_id, warehouse_id);
        self.locks.with_keys(&[key], || {
            let mut rows = self.rows_mut()?;
            let record = self.append_one(movement)?;

            let row = rows.entry(key).or_default();
            row.quantity += record.quantity;
            row.last_movement_at = Some(record.recorded_at);

            tracing::debug!(
                material = %material_id,
                warehouse = %warehouse_id,
                quantity = %record.quantity,
                "receipt applied"
            );
            Ok(record.id)
        })
    }

    /// Record an expense from a warehouse.
    ///
    /// Under the default policy the quantity must not exceed the pair's
    /// available stock; [`ExpensePolicy::FromReservation`] lets a caller
    /// consume stock it has reserved itself.
    pub fn apply_expense(
        &self,
        material_id: MaterialId,
        warehouse_id: WarehouseId,
        quantity: Decimal,
        price: Option<Decimal>,
        policy: ExpensePolicy,
        doc: MovementDoc,
    ) -> StockResult<MovementId> {
        let movement = NewMovement::new(
            material_id,
            MovementKind::Expense {
                from_warehouse: warehouse_id,
            },
            quantity,
            price,
            doc,
        )?;
        self.ensure_material_active(material_id)?;
        self.ensure_warehouse_active(warehouse_id)?;

        let key = StockKey::new(material_id, warehouse_id);
        self.locks.with_keys(&[key], || {
            let mut rows = self.rows_mut()?;
            let current = rows.get(&key).copied().unwrap_or_default();

            match policy {
                ExpensePolicy::AvailableOnly => {
                    let available = current.quantity - current.reserved;
                    if quantity > available {
                        return Err(StockError::insufficient(quantity, available));
                    }
                }
                ExpensePolicy::FromReservation => {
                    if quantity > current.reserved {
                        return Err(StockError::insufficient(quantity, current.reserved));
                    }
                }
            }

            let record = self.append_one(movement)?;

            let row = rows.entry(key).or_default();
            row.quantity -= record.quantity;
            if policy == ExpensePolicy::FromReservation {
                row.reserved -= record.quantity;
            }
            row.last_movement_at = Some(record.recorded_at);

            tracing::debug!(
                material = %material_id,
                warehouse = %warehouse_id,
                quantity = %record.quantity,
                "expense applied"
            );
            Ok(record.id)
        })
    }

    /// Move stock between two warehouses as one logical event: one ledger
    /// entry, two row updates, all inside the same critical section.
    pub fn apply_transfer(
        &self,
        material_id: MaterialId,
        from_warehouse: WarehouseId,
        to_warehouse: WarehouseId,
        quantity: Decimal,
        price: Option<Decimal>,
        doc: MovementDoc,
    ) -> StockResult<MovementId> {
        let movement = NewMovement::new(
            material_id,
            MovementKind::Transfer {
                from_warehouse,
                to_warehouse,
            },
            quantity,
            price,
            doc,
        )?;
        self.ensure_material_active(material_id)?;
        self.ensure_warehouse_active(from_warehouse)?;
        self.ensure_warehouse_active(to_warehouse)?;

        let from_key = StockKey::new(material_id, from_warehouse);
        let to_key = StockKey::new(material_id, to_warehouse);
        self.locks.with_keys(&[from_key, to_key], || {
            let mut rows = self.rows_mut()?;
            let source = rows.get(&from_key).copied().unwrap_or_default();
            let available = source.quantity - source.reserved;
            if quantity > available {
                return Err(StockError::insufficient(quantity, available));
            }

            let record = self.append_one(movement)?;

            let from_row = rows.entry(from_key).or_default();
            from_row.quantity -= record.quantity;
            from_row.last_movement_at = Some(record.recorded_at);

            let to_row = rows.entry(to_key).or_default();
            to_row.quantity += record.quantity;
            to_row.last_movement_at = Some(record.recorded_at);

            tracing::debug!(
                material = %material_id,
                from = %from_warehouse,
                to = %to_warehouse,
                quantity = %record.quantity,
                "transfer applied"
            );
            Ok(record.id)
        })
    }

    /// Commit a batch of expenses against one warehouse, all-or-nothing.
    ///
    /// Used by write-off posting: every line is validated against a working
    /// copy of the touched rows (repeated materials draw down cumulatively)
    /// before any movement is appended. The first violation aborts the whole
    /// batch with no effect.
    pub fn apply_expense_batch(
        &self,
        warehouse_id: WarehouseId,
        lines: Vec<ExpenseLine>,
    ) -> StockResult<Vec<MovementRecord>> {
        if lines.is_empty() {
            return Err(StockError::invalid("expense batch cannot be empty"));
        }
        self.ensure_warehouse_active(warehouse_id)?;

        let mut batch = Vec::with_capacity(lines.len());
        let mut keys = Vec::with_capacity(lines.len());
        for line in lines {
            self.ensure_material_active(line.material_id)?;
            batch.push(NewMovement::new(
                line.material_id,
                MovementKind::Expense {
                    from_warehouse: warehouse_id,
                },
                line.quantity,
                line.price,
                line.doc,
            )?);
            keys.push(StockKey::new(line.material_id, warehouse_id));
        }

        self.locks.with_keys(&keys, || {
            let mut rows = self.rows_mut()?;

            let mut working: HashMap<StockKey, StockRow> = HashMap::new();
            for movement in &batch {
                let key = StockKey::new(movement.material_id, warehouse_id);
                let entry = working
                    .entry(key)
                    .or_insert_with(|| rows.get(&key).copied().unwrap_or_default());
                let available = entry.quantity - entry.reserved;
                if movement.quantity > available {
                    return Err(StockError::insufficient(movement.quantity, available));
                }
                entry.quantity -= movement.quantity;
            }

            let count = batch.len();
            let committed = self.store.append(batch)?;
            let recorded_at = committed
                .first()
                .map(|record| record.recorded_at)
                .ok_or_else(|| StockError::storage("append returned no records"))?;

            for (key, mut updated) in working {
                updated.last_movement_at = Some(recorded_at);
                rows.insert(key, updated);
            }

            tracing::debug!(warehouse = %warehouse_id, lines = count, "expense batch applied");
            Ok(committed)
        })
    }

    /// Earmark stock for approved-but-unexecuted work. Not a physical event:
    /// the ledger is untouched, but the operation shares the pair's lock with
    /// the movement paths so it cannot race a concurrent expense.
    pub fn reserve(
        &self,
        material_id: MaterialId,
        warehouse_id: WarehouseId,
        quantity: Decimal,
    ) -> StockResult<()> {
        if quantity <= Decimal::ZERO {
            return Err(StockError::invalid("reservation quantity must be positive"));
        }
        self.ensure_material_active(material_id)?;
        self.ensure_warehouse_active(warehouse_id)?;

        let key = StockKey::new(material_id, warehouse_id);
        self.locks.with_keys(&[key], || {
            let mut rows = self.rows_mut()?;
            let row = rows.entry(key).or_default();
            let available = row.quantity - row.reserved;
            if quantity > available {
                return Err(StockError::insufficient(quantity, available));
            }
            row.reserved += quantity;
            Ok(())
        })
    }

    /// Release part of a reservation.
    pub fn release(
        &self,
        material_id: MaterialId,
        warehouse_id: WarehouseId,
        quantity: Decimal,
    ) -> StockResult<()> {
        if quantity <= Decimal::ZERO {
            return Err(StockError::invalid("release quantity must be positive"));
        }
        self.ensure_material_active(material_id)?;
        self.ensure_warehouse_active(warehouse_id)?;

        let key = StockKey::new(material_id, warehouse_id);
        self.locks.with_keys(&[key], || {
            let mut rows = self.rows_mut()?;
            let row = rows.entry(key).or_default();
            if quantity > row.reserved {
                return Err(StockError::invalid(
                    "release exceeds the reserved quantity",
                ));
            }
            row.reserved -= quantity;
            Ok(())
        })
    }

    pub(crate) fn ensure_material_active(&self, id: MaterialId) -> StockResult<()> {
        match self.materials.get(id) {
            Some(material) if material.is_active => Ok(()),
            _ => Err(StockError::not_found("material", id)),
        }
    }

    pub(crate) fn ensure_warehouse_active(&self, id: WarehouseId) -> StockResult<()> {
        match self.warehouses.get(id) {
            Some(warehouse) if warehouse.is_active => Ok(()),
            _ => Err(StockError::not_found("warehouse", id)),
        }
    }

    fn rows_mut(&self) -> StockResult<RwLockWriteGuard<'_, HashMap<StockKey, StockRow>>> {
        self.rows
            .write()
            .map_err(|_| StockError::storage("stock rows lock poisoned"))
    }

    fn append_one(&self, movement: NewMovement) -> StockResult<MovementRecord> {
        let committed = self.store.append(vec![movement])?;
        committed
            .into_iter()
            .next()
            .ok_or_else(|| StockError::storage("append returned no records"))
    }
}
