//! Append-only movement persistence.

use std::sync::{Arc, RwLock};

use chrono::Utc;

use siteledger_core::{MaterialId, MovementId, Page, StockError, StockResult};
use siteledger_ledger::{MovementFilter, MovementRecord, NewMovement};

/// Append-only movement store.
///
/// `append` commits a whole batch atomically; there are no update or delete
/// operations. It is only called from inside the stock engine's locked
/// section, which is what keeps the ledger and the materialized rows
/// consistent. The ledger is never replayed lazily.
pub trait MovementStore: Send + Sync {
    /// Commit a batch of movements, assigning ids and sequence numbers.
    /// All-or-nothing: a failed append leaves no entry behind.
    fn append(&self, batch: Vec<NewMovement>) -> StockResult<Vec<MovementRecord>>;

    /// Movement history for one material, ordered by movement date then
    /// insertion order, paginated.
    fn list_by_material(
        &self,
        material_id: MaterialId,
        filter: MovementFilter,
        page: Page,
    ) -> StockResult<Vec<MovementRecord>>;
}

impl<S> MovementStore for Arc<S>
where
    S: MovementStore + ?Sized,
{
    fn append(&self, batch: Vec<NewMovement>) -> StockResult<Vec<MovementRecord>> {
        (**self).append(batch)
    }

    fn list_by_material(
        &self,
        material_id: MaterialId,
        filter: MovementFilter,
        page: Page,
    ) -> StockResult<Vec<MovementRecord>> {
        (**self).list_by_material(material_id, filter, page)
    }
}

/// In-memory append-only movement store.
///
/// Intended for tests/dev and as the reference semantics for a database-backed
/// implementation. Not optimized for performance.
#[derive(Debug, Default)]
pub struct InMemoryMovementStore {
    records: RwLock<Vec<MovementRecord>>,
}

impl InMemoryMovementStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of committed entries (test support).
    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl MovementStore for InMemoryMovementStore {
    fn append(&self, batch: Vec<NewMovement>) -> StockResult<Vec<MovementRecord>> {
        if batch.is_empty() {
            return Ok(vec![]);
        }

        let mut records = self
            .records
            .write()
            .map_err(|_| StockError::storage("movement store lock poisoned"))?;

        let recorded_at = Utc::now();
        let mut next = records.len() as u64 + 1;
        let mut committed = Vec::with_capacity(batch.len());
        for movement in batch {
            let record = MovementRecord {
                id: MovementId::new(),
                sequence: next,
                material_id: movement.material_id,
                kind: movement.kind,
                quantity: movement.quantity,
                price: movement.price,
                amount: movement.amount(),
                doc: movement.doc,
                recorded_at,
            };
            next += 1;
            records.push(record.clone());
            committed.push(record);
        }

        Ok(committed)
    }

    fn list_by_material(
        &self,
        material_id: MaterialId,
        filter: MovementFilter,
        page: Page,
    ) -> StockResult<Vec<MovementRecord>> {
        let records = self
            .records
            .read()
            .map_err(|_| StockError::storage("movement store lock poisoned"))?;

        let mut matching: Vec<MovementRecord> = records
            .iter()
            .filter(|r| r.material_id == material_id && filter.matches(r))
            .cloned()
            .collect();

        matching.sort_by_key(|r| (r.doc.movement_date, r.sequence));
        Ok(page.slice(&matching))
    }
}
