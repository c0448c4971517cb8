//! Write-off processing: draft creation and atomic posting.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::Utc;

use siteledger_catalog::{MaterialLookup, WarehouseLookup};
use siteledger_core::{Page, ProjectId, StockError, StockResult, WriteOffId};
use siteledger_ledger::{MovementDoc, NewWriteOff, WriteOff, WriteOffStatus};

use crate::aggregator::{ExpenseLine, StockLedger};
use crate::store::MovementStore;

/// Composes a batch of consuming movements on behalf of a project.
///
/// Drafts have no stock effect. Posting converts every line into an expense
/// movement against the header's warehouse through
/// [`StockLedger::apply_expense_batch`]; the processor never writes stock
/// rows itself.
#[derive(Debug)]
pub struct WriteOffProcessor<M, W, S> {
    ledger: Arc<StockLedger<M, W, S>>,
    write_offs: RwLock<HashMap<WriteOffId, WriteOff>>,
}

impl<M, W, S> WriteOffProcessor<M, W, S>
where
    M: MaterialLookup,
    W: WarehouseLookup,
    S: MovementStore,
{
    pub fn new(ledger: Arc<StockLedger<M, W, S>>) -> Self {
        Self {
            ledger,
            write_offs: RwLock::new(HashMap::new()),
        }
    }

    /// Create a draft. Validates the document shape and that every line
    /// references an existing, active material; recomputes amounts. Stock is
    /// untouched.
    pub fn create_draft(&self, new: NewWriteOff) -> StockResult<WriteOff> {
        let write_off = WriteOff::draft(WriteOffId::new(), new, Utc::now())?;

        self.ledger.ensure_warehouse_active(write_off.warehouse_id)?;
        for line in &write_off.lines {
            self.ledger.ensure_material_active(line.material_id)?;
        }

        let mut write_offs = self
            .write_offs
            .write()
            .map_err(|_| StockError::storage("write-off store lock poisoned"))?;
        write_offs.insert(write_off.id, write_off.clone());
        Ok(write_off)
    }

    pub fn get(&self, id: WriteOffId) -> Option<WriteOff> {
        let write_offs = self.write_offs.read().ok()?;
        write_offs.get(&id).cloned()
    }

    /// List documents, optionally filtered by project, ordered by (date,
    /// number) for stable pages.
    pub fn list(&self, project_id: Option<ProjectId>, page: Page) -> Vec<WriteOff> {
        let write_offs = match self.write_offs.read() {
            Ok(write_offs) => write_offs,
            Err(_) => return vec![],
        };

        let mut all: Vec<WriteOff> = write_offs
            .values()
            .filter(|w| project_id.is_none_or(|p| w.project_id == p))
            .cloned()
            .collect();
        all.sort_by(|a, b| (a.date, &a.number).cmp(&(b.date, &b.number)));
        page.slice(&all)
    }

    /// Post a draft: all lines become expense movements against the header's
    /// warehouse, or none do.
    ///
    /// The document lock is held across the stock critical section, so a
    /// concurrent second post observes either the draft (and waits) or the
    /// posted terminal state, never a torn document.
    pub fn post(&self, id: WriteOffId) -> StockResult<WriteOff> {
        let mut write_offs = self
            .write_offs
            .write()
            .map_err(|_| StockError::storage("write-off store lock poisoned"))?;

        let write_off = write_offs
            .get_mut(&id)
            .ok_or_else(|| StockError::not_found("write-off", id))?;

        if write_off.status == WriteOffStatus::Posted {
            return Err(StockError::invalid("write-off is already posted"));
        }

        let lines: Vec<ExpenseLine> = write_off
            .lines
            .iter()
            .map(|line| ExpenseLine {
                material_id: line.material_id,
                quantity: line.quantity,
                price: line.price,
                doc: MovementDoc {
                    document_number: write_off.number.clone(),
                    movement_date: write_off.date,
                    project_id: Some(write_off.project_id),
                    supplier: None,
                    batch_number: line.batch_number.clone(),
                    responsible: Some(write_off.responsible.clone()),
                    notes: line.notes.clone(),
                },
            })
            .collect();

        let committed = self
            .ledger
            .apply_expense_batch(write_off.warehouse_id, lines)?;

        for (line, record) in write_off.lines.iter_mut().zip(&committed) {
            line.movement_id = Some(record.id);
        }
        write_off.total_amount = WriteOff::total_of(&write_off.lines);
        write_off.status = WriteOffStatus::Posted;
        write_off.posted_at = Some(Utc::now());

        tracing::debug!(write_off = %write_off.id, lines = committed.len(), "write-off posted");
        Ok(write_off.clone())
    }
}
