//! Stock engine: materialized warehouse stock, per-key locking, movement
//! persistence, reservations, and write-off processing.
//!
//! The engine is the only writer of materialized stock rows. Every mutation
//! validates invariants and commits the ledger append plus the row update as
//! one atomic unit inside a per-(material, warehouse) critical section.

pub mod aggregator;
pub mod locks;
pub mod store;
pub mod write_off;

pub use aggregator::{ExpenseLine, ExpensePolicy, StockLedger, StockLevel, StockSnapshot};
pub use locks::{LockRegistry, StockKey};
pub use store::{InMemoryMovementStore, MovementStore};
pub use write_off::WriteOffProcessor;
