//! Movement ledger and write-off document types.
//!
//! Pure domain shapes: construction-time validation, no IO. The stock engine
//! (`siteledger-stock`) is the only writer of committed records.

pub mod movement;
pub mod write_off;

pub use movement::{MovementDoc, MovementFilter, MovementKind, MovementRecord, NewMovement};
pub use write_off::{
    NewWriteOff, NewWriteOffLine, WriteOff, WriteOffLine, WriteOffReason, WriteOffStatus,
};
