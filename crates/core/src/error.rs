//! Domain error model.

use rust_decimal::Decimal;
use thiserror::Error;

/// Result type used across the inventory core.
pub type StockResult<T> = Result<T, StockError>;

/// Typed error returned by every core operation.
///
/// Every rejected operation carries a variant describing exactly why; the core
/// never logs and aborts silently. The HTTP layer owns the mapping to status
/// codes and user-facing messages.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StockError {
    /// A referenced material/warehouse/write-off does not exist or is inactive.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Malformed request (zero/negative quantity, source = target warehouse,
    /// over-release of a reservation, posting an already-posted write-off).
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// The requested quantity exceeds what the (material, warehouse) pair can
    /// currently supply under the operation's policy.
    #[error("insufficient stock: required {required}, available {available}")]
    InsufficientStock { required: Decimal, available: Decimal },

    /// Lock contention exceeded its bound. No partial state was applied;
    /// callers may retry with backoff.
    #[error("busy: lock wait exceeded its bound")]
    Busy,

    /// Persistence failure inside the commit phase. The whole atomic unit was
    /// rolled back.
    #[error("storage failure: {0}")]
    Storage(String),
}

impl StockError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidOperation(msg.into())
    }

    pub fn insufficient(required: Decimal, available: Decimal) -> Self {
        Self::InsufficientStock {
            required,
            available,
        }
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }
}
