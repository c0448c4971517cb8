//! Write-off documents: header + line items, `draft -> posted` lifecycle.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use siteledger_core::{MaterialId, MovementId, ProjectId, StockError, StockResult, WarehouseId, WriteOffId};

/// Reason a batch of materials is consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteOffReason {
    Production,
    Defect,
    Loss,
    Testing,
    Damage,
    Other,
}

/// Document lifecycle. `Posted` is terminal: a posted write-off is frozen and
/// can only be compensated by a new receipt, never edited or reversed here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteOffStatus {
    Draft,
    Posted,
}

/// Caller-supplied line item for a new draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewWriteOffLine {
    pub material_id: MaterialId,
    pub quantity: Decimal,
    pub price: Option<Decimal>,
    pub batch_number: Option<String>,
    pub notes: Option<String>,
}

/// Caller-supplied header + lines for a new draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewWriteOff {
    pub number: String,
    pub date: NaiveDate,
    pub project_id: ProjectId,
    pub warehouse_id: WarehouseId,
    pub reason: WriteOffReason,
    pub description: Option<String>,
    pub responsible: String,
    pub approved_by: Option<String>,
    pub approved_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub lines: Vec<NewWriteOffLine>,
}

/// One line of a write-off document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteOffLine {
    /// 1-based position in the document.
    pub line_number: u32,
    pub material_id: MaterialId,
    pub quantity: Decimal,
    pub price: Option<Decimal>,
    pub amount: Option<Decimal>,
    pub batch_number: Option<String>,
    pub notes: Option<String>,
    /// Expense movement produced by posting this line; `None` while draft.
    pub movement_id: Option<MovementId>,
}

/// Write-off document: a project-attributed batch consumption of stock
/// against one warehouse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteOff {
    pub id: WriteOffId,
    pub number: String,
    pub date: NaiveDate,
    pub project_id: ProjectId,
    pub warehouse_id: WarehouseId,
    pub reason: WriteOffReason,
    pub description: Option<String>,
    pub responsible: String,
    pub approved_by: Option<String>,
    pub approved_date: Option<NaiveDate>,
    pub status: WriteOffStatus,
    /// Sum of line amounts, recomputed by the core.
    pub total_amount: Decimal,
    pub notes: Option<String>,
    pub lines: Vec<WriteOffLine>,
    pub created_at: DateTime<Utc>,
    pub posted_at: Option<DateTime<Utc>>,
}

impl WriteOff {
    /// Build a draft from caller input. Validates the document shape and
    /// recomputes amounts; stock is untouched until posting.
    pub fn draft(id: WriteOffId, new: NewWriteOff, now: DateTime<Utc>) -> StockResult<Self> {
        if new.number.trim().is_empty() {
            return Err(StockError::invalid("write-off number cannot be empty"));
        }
        if new.responsible.trim().is_empty() {
            return Err(StockError::invalid("write-off responsible cannot be empty"));
        }
        if new.lines.is_empty() {
            return Err(StockError::invalid("write-off must have at least one line"));
        }

        let mut lines = Vec::with_capacity(new.lines.len());
        for (idx, line) in new.lines.into_iter().enumerate() {
            if line.quantity <= Decimal::ZERO {
                return Err(StockError::invalid(format!(
                    "write-off line {} quantity must be positive",
                    idx + 1
                )));
            }
            if let Some(price) = line.price {
                if price < Decimal::ZERO {
                    return Err(StockError::invalid(format!(
                        "write-off line {} price cannot be negative",
                        idx + 1
                    )));
                }
            }

            let amount = line.price.map(|price| price * line.quantity);
            lines.push(WriteOffLine {
                line_number: (idx + 1) as u32,
                material_id: line.material_id,
                quantity: line.quantity,
                price: line.price,
                amount,
                batch_number: line.batch_number,
                notes: line.notes,
                movement_id: None,
            });
        }

        let total_amount = Self::total_of(&lines);

        Ok(Self {
            id,
            number: new.number,
            date: new.date,
            project_id: new.project_id,
            warehouse_id: new.warehouse_id,
            reason: new.reason,
            description: new.description,
            responsible: new.responsible,
            approved_by: new.approved_by,
            approved_date: new.approved_date,
            status: WriteOffStatus::Draft,
            total_amount,
            notes: new.notes,
            lines,
            created_at: now,
            posted_at: None,
        })
    }

    pub fn is_posted(&self) -> bool {
        self.status == WriteOffStatus::Posted
    }

    /// Sum of line amounts (lines without a price contribute nothing).
    pub fn total_of(lines: &[WriteOffLine]) -> Decimal {
        lines
            .iter()
            .filter_map(|line| line.amount)
            .fold(Decimal::ZERO, |acc, amount| acc + amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn new_line(quantity: Decimal, price: Option<Decimal>) -> NewWriteOffLine {
        NewWriteOffLine {
            material_id: MaterialId::new(),
            quantity,
            price,
            batch_number: None,
            notes: None,
        }
    }

    fn new_write_off(lines: Vec<NewWriteOffLine>) -> NewWriteOff {
        NewWriteOff {
            number: "WO-17".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 4, 2).unwrap(),
            project_id: ProjectId::new(),
            warehouse_id: WarehouseId::new(),
            reason: WriteOffReason::Production,
            description: None,
            responsible: "Petrov".to_string(),
            approved_by: None,
            approved_date: None,
            notes: None,
            lines,
        }
    }

    #[test]
    fn draft_assigns_line_numbers_and_total() {
        let draft = WriteOff::draft(
            WriteOffId::new(),
            new_write_off(vec![
                new_line(dec!(2), Some(dec!(100.00))),
                new_line(dec!(5), None),
                new_line(dec!(1), Some(dec!(50.00))),
            ]),
            Utc::now(),
        )
        .unwrap();

        assert_eq!(draft.status, WriteOffStatus::Draft);
        assert_eq!(
            draft.lines.iter().map(|l| l.line_number).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert_eq!(draft.total_amount, dec!(250.00));
        assert!(draft.lines.iter().all(|l| l.movement_id.is_none()));
    }

    #[test]
    fn draft_rejects_empty_lines() {
        let err = WriteOff::draft(WriteOffId::new(), new_write_off(vec![]), Utc::now()).unwrap_err();
        assert!(matches!(err, StockError::InvalidOperation(_)));
    }

    #[test]
    fn draft_rejects_nonpositive_line_quantity() {
        let err = WriteOff::draft(
            WriteOffId::new(),
            new_write_off(vec![new_line(dec!(0), None)]),
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, StockError::InvalidOperation(_)));
    }

    #[test]
    fn draft_rejects_blank_number() {
        let mut new = new_write_off(vec![new_line(dec!(1), None)]);
        new.number = " ".to_string();
        let err = WriteOff::draft(WriteOffId::new(), new, Utc::now()).unwrap_err();
        assert!(matches!(err, StockError::InvalidOperation(_)));
    }
}
