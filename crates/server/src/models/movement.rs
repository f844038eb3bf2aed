//! Stock ledger models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use ksurplus_core::{CategoryId, MovementId, MovementReason, ProductId, ReferenceType, UserId};

use crate::inventory::InventoryError;

/// Default and maximum page size for movement listings.
pub const DEFAULT_MOVEMENT_LIMIT: i64 = 100;
pub const MAX_MOVEMENT_LIMIT: i64 = 500;

/// Longest accepted idempotency key.
pub const MAX_TRANSACTION_ID_LEN: usize = 128;

/// A ledger row, joined with product and category names for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Movement {
    pub id: MovementId,
    pub product_id: ProductId,
    pub product_name: String,
    pub category_id: Option<CategoryId>,
    pub category_name: Option<String>,
    pub change_qty: i32,
    pub reason: MovementReason,
    pub reference_type: Option<ReferenceType>,
    pub reference_id: Option<i32>,
    pub transaction_id: Option<String>,
    pub created_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

/// What a stock change is recorded as in the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovementDetails {
    pub reason: MovementReason,
    pub reference_type: Option<ReferenceType>,
    pub reference_id: Option<i32>,
    pub created_by: Option<UserId>,
    pub transaction_id: Option<String>,
}

impl MovementDetails {
    /// A movement with only a reason.
    #[must_use]
    pub const fn new(reason: MovementReason) -> Self {
        Self {
            reason,
            reference_type: None,
            reference_id: None,
            created_by: None,
            transaction_id: None,
        }
    }

    /// Point the movement at the row that caused it.
    #[must_use]
    pub fn referencing(mut self, reference_type: ReferenceType, reference_id: i32) -> Self {
        self.reference_type = Some(reference_type);
        self.reference_id = Some(reference_id);
        self
    }

    #[must_use]
    pub const fn created_by(mut self, user: Option<UserId>) -> Self {
        self.created_by = user;
        self
    }
}

/// Body of `POST /api/inventory/movements`.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordMovementInput {
    pub product_id: ProductId,
    pub change_qty: i32,
    pub reason: String,
    #[serde(default)]
    pub reference_type: Option<String>,
    #[serde(default)]
    pub reference_id: Option<i32>,
    #[serde(default)]
    pub created_by: Option<UserId>,
    /// Client-generated idempotency key.
    #[serde(default)]
    pub transaction_id: Option<String>,
}

impl RecordMovementInput {
    /// Validate and convert into ledger details.
    ///
    /// # Errors
    ///
    /// Returns `InventoryError::Validation` for a zero quantity, a blank
    /// reason, or an oversized transaction id.
    pub fn into_details(self) -> Result<(ProductId, i32, MovementDetails), InventoryError> {
        if self.change_qty == 0 {
            return Err(InventoryError::Validation(
                "change_qty must not be zero".to_string(),
            ));
        }
        let reason = MovementReason::parse(&self.reason);
        if reason.is_blank() {
            return Err(InventoryError::Validation("reason is required".to_string()));
        }
        let transaction_id = self
            .transaction_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty());
        if transaction_id
            .as_ref()
            .is_some_and(|id| id.len() > MAX_TRANSACTION_ID_LEN)
        {
            return Err(InventoryError::Validation(format!(
                "transaction_id must be at most {MAX_TRANSACTION_ID_LEN} characters"
            )));
        }
        let reference_type = self
            .reference_type
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ReferenceType::parse);

        Ok((
            self.product_id,
            self.change_qty,
            MovementDetails {
                reason,
                reference_type,
                reference_id: self.reference_id,
                created_by: self.created_by,
                transaction_id,
            },
        ))
    }
}

/// Body of `POST /api/products/{id}/decrease-stock`.
#[derive(Debug, Clone, Deserialize)]
pub struct DecreaseStockInput {
    #[serde(default = "default_decrease_quantity")]
    pub quantity: i32,
    #[serde(default = "default_decrease_reason")]
    pub reason: String,
    /// Reservation the units were taken for, if any.
    #[serde(default)]
    pub reference_id: Option<i32>,
    #[serde(default)]
    pub created_by: Option<UserId>,
}

const fn default_decrease_quantity() -> i32 {
    1
}

fn default_decrease_reason() -> String {
    MovementReason::Reservation.as_str().to_string()
}

impl Default for DecreaseStockInput {
    fn default() -> Self {
        Self {
            quantity: default_decrease_quantity(),
            reason: default_decrease_reason(),
            reference_id: None,
            created_by: None,
        }
    }
}

impl DecreaseStockInput {
    /// Validate and convert into a quantity and ledger details.
    ///
    /// # Errors
    ///
    /// Returns `InventoryError::Validation` for a non-positive quantity or a
    /// blank reason.
    pub fn into_details(self) -> Result<(i32, MovementDetails), InventoryError> {
        if self.quantity <= 0 {
            return Err(InventoryError::Validation(
                "quantity must be greater than zero".to_string(),
            ));
        }
        let reason = MovementReason::parse(&self.reason);
        if reason.is_blank() {
            return Err(InventoryError::Validation("reason is required".to_string()));
        }

        let mut details = MovementDetails::new(reason).created_by(self.created_by);
        if let Some(reference_id) = self.reference_id {
            details = details.referencing(ReferenceType::Reservation, reference_id);
        }
        Ok((self.quantity, details))
    }
}

/// Response of `POST /api/products/{id}/decrease-stock`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockUpdated {
    pub success: bool,
    #[serde(rename = "newStock")]
    pub new_stock: i32,
}

/// Result of recording a movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedMovement {
    pub id: MovementId,
    /// The transaction id had already been recorded; nothing was written.
    pub duplicate: bool,
    /// Product stock after the movement; absent for duplicates.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_stock: Option<i32>,
}

/// Query parameters of `GET /api/inventory/movements`.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct MovementFilter {
    pub product_id: Option<ProductId>,
    pub category_id: Option<CategoryId>,
    pub limit: Option<i64>,
}

impl MovementFilter {
    /// Requested page size, clamped to `1..=MAX_MOVEMENT_LIMIT`.
    #[must_use]
    pub fn limit(&self) -> i64 {
        self.limit
            .unwrap_or(DEFAULT_MOVEMENT_LIMIT)
            .clamp(1, MAX_MOVEMENT_LIMIT)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn input(change_qty: i32, reason: &str, transaction_id: Option<&str>) -> RecordMovementInput {
        RecordMovementInput {
            product_id: ProductId::new(1),
            change_qty,
            reason: reason.to_string(),
            reference_type: Some("sales_order".to_string()),
            reference_id: Some(7),
            created_by: None,
            transaction_id: transaction_id.map(String::from),
        }
    }

    #[test]
    fn test_into_details() {
        let (product_id, qty, details) = input(-2, "damage", Some(" tx-1 ")).into_details().unwrap();
        assert_eq!(product_id, ProductId::new(1));
        assert_eq!(qty, -2);
        assert_eq!(details.reason, MovementReason::Damage);
        assert_eq!(details.reference_type, Some(ReferenceType::SalesOrder));
        assert_eq!(details.transaction_id.as_deref(), Some("tx-1"));
    }

    #[test]
    fn test_rejects_zero_quantity_and_blank_reason() {
        assert!(matches!(
            input(0, "adjustment", None).into_details(),
            Err(InventoryError::Validation(_))
        ));
        assert!(matches!(
            input(3, "   ", None).into_details(),
            Err(InventoryError::Validation(_))
        ));
    }

    #[test]
    fn test_blank_transaction_id_is_absent() {
        let (_, _, details) = input(1, "restock", Some("  ")).into_details().unwrap();
        assert!(details.transaction_id.is_none());
    }

    #[test]
    fn test_rejects_oversized_transaction_id() {
        let long = "x".repeat(MAX_TRANSACTION_ID_LEN + 1);
        assert!(input(1, "restock", Some(&long)).into_details().is_err());
    }

    #[test]
    fn test_filter_limit_clamped() {
        assert_eq!(MovementFilter::default().limit(), 100);
        let filter = MovementFilter {
            limit: Some(10_000),
            ..MovementFilter::default()
        };
        assert_eq!(filter.limit(), 500);
        let filter = MovementFilter {
            limit: Some(0),
            ..MovementFilter::default()
        };
        assert_eq!(filter.limit(), 1);
    }

    #[test]
    fn test_decrease_stock_defaults() {
        let input: DecreaseStockInput = serde_json::from_str("{}").unwrap();
        let (quantity, details) = input.into_details().unwrap();
        assert_eq!(quantity, 1);
        assert_eq!(details.reason, MovementReason::Reservation);
        assert!(details.reference_type.is_none());

        let input = DecreaseStockInput {
            quantity: 0,
            ..DecreaseStockInput::default()
        };
        assert!(matches!(input.into_details(), Err(InventoryError::Validation(_))));
    }

    #[test]
    fn test_decrease_stock_reference() {
        let input: DecreaseStockInput =
            serde_json::from_str(r#"{"quantity": 2, "reason": "damage", "reference_id": 9}"#)
                .unwrap();
        let (quantity, details) = input.into_details().unwrap();
        assert_eq!(quantity, 2);
        assert_eq!(details.reason, MovementReason::Damage);
        assert_eq!(details.reference_type, Some(ReferenceType::Reservation));
        assert_eq!(details.reference_id, Some(9));
    }

    #[test]
    fn test_stock_updated_wire_name() {
        let body = StockUpdated {
            success: true,
            new_stock: 4,
        };
        assert_eq!(
            serde_json::to_value(body).unwrap(),
            serde_json::json!({"success": true, "newStock": 4})
        );
    }

    #[test]
    fn test_duplicate_omits_new_stock() {
        let recorded = RecordedMovement {
            id: MovementId::new(5),
            duplicate: true,
            new_stock: None,
        };
        assert_eq!(
            serde_json::to_value(recorded).unwrap(),
            serde_json::json!({"id": 5, "duplicate": true})
        );
    }
}
