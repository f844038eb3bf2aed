//! Counter sale models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use ksurplus_core::{
    CategoryId, CustomerId, ProductId, SalesOrderId, SalesOrderItemId, UserId, exceeds_max_amount,
};

use super::CustomerDetails;
use crate::inventory::InventoryError;

/// Default and maximum number of orders returned by the listing.
pub const DEFAULT_ORDER_LIMIT: i64 = 50;
pub const MAX_ORDER_LIMIT: i64 = 200;

/// Customer name shown for orders without a customer.
pub const WALK_IN_CUSTOMER: &str = "Walk-in Customer";

/// A sales order with its line items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesOrder {
    pub id: SalesOrderId,
    pub order_number: String,
    pub customer_id: Option<CustomerId>,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub total_amount: Decimal,
    pub amount_paid: Decimal,
    pub change_amount: Decimal,
    pub status: String,
    pub payment_status: String,
    pub notes: Option<String>,
    pub created_by: Option<UserId>,
    pub ordered_at: DateTime<Utc>,
    pub items: Vec<SalesOrderItem>,
}

/// One line of a sales order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesOrderItem {
    pub id: SalesOrderItemId,
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub category_id: Option<CategoryId>,
    pub category_name: String,
}

/// Body of `POST /api/sales/orders`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateSaleInput {
    #[serde(default)]
    pub customer: Option<CustomerDetails>,
    pub product_id: ProductId,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
    /// Defaults to the product's retail price.
    #[serde(default)]
    pub unit_price: Option<Decimal>,
    /// Cash tendered; defaults to the exact total.
    #[serde(default)]
    pub amount_paid: Option<Decimal>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub created_by: Option<UserId>,
}

const fn default_quantity() -> i32 {
    1
}

impl CreateSaleInput {
    /// Checks that need no database access.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for a non-positive quantity, an out-of-range
    /// `amount_paid` or a malformed email, and `InvalidPrice` for an explicit
    /// price that is not positive or too large to store.
    pub fn validate(&self) -> Result<(), InventoryError> {
        if self.quantity <= 0 {
            return Err(InventoryError::Validation(
                "quantity must be greater than zero".to_string(),
            ));
        }
        if self
            .unit_price
            .is_some_and(|p| p <= Decimal::ZERO || exceeds_max_amount(p))
        {
            return Err(InventoryError::InvalidPrice);
        }
        if self.amount_paid.is_some_and(|p| p < Decimal::ZERO) {
            return Err(InventoryError::Validation(
                "amount_paid cannot be negative".to_string(),
            ));
        }
        if self.amount_paid.is_some_and(exceeds_max_amount) {
            return Err(InventoryError::Validation(
                "amount_paid is too large".to_string(),
            ));
        }
        if let Some(customer) = &self.customer {
            customer.email()?;
        }
        Ok(())
    }
}

/// Result of creating a sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedSale {
    pub order_id: SalesOrderId,
    pub order_number: String,
    pub total_amount: Decimal,
    pub amount_paid: Decimal,
    pub change_amount: Decimal,
    pub new_stock: i32,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_quantity_defaults_to_one() {
        let input: CreateSaleInput =
            serde_json::from_value(serde_json::json!({"product_id": 3})).unwrap();
        assert_eq!(input.quantity, 1);
        assert!(input.customer.is_none());
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_validate() {
        let input = CreateSaleInput {
            product_id: ProductId::new(3),
            quantity: 0,
            ..CreateSaleInput::default()
        };
        assert!(matches!(input.validate(), Err(InventoryError::Validation(_))));

        let input = CreateSaleInput {
            product_id: ProductId::new(3),
            quantity: 2,
            unit_price: Some(Decimal::new(-1, 0)),
            ..CreateSaleInput::default()
        };
        assert!(matches!(input.validate(), Err(InventoryError::InvalidPrice)));
    }

    #[test]
    fn test_validate_rejects_amounts_beyond_column() {
        let input = CreateSaleInput {
            product_id: ProductId::new(3),
            quantity: 2,
            unit_price: Some(Decimal::MAX),
            ..CreateSaleInput::default()
        };
        assert!(matches!(input.validate(), Err(InventoryError::InvalidPrice)));

        let input = CreateSaleInput {
            product_id: ProductId::new(3),
            unit_price: Some(Decimal::new(10, 0)),
            amount_paid: Some(ksurplus_core::MAX_AMOUNT + Decimal::ONE),
            ..CreateSaleInput::default()
        };
        assert!(matches!(input.validate(), Err(InventoryError::Validation(_))));

        let input = CreateSaleInput {
            product_id: ProductId::new(3),
            unit_price: Some(ksurplus_core::MAX_AMOUNT),
            amount_paid: Some(ksurplus_core::MAX_AMOUNT),
            ..CreateSaleInput::default()
        };
        assert!(input.validate().is_ok());
    }
}
