//! Catalogue models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use ksurplus_core::{
    CategoryId, ProductId, ProductStatus, StockLevel, UserId, exceeds_max_amount,
};

use crate::inventory::InventoryError;

const MAX_NAME_LEN: usize = 200;

/// A catalogue product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub sku: String,
    pub name: String,
    pub brand: Option<String>,
    pub category_id: Option<CategoryId>,
    pub category_name: Option<String>,
    pub size: Option<String>,
    pub condition_grade: String,
    pub retail_price: Decimal,
    pub wholesale_price: Option<Decimal>,
    /// Units on hand. Only the stock mutator writes this after creation.
    pub stock_quantity: i32,
    pub low_stock_threshold: i32,
    pub status: ProductStatus,
    /// Derived from `stock_quantity` and `low_stock_threshold`.
    pub stock_level: StockLevel,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

/// Payload for creating a product.
///
/// The admin console posts the short names (`price`, `stock`, `category`),
/// so those are accepted as aliases.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProductInput {
    pub name: String,
    #[serde(default)]
    pub brand: Option<String>,
    /// Category name; created if it does not exist yet.
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default, alias = "condition")]
    pub condition_grade: Option<String>,
    #[serde(alias = "price")]
    pub retail_price: Decimal,
    #[serde(default, alias = "wholesalePrice")]
    pub wholesale_price: Option<Decimal>,
    #[serde(default, alias = "stock")]
    pub stock_quantity: i32,
    #[serde(default, alias = "lowStockThreshold")]
    pub low_stock_threshold: Option<i32>,
    #[serde(default)]
    pub created_by: Option<UserId>,
}

impl CreateProductInput {
    /// Check field values before any database work.
    ///
    /// # Errors
    ///
    /// Returns `InventoryError::Validation` or `InventoryError::InvalidPrice`.
    pub fn validate(&self) -> Result<(), InventoryError> {
        validate_name(&self.name)?;
        if self.retail_price <= Decimal::ZERO || exceeds_max_amount(self.retail_price) {
            return Err(InventoryError::InvalidPrice);
        }
        if self
            .wholesale_price
            .is_some_and(|p| p < Decimal::ZERO || exceeds_max_amount(p))
        {
            return Err(InventoryError::InvalidPrice);
        }
        if self.stock_quantity < 0 {
            return Err(InventoryError::Validation(
                "stock cannot be negative".to_string(),
            ));
        }
        if self.low_stock_threshold.is_some_and(|t| t < 0) {
            return Err(InventoryError::Validation(
                "low stock threshold cannot be negative".to_string(),
            ));
        }
        Ok(())
    }

    /// Category name to get-or-create, if one was given.
    #[must_use]
    pub fn category_name(&self) -> Option<&str> {
        self.category
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}

/// Payload for updating a product. Absent fields are left unchanged; an
/// empty `brand` or `size` clears it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProductInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub condition_grade: Option<String>,
    #[serde(default)]
    pub retail_price: Option<Decimal>,
    #[serde(default)]
    pub wholesale_price: Option<Decimal>,
    #[serde(default)]
    pub low_stock_threshold: Option<i32>,
    /// Rejected: stock only changes through the ledger.
    #[serde(default)]
    pub stock_quantity: Option<i32>,
}

impl UpdateProductInput {
    /// Check field values before any database work.
    ///
    /// # Errors
    ///
    /// Returns `InventoryError::Validation` or `InventoryError::InvalidPrice`.
    pub fn validate(&self) -> Result<(), InventoryError> {
        if self.stock_quantity.is_some() {
            return Err(InventoryError::Validation(
                "stock_quantity cannot be set directly; record an inventory movement".to_string(),
            ));
        }
        if self.is_empty() {
            return Err(InventoryError::Validation(
                "no fields provided to update".to_string(),
            ));
        }
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if self
            .retail_price
            .is_some_and(|p| p <= Decimal::ZERO || exceeds_max_amount(p))
        {
            return Err(InventoryError::InvalidPrice);
        }
        if self
            .wholesale_price
            .is_some_and(|p| p < Decimal::ZERO || exceeds_max_amount(p))
        {
            return Err(InventoryError::InvalidPrice);
        }
        if self.low_stock_threshold.is_some_and(|t| t < 0) {
            return Err(InventoryError::Validation(
                "low stock threshold cannot be negative".to_string(),
            ));
        }
        Ok(())
    }

    fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.brand.is_none()
            && self.category_id.is_none()
            && self.size.is_none()
            && self.condition_grade.is_none()
            && self.retail_price.is_none()
            && self.wholesale_price.is_none()
            && self.low_stock_threshold.is_none()
    }
}

fn validate_name(name: &str) -> Result<(), InventoryError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(InventoryError::Validation("name is required".to_string()));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(InventoryError::Validation(format!(
            "name must be at most {MAX_NAME_LEN} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn create_input(json: serde_json::Value) -> CreateProductInput {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_create_accepts_console_aliases() {
        let input = create_input(serde_json::json!({
            "name": "Denim jacket",
            "price": "24.50",
            "stock": 3,
            "category": "  Outerwear ",
            "condition": "Used - Good",
            "lowStockThreshold": 2
        }));
        assert_eq!(input.retail_price, Decimal::new(2450, 2));
        assert_eq!(input.stock_quantity, 3);
        assert_eq!(input.category_name(), Some("Outerwear"));
        assert_eq!(input.condition_grade.as_deref(), Some("Used - Good"));
        assert_eq!(input.low_stock_threshold, Some(2));
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_create_rejects_bad_values() {
        let input = create_input(serde_json::json!({"name": " ", "price": 5}));
        assert!(matches!(input.validate(), Err(InventoryError::Validation(_))));

        let input = create_input(serde_json::json!({"name": "Boots", "price": 0}));
        assert!(matches!(input.validate(), Err(InventoryError::InvalidPrice)));

        let input = create_input(serde_json::json!({"name": "Boots", "price": "10000000000.00"}));
        assert!(matches!(input.validate(), Err(InventoryError::InvalidPrice)));

        let input = UpdateProductInput {
            retail_price: Some(Decimal::MAX),
            ..UpdateProductInput::default()
        };
        assert!(matches!(input.validate(), Err(InventoryError::InvalidPrice)));

        let input = create_input(serde_json::json!({"name": "Boots", "price": 5, "stock": -1}));
        assert!(matches!(input.validate(), Err(InventoryError::Validation(_))));
    }

    #[test]
    fn test_update_rejects_stock_and_empty() {
        let input = UpdateProductInput {
            stock_quantity: Some(10),
            name: Some("Boots".to_string()),
            ..UpdateProductInput::default()
        };
        assert!(matches!(input.validate(), Err(InventoryError::Validation(_))));

        assert!(matches!(
            UpdateProductInput::default().validate(),
            Err(InventoryError::Validation(_))
        ));

        let input = UpdateProductInput {
            brand: Some(String::new()),
            ..UpdateProductInput::default()
        };
        assert!(input.validate().is_ok());
    }
}
