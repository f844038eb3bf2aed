//! Catalogue management.
//!
//! Products are created with their opening stock recorded as an `initial`
//! movement, edited without touching stock, and archived instead of deleted.

use sqlx::{Acquire, PgPool};
use tracing::instrument;

use ksurplus_core::{MovementReason, ProductId, RealtimeEvent, codes};

use crate::db::{CategoryRepository, ProductRepository, RepositoryError, categories, products};
use crate::inventory::{InventoryError, decrease_stock, increase_stock};
use crate::models::{
    Category, CreateProductInput, DecreaseStockInput, MovementDetails, Product, UpdateProductInput,
};
use crate::realtime::Broadcaster;

const DEFAULT_CONDITION: &str = "New";
const DEFAULT_LOW_STOCK_THRESHOLD: i32 = 5;
/// Attempts at generating an unused SKU.
const SKU_ATTEMPTS: usize = 3;

/// Product and category operations.
pub struct ProductService<'a> {
    pool: &'a PgPool,
    events: &'a Broadcaster,
}

impl<'a> ProductService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, events: &'a Broadcaster) -> Self {
        Self { pool, events }
    }

    /// Active products, newest first.
    ///
    /// # Errors
    ///
    /// Returns `InventoryError::Repository` if the query fails.
    pub async fn list(&self) -> Result<Vec<Product>, InventoryError> {
        Ok(ProductRepository::new(self.pool).list_active().await?)
    }

    /// Active products that are running low but not yet out.
    ///
    /// # Errors
    ///
    /// Returns `InventoryError::Repository` if the query fails.
    pub async fn low_stock(&self) -> Result<Vec<Product>, InventoryError> {
        Ok(ProductRepository::new(self.pool).list_low_stock().await?)
    }

    /// # Errors
    ///
    /// Returns `InventoryError::ProductNotFound` if there is no such product.
    pub async fn get(&self, id: ProductId) -> Result<Product, InventoryError> {
        ProductRepository::new(self.pool)
            .get(id)
            .await?
            .ok_or(InventoryError::ProductNotFound(id))
    }

    /// All categories by name.
    ///
    /// # Errors
    ///
    /// Returns `InventoryError::Repository` if the query fails.
    pub async fn categories(&self) -> Result<Vec<Category>, InventoryError> {
        Ok(CategoryRepository::new(self.pool).list().await?)
    }

    /// Return the category called `name`, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns `InventoryError::Validation` for a blank name.
    pub async fn get_or_create_category(&self, name: &str) -> Result<Category, InventoryError> {
        if name.trim().is_empty() {
            return Err(InventoryError::Validation(
                "category name is required".to_string(),
            ));
        }
        Ok(CategoryRepository::new(self.pool).get_or_create(name).await?)
    }

    /// Create a product, recording its opening stock in the ledger.
    ///
    /// # Errors
    ///
    /// Returns `InventoryError::Validation` or `InventoryError::InvalidPrice`
    /// for bad input, and `InventoryError::Repository` if a query fails.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create(&self, input: CreateProductInput) -> Result<Product, InventoryError> {
        input.validate()?;

        let mut tx = self.pool.begin().await?;

        let category_id = match input.category_name() {
            Some(name) => Some(categories::get_or_create(&mut *tx, name).await?.id),
            None => input.category_id,
        };
        let condition_grade = input
            .condition_grade
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(DEFAULT_CONDITION);

        let mut attempt = 0;
        let id = loop {
            attempt += 1;
            let sku = codes::sku();
            let new_product = products::NewProduct {
                sku: &sku,
                name: input.name.trim(),
                brand: trimmed(input.brand.as_deref()),
                category_id,
                size: trimmed(input.size.as_deref()),
                condition_grade,
                retail_price: input.retail_price,
                wholesale_price: input.wholesale_price,
                stock_quantity: 0,
                low_stock_threshold: input
                    .low_stock_threshold
                    .unwrap_or(DEFAULT_LOW_STOCK_THRESHOLD),
            };
            // A failed statement aborts the transaction, so retries need a savepoint
            let mut savepoint = tx.begin().await?;
            match products::insert(&mut *savepoint, &new_product).await {
                Ok(id) => {
                    savepoint.commit().await?;
                    break id;
                }
                Err(RepositoryError::Conflict(_)) if attempt < SKU_ATTEMPTS => {
                    savepoint.rollback().await?;
                    tracing::warn!(sku = %sku, "SKU collision, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        };

        if input.stock_quantity > 0 {
            let details = MovementDetails::new(MovementReason::Initial).created_by(input.created_by);
            increase_stock(&mut *tx, id, input.stock_quantity, &details).await?;
        }

        tx.commit().await?;
        tracing::info!(product_id = %id, stock = input.stock_quantity, "Product created");

        self.events.broadcast_all(&[
            RealtimeEvent::ProductCreated { id },
            RealtimeEvent::InventoryUpdated,
        ]);

        self.get(id).await
    }

    /// Update catalogue fields of a product. Stock cannot be set here.
    ///
    /// # Errors
    ///
    /// Returns `InventoryError::Validation` or `InventoryError::InvalidPrice`
    /// for bad input, and `InventoryError::ProductNotFound` if there is no
    /// such product.
    #[instrument(skip(self, input))]
    pub async fn update(
        &self,
        id: ProductId,
        input: &UpdateProductInput,
    ) -> Result<Product, InventoryError> {
        input.validate()?;

        ProductRepository::new(self.pool)
            .update(id, input)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => InventoryError::ProductNotFound(id),
                other => other.into(),
            })?;

        self.events.broadcast_all(&[
            RealtimeEvent::ProductUpdated { id },
            RealtimeEvent::InventoryUpdated,
        ]);

        self.get(id).await
    }

    /// Archive a product so it no longer shows in the catalogue.
    ///
    /// # Errors
    ///
    /// Returns `InventoryError::ProductNotFound` if there is no such product.
    #[instrument(skip(self))]
    pub async fn archive(&self, id: ProductId) -> Result<(), InventoryError> {
        ProductRepository::new(self.pool)
            .archive(id)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => InventoryError::ProductNotFound(id),
                other => other.into(),
            })?;

        tracing::info!(product_id = %id, "Product archived");
        self.events.broadcast_all(&[
            RealtimeEvent::ProductDeleted { id },
            RealtimeEvent::InventoryUpdated,
        ]);
        Ok(())
    }

    /// Take units out of stock through the stock mutator.
    ///
    /// Returns the new stock level.
    ///
    /// # Errors
    ///
    /// Returns `InventoryError::ProductNotFound`,
    /// `InventoryError::InsufficientStock`, or `InventoryError::Validation`.
    #[instrument(skip(self, input))]
    pub async fn decrease_stock(
        &self,
        id: ProductId,
        input: DecreaseStockInput,
    ) -> Result<i32, InventoryError> {
        let (quantity, details) = input.into_details()?;

        let mut tx = self.pool.begin().await?;
        let change = decrease_stock(&mut *tx, id, quantity, &details).await?;
        tx.commit().await?;

        self.events.broadcast_all(&[
            RealtimeEvent::InventoryUpdated,
            RealtimeEvent::StockChanged {
                id,
                new_stock: change.new_stock,
            },
        ]);

        Ok(change.new_stock)
    }
}

fn trimmed(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}
