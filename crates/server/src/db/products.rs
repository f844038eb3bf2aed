//! Product repository.
//!
//! `stock_quantity` is written in exactly two places: the initial value on
//! insert, and [`set_stock`], which only the stock mutator calls.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use ksurplus_core::{CategoryId, ProductId, ProductStatus, StockLevel};

use super::RepositoryError;
use crate::models::{Product, UpdateProductInput};

const PRODUCT_COLUMNS: &str = r"
    p.id, p.sku, p.name, p.brand, p.category_id, c.name AS category_name,
    p.size, p.condition_grade, p.retail_price, p.wholesale_price,
    p.stock_quantity, p.low_stock_threshold, p.status, p.created_at, p.updated_at
";

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    sku: String,
    name: String,
    brand: Option<String>,
    category_id: Option<CategoryId>,
    category_name: Option<String>,
    size: Option<String>,
    condition_grade: String,
    retail_price: Decimal,
    wholesale_price: Option<Decimal>,
    stock_quantity: i32,
    low_stock_threshold: i32,
    status: ProductStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            stock_level: StockLevel::classify(row.stock_quantity, row.low_stock_threshold),
            id: row.id,
            sku: row.sku,
            name: row.name,
            brand: row.brand,
            category_id: row.category_id,
            category_name: row.category_name,
            size: row.size,
            condition_grade: row.condition_grade,
            retail_price: row.retail_price,
            wholesale_price: row.wholesale_price,
            stock_quantity: row.stock_quantity,
            low_stock_threshold: row.low_stock_threshold,
            status: row.status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// A product row held under `FOR UPDATE` by the current transaction.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LockedProduct {
    pub id: ProductId,
    pub name: String,
    pub stock_quantity: i32,
    pub retail_price: Decimal,
    pub status: ProductStatus,
}

impl LockedProduct {
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == ProductStatus::Active
    }
}

/// Values for a new product row.
#[derive(Debug, Clone)]
pub struct NewProduct<'a> {
    pub sku: &'a str,
    pub name: &'a str,
    pub brand: Option<&'a str>,
    pub category_id: Option<CategoryId>,
    pub size: Option<&'a str>,
    pub condition_grade: &'a str,
    pub retail_price: Decimal,
    pub wholesale_price: Option<Decimal>,
    pub stock_quantity: i32,
    pub low_stock_threshold: i32,
}

// =============================================================================
// Repository
// =============================================================================

/// Read and catalogue-edit operations on products.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Active products, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_active(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            SELECT {PRODUCT_COLUMNS}
            FROM products p
            LEFT JOIN categories c ON c.id = p.category_id
            WHERE p.status = 'active'
            ORDER BY p.created_at DESC, p.id DESC
            "
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Active products that are in stock but at or below their threshold,
    /// lowest stock first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_low_stock(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            SELECT {PRODUCT_COLUMNS}
            FROM products p
            LEFT JOIN categories c ON c.id = p.category_id
            WHERE p.status = 'active'
              AND p.stock_quantity > 0
              AND p.stock_quantity <= GREATEST(p.low_stock_threshold, 1)
            ORDER BY p.stock_quantity ASC, p.name ASC
            "
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Get a product by ID, archived or not.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            SELECT {PRODUCT_COLUMNS}
            FROM products p
            LEFT JOIN categories c ON c.id = p.category_id
            WHERE p.id = $1
            "
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Update catalogue fields. Stock is never touched here.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist, or
    /// `RepositoryError::Database` if the query fails.
    pub async fn update(
        &self,
        id: ProductId,
        input: &UpdateProductInput,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE products SET
                name = COALESCE($2, name),
                brand = CASE WHEN $3::text IS NULL THEN brand ELSE NULLIF(TRIM($3), '') END,
                category_id = COALESCE($4, category_id),
                size = CASE WHEN $5::text IS NULL THEN size ELSE NULLIF(TRIM($5), '') END,
                condition_grade = COALESCE($6, condition_grade),
                retail_price = COALESCE($7, retail_price),
                wholesale_price = COALESCE($8, wholesale_price),
                low_stock_threshold = COALESCE($9, low_stock_threshold),
                updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(input.name.as_deref().map(str::trim))
        .bind(input.brand.as_deref())
        .bind(input.category_id)
        .bind(input.size.as_deref())
        .bind(input.condition_grade.as_deref().map(str::trim))
        .bind(input.retail_price)
        .bind(input.wholesale_price)
        .bind(input.low_stock_threshold)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Archive a product. Archiving is idempotent.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist, or
    /// `RepositoryError::Database` if the query fails.
    pub async fn archive(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE products
            SET status = 'archived', updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

// =============================================================================
// Transactional Operations
// =============================================================================

/// Insert a product row.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` if the SKU is taken, or
/// `RepositoryError::Database` if the query fails.
pub async fn insert(
    conn: &mut PgConnection,
    product: &NewProduct<'_>,
) -> Result<ProductId, RepositoryError> {
    sqlx::query_scalar::<_, ProductId>(
        r"
        INSERT INTO products (
            sku, name, brand, category_id, size, condition_grade,
            retail_price, wholesale_price, stock_quantity, low_stock_threshold, status
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, 'active')
        RETURNING id
        ",
    )
    .bind(product.sku)
    .bind(product.name)
    .bind(product.brand)
    .bind(product.category_id)
    .bind(product.size)
    .bind(product.condition_grade)
    .bind(product.retail_price)
    .bind(product.wholesale_price)
    .bind(product.stock_quantity)
    .bind(product.low_stock_threshold)
    .fetch_one(conn)
    .await
    .map_err(|e| {
        if super::is_unique_violation(&e) {
            RepositoryError::Conflict(format!("sku {} already exists", product.sku))
        } else {
            RepositoryError::Database(e)
        }
    })
}

/// Lock a product row for the rest of the transaction.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn lock(
    conn: &mut PgConnection,
    id: ProductId,
) -> Result<Option<LockedProduct>, RepositoryError> {
    let row = sqlx::query_as::<_, LockedProduct>(
        r"
        SELECT id, name, stock_quantity, retail_price, status
        FROM products
        WHERE id = $1
        FOR UPDATE
        ",
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;

    Ok(row)
}

/// Overwrite the stock of a product locked by the current transaction.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails (including the
/// `stock_quantity >= 0` check constraint).
pub async fn set_stock(
    conn: &mut PgConnection,
    id: ProductId,
    new_stock: i32,
) -> Result<(), RepositoryError> {
    sqlx::query(
        r"
        UPDATE products
        SET stock_quantity = $2, updated_at = NOW()
        WHERE id = $1
        ",
    )
    .bind(id)
    .bind(new_stock)
    .execute(conn)
    .await?;

    Ok(())
}
