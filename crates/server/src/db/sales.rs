//! Sales order repository.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use ksurplus_core::{
    CategoryId, CustomerId, OrderStatus, ProductId, SaleTotals, SalesOrderId, SalesOrderItemId,
    UserId,
};

use super::RepositoryError;
use crate::models::customer::display_name;
use crate::models::sales::WALK_IN_CUSTOMER;
use crate::models::{SalesOrder, SalesOrderItem};

#[derive(Debug, sqlx::FromRow)]
struct SalesOrderRow {
    id: SalesOrderId,
    order_number: String,
    customer_id: Option<CustomerId>,
    customer_first_name: Option<String>,
    customer_last_name: Option<String>,
    customer_email: Option<String>,
    customer_phone: Option<String>,
    total_amount: Decimal,
    amount_paid: Decimal,
    change_amount: Decimal,
    status: String,
    payment_status: String,
    notes: Option<String>,
    created_by: Option<UserId>,
    ordered_at: DateTime<Utc>,
}

impl SalesOrderRow {
    fn into_order(self, items: Vec<SalesOrderItem>) -> SalesOrder {
        let customer_name = self
            .customer_first_name
            .as_deref()
            .map(|first| display_name(first, self.customer_last_name.as_deref().unwrap_or_default()))
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| WALK_IN_CUSTOMER.to_string());

        SalesOrder {
            id: self.id,
            order_number: self.order_number,
            customer_id: self.customer_id,
            customer_name,
            customer_email: self.customer_email,
            customer_phone: self.customer_phone,
            total_amount: self.total_amount,
            amount_paid: self.amount_paid,
            change_amount: self.change_amount,
            status: self.status,
            payment_status: self.payment_status,
            notes: self.notes,
            created_by: self.created_by,
            ordered_at: self.ordered_at,
            items,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SalesOrderItemRow {
    id: SalesOrderItemId,
    sales_order_id: SalesOrderId,
    product_id: ProductId,
    product_name: String,
    quantity: i32,
    unit_price: Decimal,
    category_id: Option<CategoryId>,
    category_name: String,
}

impl From<SalesOrderItemRow> for SalesOrderItem {
    fn from(row: SalesOrderItemRow) -> Self {
        Self {
            id: row.id,
            product_id: row.product_id,
            product_name: row.product_name,
            quantity: row.quantity,
            unit_price: row.unit_price,
            category_id: row.category_id,
            category_name: row.category_name,
        }
    }
}

/// Values for a new sales order row.
#[derive(Debug, Clone)]
pub struct NewSalesOrder<'a> {
    pub order_number: &'a str,
    pub customer_id: Option<CustomerId>,
    pub totals: &'a SaleTotals,
    pub status: OrderStatus,
    pub notes: Option<&'a str>,
    pub created_by: Option<UserId>,
}

/// Read access to sales orders.
pub struct SalesRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SalesRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Most recent orders with their items.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_orders(&self, limit: i64) -> Result<Vec<SalesOrder>, RepositoryError> {
        let orders = sqlx::query_as::<_, SalesOrderRow>(
            r"
            SELECT
                so.id, so.order_number, so.customer_id,
                c.first_name AS customer_first_name, c.last_name AS customer_last_name,
                c.email AS customer_email, c.phone AS customer_phone,
                so.total_amount, so.amount_paid, so.change_amount,
                so.status, so.payment_status, so.notes, so.created_by, so.ordered_at
            FROM sales_orders so
            LEFT JOIN customers c ON c.id = so.customer_id
            ORDER BY so.ordered_at DESC, so.id DESC
            LIMIT $1
            ",
        )
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        if orders.is_empty() {
            return Ok(Vec::new());
        }

        let order_ids: Vec<i32> = orders.iter().map(|o| o.id.get()).collect();
        let items = sqlx::query_as::<_, SalesOrderItemRow>(
            r"
            SELECT
                i.id, i.sales_order_id, i.product_id, p.name AS product_name,
                i.quantity, i.unit_price,
                p.category_id, COALESCE(c.name, 'Uncategorized') AS category_name
            FROM sales_order_items i
            JOIN products p ON p.id = i.product_id
            LEFT JOIN categories c ON c.id = p.category_id
            WHERE i.sales_order_id = ANY($1)
            ORDER BY i.id
            ",
        )
        .bind(&order_ids)
        .fetch_all(self.pool)
        .await?;

        let mut items_by_order: HashMap<SalesOrderId, Vec<SalesOrderItem>> = HashMap::new();
        for item in items {
            items_by_order
                .entry(item.sales_order_id)
                .or_default()
                .push(item.into());
        }

        Ok(orders
            .into_iter()
            .map(|order| {
                let items = items_by_order.remove(&order.id).unwrap_or_default();
                order.into_order(items)
            })
            .collect())
    }
}

/// Insert a sales order header.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` on an order number collision, or
/// `RepositoryError::Database` if the query fails.
pub async fn insert_order(
    conn: &mut PgConnection,
    order: &NewSalesOrder<'_>,
) -> Result<SalesOrderId, RepositoryError> {
    sqlx::query_scalar::<_, SalesOrderId>(
        r"
        INSERT INTO sales_orders (
            order_number, customer_id, total_amount, amount_paid, change_amount,
            status, payment_status, notes, created_by
        )
        VALUES ($1, $2, $3, $4, $5, $6, $6, $7, $8)
        RETURNING id
        ",
    )
    .bind(order.order_number)
    .bind(order.customer_id)
    .bind(order.totals.total_amount)
    .bind(order.totals.amount_paid)
    .bind(order.totals.change_amount)
    .bind(order.status.as_str())
    .bind(order.notes)
    .bind(order.created_by)
    .fetch_one(conn)
    .await
    .map_err(|e| {
        if super::is_unique_violation(&e) {
            RepositoryError::Conflict("order number already exists".to_string())
        } else {
            RepositoryError::Database(e)
        }
    })
}

/// Insert one line item.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn insert_item(
    conn: &mut PgConnection,
    order_id: SalesOrderId,
    product_id: ProductId,
    totals: &SaleTotals,
) -> Result<SalesOrderItemId, RepositoryError> {
    let id = sqlx::query_scalar::<_, SalesOrderItemId>(
        r"
        INSERT INTO sales_order_items (sales_order_id, product_id, quantity, unit_price)
        VALUES ($1, $2, $3, $4)
        RETURNING id
        ",
    )
    .bind(order_id)
    .bind(product_id)
    .bind(totals.quantity)
    .bind(totals.unit_price)
    .fetch_one(conn)
    .await?;

    Ok(id)
}
