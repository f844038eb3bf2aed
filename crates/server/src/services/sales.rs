//! Counter sales.
//!
//! A sale order holds a single product line. The order, its item and the
//! matching `sale` movement commit together.

use chrono::Utc;
use sqlx::{Acquire, PgPool};
use tracing::instrument;

use ksurplus_core::{MovementReason, OrderStatus, RealtimeEvent, ReferenceType, SaleTotals, codes};

use super::customers::resolve_customer;
use crate::db::customers::OnExisting;
use crate::db::{RepositoryError, SalesRepository, products, sales};
use crate::inventory::{InventoryError, decrease_stock};
use crate::models::sales::{DEFAULT_ORDER_LIMIT, MAX_ORDER_LIMIT};
use crate::models::{CreateSaleInput, CreatedSale, MovementDetails, SalesOrder};
use crate::realtime::Broadcaster;

/// Attempts at generating an unused order number.
const ORDER_NUMBER_ATTEMPTS: usize = 3;

/// Sales order operations.
pub struct SalesService<'a> {
    pool: &'a PgPool,
    events: &'a Broadcaster,
}

impl<'a> SalesService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, events: &'a Broadcaster) -> Self {
        Self { pool, events }
    }

    /// Sell `quantity` units of one product.
    ///
    /// # Errors
    ///
    /// - `InventoryError::Validation` for a bad quantity, email or underpayment
    /// - `InventoryError::InvalidPrice` when no positive unit price applies
    /// - `InventoryError::ProductNotFound` for a missing or archived product
    /// - `InventoryError::InsufficientStock` when stock is short
    #[instrument(skip(self, input), fields(product_id = %input.product_id, quantity = input.quantity))]
    pub async fn create(&self, input: CreateSaleInput) -> Result<CreatedSale, InventoryError> {
        input.validate()?;
        let product_id = input.product_id;

        let mut tx = self.pool.begin().await?;

        let product = products::lock(&mut *tx, product_id)
            .await?
            .filter(products::LockedProduct::is_active)
            .ok_or(InventoryError::ProductNotFound(product_id))?;
        if product.stock_quantity < input.quantity {
            return Err(InventoryError::InsufficientStock {
                product_id,
                available: product.stock_quantity,
                requested: input.quantity,
            });
        }

        let unit_price = input.unit_price.unwrap_or(product.retail_price);
        let totals = SaleTotals::compute(unit_price, input.quantity, input.amount_paid)?;

        let details = input.customer.clone().unwrap_or_default();
        let customer_id = resolve_customer(&mut *tx, &details, OnExisting::Keep).await?;

        let notes = input
            .notes
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty());

        let today = Utc::now().date_naive();
        let mut attempt = 0;
        let (order_id, order_number) = loop {
            attempt += 1;
            let number = codes::order_number(today);
            let mut savepoint = tx.begin().await?;
            let inserted = sales::insert_order(
                &mut *savepoint,
                &sales::NewSalesOrder {
                    order_number: &number,
                    customer_id,
                    totals: &totals,
                    status: OrderStatus::Paid,
                    notes,
                    created_by: input.created_by,
                },
            )
            .await;
            match inserted {
                Ok(id) => {
                    savepoint.commit().await?;
                    break (id, number);
                }
                Err(RepositoryError::Conflict(_)) if attempt < ORDER_NUMBER_ATTEMPTS => {
                    savepoint.rollback().await?;
                    tracing::warn!(order_number = %number, "Order number collision, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        };

        sales::insert_item(&mut *tx, order_id, product_id, &totals).await?;

        let movement = MovementDetails::new(MovementReason::Sale)
            .referencing(ReferenceType::SalesOrder, order_id.get())
            .created_by(input.created_by);
        let change = decrease_stock(&mut *tx, product_id, totals.quantity, &movement).await?;

        tx.commit().await?;
        tracing::info!(
            order_id = %order_id,
            order_number = %order_number,
            total = %totals.total_amount,
            new_stock = change.new_stock,
            "Sale recorded"
        );

        self.events.broadcast_all(&[
            RealtimeEvent::SalesUpdated,
            RealtimeEvent::InventoryUpdated,
            RealtimeEvent::StockChanged {
                id: product_id,
                new_stock: change.new_stock,
            },
        ]);

        Ok(CreatedSale {
            order_id,
            order_number,
            total_amount: totals.total_amount,
            amount_paid: totals.amount_paid,
            change_amount: totals.change_amount,
            new_stock: change.new_stock,
        })
    }

    /// Most recent orders with their items, `limit` defaulting to 50.
    ///
    /// # Errors
    ///
    /// Returns `InventoryError::Repository` if a query fails.
    pub async fn list(&self, limit: Option<i64>) -> Result<Vec<SalesOrder>, InventoryError> {
        let limit = limit
            .unwrap_or(DEFAULT_ORDER_LIMIT)
            .clamp(1, MAX_ORDER_LIMIT);
        Ok(SalesRepository::new(self.pool).list_orders(limit).await?)
    }
}
