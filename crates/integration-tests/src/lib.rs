//! Integration test harness for KSurplus.
//!
//! # Running Tests
//!
//! ```bash
//! export KSURPLUS_TEST_DATABASE_URL=postgres://localhost/ksurplus_test
//! cargo test -p ksurplus-integration-tests -- --ignored
//! ```
//!
//! Migrations are applied on first connect. Tests share the database, so
//! every test creates its own products and customers with unique names and
//! only asserts on rows it created.

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use rust_decimal::Decimal;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use ksurplus_core::{CustomerId, DailyReservationPolicy, ProductId};
use ksurplus_server::config::ServerConfig;
use ksurplus_server::db::{MovementRepository, ProductRepository};
use ksurplus_server::models::{CreateProductInput, Customer, CustomerDetails};
use ksurplus_server::realtime::Broadcaster;
use ksurplus_server::services::{
    CustomerService, InventoryService, ProductService, ReservationService, SalesService,
};
use ksurplus_server::state::AppState;

/// Environment variable naming the test database.
pub const TEST_DATABASE_URL: &str = "KSURPLUS_TEST_DATABASE_URL";

/// A migrated database plus a broadcaster for observing events.
pub struct TestContext {
    pub pool: PgPool,
    pub events: Broadcaster,
}

impl TestContext {
    /// Connect to the test database and apply migrations.
    pub async fn new() -> Self {
        let url = std::env::var(TEST_DATABASE_URL)
            .unwrap_or_else(|_| panic!("{TEST_DATABASE_URL} must be set"));
        // Tests run in parallel, each with its own pool
        let pool = PgPoolOptions::new()
            .max_connections(4)
            .connect(&url)
            .await
            .expect("Failed to connect to test database");
        sqlx::migrate!("../server/migrations")
            .run(&pool)
            .await
            .expect("Failed to run migrations");

        Self {
            pool,
            events: Broadcaster::new(64),
        }
    }

    #[must_use]
    pub const fn products(&self) -> ProductService<'_> {
        ProductService::new(&self.pool, &self.events)
    }

    #[must_use]
    pub const fn inventory(&self) -> InventoryService<'_> {
        InventoryService::new(&self.pool, &self.events)
    }

    #[must_use]
    pub const fn sales(&self) -> SalesService<'_> {
        SalesService::new(&self.pool, &self.events)
    }

    /// Reservation service enforcing a daily limit of `limit`.
    #[must_use]
    pub fn reservations(&self, limit: u32) -> ReservationService<'_> {
        ReservationService::new(
            &self.pool,
            &self.events,
            DailyReservationPolicy::new(limit),
            true,
        )
    }

    /// Create an active product with `stock` units at `price`.
    pub async fn create_product(&self, stock: i32, price: Decimal) -> ProductId {
        let product = self
            .products()
            .create(CreateProductInput {
                name: unique("Test Product"),
                brand: None,
                category: Some("Integration".to_string()),
                category_id: None,
                size: None,
                condition_grade: None,
                retail_price: price,
                wholesale_price: None,
                stock_quantity: stock,
                low_stock_threshold: None,
                created_by: None,
            })
            .await
            .expect("Failed to create product");
        product.id
    }

    /// Create a customer with a unique email.
    pub async fn create_customer(&self) -> Customer {
        CustomerService::new(&self.pool, &self.events)
            .upsert(&CustomerDetails {
                name: Some("Test Customer".to_string()),
                email: Some(format!("{}@example.test", Uuid::new_v4().simple())),
                ..CustomerDetails::default()
            })
            .await
            .expect("Failed to create customer")
    }

    /// Current stock of a product.
    pub async fn stock(&self, id: ProductId) -> i32 {
        ProductRepository::new(&self.pool)
            .get(id)
            .await
            .unwrap()
            .expect("product exists")
            .stock_quantity
    }

    /// Sum of all ledger movements for a product.
    pub async fn ledger_total(&self, id: ProductId) -> i64 {
        MovementRepository::new(&self.pool)
            .net_change(id)
            .await
            .unwrap()
    }

    /// Number of ledger rows for a product.
    pub async fn movement_count(&self, id: ProductId) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM inventory_movements WHERE product_id = $1")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }

    /// Number of reservations for a product.
    pub async fn reservation_count(&self, id: ProductId) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM reservations WHERE product_id = $1")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }

    /// Number of sales order lines for a product.
    pub async fn sale_item_count(&self, id: ProductId) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM sales_order_items WHERE product_id = $1")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }

    /// Assert that stock equals the sum of the product's ledger.
    pub async fn assert_ledger_matches(&self, id: ProductId) {
        let stock = self.stock(id).await;
        let total = self.ledger_total(id).await;
        assert_eq!(i64::from(stock), total, "stock and ledger disagree for {id}");
    }

    /// Application state for driving the HTTP router.
    #[must_use]
    pub fn app_state(&self) -> AppState {
        let url = std::env::var(TEST_DATABASE_URL).unwrap();
        let config = ServerConfig::from_lookup(|key| match key {
            "KSURPLUS_DATABASE_URL" => Some(url.clone()),
            "KSURPLUS_RATE_LIMIT" => Some("false".to_string()),
            _ => None,
        })
        .unwrap();
        AppState::new(config, self.pool.clone())
    }
}

/// `prefix` with a random suffix.
#[must_use]
pub fn unique(prefix: &str) -> String {
    format!("{prefix} {}", Uuid::new_v4().simple())
}

/// Shorthand for whole-unit prices.
#[must_use]
pub fn price(units: i64) -> Decimal {
    Decimal::new(units, 0)
}

/// Customer details referencing an existing customer.
#[must_use]
pub fn existing_customer(id: CustomerId) -> CustomerDetails {
    CustomerDetails {
        customer_id: Some(id),
        ..CustomerDetails::default()
    }
}
