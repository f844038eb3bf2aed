//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                          - Liveness
//! GET  /health/ready                    - Database readiness
//! GET  /ws                              - Realtime WebSocket
//!
//! # Catalogue
//! GET    /api/products                  - Active products
//! GET    /api/products/low-stock        - Products running low
//! GET    /api/products/{id}             - Product detail
//! POST   /api/products                  - Create product
//! PUT    /api/products/{id}             - Update product (not stock)
//! DELETE /api/products/{id}             - Archive product
//! POST   /api/products/{id}/decrease-stock
//! GET    /api/categories                - Categories
//! POST   /api/categories                - Get-or-create category
//! POST   /api/customers                 - Upsert customer
//!
//! # Ledger
//! GET  /api/inventory/movements         - Movements (?product_id, ?category_id, ?limit)
//! POST /api/inventory/movements         - Record movement (idempotent on transaction_id)
//!
//! # Reservations
//! GET  /api/reservations                - Reservations (?customer_id)
//! GET  /api/reservations/quota          - Daily quota (?customer_id, ?date)
//! GET  /api/reservations/{id}           - Reservation detail
//! POST /api/reservations                - Create reservation
//! PUT  /api/reservations/{id}/status    - Change status
//!
//! # Sales
//! GET  /api/sales/orders                - Sales orders (?limit)
//! POST /api/sales/orders                - Create sale
//! ```

pub mod customers;
pub mod health;
pub mod inventory;
pub mod products;
pub mod reservations;
pub mod sales;

use axum::{
    Router,
    extract::FromRequest,
    extract::FromRequestParts,
    routing::{get, post, put},
};

use crate::error::AppError;
use crate::realtime::ws;
use crate::state::AppState;

/// JSON body extractor whose rejections are JSON errors too.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Query string extractor whose rejections are JSON errors too.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

/// Create the product and category routes router.
pub fn catalogue_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(products::index).post(products::create))
        .route("/products/low-stock", get(products::low_stock))
        .route(
            "/products/{id}",
            get(products::show)
                .put(products::update)
                .delete(products::archive),
        )
        .route("/products/{id}/decrease-stock", post(products::decrease_stock))
        .route(
            "/categories",
            get(products::categories).post(products::create_category),
        )
        .route("/customers", post(customers::upsert))
}

/// Create the inventory ledger routes router.
pub fn inventory_routes() -> Router<AppState> {
    Router::new().route(
        "/movements",
        get(inventory::list_movements).post(inventory::record_movement),
    )
}

/// Create the reservation routes router.
pub fn reservation_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(reservations::index).post(reservations::create))
        .route("/quota", get(reservations::quota))
        .route("/{id}", get(reservations::show))
        .route("/{id}/status", put(reservations::update_status))
}

/// Create the sales routes router.
pub fn sales_routes() -> Router<AppState> {
    Router::new().route("/orders", get(sales::index).post(sales::create))
}

/// All `/api` routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(catalogue_routes())
        .nest("/inventory", inventory_routes())
        .nest("/reservations", reservation_routes())
        .nest("/sales", sales_routes())
}

/// Routes outside `/api`: health checks and the WebSocket.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .route("/ws", get(ws::handler))
}
