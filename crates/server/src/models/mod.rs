//! Domain models and request payloads for the server.
//!
//! # Models
//!
//! - `product` - Catalogue products and categories
//! - `customer` - Customers and inline customer details on orders
//! - `movement` - Stock ledger rows and movement requests
//! - `reservation` - Reservations and the daily quota view
//! - `sales` - Counter sales orders

pub mod customer;
pub mod movement;
pub mod product;
pub mod reservation;
pub mod sales;

pub use customer::{Customer, CustomerDetails};
pub use movement::{
    DecreaseStockInput, Movement, MovementDetails, MovementFilter, RecordMovementInput,
    RecordedMovement, StockUpdated,
};
pub use product::{Category, CreateProductInput, Product, UpdateProductInput};
pub use reservation::{
    CreateReservationInput, CreatedReservation, DailyQuota, Reservation, UpdateReservationStatus,
};
pub use sales::{CreateSaleInput, CreatedSale, SalesOrder, SalesOrderItem};
