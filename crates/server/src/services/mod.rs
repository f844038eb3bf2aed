//! Business logic services.
//!
//! # Services
//!
//! - `customers` - Customer resolution for orders, and customer upsert
//! - `inventory` - Ledger movements with realtime announcements
//! - `products` - Catalogue, categories, and the decrease-stock endpoint
//! - `reservations` - Reservation creation, status changes, daily quota
//! - `sales` - Counter sales orders
//!
//! Every mutating operation runs in one transaction and broadcasts only
//! after it has committed.

pub mod customers;
pub mod inventory;
pub mod products;
pub mod reservations;
pub mod sales;

pub use customers::{CustomerService, resolve_customer};
pub use inventory::InventoryService;
pub use products::ProductService;
pub use reservations::ReservationService;
pub use sales::SalesService;
