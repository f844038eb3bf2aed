//! KSurplus Core - Shared domain types.
//!
//! This crate provides the types used across all KSurplus components:
//! - `server` - REST + WebSocket backend for the storefront and admin console
//! - `cli` - Command-line tools for migrations and seeding
//!
//! # Architecture
//!
//! The core crate contains only types and pure policy logic - no I/O, no
//! database access, no HTTP. This keeps it lightweight and allows the same
//! rules (status transitions, stock levels, daily quota, sale totals) to be
//! checked anywhere.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, statuses, movement reasons, emails, money
//! - [`codes`] - Human-readable reservation codes and order numbers
//! - [`quota`] - Daily reservation policy
//! - [`events`] - Realtime event catalogue

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod codes;
pub mod events;
pub mod quota;
pub mod types;

pub use events::RealtimeEvent;
pub use quota::{DailyLimitExceeded, DailyReservationPolicy};
pub use types::*;
