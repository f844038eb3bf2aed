//! Core types for KSurplus.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod money;
pub mod movement;
pub mod status;
pub mod stock;

pub use email::{Email, EmailError};
pub use id::*;
pub use money::{MAX_AMOUNT, SaleTotals, TotalsError, exceeds_max_amount};
pub use movement::{MovementReason, ReferenceType};
pub use status::*;
pub use stock::StockLevel;
