//! Daily reservation policy.
//!
//! A customer may reserve at most `limit` units per calendar day. The server
//! checks the policy inside the reservation transaction; clients can fetch
//! the remaining quota to show it before submitting.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default number of reservation units per customer per day.
pub const DEFAULT_DAILY_RESERVATION_LIMIT: u32 = 5;

/// Returned when a reservation would exceed the daily limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("daily reservation limit of {limit} reached ({used} already reserved today)")]
pub struct DailyLimitExceeded {
    pub limit: u32,
    pub used: u32,
    pub requested: u32,
}

/// Per-customer, per-day cap on reserved units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyReservationPolicy {
    limit: u32,
}

impl DailyReservationPolicy {
    /// Create a policy. A limit of zero would block every reservation and is
    /// raised to one.
    #[must_use]
    pub fn new(limit: u32) -> Self {
        Self {
            limit: limit.max(1),
        }
    }

    #[must_use]
    pub const fn limit(&self) -> u32 {
        self.limit
    }

    /// Units still available today given `used` units already reserved.
    #[must_use]
    pub const fn remaining(&self, used: u32) -> u32 {
        self.limit.saturating_sub(used)
    }

    /// Check whether `requested` more units fit in today's quota.
    ///
    /// # Errors
    ///
    /// Returns [`DailyLimitExceeded`] if `used + requested` exceeds the limit.
    pub fn check(&self, used: u32, requested: u32) -> Result<(), DailyLimitExceeded> {
        if used.saturating_add(requested) > self.limit {
            return Err(DailyLimitExceeded {
                limit: self.limit,
                used,
                requested,
            });
        }
        Ok(())
    }
}

impl Default for DailyReservationPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_DAILY_RESERVATION_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limit_is_five() {
        assert_eq!(DailyReservationPolicy::default().limit(), 5);
    }

    #[test]
    fn test_check_allows_up_to_limit() {
        let policy = DailyReservationPolicy::new(5);
        assert!(policy.check(0, 5).is_ok());
        assert!(policy.check(4, 1).is_ok());
        assert_eq!(
            policy.check(5, 1),
            Err(DailyLimitExceeded {
                limit: 5,
                used: 5,
                requested: 1
            })
        );
        assert!(policy.check(3, 3).is_err());
    }

    #[test]
    fn test_remaining_saturates() {
        let policy = DailyReservationPolicy::new(5);
        assert_eq!(policy.remaining(2), 3);
        assert_eq!(policy.remaining(9), 0);
    }

    #[test]
    fn test_zero_limit_raised_to_one() {
        let policy = DailyReservationPolicy::new(0);
        assert_eq!(policy.limit(), 1);
        assert!(policy.check(0, 1).is_ok());
    }
}
