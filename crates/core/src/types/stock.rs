//! Stock level classification for low-stock badges and alerts.

use serde::{Deserialize, Serialize};

/// Coarse stock level of a product relative to its low-stock threshold.
///
/// | stock                         | level              |
/// |-------------------------------|--------------------|
/// | `<= 0`                        | `Out`              |
/// | `<= max(1, threshold / 2)`    | `Low { critical }` |
/// | `<= threshold`                | `Low`              |
/// | `<= 2 * threshold`            | `Medium`           |
/// | otherwise                     | `High`             |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum StockLevel {
    Out,
    Low { critical: bool },
    Medium,
    High,
}

impl StockLevel {
    /// Classify `stock` against `threshold`. Thresholds below 1 are treated as 1.
    #[must_use]
    pub fn classify(stock: i32, threshold: i32) -> Self {
        let limit = threshold.max(1);
        if stock <= 0 {
            Self::Out
        } else if stock <= limit {
            Self::Low {
                critical: stock <= (limit / 2).max(1),
            }
        } else if stock <= limit.saturating_mul(2) {
            Self::Medium
        } else {
            Self::High
        }
    }

    /// In stock but at or below the threshold.
    #[must_use]
    pub const fn is_low(self) -> bool {
        matches!(self, Self::Low { .. })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_boundaries() {
        assert_eq!(StockLevel::classify(0, 5), StockLevel::Out);
        assert_eq!(StockLevel::classify(-1, 5), StockLevel::Out);
        assert_eq!(StockLevel::classify(1, 5), StockLevel::Low { critical: true });
        assert_eq!(StockLevel::classify(2, 5), StockLevel::Low { critical: true });
        assert_eq!(StockLevel::classify(3, 5), StockLevel::Low { critical: false });
        assert_eq!(StockLevel::classify(5, 5), StockLevel::Low { critical: false });
        assert_eq!(StockLevel::classify(6, 5), StockLevel::Medium);
        assert_eq!(StockLevel::classify(10, 5), StockLevel::Medium);
        assert_eq!(StockLevel::classify(11, 5), StockLevel::High);
    }

    #[test]
    fn test_zero_threshold_treated_as_one() {
        assert_eq!(StockLevel::classify(1, 0), StockLevel::Low { critical: true });
        assert_eq!(StockLevel::classify(2, 0), StockLevel::Medium);
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(StockLevel::Low { critical: true }).unwrap();
        assert_eq!(json, serde_json::json!({"status": "low", "critical": true}));
        let json = serde_json::to_value(StockLevel::High).unwrap();
        assert_eq!(json, serde_json::json!({"status": "high"}));
    }
}
