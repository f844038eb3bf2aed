//! Human-readable reference codes.
//!
//! Codes are read out over the counter and typed back in, so the alphabet
//! leaves out `0/O` and `1/I`. Uniqueness is ultimately guaranteed by the
//! database unique constraints; the random suffix only has to make collisions
//! vanishingly rare within one day.

use chrono::NaiveDate;
use rand::Rng;

const ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const SUFFIX_LEN: usize = 6;
const SKU_LEN: usize = 8;

fn random_suffix(len: usize) -> String {
    let mut rng = rand::rng();
    (0..len)
        .map(|_| {
            let idx = rng.random_range(0..ALPHABET.len());
            char::from(ALPHABET.get(idx).copied().unwrap_or(b'X'))
        })
        .collect()
}

/// Reservation code, e.g. `RES-20261016-K7P2QM`.
#[must_use]
pub fn reservation_code(date: NaiveDate) -> String {
    format!("RES-{}-{}", date.format("%Y%m%d"), random_suffix(SUFFIX_LEN))
}

/// Sales order number, e.g. `SO-20261016-4HX9TB`.
#[must_use]
pub fn order_number(date: NaiveDate) -> String {
    format!("SO-{}-{}", date.format("%Y%m%d"), random_suffix(SUFFIX_LEN))
}

/// Product SKU, e.g. `SKU-8JQ4MZ2C`.
#[must_use]
pub fn sku() -> String {
    format!("SKU-{}", random_suffix(SKU_LEN))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    fn assert_alphabet(s: &str) {
        assert!(s.bytes().all(|b| ALPHABET.contains(&b)), "bad chars in {s}");
    }

    #[test]
    fn test_reservation_code_shape() {
        let code = reservation_code(date());
        assert!(code.starts_with("RES-20261016-"));
        let suffix = code.rsplit('-').next().unwrap();
        assert_eq!(suffix.len(), SUFFIX_LEN);
        assert_alphabet(suffix);
    }

    #[test]
    fn test_order_number_shape() {
        let number = order_number(date());
        assert!(number.starts_with("SO-20261016-"));
        assert_eq!(number.len(), "SO-20261016-".len() + SUFFIX_LEN);
    }

    #[test]
    fn test_sku_shape() {
        let sku = sku();
        let body = sku.strip_prefix("SKU-").unwrap();
        assert_eq!(body.len(), SKU_LEN);
        assert_alphabet(body);
    }

    #[test]
    fn test_codes_differ() {
        // 32^6 possibilities; two equal draws in a row would point at a broken RNG
        assert_ne!(reservation_code(date()), reservation_code(date()));
    }
}
