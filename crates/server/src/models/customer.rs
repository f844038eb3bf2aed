//! Customer models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use ksurplus_core::{CustomerId, Email, EmailError};

const DEFAULT_FIRST_NAME: &str = "Customer";

/// A customer record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<Email>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    /// Name shown on orders and reservations.
    #[must_use]
    pub fn display_name(&self) -> String {
        display_name(&self.first_name, &self.last_name)
    }
}

/// Joins first and last name, skipping empty parts.
#[must_use]
pub fn display_name(first_name: &str, last_name: &str) -> String {
    [first_name.trim(), last_name.trim()]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Customer information sent along with a reservation or sale, or posted to
/// `/api/customers`.
///
/// Either references an existing customer by id, or describes one to be
/// upserted by email. Details without an email create a new customer row;
/// a payload with nothing in it means a walk-in.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomerDetails {
    #[serde(default)]
    pub customer_id: Option<CustomerId>,
    /// Full name, split on the first space when first/last are absent.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

impl CustomerDetails {
    /// No id and no identifying detail: the buyer is a walk-in.
    #[must_use]
    pub fn is_walk_in(&self) -> bool {
        self.customer_id.is_none()
            && [
                &self.name,
                &self.first_name,
                &self.last_name,
                &self.email,
                &self.phone,
            ]
            .into_iter()
            .all(|field| field.as_deref().is_none_or(|s| s.trim().is_empty()))
    }

    /// Parsed, lower-cased email. Blank emails count as absent.
    ///
    /// # Errors
    ///
    /// Returns `EmailError` if a non-blank email is malformed.
    pub fn email(&self) -> Result<Option<Email>, EmailError> {
        match self.email.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => Email::parse(raw).map(Some),
        }
    }

    /// First and last name, derived from `name` when not given explicitly.
    #[must_use]
    pub fn names(&self) -> (String, String) {
        let full = self.name.as_deref().unwrap_or_default().trim();
        let (split_first, split_last) = full.split_once(' ').unwrap_or((full, ""));

        let first = non_blank(self.first_name.as_deref())
            .or_else(|| non_blank(Some(split_first)))
            .unwrap_or(DEFAULT_FIRST_NAME);
        let last = non_blank(self.last_name.as_deref())
            .or_else(|| non_blank(Some(split_last)))
            .unwrap_or_default();

        (first.to_string(), last.to_string())
    }

    /// Trimmed phone number, if any.
    #[must_use]
    pub fn phone(&self) -> Option<&str> {
        non_blank(self.phone.as_deref())
    }
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_details_are_walk_in() {
        assert!(CustomerDetails::default().is_walk_in());
        let details = CustomerDetails {
            email: Some("  ".to_string()),
            ..CustomerDetails::default()
        };
        assert!(details.is_walk_in());

        let details = CustomerDetails {
            customer_id: Some(CustomerId::new(1)),
            ..CustomerDetails::default()
        };
        assert!(!details.is_walk_in());
    }

    #[test]
    fn test_names_split_full_name() {
        let details = CustomerDetails {
            name: Some("Maria Clara Santos".to_string()),
            ..CustomerDetails::default()
        };
        assert_eq!(
            details.names(),
            ("Maria".to_string(), "Clara Santos".to_string())
        );

        let details = CustomerDetails {
            name: Some("Maria Santos".to_string()),
            first_name: Some("Ria".to_string()),
            ..CustomerDetails::default()
        };
        assert_eq!(details.names(), ("Ria".to_string(), "Santos".to_string()));
    }

    #[test]
    fn test_names_default() {
        let details = CustomerDetails {
            phone: Some("0917".to_string()),
            ..CustomerDetails::default()
        };
        assert_eq!(details.names(), ("Customer".to_string(), String::new()));
    }

    #[test]
    fn test_email_normalised() {
        let details = CustomerDetails {
            email: Some(" Buyer@Example.COM ".to_string()),
            ..CustomerDetails::default()
        };
        assert_eq!(
            details.email().unwrap().unwrap().as_str(),
            "buyer@example.com"
        );

        let details = CustomerDetails {
            email: Some("not-an-email".to_string()),
            ..CustomerDetails::default()
        };
        assert!(details.email().is_err());
    }

    #[test]
    fn test_display_name() {
        assert_eq!(display_name("Ana", ""), "Ana");
        assert_eq!(display_name("Ana", "Reyes"), "Ana Reyes");
    }
}
