//! Inventory movement vocabulary.
//!
//! Movements carry a free-text `reason` and an optional polymorphic reference
//! to the row that caused them. The well-known values are modelled as enum
//! variants; anything else round-trips through `Other`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Why a product's stock changed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MovementReason {
    /// Stock a product was created with.
    Initial,
    Reservation,
    Sale,
    Adjustment,
    Restock,
    Return,
    Damage,
    Other(String),
}

impl MovementReason {
    /// The stored/wire form of the reason.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Initial => "initial",
            Self::Reservation => "reservation",
            Self::Sale => "sale",
            Self::Adjustment => "adjustment",
            Self::Restock => "restock",
            Self::Return => "return",
            Self::Damage => "damage",
            Self::Other(s) => s,
        }
    }

    /// Parse a reason; unknown values are kept verbatim (trimmed).
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "initial" => Self::Initial,
            "reservation" => Self::Reservation,
            "sale" => Self::Sale,
            "adjustment" => Self::Adjustment,
            "restock" => Self::Restock,
            "return" => Self::Return,
            "damage" => Self::Damage,
            other => Self::Other(other.to_owned()),
        }
    }

    /// A reason must carry some text.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.as_str().trim().is_empty()
    }
}

impl std::fmt::Display for MovementReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for MovementReason {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for MovementReason {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

/// Kind of row a movement points back to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ReferenceType {
    Reservation,
    SalesOrder,
    Other(String),
}

impl ReferenceType {
    /// The stored/wire form of the reference type.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Reservation => "reservation",
            Self::SalesOrder => "sales_order",
            Self::Other(s) => s,
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "reservation" => Self::Reservation,
            "sales_order" => Self::SalesOrder,
            other => Self::Other(other.to_owned()),
        }
    }
}

impl std::fmt::Display for ReferenceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ReferenceType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ReferenceType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}
