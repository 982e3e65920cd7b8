//! Order status and its badge styling.

use core::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Order lifecycle status as reported by the order service.
///
/// Parsing is case-insensitive. Any value outside the known set is kept as
/// [`OrderStatus::Unknown`] with its original label so it can still be shown.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
    /// A status this client does not recognise (e.g. "refunded").
    Unknown(String),
}

impl OrderStatus {
    /// Parse a status label.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" => Self::Pending,
            "processing" => Self::Processing,
            "shipped" => Self::Shipped,
            "delivered" => Self::Delivered,
            "cancelled" | "canceled" => Self::Cancelled,
            _ => Self::Unknown(raw.trim().to_owned()),
        }
    }

    /// CSS classes for the status badge.
    ///
    /// Unrecognised statuses fall back to the neutral style.
    #[must_use]
    pub const fn badge_class(&self) -> &'static str {
        match self {
            Self::Pending => "bg-warning text-dark",
            Self::Processing => "bg-info text-dark",
            Self::Shipped => "bg-primary",
            Self::Delivered => "bg-success",
            Self::Cancelled => "bg-danger",
            Self::Unknown(_) => "bg-secondary",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
            Self::Unknown(raw) if raw.is_empty() => "Unknown",
            Self::Unknown(raw) => raw,
        }
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        Self::Unknown(String::new())
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for OrderStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for OrderStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map_or_else(Self::default, Self::parse))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(OrderStatus::parse("Shipped"), OrderStatus::Shipped);
        assert_eq!(OrderStatus::parse(" PENDING "), OrderStatus::Pending);
    }

    #[test]
    fn test_known_badges() {
        assert_eq!(OrderStatus::Pending.badge_class(), "bg-warning text-dark");
        assert_eq!(OrderStatus::Processing.badge_class(), "bg-info text-dark");
        assert_eq!(OrderStatus::Shipped.badge_class(), "bg-primary");
        assert_eq!(OrderStatus::Delivered.badge_class(), "bg-success");
        assert_eq!(OrderStatus::Cancelled.badge_class(), "bg-danger");
    }

    #[test]
    fn test_unknown_status_uses_default_badge() {
        let status = OrderStatus::parse("refunded");
        assert_eq!(status, OrderStatus::Unknown("refunded".to_string()));
        assert_eq!(status.badge_class(), "bg-secondary");
        assert_eq!(status.label(), "refunded");
    }

    #[test]
    fn test_null_status_is_unknown() {
        let status: OrderStatus = serde_json::from_str("null").unwrap();
        assert_eq!(status.label(), "Unknown");
        assert_eq!(status.badge_class(), "bg-secondary");
    }
}
