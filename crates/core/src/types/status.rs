//! Order status as reported by the commerce API.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle status of an order.
///
/// The backend owns the state machine; the storefront only displays it.
/// Statuses this crate does not know about deserialize to [`Self::Unknown`]
/// instead of failing the whole order payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Pending,
    Paid,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
    #[serde(other)]
    Unknown,
}

impl OrderStatus {
    /// Human readable label for templates.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Waiting for payment",
            Self::Paid => "Paid",
            Self::Processing => "Being baked",
            Self::Shipped => "On the way",
            Self::Delivered => "Delivered",
            Self::Cancelled => "Cancelled",
            Self::Unknown => "Unknown",
        }
    }

    /// Whether the customer still has to pay.
    #[must_use]
    pub const fn awaits_payment(self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Whether the order has reached a final state.
    #[must_use]
    pub const fn is_final(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_known() {
        let status: OrderStatus = serde_json::from_str("\"SHIPPED\"").unwrap();
        assert_eq!(status, OrderStatus::Shipped);
        assert_eq!(status.label(), "On the way");
    }

    #[test]
    fn test_deserialize_unknown_falls_back() {
        let status: OrderStatus = serde_json::from_str("\"REFUND_REQUESTED\"").unwrap();
        assert_eq!(status, OrderStatus::Unknown);
        assert!(!status.is_final());
    }

    #[test]
    fn test_final_states() {
        assert!(OrderStatus::Delivered.is_final());
        assert!(OrderStatus::Cancelled.is_final());
        assert!(!OrderStatus::Paid.is_final());
        assert!(OrderStatus::Pending.awaits_payment());
        assert!(!OrderStatus::Paid.awaits_payment());
    }
}
