use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Order lifecycle.
///
/// ```text
/// Pending ─▶ Paid ─▶ Preparing ─▶ Shipping ─▶ Delivered ─▶ Completed
///    │         │          │                        │            │
///    └─────────┴──────────┴─▶ Cancelled            └─▶ Refunded ◀┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Paid,
    Preparing,
    Shipping,
    Delivered,
    Completed,
    Cancelled,
    Refunded,
}

impl OrderStatus {
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Paid)
                | (Pending, Cancelled)
                | (Paid, Preparing)
                | (Paid, Cancelled)
                | (Preparing, Shipping)
                | (Preparing, Cancelled)
                | (Shipping, Delivered)
                | (Delivered, Completed)
                | (Delivered, Refunded)
                | (Completed, Refunded)
        )
    }

    pub fn is_cancellable(self) -> bool {
        matches!(
            self,
            OrderStatus::Pending | OrderStatus::Paid | OrderStatus::Preparing
        )
    }

    pub fn is_refundable(self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Completed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Paid => "PAID",
            OrderStatus::Preparing => "PREPARING",
            OrderStatus::Shipping => "SHIPPING",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Completed => "COMPLETED",
            OrderStatus::Cancelled => "CANCELLED",
            OrderStatus::Refunded => "REFUNDED",
        }
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderItemStatus {
    Pending,
    Confirmed,
    Preparing,
    Shipping,
    Delivered,
    Cancelled,
    Refunded,
}

impl OrderItemStatus {
    pub fn is_cancellable(self) -> bool {
        matches!(
            self,
            OrderItemStatus::Pending | OrderItemStatus::Confirmed | OrderItemStatus::Preparing
        )
    }

    pub fn is_refundable(self) -> bool {
        self == OrderItemStatus::Delivered
    }

    /// Cancelled or refunded: the line no longer counts towards the order.
    pub fn is_closed(self) -> bool {
        matches!(self, OrderItemStatus::Cancelled | OrderItemStatus::Refunded)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderItemStatus::Pending => "PENDING",
            OrderItemStatus::Confirmed => "CONFIRMED",
            OrderItemStatus::Preparing => "PREPARING",
            OrderItemStatus::Shipping => "SHIPPING",
            OrderItemStatus::Delivered => "DELIVERED",
            OrderItemStatus::Cancelled => "CANCELLED",
            OrderItemStatus::Refunded => "REFUNDED",
        }
    }
}

impl core::fmt::Display for OrderItemStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of an order's status history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    pub status: OrderStatus,
    pub note: Option<String>,
    pub changed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Completed,
}
