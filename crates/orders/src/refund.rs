use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use commerce_core::{DomainError, DomainResult, OrderItemId};

use crate::money::Money;

/// Refund lifecycle.
///
/// ```text
/// Requested ─▶ Approved ─▶ Completed
///     │
///     └─▶ Rejected
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RefundStatus {
    Requested,
    Approved,
    Rejected,
    Completed,
}

impl RefundStatus {
    /// Still waiting for a decision or for the money to move.
    pub fn is_open(self) -> bool {
        matches!(self, RefundStatus::Requested | RefundStatus::Approved)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RefundStatus::Requested => "REQUESTED",
            RefundStatus::Approved => "APPROVED",
            RefundStatus::Rejected => "REJECTED",
            RefundStatus::Completed => "COMPLETED",
        }
    }
}

impl core::fmt::Display for RefundStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Entity: a refund request for one delivered order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRefund {
    order_item_id: OrderItemId,
    reason: String,
    refund_amount: Money,
    status: RefundStatus,
    requested_at: DateTime<Utc>,
    refunded_at: Option<DateTime<Utc>>,
}

impl OrderRefund {
    pub(crate) fn request(
        order_item_id: OrderItemId,
        reason: &str,
        refund_amount: Money,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if reason.trim().is_empty() {
            return Err(DomainError::validation("refund reason cannot be empty"));
        }
        Ok(Self {
            order_item_id,
            reason: reason.trim().to_string(),
            refund_amount,
            status: RefundStatus::Requested,
            requested_at: now,
            refunded_at: None,
        })
    }

    pub fn order_item_id(&self) -> OrderItemId {
        self.order_item_id
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn refund_amount(&self) -> Money {
        self.refund_amount
    }

    pub fn status(&self) -> RefundStatus {
        self.status
    }

    pub fn requested_at(&self) -> DateTime<Utc> {
        self.requested_at
    }

    pub fn refunded_at(&self) -> Option<DateTime<Utc>> {
        self.refunded_at
    }

    pub(crate) fn approve(&mut self) -> DomainResult<()> {
        self.advance(RefundStatus::Requested, RefundStatus::Approved)
    }

    pub(crate) fn reject(&mut self) -> DomainResult<()> {
        self.advance(RefundStatus::Requested, RefundStatus::Rejected)
    }

    pub(crate) fn complete(&mut self, now: DateTime<Utc>) -> DomainResult<()> {
        self.advance(RefundStatus::Approved, RefundStatus::Completed)?;
        self.refunded_at = Some(now);
        Ok(())
    }

    fn advance(&mut self, from: RefundStatus, to: RefundStatus) -> DomainResult<()> {
        if self.status != from {
            return Err(DomainError::invariant(format!(
                "refund for order item {} cannot move to {to} from {}",
                self.order_item_id, self.status
            )));
        }
        self.status = to;
        Ok(())
    }
}
