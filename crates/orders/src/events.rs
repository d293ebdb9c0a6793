use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use commerce_core::{MemberId, OrderId, OrderItemId, ProductId};
use commerce_events::{Event, EventEnvelope};

use crate::money::Money;
use crate::values::{OrderNumber, PaymentMethod, Quantity};

/// Aggregate type tag carried by every order event envelope.
pub const ORDER_AGGREGATE_TYPE: &str = "order";

/// Envelope handed to [`EventPublisher`](crate::ports::EventPublisher).
pub type DomainEvent = EventEnvelope<OrderEvent>;

/// Event: OrderCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCreated {
    pub order_id: OrderId,
    pub member_id: MemberId,
    pub order_number: OrderNumber,
    pub total_amount: Money,
    pub item_count: usize,
    pub occurred_at: DateTime<Utc>,
}

/// Event: OrderPaid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPaid {
    pub order_id: OrderId,
    pub member_id: MemberId,
    pub order_number: OrderNumber,
    pub total_amount: Money,
    pub payment_method: PaymentMethod,
    pub occurred_at: DateTime<Utc>,
}

/// Event: OrderCancelled.
///
/// `refund_amount` covers the lines cancelled by this transition only; lines
/// cancelled earlier were refunded by their own `OrderItemCancelled`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCancelled {
    pub order_id: OrderId,
    pub member_id: MemberId,
    pub order_number: OrderNumber,
    pub refund_amount: Money,
    pub reason: String,
    pub occurred_at: DateTime<Utc>,
}

/// Event: OrderItemCancelled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItemCancelled {
    pub order_id: OrderId,
    pub member_id: MemberId,
    pub order_number: OrderNumber,
    pub order_item_id: OrderItemId,
    pub product_id: ProductId,
    pub quantity: Quantity,
    pub refund_amount: Money,
    pub reason: String,
    pub occurred_at: DateTime<Utc>,
}

/// Event: OrderRefundRequested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRefundRequested {
    pub order_id: OrderId,
    pub member_id: MemberId,
    pub order_number: OrderNumber,
    pub order_item_id: OrderItemId,
    pub refund_amount: Money,
    pub reason: String,
    pub occurred_at: DateTime<Utc>,
}

/// Event: OrderItemRefunded. Emitted when an approved refund is paid out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItemRefunded {
    pub order_id: OrderId,
    pub member_id: MemberId,
    pub order_number: OrderNumber,
    pub order_item_id: OrderItemId,
    pub product_id: ProductId,
    pub quantity: Quantity,
    pub refund_amount: Money,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderEvent {
    OrderCreated(OrderCreated),
    OrderPaid(OrderPaid),
    OrderCancelled(OrderCancelled),
    OrderItemCancelled(OrderItemCancelled),
    OrderRefundRequested(OrderRefundRequested),
    OrderItemRefunded(OrderItemRefunded),
}

impl OrderEvent {
    pub fn order_id(&self) -> OrderId {
        match self {
            OrderEvent::OrderCreated(e) => e.order_id,
            OrderEvent::OrderPaid(e) => e.order_id,
            OrderEvent::OrderCancelled(e) => e.order_id,
            OrderEvent::OrderItemCancelled(e) => e.order_id,
            OrderEvent::OrderRefundRequested(e) => e.order_id,
            OrderEvent::OrderItemRefunded(e) => e.order_id,
        }
    }

    /// Wrap into the envelope handed to publishers.
    pub fn into_envelope(self) -> DomainEvent {
        EventEnvelope::new(ORDER_AGGREGATE_TYPE, self)
    }
}

impl Event for OrderEvent {
    fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::OrderCreated(_) => "order.created",
            OrderEvent::OrderPaid(_) => "order.paid",
            OrderEvent::OrderCancelled(_) => "order.cancelled",
            OrderEvent::OrderItemCancelled(_) => "order.item_cancelled",
            OrderEvent::OrderRefundRequested(_) => "order.refund_requested",
            OrderEvent::OrderItemRefunded(_) => "order.item_refunded",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            OrderEvent::OrderCreated(e) => e.occurred_at,
            OrderEvent::OrderPaid(e) => e.occurred_at,
            OrderEvent::OrderCancelled(e) => e.occurred_at,
            OrderEvent::OrderItemCancelled(e) => e.occurred_at,
            OrderEvent::OrderRefundRequested(e) => e.occurred_at,
            OrderEvent::OrderItemRefunded(e) => e.occurred_at,
        }
    }

    fn aggregate_id(&self) -> i64 {
        self.order_id().value()
    }
}
