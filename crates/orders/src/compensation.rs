//! Best-effort side effects shared by the order workflows.

use commerce_core::{Entity, OrderItemId, ProductId};

use crate::events::OrderEvent;
use crate::item::OrderItem;
use crate::ports::{EventPublisher, ProductService, ProductServiceError};
use crate::values::Quantity;

/// Stock held for one order line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockLine {
    pub order_item_id: Option<OrderItemId>,
    pub product_id: ProductId,
    pub quantity: Quantity,
}

impl From<&OrderItem> for StockLine {
    fn from(item: &OrderItem) -> Self {
        Self {
            order_item_id: Some(*item.id()),
            product_id: item.product_id(),
            quantity: item.quantity(),
        }
    }
}

/// A compensating release that the product service refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseFailure {
    pub line: StockLine,
    pub error: ProductServiceError,
}

/// Release every line, continuing past failures.
pub(crate) fn release_lines<P: ProductService + ?Sized>(
    products: &P,
    lines: &[StockLine],
) -> Vec<ReleaseFailure> {
    let mut failures = Vec::new();
    for line in lines {
        match products.release_stock(line.product_id, line.quantity) {
            Ok(()) => {
                tracing::debug!(
                    product_id = %line.product_id,
                    quantity = %line.quantity,
                    "stock released"
                );
            }
            Err(error) => {
                tracing::error!(
                    product_id = %line.product_id,
                    quantity = %line.quantity,
                    order_item_id = ?line.order_item_id.map(|id| id.value()),
                    error = %error,
                    "stock release failed"
                );
                failures.push(ReleaseFailure { line: *line, error });
            }
        }
    }
    failures
}

/// Publish events in order; failures are logged and dropped.
pub(crate) fn publish_events<E: EventPublisher + ?Sized>(publisher: &E, events: Vec<OrderEvent>) {
    use commerce_events::Event;

    for event in events {
        let event_type = event.event_type();
        let order_id = event.order_id();
        if let Err(err) = publisher.publish(&event.into_envelope()) {
            tracing::warn!(
                event_type,
                order_id = %order_id,
                error = %err,
                "event publication failed, continuing"
            );
        }
    }
}
