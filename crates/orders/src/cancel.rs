//! Order and order-line cancellation.
//!
//! Both operations persist the cancelled state first and only then release
//! stock, so a save that loses the version check never releases anything.
//! Releases are best-effort: failures are logged and reported in the
//! [`CancellationOutcome`] instead of failing the call.

use chrono::Utc;

use commerce_core::{DomainError, OrderId, OrderItemId};

use crate::compensation::{ReleaseFailure, StockLine, publish_events, release_lines};
use crate::error::OrderError;
use crate::money::Money;
use crate::order::Order;
use crate::ports::{EventPublisher, OrderRepository, ProductService};
use crate::status::OrderStatus;

/// What a cancellation changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancellationOutcome {
    pub order_id: OrderId,
    pub order_status: OrderStatus,
    /// Lines moved to `Cancelled` by this call.
    pub cancelled_items: Vec<OrderItemId>,
    pub refund_amount: Money,
    /// Whether the order itself ended up `Cancelled`.
    pub order_cancelled: bool,
    pub release_failures: Vec<ReleaseFailure>,
}

impl CancellationOutcome {
    pub fn fully_released(&self) -> bool {
        self.release_failures.is_empty()
    }
}

pub trait CancelOrderUseCase: Send + Sync {
    fn cancel_entire_order(
        &self,
        order_id: OrderId,
        reason: &str,
    ) -> Result<CancellationOutcome, OrderError>;

    fn cancel_order_item(
        &self,
        order_id: OrderId,
        order_item_id: OrderItemId,
        reason: &str,
    ) -> Result<CancellationOutcome, OrderError>;
}

impl<U> CancelOrderUseCase for std::sync::Arc<U>
where
    U: CancelOrderUseCase + ?Sized,
{
    fn cancel_entire_order(
        &self,
        order_id: OrderId,
        reason: &str,
    ) -> Result<CancellationOutcome, OrderError> {
        (**self).cancel_entire_order(order_id, reason)
    }

    fn cancel_order_item(
        &self,
        order_id: OrderId,
        order_item_id: OrderItemId,
        reason: &str,
    ) -> Result<CancellationOutcome, OrderError> {
        (**self).cancel_order_item(order_id, order_item_id, reason)
    }
}

#[derive(Debug)]
pub struct CancelOrderService<R, P, E> {
    orders: R,
    products: P,
    publisher: E,
}

impl<R, P, E> CancelOrderService<R, P, E> {
    pub fn new(orders: R, products: P, publisher: E) -> Self {
        Self {
            orders,
            products,
            publisher,
        }
    }
}

impl<R, P, E> CancelOrderService<R, P, E>
where
    R: OrderRepository,
    P: ProductService,
    E: EventPublisher,
{
    fn load(&self, order_id: OrderId) -> Result<Order, OrderError> {
        self.orders
            .find_by_id(order_id)?
            .ok_or_else(|| DomainError::not_found(format!("order {order_id}")).into())
    }

    /// Release the given lines of the saved order.
    fn release(
        &self,
        saved: &Order,
        item_ids: &[OrderItemId],
    ) -> Result<(Money, Vec<ReleaseFailure>), OrderError> {
        let items: Vec<_> = item_ids.iter().filter_map(|id| saved.item(*id)).collect();
        let refund = Money::sum(items.iter().map(|i| i.total_price()))?;
        let lines: Vec<StockLine> = items.into_iter().map(StockLine::from).collect();
        Ok((refund, release_lines(&self.products, &lines)))
    }
}

fn require_reason(reason: &str) -> Result<&str, OrderError> {
    let reason = reason.trim();
    if reason.is_empty() {
        return Err(DomainError::validation("cancel reason is required").into());
    }
    Ok(reason)
}

impl<R, P, E> CancelOrderUseCase for CancelOrderService<R, P, E>
where
    R: OrderRepository,
    P: ProductService,
    E: EventPublisher,
{
    fn cancel_entire_order(
        &self,
        order_id: OrderId,
        reason: &str,
    ) -> Result<CancellationOutcome, OrderError> {
        let reason = require_reason(reason)?;
        let mut order = self.load(order_id)?;
        if order.status() == OrderStatus::Cancelled {
            return Err(OrderError::OrderAlreadyCancelled(order_id));
        }

        let cancelled_items = order.cancel(reason, Utc::now())?;
        let events = order.take_events();
        let saved = self.orders.save(&order)?;

        let (refund_amount, release_failures) = self.release(&saved, &cancelled_items)?;
        publish_events(&self.publisher, events);

        tracing::info!(
            order_id = %order_id,
            items = cancelled_items.len(),
            refund_amount = %refund_amount,
            release_failures = release_failures.len(),
            "order cancelled"
        );
        Ok(CancellationOutcome {
            order_id,
            order_status: saved.status(),
            cancelled_items,
            refund_amount,
            order_cancelled: true,
            release_failures,
        })
    }

    fn cancel_order_item(
        &self,
        order_id: OrderId,
        order_item_id: OrderItemId,
        reason: &str,
    ) -> Result<CancellationOutcome, OrderError> {
        let reason = require_reason(reason)?;
        let mut order = self.load(order_id)?;
        let item = order.item(order_item_id).ok_or_else(|| {
            DomainError::not_found(format!("order item {order_item_id} in order {order_id}"))
        })?;
        if item.is_cancelled() {
            return Err(OrderError::OrderItemAlreadyCancelled {
                order_id,
                order_item_id,
            });
        }

        let order_cancelled = order.cancel_item(order_item_id, reason, Utc::now())?;
        let events = order.take_events();
        let saved = self.orders.save(&order)?;

        let cancelled_items = vec![order_item_id];
        let (refund_amount, release_failures) = self.release(&saved, &cancelled_items)?;
        publish_events(&self.publisher, events);

        tracing::info!(
            order_id = %order_id,
            order_item_id = %order_item_id,
            refund_amount = %refund_amount,
            order_cancelled,
            "order item cancelled"
        );
        Ok(CancellationOutcome {
            order_id,
            order_status: saved.status(),
            cancelled_items,
            refund_amount,
            order_cancelled,
            release_failures,
        })
    }
}
