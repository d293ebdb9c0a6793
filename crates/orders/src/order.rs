use std::collections::HashSet;

use chrono::{DateTime, Utc};

use commerce_core::entity::{find_by_id, find_by_id_mut};
use commerce_core::{
    AggregateRoot, DomainError, DomainResult, Entity, MemberId, OrderId, OrderItemId, PaymentId,
};

use crate::events::{
    OrderCancelled, OrderCreated, OrderEvent, OrderItemCancelled, OrderItemRefunded, OrderPaid,
    OrderRefundRequested,
};
use crate::item::OrderItem;
use crate::money::Money;
use crate::payment::OrderPayment;
use crate::refund::OrderRefund;
use crate::shipping::ShippingAddress;
use crate::status::{OrderItemStatus, OrderStatus, StatusChange};
use crate::values::{OrderNumber, PaymentMethod};

/// Aggregate root: Order.
///
/// State-based: every command mutates the aggregate in memory and records the
/// resulting [`OrderEvent`]s, which the application layer drains with
/// [`take_events`](Order::take_events) once the new state is persisted.
#[derive(Debug, Clone)]
pub struct Order {
    id: OrderId,
    member_id: MemberId,
    order_number: OrderNumber,
    shipping_address: ShippingAddress,
    items: Vec<OrderItem>,
    payments: Vec<OrderPayment>,
    original_amount: Money,
    discount_amount: Money,
    total_amount: Money,
    status: OrderStatus,
    ordered_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    cancel_reason: Option<String>,
    tracking_number: Option<String>,
    refunds: Vec<OrderRefund>,
    status_history: Vec<StatusChange>,
    version: u64,
    pending_events: Vec<OrderEvent>,
}

impl Order {
    /// Create a new pending order and record `OrderCreated`.
    pub fn create(
        id: OrderId,
        member_id: MemberId,
        shipping_address: ShippingAddress,
        items: Vec<OrderItem>,
        ordered_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if items.is_empty() {
            return Err(DomainError::validation("order must have at least one item"));
        }
        let mut seen = HashSet::with_capacity(items.len());
        if let Some(dup) = items.iter().find(|i| !seen.insert(*i.id())) {
            return Err(DomainError::validation(format!(
                "duplicate order item id {}",
                dup.id()
            )));
        }

        let original_amount = Money::sum(
            items
                .iter()
                .map(OrderItem::original_amount)
                .collect::<DomainResult<Vec<_>>>()?,
        )?;
        let discount_amount = Money::sum(
            items
                .iter()
                .map(OrderItem::discount_amount)
                .collect::<DomainResult<Vec<_>>>()?,
        )?;
        let total_amount = original_amount.checked_sub(discount_amount)?;

        let mut order = Self {
            id,
            member_id,
            order_number: OrderNumber::generate(ordered_at, id),
            shipping_address,
            items,
            payments: Vec::new(),
            original_amount,
            discount_amount,
            total_amount,
            status: OrderStatus::Pending,
            ordered_at,
            updated_at: ordered_at,
            cancel_reason: None,
            tracking_number: None,
            refunds: Vec::new(),
            status_history: vec![StatusChange {
                status: OrderStatus::Pending,
                note: None,
                changed_at: ordered_at,
            }],
            version: 0,
            pending_events: Vec::new(),
        };

        order.record(OrderEvent::OrderCreated(OrderCreated {
            order_id: order.id,
            member_id: order.member_id,
            order_number: order.order_number.clone(),
            total_amount: order.total_amount,
            item_count: order.items.len(),
            occurred_at: ordered_at,
        }));

        Ok(order)
    }

    pub fn order_id(&self) -> OrderId {
        self.id
    }

    pub fn member_id(&self) -> MemberId {
        self.member_id
    }

    pub fn order_number(&self) -> &OrderNumber {
        &self.order_number
    }

    pub fn shipping_address(&self) -> &ShippingAddress {
        &self.shipping_address
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    pub fn item(&self, item_id: OrderItemId) -> Option<&OrderItem> {
        find_by_id(&self.items, &item_id)
    }

    pub fn payments(&self) -> &[OrderPayment] {
        &self.payments
    }

    pub fn original_amount(&self) -> Money {
        self.original_amount
    }

    pub fn discount_amount(&self) -> Money {
        self.discount_amount
    }

    pub fn total_amount(&self) -> Money {
        self.total_amount
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn ordered_at(&self) -> DateTime<Utc> {
        self.ordered_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn cancel_reason(&self) -> Option<&str> {
        self.cancel_reason.as_deref()
    }

    pub fn tracking_number(&self) -> Option<&str> {
        self.tracking_number.as_deref()
    }

    pub fn refunds(&self) -> &[OrderRefund] {
        &self.refunds
    }

    /// Every status the order has been in, oldest first.
    pub fn status_history(&self) -> &[StatusChange] {
        &self.status_history
    }

    /// Events recorded since the last [`take_events`](Self::take_events).
    pub fn pending_events(&self) -> &[OrderEvent] {
        &self.pending_events
    }

    pub fn take_events(&mut self) -> Vec<OrderEvent> {
        std::mem::take(&mut self.pending_events)
    }

    /// Version stamp assigned by a repository after a successful save.
    pub fn with_version(mut self, version: u64) -> Self {
        self.version = version;
        self
    }

    /// Recompute amounts from the lines and compare with the stored totals.
    pub fn validate_amounts(&self) -> bool {
        let recomputed = || -> DomainResult<(Money, Money, Money)> {
            let original = Money::sum(
                self.items
                    .iter()
                    .map(OrderItem::original_amount)
                    .collect::<DomainResult<Vec<_>>>()?,
            )?;
            let discount = Money::sum(
                self.items
                    .iter()
                    .map(OrderItem::discount_amount)
                    .collect::<DomainResult<Vec<_>>>()?,
            )?;
            let lines = Money::sum(self.items.iter().map(OrderItem::total_price))?;
            Ok((original, discount, lines))
        };

        match recomputed() {
            Ok((original, discount, lines)) => {
                original == self.original_amount
                    && discount == self.discount_amount
                    && lines == self.total_amount
                    && original.checked_sub(discount).ok() == Some(self.total_amount)
            }
            Err(_) => false,
        }
    }

    /// Settle the live lines: Pending -> Paid, lines -> Confirmed.
    pub fn confirm_with_payment(
        &mut self,
        payment_id: PaymentId,
        method: PaymentMethod,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        self.ensure_transition(OrderStatus::Paid)?;

        let amount = Money::sum(
            self.items
                .iter()
                .filter(|i| !i.is_cancelled())
                .map(OrderItem::total_price),
        )?;
        self.for_live_items(OrderItem::confirm_payment)?;
        self.payments
            .push(OrderPayment::completed(payment_id, method, amount, now));
        self.set_status(OrderStatus::Paid, Some(method.to_string()), now);

        self.record(OrderEvent::OrderPaid(OrderPaid {
            order_id: self.id,
            member_id: self.member_id,
            order_number: self.order_number.clone(),
            total_amount: amount,
            payment_method: method,
            occurred_at: now,
        }));
        Ok(())
    }

    /// Cancel the whole order.
    ///
    /// Returns the lines this call moved to `Cancelled`; lines cancelled
    /// earlier are left alone.
    pub fn cancel(&mut self, reason: &str, now: DateTime<Utc>) -> DomainResult<Vec<OrderItemId>> {
        if !self.status.is_cancellable() {
            return Err(DomainError::invariant(format!(
                "order {} cannot be cancelled in status {}",
                self.id, self.status
            )));
        }

        let mut cancelled = Vec::new();
        let mut refund = Money::ZERO;
        for item in self.items.iter_mut().filter(|i| !i.is_cancelled()) {
            item.cancel()?;
            refund = refund.checked_add(item.total_price())?;
            cancelled.push(*item.id());
        }

        self.mark_cancelled(reason, refund, now);
        Ok(cancelled)
    }

    /// Cancel a single line. When it was the last live line the order itself
    /// becomes `Cancelled`; the return value tells whether that happened.
    pub fn cancel_item(
        &mut self,
        item_id: OrderItemId,
        reason: &str,
        now: DateTime<Utc>,
    ) -> DomainResult<bool> {
        if !self.status.is_cancellable() {
            return Err(DomainError::invariant(format!(
                "items of order {} cannot be cancelled in status {}",
                self.id, self.status
            )));
        }

        let item = find_by_id_mut(&mut self.items, &item_id).ok_or_else(|| {
            DomainError::not_found(format!("order item {item_id} in order {}", self.id))
        })?;
        item.cancel()?;

        let event = OrderItemCancelled {
            order_id: self.id,
            member_id: self.member_id,
            order_number: self.order_number.clone(),
            order_item_id: item_id,
            product_id: item.product_id(),
            quantity: item.quantity(),
            refund_amount: item.total_price(),
            reason: reason.to_string(),
            occurred_at: now,
        };
        let refund = event.refund_amount;
        self.updated_at = now;
        self.record(OrderEvent::OrderItemCancelled(event));

        let cascaded = self.items.iter().all(OrderItem::is_cancelled);
        if cascaded {
            self.mark_cancelled(reason, refund, now);
        }
        Ok(cascaded)
    }

    /// Paid -> Preparing.
    pub fn start_preparing(&mut self, now: DateTime<Utc>) -> DomainResult<()> {
        self.ensure_transition(OrderStatus::Preparing)?;
        self.for_live_items(OrderItem::start_preparing)?;
        self.set_status(OrderStatus::Preparing, None, now);
        Ok(())
    }

    /// Preparing -> Shipping, handing the parcel over under `tracking_number`.
    pub fn start_shipping(
        &mut self,
        tracking_number: &str,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        let tracking_number = tracking_number.trim();
        if tracking_number.is_empty() {
            return Err(DomainError::validation("tracking number cannot be empty"));
        }
        self.ensure_transition(OrderStatus::Shipping)?;
        self.for_live_items(OrderItem::start_shipping)?;
        self.tracking_number = Some(tracking_number.to_string());
        self.set_status(
            OrderStatus::Shipping,
            Some(format!("tracking number {tracking_number}")),
            now,
        );
        Ok(())
    }

    /// Shipping -> Delivered.
    pub fn complete_delivery(&mut self, now: DateTime<Utc>) -> DomainResult<()> {
        self.ensure_transition(OrderStatus::Delivered)?;
        self.for_live_items(OrderItem::complete_delivery)?;
        self.set_status(OrderStatus::Delivered, None, now);
        Ok(())
    }

    /// Delivered -> Completed (purchase confirmed by the buyer).
    pub fn complete(&mut self, now: DateTime<Utc>) -> DomainResult<()> {
        self.ensure_transition(OrderStatus::Completed)?;
        self.set_status(OrderStatus::Completed, None, now);
        Ok(())
    }

    /// Open a refund for a delivered line and return the refundable amount.
    ///
    /// At most one refund per line may be open; a rejected request can be
    /// followed by a new one.
    pub fn request_refund(
        &mut self,
        item_id: OrderItemId,
        reason: &str,
        now: DateTime<Utc>,
    ) -> DomainResult<Money> {
        if !self.status.is_refundable() {
            return Err(DomainError::invariant(format!(
                "order {} cannot be refunded in status {}",
                self.id, self.status
            )));
        }
        let item = find_by_id(&self.items, &item_id).ok_or_else(|| {
            DomainError::not_found(format!("order item {item_id} in order {}", self.id))
        })?;
        if !item.status().is_refundable() {
            return Err(DomainError::invariant(format!(
                "order item {item_id} cannot be refunded in status {}",
                item.status()
            )));
        }
        if self.open_refund(item_id).is_some() {
            return Err(DomainError::invariant(format!(
                "order item {item_id} already has an open refund"
            )));
        }

        let refund = OrderRefund::request(item_id, reason, item.total_price(), now)?;
        let amount = refund.refund_amount();
        self.record(OrderEvent::OrderRefundRequested(OrderRefundRequested {
            order_id: self.id,
            member_id: self.member_id,
            order_number: self.order_number.clone(),
            order_item_id: item_id,
            refund_amount: amount,
            reason: refund.reason().to_string(),
            occurred_at: now,
        }));
        self.refunds.push(refund);
        self.updated_at = now;
        Ok(amount)
    }

    pub fn approve_refund(&mut self, item_id: OrderItemId, now: DateTime<Utc>) -> DomainResult<()> {
        self.open_refund_mut(item_id)?.approve()?;
        self.updated_at = now;
        Ok(())
    }

    pub fn reject_refund(&mut self, item_id: OrderItemId, now: DateTime<Utc>) -> DomainResult<()> {
        self.open_refund_mut(item_id)?.reject()?;
        self.updated_at = now;
        Ok(())
    }

    /// Pay out an approved refund and mark the line `Refunded`. When no live
    /// line is left the order becomes `Refunded`; the return value tells
    /// whether that happened.
    pub fn complete_refund(
        &mut self,
        item_id: OrderItemId,
        now: DateTime<Utc>,
    ) -> DomainResult<bool> {
        let cascades = self
            .items
            .iter()
            .all(|i| *i.id() == item_id || i.status().is_closed());
        if cascades {
            self.ensure_transition(OrderStatus::Refunded)?;
        }
        if let Some(item) = self.item(item_id) {
            if !item.status().is_refundable() {
                return Err(DomainError::invariant(format!(
                    "order item {item_id} cannot be refunded in status {}",
                    item.status()
                )));
            }
        }

        let refund_amount = {
            let refund = self.open_refund_mut(item_id)?;
            refund.complete(now)?;
            refund.refund_amount()
        };
        let item = find_by_id_mut(&mut self.items, &item_id).ok_or_else(|| {
            DomainError::not_found(format!("order item {item_id} in order {}", self.id))
        })?;
        item.refund()?;

        let event = OrderItemRefunded {
            order_id: self.id,
            member_id: self.member_id,
            order_number: self.order_number.clone(),
            order_item_id: item_id,
            product_id: item.product_id(),
            quantity: item.quantity(),
            refund_amount,
            occurred_at: now,
        };
        self.record(OrderEvent::OrderItemRefunded(event));
        self.updated_at = now;

        if cascades {
            self.set_status(OrderStatus::Refunded, None, now);
        }
        Ok(cascades)
    }

    fn ensure_transition(&self, next: OrderStatus) -> DomainResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(DomainError::invariant(format!(
                "order {} cannot move from {} to {next}",
                self.id, self.status
            )));
        }
        Ok(())
    }

    fn set_status(&mut self, next: OrderStatus, note: Option<String>, now: DateTime<Utc>) {
        self.status = next;
        self.updated_at = now;
        self.status_history.push(StatusChange {
            status: next,
            note,
            changed_at: now,
        });
    }

    fn open_refund(&self, item_id: OrderItemId) -> Option<&OrderRefund> {
        self.refunds
            .iter()
            .find(|r| r.order_item_id() == item_id && r.status().is_open())
    }

    fn open_refund_mut(&mut self, item_id: OrderItemId) -> DomainResult<&mut OrderRefund> {
        let order_id = self.id;
        self.refunds
            .iter_mut()
            .find(|r| r.order_item_id() == item_id && r.status().is_open())
            .ok_or_else(|| {
                DomainError::not_found(format!(
                    "open refund for order item {item_id} in order {order_id}"
                ))
            })
    }

    fn for_live_items(
        &mut self,
        mut step: impl FnMut(&mut OrderItem) -> DomainResult<()>,
    ) -> DomainResult<()> {
        self.items
            .iter_mut()
            .filter(|i| i.status() != OrderItemStatus::Cancelled)
            .try_for_each(|i| step(i))
    }

    fn mark_cancelled(&mut self, reason: &str, refund_amount: Money, now: DateTime<Utc>) {
        self.cancel_reason = Some(reason.to_string());
        self.set_status(OrderStatus::Cancelled, Some(reason.to_string()), now);
        self.record(OrderEvent::OrderCancelled(OrderCancelled {
            order_id: self.id,
            member_id: self.member_id,
            order_number: self.order_number.clone(),
            refund_amount,
            reason: reason.to_string(),
            occurred_at: now,
        }));
    }

    fn record(&mut self, event: OrderEvent) {
        self.pending_events.push(event);
    }
}

impl AggregateRoot for Order {
    type Id = OrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use commerce_core::ProductId;

    use crate::item::ItemSnapshot;
    use crate::refund::RefundStatus;
    use crate::values::Quantity;

    fn address() -> ShippingAddress {
        ShippingAddress::new("Lee Jun", "010-2222-3333", "04524", "Sejong-daero 110", "", None)
            .unwrap()
    }

    fn item(id: i64, price: u64, discount: u64, qty: u32) -> OrderItem {
        OrderItem::new(
            OrderItemId::try_new(id).unwrap(),
            ItemSnapshot {
                product_id: ProductId::try_new(100 + id).unwrap(),
                product_name: format!("product-{id}"),
                option: None,
                unit_price: Money::new(price),
                unit_discount: Money::new(discount),
                quantity: Quantity::new(qty).unwrap(),
            },
        )
        .unwrap()
    }

    fn order_with(items: Vec<OrderItem>) -> Order {
        Order::create(
            OrderId::try_new(7).unwrap(),
            MemberId::try_new(1).unwrap(),
            address(),
            items,
            Utc::now(),
        )
        .unwrap()
    }

    fn paid_order() -> Order {
        let mut order = order_with(vec![item(1, 1_000, 100, 2), item(2, 5_000, 0, 1)]);
        order
            .confirm_with_payment(PaymentId::try_new(9).unwrap(), PaymentMethod::CreditCard, Utc::now())
            .unwrap();
        order.take_events();
        order
    }

    fn event_types(order: &Order) -> Vec<&'static str> {
        use commerce_events::Event;
        order.pending_events().iter().map(|e| e.event_type()).collect()
    }

    #[test]
    fn create_computes_amounts_and_records_created() {
        let order = order_with(vec![item(1, 1_000, 100, 2), item(2, 5_000, 0, 1)]);

        assert_eq!(order.original_amount(), Money::new(7_000));
        assert_eq!(order.discount_amount(), Money::new(200));
        assert_eq!(order.total_amount(), Money::new(6_800));
        assert_eq!(order.status(), OrderStatus::Pending);
        assert_eq!(order.version(), 0);
        assert!(order.validate_amounts());
        assert!(order.order_number().as_str().ends_with("-7"));
        assert_eq!(event_types(&order), vec!["order.created"]);
    }

    #[test]
    fn create_rejects_empty_and_duplicate_items() {
        let empty = Order::create(
            OrderId::try_new(7).unwrap(),
            MemberId::try_new(1).unwrap(),
            address(),
            vec![],
            Utc::now(),
        );
        assert_eq!(empty.unwrap_err().code(), "validation_error");

        let dup = Order::create(
            OrderId::try_new(7).unwrap(),
            MemberId::try_new(1).unwrap(),
            address(),
            vec![item(1, 10, 0, 1), item(1, 20, 0, 1)],
            Utc::now(),
        );
        assert!(dup.is_err());
    }

    #[test]
    fn payment_confirms_order_and_items() {
        let mut order = order_with(vec![item(1, 1_000, 0, 2)]);
        order.take_events();

        order
            .confirm_with_payment(PaymentId::try_new(3).unwrap(), PaymentMethod::BankTransfer, Utc::now())
            .unwrap();

        assert_eq!(order.status(), OrderStatus::Paid);
        assert!(order.items().iter().all(|i| i.status() == OrderItemStatus::Confirmed));
        assert_eq!(order.payments().len(), 1);
        assert_eq!(order.payments()[0].amount(), Money::new(2_000));
        assert_eq!(event_types(&order), vec!["order.paid"]);

        let again = order.confirm_with_payment(
            PaymentId::try_new(4).unwrap(),
            PaymentMethod::BankTransfer,
            Utc::now(),
        );
        assert_eq!(again.unwrap_err().code(), "invariant_violation");
    }

    #[test]
    fn cancel_moves_every_item_and_reports_refund() {
        let mut order = paid_order();

        let cancelled = order.cancel("changed my mind", Utc::now()).unwrap();

        assert_eq!(cancelled.len(), 2);
        assert_eq!(order.status(), OrderStatus::Cancelled);
        assert_eq!(order.cancel_reason(), Some("changed my mind"));
        assert!(order.items().iter().all(OrderItem::is_cancelled));
        match order.pending_events() {
            [OrderEvent::OrderCancelled(e)] => assert_eq!(e.refund_amount, Money::new(6_800)),
            other => panic!("unexpected events: {other:?}"),
        }
    }

    #[test]
    fn cancel_skips_items_already_cancelled() {
        let mut order = paid_order();
        order
            .cancel_item(OrderItemId::try_new(1).unwrap(), "wrong size", Utc::now())
            .unwrap();
        order.take_events();

        let cancelled = order.cancel("rest of it", Utc::now()).unwrap();

        assert_eq!(cancelled, vec![OrderItemId::try_new(2).unwrap()]);
        match order.pending_events() {
            [OrderEvent::OrderCancelled(e)] => assert_eq!(e.refund_amount, Money::new(5_000)),
            other => panic!("unexpected events: {other:?}"),
        }
    }

    #[test]
    fn shipped_orders_cannot_be_cancelled() {
        let mut order = paid_order();
        order.start_preparing(Utc::now()).unwrap();
        order.start_shipping("CJ-1234567890", Utc::now()).unwrap();

        assert_eq!(
            order.cancel("late", Utc::now()).unwrap_err().code(),
            "invariant_violation"
        );
        assert!(order
            .cancel_item(OrderItemId::try_new(1).unwrap(), "late", Utc::now())
            .is_err());
    }

    #[test]
    fn cancelling_a_non_last_item_keeps_order_status() {
        let mut order = paid_order();

        let cascaded = order
            .cancel_item(OrderItemId::try_new(1).unwrap(), "wrong size", Utc::now())
            .unwrap();

        assert!(!cascaded);
        assert_eq!(order.status(), OrderStatus::Paid);
        assert_eq!(event_types(&order), vec!["order.item_cancelled"]);
    }

    #[test]
    fn cancelling_the_last_item_cascades() {
        let mut order = paid_order();
        order
            .cancel_item(OrderItemId::try_new(1).unwrap(), "a", Utc::now())
            .unwrap();
        order.take_events();

        let cascaded = order
            .cancel_item(OrderItemId::try_new(2).unwrap(), "b", Utc::now())
            .unwrap();

        assert!(cascaded);
        assert_eq!(order.status(), OrderStatus::Cancelled);
        assert_eq!(
            event_types(&order),
            vec!["order.item_cancelled", "order.cancelled"]
        );
        match &order.pending_events()[1] {
            OrderEvent::OrderCancelled(e) => assert_eq!(e.refund_amount, Money::new(5_000)),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn cancel_item_reports_missing_and_repeated_items() {
        let mut order = paid_order();

        let missing = order.cancel_item(OrderItemId::try_new(99).unwrap(), "x", Utc::now());
        assert_eq!(missing.unwrap_err().code(), "not_found");

        order
            .cancel_item(OrderItemId::try_new(1).unwrap(), "x", Utc::now())
            .unwrap();
        let repeated = order.cancel_item(OrderItemId::try_new(1).unwrap(), "x", Utc::now());
        assert_eq!(repeated.unwrap_err().code(), "invariant_violation");
    }

    #[test]
    fn full_lifecycle_skips_cancelled_items() {
        let mut order = paid_order();
        order
            .cancel_item(OrderItemId::try_new(1).unwrap(), "x", Utc::now())
            .unwrap();

        order.start_preparing(Utc::now()).unwrap();
        order.start_shipping("CJ-1234567890", Utc::now()).unwrap();
        order.complete_delivery(Utc::now()).unwrap();
        order.complete(Utc::now()).unwrap();

        assert_eq!(order.status(), OrderStatus::Completed);
        assert_eq!(
            order.item(OrderItemId::try_new(1).unwrap()).unwrap().status(),
            OrderItemStatus::Cancelled
        );
        assert_eq!(
            order.item(OrderItemId::try_new(2).unwrap()).unwrap().status(),
            OrderItemStatus::Delivered
        );
    }

    #[test]
    fn lifecycle_steps_cannot_be_skipped() {
        let mut order = paid_order();
        assert!(order.start_shipping("CJ-1234567890", Utc::now()).is_err());
        assert!(order.complete(Utc::now()).is_err());

        let mut pending = order_with(vec![item(1, 10, 0, 1)]);
        assert!(pending.start_preparing(Utc::now()).is_err());
    }

    fn delivered_order() -> Order {
        let mut order = paid_order();
        order.start_preparing(Utc::now()).unwrap();
        order.start_shipping("CJ-1234567890", Utc::now()).unwrap();
        order.complete_delivery(Utc::now()).unwrap();
        order
    }

    fn id(v: i64) -> OrderItemId {
        OrderItemId::try_new(v).unwrap()
    }

    #[test]
    fn shipping_keeps_the_tracking_number() {
        let mut order = paid_order();
        order.start_preparing(Utc::now()).unwrap();

        assert_eq!(
            order.start_shipping("   ", Utc::now()).unwrap_err().code(),
            "validation_error"
        );
        assert_eq!(order.status(), OrderStatus::Preparing);

        order.start_shipping(" CJ-1234567890 ", Utc::now()).unwrap();
        assert_eq!(order.tracking_number(), Some("CJ-1234567890"));
        assert_eq!(
            order.status_history().last().unwrap().note.as_deref(),
            Some("tracking number CJ-1234567890")
        );
    }

    #[test]
    fn status_history_follows_every_transition() {
        let mut order = delivered_order();
        order.complete(Utc::now()).unwrap();

        let statuses: Vec<OrderStatus> = order.status_history().iter().map(|c| c.status).collect();
        assert_eq!(
            statuses,
            vec![
                OrderStatus::Pending,
                OrderStatus::Paid,
                OrderStatus::Preparing,
                OrderStatus::Shipping,
                OrderStatus::Delivered,
                OrderStatus::Completed,
            ]
        );

        let mut cancelled = paid_order();
        cancelled.cancel("duplicate", Utc::now()).unwrap();
        let last = cancelled.status_history().last().unwrap();
        assert_eq!(last.status, OrderStatus::Cancelled);
        assert_eq!(last.note.as_deref(), Some("duplicate"));
    }

    #[test]
    fn refunds_need_a_delivered_order() {
        let mut order = paid_order();
        let err = order.request_refund(id(1), "broken", Utc::now()).unwrap_err();
        assert_eq!(err.code(), "invariant_violation");
        assert!(order.refunds().is_empty());
    }

    #[test]
    fn refund_request_records_amount_and_event() {
        let mut order = delivered_order();
        order.take_events();

        let amount = order.request_refund(id(1), "broken on arrival", Utc::now()).unwrap();

        assert_eq!(amount, Money::new(1_800));
        assert_eq!(order.refunds().len(), 1);
        assert_eq!(order.refunds()[0].status(), RefundStatus::Requested);
        assert_eq!(event_types(&order), vec!["order.refund_requested"]);

        let again = order.request_refund(id(1), "still broken", Utc::now());
        assert_eq!(again.unwrap_err().code(), "invariant_violation");
        let missing = order.request_refund(id(99), "x", Utc::now());
        assert_eq!(missing.unwrap_err().code(), "not_found");
    }

    #[test]
    fn rejected_refund_can_be_requested_again() {
        let mut order = delivered_order();
        order.request_refund(id(1), "scratched", Utc::now()).unwrap();
        order.reject_refund(id(1), Utc::now()).unwrap();

        assert!(order.complete_refund(id(1), Utc::now()).is_err());
        order.request_refund(id(1), "scratched, photos attached", Utc::now()).unwrap();

        let statuses: Vec<RefundStatus> = order.refunds().iter().map(|r| r.status()).collect();
        assert_eq!(statuses, vec![RefundStatus::Rejected, RefundStatus::Requested]);
    }

    #[test]
    fn completing_a_refund_without_approval_fails() {
        let mut order = delivered_order();
        order.request_refund(id(1), "scratched", Utc::now()).unwrap();

        let err = order.complete_refund(id(1), Utc::now()).unwrap_err();

        assert_eq!(err.code(), "invariant_violation");
        assert_eq!(order.item(id(1)).unwrap().status(), OrderItemStatus::Delivered);
    }

    #[test]
    fn refunding_every_live_line_refunds_the_order() {
        let mut order = delivered_order();
        order.complete(Utc::now()).unwrap();
        order.take_events();

        order.request_refund(id(1), "a", Utc::now()).unwrap();
        order.approve_refund(id(1), Utc::now()).unwrap();
        assert!(!order.complete_refund(id(1), Utc::now()).unwrap());
        assert_eq!(order.status(), OrderStatus::Completed);
        assert_eq!(order.item(id(1)).unwrap().status(), OrderItemStatus::Refunded);

        order.request_refund(id(2), "b", Utc::now()).unwrap();
        order.approve_refund(id(2), Utc::now()).unwrap();
        assert!(order.complete_refund(id(2), Utc::now()).unwrap());

        assert_eq!(order.status(), OrderStatus::Refunded);
        assert!(order.refunds().iter().all(|r| r.refunded_at().is_some()));
        assert_eq!(
            order.status_history().last().unwrap().status,
            OrderStatus::Refunded
        );
        assert_eq!(
            event_types(&order),
            vec![
                "order.refund_requested",
                "order.item_refunded",
                "order.refund_requested",
                "order.item_refunded",
            ]
        );
    }

    #[test]
    fn cancelled_lines_do_not_block_the_refund_cascade() {
        let mut order = paid_order();
        order.cancel_item(id(1), "not needed", Utc::now()).unwrap();
        order.start_preparing(Utc::now()).unwrap();
        order.start_shipping("CJ-1", Utc::now()).unwrap();
        order.complete_delivery(Utc::now()).unwrap();

        order.request_refund(id(2), "defect", Utc::now()).unwrap();
        assert_eq!(
            order.request_refund(id(1), "x", Utc::now()).unwrap_err().code(),
            "invariant_violation"
        );
        order.approve_refund(id(2), Utc::now()).unwrap();

        assert!(order.complete_refund(id(2), Utc::now()).unwrap());
        assert_eq!(order.status(), OrderStatus::Refunded);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        fn line() -> impl Strategy<Value = (u64, u64, u32)> {
            (0u64..1_000_000, 1u32..=999).prop_flat_map(|(price, qty)| {
                (Just(price), 0..=price, Just(qty))
            })
        }

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 300,
                ..ProptestConfig::default()
            })]

            /// Property: total = original - discount = sum of line totals.
            #[test]
            fn amounts_are_consistent(lines in proptest::collection::vec(line(), 1..12)) {
                let items: Vec<OrderItem> = lines
                    .iter()
                    .enumerate()
                    .map(|(i, (price, discount, qty))| item(i as i64 + 1, *price, *discount, *qty))
                    .collect();

                let order = order_with(items);

                let expected_original: u64 = lines.iter().map(|(p, _, q)| p * u64::from(*q)).sum();
                let expected_discount: u64 = lines.iter().map(|(_, d, q)| d * u64::from(*q)).sum();

                prop_assert_eq!(order.original_amount().amount(), expected_original);
                prop_assert_eq!(order.discount_amount().amount(), expected_discount);
                prop_assert_eq!(order.total_amount().amount(), expected_original - expected_discount);
                prop_assert!(order.validate_amounts());
            }
        }
    }
}
