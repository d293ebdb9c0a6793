//! [`EventPublisher`] adapters.

use commerce_events::{EventBus, EventEnvelope};
use commerce_orders::{DomainEvent, EventPublisher, PublishError};
use serde_json::Value as JsonValue;

/// Type-erased envelope carried on the bus.
pub type JsonEnvelope = EventEnvelope<JsonValue>;

/// Writes every event to the log and nowhere else.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingEventPublisher;

impl EventPublisher for LoggingEventPublisher {
    fn publish(&self, event: &DomainEvent) -> Result<(), PublishError> {
        tracing::info!(
            event_id = %event.event_id(),
            event_type = event.event_type(),
            aggregate_type = event.aggregate_type(),
            aggregate_id = event.aggregate_id(),
            occurred_at = %event.occurred_at(),
            "domain event"
        );
        Ok(())
    }
}

/// Serializes events to JSON envelopes and fans them out on an [`EventBus`].
#[derive(Debug)]
pub struct BusEventPublisher<B> {
    bus: B,
}

impl<B> BusEventPublisher<B> {
    pub fn new(bus: B) -> Self {
        Self { bus }
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }
}

impl<B> EventPublisher for BusEventPublisher<B>
where
    B: EventBus<JsonEnvelope>,
{
    fn publish(&self, event: &DomainEvent) -> Result<(), PublishError> {
        let envelope = event.to_json().map_err(|e| PublishError(e.to_string()))?;
        self.bus
            .publish(envelope)
            .map_err(|e| PublishError(e.to_string()))?;
        tracing::debug!(
            event_type = event.event_type(),
            aggregate_id = event.aggregate_id(),
            "event published to bus"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use commerce_core::{MemberId, OrderId};
    use commerce_events::InMemoryEventBus;
    use commerce_orders::{Money, OrderCancelled, OrderEvent, OrderNumber};
    use std::sync::Arc;

    fn cancelled() -> DomainEvent {
        let order_id = OrderId::try_new(42).unwrap();
        let now = Utc::now();
        OrderEvent::OrderCancelled(OrderCancelled {
            order_id,
            member_id: MemberId::try_new(1).unwrap(),
            order_number: OrderNumber::generate(now, order_id),
            refund_amount: Money::new(2_000),
            reason: "changed my mind".into(),
            occurred_at: now,
        })
        .into_envelope()
    }

    #[test]
    fn bus_subscribers_receive_json_envelopes() {
        let bus: Arc<InMemoryEventBus<JsonEnvelope>> = Arc::new(InMemoryEventBus::new());
        let sub = bus.subscribe();
        let publisher = BusEventPublisher::new(bus);

        publisher.publish(&cancelled()).unwrap();

        let received = sub.try_recv().unwrap();
        assert_eq!(received.event_type(), "order.cancelled");
        assert_eq!(received.aggregate_type(), "order");
        assert_eq!(received.aggregate_id(), 42);
        assert_eq!(received.payload()["OrderCancelled"]["refund_amount"], 2_000);
    }

    #[test]
    fn logging_publisher_never_fails() {
        assert!(LoggingEventPublisher.publish(&cancelled()).is_ok());
    }
}
