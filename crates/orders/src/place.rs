//! Order placement workflow.
//!
//! ```text
//! PlaceOrderCommand
//!   ↓
//! 1. Validate the command shape (ids, quantities, shipping address)
//!   ↓
//! 2. Check availability of every line and its option (no side effects yet)
//!   ↓
//! 3. Reserve stock line by line; a failure releases the lines reserved so far
//!   ↓
//! 4. Snapshot prices, create the order, settle synchronous payments, save
//!    (any failure here releases every reserved line)
//!   ↓
//! 5. Publish the recorded events (failures are logged, never surfaced)
//! ```
//!
//! Stock is only held once step 3 starts, so steps 1 and 2 can fail without
//! compensation.

use chrono::Utc;

use commerce_core::{IdGenerator, OrderId, OrderItemId, PaymentId};

use crate::command::{OrderLine, OrderResult, PlaceOrderCommand, ValidatedPlaceOrder};
use crate::compensation::{StockLine, publish_events, release_lines};
use crate::error::OrderError;
use crate::events::OrderEvent;
use crate::item::{ItemSnapshot, OrderItem};
use crate::order::Order;
use crate::ports::{EventPublisher, OrderRepository, ProductService};
use crate::values::ProductOption;

pub trait PlaceOrderUseCase: Send + Sync {
    fn place_order(&self, command: &PlaceOrderCommand) -> Result<OrderResult, OrderError>;
}

impl<U> PlaceOrderUseCase for std::sync::Arc<U>
where
    U: PlaceOrderUseCase + ?Sized,
{
    fn place_order(&self, command: &PlaceOrderCommand) -> Result<OrderResult, OrderError> {
        (**self).place_order(command)
    }
}

/// Places orders against the injected ports.
///
/// - `R`: order repository
/// - `P`: product service (availability, reservation, catalog snapshots)
/// - `E`: event publisher
/// - `G`: id generator for order, item and payment ids
#[derive(Debug)]
pub struct PlaceOrderService<R, P, E, G> {
    orders: R,
    products: P,
    publisher: E,
    ids: G,
}

impl<R, P, E, G> PlaceOrderService<R, P, E, G> {
    pub fn new(orders: R, products: P, publisher: E, ids: G) -> Self {
        Self {
            orders,
            products,
            publisher,
            ids,
        }
    }
}

impl<R, P, E, G> PlaceOrderService<R, P, E, G>
where
    R: OrderRepository,
    P: ProductService,
    E: EventPublisher,
    G: IdGenerator,
{
    fn ensure_available(&self, lines: &[OrderLine]) -> Result<(), OrderError> {
        for line in lines {
            if !self
                .products
                .check_availability(line.product_id, line.quantity)?
            {
                tracing::warn!(
                    product_id = %line.product_id,
                    quantity = %line.quantity,
                    "product unavailable for requested quantity"
                );
                return Err(OrderError::InsufficientStock {
                    product_id: line.product_id,
                });
            }
            if let Some(option_id) = line.option_id {
                let option = self
                    .products
                    .get_product_option_info(line.product_id, option_id)?;
                if !option.available {
                    tracing::warn!(
                        product_id = %line.product_id,
                        option_id = %option_id,
                        "product option unavailable"
                    );
                    return Err(OrderError::InsufficientStock {
                        product_id: line.product_id,
                    });
                }
            }
        }
        Ok(())
    }

    fn reserve_all(&self, lines: &[StockLine]) -> Result<(), OrderError> {
        for (reserved, line) in lines.iter().enumerate() {
            if let Err(err) = self.products.reserve_stock(line.product_id, line.quantity) {
                tracing::warn!(
                    product_id = %line.product_id,
                    quantity = %line.quantity,
                    reserved,
                    error = %err,
                    "stock reservation failed, releasing earlier lines"
                );
                release_lines(&self.products, &lines[..reserved]);
                return Err(err.into());
            }
        }
        Ok(())
    }

    fn snapshot(&self, line: &OrderLine) -> Result<ItemSnapshot, OrderError> {
        let product = self.products.get_product_info(line.product_id)?;

        let (option, unit_price, unit_discount) = match line.option_id {
            Some(option_id) => {
                let info = self
                    .products
                    .get_product_option_info(line.product_id, option_id)?;
                if !info.available {
                    return Err(OrderError::InsufficientStock {
                        product_id: line.product_id,
                    });
                }
                (
                    Some(ProductOption {
                        id: info.id,
                        name: info.name,
                    }),
                    info.price,
                    info.discount_price,
                )
            }
            None => (None, product.price, product.discount_price),
        };

        Ok(ItemSnapshot {
            product_id: line.product_id,
            product_name: product.name,
            option,
            unit_price,
            unit_discount,
            quantity: line.quantity,
        })
    }

    /// Step 4. Runs with every line already reserved.
    fn create_and_save(
        &self,
        request: &ValidatedPlaceOrder,
    ) -> Result<(Order, Vec<OrderEvent>), OrderError> {
        let items = request
            .lines
            .iter()
            .map(|line| -> Result<OrderItem, OrderError> {
                let snapshot = self.snapshot(line)?;
                let item_id = OrderItemId::try_new(self.ids.generate_id()?)?;
                Ok(OrderItem::new(item_id, snapshot)?)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let now = Utc::now();
        let order_id = OrderId::try_new(self.ids.generate_id()?)?;
        let mut order = Order::create(
            order_id,
            request.member_id,
            request.shipping_address.clone(),
            items,
            now,
        )?;

        if request.payment_method.is_synchronous() {
            let payment_id = PaymentId::try_new(self.ids.generate_id()?)?;
            order.confirm_with_payment(payment_id, request.payment_method, now)?;
        } else {
            tracing::debug!(
                order_id = %order_id,
                payment_method = %request.payment_method,
                "awaiting asynchronous payment"
            );
        }

        let events = order.take_events();
        let saved = self.orders.save(&order)?;
        Ok((saved, events))
    }
}

impl<R, P, E, G> PlaceOrderUseCase for PlaceOrderService<R, P, E, G>
where
    R: OrderRepository,
    P: ProductService,
    E: EventPublisher,
    G: IdGenerator,
{
    fn place_order(&self, command: &PlaceOrderCommand) -> Result<OrderResult, OrderError> {
        let request = command.validate()?;
        tracing::info!(
            member_id = %request.member_id,
            lines = request.lines.len(),
            payment_method = %request.payment_method,
            "placing order"
        );

        self.ensure_available(&request.lines)?;

        let reserved: Vec<StockLine> = request
            .lines
            .iter()
            .map(|line| StockLine {
                order_item_id: None,
                product_id: line.product_id,
                quantity: line.quantity,
            })
            .collect();
        self.reserve_all(&reserved)?;

        let (order, events) = match self.create_and_save(&request) {
            Ok(saved) => saved,
            Err(err) => {
                tracing::error!(
                    member_id = %request.member_id,
                    error = %err,
                    code = err.code(),
                    "order creation failed, releasing reserved stock"
                );
                release_lines(&self.products, &reserved);
                return Err(err);
            }
        };

        publish_events(&self.publisher, events);

        tracing::info!(
            order_id = %order.order_id(),
            order_number = %order.order_number(),
            total_amount = %order.total_amount(),
            status = %order.status(),
            "order placed"
        );
        Ok(OrderResult::from(&order))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{OrderItemCommand, ShippingInfo};
    use crate::status::{OrderItemStatus, OrderStatus};
    use crate::test_support::{
        FakeOrderRepository, FakeProductService, RecordingPublisher, SequentialIds,
    };
    use crate::values::PaymentMethod;
    use std::sync::Arc;

    type Service = PlaceOrderService<
        Arc<FakeOrderRepository>,
        Arc<FakeProductService>,
        Arc<RecordingPublisher>,
        Arc<SequentialIds>,
    >;

    struct Harness {
        orders: Arc<FakeOrderRepository>,
        products: Arc<FakeProductService>,
        publisher: Arc<RecordingPublisher>,
        ids: Arc<SequentialIds>,
        service: Service,
    }

    fn harness() -> Harness {
        let products = Arc::new(
            FakeProductService::default()
                .with_product(10, "Keyboard", 1_500, 0)
                .with_option(10, 1, "Black", 1_000, 0)
                .with_product(20, "Mouse", 800, 100)
                .with_product(30, "Monitor", 200_000, 20_000),
        );
        let orders = Arc::new(FakeOrderRepository::default());
        let publisher = Arc::new(RecordingPublisher::default());
        let ids = Arc::new(SequentialIds::default());
        let service = PlaceOrderService::new(
            orders.clone(),
            products.clone(),
            publisher.clone(),
            ids.clone(),
        );
        Harness {
            orders,
            products,
            publisher,
            ids,
            service,
        }
    }

    fn command(items: &[(i64, Option<i64>, u32)], method: PaymentMethod) -> PlaceOrderCommand {
        PlaceOrderCommand {
            member_id: 1,
            shipping_info: ShippingInfo {
                recipient_name: "Kim Minji".into(),
                phone_number: "010-1234-5678".into(),
                address_code: "06236".into(),
                address: "Teheran-ro 123".into(),
                address_detail: "5F".into(),
                delivery_request: Some("leave at the door".into()),
            },
            order_items: items
                .iter()
                .map(|&(product_id, product_option_id, quantity)| OrderItemCommand {
                    product_id,
                    product_option_id,
                    quantity,
                })
                .collect(),
            payment_method: method,
        }
    }

    #[test]
    fn card_order_with_option_is_paid_at_option_price() {
        let h = harness();

        let result = h
            .service
            .place_order(&command(&[(10, Some(1), 2)], PaymentMethod::CreditCard))
            .unwrap();

        assert_eq!(result.member_id, 1);
        assert_eq!(result.total_amount, 2_000);
        assert_eq!(result.status, OrderStatus::Paid);
        assert_eq!(result.order_items.len(), 1);
        assert_eq!(result.order_items[0].product_option_id, Some(1));
        assert_eq!(result.order_items[0].status, OrderItemStatus::Confirmed);
        assert!(result.order_number.starts_with("ORD-"));

        assert_eq!(h.products.reserved(), vec![(10, 2)]);
        assert!(h.products.released().is_empty());
        assert_eq!(
            h.publisher.event_types(),
            vec!["order.created", "order.paid"]
        );

        let stored = h
            .orders
            .stored(OrderId::try_new(result.order_id).unwrap())
            .unwrap();
        assert_eq!(stored.payments().len(), 1);
        assert!(stored.validate_amounts());
    }

    #[test]
    fn totals_are_original_minus_discount() {
        let h = harness();

        let result = h
            .service
            .place_order(&command(
                &[(20, None, 3), (30, None, 1)],
                PaymentMethod::BankTransfer,
            ))
            .unwrap();

        assert_eq!(result.original_amount, 3 * 800 + 200_000);
        assert_eq!(result.discount_amount, 3 * 100 + 20_000);
        assert_eq!(
            result.total_amount,
            result.original_amount - result.discount_amount
        );
        let subtotal_sum: u64 = result.order_items.iter().map(|i| i.subtotal).sum();
        assert_eq!(subtotal_sum, result.total_amount);
    }

    #[test]
    fn virtual_account_order_stays_pending() {
        let h = harness();

        let result = h
            .service
            .place_order(&command(&[(20, None, 1)], PaymentMethod::VirtualAccount))
            .unwrap();

        assert_eq!(result.status, OrderStatus::Pending);
        assert_eq!(result.order_items[0].status, OrderItemStatus::Pending);
        assert_eq!(h.publisher.event_types(), vec!["order.created"]);
    }

    #[test]
    fn unavailable_line_fails_before_any_reservation() {
        let h = harness();
        h.products.mark_unavailable(30);

        let err = h
            .service
            .place_order(&command(
                &[(20, None, 1), (30, None, 1)],
                PaymentMethod::CreditCard,
            ))
            .unwrap_err();

        assert!(matches!(err, OrderError::InsufficientStock { product_id } if product_id.value() == 30));
        assert!(h.products.reserved().is_empty());
        assert_eq!(h.orders.len(), 0);
        assert!(h.publisher.event_types().is_empty());
    }

    #[test]
    fn reservation_failure_releases_earlier_lines_only() {
        let h = harness();
        h.products.fail_reserve_for(30);

        let err = h
            .service
            .place_order(&command(
                &[(10, None, 2), (20, None, 1), (30, None, 4)],
                PaymentMethod::CreditCard,
            ))
            .unwrap_err();

        assert_eq!(err.code(), "insufficient_stock");
        assert_eq!(h.products.reserved(), vec![(10, 2), (20, 1), (30, 4)]);
        assert_eq!(h.products.released(), vec![(10, 2), (20, 1)]);
        assert_eq!(h.orders.len(), 0);
    }

    #[test]
    fn first_line_reservation_failure_releases_nothing() {
        let h = harness();
        h.products.fail_reserve_for(10);

        h.service
            .place_order(&command(&[(10, None, 1), (20, None, 1)], PaymentMethod::CreditCard))
            .unwrap_err();

        assert_eq!(h.products.reserved(), vec![(10, 1)]);
        assert!(h.products.released().is_empty());
    }

    #[test]
    fn save_failure_releases_every_reserved_line() {
        let h = harness();
        *h.orders.fail_saves.lock().unwrap() = true;

        let err = h
            .service
            .place_order(&command(&[(10, None, 2), (20, None, 1)], PaymentMethod::CreditCard))
            .unwrap_err();

        assert_eq!(err.code(), "repository_error");
        assert_eq!(h.products.released(), vec![(10, 2), (20, 1)]);
        assert!(h.publisher.event_types().is_empty());
    }

    #[test]
    fn id_generation_failure_releases_reserved_lines() {
        let h = harness();
        *h.ids.fail.lock().unwrap() = true;

        let err = h
            .service
            .place_order(&command(&[(20, None, 1)], PaymentMethod::CreditCard))
            .unwrap_err();

        assert_eq!(err.code(), "id_generation_error");
        assert_eq!(h.products.released(), vec![(20, 1)]);
    }

    #[test]
    fn unknown_option_fails_before_reserving() {
        let h = harness();

        let err = h
            .service
            .place_order(&command(&[(20, Some(9), 1)], PaymentMethod::CreditCard))
            .unwrap_err();

        assert_eq!(err.code(), "product_service_error");
        assert!(h.products.reserved().is_empty());
        assert!(h.products.released().is_empty());
    }

    #[test]
    fn unavailable_option_is_out_of_stock_before_any_reservation() {
        let h = harness();
        h.products.mark_option_unavailable(10, 1);

        let err = h
            .service
            .place_order(&command(
                &[(20, None, 1), (10, Some(1), 1)],
                PaymentMethod::CreditCard,
            ))
            .unwrap_err();

        assert!(
            matches!(err, OrderError::InsufficientStock { product_id } if product_id.value() == 10)
        );
        assert!(h.products.reserved().is_empty());
        assert!(h.products.released().is_empty());
        assert_eq!(h.orders.len(), 0);
    }

    #[test]
    fn publish_failure_does_not_fail_placement() {
        let h = harness();
        *h.publisher.fail.lock().unwrap() = true;

        let result = h
            .service
            .place_order(&command(&[(20, None, 1)], PaymentMethod::CreditCard))
            .unwrap();

        assert_eq!(result.status, OrderStatus::Paid);
        assert_eq!(h.orders.len(), 1);
        assert!(h.products.released().is_empty());
    }

    #[test]
    fn invalid_command_has_no_side_effects() {
        let h = harness();
        let mut bad = command(&[(20, None, 0)], PaymentMethod::CreditCard);

        assert_eq!(
            h.service.place_order(&bad).unwrap_err().code(),
            "validation_error"
        );

        bad.order_items.clear();
        assert!(h.service.place_order(&bad).is_err());

        assert!(h.products.availability_calls.lock().unwrap().is_empty());
        assert!(h.products.reserved().is_empty());
    }
}
