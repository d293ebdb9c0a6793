//! Hand-written port fakes with call recording.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};

use commerce_core::{
    AggregateRoot, IdGenerationError, IdGenerator, MemberId, OrderId, ProductId, ProductOptionId,
};

use crate::events::DomainEvent;
use crate::money::Money;
use crate::order::Order;
use crate::ports::{
    EventPublisher, OrderRepository, ProductInfo, ProductOptionInfo, ProductService,
    ProductServiceError, PublishError, RepositoryError,
};
use crate::values::{OrderNumber, Quantity};

#[derive(Default)]
pub struct FakeProductService {
    products: Mutex<HashMap<ProductId, ProductInfo>>,
    options: Mutex<HashMap<(ProductId, ProductOptionId), ProductOptionInfo>>,
    pub unavailable: Mutex<HashSet<ProductId>>,
    pub reserve_fails_for: Mutex<HashSet<ProductId>>,
    pub release_fails_for: Mutex<HashSet<ProductId>>,
    pub availability_calls: Mutex<Vec<(ProductId, u32)>>,
    pub reserve_calls: Mutex<Vec<(ProductId, u32)>>,
    pub release_calls: Mutex<Vec<(ProductId, u32)>>,
}

impl FakeProductService {
    pub fn with_product(self, id: i64, name: &str, price: u64, discount: u64) -> Self {
        let id = ProductId::try_new(id).unwrap();
        self.products.lock().unwrap().insert(
            id,
            ProductInfo {
                id,
                name: name.to_string(),
                description: None,
                price: Money::new(price),
                discount_price: Money::new(discount),
                stock_quantity: 100,
                available: true,
            },
        );
        self
    }

    pub fn with_option(self, product: i64, option: i64, name: &str, price: u64, discount: u64) -> Self {
        let product_id = ProductId::try_new(product).unwrap();
        let option_id = ProductOptionId::try_new(option).unwrap();
        self.options.lock().unwrap().insert(
            (product_id, option_id),
            ProductOptionInfo {
                id: option_id,
                name: name.to_string(),
                price: Money::new(price),
                discount_price: Money::new(discount),
                stock_quantity: 100,
                available: true,
            },
        );
        self
    }

    pub fn mark_unavailable(&self, product: i64) {
        self.unavailable
            .lock()
            .unwrap()
            .insert(ProductId::try_new(product).unwrap());
    }

    pub fn mark_option_unavailable(&self, product: i64, option: i64) {
        let key = (
            ProductId::try_new(product).unwrap(),
            ProductOptionId::try_new(option).unwrap(),
        );
        if let Some(info) = self.options.lock().unwrap().get_mut(&key) {
            info.available = false;
        }
    }

    pub fn fail_reserve_for(&self, product: i64) {
        self.reserve_fails_for
            .lock()
            .unwrap()
            .insert(ProductId::try_new(product).unwrap());
    }

    pub fn fail_release_for(&self, product: i64) {
        self.release_fails_for
            .lock()
            .unwrap()
            .insert(ProductId::try_new(product).unwrap());
    }

    pub fn reserved(&self) -> Vec<(i64, u32)> {
        Self::raw(&self.reserve_calls)
    }

    pub fn released(&self) -> Vec<(i64, u32)> {
        Self::raw(&self.release_calls)
    }

    fn raw(calls: &Mutex<Vec<(ProductId, u32)>>) -> Vec<(i64, u32)> {
        calls
            .lock()
            .unwrap()
            .iter()
            .map(|(id, q)| (id.value(), *q))
            .collect()
    }
}

impl ProductService for FakeProductService {
    fn check_availability(
        &self,
        product_id: ProductId,
        quantity: Quantity,
    ) -> Result<bool, ProductServiceError> {
        self.availability_calls
            .lock()
            .unwrap()
            .push((product_id, quantity.value()));
        Ok(!self.unavailable.lock().unwrap().contains(&product_id))
    }

    fn reserve_stock(
        &self,
        product_id: ProductId,
        quantity: Quantity,
    ) -> Result<(), ProductServiceError> {
        self.reserve_calls
            .lock()
            .unwrap()
            .push((product_id, quantity.value()));
        if self.reserve_fails_for.lock().unwrap().contains(&product_id) {
            return Err(ProductServiceError::InsufficientStock(product_id));
        }
        Ok(())
    }

    fn release_stock(
        &self,
        product_id: ProductId,
        quantity: Quantity,
    ) -> Result<(), ProductServiceError> {
        self.release_calls
            .lock()
            .unwrap()
            .push((product_id, quantity.value()));
        if self.release_fails_for.lock().unwrap().contains(&product_id) {
            return Err(ProductServiceError::Unavailable("release rejected".into()));
        }
        Ok(())
    }

    fn get_product_info(&self, product_id: ProductId) -> Result<ProductInfo, ProductServiceError> {
        self.products
            .lock()
            .unwrap()
            .get(&product_id)
            .cloned()
            .ok_or(ProductServiceError::ProductNotFound(product_id))
    }

    fn get_product_option_info(
        &self,
        product_id: ProductId,
        option_id: ProductOptionId,
    ) -> Result<ProductOptionInfo, ProductServiceError> {
        self.options
            .lock()
            .unwrap()
            .get(&(product_id, option_id))
            .cloned()
            .ok_or(ProductServiceError::OptionNotFound {
                product_id,
                option_id,
            })
    }
}

/// Map-backed repository with the same version rules as the real adapters.
#[derive(Default)]
pub struct FakeOrderRepository {
    orders: Mutex<HashMap<OrderId, Order>>,
    pub save_calls: Mutex<u32>,
    pub fail_saves: Mutex<bool>,
}

impl FakeOrderRepository {
    pub fn stored(&self, id: OrderId) -> Option<Order> {
        self.orders.lock().unwrap().get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.orders.lock().unwrap().len()
    }
}

impl OrderRepository for FakeOrderRepository {
    fn save(&self, order: &Order) -> Result<Order, RepositoryError> {
        *self.save_calls.lock().unwrap() += 1;
        if *self.fail_saves.lock().unwrap() {
            return Err(RepositoryError::Storage("disk full".into()));
        }
        let mut orders = self.orders.lock().unwrap();
        let id = order.order_id();
        let current = orders.get(&id).map(|o| o.version()).unwrap_or(0);
        if current != order.version() {
            return Err(RepositoryError::Conflict {
                order_id: id,
                expected: order.version(),
                actual: current,
            });
        }
        let mut stored = order.clone().with_version(current + 1);
        stored.take_events();
        orders.insert(id, stored.clone());
        Ok(stored)
    }

    fn find_by_id(&self, order_id: OrderId) -> Result<Option<Order>, RepositoryError> {
        Ok(self.stored(order_id))
    }

    fn find_by_order_number(
        &self,
        order_number: &OrderNumber,
    ) -> Result<Option<Order>, RepositoryError> {
        Ok(self
            .orders
            .lock()
            .unwrap()
            .values()
            .find(|o| o.order_number() == order_number)
            .cloned())
    }

    fn find_by_member_id(&self, member_id: MemberId) -> Result<Vec<Order>, RepositoryError> {
        Ok(self
            .orders
            .lock()
            .unwrap()
            .values()
            .filter(|o| o.member_id() == member_id)
            .cloned()
            .collect())
    }

    fn find_by_ordered_at_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Order>, RepositoryError> {
        Ok(self
            .orders
            .lock()
            .unwrap()
            .values()
            .filter(|o| o.ordered_at() >= start && o.ordered_at() < end)
            .cloned()
            .collect())
    }

    fn exists_by_id(&self, order_id: OrderId) -> Result<bool, RepositoryError> {
        Ok(self.orders.lock().unwrap().contains_key(&order_id))
    }

    fn delete_by_id(&self, order_id: OrderId) -> Result<(), RepositoryError> {
        self.orders.lock().unwrap().remove(&order_id);
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingPublisher {
    pub events: Mutex<Vec<DomainEvent>>,
    pub fail: Mutex<bool>,
}

impl RecordingPublisher {
    pub fn event_types(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.event_type().to_string())
            .collect()
    }
}

impl EventPublisher for RecordingPublisher {
    fn publish(&self, event: &DomainEvent) -> Result<(), PublishError> {
        if *self.fail.lock().unwrap() {
            return Err(PublishError("broker down".into()));
        }
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}

/// Hands out 1000, 1001, ... ; can be switched to fail.
pub struct SequentialIds {
    next: AtomicI64,
    pub fail: Mutex<bool>,
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self {
            next: AtomicI64::new(1_000),
            fail: Mutex::new(false),
        }
    }
}

impl IdGenerator for SequentialIds {
    fn generate_id(&self) -> Result<i64, IdGenerationError> {
        if *self.fail.lock().unwrap() {
            return Err(IdGenerationError::ClockMovedBackwards {
                last_ms: 10,
                now_ms: 5,
            });
        }
        Ok(self.next.fetch_add(1, Ordering::SeqCst))
    }
}

/// A saved-ready paid order with one line per `(item id, product id, quantity, unit price)`.
pub fn paid_order(order_id: i64, lines: &[(i64, i64, u32, u64)]) -> Order {
    use chrono::TimeZone;
    use commerce_core::{OrderItemId, PaymentId};

    use crate::item::{ItemSnapshot, OrderItem};
    use crate::shipping::ShippingAddress;
    use crate::values::PaymentMethod;

    let now = Utc.with_ymd_and_hms(2024, 3, 15, 10, 0, 0).unwrap();
    let items = lines
        .iter()
        .map(|&(item_id, product_id, quantity, price)| {
            OrderItem::new(
                OrderItemId::try_new(item_id).unwrap(),
                ItemSnapshot {
                    product_id: ProductId::try_new(product_id).unwrap(),
                    product_name: format!("product {product_id}"),
                    option: None,
                    unit_price: Money::new(price),
                    unit_discount: Money::ZERO,
                    quantity: Quantity::new(quantity).unwrap(),
                },
            )
            .unwrap()
        })
        .collect();
    let address = ShippingAddress::new(
        "Kim Minji",
        "010-1234-5678",
        "06236",
        "Teheran-ro 123",
        "5F",
        None,
    )
    .unwrap();
    let mut order = Order::create(
        OrderId::try_new(order_id).unwrap(),
        MemberId::try_new(1).unwrap(),
        address,
        items,
        now,
    )
    .unwrap();
    order
        .confirm_with_payment(PaymentId::try_new(9_000).unwrap(), PaymentMethod::CreditCard, now)
        .unwrap();
    order.take_events();
    order
}
