//! Composition root for a single-process deployment on in-memory adapters.

use std::sync::Arc;

use commerce_core::SnowflakeIdGenerator;
use commerce_events::InMemoryEventBus;
use commerce_orders::{CancelOrderService, GetOrderService, PlaceOrderService};
use commerce_products::Backoff;

use crate::catalog::CatalogProductService;
use crate::config::{CommerceConfig, ConfigError};
use crate::persistence::{InMemoryOrderRepository, InMemoryProductRepository};
use crate::publishing::{BusEventPublisher, JsonEnvelope};

pub type Catalog = CatalogProductService<Arc<InMemoryProductRepository>, Box<dyn Backoff>>;
pub type Bus = Arc<InMemoryEventBus<JsonEnvelope>>;
pub type Publisher = BusEventPublisher<Bus>;

pub type PlaceOrders = PlaceOrderService<
    Arc<InMemoryOrderRepository>,
    Arc<Catalog>,
    Arc<Publisher>,
    Arc<SnowflakeIdGenerator>,
>;
pub type CancelOrders = CancelOrderService<Arc<InMemoryOrderRepository>, Arc<Catalog>, Arc<Publisher>>;
pub type GetOrders = GetOrderService<Arc<InMemoryOrderRepository>>;

/// Every adapter and use case, wired from one [`CommerceConfig`].
///
/// Building the stack also installs the process-wide tracing subscriber
/// unless one is already in place.
pub struct InMemoryCommerce {
    pub products: Arc<InMemoryProductRepository>,
    pub orders: Arc<InMemoryOrderRepository>,
    pub catalog: Arc<Catalog>,
    pub bus: Bus,
    pub ids: Arc<SnowflakeIdGenerator>,
    pub place: PlaceOrders,
    pub cancel: CancelOrders,
    pub query: GetOrders,
}

impl InMemoryCommerce {
    pub fn from_config(config: &CommerceConfig) -> Result<Self, ConfigError> {
        let ids = Arc::new(config.id_generator()?);
        let products = Arc::new(InMemoryProductRepository::new());
        let orders = Arc::new(InMemoryOrderRepository::new());
        let catalog = Arc::new(CatalogProductService::with_backoff(
            products.clone(),
            config.backoff(),
        ));
        let bus: Bus = Arc::new(InMemoryEventBus::new());
        let publisher = Arc::new(BusEventPublisher::new(bus.clone()));

        if !commerce_observability::init(&config.observability()) {
            tracing::debug!("tracing subscriber already installed, keeping it");
        }
        tracing::info!(
            node_id = config.node_id,
            retry_delay_ms = config.inventory_retry_delay_ms,
            "in-memory commerce stack ready"
        );

        Ok(Self {
            place: PlaceOrderService::new(
                orders.clone(),
                catalog.clone(),
                publisher.clone(),
                ids.clone(),
            ),
            cancel: CancelOrderService::new(orders.clone(), catalog.clone(), publisher),
            query: GetOrderService::new(orders.clone()),
            products,
            orders,
            catalog,
            bus,
            ids,
        })
    }
}
