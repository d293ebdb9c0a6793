//! Infrastructure layer: adapters for the order and product ports, config
//! and the in-memory composition root.

pub mod catalog;
pub mod config;
pub mod persistence;
pub mod publishing;
pub mod wiring;


pub use catalog::CatalogProductService;
pub use config::{CommerceConfig, ConfigError};
pub use persistence::{InMemoryOrderRepository, InMemoryProductRepository};
pub use publishing::{BusEventPublisher, JsonEnvelope, LoggingEventPublisher};
pub use wiring::InMemoryCommerce;
