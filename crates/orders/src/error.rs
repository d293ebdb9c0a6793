use commerce_core::{DomainError, IdGenerationError, OrderId, OrderItemId, ProductId};

use crate::ports::{ProductServiceError, RepositoryError};

/// Application error of the order use cases.
#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("insufficient stock for product {product_id}")]
    InsufficientStock { product_id: ProductId },

    #[error("order {0} is already cancelled")]
    OrderAlreadyCancelled(OrderId),

    #[error("order item {order_item_id} of order {order_id} is already cancelled")]
    OrderItemAlreadyCancelled {
        order_id: OrderId,
        order_item_id: OrderItemId,
    },

    #[error(transparent)]
    ProductService(ProductServiceError),

    #[error(transparent)]
    Repository(RepositoryError),

    #[error("id generation failed: {0}")]
    IdGeneration(#[from] IdGenerationError),
}

impl OrderError {
    pub fn code(&self) -> &'static str {
        match self {
            OrderError::Domain(e) => e.code(),
            OrderError::InsufficientStock { .. } => "insufficient_stock",
            OrderError::OrderAlreadyCancelled(_) => "order_already_cancelled",
            OrderError::OrderItemAlreadyCancelled { .. } => "order_item_already_cancelled",
            OrderError::ProductService(_) => "product_service_error",
            OrderError::Repository(_) => "repository_error",
            OrderError::IdGeneration(_) => "id_generation_error",
        }
    }
}

impl From<ProductServiceError> for OrderError {
    fn from(value: ProductServiceError) -> Self {
        match value {
            ProductServiceError::InsufficientStock(product_id) => {
                OrderError::InsufficientStock { product_id }
            }
            other => OrderError::ProductService(other),
        }
    }
}

impl From<RepositoryError> for OrderError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::Conflict { .. } => {
                OrderError::Domain(DomainError::conflict(value.to_string()))
            }
            RepositoryError::Storage(_) => OrderError::Repository(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stale_save_surfaces_as_conflict() {
        let err = OrderError::from(RepositoryError::Conflict {
            order_id: OrderId::try_new(1).unwrap(),
            expected: 2,
            actual: 3,
        });
        assert_eq!(err.code(), "conflict");
    }

    #[test]
    fn reservation_shortfall_is_insufficient_stock() {
        let pid = ProductId::try_new(10).unwrap();
        let err = OrderError::from(ProductServiceError::InsufficientStock(pid));
        assert!(matches!(err, OrderError::InsufficientStock { product_id } if product_id == pid));

        let other = OrderError::from(ProductServiceError::Unavailable("down".into()));
        assert_eq!(other.code(), "product_service_error");
    }
}
