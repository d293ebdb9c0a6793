use std::sync::Arc;

use commerce_core::ProductId;

use crate::product::Product;

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum ProductRepositoryError {
    /// The stored product moved on since the caller loaded it.
    #[error("version conflict on product {product_id}: expected {expected}, found {actual}")]
    VersionConflict {
        product_id: ProductId,
        expected: u64,
        actual: u64,
    },

    #[error("product storage failure: {0}")]
    Storage(String),
}

/// Persistence port for products.
///
/// `save` must compare `product.version()` with the stored version and fail
/// with [`ProductRepositoryError::VersionConflict`] when they differ. On success
/// it returns the stored copy carrying the bumped version.
pub trait ProductRepository: Send + Sync {
    fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, ProductRepositoryError>;

    fn save(&self, product: &Product) -> Result<Product, ProductRepositoryError>;
}

impl<R> ProductRepository for Arc<R>
where
    R: ProductRepository + ?Sized,
{
    fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, ProductRepositoryError> {
        (**self).find_by_id(id)
    }

    fn save(&self, product: &Product) -> Result<Product, ProductRepositoryError> {
        (**self).save(product)
    }
}
