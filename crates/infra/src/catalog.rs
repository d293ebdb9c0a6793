//! [`ProductService`] adapter over the local product module.
//!
//! Reservation and release go through the inventory retry facade, so a
//! version race against another order only costs another attempt.

use commerce_core::{ProductId, ProductOptionId};
use commerce_orders::{
    Money, ProductInfo, ProductOptionInfo, ProductService, ProductServiceError, Quantity,
};
use commerce_products::{
    Backoff, InventoryError, InventoryRetryError, NoBackoff, Product, ProductInventoryFacade,
    ProductInventoryUpdateCommand, ProductInventoryUpdateService, ProductRepository,
};

pub struct CatalogProductService<R, B = NoBackoff> {
    products: R,
    inventory: ProductInventoryFacade<ProductInventoryUpdateService<R>, B>,
}

impl<R: ProductRepository + Clone> CatalogProductService<R> {
    pub fn new(products: R) -> Self {
        Self {
            inventory: ProductInventoryFacade::new(ProductInventoryUpdateService::new(
                products.clone(),
            )),
            products,
        }
    }
}

impl<R, B> CatalogProductService<R, B>
where
    R: ProductRepository + Clone,
    B: Backoff,
{
    pub fn with_backoff(products: R, backoff: B) -> Self {
        Self {
            inventory: ProductInventoryFacade::with_backoff(
                ProductInventoryUpdateService::new(products.clone()),
                backoff,
            ),
            products,
        }
    }

    pub fn inventory(&self) -> &ProductInventoryFacade<ProductInventoryUpdateService<R>, B> {
        &self.inventory
    }

    fn load(&self, product_id: ProductId) -> Result<Product, ProductServiceError> {
        self.products
            .find_by_id(product_id)
            .map_err(|e| ProductServiceError::Unavailable(e.to_string()))?
            .ok_or(ProductServiceError::ProductNotFound(product_id))
    }

    fn adjust(
        &self,
        command: Result<ProductInventoryUpdateCommand, InventoryError>,
    ) -> Result<(), ProductServiceError> {
        let command = command.map_err(|e| ProductServiceError::Unavailable(e.to_string()))?;
        self.inventory
            .update_stock_with_retry(&command)
            .map(|_| ())
            .map_err(into_service_error)
    }
}

fn into_service_error(err: InventoryRetryError) -> ProductServiceError {
    match err {
        InventoryRetryError::Failed(InventoryError::ProductNotFound(product_id)) => {
            ProductServiceError::ProductNotFound(product_id)
        }
        InventoryRetryError::Failed(InventoryError::InsufficientStock { product_id, .. }) => {
            ProductServiceError::InsufficientStock(product_id)
        }
        other => ProductServiceError::Unavailable(other.to_string()),
    }
}

impl<R, B> ProductService for CatalogProductService<R, B>
where
    R: ProductRepository + Clone,
    B: Backoff,
{
    fn check_availability(
        &self,
        product_id: ProductId,
        quantity: Quantity,
    ) -> Result<bool, ProductServiceError> {
        Ok(self.load(product_id)?.is_available(quantity.value()))
    }

    fn reserve_stock(
        &self,
        product_id: ProductId,
        quantity: Quantity,
    ) -> Result<(), ProductServiceError> {
        self.adjust(ProductInventoryUpdateCommand::decrease(
            product_id,
            quantity.value(),
        ))
    }

    fn release_stock(
        &self,
        product_id: ProductId,
        quantity: Quantity,
    ) -> Result<(), ProductServiceError> {
        self.adjust(ProductInventoryUpdateCommand::increase(
            product_id,
            quantity.value(),
        ))
    }

    fn get_product_info(&self, product_id: ProductId) -> Result<ProductInfo, ProductServiceError> {
        let product = self.load(product_id)?;
        Ok(ProductInfo {
            id: product.product_id(),
            name: product.name().to_string(),
            description: None,
            price: Money::new(product.price()),
            discount_price: Money::new(product.discount_price()),
            stock_quantity: product.stock(),
            available: product.is_available(1),
        })
    }

    fn get_product_option_info(
        &self,
        product_id: ProductId,
        option_id: ProductOptionId,
    ) -> Result<ProductOptionInfo, ProductServiceError> {
        let product = self.load(product_id)?;
        let option = product
            .option(option_id)
            .ok_or(ProductServiceError::OptionNotFound {
                product_id,
                option_id,
            })?;
        // Options share the product's stock pool.
        Ok(ProductOptionInfo {
            id: option.id,
            name: option.name.clone(),
            price: Money::new(option.price),
            discount_price: Money::new(option.discount_price),
            stock_quantity: product.stock(),
            available: option.available && product.is_available(1),
        })
    }
}
