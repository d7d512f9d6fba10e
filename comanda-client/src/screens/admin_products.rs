//! Product manager screen controller

use std::sync::Arc;

use shared::models::{Product, ProductCreate, ProductUpdate};

use crate::db::ProductRepository;
use crate::error::{ClientError, ClientResult};
use crate::gateway::DataGateway;
use crate::notify::Notifier;

/// Catalog list with the header stats
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogView {
    pub products: Vec<Product>,
    pub total: usize,
    pub categories: usize,
}

pub struct AdminProductsScreen {
    products: ProductRepository,
    notifier: Notifier,
}

impl AdminProductsScreen {
    pub fn new(gateway: Arc<dyn DataGateway>, notifier: Notifier) -> Self {
        Self {
            products: ProductRepository::new(gateway),
            notifier,
        }
    }

    pub async fn load(&self) -> ClientResult<CatalogView> {
        match self.products.find_all().await {
            Ok(products) => {
                let mut categories: Vec<&str> =
                    products.iter().map(|p| p.category.as_str()).collect();
                categories.sort_unstable();
                categories.dedup();
                Ok(CatalogView {
                    total: products.len(),
                    categories: categories.len(),
                    products,
                })
            }
            Err(err) => {
                tracing::error!(error = %err, "catalog load failed");
                self.notifier.error("Could not load the catalog");
                Err(err)
            }
        }
    }

    pub async fn create(&self, data: ProductCreate) -> ClientResult<Product> {
        match self.products.create(data).await {
            Ok(product) => {
                self.notifier.info("Product created");
                Ok(product)
            }
            Err(err) => {
                tracing::error!(error = %err, "product create failed");
                self.notifier.error("Could not save the product");
                Err(err)
            }
        }
    }

    pub async fn update(&self, id: &str, data: ProductUpdate) -> ClientResult<Product> {
        match self.products.update(id, data).await {
            Ok(product) => {
                self.notifier.info("Product updated");
                Ok(product)
            }
            Err(err) => {
                tracing::error!(error = %err, product_id = id, "product update failed");
                self.notifier.error("Could not save the product");
                Err(err)
            }
        }
    }

    /// Delete a product; products with sales history cannot be deleted and
    /// are deactivated instead.
    pub async fn delete(&self, id: &str) -> ClientResult<()> {
        match self.products.delete(id).await {
            Ok(()) => {
                self.notifier.info("Product deleted");
                Ok(())
            }
            Err(ClientError::ConstraintViolation(_)) => {
                self.products.deactivate(id).await?;
                self.notifier
                    .info("Product has sales history, paused instead");
                Ok(())
            }
            Err(err) => {
                tracing::error!(error = %err, product_id = id, "product delete failed");
                self.notifier.error("Could not delete the product");
                Err(err)
            }
        }
    }
}
