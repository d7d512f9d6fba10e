//! Product Repository

use std::sync::Arc;

use shared::models::{Product, ProductCreate, ProductUpdate};

use super::{decode, decode_all};
use crate::error::{ClientError, ClientResult};
use crate::gateway::{tables, DataGateway, Filter, Query};

#[derive(Clone)]
pub struct ProductRepository {
    gateway: Arc<dyn DataGateway>,
}

impl ProductRepository {
    pub fn new(gateway: Arc<dyn DataGateway>) -> Self {
        Self { gateway }
    }

    /// Products currently offered on the menu
    pub async fn find_active(&self) -> ClientResult<Vec<Product>> {
        let rows = self
            .gateway
            .select(
                tables::PRODUCTS,
                Query::new()
                    .filter(Filter::eq("active", true))
                    .order_by("name", true),
            )
            .await?;
        decode_all(rows)
    }

    /// Full catalog for the admin screen, grouped by category then name
    pub async fn find_all(&self) -> ClientResult<Vec<Product>> {
        let rows = self
            .gateway
            .select(
                tables::PRODUCTS,
                Query::new()
                    .order_by("category", true)
                    .order_by("name", true),
            )
            .await?;
        decode_all(rows)
    }

    pub async fn create(&self, data: ProductCreate) -> ClientResult<Product> {
        let row = self
            .gateway
            .insert(tables::PRODUCTS, serde_json::to_value(&data)?)
            .await?;
        decode(row)
    }

    pub async fn update(&self, id: &str, data: ProductUpdate) -> ClientResult<Product> {
        let rows = self
            .gateway
            .update(
                tables::PRODUCTS,
                vec![Filter::eq("id", id)],
                serde_json::to_value(&data)?,
            )
            .await?;
        rows.into_iter()
            .next()
            .map(decode)
            .transpose()?
            .ok_or_else(|| ClientError::NotFound(format!("product {}", id)))
    }

    pub async fn delete(&self, id: &str) -> ClientResult<()> {
        let removed = self
            .gateway
            .delete(tables::PRODUCTS, vec![Filter::eq("id", id)])
            .await?;
        if removed == 0 {
            return Err(ClientError::NotFound(format!("product {}", id)));
        }
        Ok(())
    }

    /// Deactivate instead of delete, for products with sales history
    pub async fn deactivate(&self, id: &str) -> ClientResult<Product> {
        self.update(
            id,
            ProductUpdate {
                active: Some(false),
                ..Default::default()
            },
        )
        .await
        .map(|p| {
            tracing::info!(product_id = %p.id, "product deactivated");
            p
        })
    }

    /// Seed helper used by tests and local demos
    pub async fn seed(&self, name: &str, category: &str, price: f64) -> ClientResult<Product> {
        self.create(ProductCreate {
            name: name.to_string(),
            description: None,
            price,
            category: category.to_string(),
            image: None,
            active: true,
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::MemoryGateway;

    fn repo() -> ProductRepository {
        ProductRepository::new(Arc::new(MemoryGateway::new()))
    }

    #[tokio::test]
    async fn test_find_active_excludes_paused_products() {
        let repo = repo();
        repo.seed("Tacos", "Mains", 8.5).await.unwrap();
        let paused = repo.seed("Mole", "Mains", 12.0).await.unwrap();
        repo.deactivate(&paused.id).await.unwrap();

        let active = repo.find_active().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].name, "Tacos");
    }

    #[tokio::test]
    async fn test_find_all_orders_by_category_then_name() {
        let repo = repo();
        repo.seed("Mojito", "Bar", 7.0).await.unwrap();
        repo.seed("Tacos", "Mains", 8.5).await.unwrap();
        repo.seed("Agua", "Bar", 2.0).await.unwrap();

        let all = repo.find_all().await.unwrap();
        let names: Vec<&str> = all.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Agua", "Mojito", "Tacos"]);
    }

    #[tokio::test]
    async fn test_update_missing_product_is_not_found() {
        let repo = repo();
        let err = repo
            .update("missing", ProductUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_patches_price() {
        let repo = repo();
        let product = repo.seed("Tacos", "Mains", 8.5).await.unwrap();
        let updated = repo
            .update(
                &product.id,
                ProductUpdate {
                    price: Some(9.75),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.price, 9.75);
        assert_eq!(updated.name, "Tacos");
    }
}
