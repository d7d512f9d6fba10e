//! Menu/ordering screen controller
//!
//! Customer-facing: browse the active catalog by category or search,
//! accumulate a cart, submit it as an order against the session's table.

use std::sync::Arc;

use shared::models::Product;

use crate::cart::Cart;
use crate::db::ProductRepository;
use crate::error::ClientResult;
use crate::gateway::DataGateway;
use crate::notify::Notifier;
use crate::orders::Reconciler;

/// Pseudo-category selecting the whole catalog
pub const ALL_CATEGORIES: &str = "All";

pub struct MenuScreen {
    products: ProductRepository,
    reconciler: Reconciler,
    notifier: Notifier,
    table_number: i32,
    catalog: Vec<Product>,
    pub cart: Cart,
}

impl MenuScreen {
    pub fn new(
        gateway: Arc<dyn DataGateway>,
        notifier: Notifier,
        bar_category: impl Into<String>,
        table_number: i32,
    ) -> Self {
        Self {
            products: ProductRepository::new(gateway.clone()),
            reconciler: Reconciler::new(gateway, bar_category),
            notifier,
            table_number,
            catalog: Vec::new(),
            cart: Cart::new(),
        }
    }

    pub fn table_number(&self) -> i32 {
        self.table_number
    }

    /// Fetch the active catalog
    pub async fn load(&mut self) -> ClientResult<()> {
        match self.products.find_active().await {
            Ok(products) => {
                self.catalog = products;
                Ok(())
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to load products");
                self.notifier.error("Could not reach the menu service");
                Err(err)
            }
        }
    }

    /// Category pills: "All" plus every category in catalog order
    pub fn categories(&self) -> Vec<String> {
        let mut categories = vec![ALL_CATEGORIES.to_string()];
        for product in &self.catalog {
            if !categories.contains(&product.category) {
                categories.push(product.category.clone());
            }
        }
        categories
    }

    /// Catalog filtered by category pill and search box.
    ///
    /// Search matches anywhere in the name but ranks prefix matches first.
    pub fn filtered(&self, category: &str, search: &str) -> Vec<&Product> {
        let query = search.trim().to_lowercase();
        let mut matches: Vec<&Product> = self
            .catalog
            .iter()
            .filter(|p| category == ALL_CATEGORIES || p.category == category)
            .filter(|p| query.is_empty() || p.name.to_lowercase().contains(&query))
            .collect();
        if !query.is_empty() {
            matches.sort_by_key(|p| !p.name.to_lowercase().starts_with(&query));
        }
        matches
    }

    /// Look up a catalog product by id (the "add to cart" action)
    pub fn add_to_cart(&mut self, product_id: &str) -> bool {
        let Some(product) = self.catalog.iter().find(|p| p.id == product_id).cloned() else {
            return false;
        };
        self.cart.add(&product);
        self.notifier.info(format!("{} added", product.name));
        true
    }

    /// Submit the cart as a new order and clear it on success
    pub async fn send_order(&mut self) -> ClientResult<String> {
        match self
            .reconciler
            .submit(self.table_number, self.cart.lines())
            .await
        {
            Ok(order_id) => {
                self.cart.clear();
                self.notifier.info("Order sent to the kitchen");
                Ok(order_id)
            }
            Err(err) => {
                tracing::error!(error = %err, table = self.table_number, "order submission failed");
                self.notifier.error("Could not send the order");
                Err(err)
            }
        }
    }
}
