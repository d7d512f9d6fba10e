//! Cart/session controller for the menu screen
//!
//! Accumulates line items locally until submission. Lines are keyed by
//! product identity: repeat adds merge by incrementing quantity, and a
//! quantity dropping to zero removes the line.

use shared::models::Product;
use shared::order::CartLine;

use crate::orders::money;

/// Local cart, one per menu session
#[derive(Debug, Clone, Default)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one unit of a product, merging with an existing line
    pub fn add(&mut self, product: &Product) {
        if let Some(line) = self.lines.iter_mut().find(|l| l.product_id == product.id) {
            line.quantity += 1;
            return;
        }
        self.lines.push(CartLine {
            product_id: product.id.clone(),
            name: product.name.clone(),
            category: product.category.clone(),
            price: product.price,
            quantity: 1,
            note: String::new(),
        });
    }

    /// Adjust a line's quantity; dropping to zero (or below) removes it
    pub fn change_quantity(&mut self, product_id: &str, delta: i32) {
        if let Some(index) = self.lines.iter().position(|l| l.product_id == product_id) {
            self.lines[index].quantity += delta;
            if self.lines[index].quantity <= 0 {
                self.lines.remove(index);
            }
        }
    }

    /// Attach a special-instructions note to a line
    pub fn set_note(&mut self, product_id: &str, note: impl Into<String>) {
        if let Some(line) = self.lines.iter_mut().find(|l| l.product_id == product_id) {
            line.note = note.into();
        }
    }

    pub fn remove(&mut self, product_id: &str) {
        self.lines.retain(|l| l.product_id != product_id);
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total unit count shown on the cart badge
    pub fn count(&self) -> i32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    pub fn total(&self) -> f64 {
        money::cart_total(&self.lines)
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn product(id: &str, price: f64) -> Product {
        Product {
            id: id.to_string(),
            name: id.to_string(),
            description: None,
            price,
            category: "Mains".to_string(),
            image: None,
            active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_repeat_add_merges_by_product() {
        let mut cart = Cart::new();
        let tacos = product("tacos", 8.5);
        cart.add(&tacos);
        cart.add(&tacos);
        cart.add(&product("flan", 4.0));

        assert_eq!(cart.lines().len(), 2);
        assert_eq!(cart.lines()[0].quantity, 2);
        assert_eq!(cart.count(), 3);
        assert_eq!(cart.total(), 21.0);
    }

    #[test]
    fn test_quantity_dropping_to_zero_removes_line() {
        let mut cart = Cart::new();
        cart.add(&product("tacos", 8.5));
        cart.change_quantity("tacos", 1);
        cart.change_quantity("tacos", -2);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_note_sticks_to_its_line() {
        let mut cart = Cart::new();
        cart.add(&product("tacos", 8.5));
        cart.set_note("tacos", "no onion");
        assert_eq!(cart.lines()[0].note, "no onion");
    }

    #[test]
    fn test_clear_after_submission() {
        let mut cart = Cart::new();
        cart.add(&product("tacos", 8.5));
        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.total(), 0.0);
    }
}
