//! Session cart: a quantity ledger keyed by product id.
//!
//! The cart never looks at stock. Callers check availability against the
//! catalog before mutating it.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub quantity: i32,
    /// Unit price captured when the line was created.
    pub price: Decimal,
}

impl CartLine {
    pub fn total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    lines: BTreeMap<Uuid, CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increase the quantity for `product_id`, creating the line at `price` if absent.
    pub fn add(&mut self, product_id: Uuid, price: Decimal, quantity: i32) {
        let line = self.lines.entry(product_id).or_insert(CartLine { quantity: 0, price });
        line.quantity += quantity;
    }

    /// Set the quantity of an existing line. Quantities below 1 remove it.
    ///
    /// Returns `false` when there was no line to update.
    pub fn update(&mut self, product_id: Uuid, quantity: i32) -> bool {
        if quantity < 1 {
            return self.remove(product_id);
        }
        match self.lines.get_mut(&product_id) {
            Some(line) => {
                line.quantity = quantity;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, product_id: Uuid) -> bool {
        self.lines.remove(&product_id).is_some()
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn total(&self) -> Decimal {
        self.lines.values().map(CartLine::total).sum()
    }

    /// Number of distinct lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn quantity_of(&self, product_id: Uuid) -> i32 {
        self.lines.get(&product_id).map_or(0, |line| line.quantity)
    }

    pub fn line(&self, product_id: Uuid) -> Option<&CartLine> {
        self.lines.get(&product_id)
    }

    /// Lines in product id order.
    pub fn lines(&self) -> impl Iterator<Item = (Uuid, &CartLine)> {
        self.lines.iter().map(|(id, line)| (*id, line))
    }

    pub fn product_ids(&self) -> Vec<Uuid> {
        self.lines.keys().copied().collect()
    }

    /// Drop every line whose product is not in `known`.
    pub fn retain_products(&mut self, known: &[Uuid]) -> usize {
        let before = self.lines.len();
        self.lines.retain(|id, _| known.contains(id));
        before - self.lines.len()
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn price(cents: i64) -> Decimal {
        Decimal::new(cents, 2)
    }

    #[test]
    fn add_creates_then_accumulates() {
        let mut cart = Cart::new();
        let mug = Uuid::new_v4();

        cart.add(mug, price(1200), 1);
        cart.add(mug, price(1200), 2);

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.quantity_of(mug), 3);
        assert_eq!(cart.total(), price(3600));
    }

    #[test]
    fn price_is_snapshotted_on_first_add() {
        let mut cart = Cart::new();
        let hoodie = Uuid::new_v4();

        cart.add(hoodie, price(5500), 1);
        cart.add(hoodie, price(9900), 1);

        assert_eq!(cart.line(hoodie).unwrap().price, price(5500));
        assert_eq!(cart.total(), price(11000));
    }

    #[test]
    fn total_spans_all_lines() {
        let mut cart = Cart::new();
        cart.add(Uuid::new_v4(), price(250), 4);
        cart.add(Uuid::new_v4(), price(1999), 1);

        assert_eq!(cart.len(), 2);
        assert_eq!(cart.total(), price(2999));
    }

    #[test]
    fn update_sets_quantity_or_removes() {
        let mut cart = Cart::new();
        let sticker = Uuid::new_v4();
        cart.add(sticker, price(500), 1);

        assert!(cart.update(sticker, 5));
        assert_eq!(cart.quantity_of(sticker), 5);

        assert!(cart.update(sticker, 0));
        assert!(cart.is_empty());
    }

    #[test]
    fn update_of_missing_line_is_a_noop() {
        let mut cart = Cart::new();
        assert!(!cart.update(Uuid::new_v4(), 3));
        assert!(cart.is_empty());
    }

    #[test]
    fn remove_and_clear() {
        let mut cart = Cart::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        cart.add(a, price(100), 1);
        cart.add(b, price(100), 1);

        assert!(cart.remove(a));
        assert!(!cart.remove(a));
        assert_eq!(cart.len(), 1);

        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.total(), Decimal::ZERO);
    }

    #[test]
    fn retain_products_prunes_unknown_lines() {
        let mut cart = Cart::new();
        let kept = Uuid::new_v4();
        cart.add(kept, price(100), 1);
        cart.add(Uuid::new_v4(), price(100), 1);

        assert_eq!(cart.retain_products(&[kept]), 1);
        assert_eq!(cart.product_ids(), vec![kept]);
    }

    #[test]
    fn lines_are_ordered_by_product_id() {
        let mut cart = Cart::new();
        let mut ids: Vec<Uuid> = (0..5).map(|_| Uuid::new_v4()).collect();
        for id in &ids {
            cart.add(*id, price(100), 1);
        }
        ids.sort();
        let seen: Vec<Uuid> = cart.lines().map(|(id, _)| id).collect();
        assert_eq!(seen, ids);
    }
}
