//! # Cart
//!
//! The shopper's cart: a collection of product snapshots with quantities,
//! persisted through a [`CartStorage`] slot on every mutation.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Store Operations                                │
//! │                                                                         │
//! │  UI Action               CartStore method          Cart change          │
//! │  ─────────               ────────────────          ───────────          │
//! │                                                                         │
//! │  Click "Add" ──────────► add_to_cart() ──────────► qty += n or push    │
//! │                                                                         │
//! │  Change Quantity ──────► update_quantity() ──────► items[i].qty = n    │
//! │                          (n < 1 → InvalidQuantity, line unchanged)      │
//! │                                                                         │
//! │  Click Remove ─────────► remove_from_cart() ─────► items.remove(i)     │
//! │                                                                         │
//! │  Click Clear ──────────► clear_cart() ───────────► items.clear()       │
//! │                                                                         │
//! │  Every change ─────────► storage.save("cart", JSON array)              │
//! │  Startup ──────────────► storage.load("cart") → tolerant decode        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Ownership
//! The store has a single owner and mutates through `&mut self`. Callers that
//! share it across tasks wrap it themselves.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{CartError, StorageError};
use crate::money::Money;
use crate::types::Product;
use crate::validation::{validate_non_negative, validate_price, validate_quantity};
use crate::CART_STORAGE_KEY;

// =============================================================================
// Storage Slot
// =============================================================================

/// A key/value slot the cart persists into.
///
/// `load` returns `None` both for a missing key and for an unreadable one;
/// implementations log the difference.
pub trait CartStorage {
    fn load(&self, key: &str) -> Option<String>;
    fn save(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// In-process storage, for tests and ephemeral sessions.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    slots: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populated storage (simulates a previous session).
    pub fn with_entry(key: &str, value: &str) -> Self {
        let mut slots = HashMap::new();
        slots.insert(key.to_string(), value.to_string());
        MemoryStorage { slots }
    }

    /// Raw stored value, for inspection.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.slots.get(key).map(String::as_str)
    }
}

impl CartStorage for MemoryStorage {
    fn load(&self, key: &str) -> Option<String> {
        self.slots.get(key).cloned()
    }

    fn save(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.slots.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

impl<S: CartStorage + ?Sized> CartStorage for Box<S> {
    fn load(&self, key: &str) -> Option<String> {
        (**self).load(key)
    }

    fn save(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).save(key, value)
    }
}

// =============================================================================
// Cart Line Item
// =============================================================================

/// One line of the cart.
///
/// ## Snapshot
/// `product` is a frozen copy taken when the line was first added. It is not
/// refreshed from the catalog on load, so a price change after adding does
/// not move the cart total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineItem {
    pub product: Product,
    pub quantity: u32,
}

impl CartLineItem {
    /// Unit price × quantity.
    pub fn line_total(&self) -> Money {
        self.product.price() * self.quantity
    }
}

// =============================================================================
// Cart (pure reducer)
// =============================================================================

/// The cart contents without any persistence.
///
/// ## Invariants
/// - At most one line per product id
/// - Every line has quantity ≥ 1
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cart {
    items: Vec<CartLineItem>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[CartLineItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Quantity of `product_id` in the cart (0 when absent).
    pub fn quantity_of(&self, product_id: i64) -> u32 {
        self.items
            .iter()
            .find(|line| line.product.id == product_id)
            .map(|line| line.quantity)
            .unwrap_or(0)
    }

    /// Adds `quantity` units, merging into an existing line.
    fn add(&mut self, product: Product, quantity: u32) {
        if let Some(line) = self.items.iter_mut().find(|l| l.product.id == product.id) {
            line.quantity = line.quantity.saturating_add(quantity);
            return;
        }
        self.items.push(CartLineItem { product, quantity });
    }

    /// Sets a line's quantity. Returns false when the line doesn't exist.
    fn set_quantity(&mut self, product_id: i64, quantity: u32) -> bool {
        match self.items.iter_mut().find(|l| l.product.id == product_id) {
            Some(line) => {
                line.quantity = quantity;
                true
            }
            None => false,
        }
    }

    /// Removes a line. Returns false when the line doesn't exist.
    fn remove(&mut self, product_id: i64) -> bool {
        let before = self.items.len();
        self.items.retain(|l| l.product.id != product_id);
        self.items.len() != before
    }

    fn clear(&mut self) {
        self.items.clear();
    }

    /// Σ price × quantity, recomputed on every call.
    ///
    /// ## Example
    /// ```text
    /// Mug  $9.99 × 2 = $19.98
    /// Tea  $4.50 × 1 =  $4.50
    /// ─────────────────────────
    /// total          = $24.48
    /// ```
    pub fn total(&self) -> Money {
        self.items.iter().map(CartLineItem::line_total).sum()
    }

    /// Number of distinct lines.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Sum of all line quantities (the cart badge number).
    pub fn total_quantity(&self) -> u64 {
        self.items.iter().map(|l| l.quantity as u64).sum()
    }

    /// Serializes to the persisted JSON array of `{product, quantity}`.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.items)
    }

    /// Decodes a persisted cart, tolerating damage.
    ///
    /// ## Recovery Rules
    /// - Not a JSON array → empty cart
    /// - Entry that doesn't decode, has quantity 0, or a snapshot with a
    ///   negative or out-of-range price or negative stock → dropped
    /// - Duplicate product id → quantities merged into the first line
    pub fn from_json_lenient(raw: &str) -> Self {
        let entries = match serde_json::from_str::<serde_json::Value>(raw) {
            Ok(serde_json::Value::Array(entries)) => entries,
            Ok(_) => {
                warn!("Persisted cart is not a JSON array, starting empty");
                return Cart::new();
            }
            Err(e) => {
                warn!(error = %e, "Persisted cart is not valid JSON, starting empty");
                return Cart::new();
            }
        };

        let mut cart = Cart::new();
        for (index, entry) in entries.into_iter().enumerate() {
            match serde_json::from_value::<CartLineItem>(entry) {
                Ok(line) if line.quantity == 0 => {
                    warn!(index, product_id = line.product.id, "Dropping cart entry with zero quantity");
                }
                Ok(line) if !snapshot_is_valid(&line.product) => {
                    warn!(
                        index,
                        product_id = line.product.id,
                        price_cents = line.product.price_cents,
                        stock = line.product.stock,
                        "Dropping cart entry with invalid price or stock"
                    );
                }
                Ok(line) => cart.add(line.product, line.quantity),
                Err(e) => {
                    warn!(index, error = %e, "Dropping malformed cart entry");
                }
            }
        }
        cart
    }
}

/// A persisted snapshot must still satisfy the product rules on price and stock.
fn snapshot_is_valid(product: &Product) -> bool {
    validate_price(product.price_cents).is_ok() && validate_non_negative("stock", product.stock).is_ok()
}

// =============================================================================
// Cart Store
// =============================================================================

/// The cart plus its storage slot.
///
/// ## Lifecycle
/// ```text
/// CartStore::load(storage)   rehydrate (or start empty)
///        │
///        ▼
/// add / update / remove / clear  ──► persist() after each real change
/// ```
///
/// ## Example
/// ```rust
/// use emporium_core::cart::{CartStore, MemoryStorage};
///
/// let mut store = CartStore::load(MemoryStorage::new());
/// assert!(store.cart().is_empty());
/// assert!(store.update_quantity(42, 0).is_err());
/// ```
#[derive(Debug)]
pub struct CartStore<S: CartStorage> {
    cart: Cart,
    storage: S,
}

impl<S: CartStorage> CartStore<S> {
    /// Rehydrates the cart from `storage`, or starts empty.
    pub fn load(storage: S) -> Self {
        let cart = storage
            .load(CART_STORAGE_KEY)
            .map(|raw| Cart::from_json_lenient(&raw))
            .unwrap_or_default();

        debug!(lines = cart.item_count(), "Cart loaded");
        CartStore { cart, storage }
    }

    /// Read access to the contents.
    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    pub fn items(&self) -> &[CartLineItem] {
        self.cart.items()
    }

    pub fn total(&self) -> Money {
        self.cart.total()
    }

    pub fn item_count(&self) -> usize {
        self.cart.item_count()
    }

    pub fn total_quantity(&self) -> u64 {
        self.cart.total_quantity()
    }

    /// The underlying storage slot.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Adds `quantity` units of `product`.
    ///
    /// ## Behavior
    /// - Product already in cart: quantity increases
    /// - Product not in cart: new line with this snapshot
    ///
    /// ## Errors
    /// `CartError::InvalidQuantity` for `quantity < 1`.
    pub fn add_to_cart(&mut self, product: Product, quantity: i64) -> Result<(), CartError> {
        let quantity =
            validate_quantity(quantity).map_err(|_| CartError::InvalidQuantity { quantity })?;

        debug!(product_id = product.id, quantity, "Adding to cart");
        self.cart.add(product, quantity);
        self.persist();
        Ok(())
    }

    /// Sets the quantity of an existing line.
    ///
    /// A missing line is a no-op. `quantity < 1` is rejected and the line is
    /// left as it was.
    pub fn update_quantity(&mut self, product_id: i64, quantity: i64) -> Result<(), CartError> {
        let quantity =
            validate_quantity(quantity).map_err(|_| CartError::InvalidQuantity { quantity })?;

        if self.cart.set_quantity(product_id, quantity) {
            self.persist();
        }
        Ok(())
    }

    /// Removes a line if present.
    pub fn remove_from_cart(&mut self, product_id: i64) {
        if self.cart.remove(product_id) {
            self.persist();
        }
    }

    /// Empties the cart.
    pub fn clear_cart(&mut self) {
        self.cart.clear();
        self.persist();
    }

    /// Writes the whole cart. Failures are logged, memory is kept.
    fn persist(&mut self) {
        let json = match self.cart.to_json() {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "Failed to serialize cart");
                return;
            }
        };

        if let Err(e) = self.storage.save(CART_STORAGE_KEY, &json) {
            warn!(error = %e, "Failed to persist cart, keeping in-memory state");
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProductStatus;
    use chrono::Utc;

    fn product(id: i64, price_cents: i64) -> Product {
        let now = Utc::now();
        Product {
            id,
            name: format!("Product {}", id),
            description: None,
            category: "General".to_string(),
            price_cents,
            stock: 10,
            status: ProductStatus::Active,
            image: None,
            owner_id: 1,
            created_at: now,
            updated_at: now,
        }
    }

    /// Storage whose writes always fail.
    struct BrokenStorage;

    impl CartStorage for BrokenStorage {
        fn load(&self, _key: &str) -> Option<String> {
            None
        }

        fn save(&mut self, key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Write {
                key: key.to_string(),
                reason: "disk full".to_string(),
            })
        }
    }

    #[test]
    fn test_add_same_product_twice_merges() {
        let mut store = CartStore::load(MemoryStorage::new());
        let p = product(1, 999);

        store.add_to_cart(p.clone(), 1).unwrap();
        store.add_to_cart(p, 1).unwrap();

        assert_eq!(store.item_count(), 1);
        assert_eq!(store.cart().quantity_of(1), 2);
        assert_eq!(store.total(), Money::from_cents(1998));
    }

    /// Empty cart; add {id 1, 9.99} twice; remove it again.
    #[test]
    fn test_add_then_remove_scenario() {
        let mut store = CartStore::load(MemoryStorage::new());
        let p = product(1, Money::parse_decimal("9.99").unwrap().cents());

        store.add_to_cart(p.clone(), 1).unwrap();
        store.add_to_cart(p, 1).unwrap();
        assert_eq!(store.total().to_string(), "$19.98");
        assert_eq!(store.total_quantity(), 2);

        store.remove_from_cart(1);
        assert!(store.cart().is_empty());
        assert!(store.total().is_zero());
    }

    #[test]
    fn test_update_quantity_zero_rejected() {
        let mut store = CartStore::load(MemoryStorage::new());
        store.add_to_cart(product(5, 100), 3).unwrap();

        let err = store.update_quantity(5, 0).unwrap_err();
        assert_eq!(err, CartError::InvalidQuantity { quantity: 0 });
        assert_eq!(store.cart().quantity_of(5), 3);

        assert!(store.update_quantity(5, -2).is_err());
        assert_eq!(store.cart().quantity_of(5), 3);
    }

    #[test]
    fn test_add_zero_rejected() {
        let mut store = CartStore::load(MemoryStorage::new());
        assert!(store.add_to_cart(product(5, 100), 0).is_err());
        assert!(store.cart().is_empty());
        assert!(store.storage().get(CART_STORAGE_KEY).is_none());
    }

    #[test]
    fn test_missing_line_is_noop() {
        let mut store = CartStore::load(MemoryStorage::new());
        store.add_to_cart(product(1, 100), 1).unwrap();

        assert!(store.update_quantity(99, 4).is_ok());
        store.remove_from_cart(99);
        assert_eq!(store.item_count(), 1);
    }

    #[test]
    fn test_totals() {
        let mut store = CartStore::load(MemoryStorage::new());
        store.add_to_cart(product(1, 999), 2).unwrap();
        store.add_to_cart(product(2, 450), 1).unwrap();

        assert_eq!(store.total(), Money::from_cents(2448));
        assert_eq!(store.item_count(), 2);
        assert_eq!(store.total_quantity(), 3);

        store.update_quantity(2, 4).unwrap();
        assert_eq!(store.total(), Money::from_cents(1998 + 1800));

        store.clear_cart();
        assert!(store.total().is_zero());
        assert_eq!(store.storage().get(CART_STORAGE_KEY), Some("[]"));
    }

    #[test]
    fn test_persists_and_rehydrates() {
        let mut store = CartStore::load(MemoryStorage::new());
        store.add_to_cart(product(3, 250), 2).unwrap();
        store.add_to_cart(product(4, 100), 1).unwrap();

        let storage = store.storage().clone();
        let restored = CartStore::load(storage);

        assert_eq!(restored.cart(), store.cart());
        assert_eq!(restored.total(), Money::from_cents(600));
    }

    #[test]
    fn test_lenient_decode_drops_and_merges() {
        let good = serde_json::to_value(CartLineItem {
            product: product(1, 300),
            quantity: 2,
        })
        .unwrap();
        let zero = serde_json::to_value(CartLineItem {
            product: product(2, 300),
            quantity: 0,
        })
        .unwrap();
        let raw = serde_json::json!([
            good.clone(),
            {"product": {"id": "nope"}, "quantity": 1},
            {"quantity": 3},
            zero,
            good,
            42
        ])
        .to_string();

        let store = CartStore::load(MemoryStorage::with_entry(CART_STORAGE_KEY, &raw));
        assert_eq!(store.item_count(), 1);
        assert_eq!(store.cart().quantity_of(1), 4);
    }

    #[test]
    fn test_lenient_decode_drops_invalid_snapshots() {
        let entry = |p: Product| serde_json::to_value(CartLineItem { product: p, quantity: 1 }).unwrap();
        let mut negative_stock = product(4, 100);
        negative_stock.stock = -3;

        let raw = serde_json::json!([
            entry(product(1, -500)),
            entry(product(2, i64::MAX)),
            entry(product(3, 250)),
            entry(negative_stock),
        ])
        .to_string();

        let store = CartStore::load(MemoryStorage::with_entry(CART_STORAGE_KEY, &raw));
        assert_eq!(store.item_count(), 1);
        assert_eq!(store.cart().quantity_of(3), 1);
        assert_eq!(store.total(), Money::from_cents(250));
    }

    #[test]
    fn test_max_price_total_does_not_overflow() {
        let mut store = CartStore::load(MemoryStorage::new());
        let priciest = product(1, crate::MAX_PRICE_CENTS);

        store.add_to_cart(priciest.clone(), 2).unwrap();
        assert_eq!(store.total(), Money::from_cents(2 * crate::MAX_PRICE_CENTS));

        store.update_quantity(1, i64::from(u32::MAX)).unwrap();
        assert_eq!(
            store.total(),
            Money::from_cents(crate::MAX_PRICE_CENTS * i64::from(u32::MAX))
        );

        // A price that never went through validation saturates instead of panicking
        let parsed = Money::parse_decimal("92233720368547758.07").unwrap();
        store.add_to_cart(product(2, parsed.cents()), 2).unwrap();
        assert_eq!(store.total(), Money::from_cents(i64::MAX));
    }

    #[test]
    fn test_garbage_storage_starts_empty() {
        let store = CartStore::load(MemoryStorage::with_entry(CART_STORAGE_KEY, "{not json"));
        assert!(store.cart().is_empty());

        let store = CartStore::load(MemoryStorage::with_entry(CART_STORAGE_KEY, "{\"a\":1}"));
        assert!(store.cart().is_empty());
    }

    #[test]
    fn test_failed_write_keeps_memory() {
        let mut store = CartStore::load(BrokenStorage);
        store.add_to_cart(product(1, 500), 1).unwrap();

        assert_eq!(store.item_count(), 1);
        assert_eq!(store.total(), Money::from_cents(500));
    }

    #[test]
    fn test_persisted_shape() {
        let mut store = CartStore::load(MemoryStorage::new());
        store.add_to_cart(product(8, 120), 3).unwrap();

        let raw = store.storage().get(CART_STORAGE_KEY).unwrap();
        let value: serde_json::Value = serde_json::from_str(raw).unwrap();
        assert_eq!(value[0]["quantity"], 3);
        assert_eq!(value[0]["product"]["id"], 8);
        assert_eq!(value[0]["product"]["priceCents"], 120);
    }
}
