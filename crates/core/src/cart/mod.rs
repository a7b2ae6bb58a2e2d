//! Cart
//!
//! The cart is a client-held state machine: a mapping from catalog item to [`CartLine`], plus
//! two derived scalars, the total price and the total quantity. Both scalars are recomputed
//! from the full line set after every mutation, and a mutation is only committed once that
//! recomputation succeeds, so a failed operation leaves the cart untouched.

use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

mod line;
mod persistent;
mod storage;

pub use line::{CartLine, CartProduct, ImageUrls};
pub use persistent::{PersistentCart, PersistentCartError};
pub use storage::{CartStorage, CartStorageError, FileCartStorage, MemoryCartStorage};

/// Errors raised by cart mutations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    /// No line exists for the catalog item.
    #[error("no cart line for product {0}")]
    LineNotFound(Uuid),

    /// The line's quantity cannot grow any further.
    #[error("quantity for product {0} is at its maximum")]
    QuantityOverflow(Uuid),

    /// The cart's total price or quantity does not fit in 64 bits.
    #[error("cart total overflowed")]
    TotalOverflow,
}

/// A client-side shopping cart.
///
/// Lines are kept in insertion order and there is at most one line per catalog item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "CartSnapshot")]
pub struct Cart {
    lines: Vec<CartLine>,
    total_price: u64,
    total_quantity: u64,
}

impl Cart {
    /// Create an empty cart.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one unit of `product`.
    ///
    /// An existing line for the same item has its quantity incremented and keeps the title,
    /// price and images captured when it was first added. Otherwise a new line is created with
    /// quantity 1 and a snapshot of `product`.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::QuantityOverflow`] or [`CartError::TotalOverflow`] when the
    /// increment cannot be represented; the cart is left unchanged.
    pub fn add_to_cart(&mut self, product: CartProduct) -> Result<(), CartError> {
        if self.position(product.id).is_some() {
            return self.increase_quantity(product.id);
        }

        let mut lines = self.lines.clone();

        lines.push(CartLine::from_product(product));

        self.commit(lines)
    }

    /// Increase the quantity of the line for `product_id` by one.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::LineNotFound`] when the item is not in the cart, or an overflow
    /// error when the increment cannot be represented.
    pub fn increase_quantity(&mut self, product_id: Uuid) -> Result<(), CartError> {
        let index = self
            .position(product_id)
            .ok_or(CartError::LineNotFound(product_id))?;

        let mut lines = self.lines.clone();

        if let Some(line) = lines.get_mut(index) {
            line.quantity = line
                .quantity
                .checked_add(1)
                .ok_or(CartError::QuantityOverflow(product_id))?;
        }

        self.commit(lines)
    }

    /// Decrease the quantity of the line for `product_id` by one, never below 1.
    ///
    /// Decrementing a line that holds a single unit leaves it in place; use
    /// [`Cart::remove_from_cart`] to drop it.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::LineNotFound`] when the item is not in the cart.
    pub fn decrease_quantity(&mut self, product_id: Uuid) -> Result<(), CartError> {
        let index = self
            .position(product_id)
            .ok_or(CartError::LineNotFound(product_id))?;

        let mut lines = self.lines.clone();

        if let Some(line) = lines.get_mut(index) {
            line.quantity =
                NonZeroU32::new(line.quantity.get().saturating_sub(1)).unwrap_or(NonZeroU32::MIN);
        }

        self.commit(lines)
    }

    /// Remove the line for `product_id` regardless of its quantity.
    ///
    /// Returns the removed line, or `None` when the item was not in the cart.
    pub fn remove_from_cart(&mut self, product_id: Uuid) -> Option<CartLine> {
        let index = self.position(product_id)?;
        let mut lines = self.lines.clone();
        let removed = lines.remove(index);

        // Removing a line can only shrink the totals.
        self.commit(lines).ok().map(|()| removed)
    }

    /// Remove every line.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.total_price = 0;
        self.total_quantity = 0;
    }

    /// Lines in insertion order.
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// The line for `product_id`, if any.
    pub fn line(&self, product_id: Uuid) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.product_id == product_id)
    }

    /// Sum of `price * quantity` over every line, in minor units.
    pub fn total_price(&self) -> u64 {
        self.total_price
    }

    /// Sum of quantities over every line.
    pub fn total_quantity(&self) -> u64 {
        self.total_quantity
    }

    /// Number of distinct lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Check if the cart is empty.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    fn position(&self, product_id: Uuid) -> Option<usize> {
        self.lines
            .iter()
            .position(|line| line.product_id == product_id)
    }

    fn commit(&mut self, lines: Vec<CartLine>) -> Result<(), CartError> {
        let (total_price, total_quantity) = totals(&lines)?;

        self.lines = lines;
        self.total_price = total_price;
        self.total_quantity = total_quantity;

        Ok(())
    }
}

/// Recompute both derived scalars from scratch.
fn totals(lines: &[CartLine]) -> Result<(u64, u64), CartError> {
    lines
        .iter()
        .try_fold((0_u64, 0_u64), |(price, quantity), line| {
            let line_total = line.line_total()?;

            Ok((
                price
                    .checked_add(line_total)
                    .ok_or(CartError::TotalOverflow)?,
                quantity
                    .checked_add(u64::from(line.quantity.get()))
                    .ok_or(CartError::TotalOverflow)?,
            ))
        })
}

/// Persisted shape of a cart. Totals are never trusted from storage.
#[derive(Debug, Deserialize)]
struct CartSnapshot {
    #[serde(default)]
    lines: Vec<CartLine>,
}

impl TryFrom<CartSnapshot> for Cart {
    type Error = CartError;

    fn try_from(snapshot: CartSnapshot) -> Result<Self, Self::Error> {
        let mut lines = Vec::<CartLine>::with_capacity(snapshot.lines.len());

        for line in snapshot.lines {
            match lines
                .iter_mut()
                .find(|existing| existing.product_id == line.product_id)
            {
                Some(existing) => {
                    existing.quantity = existing
                        .quantity
                        .checked_add(line.quantity.get())
                        .ok_or(CartError::QuantityOverflow(line.product_id))?;
                }
                None => lines.push(line),
            }
        }

        let mut cart = Cart::new();

        cart.commit(lines)?;

        Ok(cart)
    }
}
