//! Cart lines

use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use uuid::Uuid;

use super::CartError;

/// Image URLs attached to a product; most products carry only a handful.
pub type ImageUrls = SmallVec<[String; 4]>;

/// The product details captured when an item is added to the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartProduct {
    /// Internal id of the catalog item.
    pub id: Uuid,

    /// Title at the time of adding.
    pub title: String,

    /// Unit price in minor units at the time of adding.
    pub price: u64,

    /// Image URLs at the time of adding.
    #[serde(default)]
    pub images: ImageUrls,
}

/// One line of the cart: a snapshotted catalog item and its quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// Internal id of the catalog item.
    pub product_id: Uuid,

    /// Title snapshot.
    pub title: String,

    /// Unit price snapshot in minor units.
    pub price: u64,

    /// Image URL snapshot.
    #[serde(default)]
    pub images: ImageUrls,

    /// Number of units, always at least 1.
    pub quantity: NonZeroU32,
}

impl CartLine {
    pub(super) fn from_product(product: CartProduct) -> Self {
        Self {
            product_id: product.id,
            title: product.title,
            price: product.price,
            images: product.images,
            quantity: NonZeroU32::MIN,
        }
    }

    /// `price * quantity` in minor units.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::TotalOverflow`] when the product does not fit in 64 bits.
    pub fn line_total(&self) -> Result<u64, CartError> {
        self.price
            .checked_mul(u64::from(self.quantity.get()))
            .ok_or(CartError::TotalOverflow)
    }
}

#[cfg(test)]
mod tests {
    use smallvec::smallvec;
    use testresult::TestResult;

    use super::*;

    #[test]
    fn from_product_starts_at_one_unit() {
        let product = CartProduct {
            id: Uuid::now_v7(),
            title: "Mug".to_owned(),
            price: 799,
            images: smallvec![],
        };

        let line = CartLine::from_product(product.clone());

        assert_eq!(line.product_id, product.id);
        assert_eq!(line.quantity, NonZeroU32::MIN);
    }

    #[test]
    fn line_total_multiplies_price_by_quantity() -> TestResult {
        let line = CartLine {
            product_id: Uuid::now_v7(),
            title: "Mug".to_owned(),
            price: 799,
            images: smallvec![],
            quantity: NonZeroU32::new(3).ok_or("non-zero")?,
        };

        assert_eq!(line.line_total()?, 2397);

        Ok(())
    }
}
