//! Persistent cart

use thiserror::Error;
use uuid::Uuid;

use super::{Cart, CartError, CartLine, CartProduct, CartStorage, CartStorageError};

/// Errors raised by a [`PersistentCart`].
#[derive(Debug, Error)]
pub enum PersistentCartError {
    /// The mutation itself was rejected.
    #[error(transparent)]
    Cart(#[from] CartError),

    /// The mutation succeeded in memory but could not be saved.
    #[error(transparent)]
    Storage(#[from] CartStorageError),
}

/// A [`Cart`] that writes its whole state to storage after every mutation.
#[derive(Debug)]
pub struct PersistentCart<S> {
    cart: Cart,
    storage: S,
}

impl<S: CartStorage> PersistentCart<S> {
    /// Open the cart held in `storage`, starting empty when nothing is stored.
    ///
    /// # Errors
    ///
    /// Returns a [`CartStorageError`] if the stored cart cannot be read.
    pub fn open(storage: S) -> Result<Self, CartStorageError> {
        let cart = storage.load()?.unwrap_or_default();

        Ok(Self { cart, storage })
    }

    /// The current cart.
    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    /// The underlying storage.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// See [`Cart::add_to_cart`].
    ///
    /// # Errors
    ///
    /// Returns a [`PersistentCartError`] if the mutation is rejected or cannot be saved.
    pub fn add_to_cart(&mut self, product: CartProduct) -> Result<(), PersistentCartError> {
        self.cart.add_to_cart(product)?;

        self.persist()
    }

    /// See [`Cart::increase_quantity`].
    ///
    /// # Errors
    ///
    /// Returns a [`PersistentCartError`] if the mutation is rejected or cannot be saved.
    pub fn increase_quantity(&mut self, product_id: Uuid) -> Result<(), PersistentCartError> {
        self.cart.increase_quantity(product_id)?;

        self.persist()
    }

    /// See [`Cart::decrease_quantity`].
    ///
    /// # Errors
    ///
    /// Returns a [`PersistentCartError`] if the mutation is rejected or cannot be saved.
    pub fn decrease_quantity(&mut self, product_id: Uuid) -> Result<(), PersistentCartError> {
        self.cart.decrease_quantity(product_id)?;

        self.persist()
    }

    /// See [`Cart::remove_from_cart`].
    ///
    /// # Errors
    ///
    /// Returns a [`PersistentCartError`] if the cart cannot be saved.
    pub fn remove_from_cart(
        &mut self,
        product_id: Uuid,
    ) -> Result<Option<CartLine>, PersistentCartError> {
        let removed = self.cart.remove_from_cart(product_id);

        self.persist()?;

        Ok(removed)
    }

    /// See [`Cart::clear`].
    ///
    /// # Errors
    ///
    /// Returns a [`PersistentCartError`] if the cart cannot be saved.
    pub fn clear(&mut self) -> Result<(), PersistentCartError> {
        self.cart.clear();

        self.persist()
    }

    /// Consume the wrapper, returning the cart and its storage.
    pub fn into_parts(self) -> (Cart, S) {
        (self.cart, self.storage)
    }

    fn persist(&mut self) -> Result<(), PersistentCartError> {
        self.storage.save(&self.cart)?;

        Ok(())
    }
}
