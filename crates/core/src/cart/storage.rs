//! Cart persistence
//!
//! The whole cart is the unit of persistence: every save serialises the complete state and
//! replaces whatever was stored before. Concurrent writers sharing one storage key resolve by
//! last write wins.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use thiserror::Error;

use super::Cart;

/// Errors raised while loading or saving a cart.
#[derive(Debug, Error)]
pub enum CartStorageError {
    /// Reading or writing the backing store failed.
    #[error("cart storage I/O failed")]
    Io(#[from] io::Error),

    /// The stored cart could not be encoded or decoded.
    #[error("cart storage encoding failed")]
    Encoding(#[from] serde_json::Error),
}

/// Whole-state storage for a single cart.
pub trait CartStorage {
    /// Load the stored cart, or `None` when nothing has been saved yet.
    ///
    /// # Errors
    ///
    /// Returns a [`CartStorageError`] if the store cannot be read or holds an invalid cart.
    fn load(&self) -> Result<Option<Cart>, CartStorageError>;

    /// Replace the stored cart with `cart`.
    ///
    /// # Errors
    ///
    /// Returns a [`CartStorageError`] if the cart cannot be written.
    fn save(&mut self, cart: &Cart) -> Result<(), CartStorageError>;
}

/// In-memory storage holding the serialised cart.
#[derive(Debug, Default, Clone)]
pub struct MemoryCartStorage {
    stored: Option<String>,
}

impl MemoryCartStorage {
    /// Create empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// The raw serialised cart, if one has been saved.
    pub fn raw(&self) -> Option<&str> {
        self.stored.as_deref()
    }
}

impl CartStorage for MemoryCartStorage {
    fn load(&self) -> Result<Option<Cart>, CartStorageError> {
        self.stored
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
            .map_err(CartStorageError::from)
    }

    fn save(&mut self, cart: &Cart) -> Result<(), CartStorageError> {
        self.stored = Some(serde_json::to_string(cart)?);

        Ok(())
    }
}

/// JSON file storage.
///
/// Saves write a sibling temporary file and rename it over the target, so a reader never
/// observes a partially written cart.
#[derive(Debug, Clone)]
pub struct FileCartStorage {
    path: PathBuf,
}

impl FileCartStorage {
    /// Store the cart at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the stored cart.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();

        name.push(".tmp");

        self.path.with_file_name(name)
    }
}

impl CartStorage for FileCartStorage {
    fn load(&self) -> Result<Option<Cart>, CartStorageError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        Ok(Some(serde_json::from_str(&contents)?))
    }

    fn save(&mut self, cart: &Cart) -> Result<(), CartStorageError> {
        let temp = self.temp_path();

        fs::write(&temp, serde_json::to_vec(cart)?)?;
        fs::rename(&temp, &self.path)?;

        Ok(())
    }
}
