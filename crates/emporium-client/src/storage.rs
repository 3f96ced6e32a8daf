//! # File-backed Cart Storage
//!
//! One JSON file per key in a directory: the cart lands in `<dir>/cart.json`.
//!
//! Reads never fail loudly. A missing file is a fresh session; an unreadable
//! one is logged and treated the same, and the cart's own decoder deals with
//! malformed content.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use emporium_core::{CartStorage, StorageError};

/// [`CartStorage`] writing `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Storage rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileStorage { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    fn write(&self, key: &str, value: &str) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;

        // Write beside the target and rename so a crash never leaves half a file
        let path = self.path_for(key);
        let tmp = self.dir.join(format!(".{key}.json.tmp"));
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)
    }
}

impl CartStorage for FileStorage {
    fn load(&self, key: &str) -> Option<String> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(contents) => Some(contents),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(?path, "No stored value, starting fresh");
                None
            }
            Err(e) => {
                warn!(?path, error = %e, "Failed to read stored value, starting fresh");
                None
            }
        }
    }

    fn save(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.write(key, value).map_err(|e| StorageError::Write {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        debug!(key, bytes = value.len(), "Stored value written");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use emporium_core::{CartStore, Money, Product, ProductStatus, CART_STORAGE_KEY};

    fn product(id: i64, price_cents: i64) -> Product {
        let now = Utc::now();
        Product {
            id,
            name: format!("Product {id}"),
            description: None,
            category: "Kitchen".to_string(),
            price_cents,
            stock: 10,
            status: ProductStatus::Active,
            image: None,
            owner_id: 1,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_missing_file_loads_none() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        assert!(storage.load(CART_STORAGE_KEY).is_none());
    }

    #[test]
    fn test_save_creates_directory_and_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = FileStorage::new(dir.path().join("nested").join("state"));

        storage.save("cart", "[]").unwrap();

        let path = storage.path_for("cart");
        assert!(path.ends_with("nested/state/cart.json"));
        assert_eq!(fs::read_to_string(path).unwrap(), "[]");
        assert_eq!(storage.load("cart").as_deref(), Some("[]"));
    }

    #[test]
    fn test_save_fails_when_dir_is_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "not a directory").unwrap();

        let mut storage = FileStorage::new(&blocker);
        let err = storage.save("cart", "[]").unwrap_err();
        assert!(matches!(err, StorageError::Write { ref key, .. } if key == "cart"));
    }

    #[test]
    fn test_cart_survives_restart() {
        let dir = tempfile::tempdir().unwrap();

        {
            let mut cart = CartStore::load(FileStorage::new(dir.path()));
            cart.add_to_cart(product(1, 999), 2).unwrap();
            cart.add_to_cart(product(2, 250), 1).unwrap();
            cart.remove_from_cart(2);
        }

        let cart = CartStore::load(FileStorage::new(dir.path()));
        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.items()[0].quantity, 2);
        assert_eq!(cart.total(), Money::from_cents(1998));
    }

    #[test]
    fn test_corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("cart.json"), "{ not json").unwrap();

        let cart = CartStore::load(FileStorage::new(dir.path()));
        assert!(cart.cart().is_empty());
    }

    #[test]
    fn test_unwritable_storage_keeps_memory_state() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "").unwrap();

        let mut cart = CartStore::load(FileStorage::new(&blocker));
        cart.add_to_cart(product(3, 100), 1).unwrap();
        assert_eq!(cart.total(), Money::from_cents(100));
    }
}
