use parking_lot::Mutex;
use std::path::PathBuf;
use tracing::{debug, warn};

use super::data::BuddyData;
use super::error::{BuddyError, Result};
use super::seed::seed_data;

/// Durable home of the whole [`BuddyData`] blob.
///
/// The blob is read in full and written back in full; there is no partial
/// update.
pub trait BlobStore: Send + Sync {
    fn load(&self) -> Result<BuddyData>;
    fn save(&self, data: &BuddyData) -> Result<()>;
}

/// Load the persisted blob, or the seed dataset when it is missing or unreadable
pub fn load_or_seed(store: &dyn BlobStore) -> BuddyData {
    match store.load() {
        Ok(data) => data,
        Err(e) => {
            warn!(error = %e, "falling back to seed data");
            seed_data()
        }
    }
}

/// Pretty-printed JSON file on disk
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl BlobStore for JsonFileStore {
    fn load(&self) -> Result<BuddyData> {
        if !self.path.exists() {
            return Err(BuddyError::StoreUnavailable(format!(
                "{} does not exist",
                self.path.display()
            )));
        }

        let content = std::fs::read_to_string(&self.path)?;
        let data: BuddyData = serde_json::from_str(&content)?;
        debug!(path = %self.path.display(), "loaded data file");
        Ok(data)
    }

    fn save(&self, data: &BuddyData) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(data)?;
        std::fs::write(&self.path, content)?;
        debug!(path = %self.path.display(), "saved data file");
        Ok(())
    }
}

/// Keeps the serialized blob in memory; for tests and embedding
#[derive(Default)]
pub struct MemoryBlobStore {
    blob: Mutex<Option<String>>,
    fail_saves: bool,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every save fails, to exercise the unavailable path
    pub fn failing() -> Self {
        Self {
            blob: Mutex::new(None),
            fail_saves: true,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.blob.lock().is_none()
    }
}

impl BlobStore for MemoryBlobStore {
    fn load(&self) -> Result<BuddyData> {
        let blob = self.blob.lock();
        let content = blob
            .as_deref()
            .ok_or_else(|| BuddyError::StoreUnavailable("nothing saved yet".to_string()))?;
        Ok(serde_json::from_str(content)?)
    }

    fn save(&self, data: &BuddyData) -> Result<()> {
        if self.fail_saves {
            return Err(BuddyError::StoreUnavailable("store is read-only".to_string()));
        }
        let content = serde_json::to_string(data)?;
        *self.blob.lock() = Some(content);
        Ok(())
    }
}
