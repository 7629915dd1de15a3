//! Caller-owned sharing of remote readers.
//!
//! Opening a remote database costs a round trip for its globals and every
//! reader keeps its own bin cache, so applications that draw the same
//! database in several places share one reader through a registry they own.

use crate::error::Result;
use crate::reader::Reader;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// A reader shared between callers.
pub type SharedReader = Arc<RwLock<Reader>>;

/// Map of open readers keyed by `server/database`.
#[derive(Default)]
pub struct ReaderRegistry {
    readers: RwLock<FxHashMap<String, SharedReader>>,
}

impl ReaderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(server: &str, database: &str) -> String {
        format!("{}/{}", server.trim_end_matches('/'), database)
    }

    /// Returns the registered reader or registers the one produced by `open`.
    ///
    /// `open` runs without the registry locked; if two callers race, the
    /// reader registered first wins.
    pub fn get_or_open<F>(&self, server: &str, database: &str, open: F) -> Result<SharedReader>
    where
        F: FnOnce() -> Result<Reader>,
    {
        let key = Self::key(server, database);
        if let Some(reader) = self.readers.read().get(&key) {
            return Ok(Arc::clone(reader));
        }

        let reader = Arc::new(RwLock::new(open()?));
        let mut readers = self.readers.write();
        let entry = readers.entry(key).or_insert_with(|| {
            log::debug!("Registered reader for {}", reader.read().database());
            Arc::clone(&reader)
        });
        Ok(Arc::clone(entry))
    }

    pub fn get(&self, server: &str, database: &str) -> Option<SharedReader> {
        self.readers.read().get(&Self::key(server, database)).cloned()
    }

    /// Drops the registry's handle; callers holding the reader keep it.
    pub fn remove(&self, server: &str, database: &str) -> Option<SharedReader> {
        self.readers.write().remove(&Self::key(server, database))
    }

    pub fn len(&self) -> usize {
        self.readers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.readers.read().is_empty()
    }

    pub fn clear(&self) {
        self.readers.write().clear();
    }
}
