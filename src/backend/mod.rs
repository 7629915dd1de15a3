//! Backend abstraction over local and remote bin retrieval.
//!
//! Both backends read the database globals once at open time and then hand
//! out the raw segment arrays of one bin at a time. The remote backend needs
//! a [`Backend::prefetch`] call covering every bin before any of them is read.

use crate::error::Result;
use crate::globals::Globals;
use std::sync::Arc;

mod local;
mod remote;

pub use local::LocalBackend;
pub use remote::{BinRun, RemoteBackend};

/// Raw segment arrays of a single bin.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BinData {
    /// Hierarchical level of each segment
    pub levels: Vec<u16>,
    /// Point count of each segment
    pub point_counts: Vec<u16>,
    /// Longitude offsets of all the bin's points, segment after segment
    pub dx: Vec<u16>,
    /// Latitude offsets, parallel to `dx`
    pub dy: Vec<u16>,
}

impl BinData {
    pub fn segment_count(&self) -> usize {
        self.levels.len()
    }

    pub fn point_count(&self) -> usize {
        self.dx.len()
    }
}

/// Trait for bin data retrieval implementations
pub trait Backend: Send + Sync {
    /// Database globals read at open time
    fn globals(&self) -> &Globals;

    /// Hint that the given bins, sorted ascending, are about to be read
    fn prefetch(&self, bins: &[usize]) -> Result<()>;

    /// Raw arrays for exactly one bin
    fn read_bin(&self, bin: usize) -> Result<Arc<BinData>>;

    /// Short human-readable description for logs
    fn describe(&self) -> String;
}
