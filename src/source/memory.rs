//! In-memory named arrays.
//!
//! Serves both as a local [`ArraySource`] and as a [`DapTransport`] "server",
//! counting every read so callers can observe access patterns.

use super::{ArrayData, ArraySource, Constraint, DapResponse, DapTransport};
use crate::error::{GshhsError, Result};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

#[derive(Debug, thiserror::Error)]
pub enum MemoryError {
    #[error("no such variable: {0}")]
    UnknownVariable(String),
    #[error("{var}[{start}..{end}] is out of bounds")]
    OutOfBounds {
        var: String,
        start: usize,
        end: usize,
    },
    #[error("server unavailable")]
    Offline,
}

/// Access counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourceStats {
    /// Slice reads through [`ArraySource::read_slice`]
    pub slice_reads: u64,
    /// Round trips through [`DapTransport::fetch`]
    pub fetches: u64,
}

/// Named arrays held in memory.
#[derive(Debug, Default)]
pub struct MemoryArrays {
    arrays: FxHashMap<String, ArrayData>,
    slice_reads: AtomicU64,
    fetches: AtomicU64,
    offline: AtomicBool,
    fetch_log: Mutex<Vec<Constraint>>,
}

impl MemoryArrays {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces an array.
    pub fn insert(&mut self, name: &str, data: impl Into<ArrayData>) {
        self.arrays.insert(name.to_string(), data.into());
    }

    pub fn with(mut self, name: &str, data: impl Into<ArrayData>) -> Self {
        self.insert(name, data);
        self
    }

    pub fn get(&self, name: &str) -> Option<&ArrayData> {
        self.arrays.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.arrays.keys().map(String::as_str)
    }

    pub fn stats(&self) -> SourceStats {
        SourceStats {
            slice_reads: self.slice_reads.load(Ordering::Relaxed),
            fetches: self.fetches.load(Ordering::Relaxed),
        }
    }

    pub fn reset_stats(&self) {
        self.slice_reads.store(0, Ordering::Relaxed);
        self.fetches.store(0, Ordering::Relaxed);
        self.fetch_log.lock().clear();
    }

    /// Constraints received by `fetch`, in arrival order.
    pub fn fetch_log(&self) -> Vec<Constraint> {
        self.fetch_log.lock().clone()
    }

    /// Makes every subsequent `fetch` fail.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::Relaxed);
    }

    fn slice_of(&self, var: &str, start: usize, count: usize) -> std::result::Result<ArrayData, MemoryError> {
        let data = self
            .arrays
            .get(var)
            .ok_or_else(|| MemoryError::UnknownVariable(var.to_string()))?;
        data.slice(start, count).map_err(|_| MemoryError::OutOfBounds {
            var: var.to_string(),
            start,
            end: start.saturating_add(count),
        })
    }
}

impl ArraySource for MemoryArrays {
    type Variable = String;

    fn select(&self, name: &str) -> Result<String> {
        if self.arrays.contains_key(name) {
            Ok(name.to_string())
        } else {
            Err(GshhsError::open(name, MemoryError::UnknownVariable(name.to_string())))
        }
    }

    fn extent(&self, var: &String) -> usize {
        self.arrays.get(var).map_or(0, ArrayData::len)
    }

    fn read_slice(&self, var: &String, start: usize, count: usize) -> Result<ArrayData> {
        self.slice_reads.fetch_add(1, Ordering::Relaxed);
        self.slice_of(var, start, count)
            .map_err(|e| GshhsError::backend(format!("read {}", var), e))
    }
}

impl DapTransport for MemoryArrays {
    type Error = MemoryError;

    fn dimension(&self, _url: &str, var: &str) -> std::result::Result<usize, MemoryError> {
        if self.offline.load(Ordering::Relaxed) {
            return Err(MemoryError::Offline);
        }
        self.arrays
            .get(var)
            .map(ArrayData::len)
            .ok_or_else(|| MemoryError::UnknownVariable(var.to_string()))
    }

    fn fetch(&self, _url: &str, constraint: &Constraint) -> std::result::Result<DapResponse, MemoryError> {
        self.fetches.fetch_add(1, Ordering::Relaxed);
        self.fetch_log.lock().push(constraint.clone());
        if self.offline.load(Ordering::Relaxed) {
            return Err(MemoryError::Offline);
        }

        let mut response = DapResponse::default();
        for spec in constraint.specs() {
            let data = self.slice_of(&spec.var, spec.start, spec.count)?;
            response.insert(spec.var.clone(), data);
        }
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arrays() -> MemoryArrays {
        MemoryArrays::new()
            .with("a", vec![1i16, 2, 3, 4])
            .with("b", vec![10i32, 20])
    }

    #[test]
    fn test_array_source_reads_count() {
        let arrays = arrays();
        let var = arrays.select("a").unwrap();
        assert_eq!(arrays.extent(&var), 4);
        assert_eq!(arrays.read_slice(&var, 2, 2).unwrap(), ArrayData::Short(vec![3, 4]));
        assert!(arrays.read_slice(&var, 3, 2).is_err());
        assert_eq!(arrays.stats().slice_reads, 2);
        assert!(arrays.select("missing").is_err());
    }

    #[test]
    fn test_fetch_answers_all_slices() {
        let arrays = arrays();
        let constraint = Constraint::new().slice("a", 0, 2).slice("b", 1, 1);
        let response = arrays.fetch("mem://db", &constraint).unwrap();

        assert_eq!(response["a"], ArrayData::Short(vec![1, 2]));
        assert_eq!(response["b"], ArrayData::Int(vec![20]));
        assert_eq!(arrays.stats().fetches, 1);
        assert_eq!(arrays.fetch_log(), vec![constraint]);
    }

    #[test]
    fn test_offline_fetch_fails() {
        let arrays = arrays();
        arrays.set_offline(true);
        let err = arrays.fetch("mem://db", &Constraint::new().slice("a", 0, 1)).unwrap_err();
        assert!(matches!(err, MemoryError::Offline));

        arrays.set_offline(false);
        arrays.reset_stats();
        assert_eq!(arrays.stats(), SourceStats::default());
    }
}
