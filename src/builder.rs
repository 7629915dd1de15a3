//! Reader builder
//!
//! Selects the local or remote backend from configuration, so callers only
//! name the database they want.

use crate::config::{Config, CorruptBinPolicy};
use crate::database::{DatabaseType, Resolution, database_name};
use crate::error::{GshhsError, Result};
use crate::reader::Reader;
use crate::source::DapTransport;
use std::path::PathBuf;

/// Builder for readers over local files or a data server.
#[derive(Debug, Clone, Default)]
pub struct ReaderBuilder {
    config: Config,
    server: Option<String>,
}

impl ReaderBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the reader configuration.
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Directory that local database names are resolved against.
    pub fn data_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.config = self.config.with_data_dir(dir);
        self
    }

    /// Server path for remote databases, e.g. `http://server.com/data`.
    pub fn server(mut self, url: impl Into<String>) -> Self {
        self.server = Some(url.into());
        self
    }

    pub fn fetch_threads(mut self, threads: usize) -> Self {
        self.config = self.config.with_fetch_threads(threads);
        self
    }

    pub fn corrupt_bins(mut self, policy: CorruptBinPolicy) -> Self {
        self.config = self.config.with_corrupt_bins(policy);
        self
    }

    pub fn level_range(mut self, min: u8, max: u8) -> Self {
        self.config = self.config.with_level_range(min, max);
        self
    }

    pub fn server_path(&self) -> Option<&str> {
        self.server.as_deref()
    }

    /// Open a database file from the data directory.
    pub fn open_local(&self, database: &str) -> Result<Reader> {
        Reader::open_local(database, self.config.clone())
    }

    /// Open a database on the configured server.
    pub fn open_remote<T>(&self, transport: T, database: &str) -> Result<Reader>
    where
        T: DapTransport + 'static,
    {
        let server = self
            .server
            .as_deref()
            .ok_or_else(|| GshhsError::InvalidInput("no server path configured".to_string()))?;
        Reader::open_remote(transport, server, database, self.config.clone())
    }

    /// Open the local database of a type at a resolution.
    pub fn open_local_database(&self, kind: DatabaseType, resolution: Resolution) -> Result<Reader> {
        self.open_local(&database_name(kind, resolution))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::LayoutBuilder;

    #[test]
    fn test_builder_collects_config() {
        let builder = ReaderBuilder::new()
            .data_dir("/data/gshhs")
            .fetch_threads(2)
            .corrupt_bins(CorruptBinPolicy::Abort)
            .level_range(1, 2)
            .server("http://server.com/data");

        assert_eq!(builder.server_path(), Some("http://server.com/data"));
        assert_eq!(builder.config.fetch_threads, 2);
        assert_eq!(builder.config.corrupt_bins, CorruptBinPolicy::Abort);
        assert_eq!((builder.config.min_level, builder.config.max_level), (1, 2));
    }

    #[test]
    fn test_open_remote_requires_server() {
        let err = ReaderBuilder::new()
            .open_remote(LayoutBuilder::new(60, 360, 180).to_memory(), "db")
            .unwrap_err();
        assert!(matches!(err, GshhsError::InvalidInput(_)));
    }

    #[test]
    fn test_open_remote() {
        let reader = ReaderBuilder::new()
            .server("mem://data")
            .level_range(2, 4)
            .open_remote(LayoutBuilder::new(60, 360, 180).to_memory(), "binned_border_l.hdf")
            .unwrap();
        assert_eq!(reader.database(), "binned_border_l.hdf");
        assert_eq!(reader.level_range(), (2, 4));
        assert_eq!(reader.backend().describe(), "remote:mem://data/binned_border_l.hdf");
    }

    #[test]
    fn test_open_local_database_from_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        LayoutBuilder::new(60, 360, 180)
            .segment(0, 1, &[(0, 0)])
            .write_archive(dir.path().join("binned_river_c.hdf"))
            .unwrap();

        let reader = ReaderBuilder::new()
            .data_dir(dir.path())
            .open_local_database(DatabaseType::River, Resolution::Crude)
            .unwrap();
        assert_eq!(reader.database(), "binned_river_c.hdf");
        assert_eq!(reader.bin_count(), 64800);

        let missing = ReaderBuilder::new()
            .data_dir(dir.path())
            .open_local_database(DatabaseType::Coast, Resolution::Full);
        assert!(matches!(missing, Err(GshhsError::Open { .. })));
    }
}
