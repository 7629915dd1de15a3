//! Query engine over a binned database.
//!
//! A [`Reader`] owns one backend. [`Reader::select`] loads every line
//! feature of the bins touched by a region; [`Reader::iter`] then yields the
//! loaded features whose level lies in the current level range. Changing the
//! level range never touches the database.

use crate::area::EarthArea;
use crate::assemble::{Bin, assemble};
use crate::backend::{Backend, LocalBackend, RemoteBackend};
use crate::config::{Config, CorruptBinPolicy};
use crate::error::{DecodeError, GshhsError, Result};
use crate::feature::{LineFeature, feature_collection};
use crate::globals::Globals;
use crate::source::{ArchiveFile, DapTransport};
use geojson::FeatureCollection;

/// Lifecycle of a reader's result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderState {
    /// No region has been selected yet
    Idle,
    /// A selection is in progress
    Selecting,
    /// Results of the last successful selection are available
    Ready,
}

/// A bin left out of a selection because its arrays were inconsistent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub bin: usize,
    pub error: DecodeError,
}

/// Reads line features from one binned database.
///
/// # Examples
///
/// ```rust
/// use gshhs_binned::{EarthArea, EarthLocation, Reader};
/// use gshhs_binned::source::LayoutBuilder;
///
/// let arrays = LayoutBuilder::new(60, 360, 180)
///     .segment(16075, 1, &[(0, 0), (30000, 30000)])
///     .to_memory();
/// let mut reader = Reader::open_remote(arrays, "mem://data", "coast", Default::default())?;
///
/// let mut area = EarthArea::new();
/// area.add(EarthLocation::new(45.5, -124.5));
/// reader.select(&area)?;
/// assert_eq!(reader.iter().count(), 1);
/// # Ok::<(), gshhs_binned::GshhsError>(())
/// ```
pub struct Reader {
    backend: Box<dyn Backend>,
    database: String,
    config: Config,
    state: ReaderState,
    results: Vec<LineFeature>,
    diagnostics: Vec<Diagnostic>,
    min_level: u8,
    max_level: u8,
}

impl Reader {
    /// Opens a local database file, resolved against the configured data directory.
    pub fn open_local(database: &str, config: Config) -> Result<Self> {
        config.validate().map_err(GshhsError::Config)?;
        let path = config.resolve_database(database);
        let file = ArchiveFile::open(&path)?;
        let backend = LocalBackend::open(file, database)?;
        Ok(Self::with_backend(Box::new(backend), database, config))
    }

    /// Opens `database` on a data server through `transport`.
    pub fn open_remote<T>(transport: T, server_path: &str, database: &str, config: Config) -> Result<Self>
    where
        T: DapTransport + 'static,
    {
        config.validate().map_err(GshhsError::Config)?;
        let backend = RemoteBackend::open(transport, server_path, database, config.fetch_threads)?;
        Ok(Self::with_backend(Box::new(backend), database, config))
    }

    /// Wraps an already opened backend.
    pub fn with_backend(backend: Box<dyn Backend>, database: impl Into<String>, config: Config) -> Self {
        Self {
            backend,
            database: database.into(),
            min_level: config.min_level,
            max_level: config.max_level,
            config,
            state: ReaderState::Idle,
            results: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Loads the features of every bin touched by `area`.
    ///
    /// On error the results of the previous selection are kept unchanged.
    pub fn select(&mut self, area: &EarthArea) -> Result<()> {
        let previous = self.state;
        self.state = ReaderState::Selecting;

        match self.load(area) {
            Ok((results, diagnostics)) => {
                self.results = results;
                self.diagnostics = diagnostics;
                self.state = ReaderState::Ready;
                Ok(())
            }
            Err(e) => {
                self.state = previous;
                Err(e)
            }
        }
    }

    fn load(&self, area: &EarthArea) -> Result<(Vec<LineFeature>, Vec<Diagnostic>)> {
        let globals = self.backend.globals();
        let bins = globals.grid.candidate_bins(area);
        self.backend.prefetch(&bins)?;

        let mut results = Vec::new();
        let mut diagnostics = Vec::new();
        for &index in &bins {
            if globals.segment_count(index) == 0 {
                continue;
            }

            let data = self.backend.read_bin(index)?;
            match assemble(&Bin::new(globals, index), &data, globals) {
                Ok(features) => results.extend(features),
                Err(error) => match self.config.corrupt_bins {
                    CorruptBinPolicy::Skip => {
                        log::warn!("Skipping corrupt bin {} of {}: {}", index, self.database, error);
                        diagnostics.push(Diagnostic { bin: index, error });
                    }
                    CorruptBinPolicy::Abort => return Err(GshhsError::Decode { bin: index, error }),
                },
            }
        }

        log::debug!(
            "Selected {} features from {} candidate bins of {}",
            results.len(),
            bins.len(),
            self.backend.describe()
        );
        Ok((results, diagnostics))
    }

    /// Sets the inclusive level range yielded by [`Reader::iter`].
    pub fn set_level_range(&mut self, min: u8, max: u8) {
        self.min_level = min;
        self.max_level = max;
    }

    pub fn level_range(&self) -> (u8, u8) {
        (self.min_level, self.max_level)
    }

    /// Selected features whose level is within the level range.
    pub fn iter(&self) -> impl Iterator<Item = &LineFeature> + '_ {
        let (min, max) = self.level_range();
        self.results
            .iter()
            .filter(move |feature| (min..=max).contains(&feature.level))
    }

    /// Total number of bins in the database.
    pub fn bin_count(&self) -> usize {
        self.backend.globals().total_bins
    }

    /// Bins a selection of `area` would read, ascending.
    pub fn candidate_bins(&self, area: &EarthArea) -> Vec<usize> {
        self.backend.globals().grid.candidate_bins(area)
    }

    /// Number of selected features regardless of level.
    pub fn feature_count(&self) -> usize {
        self.results.len()
    }

    /// Bins skipped by the last successful selection.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn state(&self) -> ReaderState {
        self.state
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn globals(&self) -> &Globals {
        self.backend.globals()
    }

    pub fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }

    /// Features yielded by [`Reader::iter`] as GeoJSON.
    pub fn to_feature_collection(&self) -> FeatureCollection {
        feature_collection(self.iter())
    }
}

impl std::fmt::Debug for Reader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reader")
            .field("backend", &self.backend.describe())
            .field("state", &self.state)
            .field("features", &self.results.len())
            .field("levels", &self.level_range())
            .finish()
    }
}
