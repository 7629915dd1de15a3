//! Local random-access backend.

use super::{Backend, BinData};
use crate::error::{GshhsError, Result};
use crate::globals::{Globals, GlobalsParts};
use crate::source::{ArraySource, vars};
use std::sync::Arc;

/// Reads each bin directly from an [`ArraySource`] by offset.
///
/// No caching beyond what the source provides; `prefetch` is a no-op.
pub struct LocalBackend<S: ArraySource> {
    source: S,
    name: String,
    globals: Globals,
    levels: S::Variable,
    point_counts: S::Variable,
    dx: S::Variable,
    dy: S::Variable,
}

impl<S: ArraySource> LocalBackend<S> {
    /// Reads the globals and resolves the per-bin arrays.
    pub fn open(source: S, name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let globals = read_globals(&source)?;

        let levels = source.select(vars::SEGMENT_LEVEL)?;
        let point_counts = source.select(vars::SEGMENT_POINTS)?;
        let dx = source.select(vars::DX)?;
        let dy = source.select(vars::DY)?;

        for (var, name, needed) in [
            (&levels, vars::SEGMENT_LEVEL, globals.total_segments),
            (&point_counts, vars::SEGMENT_POINTS, globals.total_segments),
            (&dx, vars::DX, globals.total_points),
            (&dy, vars::DY, globals.total_points),
        ] {
            let extent = source.extent(var);
            if extent < needed {
                return Err(GshhsError::InvalidFormat(format!(
                    "{} has {} values, expected {}",
                    name, extent, needed
                )));
            }
        }

        log::info!(
            "Opened {}: {}x{} bins of {:.4} deg, {} segments, {} points",
            name,
            globals.grid.lon_bins,
            globals.grid.lat_bins,
            globals.bin_size(),
            globals.total_segments,
            globals.total_points
        );

        Ok(Self {
            source,
            name,
            globals,
            levels,
            point_counts,
            dx,
            dy,
        })
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}

fn read_scalar<S: ArraySource>(source: &S, name: &str) -> Result<usize> {
    let var = source.select(name)?;
    source.read_slice(&var, 0, 1)?.scalar(name)
}

fn read_indices<S: ArraySource>(source: &S, name: &str, count: usize) -> Result<Vec<usize>> {
    let var = source.select(name)?;
    source.read_slice(&var, 0, count)?.to_indices(name)
}

fn read_globals<S: ArraySource>(source: &S) -> Result<Globals> {
    let total_bins = read_scalar(source, vars::TOTAL_BINS)?;
    let total_segments = read_scalar(source, vars::TOTAL_SEGMENTS)?;

    Globals::from_parts(GlobalsParts {
        bin_size_minutes: read_scalar(source, vars::BIN_SIZE_MINUTES)?,
        lon_bins: read_scalar(source, vars::LON_BINS)?,
        lat_bins: read_scalar(source, vars::LAT_BINS)?,
        total_bins,
        total_segments,
        total_points: read_scalar(source, vars::TOTAL_POINTS)?,
        first_segment: read_indices(source, vars::FIRST_SEGMENT, total_bins)?,
        segment_count: read_indices(source, vars::SEGMENT_COUNT, total_bins)?,
        first_point: read_indices(source, vars::FIRST_POINT, total_segments)?,
    })
}

impl<S: ArraySource> Backend for LocalBackend<S> {
    fn globals(&self) -> &Globals {
        &self.globals
    }

    fn prefetch(&self, _bins: &[usize]) -> Result<()> {
        Ok(())
    }

    fn read_bin(&self, bin: usize) -> Result<Arc<BinData>> {
        let count = self.globals.segment_count(bin);
        if count == 0 {
            return Ok(Arc::new(BinData::default()));
        }

        let first = self.globals.first_segment(bin);
        let levels = self.source.read_slice(&self.levels, first, count)?.to_u16();
        let point_counts = self
            .source
            .read_slice(&self.point_counts, first, count)?
            .to_u16();

        // Point counts are checked against the index when the bin is assembled.
        let points = self.globals.bin_point_range(bin);
        let dx = self.source.read_slice(&self.dx, points.start, points.len())?.to_u16();
        let dy = self.source.read_slice(&self.dy, points.start, points.len())?.to_u16();

        Ok(Arc::new(BinData {
            levels,
            point_counts,
            dx,
            dy,
        }))
    }

    fn describe(&self) -> String {
        format!("local:{}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{LayoutBuilder, MemoryArrays};

    fn backend() -> LocalBackend<MemoryArrays> {
        let arrays = LayoutBuilder::new(60, 360, 180)
            .segment(10, 1, &[(0, 0), (100, 200)])
            .segment(10, 2, &[(5, 5), (5, 5), (7, 7)])
            .segment(12, 1, &[(65535, 1)])
            .to_memory();
        LocalBackend::open(arrays, "test").unwrap()
    }

    #[test]
    fn test_open_reads_globals() {
        let backend = backend();
        let globals = backend.globals();
        assert_eq!(globals.total_bins, 360 * 180);
        assert_eq!(globals.total_segments, 3);
        assert_eq!(globals.total_points, 6);
        assert_eq!(globals.bin_size(), 1.0);
        assert_eq!(backend.describe(), "local:test");
    }

    #[test]
    fn test_read_bin_slices() {
        let backend = backend();
        let data = backend.read_bin(10).unwrap();
        assert_eq!(data.levels, vec![1, 2]);
        assert_eq!(data.point_counts, vec![2, 3]);
        assert_eq!(data.dx, vec![0, 100, 5, 5, 7]);
        assert_eq!(data.dy, vec![0, 200, 5, 5, 7]);

        let data = backend.read_bin(12).unwrap();
        assert_eq!(data.dx, vec![65535]);
    }

    #[test]
    fn test_empty_bin_reads_nothing() {
        let backend = backend();
        backend.source().reset_stats();

        let data = backend.read_bin(11).unwrap();
        assert_eq!(data.segment_count(), 0);
        assert_eq!(backend.read_bin(999_999).unwrap().segment_count(), 0);
        assert_eq!(backend.source().stats().slice_reads, 0);
    }

    #[test]
    fn test_reads_points_by_index_not_by_count() {
        let mut arrays = LayoutBuilder::new(60, 360, 180)
            .segment(10, 1, &[(0, 0), (1, 1)])
            .segment(11, 1, &[(2, 2), (3, 3)])
            .to_memory();
        arrays.insert(vars::SEGMENT_POINTS, vec![4i16, 2]);
        let backend = LocalBackend::open(arrays, "test").unwrap();

        let data = backend.read_bin(10).unwrap();
        assert_eq!(data.point_counts, vec![4]);
        assert_eq!(data.dx, vec![0, 1]);
    }

    #[test]
    fn test_short_point_arrays_fail_open() {
        let mut arrays = LayoutBuilder::new(60, 360, 180)
            .segment(10, 1, &[(0, 0), (1, 1)])
            .to_memory();
        arrays.insert(vars::DY, vec![0i16]);
        let err = LocalBackend::open(arrays, "test").err().unwrap();
        assert!(matches!(err, GshhsError::InvalidFormat(_)));
        assert!(err.to_string().contains(vars::DY));
    }

    #[test]
    fn test_missing_variable_fails_open() {
        let arrays = LayoutBuilder::new(60, 360, 180).to_memory();
        let mut stripped = MemoryArrays::new();
        for name in arrays.names().filter(|n| *n != vars::DY) {
            stripped.insert(name, arrays.get(name).cloned().unwrap());
        }
        assert!(matches!(
            LocalBackend::open(stripped, "broken"),
            Err(GshhsError::Open { .. })
        ));
    }
}
