//! Builder for arrays in the binned database layout.
//!
//! Lays segments out bin by bin exactly as the reader expects, for database
//! conversion and for building small databases in tests and benchmarks.

use super::{ArchiveWriter, ArrayData, MemoryArrays, vars};
use crate::error::Result;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone)]
struct RawSegment {
    level: u16,
    points: Vec<(u16, u16)>,
}

/// Collects segments per bin and emits the thirteen layout arrays.
#[derive(Debug, Clone)]
pub struct LayoutBuilder {
    bin_size_minutes: i32,
    lon_bins: usize,
    lat_bins: usize,
    bins: BTreeMap<usize, Vec<RawSegment>>,
}

impl LayoutBuilder {
    pub fn new(bin_size_minutes: i32, lon_bins: usize, lat_bins: usize) -> Self {
        Self {
            bin_size_minutes,
            lon_bins,
            lat_bins,
            bins: BTreeMap::new(),
        }
    }

    /// Full globe grid for a bin size in minutes.
    pub fn global(bin_size_minutes: i32) -> Self {
        let per_degree = 60.0 / f64::from(bin_size_minutes);
        Self::new(
            bin_size_minutes,
            (360.0 * per_degree).round() as usize,
            (180.0 * per_degree).round() as usize,
        )
    }

    /// Appends a segment of `(dx, dy)` offsets to a bin.
    pub fn segment(mut self, bin: usize, level: u16, points: &[(u16, u16)]) -> Self {
        assert!(
            bin < self.lon_bins * self.lat_bins,
            "bin {} is outside the grid",
            bin
        );
        self.bins.entry(bin).or_default().push(RawSegment {
            level,
            points: points.to_vec(),
        });
        self
    }

    /// Emits `(name, data)` for every array of the layout.
    pub fn arrays(&self) -> Vec<(&'static str, ArrayData)> {
        let total_bins = self.lon_bins * self.lat_bins;
        let mut first_segment = Vec::with_capacity(total_bins);
        let mut segment_count = Vec::with_capacity(total_bins);
        let mut first_point = Vec::new();
        let mut levels = Vec::new();
        let mut point_counts = Vec::new();
        let mut dx = Vec::new();
        let mut dy = Vec::new();

        for bin in 0..total_bins {
            first_segment.push(levels.len() as i32);
            let segments = self.bins.get(&bin).map(Vec::as_slice).unwrap_or_default();
            segment_count.push(segments.len() as i16);

            for segment in segments {
                first_point.push(dx.len() as i32);
                levels.push(segment.level as i16);
                point_counts.push(segment.points.len() as i16);
                for &(x, y) in &segment.points {
                    dx.push(x as i16);
                    dy.push(y as i16);
                }
            }
        }

        vec![
            (vars::BIN_SIZE_MINUTES, vec![self.bin_size_minutes].into()),
            (vars::LON_BINS, vec![self.lon_bins as i32].into()),
            (vars::LAT_BINS, vec![self.lat_bins as i32].into()),
            (vars::TOTAL_BINS, vec![total_bins as i32].into()),
            (vars::TOTAL_POINTS, vec![dx.len() as i32].into()),
            (vars::TOTAL_SEGMENTS, vec![levels.len() as i32].into()),
            (vars::FIRST_SEGMENT, first_segment.into()),
            (vars::SEGMENT_COUNT, segment_count.into()),
            (vars::FIRST_POINT, first_point.into()),
            (vars::SEGMENT_LEVEL, levels.into()),
            (vars::SEGMENT_POINTS, point_counts.into()),
            (vars::DX, dx.into()),
            (vars::DY, dy.into()),
        ]
    }

    pub fn to_memory(&self) -> MemoryArrays {
        self.arrays()
            .into_iter()
            .fold(MemoryArrays::new(), |arrays, (name, data)| arrays.with(name, data))
    }

    pub fn write_archive<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.arrays()
            .into_iter()
            .fold(ArchiveWriter::new(), |writer, (name, data)| writer.array(name, data))
            .save(path)
    }
}
