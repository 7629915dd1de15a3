//! Database-wide scalars and index arrays.

use crate::codec::multiplier_for;
use crate::error::{GshhsError, Result};
use crate::grid::BinGrid;
use std::ops::Range;

/// Read once when a database is opened; immutable afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Globals {
    pub grid: BinGrid,
    /// Degrees per raw offset unit
    pub multiplier: f64,
    pub total_bins: usize,
    pub total_segments: usize,
    pub total_points: usize,
    first_segment: Vec<usize>,
    segment_count: Vec<usize>,
    first_point: Vec<usize>,
}

/// Raw values used to build [`Globals`].
#[derive(Debug, Clone, Default)]
pub struct GlobalsParts {
    pub bin_size_minutes: usize,
    pub lon_bins: usize,
    pub lat_bins: usize,
    pub total_bins: usize,
    pub total_segments: usize,
    pub total_points: usize,
    pub first_segment: Vec<usize>,
    pub segment_count: Vec<usize>,
    pub first_point: Vec<usize>,
}

impl Globals {
    /// Checks the parts are usable for decoding and derives the bin geometry.
    pub fn from_parts(parts: GlobalsParts) -> Result<Self> {
        if parts.bin_size_minutes == 0 {
            return Err(GshhsError::InvalidFormat("bin size is zero".into()));
        }
        if parts.lon_bins == 0 || parts.lat_bins == 0 {
            return Err(GshhsError::InvalidFormat(format!(
                "empty bin grid {}x{}",
                parts.lon_bins, parts.lat_bins
            )));
        }
        if parts.first_segment.len() != parts.total_bins
            || parts.segment_count.len() != parts.total_bins
        {
            return Err(GshhsError::InvalidFormat(format!(
                "bin index arrays have {} and {} entries for {} bins",
                parts.first_segment.len(),
                parts.segment_count.len(),
                parts.total_bins
            )));
        }
        if parts.first_point.len() != parts.total_segments {
            return Err(GshhsError::InvalidFormat(format!(
                "segment index array has {} entries for {} segments",
                parts.first_point.len(),
                parts.total_segments
            )));
        }

        for (bin, (&first, &count)) in parts
            .first_segment
            .iter()
            .zip(&parts.segment_count)
            .enumerate()
        {
            if count > 0 && first.saturating_add(count) > parts.total_segments {
                return Err(GshhsError::InvalidFormat(format!(
                    "bin {} references segments {}..{} of {}",
                    bin,
                    first,
                    first + count,
                    parts.total_segments
                )));
            }
        }
        let mut next_free = 0;
        for (bin, (&first, &count)) in parts
            .first_segment
            .iter()
            .zip(&parts.segment_count)
            .enumerate()
            .filter(|(_, (_, count))| **count > 0)
        {
            if first < next_free {
                return Err(GshhsError::InvalidFormat(format!(
                    "bin {} starts at segment {}, inside the previous bin",
                    bin, first
                )));
            }
            next_free = first + count;
        }
        // Zero-point segments repeat their successor's start.
        if let Some(s) = parts.first_point.windows(2).position(|w| w[1] < w[0]) {
            return Err(GshhsError::InvalidFormat(format!(
                "segment {} starts at point {}, before segment {} at {}",
                s + 1,
                parts.first_point[s + 1],
                s,
                parts.first_point[s]
            )));
        }
        if let Some(&last) = parts.first_point.last()
            && last > parts.total_points
        {
            return Err(GshhsError::InvalidFormat(format!(
                "last segment starts at point {} of {}",
                last, parts.total_points
            )));
        }

        let bin_size = parts.bin_size_minutes as f64 / 60.0;
        Ok(Self {
            grid: BinGrid::new(bin_size, parts.lon_bins, parts.lat_bins),
            multiplier: multiplier_for(bin_size),
            total_bins: parts.total_bins,
            total_segments: parts.total_segments,
            total_points: parts.total_points,
            first_segment: parts.first_segment,
            segment_count: parts.segment_count,
            first_point: parts.first_point,
        })
    }

    pub fn bin_size(&self) -> f64 {
        self.grid.bin_size
    }

    /// Number of segments in a bin; zero for bins outside the database.
    pub fn segment_count(&self, bin: usize) -> usize {
        self.segment_count.get(bin).copied().unwrap_or(0)
    }

    pub fn first_segment(&self, bin: usize) -> usize {
        self.first_segment.get(bin).copied().unwrap_or(0)
    }

    /// Global index of the first point of a segment.
    pub fn first_point(&self, segment: usize) -> usize {
        self.first_point
            .get(segment)
            .copied()
            .unwrap_or(self.total_points)
    }

    /// Global segment indices of a bin.
    pub fn segment_range(&self, bin: usize) -> Range<usize> {
        let first = self.first_segment(bin);
        first..first + self.segment_count(bin)
    }

    /// Global point indices covered by a run of segments `first..=last`.
    pub fn point_range(&self, first: usize, last: usize) -> Range<usize> {
        let start = self.first_point(first);
        let end = if last + 1 >= self.total_segments {
            self.total_points
        } else {
            self.first_point(last + 1)
        };
        start..end.max(start)
    }

    /// Global point indices of a bin; empty for empty bins.
    pub fn bin_point_range(&self, bin: usize) -> Range<usize> {
        let segments = self.segment_range(bin);
        if segments.is_empty() {
            return 0..0;
        }
        self.point_range(segments.start, segments.end - 1)
    }
}
