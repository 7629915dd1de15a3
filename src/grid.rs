//! Bin grid indexing.
//!
//! Bins are numbered row-major from the north-west corner of the earth,
//! west to east and then north to south. Longitudes are measured east from
//! the prime meridian over `[0, 360)`.

use crate::area::EarthArea;
use crate::codec::EarthLocation;
use std::collections::BTreeSet;

/// Geometry of a database's bin grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinGrid {
    /// Angular size of one bin in degrees
    pub bin_size: f64,
    pub lon_bins: usize,
    pub lat_bins: usize,
}

impl BinGrid {
    pub fn new(bin_size: f64, lon_bins: usize, lat_bins: usize) -> Self {
        Self {
            bin_size,
            lon_bins,
            lat_bins,
        }
    }

    /// Number of bins described by the grid dimensions.
    pub fn grid_bins(&self) -> usize {
        self.lon_bins * self.lat_bins
    }

    /// Index of the bin containing a location.
    ///
    /// A location on a bin boundary belongs to the bin south (and east) of
    /// the boundary, except at the south pole which belongs to the last row.
    pub fn bin_index_of(&self, lat: f64, lon: f64) -> usize {
        let last_row = self.lat_bins.saturating_sub(1) as f64;
        let lat_bin = ((90.0 - lat) / self.bin_size).floor().clamp(0.0, last_row) as usize;

        let lon = if lon < 0.0 { lon + 360.0 } else { lon };
        let lon_bin = ((lon / self.bin_size).floor().max(0.0) as usize) % self.lon_bins.max(1);

        lat_bin * self.lon_bins + lon_bin
    }

    pub fn bin_index_of_location(&self, loc: EarthLocation) -> usize {
        self.bin_index_of(loc.lat, loc.lon)
    }

    /// South-west corner of a bin.
    pub fn corner_of(&self, bin: usize) -> EarthLocation {
        let lat_bin = bin / self.lon_bins;
        let lon_bin = bin % self.lon_bins;
        EarthLocation::new(
            90.0 - (lat_bin + 1) as f64 * self.bin_size,
            lon_bin as f64 * self.bin_size,
        )
    }

    /// Center of a bin; always maps back to the same bin.
    pub fn center_of(&self, bin: usize) -> EarthLocation {
        let half = self.bin_size / 2.0;
        self.corner_of(bin).translate(half, half)
    }

    /// Bins touched by the center of each square of `area`, ascending and
    /// without duplicates.
    pub fn candidate_bins(&self, area: &EarthArea) -> Vec<usize> {
        area.centers()
            .map(|center| self.bin_index_of_location(center))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}
