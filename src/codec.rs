//! Scaled offset coordinate codec.
//!
//! Points in a binned database are stored as unsigned 16-bit offsets from
//! the south-west corner of their bin. One offset unit is `bin_size / 65535`
//! degrees, so the full `u16` range spans exactly one bin.

use serde::{Deserialize, Serialize};

/// Largest raw offset; the scale divisor for a bin.
pub const OFFSET_SCALE: f64 = 65535.0;

/// A geographic location in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EarthLocation {
    pub lat: f64,
    pub lon: f64,
}

impl EarthLocation {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Returns a copy moved by the given number of degrees.
    pub fn translate(&self, dlat: f64, dlon: f64) -> Self {
        Self::new(self.lat + dlat, self.lon + dlon)
    }

    /// Bit-for-bit equality of both coordinates.
    pub fn same_bits(&self, other: &Self) -> bool {
        self.lat.to_bits() == other.lat.to_bits() && self.lon.to_bits() == other.lon.to_bits()
    }
}

impl From<EarthLocation> for geo::Coord<f64> {
    fn from(loc: EarthLocation) -> Self {
        geo::Coord {
            x: loc.lon,
            y: loc.lat,
        }
    }
}

impl From<EarthLocation> for geo::Point<f64> {
    fn from(loc: EarthLocation) -> Self {
        geo::Point::new(loc.lon, loc.lat)
    }
}

/// Offset multiplier for a bin size in degrees.
pub fn multiplier_for(bin_size: f64) -> f64 {
    bin_size / OFFSET_SCALE
}

/// Reinterprets a stored signed 16-bit value as the unsigned offset it encodes.
#[inline]
pub fn mask_offset(raw: i16) -> u16 {
    raw as u16
}

/// Decodes an offset pair relative to `corner` into an absolute location.
#[inline]
pub fn decode(corner: EarthLocation, dx: u16, dy: u16, multiplier: f64) -> EarthLocation {
    EarthLocation {
        lat: corner.lat + f64::from(dy) * multiplier,
        lon: corner.lon + f64::from(dx) * multiplier,
    }
}
