//! Query regions made of 1x1 degree grid squares.
//!
//! A square is referenced by its integer south-west corner, so square
//! `(10, 20)` covers 10N..11N and 20E..21E. Latitudes run over `[-90, 89]`
//! and longitudes over `[-180, 179]`.

use crate::codec::EarthLocation;
use std::collections::BTreeSet;

const LAT_SQUARES: i32 = 180;
const LON_SQUARES: i32 = 360;

/// Set of unit grid squares covering an area of interest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EarthArea {
    cells: BTreeSet<u32>,
}

impl EarthArea {
    /// Creates an empty area.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an area covering every square on the globe.
    pub fn whole_earth() -> Self {
        Self {
            cells: (0..(LAT_SQUARES * LON_SQUARES) as u32).collect(),
        }
    }

    /// Cell index of a square, or `None` when the corner is off the grid.
    fn square_index(lat: i32, lon: i32) -> Option<u32> {
        if !(-90..=89).contains(&lat) || !(-180..=179).contains(&lon) {
            return None;
        }
        Some(((lat + 90) * LON_SQUARES + (lon + 180)) as u32)
    }

    fn location_index(loc: &EarthLocation) -> Option<u32> {
        if !loc.lat.is_finite() || !loc.lon.is_finite() {
            return None;
        }
        let mut lat = loc.lat.floor() as i32;
        if lat == 90 {
            lat = 89;
        }
        Self::square_index(lat, loc.lon.floor() as i32)
    }

    fn index_square(index: u32) -> (i32, i32) {
        let index = index as i32;
        (index / LON_SQUARES - 90, index % LON_SQUARES - 180)
    }

    /// Adds the square containing `loc`. Locations off the grid are ignored.
    pub fn add(&mut self, loc: EarthLocation) {
        if let Some(index) = Self::location_index(&loc) {
            self.cells.insert(index);
        }
    }

    /// Adds a square by its south-west corner. Returns false if the corner is off the grid.
    pub fn add_square(&mut self, lat: i32, lon: i32) -> bool {
        match Self::square_index(lat, lon) {
            Some(index) => {
                self.cells.insert(index);
                true
            }
            None => false,
        }
    }

    /// Adds every square overlapped by a rectangle (x = longitude, y = latitude).
    pub fn add_rect(&mut self, rect: &geo::Rect<f64>) {
        let (min, max) = (rect.min(), rect.max());
        let lat_start = (min.y.floor() as i32).max(-90);
        let lat_end = (max.y.ceil() as i32 - 1).clamp(-90, 89).max(lat_start);
        let lon_start = (min.x.floor() as i32).max(-180);
        let lon_end = (max.x.ceil() as i32 - 1).clamp(-180, 179).max(lon_start);

        for lat in lat_start..=lat_end {
            for lon in lon_start..=lon_end {
                self.add_square(lat, lon);
            }
        }
    }

    /// Builds an area from a rectangle (x = longitude, y = latitude).
    pub fn from_rect(rect: &geo::Rect<f64>) -> Self {
        let mut area = Self::new();
        area.add_rect(rect);
        area
    }

    /// Removes the square containing `loc`.
    pub fn remove(&mut self, loc: EarthLocation) {
        if let Some(index) = Self::location_index(&loc) {
            self.cells.remove(&index);
        }
    }

    pub fn contains(&self, loc: EarthLocation) -> bool {
        Self::location_index(&loc).is_some_and(|index| self.cells.contains(&index))
    }

    pub fn contains_square(&self, lat: i32, lon: i32) -> bool {
        Self::square_index(lat, lon).is_some_and(|index| self.cells.contains(&index))
    }

    /// Grows the area by one square in all eight directions.
    pub fn expand(&mut self) {
        let base: Vec<u32> = self.cells.iter().copied().collect();
        for index in base {
            let (lat, lon) = Self::index_square(index);
            let center = EarthLocation::new(f64::from(lat) + 0.5, f64::from(lon) + 0.5);
            for dlat in [-1.0, 0.0, 1.0] {
                for dlon in [-1.0, 0.0, 1.0] {
                    self.add(center.translate(dlat, dlon));
                }
            }
        }
    }

    /// Squares present in both areas.
    pub fn intersection(&self, other: &EarthArea) -> EarthArea {
        EarthArea {
            cells: self.cells.intersection(&other.cells).copied().collect(),
        }
    }

    /// Squares present in either area.
    pub fn union(&self, other: &EarthArea) -> EarthArea {
        EarthArea {
            cells: self.cells.union(&other.cells).copied().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Iterates the south-west corners `(lat, lon)` of all squares,
    /// south to north and west to east.
    pub fn squares(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.cells.iter().map(|&index| Self::index_square(index))
    }

    /// Iterates the center location of each square.
    pub fn centers(&self) -> impl Iterator<Item = EarthLocation> + '_ {
        self.squares()
            .map(|(lat, lon)| EarthLocation::new(f64::from(lat) + 0.5, f64::from(lon) + 0.5))
    }
}
