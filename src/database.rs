//! Database naming by content type and resolution.

use serde::{Deserialize, Serialize};
use std::fmt;

/// What a binned database contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatabaseType {
    Coast,
    Border,
    River,
}

impl DatabaseType {
    fn tag(self) -> &'static str {
        match self {
            DatabaseType::Coast => "GSHHS",
            DatabaseType::Border => "border",
            DatabaseType::River => "river",
        }
    }
}

/// Decimation level of a database, from full detail down to crude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    /// No decimation
    Full,
    /// 0.2 km decimation
    High,
    /// 1 km decimation
    Intermediate,
    /// 5 km decimation
    Low,
    /// 25 km decimation
    Crude,
}

impl Resolution {
    pub const ALL: [Resolution; 5] = [
        Resolution::Full,
        Resolution::High,
        Resolution::Intermediate,
        Resolution::Low,
        Resolution::Crude,
    ];

    /// Picks the coarsest database that is still finer than a rendered pixel.
    ///
    /// ```
    /// use gshhs_binned::Resolution;
    ///
    /// assert_eq!(Resolution::for_pixel_km(0.1), Resolution::Full);
    /// assert_eq!(Resolution::for_pixel_km(1.0), Resolution::Intermediate);
    /// assert_eq!(Resolution::for_pixel_km(30.0), Resolution::Crude);
    /// ```
    pub fn for_pixel_km(km: f64) -> Self {
        if km < 0.2 {
            Resolution::Full
        } else if km < 1.0 {
            Resolution::High
        } else if km < 5.0 {
            Resolution::Intermediate
        } else if km < 25.0 {
            Resolution::Low
        } else {
            Resolution::Crude
        }
    }

    fn tag(self) -> &'static str {
        match self {
            Resolution::Full => "f",
            Resolution::High => "h",
            Resolution::Intermediate => "i",
            Resolution::Low => "l",
            Resolution::Crude => "c",
        }
    }
}

/// File name of a database, e.g. `binned_GSHHS_i.hdf`.
pub fn database_name(kind: DatabaseType, resolution: Resolution) -> String {
    format!("binned_{}_{}.hdf", kind.tag(), resolution.tag())
}

impl fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DatabaseType::Coast => "coast",
            DatabaseType::Border => "border",
            DatabaseType::River => "river",
        };
        f.write_str(name)
    }
}
