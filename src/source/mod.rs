//! Data collaborators behind the backends.
//!
//! A binned database is a set of named one-dimensional numeric arrays. Local
//! access goes through [`ArraySource`], which reads contiguous slices by
//! offset; remote access goes through [`DapTransport`], which answers one
//! constrained request for several array slices at once.

use crate::codec::mask_offset;
use crate::error::{GshhsError, Result};
use rustc_hash::FxHashMap;

mod archive;
mod constraint;
mod layout;
mod memory;

pub use archive::{ArchiveFile, ArchiveVariable, ArchiveWriter};
pub use constraint::{Constraint, SliceSpec};
pub use layout::LayoutBuilder;
pub use memory::{MemoryArrays, MemoryError, SourceStats};

/// Array names of the binned database layout.
pub mod vars {
    pub const BIN_SIZE_MINUTES: &str = "Bin_size_in_minutes";
    pub const LON_BINS: &str = "N_bins_in_360_longitude_range";
    pub const LAT_BINS: &str = "N_bins_in_180_degree_latitude_range";
    pub const TOTAL_BINS: &str = "N_bins_in_file";
    pub const TOTAL_POINTS: &str = "N_points_in_file";
    pub const TOTAL_SEGMENTS: &str = "N_segments_in_file";
    pub const FIRST_SEGMENT: &str = "Id_of_first_segment_in_a_bin";
    pub const SEGMENT_COUNT: &str = "N_segments_in_a_bin";
    pub const FIRST_POINT: &str = "Id_of_first_point_in_a_segment";
    // Spelling matches the files as distributed.
    pub const SEGMENT_LEVEL: &str = "Hierarchial_level_of_a_segment";
    pub const SEGMENT_POINTS: &str = "N_points_for_a_segment";
    pub const DX: &str = "Relative_longitude_from_SW_corner_of_bin";
    pub const DY: &str = "Relative_latitude_from_SW_corner_of_bin";
}

/// Element type of a stored array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayKind {
    Short,
    Int,
}

impl ArrayKind {
    pub(crate) fn tag(self) -> u8 {
        match self {
            ArrayKind::Short => 1,
            ArrayKind::Int => 2,
        }
    }

    pub(crate) fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(ArrayKind::Short),
            2 => Some(ArrayKind::Int),
            _ => None,
        }
    }

    /// Bytes per element.
    pub fn width(self) -> usize {
        match self {
            ArrayKind::Short => 2,
            ArrayKind::Int => 4,
        }
    }
}

/// A slice of numeric array data as returned by a collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArrayData {
    Short(Vec<i16>),
    Int(Vec<i32>),
}

impl ArrayData {
    pub fn kind(&self) -> ArrayKind {
        match self {
            ArrayData::Short(_) => ArrayKind::Short,
            ArrayData::Int(_) => ArrayKind::Int,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ArrayData::Short(v) => v.len(),
            ArrayData::Int(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get(&self, index: usize) -> Option<i64> {
        match self {
            ArrayData::Short(v) => v.get(index).map(|&x| i64::from(x)),
            ArrayData::Int(v) => v.get(index).map(|&x| i64::from(x)),
        }
    }

    /// Copies `count` elements starting at `start`.
    pub fn slice(&self, start: usize, count: usize) -> Result<ArrayData> {
        let end = start
            .checked_add(count)
            .filter(|&end| end <= self.len())
            .ok_or_else(|| {
                GshhsError::InvalidInput(format!(
                    "slice {}..{} out of bounds for array of {}",
                    start,
                    start.saturating_add(count),
                    self.len()
                ))
            })?;
        Ok(match self {
            ArrayData::Short(v) => ArrayData::Short(v[start..end].to_vec()),
            ArrayData::Int(v) => ArrayData::Int(v[start..end].to_vec()),
        })
    }

    /// Reinterprets each element as an unsigned 16-bit value.
    pub fn to_u16(&self) -> Vec<u16> {
        match self {
            ArrayData::Short(v) => v.iter().map(|&x| mask_offset(x)).collect(),
            ArrayData::Int(v) => v.iter().map(|&x| x as u16).collect(),
        }
    }

    /// Converts to indices, rejecting negative values.
    pub fn to_indices(&self, var: &str) -> Result<Vec<usize>> {
        (0..self.len())
            .map(|i| {
                let value = self.get(i).unwrap_or_default();
                usize::try_from(value).map_err(|_| {
                    GshhsError::InvalidFormat(format!("{}[{}] is negative: {}", var, i, value))
                })
            })
            .collect()
    }

    /// First element as a non-negative scalar.
    pub fn scalar(&self, var: &str) -> Result<usize> {
        let value = self
            .get(0)
            .ok_or_else(|| GshhsError::InvalidFormat(format!("{} is empty", var)))?;
        usize::try_from(value)
            .map_err(|_| GshhsError::InvalidFormat(format!("{} is negative: {}", var, value)))
    }
}

impl From<Vec<i16>> for ArrayData {
    fn from(v: Vec<i16>) -> Self {
        ArrayData::Short(v)
    }
}

impl From<Vec<i32>> for ArrayData {
    fn from(v: Vec<i32>) -> Self {
        ArrayData::Int(v)
    }
}

/// Random-access reader of named arrays, such as a scientific data file.
pub trait ArraySource: Send + Sync {
    /// Resolved handle to one array.
    type Variable: Send + Sync;

    /// Resolve an array by name.
    fn select(&self, name: &str) -> Result<Self::Variable>;

    /// Number of elements in an array.
    fn extent(&self, var: &Self::Variable) -> usize;

    /// Read `count` contiguous elements starting at `start`.
    fn read_slice(&self, var: &Self::Variable, start: usize, count: usize) -> Result<ArrayData>;
}

/// Arrays returned by one constrained request, keyed by array name.
pub type DapResponse = FxHashMap<String, ArrayData>;

/// Network reader that answers constrained multi-array requests.
///
/// `url` identifies the database on the server, e.g. `http://server/data/binned_border_l.hdf`.
pub trait DapTransport: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Length of the named array.
    fn dimension(&self, url: &str, var: &str) -> std::result::Result<usize, Self::Error>;

    /// Fetch every slice named by the constraint in a single round trip.
    fn fetch(
        &self,
        url: &str,
        constraint: &Constraint,
    ) -> std::result::Result<DapResponse, Self::Error>;
}
