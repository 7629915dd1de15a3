//! Reader for binned GSHHS coastline, border and river databases.
//!
//! A binned database divides the earth into a grid of square bins and stores
//! each bin's line segments as 16-bit offsets from the bin's south-west
//! corner. A [`Reader`] loads the segments of every bin touched by an
//! [`EarthArea`] from a local file or a remote data server and yields them as
//! [`LineFeature`]s filtered by hierarchical level.
//!
//! ```rust
//! use gshhs_binned::prelude::*;
//! use gshhs_binned::source::LayoutBuilder;
//!
//! let arrays = LayoutBuilder::new(60, 360, 180)
//!     .segment(16075, 1, &[(0, 0), (65535, 65535)])
//!     .to_memory();
//! let mut reader = ReaderBuilder::new()
//!     .server("http://server.com/data")
//!     .open_remote(arrays, "binned_border_l.hdf")?;
//!
//! let area = EarthArea::from_rect(&Rect::new(
//!     geo::coord! { x: -125.0, y: 45.0 },
//!     geo::coord! { x: -124.0, y: 46.0 },
//! ));
//! reader.select(&area)?;
//! assert_eq!(reader.iter().count(), 1);
//! # Ok::<(), gshhs_binned::GshhsError>(())
//! ```

pub mod area;
pub mod assemble;
pub mod backend;
pub mod builder;
pub mod codec;
pub mod config;
pub mod database;
pub mod error;
pub mod feature;
pub mod globals;
pub mod grid;
pub mod reader;
pub mod registry;
pub mod source;

pub use area::EarthArea;
pub use assemble::{Bin, Segment, assemble};
pub use backend::{Backend, BinData, LocalBackend, RemoteBackend};
pub use builder::ReaderBuilder;
pub use codec::{EarthLocation, decode};
pub use config::{Config, CorruptBinPolicy};
pub use database::{DatabaseType, Resolution, database_name};
pub use error::{DecodeError, GshhsError, QueryError, Result};
pub use feature::LineFeature;
pub use globals::Globals;
pub use grid::BinGrid;
pub use reader::{Diagnostic, Reader, ReaderState};
pub use registry::{ReaderRegistry, SharedReader};

pub use geo::{LineString, Rect};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {

    pub use crate::{GshhsError, Reader, ReaderBuilder, Result};

    pub use crate::{EarthArea, EarthLocation, LineFeature};

    pub use crate::{Config, CorruptBinPolicy, DatabaseType, Resolution, database_name};

    pub use crate::ReaderRegistry;

    pub use geo::{LineString, Rect};
}
