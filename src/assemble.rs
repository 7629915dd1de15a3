//! Segment assembly: turns a bin's raw arrays into line features.

use crate::backend::BinData;
use crate::codec::{EarthLocation, decode};
use crate::error::DecodeError;
use crate::feature::LineFeature;
use crate::globals::Globals;

/// A bin of the grid, identified by index and located by its south-west corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bin {
    pub index: usize,
    pub corner: EarthLocation,
    /// Angular size in degrees
    pub size: f64,
}

impl Bin {
    pub fn new(globals: &Globals, index: usize) -> Self {
        Self {
            index,
            corner: globals.grid.corner_of(index),
            size: globals.bin_size(),
        }
    }

    pub fn center(&self) -> EarthLocation {
        let half = self.size / 2.0;
        self.corner.translate(half, half)
    }
}

/// Raw view of one segment inside a bin.
#[derive(Debug, Clone, Copy)]
pub struct Segment<'a> {
    pub level: u8,
    pub dx: &'a [u16],
    pub dy: &'a [u16],
}

impl Segment<'_> {
    /// Decodes the points, dropping each point identical to the one before it.
    pub fn decode(&self, corner: EarthLocation, multiplier: f64) -> Vec<EarthLocation> {
        let mut points: Vec<EarthLocation> = Vec::with_capacity(self.dx.len());
        for (&dx, &dy) in self.dx.iter().zip(self.dy) {
            let point = decode(corner, dx, dy, multiplier);
            if points.last().is_some_and(|last| last.same_bits(&point)) {
                continue;
            }
            points.push(point);
        }
        points
    }
}

/// Splits a bin's arrays into segments, checking them against the globals.
pub fn segments<'a>(
    bin: &Bin,
    data: &'a BinData,
    globals: &Globals,
) -> Result<Vec<Segment<'a>>, DecodeError> {
    let expected = globals.segment_count(bin.index);
    if data.levels.len() != expected {
        return Err(DecodeError::LevelCount {
            expected,
            found: data.levels.len(),
        });
    }
    if data.point_counts.len() != expected {
        return Err(DecodeError::PointCountLength {
            expected,
            found: data.point_counts.len(),
        });
    }
    if data.dx.len() != data.dy.len() {
        return Err(DecodeError::OffsetLength {
            dx: data.dx.len(),
            dy: data.dy.len(),
        });
    }

    let first_segment = globals.first_segment(bin.index);
    let base = globals.first_point(first_segment);
    let available = data.dx.len();

    (0..expected)
        .map(|i| {
            let segment = first_segment + i;
            let count = usize::from(data.point_counts[i]);
            let indexed = globals.point_range(segment, segment);
            if count != indexed.len() {
                return Err(DecodeError::PointCount {
                    segment,
                    count,
                    indexed: indexed.len(),
                });
            }

            let start = indexed.start.saturating_sub(base);
            let range = start..start + count;
            if range.end > available {
                return Err(DecodeError::SegmentRange {
                    segment,
                    start: range.start,
                    end: range.end,
                    available,
                });
            }

            Ok(Segment {
                level: (data.levels[i] & 0xff) as u8,
                dx: &data.dx[range.clone()],
                dy: &data.dy[range],
            })
        })
        .collect()
}

/// Builds one line feature per non-empty segment of a bin.
pub fn assemble(bin: &Bin, data: &BinData, globals: &Globals) -> Result<Vec<LineFeature>, DecodeError> {
    let features = segments(bin, data, globals)?
        .into_iter()
        .filter_map(|segment| {
            let points = segment.decode(bin.corner, globals.multiplier);
            (!points.is_empty()).then(|| LineFeature::new(points, segment.level))
        })
        .collect();
    Ok(features)
}
