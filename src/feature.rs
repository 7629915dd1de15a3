//! Line features produced by a query.

use crate::codec::EarthLocation;
use geo::{BoundingRect, LineString, Rect};
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};

/// A decoded polyline with its hierarchical level.
///
/// Longitudes are measured east from the prime meridian, in `[0, 360]`.
#[derive(Debug, Clone, PartialEq)]
pub struct LineFeature {
    pub points: Vec<EarthLocation>,
    pub level: u8,
}

impl LineFeature {
    pub fn new(points: Vec<EarthLocation>, level: u8) -> Self {
        Self { points, level }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Converts to a `geo` line string with `x = lon`, `y = lat`.
    ///
    /// # Examples
    ///
    /// ```
    /// use gshhs_binned::{EarthLocation, LineFeature};
    ///
    /// let feature = LineFeature::new(
    ///     vec![EarthLocation::new(45.0, 235.0), EarthLocation::new(45.5, 235.25)],
    ///     1,
    /// );
    /// let line = feature.to_line_string();
    /// assert_eq!(line.0[1].x, 235.25);
    /// assert_eq!(line.0[1].y, 45.5);
    /// ```
    pub fn to_line_string(&self) -> LineString<f64> {
        self.points.iter().map(|&p| geo::Coord::from(p)).collect()
    }

    pub fn bounding_rect(&self) -> Option<Rect<f64>> {
        self.to_line_string().bounding_rect()
    }

    /// GeoJSON feature with a `level` property.
    pub fn to_geojson(&self) -> Feature {
        let coordinates = self.points.iter().map(|p| vec![p.lon, p.lat]).collect();

        let mut properties = JsonObject::new();
        properties.insert("level".to_string(), self.level.into());

        Feature {
            bbox: None,
            geometry: Some(Geometry::new(Value::LineString(coordinates))),
            id: None,
            properties: Some(properties),
            foreign_members: None,
        }
    }
}

/// Collects features into a GeoJSON feature collection.
pub fn feature_collection<'a>(features: impl IntoIterator<Item = &'a LineFeature>) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features: features.into_iter().map(LineFeature::to_geojson).collect(),
        foreign_members: None,
    }
}
