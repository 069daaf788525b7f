//! Geographic features returned by the map-feature service.

use geo::{BoundingRect, Centroid, Contains, Coord, Point, Polygon, Rect};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Type of OSM object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OsmType {
    Node,
    Way,
    Relation,
}

impl std::fmt::Display for OsmType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OsmType::Node => write!(f, "node"),
            OsmType::Way => write!(f, "way"),
            OsmType::Relation => write!(f, "relation"),
        }
    }
}

/// Geographic point (lat/lon)
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

/// Axis-aligned bounding box in degrees, lon/lat order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    /// Bounding box of a polygon's exterior, `None` for degenerate input.
    pub fn from_polygon(polygon: &Polygon<f64>) -> Option<Self> {
        let rect = polygon.bounding_rect()?;
        Some(Self {
            min_lon: rect.min().x,
            min_lat: rect.min().y,
            max_lon: rect.max().x,
            max_lat: rect.max().y,
        })
    }

    /// Expand outward by `degrees` in all directions.
    pub fn expanded(&self, degrees: f64) -> Self {
        Self {
            min_lon: self.min_lon - degrees,
            min_lat: self.min_lat - degrees,
            max_lon: self.max_lon + degrees,
            max_lat: self.max_lat + degrees,
        }
    }

    /// The box as a rectangular polygon, for containment tests.
    pub fn to_polygon(&self) -> Polygon<f64> {
        Rect::new(
            Coord {
                x: self.min_lon,
                y: self.min_lat,
            },
            Coord {
                x: self.max_lon,
                y: self.max_lat,
            },
        )
        .to_polygon()
    }
}

/// Geometry of a returned feature: a single point or a closed area ring.
#[derive(Debug, Clone)]
pub enum FeatureGeometry {
    Point(Point<f64>),
    Area(Polygon<f64>),
}

/// A geographic feature with its descriptive tags.
#[derive(Debug, Clone)]
pub struct FeatureRecord {
    pub osm_type: OsmType,
    pub osm_id: i64,
    pub geometry: FeatureGeometry,
    pub tags: HashMap<String, String>,
}

impl FeatureRecord {
    /// Tag value lookup; absent tags read as empty string.
    pub fn tag(&self, key: &str) -> &str {
        self.tags.get(key).map(String::as_str).unwrap_or("")
    }

    pub fn is_point(&self) -> bool {
        matches!(self.geometry, FeatureGeometry::Point(_))
    }

    /// Representative coordinates: the point itself, or the area centroid.
    pub fn anchor(&self) -> Option<GeoPoint> {
        match &self.geometry {
            FeatureGeometry::Point(p) => Some(GeoPoint {
                lat: p.y(),
                lon: p.x(),
            }),
            FeatureGeometry::Area(poly) => poly.centroid().map(|p| GeoPoint {
                lat: p.y(),
                lon: p.x(),
            }),
        }
    }

    /// Whether the feature's geometry lies within `polygon`.
    pub fn within(&self, polygon: &Polygon<f64>) -> bool {
        match &self.geometry {
            FeatureGeometry::Point(p) => polygon.contains(p),
            FeatureGeometry::Area(area) => polygon.contains(area),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, Point};

    fn unit_square() -> Polygon<f64> {
        polygon![
            (x: 0.0, y: 0.0),
            (x: 1.0, y: 0.0),
            (x: 1.0, y: 1.0),
            (x: 0.0, y: 1.0),
        ]
    }

    #[test]
    fn test_bbox_expansion() {
        let bbox = BoundingBox::from_polygon(&unit_square()).unwrap();
        let expanded = bbox.expanded(0.5);
        assert_eq!(expanded.min_lon, -0.5);
        assert_eq!(expanded.max_lat, 1.5);
    }

    #[test]
    fn test_point_anchor_and_containment() {
        let feature = FeatureRecord {
            osm_type: OsmType::Node,
            osm_id: 1,
            geometry: FeatureGeometry::Point(Point::new(0.5, 0.5)),
            tags: HashMap::new(),
        };
        let anchor = feature.anchor().unwrap();
        assert_eq!(anchor.lon, 0.5);
        assert!(feature.within(&unit_square()));
    }

    #[test]
    fn test_area_anchor_is_centroid() {
        let feature = FeatureRecord {
            osm_type: OsmType::Way,
            osm_id: 2,
            geometry: FeatureGeometry::Area(unit_square()),
            tags: HashMap::new(),
        };
        let anchor = feature.anchor().unwrap();
        assert!((anchor.lat - 0.5).abs() < 1e-9);
        assert!((anchor.lon - 0.5).abs() < 1e-9);
    }
}
