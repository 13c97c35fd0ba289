//! Conversion of planar polygons into imagery-service geometry.
//!
//! No validation of ring winding or self-intersection happens here. A
//! malformed polygon is sent as-is and any complaint comes back from the
//! service.

use crate::boundary::{BoundingBox, Region};
use crate::expr::{constant, invoke};
use geo::{LineString, MultiPolygon, Polygon};
use serde_json::Value;

/// Opaque geometry handle understood by the imagery service.
#[derive(Debug, Clone, PartialEq)]
pub struct EeGeometry(Value);

impl EeGeometry {
    /// Geometry of a whole region.
    pub fn from_region(region: &Region) -> Self {
        Self::from_multipolygon(region.geometry())
    }

    /// A single polygon becomes `Polygon`, anything else `MultiPolygon`.
    pub fn from_multipolygon(geometry: &MultiPolygon<f64>) -> Self {
        if geometry.0.len() == 1 {
            return Self::from_polygon(&geometry.0[0]);
        }

        let polygons: Vec<Vec<Vec<[f64; 2]>>> = geometry.0.iter().map(polygon_rings).collect();
        Self(invoke(
            "GeometryConstructors.MultiPolygon",
            vec![
                ("coordinates", constant(polygons)),
                ("geodesic", constant(false)),
                ("evenOdd", constant(true)),
            ],
        ))
    }

    pub fn from_polygon(polygon: &Polygon<f64>) -> Self {
        Self(invoke(
            "GeometryConstructors.Polygon",
            vec![
                ("coordinates", constant(polygon_rings(polygon))),
                ("geodesic", constant(false)),
                ("evenOdd", constant(true)),
            ],
        ))
    }

    /// Axis-aligned rectangle, used as the export region.
    pub fn rectangle(bbox: &BoundingBox) -> Self {
        Self(invoke(
            "GeometryConstructors.Rectangle",
            vec![
                ("coordinates", constant(bbox.to_array())),
                ("geodesic", constant(false)),
            ],
        ))
    }

    /// The underlying expression node.
    pub fn node(&self) -> &Value {
        &self.0
    }

    pub fn into_node(self) -> Value {
        self.0
    }
}

fn polygon_rings(polygon: &Polygon<f64>) -> Vec<Vec<[f64; 2]>> {
    std::iter::once(polygon.exterior())
        .chain(polygon.interiors())
        .map(ring_coords)
        .collect()
}

fn ring_coords(ring: &LineString<f64>) -> Vec<[f64; 2]> {
    ring.coords().map(|c| [c.x, c.y]).collect()
}
