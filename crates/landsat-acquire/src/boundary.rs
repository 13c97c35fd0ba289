//! Administrative boundary loading.
//!
//! Boundaries come as a GeoJSON `FeatureCollection` with one polygon (or
//! multipolygon) feature per administrative unit, in the layout published by
//! geoBoundaries: the unit identifier lives in a property (`shapeID` by
//! default) and coordinates are (longitude, latitude).
//!
//! When the same identifier appears on more than one feature, every one of
//! those features becomes its own [`Region`] with a 1-based box sequence
//! number, and output names get a `_box<seq>` suffix.

use crate::{AcquireError, Result};
use geo::{BoundingRect, MultiPolygon, Polygon};
use geojson::{Feature, GeoJson};
use landsat_common::is_plain_component;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Identifier property used by geoBoundaries.
pub const DEFAULT_ID_FIELD: &str = "shapeID";

/// Geographic bounding box in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// West edge.
    pub min_lon: f64,
    /// South edge.
    pub min_lat: f64,
    /// East edge.
    pub max_lon: f64,
    /// North edge.
    pub max_lat: f64,
}

impl BoundingBox {
    /// `[min_lon, min_lat, max_lon, max_lat]`.
    pub fn to_array(&self) -> [f64; 4] {
        [self.min_lon, self.min_lat, self.max_lon, self.max_lat]
    }

    pub fn width_deg(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    pub fn height_deg(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    pub fn center_lat(&self) -> f64 {
        (self.min_lat + self.max_lat) / 2.0
    }
}

/// One administrative unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    id: String,
    geometry: MultiPolygon<f64>,
    bbox: BoundingBox,
    box_seq: Option<u32>,
}

impl Region {
    /// Build a region from its identifier and geometry.
    ///
    /// Fails if the identifier cannot name a directory or the geometry has
    /// no coordinates.
    pub fn new(id: impl Into<String>, geometry: MultiPolygon<f64>) -> Result<Self> {
        let id = id.into();
        if !is_plain_component(&id) {
            return Err(AcquireError::InvalidBoundary(format!(
                "region identifier {:?} is not a plain directory name",
                id
            )));
        }
        let rect = geometry.bounding_rect().ok_or_else(|| {
            AcquireError::InvalidBoundary(format!("region {} has an empty geometry", id))
        })?;

        let bbox = BoundingBox {
            min_lon: rect.min().x,
            min_lat: rect.min().y,
            max_lon: rect.max().x,
            max_lat: rect.max().y,
        };

        Ok(Self {
            id,
            geometry,
            bbox,
            box_seq: None,
        })
    }

    /// Same region tagged with a box sequence number.
    pub fn with_box_seq(mut self, seq: u32) -> Self {
        self.box_seq = Some(seq);
        self
    }

    /// Region identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Polygons making up the region.
    pub fn geometry(&self) -> &MultiPolygon<f64> {
        &self.geometry
    }

    pub fn bbox(&self) -> BoundingBox {
        self.bbox
    }

    /// Box sequence number, set only when the identifier is shared.
    pub fn box_seq(&self) -> Option<u32> {
        self.box_seq
    }

    /// Name fragment used for archives: `<id>_<year>_<month>[_box<seq>]`.
    pub fn archive_name(&self, year: i32, month: u32) -> String {
        match self.box_seq {
            Some(seq) => format!("{}_{}_{}_box{}", self.id, year, month, seq),
            None => format!("{}_{}_{}", self.id, year, month),
        }
    }

    /// Archive name when a single pre-selected image is requested.
    pub fn image_name(&self) -> String {
        match self.box_seq {
            Some(seq) => format!("{}_box{}", self.id, seq),
            None => self.id.clone(),
        }
    }
}

/// Reads regions out of a boundary dataset.
#[derive(Debug, Clone)]
pub struct BoundaryLoader {
    id_field: String,
    filter: Option<String>,
}

impl Default for BoundaryLoader {
    fn default() -> Self {
        Self::new(DEFAULT_ID_FIELD)
    }
}

impl BoundaryLoader {
    /// Loader reading identifiers from `id_field`.
    pub fn new(id_field: impl Into<String>) -> Self {
        Self {
            id_field: id_field.into(),
            filter: None,
        }
    }

    /// Keep only features whose identifier equals `id`.
    pub fn with_filter(mut self, id: impl Into<String>) -> Self {
        self.filter = Some(id.into());
        self
    }

    pub fn id_field(&self) -> &str {
        &self.id_field
    }

    /// Load regions from a GeoJSON file.
    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<Vec<Region>> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let regions = self.parse_str(&text)?;
        info!(
            "Loaded {} regions from {}",
            regions.len(),
            path.display()
        );
        Ok(regions)
    }

    /// Load regions from GeoJSON text.
    pub fn parse_str(&self, text: &str) -> Result<Vec<Region>> {
        let geojson: GeoJson = text.parse()?;
        let features = match geojson {
            GeoJson::FeatureCollection(collection) => collection.features,
            GeoJson::Feature(feature) => vec![feature],
            GeoJson::Geometry(_) => {
                return Err(AcquireError::InvalidBoundary(
                    "expected a Feature or FeatureCollection, found a bare Geometry".to_string(),
                ))
            }
        };

        let mut regions = Vec::with_capacity(features.len());
        for (index, feature) in features.into_iter().enumerate() {
            let id = self.identifier(&feature, index)?;
            if let Some(filter) = &self.filter {
                if &id != filter {
                    continue;
                }
            }
            regions.push(Region::new(id.clone(), feature_polygons(&id, feature)?)?);
        }

        number_boxes(&mut regions);
        debug!("Parsed {} regions", regions.len());
        Ok(regions)
    }

    fn identifier(&self, feature: &Feature, index: usize) -> Result<String> {
        let missing = || AcquireError::MissingIdentifier {
            index,
            field: self.id_field.clone(),
        };

        match feature.property(&self.id_field) {
            Some(JsonValue::String(s)) if !s.is_empty() => Ok(s.clone()),
            Some(JsonValue::Number(n)) => Ok(n.to_string()),
            _ => Err(missing()),
        }
    }
}

/// Extract polygon geometry from a feature.
fn feature_polygons(id: &str, feature: Feature) -> Result<MultiPolygon<f64>> {
    let geometry = feature.geometry.ok_or_else(|| AcquireError::UnsupportedGeometry {
        id: id.to_string(),
        kind: "null".to_string(),
    })?;

    match geometry.value {
        value @ geojson::Value::Polygon(_) => {
            let polygon = Polygon::<f64>::try_from(value)?;
            Ok(MultiPolygon::new(vec![polygon]))
        }
        value @ geojson::Value::MultiPolygon(_) => Ok(MultiPolygon::<f64>::try_from(value)?),
        other => Err(AcquireError::UnsupportedGeometry {
            id: id.to_string(),
            kind: geometry_kind(&other).to_string(),
        }),
    }
}

fn geometry_kind(value: &geojson::Value) -> &'static str {
    match value {
        geojson::Value::Point(_) => "Point",
        geojson::Value::MultiPoint(_) => "MultiPoint",
        geojson::Value::LineString(_) => "LineString",
        geojson::Value::MultiLineString(_) => "MultiLineString",
        geojson::Value::Polygon(_) => "Polygon",
        geojson::Value::MultiPolygon(_) => "MultiPolygon",
        geojson::Value::GeometryCollection(_) => "GeometryCollection",
    }
}

/// Give every region whose identifier is shared a 1-based box number, in
/// file order.
fn number_boxes(regions: &mut [Region]) {
    let mut totals: HashMap<String, u32> = HashMap::new();
    for region in regions.iter() {
        *totals.entry(region.id.clone()).or_insert(0) += 1;
    }

    let mut seen: HashMap<String, u32> = HashMap::new();
    for region in regions.iter_mut() {
        if totals.get(&region.id).copied().unwrap_or(0) > 1 {
            let counter = seen.entry(region.id.clone()).or_insert(0);
            *counter += 1;
            region.box_seq = Some(*counter);
        }
    }
}
