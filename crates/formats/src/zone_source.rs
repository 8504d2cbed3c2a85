//! Tolerant GeoJSON reader for zone polygon collections.
//!
//! Only the collection envelope is strict. Individual features never fail the
//! whole read: whatever is wrong with one feature is carried on that feature
//! so the indexer can log and skip it.

use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub lon_deg: f64,
    pub lat_deg: f64,
    pub height_m: f64,
}

impl GeoPoint {
    pub fn new(lon_deg: f64, lat_deg: f64) -> Self {
        Self {
            lon_deg,
            lat_deg,
            height_m: 0.0,
        }
    }

    pub fn with_height(mut self, height_m: f64) -> Self {
        self.height_m = height_m;
        self
    }
}

/// Geometry of one source feature, as far as zone indexing cares.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureGeometry {
    /// One outer ring per polygon part. Holes are dropped.
    Polygonal(Vec<Vec<GeoPoint>>),
    /// A valid geometry that has no area (Point, LineString, ...).
    NonPolygonal(String),
    /// `geometry` absent or `null`.
    Missing,
    Invalid(String),
}

impl FeatureGeometry {
    pub fn point_count(&self) -> usize {
        match self {
            FeatureGeometry::Polygonal(rings) => rings.iter().map(Vec::len).sum(),
            _ => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourceFeature {
    /// Position within the `features` array.
    pub index: usize,
    pub properties: Map<String, Value>,
    pub geometry: FeatureGeometry,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ZoneSource {
    pub features: Vec<SourceFeature>,
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("zone source is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("expected GeoJSON FeatureCollection")]
    NotAFeatureCollection,
}

impl ZoneSource {
    pub fn from_geojson_str(payload: &str) -> Result<Self, SourceError> {
        let value: Value = serde_json::from_str(payload)?;
        Self::from_geojson_value(&value)
    }

    pub fn from_geojson_value(value: &Value) -> Result<Self, SourceError> {
        let obj = value.as_object().ok_or(SourceError::NotAFeatureCollection)?;
        let ty = obj
            .get("type")
            .and_then(Value::as_str)
            .ok_or(SourceError::NotAFeatureCollection)?;
        if ty != "FeatureCollection" {
            return Err(SourceError::NotAFeatureCollection);
        }
        let features_val = obj
            .get("features")
            .and_then(Value::as_array)
            .ok_or(SourceError::NotAFeatureCollection)?;

        let features = features_val
            .iter()
            .enumerate()
            .map(|(index, v)| read_feature(index, v))
            .collect();
        Ok(Self { features })
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

fn read_feature(index: usize, value: &Value) -> SourceFeature {
    let Some(obj) = value.as_object() else {
        return SourceFeature {
            index,
            properties: Map::new(),
            geometry: FeatureGeometry::Invalid("feature must be an object".to_string()),
        };
    };

    let properties = obj
        .get("properties")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();

    let geometry = match obj.get("type").and_then(Value::as_str) {
        Some("Feature") => match obj.get("geometry") {
            None | Some(Value::Null) => FeatureGeometry::Missing,
            Some(g) => parse_geometry(g).unwrap_or_else(FeatureGeometry::Invalid),
        },
        Some(other) => FeatureGeometry::Invalid(format!("unexpected feature type: {other}")),
        None => FeatureGeometry::Invalid("feature missing type".to_string()),
    };

    SourceFeature {
        index,
        properties,
        geometry,
    }
}

fn parse_geometry(value: &Value) -> Result<FeatureGeometry, String> {
    let obj = value
        .as_object()
        .ok_or("geometry must be an object".to_string())?;
    let ty = obj
        .get("type")
        .and_then(Value::as_str)
        .ok_or("geometry missing type".to_string())?;

    match ty {
        "Polygon" => {
            let coords = coordinates(obj)?;
            Ok(FeatureGeometry::Polygonal(outer_ring(coords)?.into_iter().collect()))
        }
        "MultiPolygon" => {
            let polys = coordinates(obj)?
                .as_array()
                .ok_or("MultiPolygon coordinates must be an array of polygons".to_string())?;
            let mut rings = Vec::with_capacity(polys.len());
            for poly in polys {
                if let Some(ring) = outer_ring(poly)? {
                    rings.push(ring);
                }
            }
            Ok(FeatureGeometry::Polygonal(rings))
        }
        "GeometryCollection" => {
            let members = obj
                .get("geometries")
                .and_then(Value::as_array)
                .ok_or("GeometryCollection missing geometries".to_string())?;
            let mut rings = Vec::new();
            for member in members {
                if let FeatureGeometry::Polygonal(mut r) = parse_geometry(member)? {
                    rings.append(&mut r);
                }
            }
            if rings.is_empty() {
                Ok(FeatureGeometry::NonPolygonal(ty.to_string()))
            } else {
                Ok(FeatureGeometry::Polygonal(rings))
            }
        }
        "Point" | "MultiPoint" | "LineString" | "MultiLineString" => {
            Ok(FeatureGeometry::NonPolygonal(ty.to_string()))
        }
        other => Err(format!("unsupported geometry type: {other}")),
    }
}

fn coordinates(obj: &Map<String, Value>) -> Result<&Value, String> {
    obj.get("coordinates")
        .ok_or("geometry missing coordinates".to_string())
}

fn outer_ring(coords: &Value) -> Result<Option<Vec<GeoPoint>>, String> {
    let rings = coords
        .as_array()
        .ok_or("Polygon coordinates must be an array of rings".to_string())?;
    match rings.first() {
        Some(ring) => parse_points(ring).map(Some),
        None => Ok(None),
    }
}

fn parse_points(coords: &Value) -> Result<Vec<GeoPoint>, String> {
    let arr = coords
        .as_array()
        .ok_or("ring must be an array of positions".to_string())?;
    let mut out = Vec::with_capacity(arr.len());
    for item in arr {
        out.push(parse_position(item)?);
    }
    Ok(out)
}

fn parse_position(value: &Value) -> Result<GeoPoint, String> {
    let arr = value
        .as_array()
        .ok_or("position must be an array".to_string())?;
    if arr.len() < 2 {
        return Err("position must have [lon, lat]".to_string());
    }
    let lon = arr[0].as_f64().ok_or("lon must be a number".to_string())?;
    let lat = arr[1].as_f64().ok_or("lat must be a number".to_string())?;
    let height = arr.get(2).and_then(Value::as_f64).unwrap_or(0.0);
    Ok(GeoPoint::new(lon, lat).with_height(height))
}
