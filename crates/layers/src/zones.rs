//! Zone geometry index: stable ids, boundaries and representative centers.

use std::collections::BTreeMap;

use formats::{FeatureGeometry, SourceFeature, ZoneSource};
use foundation::bounds::BoundingSphere;
use foundation::math::{Vec3, lon_lat_deg_to_ecef};
use foundation::{ZoneId, parse_leading_int};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{info, warn};

use crate::symbology::Color;

/// Ordered list of property names that may carry a zone id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdFields {
    names: Vec<String>,
}

impl Default for IdFields {
    fn default() -> Self {
        Self::new(["LocationID", "location_id", "OBJECTID"])
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum IdError {
    #[error("no id property among {0:?}")]
    Missing(Vec<String>),
    #[error("property {field} = {value} is not a positive integer id")]
    Unparseable { field: String, value: String },
}

impl IdFields {
    pub fn new<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// First candidate that is present and not `null`.
    pub fn resolve<'a>(&'a self, props: &'a Map<String, Value>) -> Option<(&'a str, &'a Value)> {
        self.names.iter().find_map(|name| match props.get(name) {
            None | Some(Value::Null) => None,
            Some(v) => Some((name.as_str(), v)),
        })
    }

    pub fn zone_id(&self, props: &Map<String, Value>) -> Result<ZoneId, IdError> {
        let (field, value) = self
            .resolve(props)
            .ok_or_else(|| IdError::Missing(self.names.clone()))?;
        parse_id_value(value).ok_or_else(|| IdError::Unparseable {
            field: field.to_string(),
            value: value.to_string(),
        })
    }
}

fn parse_id_value(value: &Value) -> Option<ZoneId> {
    match value {
        Value::Number(n) => match n.as_i64() {
            Some(i) => ZoneId::try_from_i64(i),
            None => {
                let f = n.as_f64()?.trunc();
                if f.is_finite() && f.abs() < i64::MAX as f64 {
                    ZoneId::try_from_i64(f as i64)
                } else {
                    None
                }
            }
        },
        Value::String(s) => parse_leading_int(s).and_then(ZoneId::try_from_i64),
        _ => None,
    }
}

/// Polygon presentation state. Reset on clear, rewritten on render.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ZoneStyle {
    pub fill: Color,
    pub outline: Color,
    pub outline_width_px: f32,
    pub extrude_height_m: f64,
}

impl ZoneStyle {
    pub const fn neutral() -> Self {
        Self {
            fill: Color::WHITE.with_alpha(0.1),
            outline: Color::BLACK,
            outline_width_px: 1.0,
            extrude_height_m: 100.0,
        }
    }
}

impl Default for ZoneStyle {
    fn default() -> Self {
        Self::neutral()
    }
}

pub fn placeholder_description(id: ZoneId) -> String {
    format!("Zone ID: {id}<br>Select date/time and click 'Predict Demand'.")
}

#[derive(Debug, Clone, PartialEq)]
pub struct Zone {
    pub id: ZoneId,
    /// Outer ring of each polygon part, in world space.
    pub boundary: Vec<Vec<Vec3>>,
    /// Bounding-sphere center of `boundary`. `None` hides the zone from nearest-zone queries.
    pub center: Option<Vec3>,
    pub style: ZoneStyle,
    pub description: String,
}

impl Zone {
    fn new(id: ZoneId, boundary: Vec<Vec<Vec3>>) -> Self {
        let points: Vec<Vec3> = boundary.iter().flatten().copied().collect();
        let center = BoundingSphere::from_points(&points).map(|s| s.center);
        Self {
            id,
            boundary,
            center,
            style: ZoneStyle::neutral(),
            description: placeholder_description(id),
        }
    }

    pub fn reset_presentation(&mut self) {
        self.style = ZoneStyle::neutral();
        self.description = placeholder_description(self.id);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildReport {
    pub features: usize,
    /// Distinct zones kept after last-write-wins on duplicate ids.
    pub indexed: usize,
    pub without_center: usize,
    pub rejected: usize,
    pub duplicates: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexError {
    #[error("zone source has no features")]
    NoFeatures,
    #[error("none of the {features} features yielded a zone")]
    NoZones { features: usize },
}

/// Zones keyed by id, traversed in ascending id order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ZoneIndex {
    zones: BTreeMap<ZoneId, Zone>,
    report: BuildReport,
}

impl ZoneIndex {
    pub fn build(source: &ZoneSource, fields: &IdFields) -> Result<Self, IndexError> {
        if source.is_empty() {
            return Err(IndexError::NoFeatures);
        }

        let mut index = ZoneIndex::default();
        index.report.features = source.features.len();
        for feature in &source.features {
            index.ingest(feature, fields);
        }

        if index.zones.is_empty() {
            return Err(IndexError::NoZones {
                features: index.report.features,
            });
        }
        index.report.indexed = index.zones.len();
        index.report.without_center = index.zones.values().filter(|z| z.center.is_none()).count();

        info!(
            features = index.report.features,
            zones = index.report.indexed,
            centers = index.report.indexed - index.report.without_center,
            rejected = index.report.rejected,
            "zone index built"
        );
        Ok(index)
    }

    fn ingest(&mut self, feature: &SourceFeature, fields: &IdFields) {
        let id = match fields.zone_id(&feature.properties) {
            Ok(id) => id,
            Err(err) => {
                warn!(feature = feature.index, "skipping feature: {err}");
                self.report.rejected += 1;
                return;
            }
        };

        let boundary = match &feature.geometry {
            FeatureGeometry::Polygonal(rings) => rings
                .iter()
                .filter(|ring| !ring.is_empty())
                .map(|ring| {
                    ring.iter()
                        .map(|p| lon_lat_deg_to_ecef(p.lon_deg, p.lat_deg, p.height_m))
                        .collect()
                })
                .collect(),
            FeatureGeometry::NonPolygonal(kind) => {
                warn!(zone = %id, "zone has {kind} geometry, no polygon for a center");
                Vec::new()
            }
            FeatureGeometry::Missing => {
                warn!(zone = %id, "zone has no geometry, no center");
                Vec::new()
            }
            FeatureGeometry::Invalid(reason) => {
                warn!(zone = %id, "zone geometry unreadable ({reason}), no center");
                Vec::new()
            }
        };

        let zone = Zone::new(id, boundary);
        if zone.center.is_none() && matches!(feature.geometry, FeatureGeometry::Polygonal(_)) {
            warn!(zone = %id, "zone polygon has no usable points, no center");
        }
        if self.zones.insert(id, zone).is_some() {
            warn!(zone = %id, feature = feature.index, "duplicate zone id, later feature wins");
            self.report.duplicates += 1;
        }
    }

    pub fn report(&self) -> BuildReport {
        self.report
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    pub fn zone(&self, id: ZoneId) -> Option<&Zone> {
        self.zones.get(&id)
    }

    pub fn zone_mut(&mut self, id: ZoneId) -> Option<&mut Zone> {
        self.zones.get_mut(&id)
    }

    pub fn zones(&self) -> impl Iterator<Item = &Zone> {
        self.zones.values()
    }

    pub fn zones_mut(&mut self) -> impl Iterator<Item = &mut Zone> {
        self.zones.values_mut()
    }

    pub fn center(&self, id: ZoneId) -> Option<Vec3> {
        self.zones.get(&id).and_then(|z| z.center)
    }

    /// Id-to-center view; zones without a center are absent.
    pub fn centers(&self) -> impl Iterator<Item = (ZoneId, Vec3)> + '_ {
        self.zones
            .values()
            .filter_map(|z| z.center.map(|c| (z.id, c)))
    }

    pub fn center_count(&self) -> usize {
        self.centers().count()
    }
}

#[cfg(test)]
mod tests {
    use super::{IdError, IdFields, IndexError, ZoneIndex, ZoneStyle, placeholder_description};
    use formats::ZoneSource;
    use foundation::ZoneId;
    use pretty_assertions::assert_eq;
    use serde_json::{Map, Value, json};

    fn props(v: Value) -> Map<String, Value> {
        v.as_object().cloned().expect("object")
    }

    fn zid(n: u32) -> ZoneId {
        ZoneId::new(n).expect("zone id")
    }

    fn square(lon: f64, lat: f64) -> Value {
        json!({
            "type": "Polygon",
            "coordinates": [[
                [lon, lat], [lon + 0.01, lat], [lon + 0.01, lat + 0.01], [lon, lat + 0.01], [lon, lat]
            ]]
        })
    }

    fn source(features: Vec<Value>) -> ZoneSource {
        ZoneSource::from_geojson_value(&json!({
            "type": "FeatureCollection",
            "features": features,
        }))
        .expect("zone source")
    }

    fn feature(properties: Value, geometry: Value) -> Value {
        json!({"type": "Feature", "properties": properties, "geometry": geometry})
    }

    #[test]
    fn id_fields_follow_priority_order() {
        let fields = IdFields::default();
        let p = props(json!({"OBJECTID": 9, "location_id": "7", "LocationID": null}));
        assert_eq!(fields.zone_id(&p), Ok(zid(7)));

        let p = props(json!({"OBJECTID": 9}));
        assert_eq!(fields.zone_id(&p), Ok(zid(9)));

        let p = props(json!({"LocationID": 3, "OBJECTID": 9}));
        assert_eq!(fields.zone_id(&p), Ok(zid(3)));
    }

    #[test]
    fn id_values_parse_leniently() {
        let fields = IdFields::default();
        assert_eq!(fields.zone_id(&props(json!({"LocationID": "42"}))), Ok(zid(42)));
        assert_eq!(fields.zone_id(&props(json!({"LocationID": 42.9}))), Ok(zid(42)));
        assert_eq!(fields.zone_id(&props(json!({"LocationID": " 5a"}))), Ok(zid(5)));
        assert!(matches!(
            fields.zone_id(&props(json!({"LocationID": "abc"}))),
            Err(IdError::Unparseable { .. })
        ));
        assert!(matches!(
            fields.zone_id(&props(json!({"LocationID": 0}))),
            Err(IdError::Unparseable { .. })
        ));
        assert!(matches!(
            fields.zone_id(&props(json!({"LocationID": true}))),
            Err(IdError::Unparseable { .. })
        ));
        assert!(matches!(
            fields.zone_id(&props(json!({"zone": "Midtown"}))),
            Err(IdError::Missing(_))
        ));
    }

    #[test]
    fn custom_id_fields() {
        let fields = IdFields::new(["zone_code"]);
        assert_eq!(fields.names(), ["zone_code".to_string()]);
        assert_eq!(fields.zone_id(&props(json!({"zone_code": 11}))), Ok(zid(11)));
        assert!(fields.zone_id(&props(json!({"LocationID": 11}))).is_err());
    }

    #[test]
    fn zones_with_boundary_get_a_center() {
        let src = source(vec![
            feature(json!({"LocationID": 1}), square(-74.0, 40.7)),
            feature(json!({"LocationID": 2}), Value::Null),
            feature(json!({"LocationID": 3}), json!({"type": "Point", "coordinates": [-73.9, 40.7]})),
            feature(json!({"name": "no id"}), square(-73.8, 40.7)),
        ]);
        let index = ZoneIndex::build(&src, &IdFields::default()).expect("index");

        assert_eq!(index.len(), 3);
        assert_eq!(index.center_count(), 1);
        assert!(index.center(zid(1)).is_some());
        assert!(index.zone(zid(2)).is_some());
        assert!(index.center(zid(2)).is_none());
        assert!(index.center(zid(3)).is_none());

        let report = index.report();
        assert_eq!(report.features, 4);
        assert_eq!(report.indexed, 3);
        assert_eq!(report.without_center, 2);
        assert_eq!(report.rejected, 1);
    }

    #[test]
    fn fresh_zones_carry_neutral_presentation() {
        let src = source(vec![feature(json!({"LocationID": 8}), square(-74.0, 40.7))]);
        let index = ZoneIndex::build(&src, &IdFields::default()).expect("index");
        let zone = index.zone(zid(8)).expect("zone 8");
        assert_eq!(zone.style, ZoneStyle::neutral());
        assert_eq!(zone.description, placeholder_description(zid(8)));
    }

    #[test]
    fn duplicate_ids_last_write_wins() {
        let src = source(vec![
            feature(json!({"LocationID": 5}), square(-74.0, 40.7)),
            feature(json!({"LocationID": 5}), Value::Null),
        ]);
        let index = ZoneIndex::build(&src, &IdFields::default()).expect("index");
        assert_eq!(index.len(), 1);
        assert!(index.center(zid(5)).is_none());
        assert_eq!(index.report().duplicates, 1);
    }

    #[test]
    fn multipolygon_center_covers_all_parts() {
        let geometry = json!({
            "type": "MultiPolygon",
            "coordinates": [
                [[[-74.0, 40.7], [-74.0, 40.71], [-73.99, 40.71], [-74.0, 40.7]]],
                [[[-73.9, 40.7], [-73.9, 40.71], [-73.89, 40.71], [-73.9, 40.7]]]
            ]
        });
        let src = source(vec![feature(json!({"LocationID": 1}), geometry)]);
        let index = ZoneIndex::build(&src, &IdFields::default()).expect("index");
        let zone = index.zone(zid(1)).expect("zone");
        assert_eq!(zone.boundary.len(), 2);

        let center = zone.center.expect("center");
        let (lon, _lat, _h) = foundation::math::ecef_to_lon_lat_deg(center);
        assert!(lon > -73.99 && lon < -73.9, "lon {lon}");
    }

    #[test]
    fn empty_sources_fail_the_build() {
        assert_eq!(
            ZoneIndex::build(&source(vec![]), &IdFields::default()),
            Err(IndexError::NoFeatures)
        );
        let src = source(vec![feature(json!({"name": "x"}), square(-74.0, 40.7))]);
        assert_eq!(
            ZoneIndex::build(&src, &IdFields::default()),
            Err(IndexError::NoZones { features: 1 })
        );
    }
}
