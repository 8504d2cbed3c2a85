//! Styled GeoJSON snapshot of the map, for handing to an external renderer.
//!
//! Polygons use simplestyle property names (`fill`, `fill-opacity`, `stroke`,
//! `stroke-width`) so common viewers pick them up without configuration.

use foundation::math::{Vec3, ecef_to_lon_lat_deg};
use serde_json::{Map, Value, json};

use crate::labels::Label;
use crate::render::ZoneMap;
use crate::zones::Zone;

pub fn map_to_geojson(map: &ZoneMap) -> Value {
    let mut features: Vec<Value> = map.zones().map(zone_feature).collect();
    features.extend(map.labels().iter().map(label_feature));
    json!({
        "type": "FeatureCollection",
        "features": features,
    })
}

fn zone_feature(zone: &Zone) -> Value {
    let mut props = Map::new();
    props.insert("zone_id".to_string(), json!(zone.id.get()));
    props.insert("description".to_string(), json!(zone.description));
    props.insert("fill".to_string(), json!(zone.style.fill.to_hex()));
    props.insert(
        "fill-opacity".to_string(),
        json!(round_to(f64::from(zone.style.fill.a), 1e4)),
    );
    props.insert("stroke".to_string(), json!(zone.style.outline.to_hex()));
    props.insert("stroke-width".to_string(), json!(zone.style.outline_width_px));
    props.insert(
        "extrude_height_m".to_string(),
        json!(zone.style.extrude_height_m),
    );

    json!({
        "type": "Feature",
        "properties": props,
        "geometry": boundary_geometry(&zone.boundary),
    })
}

fn boundary_geometry(boundary: &[Vec<Vec3>]) -> Value {
    let mut polygons: Vec<Value> = boundary
        .iter()
        .filter(|ring| !ring.is_empty())
        .map(|ring| json!([ring.iter().map(|p| position(*p)).collect::<Vec<_>>()]))
        .collect();
    match polygons.len() {
        0 => Value::Null,
        1 => json!({"type": "Polygon", "coordinates": polygons.remove(0)}),
        _ => json!({"type": "MultiPolygon", "coordinates": polygons}),
    }
}

fn label_feature(label: &Label) -> Value {
    let style = &label.style;
    json!({
        "type": "Feature",
        "properties": {
            "zone_id": label.zone.get(),
            "label": label.text,
            "font": style.font,
            "label-color": style.fill.to_hex(),
            "label-outline": style.outline.to_hex(),
            "label-outline-width": style.outline_width_px,
            "eye_offset_m": [style.eye_offset_m.x, style.eye_offset_m.y, style.eye_offset_m.z],
            "translucency_by_distance": style.translucency_by_distance.map(|s| s.as_array()),
            "scale_by_distance": style.scale_by_distance.map(|s| s.as_array()),
        },
        "geometry": {"type": "Point", "coordinates": position(label.position)},
    })
}

fn position(p: Vec3) -> Value {
    let (lon, lat, h) = ecef_to_lon_lat_deg(p);
    json!([round_to(lon, 1e7), round_to(lat, 1e7), round_to(h, 1e3)])
}

fn round_to(v: f64, scale: f64) -> f64 {
    (v * scale).round() / scale
}
