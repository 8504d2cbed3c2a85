//! Prediction rendering: the map context and the clear/render cycle.

use std::fmt;

use formats::{Demand, PredictionPayload};
use foundation::ZoneId;
use tracing::{debug, info, warn};

use crate::labels::{Label, LabelCollection, LabelStyle};
use crate::symbology::DemandRamp;
use crate::zones::{Zone, ZoneIndex};

/// Date and time a prediction set refers to. Display only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeContext {
    pub date: String,
    pub time: String,
}

impl TimeContext {
    pub fn new(date: impl Into<String>, time: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            time: time.into(),
        }
    }
}

impl fmt::Display for TimeContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.date, self.time)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderSummary {
    pub time: TimeContext,
    pub displayed: usize,
    pub total_demand: f64,
    /// Negative sentinels and non-numeric values.
    pub errors: usize,
    /// Valid entries whose id is out of range, unknown, or has no center.
    pub unmapped: usize,
    /// Keys without an integer prefix.
    pub invalid_keys: usize,
}

impl RenderSummary {
    fn empty(time: TimeContext) -> Self {
        Self {
            time,
            displayed: 0,
            total_demand: 0.0,
            errors: 0,
            unmapped: 0,
            invalid_keys: 0,
        }
    }
}

impl fmt::Display for RenderSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Prediction for {}. Displayed: {}. Total Predicted: {}. Errors: {}.",
            self.time,
            self.displayed,
            format_demand(self.total_demand),
            self.errors
        )
    }
}

/// Shortest human form: integral values without a fractional part.
pub fn format_demand(demand: f64) -> String {
    if demand.fract() == 0.0 && demand.abs() < 1e15 {
        format!("{}", demand as i64)
    } else {
        format!("{demand}")
    }
}

/// Map state owned by the application shell: zone geometry and presentation,
/// the demand ramp, and the label overlay.
#[derive(Debug, Clone)]
pub struct ZoneMap {
    index: ZoneIndex,
    ramp: DemandRamp,
    label_style: LabelStyle,
    labels: LabelCollection,
}

impl ZoneMap {
    pub fn new(index: ZoneIndex) -> Self {
        Self {
            index,
            ramp: DemandRamp::default(),
            label_style: LabelStyle::default(),
            labels: LabelCollection::new(),
        }
    }

    pub fn with_ramp(mut self, ramp: DemandRamp) -> Self {
        self.ramp = ramp;
        self
    }

    pub fn with_label_style(mut self, style: LabelStyle) -> Self {
        self.label_style = style;
        self
    }

    pub fn index(&self) -> &ZoneIndex {
        &self.index
    }

    pub fn ramp(&self) -> &DemandRamp {
        &self.ramp
    }

    pub fn labels(&self) -> &LabelCollection {
        &self.labels
    }

    pub fn zone(&self, id: ZoneId) -> Option<&Zone> {
        self.index.zone(id)
    }

    pub fn zones(&self) -> impl Iterator<Item = &Zone> {
        self.index.zones()
    }

    pub fn find_nearest(&self, lat_deg: f64, lon_deg: f64) -> Option<ZoneId> {
        self.index.find_nearest(lat_deg, lon_deg)
    }

    /// Drops every label and returns every zone to its neutral look. Idempotent.
    pub fn clear(&mut self) {
        self.labels.remove_all();
        for zone in self.index.zones_mut() {
            zone.reset_presentation();
        }
        debug!(zones = self.index.len(), "cleared prediction labels and styles");
    }

    /// Clears, then draws every usable entry of `predictions`.
    ///
    /// A bad entry only affects itself; the pass always finishes with a summary.
    pub fn render(&mut self, predictions: &PredictionPayload, time: &TimeContext) -> RenderSummary {
        self.clear();

        let mut summary = RenderSummary::empty(time.clone());
        for entry in predictions.entries() {
            let Some(raw_id) = entry.id else {
                warn!(key = entry.key, "invalid zone id in prediction response");
                summary.invalid_keys += 1;
                continue;
            };
            let demand = match entry.demand {
                Demand::Value(d) => d,
                Demand::Sentinel(code) => {
                    warn!(zone = raw_id, code, "prediction skipped, service reported an error");
                    summary.errors += 1;
                    continue;
                }
                Demand::NotNumeric => {
                    warn!(zone = raw_id, "prediction skipped, demand is not a number");
                    summary.errors += 1;
                    continue;
                }
            };

            let Some(id) = entry.zone else {
                warn!(zone = raw_id, "prediction key is not a zone id");
                summary.unmapped += 1;
                continue;
            };
            let Some(zone) = self.index.zone_mut(id) else {
                warn!(zone = %id, "zone in predictions but not in the zone source");
                summary.unmapped += 1;
                continue;
            };
            let Some(center) = zone.center else {
                warn!(zone = %id, "zone in predictions but has no center");
                summary.unmapped += 1;
                continue;
            };

            let text = format_demand(demand);
            let style = self.ramp.classify(demand);
            zone.style.fill = style.color;
            zone.description = format!(
                "Zone ID: {id}<br>Predicted Demand: {text}<br>For: {time}"
            );
            self.labels.add(Label {
                zone: id,
                text,
                position: center,
                style: self.label_style.clone(),
            });

            summary.total_demand += demand;
            summary.displayed += 1;
        }

        info!("{summary}");
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::{RenderSummary, TimeContext, ZoneMap, format_demand};
    use crate::symbology::{Color, DemandRamp};
    use crate::zones::{IdFields, ZoneIndex, ZoneStyle, placeholder_description};
    use formats::{PredictionPayload, ZoneSource};
    use foundation::ZoneId;
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};

    fn zid(n: u32) -> ZoneId {
        ZoneId::new(n).expect("zone id")
    }

    fn square_feature(id: u32, lon: f64, lat: f64) -> Value {
        json!({
            "type": "Feature",
            "properties": {"LocationID": id},
            "geometry": {
                "type": "Polygon",
                "coordinates": [[
                    [lon, lat], [lon + 0.01, lat], [lon + 0.01, lat + 0.01], [lon, lat + 0.01], [lon, lat]
                ]]
            }
        })
    }

    /// Zones 1 and 3 with geometry, zone 4 without.
    fn map() -> ZoneMap {
        let src = ZoneSource::from_geojson_value(&json!({
            "type": "FeatureCollection",
            "features": [
                square_feature(1, -74.0, 40.7),
                square_feature(3, -73.9, 40.8),
                {"type": "Feature", "properties": {"LocationID": 4}, "geometry": null},
            ],
        }))
        .expect("zone source");
        ZoneMap::new(ZoneIndex::build(&src, &IdFields::default()).expect("index"))
    }

    fn payload(body: &str) -> PredictionPayload {
        PredictionPayload::from_json_str(body).expect("payload")
    }

    fn time() -> TimeContext {
        TimeContext::new("2025-04-20", "12:00")
    }

    fn assert_neutral(map: &ZoneMap) {
        assert!(map.labels().is_empty());
        for zone in map.zones() {
            assert_eq!(zone.style, ZoneStyle::neutral());
            assert_eq!(zone.description, placeholder_description(zone.id));
        }
    }

    #[test]
    fn mixed_response_tallies() {
        let mut map = map();
        let summary = map.render(&payload(r#"{"1": 10, "2": -1, "3": 200, "x": 5}"#), &time());

        assert_eq!(
            summary,
            RenderSummary {
                time: time(),
                displayed: 2,
                total_demand: 210.0,
                errors: 1,
                unmapped: 0,
                invalid_keys: 1,
            }
        );
        assert_eq!(map.labels().len(), 2);

        let label = map.labels().for_zone(zid(1)).expect("label for zone 1");
        assert_eq!(label.text, "10");
        assert_eq!(Some(label.position), map.index().center(zid(1)));

        let zone3 = map.zone(zid(3)).expect("zone 3");
        assert_eq!(zone3.style.fill, Color::RED.with_alpha(zone3.style.fill.a));
        assert_eq!(
            zone3.description,
            "Zone ID: 3<br>Predicted Demand: 200<br>For: 2025-04-20 12:00"
        );
    }

    #[test]
    fn empty_response_leaves_a_cleared_map() {
        let mut map = map();
        map.render(&payload(r#"{"1": 80}"#), &time());
        let summary = map.render(&PredictionPayload::default(), &time());
        assert_eq!(summary.displayed, 0);
        assert_eq!(summary.total_demand, 0.0);
        assert_eq!(summary.errors, 0);
        assert_neutral(&map);
    }

    #[test]
    fn rendering_twice_gives_the_same_result() {
        let mut map = map();
        let p = payload(r#"{"1": 10, "3": 75.5, "2": -3}"#);
        let first = map.render(&p, &time());
        let labels_after_first = map.labels().clone();
        let second = map.render(&p, &time());
        assert_eq!(first, second);
        assert_eq!(map.labels(), &labels_after_first);
    }

    #[test]
    fn unknown_zone_and_missing_center_are_unmapped_not_errors() {
        let mut map = map();
        let summary = map.render(&payload(r#"{"4": 12, "99": 7}"#), &time());
        assert_eq!(summary.displayed, 0);
        assert_eq!(summary.errors, 0);
        assert_eq!(summary.unmapped, 2);
        assert_neutral(&map);
    }

    #[test]
    fn sentinels_on_non_positive_keys_still_count_as_errors() {
        let mut map = map();
        let summary = map.render(&payload(r#"{"0": -1, "-5": -1, "1": 3}"#), &time());
        assert_eq!(summary.displayed, 1);
        assert_eq!(summary.errors, 2);
        assert_eq!(summary.invalid_keys, 0);
        assert_eq!(summary.unmapped, 0);

        let summary = map.render(&payload(r#"{"0": 4, "4294967296": 2}"#), &time());
        assert_eq!(summary.unmapped, 2);
        assert_eq!(summary.errors, 0);
        assert_eq!(summary.displayed, 0);
    }

    #[test]
    fn non_numeric_demand_counts_as_error() {
        let mut map = map();
        let summary = map.render(&payload(r#"{"1": null, "3": "lots"}"#), &time());
        assert_eq!(summary.errors, 2);
        assert_eq!(summary.displayed, 0);
    }

    #[test]
    fn render_replaces_previous_state() {
        let mut map = map();
        map.render(&payload(r#"{"1": 10, "3": 20}"#), &time());
        map.render(&payload(r#"{"3": 0}"#), &time());

        assert_eq!(map.labels().len(), 1);
        let zone1 = map.zone(zid(1)).expect("zone 1");
        assert_eq!(zone1.style, ZoneStyle::neutral());
        let zone3 = map.zone(zid(3)).expect("zone 3");
        assert_eq!(zone3.style.fill, Color::WHITE);
    }

    #[test]
    fn clear_is_idempotent_and_safe_before_any_render() {
        let mut map = map();
        map.clear();
        assert_neutral(&map);
        map.render(&payload(r#"{"1": 149}"#), &time());
        map.clear();
        map.clear();
        assert_neutral(&map);
    }

    #[test]
    fn custom_ramp_is_applied() {
        let ramp = DemandRamp {
            ceiling: 10.0,
            ..DemandRamp::default()
        };
        let mut map = map().with_ramp(ramp);
        map.render(&payload(r#"{"1": 10}"#), &time());
        let zone1 = map.zone(zid(1)).expect("zone 1");
        assert_eq!(zone1.style.fill.r, 1.0);
        assert_eq!(zone1.style.fill.g, 0.0);
    }

    #[test]
    fn status_line_and_demand_text() {
        let mut map = map();
        let summary = map.render(&payload(r#"{"1": 10, "3": 2.5}"#), &time());
        assert_eq!(
            summary.to_string(),
            "Prediction for 2025-04-20 12:00. Displayed: 2. Total Predicted: 12.5. Errors: 0."
        );
        assert_eq!(format_demand(42.0), "42");
        assert_eq!(format_demand(0.25), "0.25");
        assert_eq!(format_demand(-1.0), "-1");
    }
}
