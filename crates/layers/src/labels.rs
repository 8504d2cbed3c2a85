use foundation::ZoneId;
use foundation::math::Vec3;

use crate::symbology::Color;

/// Value interpolated on camera distance: `near_value` at or below `near`,
/// `far_value` at or beyond `far`, linear in between.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct NearFarScalar {
    pub near: f64,
    pub near_value: f64,
    pub far: f64,
    pub far_value: f64,
}

impl NearFarScalar {
    pub const fn new(near: f64, near_value: f64, far: f64, far_value: f64) -> Self {
        Self {
            near,
            near_value,
            far,
            far_value,
        }
    }

    pub fn value_at(&self, distance: f64) -> f64 {
        if self.far <= self.near {
            return if distance < self.far {
                self.near_value
            } else {
                self.far_value
            };
        }
        let t = ((distance - self.near) / (self.far - self.near)).clamp(0.0, 1.0);
        self.near_value + (self.far_value - self.near_value) * t
    }

    pub fn as_array(&self) -> [f64; 4] {
        [self.near, self.near_value, self.far, self.far_value]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabelStyle {
    pub font: String,
    pub fill: Color,
    pub outline: Color,
    pub outline_width_px: f32,
    /// Offset toward the eye in meters; negative pulls the label in front of the polygon.
    pub eye_offset_m: Vec3,
    pub translucency_by_distance: Option<NearFarScalar>,
    pub scale_by_distance: Option<NearFarScalar>,
    pub disable_depth_test_distance: f64,
}

impl Default for LabelStyle {
    fn default() -> Self {
        Self {
            font: "bold 16pt Nunito Sans".to_string(),
            fill: Color::BLACK,
            outline: Color::BLACK,
            outline_width_px: 3.0,
            eye_offset_m: Vec3::new(0.0, 0.0, -10.0),
            translucency_by_distance: Some(NearFarScalar::new(1.5e3, 1.0, 5.0e4, 0.0)),
            scale_by_distance: Some(NearFarScalar::new(1.5e3, 1.2, 5.0e4, 0.3)),
            disable_depth_test_distance: f64::INFINITY,
        }
    }
}

impl LabelStyle {
    pub fn opacity_at(&self, camera_distance: f64) -> f64 {
        self.translucency_by_distance
            .map_or(1.0, |s| s.value_at(camera_distance))
    }

    pub fn scale_at(&self, camera_distance: f64) -> f64 {
        self.scale_by_distance
            .map_or(1.0, |s| s.value_at(camera_distance))
    }
}

/// Floating demand label anchored on a zone center.
#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub zone: ZoneId,
    pub text: String,
    pub position: Vec3,
    pub style: LabelStyle,
}

/// The label overlay. Rebuilt from scratch on every render; never diffed.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct LabelCollection {
    labels: Vec<Label>,
}

impl LabelCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, label: Label) {
        self.labels.push(label);
    }

    pub fn remove_all(&mut self) {
        self.labels.clear();
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Label> {
        self.labels.iter()
    }

    pub fn for_zone(&self, zone: ZoneId) -> Option<&Label> {
        self.labels.iter().find(|l| l.zone == zone)
    }
}
