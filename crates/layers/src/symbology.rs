//! Demand-to-color mapping for zone polygons.

/// Linear RGBA color, each channel in `[0, 1]`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    pub const GREEN: Color = Color::rgb(0.0, 128.0 / 255.0, 0.0);
    pub const YELLOW: Color = Color::rgb(1.0, 1.0, 0.0);
    pub const RED: Color = Color::rgb(1.0, 0.0, 0.0);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    pub fn as_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// `#rrggbb`; alpha is reported separately by callers that need it.
    pub fn to_hex(self) -> String {
        let q = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        format!("#{:02x}{:02x}{:02x}", q(self.r), q(self.g), q(self.b))
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum DemandTier {
    Base,
    Low,
    Mid,
    High,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum ColorSpec {
    Fixed(Color),
    /// Take the RGB and use the computed alpha as opacity.
    WithComputedAlpha(Color),
}

impl ColorSpec {
    fn resolve(self, alpha: f64) -> Color {
        match self {
            ColorSpec::Fixed(c) => c,
            ColorSpec::WithComputedAlpha(c) => c.with_alpha(alpha as f32),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RampStop {
    /// Inclusive upper bound on the computed alpha.
    pub max_alpha: f64,
    pub tier: DemandTier,
    pub color: ColorSpec,
}

impl RampStop {
    pub const fn new(max_alpha: f64, tier: DemandTier, color: ColorSpec) -> Self {
        Self {
            max_alpha,
            tier,
            color,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DemandStyle {
    pub intensity: f64,
    pub alpha: f64,
    pub tier: DemandTier,
    pub color: Color,
}

/// Ordered stop table evaluated first-match on the derived alpha.
///
/// `intensity = min(1, demand / ceiling)` and `alpha = base_alpha + intensity * alpha_span`.
#[derive(Debug, Clone, PartialEq)]
pub struct DemandRamp {
    pub ceiling: f64,
    pub base_alpha: f64,
    pub alpha_span: f64,
    pub stops: Vec<RampStop>,
    pub fallback: RampStop,
}

impl Default for DemandRamp {
    fn default() -> Self {
        Self {
            ceiling: 150.0,
            base_alpha: 0.2,
            alpha_span: 0.7,
            stops: vec![
                RampStop::new(0.2, DemandTier::Base, ColorSpec::Fixed(Color::WHITE)),
                RampStop::new(0.5, DemandTier::Low, ColorSpec::Fixed(Color::GREEN)),
                RampStop::new(0.8, DemandTier::Mid, ColorSpec::Fixed(Color::YELLOW)),
            ],
            fallback: RampStop::new(
                f64::INFINITY,
                DemandTier::High,
                ColorSpec::WithComputedAlpha(Color::RED),
            ),
        }
    }
}

impl DemandRamp {
    pub fn intensity(&self, demand: f64) -> f64 {
        (demand / self.ceiling).min(1.0)
    }

    pub fn classify(&self, demand: f64) -> DemandStyle {
        let intensity = self.intensity(demand);
        let alpha = self.base_alpha + intensity * self.alpha_span;
        let stop = self
            .stops
            .iter()
            .find(|s| alpha <= s.max_alpha)
            .unwrap_or(&self.fallback);
        DemandStyle {
            intensity,
            alpha,
            tier: stop.tier,
            color: stop.color.resolve(alpha),
        }
    }
}
