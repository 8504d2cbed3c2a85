use crate::math::Vec3;

/// Sphere enclosing a point set.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BoundingSphere {
    pub center: Vec3,
    pub radius: f64,
}

impl BoundingSphere {
    pub fn new(center: Vec3, radius: f64) -> Self {
        Self { center, radius }
    }

    /// Tight enclosing sphere for `points`.
    ///
    /// Two candidates are computed and the smaller one is returned:
    /// - a Ritter sphere seeded from the pair of axis-extreme points with the
    ///   largest span, grown incrementally to cover every point;
    /// - a naive sphere centered on the axis-aligned box midpoint.
    ///
    /// Non-finite points are skipped. Returns `None` when nothing usable remains.
    pub fn from_points(points: &[Vec3]) -> Option<Self> {
        let mut usable = points.iter().copied().filter(|p| p.is_finite());
        let first = usable.next()?;

        let mut x_min = first;
        let mut y_min = first;
        let mut z_min = first;
        let mut x_max = first;
        let mut y_max = first;
        let mut z_max = first;

        for p in usable {
            if p.x < x_min.x {
                x_min = p;
            }
            if p.x > x_max.x {
                x_max = p;
            }
            if p.y < y_min.y {
                y_min = p;
            }
            if p.y > y_max.y {
                y_max = p;
            }
            if p.z < z_min.z {
                z_min = p;
            }
            if p.z > z_max.z {
                z_max = p;
            }
        }

        let x_span = x_max.distance_squared(x_min);
        let y_span = y_max.distance_squared(y_min);
        let z_span = z_max.distance_squared(z_min);

        let (mut d1, mut d2, mut max_span) = (x_min, x_max, x_span);
        if y_span > max_span {
            max_span = y_span;
            d1 = y_min;
            d2 = y_max;
        }
        if z_span > max_span {
            d1 = z_min;
            d2 = z_max;
        }

        let mut ritter_center = d1.lerp(d2, 0.5);
        let mut radius_sq = d2.distance_squared(ritter_center);
        let mut ritter_radius = radius_sq.sqrt();

        let box_min = Vec3::new(x_min.x, y_min.y, z_min.z);
        let box_max = Vec3::new(x_max.x, y_max.y, z_max.z);
        let naive_center = box_min.lerp(box_max, 0.5);
        let mut naive_radius: f64 = 0.0;

        for p in points.iter().copied().filter(|p| p.is_finite()) {
            naive_radius = naive_radius.max(p.distance(naive_center));

            let to_point_sq = p.distance_squared(ritter_center);
            if to_point_sq > radius_sq {
                let to_point = to_point_sq.sqrt();
                ritter_radius = (ritter_radius + to_point) * 0.5;
                radius_sq = ritter_radius * ritter_radius;
                let shift = to_point - ritter_radius;
                ritter_center = (ritter_center.scale(ritter_radius) + p.scale(shift))
                    .scale(1.0 / to_point);
            }
        }

        if ritter_radius < naive_radius {
            Some(Self::new(ritter_center, ritter_radius))
        } else {
            Some(Self::new(naive_center, naive_radius))
        }
    }

    pub fn contains(&self, p: Vec3, eps: f64) -> bool {
        p.distance(self.center) <= self.radius + eps
    }
}
