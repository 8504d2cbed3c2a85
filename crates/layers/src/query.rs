use foundation::ZoneId;
use foundation::math::{Vec3, lon_lat_deg_to_ecef};
use tracing::debug;

use crate::zones::ZoneIndex;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct NearestHit {
    pub zone: ZoneId,
    /// Squared chord distance in m².
    pub distance_sq: f64,
}

/// Linear scan for the center closest to `target`.
///
/// Ordering contract: the first strictly smaller distance wins, so among equal
/// distances the earliest candidate in iteration order is kept.
pub fn nearest_center(
    centers: impl IntoIterator<Item = (ZoneId, Vec3)>,
    target: Vec3,
) -> Option<NearestHit> {
    let mut best: Option<NearestHit> = None;
    for (zone, center) in centers {
        let distance_sq = center.distance_squared(target);
        let closer = match best {
            Some(hit) => distance_sq < hit.distance_sq,
            None => distance_sq.is_finite(),
        };
        if closer {
            best = Some(NearestHit { zone, distance_sq });
        }
    }
    best
}

impl ZoneIndex {
    /// Zone whose center is closest to the ground point at `lat_deg`/`lon_deg`.
    ///
    /// Distance is straight-line through the ellipsoid rather than geodesic;
    /// only the ranking matters. Zones without a center never match. Ties go
    /// to the lowest zone id.
    pub fn find_nearest(&self, lat_deg: f64, lon_deg: f64) -> Option<ZoneId> {
        let target = lon_lat_deg_to_ecef(lon_deg, lat_deg, 0.0);
        let hit = nearest_center(self.centers(), target)?;
        debug!(
            zone = %hit.zone,
            distance_sq = hit.distance_sq,
            lat_deg,
            lon_deg,
            "nearest zone resolved"
        );
        Some(hit.zone)
    }
}
