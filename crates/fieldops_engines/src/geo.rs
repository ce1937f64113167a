#![forbid(unsafe_code)]

use fieldops_kernel_contracts::site::{GeoPoint, Site};
use serde::Serialize;
use tracing::debug;

/// Mean Earth radius used by the spherical approximation.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Arrival check radius. Evidence checks use a wider fence, see
/// [`crate::evidence::DEFAULT_EVIDENCE_GEOFENCE_RADIUS_M`].
pub const DEFAULT_GEOFENCE_RADIUS_M: f64 = 200.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeofenceConfig {
    pub arrival_radius_m: f64,
    pub evidence_radius_m: f64,
}

impl GeofenceConfig {
    pub fn mvp_v1() -> Self {
        Self {
            arrival_radius_m: DEFAULT_GEOFENCE_RADIUS_M,
            evidence_radius_m: crate::evidence::DEFAULT_EVIDENCE_GEOFENCE_RADIUS_M,
        }
    }
}

/// Great-circle distance in meters (haversine).
pub fn distance_meters(p1: GeoPoint, p2: GeoPoint) -> f64 {
    let lat1 = p1.lat.to_radians();
    let lat2 = p2.lat.to_radians();
    let d_lat = (p2.lat - p1.lat).to_radians();
    let d_lng = (p2.lng - p1.lng).to_radians();

    let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    // Rounding can push `a` marginally past 1 for antipodal points.
    let c = 2.0 * a.clamp(0.0, 1.0).sqrt().asin();

    EARTH_RADIUS_M * c
}

/// Inclusive: a point exactly `radius_m` away is inside.
pub fn is_inside_geofence(point: GeoPoint, site: &Site, radius_m: f64) -> bool {
    distance_meters(point, site.center) <= radius_m
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ArrivalCheck {
    pub inside: bool,
    pub distance_m: f64,
    pub radius_m: f64,
}

/// Checks a technician's reported position against the site's arrival fence.
pub fn check_arrival(point: GeoPoint, site: &Site, config: &GeofenceConfig) -> ArrivalCheck {
    let distance_m = distance_meters(point, site.center);
    let inside = distance_m <= config.arrival_radius_m;
    debug!(
        site_id = %site.id,
        distance_m,
        radius_m = config.arrival_radius_m,
        inside,
        "arrival geofence evaluated"
    );
    ArrivalCheck {
        inside,
        distance_m,
        radius_m: config.arrival_radius_m,
    }
}
