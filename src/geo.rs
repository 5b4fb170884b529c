//! Geographic ↔ scene-frame registration.
//!
//! A local tangent-plane (equirectangular) approximation around the scene
//! anchor, valid for the few-kilometre extents the terrain models cover.
//! The map overlay uses it to draw the reconstruction's footprint; the 3D
//! side uses the inverse to place geographic features in the scene.

use std::path::Path;

use glam::DVec3;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::AnchorError;

/// Mean spherical Earth radius, metres.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A geographic coordinate. Latitude and longitude in degrees, altitude in
/// metres above the reference ellipsoid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub altitude: f64,
}

/// Static registration between a geographic origin and the 3D scene frame.
///
/// Created at model-configuration time, usually from the terrain model's
/// JSON sidecar, and never mutated after the model loads.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SceneAnchor {
    /// Geographic location of the scene origin.
    pub origin: GeoPoint,
    /// Scene units per metre.
    pub scale_factor: f64,
    /// Scene-space offset of the geographic origin.
    pub center_offset: DVec3,
    /// Radius around the origin, in metres, inside which the tangent-plane
    /// approximation holds to registration accuracy.
    pub usable_radius_m: f64,
}

impl SceneAnchor {
    /// Loads and validates the anchor from the terrain model's sidecar.
    pub fn from_json_file(path: &Path) -> Result<Self, AnchorError> {
        let raw = std::fs::read_to_string(path)?;
        let anchor: SceneAnchor = serde_json::from_str(&raw)?;
        anchor.validate()?;
        Ok(anchor)
    }

    fn validate(&self) -> Result<(), AnchorError> {
        if !self.scale_factor.is_finite() || self.scale_factor <= 0.0 {
            return Err(AnchorError::Invalid(format!(
                "scale factor must be positive, got {}",
                self.scale_factor
            )));
        }
        if self.origin.latitude.abs() > 89.0 {
            return Err(AnchorError::Invalid(
                "anchor is too close to a pole for a tangent-plane model".into(),
            ));
        }
        Ok(())
    }
}

/// Bidirectional converter between scene space and geographic coordinates.
pub struct CoordinateConverter {
    anchor: SceneAnchor,
}

impl CoordinateConverter {
    pub fn new(anchor: SceneAnchor) -> Self {
        Self { anchor }
    }

    pub fn anchor(&self) -> &SceneAnchor {
        &self.anchor
    }

    /// Projects a scene-space point to geographic coordinates.
    ///
    /// `y`/altitude is not part of the projection; the terrain acts as a
    /// flat registration plane between the map and the 3D model.
    pub fn world_to_gps(&self, point: DVec3) -> GeoPoint {
        let a = &self.anchor;
        let dx_m = (point.x - a.center_offset.x) / a.scale_factor;
        let dz_m = (point.z - a.center_offset.z) / a.scale_factor;
        self.check_range(dx_m, dz_m);

        let lat0 = a.origin.latitude.to_radians();
        GeoPoint {
            latitude: a.origin.latitude + (dz_m / EARTH_RADIUS_M).to_degrees(),
            longitude: a.origin.longitude + (dx_m / (EARTH_RADIUS_M * lat0.cos())).to_degrees(),
            altitude: a.origin.altitude,
        }
    }

    /// Inverse projection. Round-trips with [`Self::world_to_gps`] to
    /// within 1e-6 scene units inside the anchor's usable radius. The
    /// returned `y` is always zero.
    pub fn gps_to_world(&self, geo: &GeoPoint) -> DVec3 {
        let a = &self.anchor;
        let lat0 = a.origin.latitude.to_radians();
        let dz_m = (geo.latitude - a.origin.latitude).to_radians() * EARTH_RADIUS_M;
        let dx_m =
            (geo.longitude - a.origin.longitude).to_radians() * EARTH_RADIUS_M * lat0.cos();
        DVec3::new(
            a.center_offset.x + dx_m * a.scale_factor,
            0.0,
            a.center_offset.z + dz_m * a.scale_factor,
        )
    }

    /// Geographic corners of the terrain's scene-space bounds, for the map
    /// overlay footprint. Corner order matches the winding the overlay
    /// renderer expects: (min,min), (max,min), (max,max), (min,max).
    pub fn footprint(&self, min: DVec3, max: DVec3) -> [GeoPoint; 4] {
        [
            self.world_to_gps(DVec3::new(min.x, 0.0, min.z)),
            self.world_to_gps(DVec3::new(max.x, 0.0, min.z)),
            self.world_to_gps(DVec3::new(max.x, 0.0, max.z)),
            self.world_to_gps(DVec3::new(min.x, 0.0, max.z)),
        ]
    }

    // The tangent-plane error grows with distance from the origin. Points
    // beyond the declared radius still convert, but the overlay owner gets
    // told instead of silently drifting off the map.
    fn check_range(&self, dx_m: f64, dz_m: f64) {
        let distance_m = (dx_m * dx_m + dz_m * dz_m).sqrt();
        if distance_m > self.anchor.usable_radius_m {
            warn!(
                distance_m,
                usable_radius_m = self.anchor.usable_radius_m,
                "scene point outside the anchor's usable radius"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anchor() -> SceneAnchor {
        SceneAnchor {
            origin: GeoPoint {
                latitude: 46.2044,
                longitude: 6.1432,
                altitude: 375.0,
            },
            scale_factor: 0.05,
            center_offset: DVec3::new(10.0, 0.0, -25.0),
            usable_radius_m: 4000.0,
        }
    }

    #[test]
    fn origin_maps_to_anchor_gps() {
        let converter = CoordinateConverter::new(anchor());
        let geo = converter.world_to_gps(DVec3::new(10.0, 0.0, -25.0));
        assert!((geo.latitude - 46.2044).abs() < 1e-12);
        assert!((geo.longitude - 6.1432).abs() < 1e-12);
    }

    #[test]
    fn north_is_positive_z() {
        let converter = CoordinateConverter::new(anchor());
        let geo = converter.world_to_gps(DVec3::new(10.0, 0.0, -25.0 + 1.0));
        assert!(geo.latitude > 46.2044);
    }

    #[test]
    fn rejects_degenerate_scale() {
        let mut bad = anchor();
        bad.scale_factor = 0.0;
        assert!(bad.validate().is_err());
    }

    #[test]
    fn rejects_polar_anchor() {
        let mut bad = anchor();
        bad.origin.latitude = 89.5;
        assert!(bad.validate().is_err());
    }
}
