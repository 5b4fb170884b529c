//! TerraLens Core Library
//!
//! Core sensing and registration subsystem for the TerraLens historical
//! terrain viewer: device-orientation plumbing, the interactive heading
//! calibration flow, and the geographic ↔ scene-frame registration that
//! keeps the 2D map and the 3D reconstruction aligned.
//!
//! Presentation, model loading, map tiles and GPS acquisition live in the
//! host application; this crate exposes the interfaces they consume.

pub mod calibration;
pub mod config;
pub mod error;
pub mod geo;
pub mod heading;
pub mod orientation;
pub mod platform;
pub mod sensors;

// Re-export commonly used types
pub use calibration::{CalibrationConfig, CalibrationSession, CalibrationStep};
pub use config::{AppConfig, SensorConfig};
pub use error::{AnchorError, ConfigError, SensorError, SensorResult};
pub use geo::{CoordinateConverter, GeoPoint, SceneAnchor, EARTH_RADIUS_M};
pub use heading::{resolve_heading_offset, scene_heading_deg};
pub use orientation::{
    has_significant_change, is_device_flat, OrientationSample, OrientationService, SampleHandle,
    SubscriptionToken,
};
pub use platform::{
    OrientationSource, PermissionStatus, PlatformCapabilities, ScriptHandle,
    ScriptedOrientationSource,
};
pub use sensors::{location::GpsFix, SensorManager};
