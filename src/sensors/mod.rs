//! Process-wide sensor lifecycle.
//!
//! One [`SensorManager`] is constructed at application start and threaded
//! through the call graph; there is no global singleton. It owns one
//! instance of each leaf sensor service for the lifetime of the app.

pub mod location;
pub mod motion;

use tracing::info;

use crate::config::SensorConfig;
use crate::error::{SensorError, SensorResult};
use crate::orientation::OrientationService;
use crate::platform::OrientationSource;
use location::LocationService;
use motion::MotionService;

/// Owner of the leaf sensor services.
///
/// Exactly one calibration session is assumed live at a time; that holds
/// because one manager owns one orientation service and the session is
/// held by its UI owner, never shared.
pub struct SensorManager {
    services: Option<Services>,
}

struct Services {
    orientation: OrientationService,
    location: LocationService,
    motion: MotionService,
}

impl SensorManager {
    pub fn new(source: Box<dyn OrientationSource>, config: &SensorConfig) -> Self {
        Self {
            services: Some(Services {
                orientation: OrientationService::new(source, config.magnetic_declination_deg),
                location: LocationService::new(),
                motion: MotionService::new(),
            }),
        }
    }

    pub fn orientation(&mut self) -> SensorResult<&mut OrientationService> {
        self.services
            .as_mut()
            .map(|s| &mut s.orientation)
            .ok_or(SensorError::ShutDown)
    }

    pub fn location(&mut self) -> SensorResult<&mut LocationService> {
        self.services
            .as_mut()
            .map(|s| &mut s.location)
            .ok_or(SensorError::ShutDown)
    }

    pub fn motion(&mut self) -> SensorResult<&mut MotionService> {
        self.services
            .as_mut()
            .map(|s| &mut s.motion)
            .ok_or(SensorError::ShutDown)
    }

    /// Disposes every service. Accessors fail fast afterwards; a disposed
    /// manager is never resurrected, construct a new one instead.
    pub fn shutdown(&mut self) {
        if let Some(mut services) = self.services.take() {
            services.orientation.unsubscribe_all();
            info!("sensor manager shut down");
        }
    }

    pub fn is_shut_down(&self) -> bool {
        self.services.is_none()
    }
}
