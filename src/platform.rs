//! Platform seam for device-orientation input.
//!
//! Nothing else in the crate touches a platform API directly: capability
//! probing is resolved once at application start into a
//! [`PlatformCapabilities`] descriptor, and raw events arrive through the
//! [`OrientationSource`] trait. A scripted implementation ships here for
//! the diagnostic binary and the test suite.

use crossbeam_channel::{unbounded, Receiver, Sender};
use futures_lite::future::Boxed;

use crate::error::{SensorError, SensorResult};
use crate::orientation::OrientationSample;

/// Outcome of the one-shot sensor permission prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
}

/// Capability descriptor resolved once at application start and passed as
/// configuration, replacing any dynamic probing of platform globals.
#[derive(Debug, Clone, Copy)]
pub struct PlatformCapabilities {
    /// The platform delivers device-orientation events at all.
    pub has_orientation: bool,
    /// A user-facing permission prompt gates the event stream.
    pub needs_permission: bool,
    /// Samples may carry a device-supplied absolute heading.
    pub has_absolute_heading: bool,
}

impl PlatformCapabilities {
    /// A fully capable handheld platform.
    pub fn full() -> Self {
        Self {
            has_orientation: true,
            needs_permission: true,
            has_absolute_heading: true,
        }
    }

    /// A platform with no orientation API; callers fall back to
    /// manual-only calibration.
    pub fn unsupported() -> Self {
        Self {
            has_orientation: false,
            needs_permission: false,
            has_absolute_heading: false,
        }
    }
}

/// A platform-backed stream of orientation samples.
///
/// `start`/`stop` attach and detach the single underlying listener;
/// `poll` drains whatever arrived since the previous call. All methods run
/// on the one app execution context, so implementations need no internal
/// locking.
pub trait OrientationSource: Send {
    /// The startup-resolved capability descriptor for this source.
    fn capabilities(&self) -> PlatformCapabilities;

    /// One-shot permission prompt. Implementations must tolerate repeat
    /// calls; the orientation service caches the resolved status.
    fn request_permission(&mut self) -> Boxed<SensorResult<PermissionStatus>>;

    /// Attaches the platform listener.
    fn start(&mut self) -> SensorResult<()>;

    /// Detaches the platform listener. Events produced while detached are
    /// dropped, never queued for a later subscriber.
    fn stop(&mut self);

    /// Drains events delivered since the previous poll, in arrival order.
    fn poll(&mut self) -> Vec<OrientationSample>;
}

/// Scripted orientation source for the diagnostic binary and tests.
///
/// Samples are pushed through a [`ScriptHandle`] and replayed by `poll`
/// in arrival order, exactly as a platform listener would deliver them.
pub struct ScriptedOrientationSource {
    caps: PlatformCapabilities,
    permission: PermissionStatus,
    tx: Sender<OrientationSample>,
    rx: Receiver<OrientationSample>,
    started: bool,
}

impl ScriptedOrientationSource {
    pub fn new(caps: PlatformCapabilities, permission: PermissionStatus) -> Self {
        let (tx, rx) = unbounded();
        Self {
            caps,
            permission,
            tx,
            rx,
            started: false,
        }
    }

    /// A capable platform whose user accepts the permission prompt.
    pub fn granted() -> Self {
        Self::new(PlatformCapabilities::full(), PermissionStatus::Granted)
    }

    /// A capable platform whose user declines the permission prompt.
    pub fn denied() -> Self {
        Self::new(PlatformCapabilities::full(), PermissionStatus::Denied)
    }

    /// Handle for pushing scripted samples into the stream.
    pub fn handle(&self) -> ScriptHandle {
        ScriptHandle {
            tx: self.tx.clone(),
        }
    }
}

/// Cloneable writer half of a scripted source.
#[derive(Clone)]
pub struct ScriptHandle {
    tx: Sender<OrientationSample>,
}

impl ScriptHandle {
    pub fn push(&self, sample: OrientationSample) {
        let _ = self.tx.send(sample);
    }

    /// Pushes a perfectly level sample at the given azimuth.
    pub fn push_flat(&self, alpha: f64) {
        self.push(OrientationSample::new(Some(alpha), Some(0.0), Some(0.0)));
    }
}

impl OrientationSource for ScriptedOrientationSource {
    fn capabilities(&self) -> PlatformCapabilities {
        self.caps
    }

    fn request_permission(&mut self) -> Boxed<SensorResult<PermissionStatus>> {
        let caps = self.caps;
        let permission = self.permission;
        Box::pin(async move {
            if !caps.has_orientation {
                return Err(SensorError::Unsupported);
            }
            Ok(permission)
        })
    }

    fn start(&mut self) -> SensorResult<()> {
        if !self.caps.has_orientation {
            return Err(SensorError::Unsupported);
        }
        self.started = true;
        Ok(())
    }

    fn stop(&mut self) {
        self.started = false;
        // Anything scripted while detached is dropped, matching a real
        // listener that simply is not registered.
        while self.rx.try_recv().is_ok() {}
    }

    fn poll(&mut self) -> Vec<OrientationSample> {
        if !self.started {
            while self.rx.try_recv().is_ok() {}
            return Vec::new();
        }
        let mut events = Vec::with_capacity(16);
        while let Ok(sample) = self.rx.try_recv() {
            events.push(sample);
        }
        events
    }
}
