//! Device-orientation stream normalization and compass heading.
//!
//! Wraps a platform [`OrientationSource`] behind a subscriber fan-out with
//! per-callback failure isolation, keeps the most recent sample cached for
//! query-without-subscribe consumers, and derives the compass heading,
//! relative angles, and the flatness check the calibration flow depends on.

use std::sync::Arc;

use instant::Instant;
use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::error::{SensorError, SensorResult};
use crate::heading::{signed_delta_deg, wrap_deg};
use crate::platform::{OrientationSource, PermissionStatus};

/// Default magnetic declination for the deployment region, degrees.
pub const DEFAULT_DECLINATION_DEG: f64 = 7.3;

/// Tilt threshold for the generic flatness query, degrees.
pub const FLAT_THRESHOLD_DEG: f64 = 15.0;

/// Per-angle threshold for [`has_significant_change`], degrees.
pub const SIGNIFICANT_CHANGE_DEG: f64 = 5.0;

/// One normalized sample from the platform orientation stream.
///
/// Any angle may be `None` while the sensor warms up or drops out.
/// Consumers must treat `None` as "unknown", never as zero.
#[derive(Debug, Clone, Copy)]
pub struct OrientationSample {
    /// Rotation around the vertical axis, `[0, 360)`, platform-relative.
    pub alpha: Option<f64>,
    /// Front-back tilt, `(-180, 180]`.
    pub beta: Option<f64>,
    /// Left-right tilt, `(-90, 90]`.
    pub gamma: Option<f64>,
    /// Device-supplied absolute heading, on platforms that expose one.
    pub raw_compass_heading: Option<f64>,
    /// Whether the angles are earth-referenced rather than relative.
    pub absolute: bool,
    pub timestamp: Instant,
}

impl OrientationSample {
    pub fn new(alpha: Option<f64>, beta: Option<f64>, gamma: Option<f64>) -> Self {
        Self {
            alpha,
            beta,
            gamma,
            raw_compass_heading: None,
            absolute: false,
            timestamp: Instant::now(),
        }
    }
}

/// True iff both tilt angles are known and within `threshold_deg` of level.
/// An unknown tilt angle means the device cannot be called flat.
pub fn is_device_flat(sample: &OrientationSample, threshold_deg: f64) -> bool {
    match (sample.beta, sample.gamma) {
        (Some(beta), Some(gamma)) => beta.abs() < threshold_deg && gamma.abs() < threshold_deg,
        _ => false,
    }
}

/// True if any of alpha/beta/gamma moved by more than `threshold_deg`
/// since `previous`. Missing values compare as zero.
pub fn has_significant_change(
    current: &OrientationSample,
    previous: &OrientationSample,
    threshold_deg: f64,
) -> bool {
    let moved = |cur: Option<f64>, prev: Option<f64>| {
        (cur.unwrap_or(0.0) - prev.unwrap_or(0.0)).abs() > threshold_deg
    };
    moved(current.alpha, previous.alpha)
        || moved(current.beta, previous.beta)
        || moved(current.gamma, previous.gamma)
}

/// Identity of one registered subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionToken(u64);

type OrientationCallback = Box<dyn FnMut(&OrientationSample) -> anyhow::Result<()> + Send>;

struct Subscriber {
    token: SubscriptionToken,
    callback: OrientationCallback,
}

/// Shared read handle over the last delivered sample, for per-frame
/// consumers like the 3D camera controller.
pub type SampleHandle = Arc<RwLock<Option<OrientationSample>>>;

/// Subscriber fan-out over one platform orientation listener.
///
/// The underlying listener is attached when the subscriber list becomes
/// non-empty and detached when it empties again; subscription identity is
/// an explicit token rather than callback equality.
pub struct OrientationService {
    source: Box<dyn OrientationSource>,
    permission: Option<PermissionStatus>,
    subscribers: Vec<Subscriber>,
    next_token: u64,
    last_sample: SampleHandle,
    declination_deg: f64,
}

impl OrientationService {
    pub fn new(source: Box<dyn OrientationSource>, declination_deg: f64) -> Self {
        Self {
            source,
            permission: None,
            subscribers: Vec::new(),
            next_token: 0,
            last_sample: Arc::new(RwLock::new(None)),
            declination_deg,
        }
    }

    /// Capability probe. Pure, no side effects.
    pub fn is_available(&self) -> bool {
        self.source.capabilities().has_orientation
    }

    /// One-shot permission prompt.
    ///
    /// The resolved status is cached, so repeat calls return immediately.
    /// Holding `&mut self` across the await also means a second caller
    /// cannot race a prompt that is still in flight.
    pub async fn request_permission(&mut self) -> SensorResult<PermissionStatus> {
        if !self.is_available() {
            return Err(SensorError::Unsupported);
        }
        if let Some(status) = self.permission {
            return Ok(status);
        }
        let status = self.source.request_permission().await?;
        self.permission = Some(status);
        debug!(?status, "sensor permission resolved");
        Ok(status)
    }

    /// Registers `callback` and returns its token.
    ///
    /// Requires a granted permission. The platform listener is attached
    /// only when the subscriber list becomes non-empty.
    pub fn subscribe<F>(&mut self, callback: F) -> SensorResult<SubscriptionToken>
    where
        F: FnMut(&OrientationSample) -> anyhow::Result<()> + Send + 'static,
    {
        if !self.is_available() {
            return Err(SensorError::Unsupported);
        }
        if self.permission != Some(PermissionStatus::Granted) {
            return Err(SensorError::PermissionDenied);
        }
        if self.subscribers.is_empty() {
            self.source.start()?;
            debug!("platform orientation listener attached");
        }
        self.next_token += 1;
        let token = SubscriptionToken(self.next_token);
        self.subscribers.push(Subscriber {
            token,
            callback: Box::new(callback),
        });
        Ok(token)
    }

    /// Removes one subscriber. The platform listener detaches when the
    /// list becomes empty.
    pub fn unsubscribe(&mut self, token: SubscriptionToken) {
        let before = self.subscribers.len();
        self.subscribers.retain(|s| s.token != token);
        if before > 0 && self.subscribers.is_empty() {
            self.source.stop();
            debug!("platform orientation listener detached");
        }
    }

    /// Removes every subscriber and detaches the listener.
    pub fn unsubscribe_all(&mut self) {
        if !self.subscribers.is_empty() {
            self.subscribers.clear();
            self.source.stop();
            debug!("platform orientation listener detached");
        }
    }

    /// Drains pending platform events and fans each one out to subscribers
    /// in registration order. Returns the number of events delivered.
    ///
    /// The cached last-known sample is updated before each fan-out begins.
    /// A failing callback is logged; it never aborts delivery to the
    /// subscribers after it.
    pub fn pump(&mut self) -> usize {
        let events = self.source.poll();
        let delivered = events.len();
        for sample in events {
            *self.last_sample.write() = Some(sample);
            for sub in &mut self.subscribers {
                if let Err(err) = (sub.callback)(&sample) {
                    warn!(token = sub.token.0, "orientation subscriber failed: {err:#}");
                }
            }
        }
        delivered
    }

    /// Most recent delivered sample, queryable without subscribing.
    pub fn last_sample(&self) -> Option<OrientationSample> {
        *self.last_sample.read()
    }

    /// Shared handle over the cached sample for per-frame readers.
    pub fn sample_handle(&self) -> SampleHandle {
        Arc::clone(&self.last_sample)
    }

    /// Compass heading for `sample`: alpha corrected by the regional
    /// magnetic declination, wrapped to `[0, 360)`. `None` while alpha is
    /// unknown.
    pub fn compass_heading(&self, sample: &OrientationSample) -> Option<f64> {
        sample
            .alpha
            .map(|alpha| wrap_deg(alpha + self.declination_deg))
    }

    /// Signed difference between the sample's compass heading and
    /// `target_deg`, folded into `(-180, 180]`. Positive means the target
    /// lies clockwise of the current heading.
    pub fn relative_angle(&self, sample: &OrientationSample, target_deg: f64) -> Option<f64> {
        self.compass_heading(sample)
            .map(|heading| signed_delta_deg(target_deg - heading))
    }

    pub fn declination_deg(&self) -> f64 {
        self.declination_deg
    }
}
