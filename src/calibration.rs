//! Interactive heading-calibration state machine.
//!
//! One session runs per calibration panel: the user holds the device flat
//! until the stability window fills, or drops into the manual step and
//! dials an offset by hand. The session emits exactly one completion per
//! lifetime, and a cancel supersedes any completion still pending.

use instant::Instant;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::heading::signed_delta_deg;
use crate::orientation::{is_device_flat, OrientationSample};

/// Tilt threshold while calibrating, stricter than the generic query.
pub const CALIBRATION_FLAT_THRESHOLD_DEG: f64 = 5.0;

/// Continuous-flat duration required before auto completion, milliseconds.
pub const STABILITY_WINDOW_MS: f64 = 1500.0;

/// Manual slider bound, integer degrees either side of zero.
pub const MANUAL_RANGE_DEG: i32 = 180;

/// Tunables for one calibration session.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Tilt threshold for the horizontal step, degrees.
    pub flat_threshold_deg: f64,
    /// Continuous-flat duration required for auto completion, ms.
    pub stability_window_ms: f64,
    /// Manual slider bound, integer degrees either side of zero.
    pub manual_range_deg: i32,
    /// Whether the manual-adjustment step is reachable at all.
    pub allow_manual: bool,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            flat_threshold_deg: CALIBRATION_FLAT_THRESHOLD_DEG,
            stability_window_ms: STABILITY_WINDOW_MS,
            manual_range_deg: MANUAL_RANGE_DEG,
            allow_manual: true,
        }
    }
}

/// Calibration flow step. `Horizontal` is initial, `Complete` terminal;
/// `Manual` is optional and user-reversible back to `Horizontal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationStep {
    Horizontal,
    Manual,
    Complete,
}

type CompleteCallback = Box<dyn FnOnce(f64) + Send>;
type CloseCallback = Box<dyn FnOnce() + Send>;

/// One interactive calibration session.
///
/// Created when the calibration panel opens and dropped on completion or
/// cancel. Exactly one session is live at a time; the owner feeds it
/// orientation samples and the matching compass headings.
pub struct CalibrationSession {
    config: CalibrationConfig,
    step: CalibrationStep,
    manual_offset_deg: i32,
    stability_ms: f64,
    display_heading_deg: f64,
    last_eval: Option<Instant>,
    on_complete: Option<CompleteCallback>,
    on_close: Option<CloseCallback>,
}

impl CalibrationSession {
    pub fn new(config: CalibrationConfig) -> Self {
        Self {
            config,
            step: CalibrationStep::Horizontal,
            manual_offset_deg: 0,
            stability_ms: 0.0,
            display_heading_deg: 0.0,
            last_eval: None,
            on_complete: None,
            on_close: None,
        }
    }

    /// Registers the completion callback. The auto path passes offset `0`
    /// (resolved against the compass one level up); the manual path passes
    /// the raw slider value.
    pub fn on_complete<F>(mut self, f: F) -> Self
    where
        F: FnOnce(f64) + Send + 'static,
    {
        self.on_complete = Some(Box::new(f));
        self
    }

    /// Registers the cancel callback. Fires at most once; no offset is
    /// emitted after it.
    pub fn on_close<F>(mut self, f: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        self.on_close = Some(Box::new(f));
        self
    }

    pub fn step(&self) -> CalibrationStep {
        self.step
    }

    pub fn manual_offset_deg(&self) -> i32 {
        self.manual_offset_deg
    }

    /// Cumulative compass-dial rotation. Never taken mod 360; the rendered
    /// rotation must not snap when the heading crosses the 0°/360° boundary.
    pub fn display_heading_deg(&self) -> f64 {
        self.display_heading_deg
    }

    /// Completion progress of the horizontal step, `0..=100`.
    pub fn progress(&self) -> f64 {
        (100.0 * self.stability_ms / self.config.stability_window_ms).min(100.0)
    }

    /// Feeds one orientation sample through the horizontal-step protocol.
    ///
    /// `now` comes from the caller, which keeps the hysteresis clock
    /// injectable in tests. `compass_heading` is the service-corrected
    /// heading for the same sample, `None` while alpha is unknown.
    pub fn handle_sample(
        &mut self,
        sample: &OrientationSample,
        compass_heading: Option<f64>,
        now: Instant,
    ) {
        if self.step != CalibrationStep::Horizontal {
            return;
        }

        let dt_ms = match self.last_eval.replace(now) {
            Some(prev) => now.duration_since(prev).as_secs_f64() * 1000.0,
            None => 0.0,
        };

        // Dial smoothing runs on every known heading, independent of the
        // stability protocol. The dial rotates opposite to the device and
        // always takes the shorter angular path.
        if let Some(heading) = compass_heading {
            let target = -heading;
            let delta = signed_delta_deg(target - self.display_heading_deg);
            self.display_heading_deg += delta;
        }

        if is_device_flat(sample, self.config.flat_threshold_deg) {
            self.stability_ms = (self.stability_ms + dt_ms).min(self.config.stability_window_ms);
        } else {
            // An unknown tilt counts as not flat, so a sensor dropout
            // drains progress instead of freezing it.
            self.stability_ms = (self.stability_ms - dt_ms).max(0.0);
        }

        if self.stability_ms >= self.config.stability_window_ms {
            self.manual_offset_deg = 0;
            self.complete(0.0);
        }
    }

    /// Enters the manual-adjustment step. Resets stability tracking; the
    /// slider keeps whatever value it had from a previous visit.
    pub fn enter_manual(&mut self) -> bool {
        if self.step != CalibrationStep::Horizontal || !self.config.allow_manual {
            return false;
        }
        self.step = CalibrationStep::Manual;
        self.stability_ms = 0.0;
        self.last_eval = None;
        debug!("calibration entered manual step");
        true
    }

    /// Returns from manual to horizontal. The slider value is kept.
    pub fn cancel_manual(&mut self) -> bool {
        if self.step != CalibrationStep::Manual {
            return false;
        }
        self.step = CalibrationStep::Horizontal;
        self.last_eval = None;
        debug!("calibration returned to horizontal step");
        true
    }

    /// Clamps and stores the slider value, integer degrees within the
    /// configured range.
    pub fn set_manual_offset(&mut self, degrees: i32) {
        self.manual_offset_deg =
            degrees.clamp(-self.config.manual_range_deg, self.config.manual_range_deg);
    }

    pub fn reset_manual_offset(&mut self) {
        self.manual_offset_deg = 0;
    }

    /// Confirms the manual step: completes with the raw slider value as
    /// pure camera rotation. This value is deliberately NOT run through
    /// the heading-offset resolver; manual mode has no trusted compass
    /// reading to resolve against.
    pub fn confirm_manual(&mut self) -> bool {
        if self.step != CalibrationStep::Manual {
            return false;
        }
        let offset = f64::from(self.manual_offset_deg);
        self.complete(offset);
        true
    }

    /// Cancels the session. Fires `on_close` at most once and drops any
    /// pending completion callback, so no offset is ever emitted after a
    /// cancel. A no-op once the session has completed.
    pub fn close(&mut self) {
        if self.step == CalibrationStep::Complete {
            return;
        }
        self.on_complete = None;
        if let Some(cb) = self.on_close.take() {
            info!("calibration session closed without an offset");
            cb();
        }
    }

    fn complete(&mut self, offset_deg: f64) {
        self.step = CalibrationStep::Complete;
        self.on_close = None;
        if let Some(cb) = self.on_complete.take() {
            info!(offset_deg, "calibration complete");
            cb(offset_deg);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat() -> OrientationSample {
        OrientationSample::new(Some(120.0), Some(1.0), Some(-1.0))
    }

    #[test]
    fn progress_tracks_accumulator() {
        let mut session = CalibrationSession::new(CalibrationConfig::default());
        let t0 = Instant::now();
        session.handle_sample(&flat(), None, t0);
        assert_eq!(session.progress(), 0.0);

        session.handle_sample(&flat(), None, t0 + std::time::Duration::from_millis(750));
        assert!((session.progress() - 50.0).abs() < 1.0);
    }

    #[test]
    fn manual_step_clamps_slider() {
        let mut session = CalibrationSession::new(CalibrationConfig::default());
        assert!(session.enter_manual());
        session.set_manual_offset(400);
        assert_eq!(session.manual_offset_deg(), 180);
        session.set_manual_offset(-400);
        assert_eq!(session.manual_offset_deg(), -180);
        session.reset_manual_offset();
        assert_eq!(session.manual_offset_deg(), 0);
    }

    #[test]
    fn manual_step_unreachable_when_disallowed() {
        let config = CalibrationConfig {
            allow_manual: false,
            ..Default::default()
        };
        let mut session = CalibrationSession::new(config);
        assert!(!session.enter_manual());
        assert_eq!(session.step(), CalibrationStep::Horizontal);
    }

    #[test]
    fn returning_to_horizontal_keeps_slider_value() {
        let mut session = CalibrationSession::new(CalibrationConfig::default());
        session.enter_manual();
        session.set_manual_offset(35);
        assert!(session.cancel_manual());
        assert_eq!(session.step(), CalibrationStep::Horizontal);
        // Only entering manual resets stability tracking; the slider value
        // survives the round trip.
        assert_eq!(session.manual_offset_deg(), 35);
    }
}
