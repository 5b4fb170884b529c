//! Device-motion consumption. The core only consumes the output shape.

use instant::Instant;

/// One device-motion sample.
#[derive(Debug, Clone, Copy)]
pub struct MotionSample {
    /// Linear acceleration, m/s², device axes.
    pub acceleration: [f64; 3],
    /// Platform-reported delivery interval, milliseconds.
    pub interval_ms: f64,
    pub timestamp: Instant,
}

/// Cache-only motion sink; nothing in the core subscribes to motion yet.
#[derive(Default)]
pub struct MotionService {
    last_sample: Option<MotionSample>,
}

impl MotionService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_sample(&mut self, sample: MotionSample) {
        self.last_sample = Some(sample);
    }

    pub fn last_sample(&self) -> Option<MotionSample> {
        self.last_sample
    }
}
