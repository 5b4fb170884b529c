//! GPS fix consumption.
//!
//! Fix acquisition lives outside the core; this service only normalizes
//! the output shape, caches the latest fix, and fans fixes out with the
//! same per-subscriber isolation the orientation path uses.

use instant::Instant;
use tracing::warn;

/// One GPS fix as delivered by the platform location API.
#[derive(Debug, Clone, Copy)]
pub struct GpsFix {
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: Instant,
}

/// Identity of one registered fix subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixToken(u64);

type FixCallback = Box<dyn FnMut(&GpsFix) -> anyhow::Result<()> + Send>;

#[derive(Default)]
pub struct LocationService {
    subscribers: Vec<(FixToken, FixCallback)>,
    next_token: u64,
    last_fix: Option<GpsFix>,
}

impl LocationService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, callback: F) -> FixToken
    where
        F: FnMut(&GpsFix) -> anyhow::Result<()> + Send + 'static,
    {
        self.next_token += 1;
        let token = FixToken(self.next_token);
        self.subscribers.push((token, Box::new(callback)));
        token
    }

    pub fn unsubscribe(&mut self, token: FixToken) {
        self.subscribers.retain(|(t, _)| *t != token);
    }

    /// Entry point for the platform edge. Caches the fix before fan-out;
    /// a failing subscriber never blocks the rest.
    pub fn push_fix(&mut self, fix: GpsFix) {
        self.last_fix = Some(fix);
        for (token, callback) in &mut self.subscribers {
            if let Err(err) = callback(&fix) {
                warn!(token = token.0, "location subscriber failed: {err:#}");
            }
        }
    }

    /// Most recent fix, queryable without subscribing.
    pub fn last_fix(&self) -> Option<GpsFix> {
        self.last_fix
    }
}
