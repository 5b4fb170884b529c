//! Angular arithmetic and the heading-offset resolver.
//!
//! Everything in this module is pure. The calibration flow, the compass
//! dial smoothing, and the per-frame camera heading are all built on these
//! folds, so none of them may ever produce a visible discontinuity jump.

/// Folds `value` into `[lo, hi)` by repeatedly adding or subtracting the span.
pub fn normalize_deg(value: f64, lo: f64, hi: f64) -> f64 {
    let span = hi - lo;
    let mut v = value;
    while v < lo {
        v += span;
    }
    while v >= hi {
        v -= span;
    }
    v
}

/// Wraps a heading into `[0, 360)`.
pub fn wrap_deg(value: f64) -> f64 {
    normalize_deg(value, 0.0, 360.0)
}

/// Folds an angular difference into `(-180, 180]`.
///
/// This is the shorter-path convention: a step through this fold never
/// represents more than half a turn of apparent motion.
pub fn signed_delta_deg(value: f64) -> f64 {
    let mut v = value;
    while v <= -180.0 {
        v += 360.0;
    }
    while v > 180.0 {
        v -= 360.0;
    }
    v
}

/// Resolves the one-shot heading offset at the auto-calibration instant.
///
/// `compass_heading_deg` and `device_alpha_deg` are captured from the same
/// sample at the moment calibration completes; `manual_offset_deg` is any
/// user adjustment carried into the auto path. The live scene heading is
/// thereafter `(alpha + offset) mod 360` every frame: alpha updates faster
/// and more smoothly than the compass-corrected heading, while the offset
/// anchors it to the true heading captured here.
pub fn resolve_heading_offset(
    compass_heading_deg: f64,
    manual_offset_deg: f64,
    device_alpha_deg: f64,
) -> f64 {
    normalize_deg(
        compass_heading_deg + manual_offset_deg - device_alpha_deg,
        0.0,
        360.0,
    )
}

/// Live per-frame scene heading from the raw device azimuth and the
/// session's locked offset.
pub fn scene_heading_deg(device_alpha_deg: f64, offset_deg: f64) -> f64 {
    wrap_deg(device_alpha_deg + offset_deg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_folds_into_range() {
        assert!((normalize_deg(362.3, 0.0, 360.0) - 2.3).abs() < 1e-9);
        assert_eq!(normalize_deg(-10.0, 0.0, 360.0), 350.0);
        assert_eq!(normalize_deg(725.0, 0.0, 360.0), 5.0);
        assert_eq!(normalize_deg(0.0, 0.0, 360.0), 0.0);
        // hi is exclusive
        assert_eq!(normalize_deg(360.0, 0.0, 360.0), 0.0);
    }

    #[test]
    fn signed_delta_takes_shorter_path() {
        assert_eq!(signed_delta_deg(20.0), 20.0);
        assert_eq!(signed_delta_deg(-340.0), 20.0);
        assert_eq!(signed_delta_deg(340.0), -20.0);
        // boundary convention: 180 stays, -180 folds up
        assert_eq!(signed_delta_deg(180.0), 180.0);
        assert_eq!(signed_delta_deg(-180.0), 180.0);
    }

    #[test]
    fn resolver_matches_reference_cases() {
        assert_eq!(resolve_heading_offset(100.0, 10.0, 80.0), 30.0);
        assert_eq!(resolve_heading_offset(10.0, 0.0, 350.0), 20.0);
    }

    #[test]
    fn live_heading_wraps() {
        assert_eq!(scene_heading_deg(350.0, 30.0), 20.0);
        assert_eq!(scene_heading_deg(0.0, 0.0), 0.0);
    }
}
