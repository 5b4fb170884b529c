//! TerraLens core diagnostic binary.
//!
//! Replays a scripted orientation stream through the full calibration
//! flow, resolves the heading offset the way the 3D scene owner does, and
//! prints the map-overlay footprint for a sample anchor. Useful for
//! checking the sensing stack without a handheld device attached.

use anyhow::{anyhow, Result};
use crossbeam_channel::bounded;
use glam::DVec3;
use instant::Instant;
use std::time::Duration;
use tracing::debug;

use terralens::{
    heading::{resolve_heading_offset, scene_heading_deg},
    AppConfig, CalibrationSession, CalibrationStep, CoordinateConverter, GeoPoint, SceneAnchor,
    ScriptedOrientationSource, SensorManager,
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    println!("🌍 TerraLens core diagnostic");

    let config = AppConfig::load(&AppConfig::default_path()).await;

    let source = ScriptedOrientationSource::granted();
    let script = source.handle();
    let mut sensors = SensorManager::new(Box::new(source), &config.sensors);

    let orientation = sensors.orientation()?;
    let status = orientation.request_permission().await?;
    println!("   sensor permission: {status:?}");

    // A logging subscriber stands in for the calibration panel's ring dial.
    let token = orientation.subscribe(|sample| {
        debug!(alpha = ?sample.alpha, "orientation event delivered");
        Ok(())
    })?;

    // The session owner wires completion through a channel, the way the
    // calibration panel hands its result back to the screen controller.
    let (tx_offset, rx_offset) = bounded::<f64>(1);
    let mut session = CalibrationSession::new(config.calibration)
        .on_complete(move |offset| {
            let _ = tx_offset.send(offset);
        })
        .on_close(|| println!("   calibration cancelled"));

    println!("   hold flat... (scripted)");

    // Scripted hand: wobbly for the first 400 ms, then settled flat until
    // the stability window fills.
    let mut t_ms: f64 = 0.0;
    while session.step() != CalibrationStep::Complete {
        let alpha = 42.0 + (t_ms / 200.0).sin();
        if t_ms < 400.0 {
            script.push(terralens::OrientationSample::new(
                Some(alpha),
                Some(32.0),
                Some(4.0),
            ));
        } else {
            script.push_flat(alpha);
        }

        orientation.pump();
        if let Some(sample) = orientation.last_sample() {
            let heading = orientation.compass_heading(&sample);
            session.handle_sample(&sample, heading, Instant::now());
        }

        tokio::time::sleep(Duration::from_millis(16)).await;
        t_ms += 16.0;
    }

    let raw_offset = rx_offset
        .try_recv()
        .map_err(|_| anyhow!("calibration completed without emitting an offset"))?;

    // Auto path: resolve the raw offset against the compass reading at the
    // calibration instant. The cached sample is exactly that instant.
    let sample = orientation
        .last_sample()
        .ok_or_else(|| anyhow!("no orientation sample cached at completion"))?;
    let compass = orientation
        .compass_heading(&sample)
        .ok_or_else(|| anyhow!("compass heading unavailable at completion"))?;
    let alpha = sample
        .alpha
        .ok_or_else(|| anyhow!("device azimuth unavailable at completion"))?;
    let offset = resolve_heading_offset(compass, raw_offset, alpha);
    println!("✅ heading offset locked: {offset:.1}°");

    // A few live frames of what the 3D camera controller consumes.
    for frame in 0..3 {
        script.push_flat(42.0 + frame as f64 * 5.0);
        orientation.pump();
        if let Some(alpha) = orientation.last_sample().and_then(|s| s.alpha) {
            println!(
                "   live scene heading: {:.1}°",
                scene_heading_deg(alpha, offset)
            );
        }
    }

    orientation.unsubscribe(token);

    // Map-overlay footprint for a sample terrain anchor.
    let anchor = SceneAnchor {
        origin: GeoPoint {
            latitude: 46.2044,
            longitude: 6.1432,
            altitude: 375.0,
        },
        scale_factor: 0.05,
        center_offset: DVec3::ZERO,
        usable_radius_m: 4000.0,
    };
    let converter = CoordinateConverter::new(anchor);
    println!("   terrain footprint:");
    for corner in converter.footprint(DVec3::new(-120.0, 0.0, -120.0), DVec3::new(120.0, 0.0, 120.0))
    {
        println!("     {:.5}°, {:.5}°", corner.latitude, corner.longitude);
    }

    sensors.shutdown();
    println!("✅ diagnostic complete");
    Ok(())
}
