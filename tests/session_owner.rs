//! End-to-end flow of one calibration session owner: pump the orientation
//! service, feed the session, resolve the offset at completion, and drive
//! the live camera heading. Mirrors what the calibration screen does.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use instant::Instant;
use terralens::{
    resolve_heading_offset, scene_heading_deg, CalibrationSession, CalibrationStep,
    OrientationSample, SensorConfig, SensorError, SensorManager, ScriptedOrientationSource,
};

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

#[tokio::test]
async fn auto_path_resolves_offset_from_the_calibration_instant() {
    let source = ScriptedOrientationSource::granted();
    let script = source.handle();
    let mut sensors = SensorManager::new(Box::new(source), &SensorConfig::default());

    let orientation = sensors.orientation().expect("manager is live");
    orientation.request_permission().await.expect("permission");
    let token = orientation.subscribe(|_| Ok(())).expect("subscribe");

    let raw_offset = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&raw_offset);
    let mut session = CalibrationSession::new(Default::default())
        .on_complete(move |offset| *sink.lock().unwrap() = Some(offset));

    // device held flat at azimuth 80° until the window fills
    let t0 = Instant::now();
    for step in 0..=5u64 {
        script.push_flat(80.0);
        orientation.pump();
        let sample = orientation.last_sample().expect("sample cached");
        let heading = orientation.compass_heading(&sample);
        session.handle_sample(&sample, heading, t0 + ms(step * 300));
    }
    assert_eq!(session.step(), CalibrationStep::Complete);
    assert_eq!(*raw_offset.lock().unwrap(), Some(0.0));

    // the owner resolves the auto offset against the cached instant
    let sample = orientation.last_sample().expect("sample cached");
    let compass = orientation.compass_heading(&sample).expect("heading known");
    let alpha = sample.alpha.expect("alpha known");
    let offset = resolve_heading_offset(compass, 0.0, alpha);

    // alpha 80° + declination 7.3° makes the offset exactly the declination
    assert!((offset - 7.3).abs() < 1e-9);

    // and the live heading equals the compass heading at that instant
    assert!((scene_heading_deg(alpha, offset) - compass).abs() < 1e-9);

    orientation.unsubscribe(token);
    sensors.shutdown();
    assert!(matches!(sensors.orientation(), Err(SensorError::ShutDown)));
}

#[tokio::test]
async fn denied_sensors_route_to_manual_only_calibration() {
    let source = ScriptedOrientationSource::denied();
    let mut sensors = SensorManager::new(Box::new(source), &SensorConfig::default());
    let orientation = sensors.orientation().expect("manager is live");
    orientation.request_permission().await.expect("permission");

    // tracking is unavailable, so the screen opens straight into manual
    assert!(matches!(
        orientation.subscribe(|_| Ok(())),
        Err(SensorError::PermissionDenied)
    ));

    let confirmed = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&confirmed);
    let mut session = CalibrationSession::new(Default::default())
        .on_complete(move |offset| *sink.lock().unwrap() = Some(offset));

    session.enter_manual();
    session.set_manual_offset(120);
    session.confirm_manual();

    // the manual value is the offset, used directly as camera rotation
    assert_eq!(*confirmed.lock().unwrap(), Some(120.0));
}

#[tokio::test]
async fn closing_the_session_discards_progress_and_emits_nothing() {
    let source = ScriptedOrientationSource::granted();
    let script = source.handle();
    let mut sensors = SensorManager::new(Box::new(source), &SensorConfig::default());
    let orientation = sensors.orientation().expect("manager is live");
    orientation.request_permission().await.expect("permission");
    let token = orientation.subscribe(|_| Ok(())).expect("subscribe");

    let outcomes = Arc::new(Mutex::new(Vec::new()));
    let complete_sink = Arc::clone(&outcomes);
    let close_sink = Arc::clone(&outcomes);
    let mut session = CalibrationSession::new(Default::default())
        .on_complete(move |offset| complete_sink.lock().unwrap().push(format!("offset {offset}")))
        .on_close(move || close_sink.lock().unwrap().push("closed".into()));

    let t0 = Instant::now();
    script.push_flat(80.0);
    orientation.pump();
    let sample = OrientationSample::new(Some(80.0), Some(0.0), Some(0.0));
    session.handle_sample(&sample, None, t0);
    session.handle_sample(&sample, None, t0 + ms(900));

    // user closes the panel mid-window: unsubscribe, then close
    orientation.unsubscribe(token);
    session.close();

    assert_eq!(*outcomes.lock().unwrap(), vec!["closed".to_string()]);
}
