//! End-to-end reconstruction on a rendered synthetic swing.

mod common;

use std::sync::{Arc, Mutex};

use balltrace_flight::{
    CancellationToken, FlightError, PipelineConfig, ProgressCallback, ScanMode, ShotPipeline,
};
use balltrace_models::{LandingMethod, ShotType, SpectralFeatures, StrikeEvent, TrajectoryMethod};
use common::{range_audio, BrightBallDetector, GolferDetector, RangeVideo, DURATION, STRIKE_TIME};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn pipeline(video: RangeVideo, golfer: bool) -> ShotPipeline {
    ShotPipeline::new(
        PipelineConfig::default(),
        Arc::new(video),
        Arc::new(GolferDetector { present: golfer }),
        Arc::new(BrightBallDetector),
    )
    .unwrap()
}

/// One audio strike (plus a weaker echo) yields one complete shot.
#[test]
fn test_single_strike_full_parabola() {
    init_tracing();
    let pipeline = pipeline(RangeVideo::new(), true);
    let strikes = vec![
        StrikeEvent::at(STRIKE_TIME, 0.95),
        StrikeEvent::at(STRIKE_TIME + 0.4, 0.5),
    ];

    let analysis = pipeline
        .process_video(Some(&strikes), None, &CancellationToken::never())
        .unwrap();

    assert_eq!(analysis.mode, ScanMode::Audio);
    assert!(analysis.failures.is_empty(), "{:?}", analysis.failures);
    assert_eq!(analysis.shots.len(), 1);

    let result = &analysis.shots[0];
    let shot = &result.shot;
    assert!((shot.strike_time - STRIKE_TIME).abs() < 1e-9);
    assert!(shot.confidence > 0.5, "confidence {}", shot.confidence);
    assert!(shot.origin.is_some());
    assert_eq!(shot.confidence_reasons.len(), 4);

    let payload = result.payload.as_ref().expect("trajectory payload");
    let trajectory = &payload.trajectory;
    assert_eq!(trajectory.method(), TrajectoryMethod::KalmanRefined);
    assert!(trajectory.apex_index() > 0);
    assert!(trajectory.apex_index() < trajectory.len() - 1);
    // Apex of the rendered flight is one second after impact
    assert!((trajectory.apex().timestamp - (STRIKE_TIME + 1.0)).abs() < 0.2);
    assert!(payload.spline.is_some());

    assert_eq!(shot.shot_type, ShotType::FullSwing);
    assert!(shot.landing_time.unwrap() > STRIKE_TIME + 1.0);
    assert!((shot.clip_start - (STRIKE_TIME - 2.0)).abs() < 1e-9);
    assert!(shot.clip_end > shot.landing_time.unwrap());
    assert!(shot.clip_end <= DURATION);
    assert!(result.launch.is_some());
}

/// An attached audio track puts the landing on the thud after the strike.
#[test]
fn test_audio_thud_sets_landing() {
    init_tracing();
    let landing = STRIKE_TIME + 3.0;
    let pipeline = pipeline(RangeVideo::new(), true).with_audio(range_audio(landing));
    let strike = StrikeEvent::new(
        STRIKE_TIME,
        0.95,
        SpectralFeatures {
            spectral_centroid_hz: 3000.0,
            onset_strength: 1.0,
            peak_amplitude: 0.9,
        },
    );

    let analysis = pipeline
        .process_video(Some(&[strike]), None, &CancellationToken::never())
        .unwrap();

    assert!(analysis.failures.is_empty(), "{:?}", analysis.failures);
    let shot = &analysis.shots[0].shot;
    let estimate = shot.landing.expect("landing estimate");
    assert_eq!(estimate.method, LandingMethod::Audio);
    assert!((estimate.timestamp - (landing + 0.05)).abs() < 0.1, "t = {}", estimate.timestamp);
    assert_eq!(shot.landing_time, Some(estimate.timestamp));
    assert!(shot.clip_end >= estimate.timestamp);
}

/// Progress stays within [0, 100], never decreases and ends at 100.
#[test]
fn test_progress_is_monotonic() {
    let pipeline = pipeline(RangeVideo::new(), true);
    let events = Arc::new(Mutex::new(Vec::<(String, f64)>::new()));
    let sink = events.clone();
    let callback: ProgressCallback = Arc::new(move |step: &str, percent: f64| {
        sink.lock().unwrap().push((step.to_string(), percent));
    });

    pipeline
        .process_video(
            Some(&[StrikeEvent::at(STRIKE_TIME, 0.9)]),
            Some(callback),
            &CancellationToken::never(),
        )
        .unwrap();

    let events = events.lock().unwrap();
    assert!(!events.is_empty());
    assert!(events.windows(2).all(|w| w[1].1 >= w[0].1));
    assert!(events.iter().all(|(_, p)| (0.0..=100.0).contains(p)));
    assert_eq!(events.last().unwrap().1, 100.0);
    assert!(events.iter().any(|(s, _)| s == "tracking_early_flight"));
}

/// A cancelled token aborts the whole video.
#[test]
fn test_cancelled_before_start() {
    let pipeline = pipeline(RangeVideo::new(), true);
    let (handle, token) = CancellationToken::new();
    handle.cancel();

    let err = pipeline
        .process_video(Some(&[StrikeEvent::at(STRIKE_TIME, 0.9)]), None, &token)
        .unwrap_err();

    assert!(matches!(err, FlightError::Cancelled));
    assert!(!err.is_retryable());
}

/// Without audio strikes the swing is found visually.
#[test]
fn test_visual_only_mode() {
    init_tracing();
    let pipeline = pipeline(RangeVideo::with_swing(), true);

    let analysis = pipeline
        .process_video(None, None, &CancellationToken::never())
        .unwrap();

    assert_eq!(analysis.mode, ScanMode::VisualOnly);
    assert_eq!(analysis.shots.len(), 1);
    let shot = &analysis.shots[0].shot;
    assert!((shot.strike_time - STRIKE_TIME).abs() < 0.3, "strike at {}", shot.strike_time);
    assert!(shot.audio_confidence <= 0.6);
}

/// No flight anywhere after the strike still yields a physics tracer from
/// the origin.
#[test]
fn test_unseen_flight_uses_default_physics() {
    init_tracing();
    let pipeline = pipeline(RangeVideo::without_launch(), true);

    let analysis = pipeline
        .process_video(
            Some(&[StrikeEvent::at(STRIKE_TIME, 0.9)]),
            None,
            &CancellationToken::never(),
        )
        .unwrap();

    assert!(analysis.failures.is_empty(), "{:?}", analysis.failures);
    let result = &analysis.shots[0];
    let origin = result.shot.origin.expect("origin at address");
    assert!(result.launch.is_some());

    let payload = result.payload.as_ref().expect("physics payload");
    assert_eq!(payload.trajectory.method(), TrajectoryMethod::PhysicsExtrapolated);
    let first = &payload.trajectory.points()[0];
    assert!((first.timestamp - STRIKE_TIME).abs() < 0.05);
    assert!((first.x * common::WIDTH as f64 - origin.x).abs() < 2.0);
    assert!(result
        .shot
        .confidence_reasons
        .iter()
        .all(|r| !r.contains("no trajectory")));
}

/// A missing golfer still produces a record carrying the strike confidence.
#[test]
fn test_origin_failure_records_audio_only_shot() {
    let pipeline = pipeline(RangeVideo::new(), false);

    let analysis = pipeline
        .process_video(
            Some(&[StrikeEvent::at(STRIKE_TIME, 0.8)]),
            None,
            &CancellationToken::never(),
        )
        .unwrap();

    let shot = &analysis.shots[0].shot;
    assert!(shot.origin.is_none());
    assert!(!shot.has_trajectory());
    assert_eq!(shot.confidence, 0.8);
    assert!(shot
        .confidence_reasons
        .iter()
        .any(|r| r.contains("golfer_not_detected")));
    assert!(analysis.shots[0].payload.is_none());
}

/// A strike outside the video fails that shot only.
#[test]
fn test_bad_strike_is_isolated() {
    let pipeline = pipeline(RangeVideo::new(), true);
    let strikes = vec![StrikeEvent::at(STRIKE_TIME, 0.9), StrikeEvent::at(DURATION + 30.0, 0.9)];

    let analysis = pipeline
        .process_video(Some(&strikes), None, &CancellationToken::never())
        .unwrap();

    assert_eq!(analysis.shots.len(), 1);
    assert_eq!(analysis.failures.len(), 1);
    let failure = &analysis.failures[0];
    assert_eq!(failure.stage, Some("extracting"));
    assert!(!failure.retryable);
}

/// Sequential and parallel processing agree.
#[test]
fn test_sequential_matches_parallel() {
    let config = PipelineConfig {
        parallel_shots: false,
        ..PipelineConfig::default()
    };
    let sequential = ShotPipeline::new(
        config,
        Arc::new(RangeVideo::new()),
        Arc::new(GolferDetector { present: true }),
        Arc::new(BrightBallDetector),
    )
    .unwrap();
    let strikes = [StrikeEvent::at(STRIKE_TIME, 0.9)];

    let a = sequential
        .process_video(Some(&strikes), None, &CancellationToken::never())
        .unwrap();
    let b = pipeline(RangeVideo::new(), true)
        .process_video(Some(&strikes), None, &CancellationToken::never())
        .unwrap();

    assert_eq!(a.shots.len(), b.shots.len());
    assert_eq!(a.shots[0].shot.confidence, b.shots[0].shot.confidence);
    assert_eq!(
        a.shots[0].payload.as_ref().map(|p| p.trajectory.len()),
        b.shots[0].payload.as_ref().map(|p| p.trajectory.len())
    );
}
