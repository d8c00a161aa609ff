//! Per-strike state machine.
//!
//! Extract -> origin -> early flight -> (Kalman refine | physics
//! extrapolation | flight scan) -> landing -> assemble -> classify ->
//! emit. Each stage either hands a result to the next or takes its
//! fallback; hard errors are tagged with the stage name.

use balltrace_models::{
    AssembledTrajectory, DetectedShot, LandingEstimate, OriginPoint, ProcessingStep, ShotId,
    StrikeEvent, TrajectoryMethod, TrajectoryPayload,
};
use tracing::debug;

use super::ShotAnalysis;
use crate::assembly::{FrameDetection, TrajectoryAssembler};
use crate::cancel::CancellationToken;
use crate::config::PipelineConfig;
use crate::curve_fit::fit_trajectory;
use crate::early_flight::{EarlyFlightTracker, Track};
use crate::error::{FlightError, FlightResult};
use crate::flight_scan::FlightScanner;
use crate::landing::LandingEstimator;
use crate::logging::ShotLogger;
use crate::metrics;
use crate::origin::{OriginLocator, OriginResult};
use crate::physics::{LaunchParameters, PerspectiveCamera, ProjectileModel};
use crate::progress::{ProgressCallback, ShotProgress};
use crate::refine::KalmanRefiner;
use crate::shot_type::classify_shot_type;
use crate::source::{AudioTrack, FrameSource, ObjectDetector, VideoMetadata};

/// Flight samples handed from the tracking stages to assembly.
struct FlightSamples {
    detections: Vec<FrameDetection>,
    missed_frames: Vec<usize>,
    method: TrajectoryMethod,
}

/// Borrowed collaborators for one strike.
pub(super) struct ShotRun<'a> {
    pub config: &'a PipelineConfig,
    pub frames: &'a dyn FrameSource,
    pub person: &'a dyn ObjectDetector,
    pub ball: &'a dyn ObjectDetector,
    pub audio: Option<&'a AudioTrack>,
    pub cancel: &'a CancellationToken,
}

impl ShotRun<'_> {
    pub fn run(
        &self,
        index: usize,
        strike: &StrikeEvent,
        callback: Option<ProgressCallback>,
    ) -> FlightResult<ShotAnalysis> {
        let meta = self.frames.metadata();
        let logger = ShotLogger::new(index, strike.timestamp);
        let mut progress = ShotProgress::new(callback);

        // Extract
        self.enter(ProcessingStep::Extracting, &logger, &mut progress)?;
        self.check_strike_frame(strike.timestamp, &meta)
            .map_err(|e| e.in_stage(ProcessingStep::Extracting.as_str()))?;
        progress.step_completed(ProcessingStep::Extracting);

        // Origin
        self.enter(ProcessingStep::LocalizingOrigin, &logger, &mut progress)?;
        let origin = OriginLocator::new(self.config.origin.clone())
            .locate(self.frames, self.person, self.ball, strike.timestamp)
            .map_err(|e| e.in_stage(ProcessingStep::LocalizingOrigin.as_str()))?;
        progress.step_completed(ProcessingStep::LocalizingOrigin);

        let origin = match origin {
            OriginResult::Found(point) => {
                metrics::record_origin_result(point.method.as_str());
                point
            }
            OriginResult::NotFound(reason) => {
                metrics::record_origin_result("not_found");
                metrics::record_fallback("audio_only");
                logger.log_fallback("origin", "audio_only", reason.as_str());
                return self.emit_without_origin(strike, reason.as_str(), &meta, &logger, &mut progress);
            }
        };

        // Early flight
        self.enter(ProcessingStep::TrackingEarlyFlight, &logger, &mut progress)?;
        let track = EarlyFlightTracker::new(self.config.early_flight.clone())
            .track(self.frames, &origin, strike.timestamp)
            .map_err(|e| e.in_stage(ProcessingStep::TrackingEarlyFlight.as_str()))?;
        progress.step_completed(ProcessingStep::TrackingEarlyFlight);

        // Refine, extrapolate or scan
        self.enter(ProcessingStep::RefiningFlight, &logger, &mut progress)?;
        let (samples, launch) = self
            .reconstruct_flight(track.as_ref(), &origin, strike.timestamp, &meta, &logger)
            .map_err(|e| e.in_stage(ProcessingStep::RefiningFlight.as_str()))?;
        progress.step_completed(ProcessingStep::RefiningFlight);

        // Landing (assembly runs here so frame-exit can walk the path)
        self.enter(ProcessingStep::EstimatingLanding, &logger, &mut progress)?;
        let trajectory = match samples {
            Some(ref s) => self
                .assemble(s, &meta, &logger)
                .map_err(|e| e.in_stage(ProcessingStep::EstimatingLanding.as_str()))?,
            None => None,
        };
        let origin_norm = origin.normalized(meta.width, meta.height);
        let landing = self.estimate_landing(
            strike,
            trajectory.as_ref(),
            launch.as_ref(),
            Some(origin_norm),
        );
        progress.step_completed(ProcessingStep::EstimatingLanding);

        // Assemble payload
        self.enter(ProcessingStep::Assembling, &logger, &mut progress)?;
        let payload = trajectory.map(|t| self.payload(t, &meta, &logger));
        progress.step_completed(ProcessingStep::Assembling);

        // Classify
        self.enter(ProcessingStep::Classifying, &logger, &mut progress)?;
        let trajectory = payload.as_ref().map(|p| &p.trajectory);
        let shot_type = classify_shot_type(trajectory, Some(origin_norm.1), &self.config.shot_type);
        let shot_shape = launch.map(|l| l.shot_shape);
        progress.step_completed(ProcessingStep::Classifying);

        // Emit
        self.enter(ProcessingStep::Emitting, &logger, &mut progress)?;
        let mut confidence = strike.confidence;
        let mut reasons = vec![format!("strike confidence {:.2}", strike.confidence)];

        confidence *= origin.confidence;
        reasons.push(format!(
            "origin {:.2} via {}",
            origin.confidence,
            origin.method.as_str()
        ));

        let trajectory_confidence = trajectory.map(|t| t.avg_confidence());
        match trajectory {
            Some(t) => {
                confidence *= t.avg_confidence();
                reasons.push(format!(
                    "trajectory {:.2} ({}, {} points)",
                    t.avg_confidence(),
                    t.method().as_str(),
                    t.len()
                ));
            }
            None => {
                confidence *= self.config.missing_trajectory_penalty;
                reasons.push(format!(
                    "no trajectory, penalty {:.2}",
                    self.config.missing_trajectory_penalty
                ));
                logger.log_degraded("origin found but no trajectory reconstructed");
            }
        }
        if let Some(l) = landing {
            reasons.push(format!("landing via {} ({:.2})", l.method.as_str(), l.confidence));
        }

        let (clip_start, clip_end) =
            self.clip_bounds(strike.timestamp, landing.as_ref(), trajectory, &meta);

        let shot = DetectedShot {
            id: ShotId::new(),
            strike_time: strike.timestamp,
            landing_time: landing.map(|l| l.timestamp),
            clip_start,
            clip_end,
            confidence: confidence.clamp(0.0, 1.0),
            confidence_reasons: reasons,
            shot_type,
            shot_shape,
            audio_confidence: strike.confidence,
            origin_confidence: Some(origin.confidence),
            trajectory_confidence,
            origin: Some(origin),
            landing,
        };

        metrics::record_shot_emitted(shot_type.as_str());
        logger.log_completion(
            shot.confidence,
            shot_type.as_str(),
            trajectory.map_or(0, |t| t.len()),
        );
        progress.finish();

        Ok(ShotAnalysis {
            shot,
            payload,
            launch,
        })
    }

    /// Cancellation check, log line and progress tick at a stage boundary.
    fn enter(
        &self,
        step: ProcessingStep,
        logger: &ShotLogger,
        progress: &mut ShotProgress,
    ) -> FlightResult<()> {
        self.cancel.check()?;
        logger.log_stage(step.as_str());
        progress.step_started(step);
        Ok(())
    }

    fn check_strike_frame(&self, strike_time: f64, meta: &VideoMetadata) -> FlightResult<()> {
        if !strike_time.is_finite() || strike_time < 0.0 || strike_time > meta.duration {
            return Err(FlightError::invalid_input(format!(
                "strike at {:.3}s is outside the video (0-{:.3}s)",
                strike_time, meta.duration
            )));
        }
        if self.frames.frame_at(strike_time)?.is_none() {
            return Err(FlightError::frame_source(format!(
                "no frame decoded at strike time {:.3}s",
                strike_time
            )));
        }
        Ok(())
    }

    /// Turn the early-flight result into flight samples.
    fn reconstruct_flight(
        &self,
        track: Option<&Track>,
        origin: &OriginPoint,
        strike_time: f64,
        meta: &VideoMetadata,
        logger: &ShotLogger,
    ) -> FlightResult<(Option<FlightSamples>, Option<LaunchParameters>)> {
        let Some(track) = track else {
            return self.scan_flight(origin, strike_time, meta, logger);
        };

        let launch = self.launch_from(&track.normalized(meta.width, meta.height));
        let seed = track.detections();

        let refined = KalmanRefiner::new(&self.config.kalman, self.frames, self.ball).refine(&seed)?;
        let extension = refined.extension_len(seed.len());
        if extension >= self.config.min_refined_extension {
            debug!(seed = seed.len(), extension, "Kalman refinement extended the track");
            return Ok((
                Some(FlightSamples {
                    detections: refined.detections,
                    missed_frames: refined.missed_frames,
                    method: TrajectoryMethod::KalmanRefined,
                }),
                launch,
            ));
        }

        let Some(ref params) = launch else {
            logger.log_degraded("refinement too short and no launch parameters");
            return Ok((
                Some(FlightSamples {
                    detections: seed,
                    missed_frames: Vec::new(),
                    method: TrajectoryMethod::EarlyFlight,
                }),
                None,
            ));
        };

        metrics::record_fallback("physics");
        logger.log_fallback(
            "kalman_refine",
            "physics",
            &format!("only {} detections added", extension),
        );
        let launch_time = track.candidates().first().map_or(strike_time, |c| c.timestamp);
        let mut detections = seed;
        let extrapolated = self.extrapolate(params, launch_time, &detections, meta);
        detections.extend(extrapolated);

        Ok((
            Some(FlightSamples {
                detections,
                missed_frames: Vec::new(),
                method: TrajectoryMethod::PhysicsExtrapolated,
            }),
            launch,
        ))
    }

    /// Longer-window flight scan used when early-flight tracking failed.
    fn scan_flight(
        &self,
        origin: &OriginPoint,
        strike_time: f64,
        meta: &VideoMetadata,
        logger: &ShotLogger,
    ) -> FlightResult<(Option<FlightSamples>, Option<LaunchParameters>)> {
        metrics::record_fallback("flight_scan");
        logger.log_fallback("early_flight", "flight_scan", "no valid early-flight track");

        let segment = FlightScanner::new(self.config.flight_scan.clone()).scan(
            self.frames,
            self.ball,
            strike_time,
            Some((origin.x, origin.y)),
        )?;

        let Some(segment) = segment else {
            metrics::record_fallback("physics");
            logger.log_fallback("flight_scan", "physics", "no parabolic segment found");
            return Ok(self.default_flight(origin, strike_time, meta));
        };

        let head: Vec<(f64, f64, f64)> = segment
            .detections
            .iter()
            .take(self.config.early_flight.min_track_length.max(2) + 2)
            .map(|d| {
                (
                    meta.timestamp(d.frame_index),
                    d.x / meta.width as f64,
                    d.y / meta.height as f64,
                )
            })
            .collect();
        let launch = self.launch_from(&head);

        Ok((
            Some(FlightSamples {
                detections: segment.detections,
                missed_frames: Vec::new(),
                method: TrajectoryMethod::FlightScan,
            }),
            launch,
        ))
    }

    /// Projectile from the origin with default launch parameters.
    fn default_flight(
        &self,
        origin: &OriginPoint,
        strike_time: f64,
        meta: &VideoMetadata,
    ) -> (Option<FlightSamples>, Option<LaunchParameters>) {
        let (ox, oy) = origin.normalized(meta.width, meta.height);
        let launch = LaunchParameters::default_from_origin(ox, oy, &self.config.physics);
        let detections = self.extrapolate(&launch, strike_time, &[], meta);
        if detections.is_empty() {
            return (None, None);
        }

        (
            Some(FlightSamples {
                detections,
                missed_frames: Vec::new(),
                method: TrajectoryMethod::PhysicsExtrapolated,
            }),
            Some(launch),
        )
    }

    fn launch_from(&self, normalized: &[(f64, f64, f64)]) -> Option<LaunchParameters> {
        match LaunchParameters::from_detections(normalized, &self.config.physics) {
            Ok(launch) => Some(launch),
            Err(e) => {
                debug!(error = %e, "Launch parameters unavailable");
                None
            }
        }
    }

    /// Projectile samples after the seed, in pixels, one per frame, until
    /// the path leaves the frame.
    fn extrapolate(
        &self,
        launch: &LaunchParameters,
        launch_time: f64,
        seed: &[FrameDetection],
        meta: &VideoMetadata,
    ) -> Vec<FrameDetection> {
        let flight = ProjectileModel::new(self.config.physics.clone()).generate(launch);
        let camera = PerspectiveCamera::new(
            self.config.perspective.clone(),
            launch.origin_x,
            launch.origin_y,
        );

        let mut last_frame = seed.last().map(|d| d.frame_index);
        let last_video_frame = meta.last_frame_index();
        let mut out = Vec::new();

        for (t, sx, sy) in flight.project(&camera) {
            let frame_index = meta.frame_index(launch_time + t);
            if last_frame.is_some_and(|last| frame_index <= last) {
                continue;
            }
            if frame_index > last_video_frame || !(0.0..=1.0).contains(&sx) || !(0.0..=1.0).contains(&sy) {
                break;
            }
            out.push(FrameDetection::new(
                frame_index,
                sx * meta.width as f64,
                sy * meta.height as f64,
                self.config.physics_point_confidence,
            ));
            last_frame = Some(frame_index);
        }
        out
    }

    /// Too few points is a per-shot outcome, not an error.
    fn assemble(
        &self,
        samples: &FlightSamples,
        meta: &VideoMetadata,
        logger: &ShotLogger,
    ) -> FlightResult<Option<AssembledTrajectory>> {
        let assembler = TrajectoryAssembler::new(self.config.assembly.clone());
        match assembler.assemble(
            &samples.detections,
            &samples.missed_frames,
            meta.fps,
            meta.width,
            meta.height,
            samples.method,
        ) {
            Ok(trajectory) => Ok(Some(trajectory)),
            Err(FlightError::InsufficientPoints { required, actual }) => {
                logger.log_degraded(&format!(
                    "assembly rejected: {} of {} points",
                    actual, required
                ));
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn estimate_landing(
        &self,
        strike: &StrikeEvent,
        trajectory: Option<&AssembledTrajectory>,
        launch: Option<&LaunchParameters>,
        origin: Option<(f64, f64)>,
    ) -> Option<LandingEstimate> {
        let estimator = LandingEstimator::new(self.config.landing.clone());
        let physics = estimator.estimate_from_physics(strike.timestamp, launch, origin);

        let mut estimates = vec![physics];
        if let Some(t) = trajectory {
            estimates.extend(estimator.estimate_from_frame_exit(t));
        }
        if let Some(audio) = self.audio {
            let fallback = (physics.x, physics.y);
            let audio_estimate = estimator.estimate_from_audio(audio, strike, |ts| {
                trajectory.map_or(fallback, |t| position_at(t, ts))
            });
            estimates.extend(audio_estimate);
        }

        LandingEstimator::select_best(&estimates)
    }

    fn payload(
        &self,
        trajectory: AssembledTrajectory,
        meta: &VideoMetadata,
        logger: &ShotLogger,
    ) -> TrajectoryPayload {
        let spline = if self.config.fit_spline {
            match fit_trajectory(trajectory.points(), &self.config.curve_fit) {
                Ok(spline) => Some(spline),
                Err(e) => {
                    logger.log_degraded(&format!("spline fit failed: {}", e));
                    None
                }
            }
        } else {
            None
        };

        TrajectoryPayload {
            trajectory,
            spline,
            frame_width: meta.width,
            frame_height: meta.height,
            fps: meta.fps,
        }
    }

    /// `[strike - pre_roll, max(landing, trajectory end) + post_roll]`,
    /// clamped to the video.
    fn clip_bounds(
        &self,
        strike_time: f64,
        landing: Option<&LandingEstimate>,
        trajectory: Option<&AssembledTrajectory>,
        meta: &VideoMetadata,
    ) -> (f64, f64) {
        let start = (strike_time - self.config.pre_roll_secs).max(0.0);
        let flight_end = landing
            .map(|l| l.timestamp)
            .into_iter()
            .chain(trajectory.map(|t| t.end_time()))
            .fold(strike_time, f64::max);
        let end = (flight_end + self.config.post_roll_secs).min(meta.duration);
        (start, end.max(start))
    }

    /// Shot record for a strike whose origin could not be localized.
    fn emit_without_origin(
        &self,
        strike: &StrikeEvent,
        reason: &str,
        meta: &VideoMetadata,
        logger: &ShotLogger,
        progress: &mut ShotProgress,
    ) -> FlightResult<ShotAnalysis> {
        self.enter(ProcessingStep::EstimatingLanding, logger, progress)?;
        let landing = self.estimate_landing(strike, None, None, None);
        progress.step_completed(ProcessingStep::EstimatingLanding);

        self.enter(ProcessingStep::Emitting, logger, progress)?;
        let (clip_start, clip_end) = self.clip_bounds(strike.timestamp, landing.as_ref(), None, meta);
        let mut reasons = vec![
            format!("strike confidence {:.2}", strike.confidence),
            format!("origin not found: {}", reason),
        ];
        if let Some(l) = landing {
            reasons.push(format!("landing via {} ({:.2})", l.method.as_str(), l.confidence));
        }

        let shot = DetectedShot {
            id: ShotId::new(),
            strike_time: strike.timestamp,
            landing_time: landing.map(|l| l.timestamp),
            clip_start,
            clip_end,
            confidence: strike.confidence,
            confidence_reasons: reasons,
            shot_type: Default::default(),
            shot_shape: None,
            audio_confidence: strike.confidence,
            origin_confidence: None,
            trajectory_confidence: None,
            origin: None,
            landing,
        };

        logger.log_degraded(&format!("origin not found ({}), audio-only record", reason));
        metrics::record_shot_emitted(shot.shot_type.as_str());
        progress.finish();

        Ok(ShotAnalysis {
            shot,
            payload: None,
            launch: None,
        })
    }
}

/// Linear position along the trajectory at `timestamp`, held at the ends.
fn position_at(trajectory: &AssembledTrajectory, timestamp: f64) -> (f64, f64) {
    let points = trajectory.points();
    let Some(first) = points.first() else {
        return (0.5, 0.5);
    };
    if timestamp <= first.timestamp {
        return (first.x, first.y);
    }
    for w in points.windows(2) {
        if timestamp <= w[1].timestamp {
            let span = w[1].timestamp - w[0].timestamp;
            let a = if span > 0.0 { (timestamp - w[0].timestamp) / span } else { 1.0 };
            return (w[0].x + (w[1].x - w[0].x) * a, w[0].y + (w[1].y - w[0].y) * a);
        }
    }
    let last = trajectory.points()[points.len() - 1];
    (last.x, last.y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::early_flight::{DetectionCandidate, TrackSource};
    use crate::test_support::{IndexedFrames, ScriptedDetector};
    use balltrace_models::{OriginMethod, TrajectoryPoint};

    const FPS: f64 = 30.0;

    fn frames() -> IndexedFrames {
        IndexedFrames::new(640, 480, FPS, 10.0)
    }

    fn no_ball() -> ScriptedDetector<impl Fn(usize) -> Vec<(f64, f64, f64)> + Send + Sync> {
        ScriptedDetector {
            class: "sports ball",
            size: 8.0,
            script: |_| Vec::new(),
        }
    }

    fn origin() -> OriginPoint {
        OriginPoint {
            x: 320.0,
            y: 420.0,
            confidence: 0.9,
            method: OriginMethod::Consensus,
            golfer_bbox: None,
        }
    }

    /// Ball rising from the origin, one candidate per frame from `start`.
    fn rising_track(start: usize, len: usize) -> Track {
        let candidates = (0..len)
            .map(|i| DetectionCandidate {
                frame_index: start + i,
                timestamp: (start + i) as f64 / FPS,
                x: 320.0 + 2.0 * i as f64,
                y: 410.0 - 12.0 * i as f64,
                color_score: 0.9,
                motion_score: 0.9,
                physics_score: 0.9,
                combined_score: 0.9,
            })
            .collect();
        Track::new(candidates, TrackSource::FrameDiff { level: 0 })
    }

    fn assert_strictly_increasing(detections: &[FrameDetection]) {
        assert!(detections
            .windows(2)
            .all(|w| w[1].frame_index > w[0].frame_index));
    }

    fn line() -> AssembledTrajectory {
        let points = (0..5)
            .map(|i| TrajectoryPoint::new(1.0 + i as f64 * 0.1, 0.1 * i as f64, 0.8 - 0.1 * i as f64, 0.9))
            .collect();
        AssembledTrajectory::from_points(points, 0, TrajectoryMethod::KalmanRefined).unwrap()
    }

    #[test]
    fn test_position_at_interpolates_and_holds_ends() {
        let traj = line();
        let (x, y) = position_at(&traj, 1.15);
        assert!((x - 0.15).abs() < 1e-9);
        assert!((y - 0.65).abs() < 1e-9);
        assert_eq!(position_at(&traj, 0.0), (0.0, 0.8));
        let (x, _) = position_at(&traj, 9.0);
        assert!((x - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_short_refinement_falls_back_to_physics() {
        let config = PipelineConfig::default();
        let (frames, person, ball) = (frames(), no_ball(), no_ball());
        let cancel = CancellationToken::never();
        let run = ShotRun {
            config: &config,
            frames: &frames,
            person: &person,
            ball: &ball,
            audio: None,
            cancel: &cancel,
        };
        let meta = frames.metadata();
        let track = rising_track(151, 5);

        let (samples, launch) = run
            .reconstruct_flight(Some(&track), &origin(), 5.0, &meta, &ShotLogger::new(0, 5.0))
            .unwrap();
        let samples = samples.expect("physics samples");

        assert_eq!(samples.method, TrajectoryMethod::PhysicsExtrapolated);
        assert!(launch.is_some());
        assert!(samples.detections.len() > track.len());
        assert_eq!(samples.detections[..track.len()], track.detections()[..]);
        assert!(samples.detections[track.len()].frame_index > 155);
        assert_strictly_increasing(&samples.detections);
        assert!(samples.detections[track.len()..]
            .iter()
            .all(|d| d.confidence == config.physics_point_confidence));
    }

    #[test]
    fn test_short_refinement_without_launch_keeps_seed() {
        let config = PipelineConfig::default();
        let (frames, person, ball) = (frames(), no_ball(), no_ball());
        let cancel = CancellationToken::never();
        let run = ShotRun {
            config: &config,
            frames: &frames,
            person: &person,
            ball: &ball,
            audio: None,
            cancel: &cancel,
        };
        let meta = frames.metadata();
        // A single candidate carries no launch direction
        let track = rising_track(151, 1);

        let (samples, launch) = run
            .reconstruct_flight(Some(&track), &origin(), 5.0, &meta, &ShotLogger::new(0, 5.0))
            .unwrap();
        let samples = samples.expect("seed samples");

        assert_eq!(samples.method, TrajectoryMethod::EarlyFlight);
        assert!(launch.is_none());
        assert_eq!(samples.detections, track.detections());
    }

    #[test]
    fn test_failed_flight_scan_generates_default_flight() {
        let config = PipelineConfig::default();
        let (frames, person, ball) = (frames(), no_ball(), no_ball());
        let cancel = CancellationToken::never();
        let run = ShotRun {
            config: &config,
            frames: &frames,
            person: &person,
            ball: &ball,
            audio: None,
            cancel: &cancel,
        };
        let meta = frames.metadata();

        let (samples, launch) = run
            .reconstruct_flight(None, &origin(), 5.0, &meta, &ShotLogger::new(0, 5.0))
            .unwrap();
        let samples = samples.expect("default physics flight");
        let launch = launch.expect("default launch");

        assert_eq!(samples.method, TrajectoryMethod::PhysicsExtrapolated);
        assert_eq!(launch.shot_shape, balltrace_models::ShotShape::Straight);
        let first = samples.detections[0];
        assert_eq!(first.frame_index, meta.frame_index(5.0));
        assert!((first.x - 320.0).abs() < 1.0 && (first.y - 420.0).abs() < 1.0);
        // Ball rises before it comes down
        assert!(samples.detections.iter().any(|d| d.y < 400.0));
        assert_strictly_increasing(&samples.detections);
    }
}
