//! Video-level orchestration.
//!
//! Resolves the strike list (audio strikes, or a visual scan when audio
//! is missing), then reconstructs each strike independently. A failing
//! shot is recorded in [`VideoAnalysis::failures`] and never aborts the
//! rest of the video; cancellation does.

mod shot;

use std::sync::Arc;
use std::time::Instant;

use balltrace_models::{DetectedShot, StrikeEvent, TrajectoryPayload};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use crate::cancel::CancellationToken;
use crate::config::PipelineConfig;
use crate::error::{FlightError, FlightResult};
use crate::logging::ShotLogger;
use crate::metrics;
use crate::physics::LaunchParameters;
use crate::progress::ProgressCallback;
use crate::source::{AudioTrack, FrameSource, ObjectDetector};
use crate::strikes::dedup_strikes;
use crate::visual_scan::VisualStrikeScanner;

/// Where the strike list came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanMode {
    Audio,
    VisualOnly,
}

/// One reconstructed shot.
#[derive(Debug, Clone, Serialize)]
pub struct ShotAnalysis {
    pub shot: DetectedShot,
    pub payload: Option<TrajectoryPayload>,
    pub launch: Option<LaunchParameters>,
}

/// A strike whose processing raised a hard error.
#[derive(Debug, Clone, Serialize)]
pub struct ShotFailure {
    pub strike_time: f64,
    pub stage: Option<&'static str>,
    pub message: String,
    pub retryable: bool,
}

impl ShotFailure {
    fn from_error(strike_time: f64, err: &FlightError) -> Self {
        Self {
            strike_time,
            stage: err.stage(),
            message: err.to_string(),
            retryable: err.is_retryable(),
        }
    }
}

/// Result of processing a whole video.
#[derive(Debug, Clone, Serialize)]
pub struct VideoAnalysis {
    pub mode: ScanMode,
    /// Shots in strike-time order
    pub shots: Vec<ShotAnalysis>,
    pub failures: Vec<ShotFailure>,
}

/// Ball-flight reconstruction over one video.
pub struct ShotPipeline {
    config: PipelineConfig,
    frames: Arc<dyn FrameSource>,
    person: Arc<dyn ObjectDetector>,
    ball: Arc<dyn ObjectDetector>,
    audio: Option<AudioTrack>,
}

impl ShotPipeline {
    /// Create a pipeline; fails on an invalid configuration.
    pub fn new(
        config: PipelineConfig,
        frames: Arc<dyn FrameSource>,
        person: Arc<dyn ObjectDetector>,
        ball: Arc<dyn ObjectDetector>,
    ) -> FlightResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            frames,
            person,
            ball,
            audio: None,
        })
    }

    /// Attach decoded audio, enabling audio landing estimation.
    pub fn with_audio(mut self, audio: AudioTrack) -> Self {
        self.audio = Some(audio);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Reconstruct every strike in the video.
    ///
    /// `strikes` of `None` or empty means no usable audio: strikes are
    /// found with the visual motion scan instead.
    pub fn process_video(
        &self,
        strikes: Option<&[StrikeEvent]>,
        progress: Option<ProgressCallback>,
        cancel: &CancellationToken,
    ) -> FlightResult<VideoAnalysis> {
        cancel.check()?;
        let min_interval = self.config.dedup_interval_secs;

        let (mode, strikes) = match strikes {
            Some(s) if !s.is_empty() => (ScanMode::Audio, dedup_strikes(s, min_interval)),
            _ => {
                warn!("No audio strikes, falling back to visual strike scan");
                metrics::record_fallback("visual_scan");
                let scanner = VisualStrikeScanner::new(self.config.visual_scan.clone());
                let found = scanner
                    .scan(self.frames.as_ref(), min_interval, cancel)
                    .map_err(|e| e.in_stage("visual_scan"))?;
                (ScanMode::VisualOnly, found)
            }
        };

        info!(
            mode = ?mode,
            strikes = strikes.len(),
            parallel = self.config.parallel_shots,
            "Processing strikes"
        );

        let run = |(index, strike): (usize, &StrikeEvent)| {
            let started = Instant::now();
            let result = self.process_strike(index, strike, mode, progress.clone(), cancel);
            metrics::record_shot_duration(started.elapsed().as_secs_f64());
            (index, strike.timestamp, result)
        };

        let outcomes: Vec<(usize, f64, FlightResult<ShotAnalysis>)> = if self.config.parallel_shots {
            strikes.par_iter().enumerate().map(run).collect()
        } else {
            strikes.iter().enumerate().map(run).collect()
        };

        let mut shots = Vec::new();
        let mut failures = Vec::new();
        for (index, strike_time, outcome) in outcomes {
            match outcome {
                Ok(analysis) => shots.push(analysis),
                Err(e) if e.is_cancelled() => return Err(FlightError::Cancelled),
                Err(e) => {
                    let stage = e.stage().unwrap_or("unknown");
                    ShotLogger::new(index, strike_time).log_error(stage, &e.to_string());
                    metrics::record_shot_failed(stage);
                    failures.push(ShotFailure::from_error(strike_time, &e));
                }
            }
        }

        info!(
            shots = shots.len(),
            failures = failures.len(),
            "Video processing finished"
        );
        Ok(VideoAnalysis {
            mode,
            shots,
            failures,
        })
    }

    /// Reconstruct a single strike.
    pub fn process_strike(
        &self,
        index: usize,
        strike: &StrikeEvent,
        mode: ScanMode,
        progress: Option<ProgressCallback>,
        cancel: &CancellationToken,
    ) -> FlightResult<ShotAnalysis> {
        let audio = match mode {
            ScanMode::Audio => self.audio.as_ref(),
            ScanMode::VisualOnly => None,
        };
        shot::ShotRun {
            config: &self.config,
            frames: self.frames.as_ref(),
            person: self.person.as_ref(),
            ball: self.ball.as_ref(),
            audio,
            cancel,
        }
        .run(index, strike, progress)
    }
}
