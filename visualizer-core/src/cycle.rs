//! # Pitch Estimation Cycle
//!
//! The per-frame driver of the visualizer. While running, every tick pulls
//! the latest waveform, asks the estimator for a pitch, decides whether the
//! reading is trustworthy and writes the outcome into the [`Store`]:
//!
//! 1. valid readings update the latest detection and append a detected
//!    history point;
//! 2. invalid readings append a silence point and leave the latest
//!    detection alone, so the readout keeps its last good value while the
//!    trace shows a gap;
//! 3. the stability tracker advances and its highlight is published.
//!
//! The cycle owns the only scheduling state. Stopping cancels the repeating
//! task, so a tick delivered after the stop is a no-op.

use crate::AcquisitionError;
use crate::audio::WaveformSource;
use crate::config::VisualizerConfig;
use crate::pitch::{PitchEstimate, PitchEstimator};
use crate::scheduler::{CancellationToken, RepeatingTask};
use crate::stability::StabilityTracker;
use crate::store::{DetectionSample, HistoryPoint, Store};
use crate::theory::{PitchClass, frequency_to_midi};
use log::{debug, info, warn};
use std::time::Duration;

/// Gates a raw estimate must pass to count as a detection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectionGate {
    pub clarity_threshold: f32,
    pub min_pitch_hz: f32,
    pub max_pitch_hz: f32,
}

impl DetectionGate {
    pub fn from_config(config: &VisualizerConfig) -> Self {
        Self {
            clarity_threshold: config.clarity_threshold,
            min_pitch_hz: config.min_pitch_hz,
            max_pitch_hz: config.max_pitch_hz,
        }
    }

    /// Turns an estimate into a detection, or `None` if it fails any gate.
    /// All three comparisons are strict.
    pub fn classify(&self, estimate: PitchEstimate) -> Option<DetectionSample> {
        let frequency = estimate.frequency?;
        let valid = estimate.confidence > self.clarity_threshold
            && frequency > self.min_pitch_hz
            && frequency < self.max_pitch_hz;
        if !valid {
            return None;
        }
        let midi_pitch = frequency_to_midi(frequency);
        Some(DetectionSample {
            frequency_hz: frequency,
            confidence: estimate.confidence,
            midi_pitch,
            pitch_class: PitchClass::from_midi(midi_pitch),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    Idle,
    Running,
}

/// What a call to [`PitchCycle::tick`] did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// The cycle is idle or its task was cancelled; nothing changed.
    Skipped,
    Detected(DetectionSample),
    Silent,
}

pub struct PitchCycle<S, E> {
    source: S,
    estimator: E,
    gate: DetectionGate,
    tracker: StabilityTracker,
    tick_interval: Duration,
    task: Option<RepeatingTask>,
}

impl<S: WaveformSource, E: PitchEstimator> PitchCycle<S, E> {
    pub fn new(source: S, estimator: E, config: &VisualizerConfig) -> Self {
        Self {
            source,
            estimator,
            gate: DetectionGate::from_config(config),
            tracker: StabilityTracker::new(config),
            tick_interval: config.tick_interval(),
            task: None,
        }
    }

    pub fn state(&self) -> CycleState {
        match &self.task {
            Some(task) if task.is_live() => CycleState::Running,
            _ => CycleState::Idle,
        }
    }

    /// How often the host should call [`tick`](Self::tick) while running.
    pub fn tick_interval(&self) -> Duration {
        self.task.as_ref().map_or(self.tick_interval, RepeatingTask::interval)
    }

    /// Token of the running task, if any.
    pub fn cancellation_token(&self) -> Option<CancellationToken> {
        self.task.as_ref().map(RepeatingTask::token)
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// The user's start/stop intent.
    ///
    /// Flips the store's detecting flag, then starts or stops the cycle to
    /// match. When the input cannot be acquired the flag is flipped back and
    /// the error is returned for display.
    pub fn toggle_detection(&mut self, store: &mut Store) -> Result<(), AcquisitionError> {
        store.toggle_detection();
        if store.state().is_detecting {
            if let Err(e) = self.start() {
                warn!("Microphone access failed: {e}");
                store.toggle_detection();
                return Err(e);
            }
            Ok(())
        } else {
            self.stop(store);
            Ok(())
        }
    }

    /// Idle → Running: acquire the source and arm a fresh repeating task.
    fn start(&mut self) -> Result<(), AcquisitionError> {
        if let Some(task) = self.task.take() {
            task.cancel();
        }
        self.source.open()?;
        let task = RepeatingTask::start(self.tick_interval);
        info!("Pitch detection started ({:?} per tick)", task.interval());
        self.task = Some(task);
        Ok(())
    }

    /// Running → Idle: release the source, cancel pending ticks and clear
    /// the highlight.
    pub fn stop(&mut self, store: &mut Store) {
        self.source.close();
        if let Some(task) = self.task.take() {
            task.cancel();
            info!("Pitch detection stopped after {} ticks", task.ticks());
        }
        self.tracker.reset();
        store.set_stable_pitch(None, 0.0, 1.0);
    }

    /// Runs one detection tick at monotonic time `now_ms`.
    pub fn tick(&mut self, store: &mut Store, now_ms: f64) -> TickOutcome {
        let Some(task) = self.task.as_mut() else {
            return TickOutcome::Skipped;
        };
        if !task.begin_tick() {
            return TickOutcome::Skipped;
        }

        let sample_rate = self.source.sample_rate();
        let waveform = self.source.current_waveform();
        let estimate = self.estimator.find_pitch(waveform, sample_rate);
        let detection = self.gate.classify(estimate);

        let outcome = match detection {
            Some(sample) => {
                store.record_detection(sample);
                store.append_history(HistoryPoint::detected(
                    now_ms,
                    sample.midi_pitch,
                    sample.confidence,
                ));
                TickOutcome::Detected(sample)
            }
            None => {
                store.append_history(HistoryPoint::silence(now_ms));
                TickOutcome::Silent
            }
        };

        let stable = self.tracker.update(detection.map(|d| d.pitch_class));
        store.set_stable_pitch(stable.pitch_class, stable.opacity, stable.size);
        debug!("tick at {now_ms:.1} ms: {outcome:?}");
        outcome
    }
}
