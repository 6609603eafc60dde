use std::collections::VecDeque;
use std::time::Duration;

use visualizer_core::AcquisitionError;
use visualizer_core::audio::WaveformSource;
use visualizer_core::config::VisualizerConfig;
use visualizer_core::cycle::{CycleState, PitchCycle, TickOutcome};
use visualizer_core::drone::DroneController;
use visualizer_core::pitch::{PitchEstimate, PitchEstimator, YinEstimator};
use visualizer_core::readout::PitchReadout;
use visualizer_core::store::{PitchReading, Store};
use visualizer_core::theory::PitchClass;
use visualizer_core::tone::ToneEngine;
use visualizer_core::trace::{PlotArea, TraceGeometry, TraceStyle};
use visualizer_core::NoteSpecError;

const TICK_MS: f64 = 16.0;

/// A source that always "opens" and serves a fixed buffer.
struct ScriptedSource {
    waveform: Vec<f32>,
    open: bool,
    fail: bool,
}

impl ScriptedSource {
    fn silent() -> Self {
        Self { waveform: vec![0.0; 2048], open: false, fail: false }
    }

    fn sine(freq: f32) -> Self {
        let waveform = (0..2048)
            .map(|i| 0.5 * (2.0 * std::f32::consts::PI * freq * i as f32 / 44100.0).sin())
            .collect();
        Self { waveform, open: false, fail: false }
    }

    fn denied() -> Self {
        Self { fail: true, ..Self::silent() }
    }
}

impl WaveformSource for ScriptedSource {
    fn open(&mut self) -> Result<(), AcquisitionError> {
        if self.fail {
            return Err(AcquisitionError::NoInputDevice);
        }
        self.open = true;
        Ok(())
    }

    fn close(&mut self) {
        self.open = false;
    }

    fn current_waveform(&mut self) -> &[f32] {
        &self.waveform
    }

    fn sample_rate(&self) -> u32 {
        44100
    }
}

/// Plays back a list of estimates, repeating the last one forever.
struct ScriptedEstimator {
    script: VecDeque<PitchEstimate>,
    last: PitchEstimate,
}

impl ScriptedEstimator {
    fn new(script: impl IntoIterator<Item = PitchEstimate>) -> Self {
        Self { script: script.into_iter().collect(), last: PitchEstimate::NONE }
    }

    fn steady(frequency: f32, confidence: f32) -> Self {
        Self::new([PitchEstimate { frequency: Some(frequency), confidence }])
    }
}

impl PitchEstimator for ScriptedEstimator {
    fn find_pitch(&mut self, _waveform: &[f32], _sample_rate: u32) -> PitchEstimate {
        if let Some(next) = self.script.pop_front() {
            self.last = next;
        }
        self.last
    }
}

struct SilentEngine;

impl ToneEngine for SilentEngine {
    fn connect(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    fn trigger_notes(&mut self, _notes: &[String], _when: Duration) -> Result<(), NoteSpecError> {
        Ok(())
    }

    fn release_all(&mut self) {}

    fn set_volume_db(&mut self, _volume_db: f32) {}
}

fn run_ticks<S: WaveformSource, E: PitchEstimator>(
    cycle: &mut PitchCycle<S, E>,
    store: &mut Store,
    from_ms: f64,
    count: usize,
) -> f64 {
    let mut now = from_ms;
    for _ in 0..count {
        now += TICK_MS;
        cycle.tick(store, now);
    }
    now
}

#[test]
fn a440_flows_from_tick_to_highlight() {
    let config = VisualizerConfig::default();
    let mut store = Store::new(&config);
    let mut cycle = PitchCycle::new(ScriptedSource::silent(), ScriptedEstimator::steady(440.0, 0.9), &config);

    cycle.toggle_detection(&mut store).unwrap();
    assert_eq!(cycle.state(), CycleState::Running);
    assert!(store.state().is_detecting);

    let outcome = cycle.tick(&mut store, 0.0);
    assert!(matches!(outcome, TickOutcome::Detected(_)));
    let state = store.state();
    assert_eq!(state.detection.pitch_class, PitchClass::new(9));
    assert_eq!(state.detection.midi_pitch, 69.0);
    assert_eq!(state.history.len(), 1);

    // Fifteen more identical ticks reach the hold threshold; the rest fade
    // the highlight in.
    run_ticks(&mut cycle, &mut store, 0.0, 30);
    let stable = store.state().stable_pitch;
    assert_eq!(stable.pitch_class, Some(PitchClass::new(9)));
    assert!(stable.opacity > 0.9, "opacity {}", stable.opacity);
    assert!(stable.size > 1.0);
}

#[test]
fn denied_microphone_reverts_to_idle() {
    let config = VisualizerConfig::default();
    let mut store = Store::new(&config);
    let mut cycle = PitchCycle::new(ScriptedSource::denied(), ScriptedEstimator::steady(440.0, 0.9), &config);

    let result = cycle.toggle_detection(&mut store);
    assert_eq!(result, Err(AcquisitionError::NoInputDevice));
    assert_eq!(cycle.state(), CycleState::Idle);
    assert!(!store.state().is_detecting);
    assert_eq!(cycle.tick(&mut store, 16.0), TickOutcome::Skipped);
    assert!(store.state().history.is_empty());
}

#[test]
fn no_tick_runs_after_stop() {
    let config = VisualizerConfig::default();
    let mut store = Store::new(&config);
    let mut cycle = PitchCycle::new(ScriptedSource::silent(), ScriptedEstimator::steady(330.0, 0.95), &config);

    cycle.toggle_detection(&mut store).unwrap();
    let now = run_ticks(&mut cycle, &mut store, 0.0, 40);
    assert!(store.state().stable_pitch.opacity > 0.0);

    cycle.toggle_detection(&mut store).unwrap();
    assert_eq!(cycle.state(), CycleState::Idle);
    assert!(!cycle.source().open);
    assert!(store.state().history.is_empty());
    assert_eq!(store.state().stable_pitch.pitch_class, None);
    assert_eq!(store.state().stable_pitch.opacity, 0.0);

    // A tick that was already queued when the user pressed stop.
    assert_eq!(cycle.tick(&mut store, now + TICK_MS), TickOutcome::Skipped);
    assert!(store.state().history.is_empty());
}

#[test]
fn cancelled_token_stops_ticks() {
    let config = VisualizerConfig::default();
    let mut store = Store::new(&config);
    let mut cycle = PitchCycle::new(ScriptedSource::silent(), ScriptedEstimator::steady(330.0, 0.95), &config);

    cycle.toggle_detection(&mut store).unwrap();
    run_ticks(&mut cycle, &mut store, 0.0, 3);

    let token = cycle.cancellation_token().unwrap();
    token.cancel();
    assert_eq!(cycle.state(), CycleState::Idle);
    assert_eq!(cycle.tick(&mut store, 100.0), TickOutcome::Skipped);
    assert_eq!(store.state().history.len(), 3);
}

#[test]
fn invalid_ticks_append_silence_and_keep_the_last_detection() {
    let config = VisualizerConfig::default();
    let mut store = Store::new(&config);
    let script = [
        PitchEstimate { frequency: Some(220.0), confidence: 0.97 },
        PitchEstimate { frequency: Some(220.0), confidence: 0.5 },
        PitchEstimate { frequency: Some(2000.0), confidence: 0.99 },
        PitchEstimate::NONE,
    ];
    let mut cycle = PitchCycle::new(ScriptedSource::silent(), ScriptedEstimator::new(script), &config);

    cycle.toggle_detection(&mut store).unwrap();
    run_ticks(&mut cycle, &mut store, 0.0, 4);

    let state = store.state();
    let readings: Vec<PitchReading> = state.history.iter().map(|p| p.reading).collect();
    assert_eq!(readings.len(), 4);
    assert!(matches!(readings[0], PitchReading::Detected { .. }));
    assert!(readings[1..].iter().all(|r| *r == PitchReading::Silence));
    assert_eq!(state.detection.frequency_hz, 220.0);

    let readout = PitchReadout::from_detection(&state.detection, config.display_clarity_threshold);
    assert_eq!((readout.note_text(), readout.octave_text()), ("A".to_string(), "3".to_string()));
}

#[test]
fn trace_follows_the_time_window() {
    let config = VisualizerConfig::default();
    let mut store = Store::new(&config);
    let mut cycle = PitchCycle::new(ScriptedSource::silent(), ScriptedEstimator::steady(440.0, 0.9), &config);
    cycle.toggle_detection(&mut store).unwrap();

    // 400 ticks of 16 ms span 6.4 s; only the last 4 s are on screen.
    let now = run_ticks(&mut cycle, &mut store, 0.0, 400);
    let state = store.state();
    let area = PlotArea::for_canvas(1410.0, 480.0);
    let geometry = TraceGeometry::build(
        &state.history,
        now,
        &state.display.vertical_range,
        state.display.tonic.pitch_class(),
        &area,
        &TraceStyle::from(&config),
    );

    assert_eq!(geometry.points.len(), 250);
    assert_eq!(geometry.points.last().map(|p| p.x), Some(area.right()));
    assert!(geometry.points.iter().all(|p| p.x > area.x));
    assert!(!geometry.connectors.is_empty());
}

#[test]
fn drone_rides_along_with_the_cycle() {
    let config = VisualizerConfig::default();
    let mut store = Store::new(&config);
    DroneController::new(SilentEngine).attach(&mut store);
    let mut cycle = PitchCycle::new(ScriptedSource::sine(440.0), YinEstimator::new(0.001), &config);

    store.toggle_drone();
    cycle.toggle_detection(&mut store).unwrap();
    run_ticks(&mut cycle, &mut store, 0.0, 5);

    assert!(store.state().drone.is_playing);
    assert_eq!(store.state().detection.pitch_class, PitchClass::new(9));
    assert_eq!(store.state().history.len(), 5);
}
