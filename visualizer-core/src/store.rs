//! # State Store Module
//!
//! The single owner of all mutable visualizer state. Components never keep
//! their own copy; they receive `&mut Store` to change it and are told about
//! changes through [`StoreEvent`] notifications.
//!
//! Every mutation updates the state completely and then calls each
//! subscriber synchronously, in registration order, before it returns. A
//! subscriber sees the post-mutation state in the same call.

use crate::config::VisualizerConfig;
use crate::range::{RangeDirection, RangeEdge, VerticalRange};
use crate::theory::{PitchClass, Tonic};
use log::trace;
use std::collections::VecDeque;

/// Lowest drone octave accepted.
pub const MIN_DRONE_OCTAVE: i32 = 1;
/// Highest drone octave accepted.
pub const MAX_DRONE_OCTAVE: i32 = 6;
/// Quietest drone volume accepted, in dB.
pub const MIN_DRONE_VOLUME_DB: f32 = -60.0;
/// Loudest drone volume accepted, in dB.
pub const MAX_DRONE_VOLUME_DB: f32 = 0.0;

/// The latest accepted pitch detection.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DetectionSample {
    pub frequency_hz: f32,
    pub confidence: f32,
    pub midi_pitch: f32,
    pub pitch_class: PitchClass,
}

/// What one tick heard.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PitchReading {
    Detected { midi: f32 },
    Silence,
}

/// One entry of the pitch history.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistoryPoint {
    /// Monotonic timestamp in milliseconds.
    pub timestamp_ms: f64,
    pub reading: PitchReading,
    pub confidence: f32,
}

impl HistoryPoint {
    pub fn detected(timestamp_ms: f64, midi: f32, confidence: f32) -> Self {
        Self { timestamp_ms, reading: PitchReading::Detected { midi }, confidence }
    }

    pub fn silence(timestamp_ms: f64) -> Self {
        Self { timestamp_ms, reading: PitchReading::Silence, confidence: 0.0 }
    }

    pub fn midi(&self) -> Option<f32> {
        match self.reading {
            PitchReading::Detected { midi } => Some(midi),
            PitchReading::Silence => None,
        }
    }
}

/// Highlight state for a held note.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StablePitch {
    pub pitch_class: Option<PitchClass>,
    pub opacity: f32,
    pub size: f32,
}

impl Default for StablePitch {
    fn default() -> Self {
        Self { pitch_class: None, opacity: 0.0, size: 1.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplaySettings {
    pub tonic: Tonic,
    pub use_scale_degrees: bool,
    pub show_accidentals: bool,
    pub vertical_range: VerticalRange,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            tonic: Tonic::default(),
            use_scale_degrees: false,
            show_accidentals: true,
            vertical_range: VerticalRange::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DroneSettings {
    pub is_playing: bool,
    pub octave: i32,
    pub volume_db: f32,
}

impl Default for DroneSettings {
    fn default() -> Self {
        Self { is_playing: false, octave: 3, volume_db: -12.0 }
    }
}

/// Everything the visualizer knows at one instant.
#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub is_detecting: bool,
    pub detection: DetectionSample,
    pub history: VecDeque<HistoryPoint>,
    pub display: DisplaySettings,
    pub drone: DroneSettings,
    pub stable_pitch: StablePitch,
}

/// Change notifications published by the store.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StoreEvent {
    /// Detection was switched on (`true`) or off.
    DetectingToggled(bool),
    DetectionChanged,
    HistoryChanged,
    SettingsChanged,
    /// The drone must re-read tonic, octave, volume and play state.
    DroneShouldUpdate,
    DroneOctaveChanged(i32),
    StablePitchChanged,
}

type Subscriber = Box<dyn FnMut(&StoreEvent, &AppState)>;

/// Owner of [`AppState`] and dispatcher of [`StoreEvent`]s.
pub struct Store {
    state: AppState,
    history_capacity: usize,
    subscribers: Vec<Subscriber>,
}

impl Store {
    pub fn new(config: &VisualizerConfig) -> Self {
        Self {
            state: AppState::default(),
            history_capacity: config.history_capacity.max(1),
            subscribers: Vec::new(),
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Registers an observer. Observers are called in registration order
    /// with the event and the state as it is after the mutation.
    pub fn subscribe(&mut self, subscriber: impl FnMut(&StoreEvent, &AppState) + 'static) {
        self.subscribers.push(Box::new(subscriber));
    }

    fn emit(&mut self, event: StoreEvent) {
        trace!("store event {event:?}");
        let state = &self.state;
        for subscriber in self.subscribers.iter_mut() {
            subscriber(&event, state);
        }
    }

    /// Flips detection on or off. Switching off wipes the history and the
    /// latest detection.
    pub fn toggle_detection(&mut self) {
        self.state.is_detecting = !self.state.is_detecting;
        if !self.state.is_detecting {
            self.state.history.clear();
            self.state.detection = DetectionSample::default();
            self.emit(StoreEvent::DetectionChanged);
            self.emit(StoreEvent::HistoryChanged);
        }
        self.emit(StoreEvent::DetectingToggled(self.state.is_detecting));
    }

    pub fn record_detection(&mut self, sample: DetectionSample) {
        self.state.detection = sample;
        self.emit(StoreEvent::DetectionChanged);
    }

    /// Appends to the history, evicting the oldest point once the capacity
    /// is exceeded.
    pub fn append_history(&mut self, point: HistoryPoint) {
        self.state.history.push_back(point);
        while self.state.history.len() > self.history_capacity {
            self.state.history.pop_front();
        }
        self.emit(StoreEvent::HistoryChanged);
    }

    pub fn set_tonic(&mut self, tonic: Tonic) {
        self.state.display.tonic = tonic;
        self.emit(StoreEvent::SettingsChanged);
        self.emit(StoreEvent::DroneShouldUpdate);
    }

    pub fn set_use_scale_degrees(&mut self, use_scale_degrees: bool) {
        self.state.display.use_scale_degrees = use_scale_degrees;
        self.emit(StoreEvent::SettingsChanged);
    }

    pub fn set_show_accidentals(&mut self, show_accidentals: bool) {
        self.state.display.show_accidentals = show_accidentals;
        self.emit(StoreEvent::SettingsChanged);
    }

    pub fn adjust_vertical_range(&mut self, direction: RangeDirection, edge: RangeEdge) {
        self.state.display.vertical_range.adjust(direction, edge);
        self.emit(StoreEvent::SettingsChanged);
    }

    pub fn toggle_drone(&mut self) {
        self.state.drone.is_playing = !self.state.drone.is_playing;
        self.emit(StoreEvent::DroneShouldUpdate);
    }

    pub fn set_drone_octave(&mut self, octave: i32) {
        let octave = octave.clamp(MIN_DRONE_OCTAVE, MAX_DRONE_OCTAVE);
        self.state.drone.octave = octave;
        self.emit(StoreEvent::DroneOctaveChanged(octave));
        self.emit(StoreEvent::DroneShouldUpdate);
    }

    pub fn set_drone_volume(&mut self, volume_db: f32) {
        self.state.drone.volume_db = volume_db.clamp(MIN_DRONE_VOLUME_DB, MAX_DRONE_VOLUME_DB);
        self.emit(StoreEvent::DroneShouldUpdate);
    }

    pub fn set_stable_pitch(&mut self, pitch_class: Option<PitchClass>, opacity: f32, size: f32) {
        self.state.stable_pitch = StablePitch {
            pitch_class,
            opacity: opacity.clamp(0.0, 1.0),
            size,
        };
        self.emit(StoreEvent::StablePitchChanged);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn recording_store(config: &VisualizerConfig) -> (Store, Rc<RefCell<Vec<StoreEvent>>>) {
        let mut store = Store::new(config);
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        store.subscribe(move |event, _| sink.borrow_mut().push(*event));
        (store, log)
    }

    #[test]
    fn history_evicts_oldest_first() {
        let config = VisualizerConfig::default();
        let (mut store, _) = recording_store(&config);

        for i in 0..1234 {
            store.append_history(HistoryPoint::detected(i as f64, 60.0, 0.9));
            assert!(store.state().history.len() <= 500);
        }

        let kept: Vec<f64> = store.state().history.iter().map(|p| p.timestamp_ms).collect();
        let expected: Vec<f64> = (734..1234).map(|i| i as f64).collect();
        assert_eq!(kept, expected);
    }

    #[test]
    fn stopping_detection_resets_history_and_detection() {
        let config = VisualizerConfig::default();
        let (mut store, log) = recording_store(&config);

        store.toggle_detection();
        store.record_detection(DetectionSample {
            frequency_hz: 440.0,
            confidence: 0.9,
            midi_pitch: 69.0,
            pitch_class: PitchClass::new(9),
        });
        store.append_history(HistoryPoint::silence(1.0));
        log.borrow_mut().clear();

        store.toggle_detection();
        assert!(!store.state().is_detecting);
        assert!(store.state().history.is_empty());
        assert_eq!(store.state().detection, DetectionSample::default());
        assert_eq!(
            *log.borrow(),
            vec![
                StoreEvent::DetectionChanged,
                StoreEvent::HistoryChanged,
                StoreEvent::DetectingToggled(false),
            ]
        );
    }

    #[test]
    fn subscribers_see_post_mutation_state() {
        let mut store = Store::new(&VisualizerConfig::default());
        let seen = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&seen);
        store.subscribe(move |event, state| {
            if *event == StoreEvent::SettingsChanged {
                *sink.borrow_mut() = Some(state.display.tonic);
            }
        });

        let d = Tonic::parse("D").unwrap();
        store.set_tonic(d);
        assert_eq!(*seen.borrow(), Some(d));
    }

    #[test]
    fn tonic_and_octave_changes_poke_the_drone() {
        let (mut store, log) = recording_store(&VisualizerConfig::default());

        store.set_tonic(Tonic::parse("E♭").unwrap());
        store.set_drone_octave(4);
        assert_eq!(
            *log.borrow(),
            vec![
                StoreEvent::SettingsChanged,
                StoreEvent::DroneShouldUpdate,
                StoreEvent::DroneOctaveChanged(4),
                StoreEvent::DroneShouldUpdate,
            ]
        );
    }

    #[test]
    fn numeric_inputs_are_clamped() {
        let mut store = Store::new(&VisualizerConfig::default());
        store.set_drone_volume(12.0);
        store.set_drone_octave(42);
        store.set_stable_pitch(Some(PitchClass::new(2)), 1.7, 1.05);

        let state = store.state();
        assert_eq!(state.drone.volume_db, 0.0);
        assert_eq!(state.drone.octave, MAX_DRONE_OCTAVE);
        assert_eq!(state.stable_pitch.opacity, 1.0);
    }

    #[test]
    fn range_adjustment_always_notifies() {
        let (mut store, log) = recording_store(&VisualizerConfig::default());
        store.adjust_vertical_range(RangeDirection::Expand, RangeEdge::Upper);
        assert_eq!(store.state().display.vertical_range, VerticalRange::default());
        assert_eq!(*log.borrow(), vec![StoreEvent::SettingsChanged]);
    }
}
