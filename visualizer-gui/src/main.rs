//! # Pitch Visualizer - Real-time Pitch Staff GUI
//!
//! The desktop front end of the pitch visualizer. It listens to the
//! microphone, draws the sung or played pitch as a scrolling trace over a
//! tonic-relative staff and can sound a reference drone on the tonic.
//!
//! ## Architecture
//! - **Main Thread**: Iced GUI application with dark theme; owns the store,
//!   the detection cycle and all rendering
//! - **Audio Threads**: CPAL callbacks for input capture and drone output,
//!   which never touch the store
//! - **Communication**: store notifications bridged into a crossbeam channel
//!   and drained after every message
//! - **Updates**: one detection tick per frame while detection is running

mod ui;
mod widgets;

use anyhow::anyhow;
use clap::Parser;
use crossbeam_channel::Receiver;
use iced::widget::canvas;
use iced::{Element, Subscription, Task, Theme};
use log::{debug, error, info, warn};
use std::path::PathBuf;
use std::time::Instant;
use visualizer_core::audio::CpalWaveformSource;
use visualizer_core::config::VisualizerConfig;
use visualizer_core::cycle::{CycleState, PitchCycle};
use visualizer_core::drone::DroneController;
use visualizer_core::pitch::YinEstimator;
use visualizer_core::range::{RangeDirection, RangeEdge};
use visualizer_core::readout::PitchReadout;
use visualizer_core::store::{Store, StoreEvent};
use visualizer_core::theory::Tonic;
use visualizer_core::tone::{CpalToneEngine, ToneEngine};

#[derive(Parser, Debug)]
#[command(name = "pitch-visualizer", version, about = "Real-time pitch staff visualizer")]
struct Cli {
    /// JSON file overriding any of the default tunables
    #[arg(long)]
    config: Option<PathBuf>,

    /// Initial tonic, e.g. C, F#, Bb
    #[arg(long, default_value = "C")]
    tonic: String,
}

/// Main entry point for the pitch visualizer.
///
/// Reads the command line and configuration, then hands over to the Iced
/// event loop.
fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            VisualizerConfig::load(path)?
        }
        None => VisualizerConfig::default(),
    };
    let tonic = Tonic::parse(&cli.tonic).ok_or_else(|| anyhow!("unknown tonic `{}`", cli.tonic))?;

    info!("Starting pitch visualizer...");
    iced::application("Pitch Visualizer", VisualizerApp::update, VisualizerApp::view)
        .subscription(VisualizerApp::subscription)
        .theme(VisualizerApp::theme)
        .antialiasing(true)
        .run_with(move || (VisualizerApp::new(config, tonic), Task::none()))?;
    info!("Pitch visualizer closed");
    Ok(())
}

/// Application message types for the Iced GUI framework.
///
/// Every user-facing message maps onto exactly one store operation.
#[derive(Debug, Clone)]
pub enum Message {
    // Detection
    ToggleDetection,
    Tick(Instant),

    // Display settings
    TonicSelected(Tonic),
    UseDegreesToggled(bool),
    ShowAccidentalsToggled(bool),
    AdjustRange(RangeDirection, RangeEdge),

    // Drone
    ToggleDrone,
    DroneOctaveSelected(i32),
    DroneVolumeChanged(f32),

    DismissError,
}

/// Main application state.
///
/// The store is the single source of truth; the remaining fields are view
/// state derived from its notifications.
pub struct VisualizerApp {
    config: VisualizerConfig,
    store: Store,
    cycle: PitchCycle<CpalWaveformSource, YinEstimator>,
    events: Receiver<StoreEvent>,

    // Derived view state
    pub(crate) readout: PitchReadout,
    pub(crate) detecting: bool,
    pub(crate) active_octave: i32,
    pub(crate) error: Option<String>,
    pub(crate) now_ms: f64,
    pub(crate) staff_cache: canvas::Cache,
    pub(crate) trace_cache: canvas::Cache,

    clock_origin: Instant,
}

impl VisualizerApp {
    /// Builds the store, wires its observers and connects the drone output.
    fn new(config: VisualizerConfig, tonic: Tonic) -> Self {
        let mut store = Store::new(&config);

        let (tx, events) = crossbeam_channel::unbounded();
        store.subscribe(move |event, _| {
            let _ = tx.send(*event);
        });

        let mut engine = CpalToneEngine::new();
        if let Err(e) = engine.connect() {
            warn!("Drone output unavailable: {e:#}");
        }
        DroneController::new(engine).attach(&mut store);

        let source = CpalWaveformSource::new(config.analysis_window, config.preferred_sample_rate);
        let estimator = YinEstimator::new(config.input_gate_amplitude());
        let cycle = PitchCycle::new(source, estimator, &config);

        store.set_tonic(tonic);

        let mut app = Self {
            readout: PitchReadout::Vague,
            detecting: false,
            active_octave: store.state().drone.octave,
            error: None,
            now_ms: 0.0,
            staff_cache: canvas::Cache::new(),
            trace_cache: canvas::Cache::new(),
            clock_origin: Instant::now(),
            config,
            store,
            cycle,
            events,
        };
        app.drain_store_events();
        info!("Visualizer ready, tonic {tonic}");
        app
    }

    pub(crate) fn store(&self) -> &Store {
        &self.store
    }

    pub(crate) fn config(&self) -> &VisualizerConfig {
        &self.config
    }

    /// Handles application state updates based on incoming messages.
    fn update(&mut self, message: Message) {
        if !matches!(message, Message::Tick(_)) {
            debug!("Received message: {message:?}");
        }

        match message {
            Message::ToggleDetection => match self.cycle.toggle_detection(&mut self.store) {
                Ok(()) => self.error = None,
                Err(e) => {
                    error!("Could not start detection: {e}");
                    self.error = Some(format!("Microphone unavailable: {e}"));
                }
            },
            Message::Tick(instant) => {
                self.now_ms = instant.duration_since(self.clock_origin).as_secs_f64() * 1000.0;
                self.cycle.tick(&mut self.store, self.now_ms);
            }
            Message::TonicSelected(tonic) => self.store.set_tonic(tonic),
            Message::UseDegreesToggled(enabled) => self.store.set_use_scale_degrees(enabled),
            Message::ShowAccidentalsToggled(enabled) => self.store.set_show_accidentals(enabled),
            Message::AdjustRange(direction, edge) => self.store.adjust_vertical_range(direction, edge),
            Message::ToggleDrone => self.store.toggle_drone(),
            Message::DroneOctaveSelected(octave) => self.store.set_drone_octave(octave),
            Message::DroneVolumeChanged(volume_db) => self.store.set_drone_volume(volume_db),
            Message::DismissError => self.error = None,
        }

        self.drain_store_events();
    }

    /// Applies the store's notifications to the derived view state.
    fn drain_store_events(&mut self) {
        for event in self.events.try_iter() {
            match event {
                StoreEvent::DetectingToggled(on) => {
                    self.detecting = on;
                    info!("Detection {}", if on { "on" } else { "off" });
                }
                StoreEvent::DetectionChanged => {
                    self.readout = PitchReadout::from_detection(
                        &self.store.state().detection,
                        self.config.display_clarity_threshold,
                    );
                }
                StoreEvent::HistoryChanged => self.trace_cache.clear(),
                StoreEvent::SettingsChanged => {
                    self.staff_cache.clear();
                    self.trace_cache.clear();
                }
                StoreEvent::StablePitchChanged => self.staff_cache.clear(),
                StoreEvent::DroneOctaveChanged(octave) => self.active_octave = octave,
                StoreEvent::DroneShouldUpdate => {}
            }
        }
    }

    fn view(&self) -> Element<'_, Message> {
        ui::main_display::create_main_view(self)
    }

    /// Frame clock for the detection tick, only while detection runs.
    fn subscription(&self) -> Subscription<Message> {
        match self.cycle.state() {
            CycleState::Running => iced::time::every(self.cycle.tick_interval()).map(Message::Tick),
            CycleState::Idle => Subscription::none(),
        }
    }

    fn theme(&self) -> Theme {
        Theme::Dark
    }
}
