//! # Stability Tracking Module
//!
//! Rewards a held, steady note with a highlight that fades in, without
//! flickering on momentary jitter. A pitch class counts as held once it has
//! been detected on enough consecutive ticks; the highlight's opacity and
//! size then follow a first-order low-pass toward their targets, which
//! converges without overshoot.

use crate::config::VisualizerConfig;
use crate::store::StablePitch;
use crate::theory::PitchClass;

/// Highlight size while a note is held.
const HELD_SIZE: f32 = 1.05;
/// Highlight size otherwise.
const REST_SIZE: f32 = 1.0;

#[derive(Debug, Clone)]
pub struct StabilityTracker {
    threshold: u32,
    fade_speed: f32,
    current_class: Option<PitchClass>,
    run_length: u32,
    opacity: f32,
    size: f32,
}

impl StabilityTracker {
    pub fn new(config: &VisualizerConfig) -> Self {
        Self {
            threshold: config.stability_threshold,
            fade_speed: config.fade_speed,
            current_class: None,
            run_length: 0,
            opacity: 0.0,
            size: REST_SIZE,
        }
    }

    /// Advances one tick.
    ///
    /// # Arguments
    /// * `detected` - This tick's pitch class, or `None` for an invalid tick
    ///
    /// # Returns
    /// * The highlight state to publish for this tick
    pub fn update(&mut self, detected: Option<PitchClass>) -> StablePitch {
        match detected {
            Some(pc) if Some(pc) == self.current_class => self.run_length += 1,
            _ => {
                self.run_length = 0;
                self.current_class = detected;
            }
        }

        let held = self.run_length >= self.threshold;
        let target_opacity = if held { 1.0 } else { 0.0 };
        let target_size = if held { HELD_SIZE } else { REST_SIZE };

        self.opacity += (target_opacity - self.opacity) * self.fade_speed;
        self.size += (target_size - self.size) * self.fade_speed;

        self.snapshot()
    }

    /// Back to the initial state: no class, empty run, highlight off.
    pub fn reset(&mut self) {
        self.current_class = None;
        self.run_length = 0;
        self.opacity = 0.0;
        self.size = REST_SIZE;
    }

    pub fn run_length(&self) -> u32 {
        self.run_length
    }

    pub fn snapshot(&self) -> StablePitch {
        StablePitch {
            pitch_class: self.current_class,
            opacity: self.opacity,
            size: self.size,
        }
    }
}
