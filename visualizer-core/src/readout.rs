//! Text readout of the latest detection.

use crate::store::DetectionSample;
use crate::theory::octave_of;
use std::fmt;

/// What the pitch readout shows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PitchReadout {
    /// A confident reading: rounded frequency, note name and octave.
    Confident {
        frequency_hz: i32,
        note: &'static str,
        octave: i32,
    },
    /// Nothing confident enough to name.
    Vague,
}

impl PitchReadout {
    /// Builds the readout for `detection`; anything at or below
    /// `display_threshold` confidence reads as [`PitchReadout::Vague`].
    pub fn from_detection(detection: &DetectionSample, display_threshold: f32) -> Self {
        if detection.confidence > display_threshold && detection.frequency_hz > 0.0 {
            Self::Confident {
                frequency_hz: detection.frequency_hz.round() as i32,
                note: detection.pitch_class.name(),
                octave: octave_of(detection.midi_pitch),
            }
        } else {
            Self::Vague
        }
    }

    pub fn frequency_text(&self) -> String {
        match self {
            Self::Confident { frequency_hz, .. } => format!("{frequency_hz} Hz"),
            Self::Vague => "-- Hz".to_string(),
        }
    }

    pub fn note_text(&self) -> String {
        match self {
            Self::Confident { note, .. } => note.to_string(),
            Self::Vague => "--".to_string(),
        }
    }

    pub fn octave_text(&self) -> String {
        match self {
            Self::Confident { octave, .. } => octave.to_string(),
            Self::Vague => "-".to_string(),
        }
    }
}

impl fmt::Display for PitchReadout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{} {}", self.note_text(), self.octave_text(), self.frequency_text())
    }
}
