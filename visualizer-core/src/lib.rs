// visualizer-core/src/lib.rs

//! The core logic for the pitch staff visualizer.
//! This crate is responsible for the real-time pitch tracking pipeline:
//! audio acquisition, pitch estimation, stability tracking, the central
//! state store and the pure geometry that the GUI draws. It is completely
//! headless and contains no GUI code.

pub mod audio;
pub mod config;
pub mod cycle;
pub mod drone;
pub mod fft;
pub mod pitch;
pub mod range;
pub mod readout;
pub mod scheduler;
pub mod stability;
pub mod staff;
pub mod store;
pub mod theory;
pub mod tone;
pub mod trace;

use thiserror::Error;

/// Failure to bring up the microphone when detection starts.
///
/// This is the only failure the user gets to see; the cycle reverts to idle
/// and the visualization keeps running.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AcquisitionError {
    #[error("no audio input device available")]
    NoInputDevice,
    #[error("no usable input format: {0}")]
    UnsupportedConfig(String),
    #[error("could not open input stream: {0}")]
    Stream(String),
}

/// A tonic/octave combination that cannot be turned into a pitch.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum NoteSpecError {
    #[error("unknown note name `{0}`")]
    UnknownName(String),
    #[error("missing or invalid octave in `{0}`")]
    InvalidOctave(String),
}
