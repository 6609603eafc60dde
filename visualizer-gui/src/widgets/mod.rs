//! # Widgets Module
//!
//! Canvas programs that draw the staff and the pitch trace.

pub mod pitch_trace;
pub mod staff;

use iced::Color;
use visualizer_core::theory::Rgb;

/// Converts a core color to an Iced color with the given alpha.
pub fn to_color(rgb: Rgb, alpha: f32) -> Color {
    Color::from_rgba8(rgb.r, rgb.g, rgb.b, alpha)
}
