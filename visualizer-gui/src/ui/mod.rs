//! # UI Module
//!
//! Layout and controls of the pitch visualizer window.

pub mod controls;
pub mod main_display;
