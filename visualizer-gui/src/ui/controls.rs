//! # Control Panel Module
//!
//! The sidebar of the visualizer. Every control sends one [`Message`] that
//! maps onto one store operation; the panel itself keeps no state.

use iced::widget::{button, checkbox, column, container, pick_list, row, slider, text, Space};
use iced::{Color, Element, Length};
use visualizer_core::range::{RangeDirection, RangeEdge};
use visualizer_core::theory::Tonic;

use crate::{Message, VisualizerApp};

/// Octaves offered for the drone.
const DRONE_OCTAVES: [i32; 3] = [2, 3, 4];

/// Volume slider bounds, in dB.
const VOLUME_RANGE: std::ops::RangeInclusive<f32> = -40.0..=0.0;

/// Range buttons as (label, direction, edge).
const RANGE_BUTTONS: &[(&str, RangeDirection, RangeEdge)] = &[
    ("Top ▲", RangeDirection::Expand, RangeEdge::Upper),
    ("Top ▼", RangeDirection::Contract, RangeEdge::Upper),
    ("Bottom ▲", RangeDirection::Contract, RangeEdge::Lower),
    ("Bottom ▼", RangeDirection::Expand, RangeEdge::Lower),
];

/// Creates the control sidebar.
///
/// # Arguments
/// * `app` - Application state the controls reflect
///
/// # Returns
/// * `Element` - Sidebar with detection, display, drone and range sections
pub fn create_control_panel(app: &VisualizerApp) -> Element<'_, Message> {
    let state = app.store().state();

    let detection = section(
        "Detection",
        column![
            styled_button(if app.detecting { "Stop" } else { "Start" }, app.detecting)
                .on_press(Message::ToggleDetection),
        ],
    );

    let display = section(
        "Display",
        column![
            pick_list(Tonic::selectable(), Some(state.display.tonic), Message::TonicSelected)
                .width(Length::Fill),
            checkbox("Scale degrees", state.display.use_scale_degrees)
                .on_toggle(Message::UseDegreesToggled),
            checkbox("Show accidentals", state.display.show_accidentals)
                .on_toggle(Message::ShowAccidentalsToggled),
        ]
        .spacing(8),
    );

    let octaves = DRONE_OCTAVES.iter().fold(row![].spacing(6), |row, &octave| {
        row.push(
            styled_button(&format!("{octave}"), octave == app.active_octave)
                .on_press(Message::DroneOctaveSelected(octave)),
        )
    });
    let drone = section(
        "Drone",
        column![
            styled_button(
                if state.drone.is_playing { "Drone Off" } else { "Drone On" },
                state.drone.is_playing,
            )
            .on_press(Message::ToggleDrone),
            octaves,
            text(format!("Volume {:.0} dB", state.drone.volume_db)).size(13),
            slider(VOLUME_RANGE, state.drone.volume_db, Message::DroneVolumeChanged).step(1.0),
        ]
        .spacing(8),
    );

    let range_buttons = RANGE_BUTTONS.iter().fold(column![].spacing(6), |col, &(label, direction, edge)| {
        col.push(styled_button(label, false).on_press(Message::AdjustRange(direction, edge)))
    });
    let range = section(
        "Range",
        column![
            text(format!(
                "MIDI {} – {}",
                state.display.vertical_range.min_midi, state.display.vertical_range.max_midi
            ))
            .size(13),
            range_buttons,
        ]
        .spacing(8),
    );

    container(column![detection, display, drone, range].spacing(16).padding(15))
        .width(Length::Fixed(220.0))
        .height(Length::Fill)
        .into()
}

/// A titled group of controls.
fn section<'a>(title: &'a str, body: iced::widget::Column<'a, Message>) -> Element<'a, Message> {
    column![text(title).size(16), Space::with_height(4), body].spacing(4).into()
}

/// A full-width button, highlighted while `active`.
fn styled_button<'a>(label: &str, active: bool) -> iced::widget::Button<'a, Message> {
    let button = button(text(label.to_string()).size(14).width(Length::Fill)).padding([6, 10]);
    if active {
        button.style(|_theme, _status| button::Style {
            background: Some(iced::Background::Color(Color::from_rgb(0.2, 0.5, 0.8))),
            text_color: Color::WHITE,
            ..button::Style::default()
        })
    } else {
        button
    }
}
