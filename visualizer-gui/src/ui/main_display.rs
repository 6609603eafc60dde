//! # Main Display Module
//!
//! This module contains the main display layout for the pitch visualizer:
//! the readout header, the staff with the pitch trace layered on top, and
//! the control sidebar.

use iced::widget::{button, column, container, horizontal_space, row, stack, text, Space};
use iced::{Alignment, Color, Element, Length};

use super::controls::create_control_panel;
use crate::widgets::{pitch_trace::PitchTrace, staff::StaffCanvas};
use crate::{Message, VisualizerApp};

/// Creates the complete main application view.
pub fn create_main_view(app: &VisualizerApp) -> Element<'_, Message> {
    let title = text("Pitch Visualizer").size(28);

    let main_content = row![
        column![
            row![title, horizontal_space(), create_readout(app)].align_y(Alignment::Center),
            create_error_banner(app),
            create_staff_panel(app),
        ]
        .width(Length::Fill)
        .spacing(10),
        Space::with_width(10),
        create_control_panel(app),
    ]
    .align_y(Alignment::Start)
    .padding(20);

    container(main_content)
        .width(Length::Fill)
        .height(Length::Fill)
        .into()
}

/// Note and frequency of the latest confident detection.
fn create_readout(app: &VisualizerApp) -> Element<'_, Message> {
    row![
        text(app.readout.note_text()).size(28),
        text(app.readout.octave_text()).size(18),
        Space::with_width(16),
        text(app.readout.frequency_text()).size(20),
    ]
    .align_y(Alignment::Center)
    .into()
}

/// The acquisition failure message, if one is showing.
fn create_error_banner(app: &VisualizerApp) -> Element<'_, Message> {
    let Some(message) = &app.error else {
        return Space::with_height(0).into();
    };
    container(
        row![
            text(message.as_str()).color(Color::from_rgb(1.0, 0.55, 0.5)),
            horizontal_space(),
            button(text("Dismiss").size(13)).on_press(Message::DismissError),
        ]
        .align_y(Alignment::Center),
    )
    .padding([6, 10])
    .width(Length::Fill)
    .into()
}

/// Staff backdrop with the pitch trace drawn over it.
fn create_staff_panel(app: &VisualizerApp) -> Element<'_, Message> {
    let state = app.store().state();

    let staff = StaffCanvas::new(state.display, state.stable_pitch, &app.staff_cache).view();
    let trace = PitchTrace::new(
        &state.history,
        app.now_ms,
        state.display,
        app.config().into(),
        &app.trace_cache,
    )
    .view();

    container(stack![staff, trace])
        .width(Length::Fill)
        .height(Length::Fill)
        .into()
}
