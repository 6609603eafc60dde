//! # Staff Widget
//!
//! Draws the staff backdrop: a white surface with the tonic-relative grid
//! and the label boxes at both margins. The layout itself comes from
//! [`visualizer_core::staff::layout`]; this widget only paints it.

use iced::widget::canvas::{self, Cache, Frame, Geometry, LineDash, Path, Stroke, Text};
use iced::{Color, Element, Length, Point, Rectangle, Renderer, Size, Theme};
use visualizer_core::staff::{self, LabelColumn, RowLine, StaffLabel, StaffRow};
use visualizer_core::store::{DisplaySettings, StablePitch};

use super::to_color;

const LIGHT_GREY: Color = Color { r: 0.8, g: 0.8, b: 0.8, a: 1.0 };
const FIFTH_BAND: Color = Color { r: 0.9, g: 0.9, b: 0.9, a: 1.0 };
const HIGHLIGHT: Color = Color { r: 1.0, g: 0.92, b: 0.2, a: 1.0 };

/// Staff backdrop for one frame.
pub struct StaffCanvas<'a> {
    settings: DisplaySettings,
    stable: StablePitch,
    cache: &'a Cache,
}

impl<'a> StaffCanvas<'a> {
    /// # Arguments
    /// * `settings` - Tonic, label mode and visible range
    /// * `stable` - Current held-note highlight
    /// * `cache` - Geometry cache, cleared by the app when either input changes
    pub fn new(settings: DisplaySettings, stable: StablePitch, cache: &'a Cache) -> Self {
        Self { settings, stable, cache }
    }

    pub fn view<Message: 'a>(self) -> Element<'a, Message> {
        canvas::Canvas::new(self)
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }
}

impl<Message> canvas::Program<Message> for StaffCanvas<'_> {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: iced::mouse::Cursor,
    ) -> Vec<Geometry> {
        let backdrop = self.cache.draw(renderer, bounds.size(), |frame| {
            frame.fill_rectangle(Point::ORIGIN, frame.size(), Color::WHITE);

            let rows = staff::layout(&self.settings, &self.stable, frame.height());
            for row in &rows {
                draw_row_line(frame, row);
            }
            for row in &rows {
                if let Some(label) = &row.label {
                    draw_label(frame, row, label);
                }
            }
        });
        vec![backdrop]
    }
}

fn draw_row_line(frame: &mut Frame, row: &StaffRow) {
    let width = frame.width();
    let line = Path::line(Point::new(0.0, row.y), Point::new(width, row.y));

    match row.line {
        Some(RowLine::Tonic) => {
            frame.stroke(&line, Stroke::default().with_color(Color::BLACK).with_width(2.0));
        }
        Some(RowLine::WholeStep) => {
            frame.stroke(&line, Stroke::default().with_color(LIGHT_GREY).with_width(1.0));
        }
        Some(RowLine::MajorThird) => {
            let dashed = Stroke {
                line_dash: LineDash { segments: &[5.0, 5.0], offset: 0 },
                ..Stroke::default().with_color(LIGHT_GREY).with_width(1.0)
            };
            frame.stroke(&line, dashed);
        }
        Some(RowLine::FifthBand) => {
            frame.fill_rectangle(
                Point::new(0.0, row.cell_top),
                Size::new(width, row.cell_height),
                FIFTH_BAND,
            );
        }
        None => {}
    }
}

/// Draws a label box at both margins, with the held-note overlay on top.
fn draw_label(frame: &mut Frame, row: &StaffRow, label: &StaffLabel) {
    let box_width = LabelColumn::box_width();
    let box_height = (row.cell_height - 2.0).max(1.0);

    for center_x in label.column.centers(frame.width()) {
        let top_left = Point::new(center_x - box_width / 2.0, row.y - box_height / 2.0);
        frame.fill_rectangle(top_left, Size::new(box_width, box_height), to_color(label.color, 1.0));

        if let Some(highlight) = label.highlight {
            let (w, h) = (box_width * highlight.scale, box_height * highlight.scale);
            frame.fill_rectangle(
                Point::new(center_x - w / 2.0, row.y - h / 2.0),
                Size::new(w, h),
                Color { a: highlight.opacity, ..HIGHLIGHT },
            );
        }

        frame.fill_text(Text {
            content: label.text.clone(),
            position: Point::new(center_x, row.y),
            color: Color::BLACK,
            size: label.font_size.into(),
            horizontal_alignment: iced::alignment::Horizontal::Center,
            vertical_alignment: iced::alignment::Vertical::Center,
            ..Text::default()
        });
    }
}
