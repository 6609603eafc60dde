//! # Pitch Trace Widget
//!
//! Draws the scrolling pitch trace on a transparent canvas layered over the
//! staff. Nearby points are joined by thin dark connectors, then every
//! point is drawn as a dot in its tonic-relative color.

use iced::widget::canvas::{self, Cache, Geometry, Path, Stroke};
use iced::{Color, Element, Length, Point, Rectangle, Renderer, Theme};
use std::collections::VecDeque;
use visualizer_core::store::{DisplaySettings, HistoryPoint};
use visualizer_core::trace::{PlotArea, TraceGeometry, TraceStyle};

use super::to_color;

const DOT_RADIUS: f32 = 9.5;
const CONNECTOR_WIDTH: f32 = 2.5;
const CONNECTOR_COLOR: Color = Color { r: 0.0, g: 0.0, b: 0.0, a: 0.4 };

pub struct PitchTrace<'a> {
    history: &'a VecDeque<HistoryPoint>,
    now_ms: f64,
    settings: DisplaySettings,
    style: TraceStyle,
    cache: &'a Cache,
}

impl<'a> PitchTrace<'a> {
    pub fn new(
        history: &'a VecDeque<HistoryPoint>,
        now_ms: f64,
        settings: DisplaySettings,
        style: TraceStyle,
        cache: &'a Cache,
    ) -> Self {
        Self { history, now_ms, settings, style, cache }
    }

    pub fn view<Message: 'a>(self) -> Element<'a, Message> {
        canvas::Canvas::new(self)
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }
}

impl<Message> canvas::Program<Message> for PitchTrace<'_> {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: iced::mouse::Cursor,
    ) -> Vec<Geometry> {
        let trace = self.cache.draw(renderer, bounds.size(), |frame| {
            let area = PlotArea::for_canvas(frame.width(), frame.height());
            let geometry = TraceGeometry::build(
                self.history,
                self.now_ms,
                &self.settings.vertical_range,
                self.settings.tonic.pitch_class(),
                &area,
                &self.style,
            );

            for &(from, to) in &geometry.connectors {
                let (a, b) = (geometry.points[from], geometry.points[to]);
                frame.stroke(
                    &Path::line(Point::new(a.x, a.y), Point::new(b.x, b.y)),
                    Stroke::default().with_color(CONNECTOR_COLOR).with_width(CONNECTOR_WIDTH),
                );
            }

            for point in &geometry.points {
                let dot = Path::circle(Point::new(point.x, point.y), DOT_RADIUS);
                frame.fill(&dot, to_color(point.color, point.alpha));
            }
        });
        vec![trace]
    }
}
