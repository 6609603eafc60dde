//! # Pitch Trace Geometry
//!
//! Maps the pitch history into screen space for the scrolling trace. Time
//! runs left to right across the plot area, with the newest point on the
//! right edge; pitch runs bottom to top through the current vertical range.
//! Silence points leave gaps.
//!
//! Everything here is a pure function of its inputs and is recomputed from
//! scratch whenever the history or the display settings change.

use crate::range::VerticalRange;
use crate::store::HistoryPoint;
use crate::theory::{PitchClass, Rgb, trace_color};

/// Width reserved on each side of the canvas for the staff labels.
pub const AXIS_WIDTH: f32 = 200.0;
/// Gap between a label column and the plot area.
pub const PLOT_PADDING: f32 = 5.0;

/// Horizontal extent of the trace and the canvas height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotArea {
    pub x: f32,
    pub width: f32,
    pub height: f32,
}

impl PlotArea {
    /// The plot area left between the two label columns of a canvas.
    pub fn for_canvas(width: f32, height: f32) -> Self {
        let x = AXIS_WIDTH + PLOT_PADDING;
        Self { x, width: (width - 2.0 * x).max(0.0), height }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }
}

/// A history point placed on the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TracePoint {
    pub x: f32,
    pub y: f32,
    pub color: Rgb,
    pub alpha: f32,
}

/// Tunables of the trace layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraceStyle {
    /// How far back the trace reaches, in milliseconds.
    pub time_window_ms: f64,
    /// Largest pixel distance two points may have and still be joined.
    pub proximity_px: f32,
    /// Most forward connectors drawn from one point.
    pub max_connections: usize,
}

impl Default for TraceStyle {
    fn default() -> Self {
        Self { time_window_ms: 4000.0, proximity_px: 35.0, max_connections: 3 }
    }
}

impl From<&crate::config::VisualizerConfig> for TraceStyle {
    fn from(config: &crate::config::VisualizerConfig) -> Self {
        Self {
            time_window_ms: config.time_window_ms,
            proximity_px: config.proximity_px,
            max_connections: config.max_connections,
        }
    }
}

/// Places every detected point younger than the time window.
///
/// A point exactly one window old lands on the left edge of the plot and
/// is dropped.
pub fn map_history<'a>(
    history: impl IntoIterator<Item = &'a HistoryPoint>,
    now_ms: f64,
    range: &VerticalRange,
    tonic: PitchClass,
    area: &PlotArea,
    time_window_ms: f64,
) -> Vec<TracePoint> {
    history
        .into_iter()
        .filter_map(|point| {
            let midi = point.midi()?;
            let age = (now_ms - point.timestamp_ms) / time_window_ms;
            let x = area.x + area.width * (1.0 - age as f32);
            if x <= area.x {
                return None;
            }
            Some(TracePoint {
                x,
                y: range.y_for(midi, area.height),
                color: trace_color(midi, tonic),
                alpha: (point.confidence * 0.9).min(1.0),
            })
        })
        .collect()
}

/// Pairs of point indices to join with a line.
///
/// Each point looks forward in sequence order and joins at most
/// `max_connections` later points within `proximity_px`.
pub fn connectors(points: &[TracePoint], proximity_px: f32, max_connections: usize) -> Vec<(usize, usize)> {
    let mut pairs = Vec::new();
    for (i, a) in points.iter().enumerate() {
        let mut made = 0;
        for (j, b) in points.iter().enumerate().skip(i + 1) {
            if made >= max_connections {
                break;
            }
            if (b.x - a.x).hypot(b.y - a.y) <= proximity_px {
                pairs.push((i, j));
                made += 1;
            }
        }
    }
    pairs
}

/// Points plus the lines between them, ready to draw.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TraceGeometry {
    pub points: Vec<TracePoint>,
    pub connectors: Vec<(usize, usize)>,
}

impl TraceGeometry {
    pub fn build<'a>(
        history: impl IntoIterator<Item = &'a HistoryPoint>,
        now_ms: f64,
        range: &VerticalRange,
        tonic: PitchClass,
        area: &PlotArea,
        style: &TraceStyle,
    ) -> Self {
        let points = map_history(history, now_ms, range, tonic, area, style.time_window_ms);
        let connectors = connectors(&points, style.proximity_px, style.max_connections);
        Self { points, connectors }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theory::DEGREE_PALETTE;

    fn area() -> PlotArea {
        PlotArea::for_canvas(1410.0, 480.0)
    }

    #[test]
    fn plot_area_sits_between_label_columns() {
        let area = area();
        assert_eq!(area.x, 205.0);
        assert_eq!(area.width, 1000.0);
        assert_eq!(area.right(), 1205.0);
    }

    #[test]
    fn newest_point_is_on_the_right_edge_and_aged_points_drop() {
        let history = [
            HistoryPoint::detected(6000.0, 57.0, 1.0),
            HistoryPoint::detected(6001.0, 57.0, 1.0),
            HistoryPoint::detected(8000.0, 57.0, 0.5),
            HistoryPoint::detected(10000.0, 45.0, 0.9),
        ];
        let points = map_history(
            &history,
            10000.0,
            &VerticalRange::default(),
            PitchClass::new(9),
            &area(),
            4000.0,
        );

        assert_eq!(points.len(), 3);
        assert!(points[0].x > 205.0 && points[0].x < 206.0);
        assert_eq!(points[1].x, 705.0);
        assert_eq!(points[2].x, 1205.0);
        assert_eq!(points[2].y, 360.0);
        assert!((points[1].alpha - 0.45).abs() < 1e-6);
        assert_eq!(points[2].color, DEGREE_PALETTE[0]);
    }

    #[test]
    fn silence_leaves_a_gap() {
        let history = [
            HistoryPoint::detected(900.0, 60.0, 0.9),
            HistoryPoint::silence(950.0),
            HistoryPoint::detected(1000.0, 60.0, 0.9),
        ];
        let points = map_history(
            &history,
            1000.0,
            &VerticalRange::default(),
            PitchClass::new(0),
            &area(),
            4000.0,
        );
        assert_eq!(points.len(), 2);
    }

    #[test]
    fn connectors_are_forward_near_and_capped() {
        let at = |x: f32| TracePoint { x, y: 100.0, color: DEGREE_PALETTE[0], alpha: 1.0 };
        let points: Vec<TracePoint> = [0.0, 5.0, 10.0, 15.0, 20.0, 200.0].map(at).to_vec();

        let pairs = connectors(&points, 35.0, 3);
        assert_eq!(pairs.iter().filter(|(i, _)| *i == 0).count(), 3);
        assert!(pairs.contains(&(0, 1)) && pairs.contains(&(0, 3)));
        assert!(!pairs.contains(&(0, 4)));
        assert!(pairs.iter().all(|(i, j)| i < j));
        assert!(pairs.iter().all(|&(_, j)| j != 5));
    }
}
