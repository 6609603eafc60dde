//! # Staff Layout Module
//!
//! Lays out the tonic-relative staff behind the pitch trace: one row per
//! semitone in the visible range, each with an optional grid line and an
//! optional label box drawn at both margins.
//!
//! ## Row styles by semitone offset from the tonic
//! - `0`: tonic line, heavy and black
//! - `2, 6, 8, 10`: light whole-step grid line
//! - `4`: dashed major-third marker
//! - `7`: grey band filling the fifth's cell
//!
//! Labels alternate between an inner and an outer column so neighbouring
//! semitones never overlap. With accidentals hidden, non-diatonic rows
//! stay blank.

use crate::store::{DisplaySettings, StablePitch};
use crate::theory::{PitchClass, Rgb, degree_color, degree_label, is_diatonic, midi_to_note_name};
use crate::trace::AXIS_WIDTH;

/// Highlights fainter than this are not drawn.
const HIGHLIGHT_CUTOFF: f32 = 0.01;
/// Smallest label font size.
const MIN_FONT_SIZE: f32 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowLine {
    Tonic,
    WholeStep,
    MajorThird,
    FifthBand,
}

impl RowLine {
    fn for_offset(offset: u8) -> Option<Self> {
        match offset {
            0 => Some(Self::Tonic),
            2 | 6 | 8 | 10 => Some(Self::WholeStep),
            4 => Some(Self::MajorThird),
            7 => Some(Self::FifthBand),
            _ => None,
        }
    }
}

/// Which of the two label columns a row uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelColumn {
    /// Next to the plot area; the tonic's whole-tone set.
    Inner,
    /// At the canvas edge; the other whole-tone set.
    Outer,
}

impl LabelColumn {
    /// Horizontal centres of the label box on the left and right margins.
    pub fn centers(self, canvas_width: f32) -> [f32; 2] {
        let left = match self {
            Self::Inner => AXIS_WIDTH * 0.75,
            Self::Outer => AXIS_WIDTH * 0.25,
        };
        [left, canvas_width - left]
    }

    /// Width of a label box.
    pub fn box_width() -> f32 {
        AXIS_WIDTH / 2.0 - 4.0
    }
}

/// The held-note overlay on a label.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Highlight {
    pub opacity: f32,
    pub scale: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StaffLabel {
    pub text: String,
    pub color: Rgb,
    pub column: LabelColumn,
    pub font_size: f32,
    pub highlight: Option<Highlight>,
}

/// One semitone of the staff.
#[derive(Debug, Clone, PartialEq)]
pub struct StaffRow {
    pub midi: i32,
    pub y: f32,
    pub cell_top: f32,
    pub cell_height: f32,
    pub line: Option<RowLine>,
    pub label: Option<StaffLabel>,
}

/// Lays out every row of the visible range on a surface `height` pixels
/// tall, lowest pitch first.
pub fn layout(settings: &DisplaySettings, stable: &StablePitch, height: f32) -> Vec<StaffRow> {
    let range = settings.vertical_range;
    let tonic = settings.tonic.pitch_class();

    (range.min_midi..=range.max_midi)
        .map(|midi| {
            let pitch_class = PitchClass::new(midi);
            let offset = pitch_class.offset_from(tonic);
            let diatonic = is_diatonic(tonic, pitch_class);

            let y = range.y_for(midi as f32, height);
            let above = range.y_for(midi as f32 + 1.0, height);
            let below = range.y_for(midi as f32 - 1.0, height);
            // Cells reach the neighbouring rows, so adjacent cells overlap
            // and their labels sit in alternate columns.
            let cell_height = below - above;
            let cell_top = y - cell_height / 2.0;

            if !diatonic && !settings.show_accidentals {
                return StaffRow { midi, y, cell_top, cell_height, line: None, label: None };
            }

            let text = if settings.use_scale_degrees {
                degree_label(offset, diatonic).to_string()
            } else {
                midi_to_note_name(midi)
            };
            let highlight = (stable.pitch_class == Some(pitch_class)
                && stable.opacity > HIGHLIGHT_CUTOFF)
                .then_some(Highlight { opacity: stable.opacity, scale: stable.size });

            StaffRow {
                midi,
                y,
                cell_top,
                cell_height,
                line: RowLine::for_offset(offset),
                label: Some(StaffLabel {
                    text,
                    color: degree_color(offset),
                    column: if offset % 2 == 0 { LabelColumn::Inner } else { LabelColumn::Outer },
                    font_size: (cell_height * 0.7).floor().max(MIN_FONT_SIZE),
                    highlight,
                }),
            }
        })
        .collect()
}
