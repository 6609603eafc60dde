//! # Vertical Range Module
//!
//! The visible pitch window of the staff and the trace. The user widens or
//! narrows either edge one semitone at a time; the window always shows at
//! least an octave and never leaves the MIDI span 33..=81 (A1 to A5).

/// Lowest MIDI pitch the window may show.
pub const ULTIMATE_MIN: i32 = 33;
/// Highest MIDI pitch the window may show.
pub const ULTIMATE_MAX: i32 = 81;
/// Smallest allowed distance between the two edges, in semitones.
pub const MIN_SPAN: i32 = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeDirection {
    Expand,
    Contract,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeEdge {
    Upper,
    Lower,
}

/// Inclusive MIDI bounds of the visible pitch window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerticalRange {
    pub min_midi: i32,
    pub max_midi: i32,
}

impl Default for VerticalRange {
    fn default() -> Self {
        Self { min_midi: ULTIMATE_MIN, max_midi: ULTIMATE_MAX }
    }
}

impl VerticalRange {
    /// Moves one edge by a semitone.
    ///
    /// A move that would break the span or bounds invariant is silently
    /// ignored.
    pub fn adjust(&mut self, direction: RangeDirection, edge: RangeEdge) {
        match (edge, direction) {
            (RangeEdge::Upper, RangeDirection::Expand) => {
                if self.max_midi < ULTIMATE_MAX {
                    self.max_midi += 1;
                }
            }
            (RangeEdge::Upper, RangeDirection::Contract) => {
                if self.max_midi - 1 >= self.min_midi + MIN_SPAN {
                    self.max_midi -= 1;
                }
            }
            (RangeEdge::Lower, RangeDirection::Expand) => {
                if self.min_midi > ULTIMATE_MIN {
                    self.min_midi -= 1;
                }
            }
            (RangeEdge::Lower, RangeDirection::Contract) => {
                if self.min_midi + 1 <= self.max_midi - MIN_SPAN {
                    self.min_midi += 1;
                }
            }
        }
    }

    pub fn span(&self) -> i32 {
        self.max_midi - self.min_midi
    }

    /// Maps a MIDI pitch to a y coordinate on a surface `height` pixels
    /// tall. Higher pitches sit nearer the top.
    ///
    /// An empty window maps everything to the vertical midpoint.
    pub fn y_for(&self, midi: f32, height: f32) -> f32 {
        if self.max_midi == self.min_midi {
            return height / 2.0;
        }
        let normalized = (midi - self.min_midi as f32) / self.span() as f32;
        height - normalized * height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expanding_at_the_limits_is_a_no_op() {
        let mut range = VerticalRange::default();
        range.adjust(RangeDirection::Expand, RangeEdge::Upper);
        range.adjust(RangeDirection::Expand, RangeEdge::Lower);
        assert_eq!(range, VerticalRange::default());
    }

    #[test]
    fn contracting_stops_at_one_octave() {
        let mut range = VerticalRange::default();
        for _ in 0..100 {
            range.adjust(RangeDirection::Contract, RangeEdge::Upper);
        }
        assert_eq!(range, VerticalRange { min_midi: 33, max_midi: 45 });

        for _ in 0..5 {
            range.adjust(RangeDirection::Contract, RangeEdge::Lower);
        }
        assert_eq!(range.min_midi, 33);
    }

    #[test]
    fn y_mapping_is_inverted_and_guards_empty_window() {
        let range = VerticalRange { min_midi: 48, max_midi: 72 };
        assert_eq!(range.y_for(48.0, 600.0), 600.0);
        assert_eq!(range.y_for(72.0, 600.0), 0.0);
        assert_eq!(range.y_for(60.0, 600.0), 300.0);

        let empty = VerticalRange { min_midi: 60, max_midi: 60 };
        assert_eq!(empty.y_for(64.0, 600.0), 300.0);
    }
}
