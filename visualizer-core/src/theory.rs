//! # Music Theory Module
//!
//! Static tables the visualizer reads everywhere: pitch classes and their
//! names, tonic spellings with enharmonic aliases, major-scale membership
//! relative to a tonic, scale-degree labels and the per-degree color
//! palette. Everything is based on twelve-tone equal temperament with
//! A4 = 440 Hz.

use crate::NoteSpecError;
use once_cell::sync::Lazy;
use std::collections::BTreeMap;
use std::fmt;

/// MIDI number of A4.
pub const A4_MIDI: f32 = 69.0;
/// Reference frequency of A4 in Hz.
pub const A4_FREQUENCY: f32 = 440.0;

/// Sharp spellings of the twelve pitch classes, starting at C.
pub const NOTE_NAMES: [&str; 12] = [
    "C", "C♯", "D", "D♯", "E", "F", "F♯", "G", "G♯", "A", "A♯", "B",
];

/// Semitone offsets of the major scale from its tonic.
pub const MAJOR_SCALE: [u8; 7] = [0, 2, 4, 5, 7, 9, 11];

/// Tonics offered in the tonic picker, in display order.
const SELECTABLE_TONICS: [&str; 14] = [
    "C", "C♯", "D♭", "D", "E♭", "E", "F", "F♯", "G♭", "G", "A♭", "A", "B♭", "B",
];

/// Every accepted tonic spelling mapped to its semitone distance from C.
static TONIC_SEMITONES: Lazy<BTreeMap<&'static str, u8>> = Lazy::new(|| {
    [
        ("C", 0), ("C♯", 1), ("D♭", 1), ("D", 2), ("D♯", 3), ("E♭", 3),
        ("E", 4), ("F♭", 4), ("F", 5), ("E♯", 5), ("F♯", 6), ("G♭", 6),
        ("G", 7), ("G♯", 8), ("A♭", 8), ("A", 9), ("A♯", 10), ("B♭", 10),
        ("B", 11),
    ]
    .into_iter()
    .collect()
});

/// Label background colors, indexed by semitone offset from the tonic.
pub const DEGREE_PALETTE: [Rgb; 12] = [
    Rgb::from_hex(0xef8aab),
    Rgb::from_hex(0xf48e7d),
    Rgb::from_hex(0xe89955),
    Rgb::from_hex(0xcdaa42),
    Rgb::from_hex(0xa4ba57),
    Rgb::from_hex(0x6ec482),
    Rgb::from_hex(0x2dc8b1),
    Rgb::from_hex(0x16c3da),
    Rgb::from_hex(0x58b8f6),
    Rgb::from_hex(0x8fa9ff),
    Rgb::from_hex(0xba9bf2),
    Rgb::from_hex(0xdb8fd4),
];

/// A pitch class in `0..12`, where 0 is C.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct PitchClass(u8);

impl PitchClass {
    /// Reduces any semitone count to its pitch class. Negative inputs wrap
    /// around, so `-1` is B.
    pub fn new(semitones: i32) -> Self {
        Self(semitones.rem_euclid(12) as u8)
    }

    /// Pitch class of the nearest equal-tempered note.
    pub fn from_midi(midi: f32) -> Self {
        Self::new(midi.round() as i32)
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn name(self) -> &'static str {
        NOTE_NAMES[self.index()]
    }

    /// Semitones from `tonic` up to this pitch class, in `0..12`.
    pub fn offset_from(self, tonic: PitchClass) -> u8 {
        (self.0 + 12 - tonic.0) % 12
    }
}

/// The user-selected reference pitch, keeping the spelling it was chosen by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tonic {
    name: &'static str,
    pitch_class: PitchClass,
}

impl Tonic {
    /// Parses a tonic spelling. ASCII `#`/`b` and Unicode `♯`/`♭` are both
    /// accepted, so `"F#"`, `"F♯"` and `"Gb"` all resolve.
    pub fn parse(name: &str) -> Option<Self> {
        let normalized = normalize_accidentals(name.trim());
        TONIC_SEMITONES
            .get_key_value(normalized.as_str())
            .map(|(&name, &semitones)| Self {
                name,
                pitch_class: PitchClass::new(semitones as i32),
            })
    }

    /// The tonics offered for selection.
    pub fn selectable() -> Vec<Self> {
        SELECTABLE_TONICS.iter().filter_map(|name| Self::parse(name)).collect()
    }

    pub fn name(self) -> &'static str {
        self.name
    }

    pub fn pitch_class(self) -> PitchClass {
        self.pitch_class
    }
}

impl Default for Tonic {
    fn default() -> Self {
        Self { name: "C", pitch_class: PitchClass(0) }
    }
}

impl fmt::Display for Tonic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Rewrites ASCII accidentals after the letter into their Unicode forms.
fn normalize_accidentals(name: &str) -> String {
    let mut chars = name.chars();
    let mut out = String::with_capacity(name.len() + 4);
    if let Some(letter) = chars.next() {
        out.push(letter.to_ascii_uppercase());
    }
    for c in chars {
        match c {
            '#' => out.push('♯'),
            'b' => out.push('♭'),
            other => out.push(other),
        }
    }
    out
}

/// Whether `pitch_class` belongs to the major scale built on `tonic`.
pub fn is_diatonic(tonic: PitchClass, pitch_class: PitchClass) -> bool {
    MAJOR_SCALE.contains(&pitch_class.offset_from(tonic))
}

/// The seven pitch classes of the major scale on `tonic`, in scale order.
pub fn major_scale(tonic: PitchClass) -> [PitchClass; 7] {
    MAJOR_SCALE.map(|step| PitchClass::new(tonic.value() as i32 + step as i32))
}

/// Scale-degree label for a semitone offset from the tonic.
///
/// Diatonic offsets use the plain and flattened degree names; chromatic
/// offsets outside the scale get the two-way spelling (e.g. `#4/♭5`).
pub fn degree_label(offset: u8, diatonic: bool) -> &'static str {
    if diatonic {
        match offset {
            0 => "1",
            1 => "♭2",
            2 => "2",
            3 => "♭3",
            4 => "3",
            5 => "4",
            6 => "♭5",
            7 => "5",
            8 => "♭6",
            9 => "6",
            10 => "♭7",
            11 => "7",
            _ => "",
        }
    } else {
        match offset {
            1 => "#1/♭2",
            3 => "#2/♭3",
            6 => "#4/♭5",
            8 => "#5/♭6",
            10 => "#6/♭7",
            _ => "",
        }
    }
}

/// Converts a frequency in Hz to a fractional MIDI pitch.
pub fn frequency_to_midi(frequency: f32) -> f32 {
    A4_MIDI + 12.0 * (frequency / A4_FREQUENCY).log2()
}

/// Converts a (possibly fractional) MIDI pitch to a frequency in Hz.
pub fn midi_to_frequency(midi: f32) -> f32 {
    A4_FREQUENCY * 2f32.powf((midi - A4_MIDI) / 12.0)
}

/// Scientific-pitch octave number, where middle C (60) is octave 4.
pub fn octave_of(midi: f32) -> i32 {
    (midi / 12.0).floor() as i32 - 1
}

/// Sharp-spelled note name with octave, e.g. `C♯4` for MIDI 61.
pub fn midi_to_note_name(midi: i32) -> String {
    format!("{}{}", PitchClass::new(midi).name(), midi.div_euclid(12) - 1)
}

/// Parses a note name with octave (`"F#3"`, `"G♭3"`, `"c-1"`) to a MIDI
/// number.
///
/// # Returns
/// * `Ok(midi)` - MIDI number of the note
/// * `Err(e)` - The letter, accidentals or octave could not be read
pub fn parse_note(spec: &str) -> Result<i32, NoteSpecError> {
    let spec = spec.trim();
    let mut chars = spec.char_indices().peekable();

    let base = match chars.next().map(|(_, c)| c.to_ascii_uppercase()) {
        Some('C') => 0,
        Some('D') => 2,
        Some('E') => 4,
        Some('F') => 5,
        Some('G') => 7,
        Some('A') => 9,
        Some('B') => 11,
        _ => return Err(NoteSpecError::UnknownName(spec.to_string())),
    };

    let mut accidental = 0;
    let mut octave_start = spec.len();
    while let Some(&(i, c)) = chars.peek() {
        match c {
            '#' | '♯' => accidental += 1,
            'b' | '♭' => accidental -= 1,
            _ => {
                octave_start = i;
                break;
            }
        }
        chars.next();
    }

    let octave: i32 = spec[octave_start..]
        .parse()
        .map_err(|_| NoteSpecError::InvalidOctave(spec.to_string()))?;

    Ok((octave + 1) * 12 + base + accidental)
}

/// An 8-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn from_hex(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xff) as u8,
            g: ((hex >> 8) & 0xff) as u8,
            b: (hex & 0xff) as u8,
        }
    }

    /// Channel-wise linear blend toward `other`, rounded to the nearest
    /// integer.
    pub fn lerp(self, other: Rgb, factor: f32) -> Rgb {
        let mix = |a: u8, b: u8| (a as f32 + factor * (b as f32 - a as f32)).round() as u8;
        Rgb {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
        }
    }
}

/// Palette color for a scale degree.
pub fn degree_color(offset: u8) -> Rgb {
    DEGREE_PALETTE[offset as usize % 12]
}

/// Continuous trace color for a fractional MIDI pitch.
///
/// The integer part picks the tonic-relative palette entry and the
/// fractional part blends toward the next semitone's entry, so bent notes
/// drift smoothly between colors.
pub fn trace_color(midi: f32, tonic: PitchClass) -> Rgb {
    let floor = midi.floor();
    let fraction = midi - floor;
    let offset = PitchClass::new(floor as i32).offset_from(tonic);
    degree_color(offset).lerp(degree_color(offset + 1), fraction)
}
