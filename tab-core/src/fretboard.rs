//! # Fretboard Mapping Module
//!
//! This module converts detected fundamental frequencies into guitar
//! fretboard positions. It precomputes an equal-tempered frequency table
//! for every (string, fret) pair in the configured range and resolves a
//! frequency to the nearest entry within a per-string tolerance.
//!
//! ## Conventions
//! - String 6 is the low E (82.41 Hz), string 1 the high E (329.63 Hz),
//!   standard tuning.
//! - Fret frequencies follow equal temperament: `open * 2^(fret / 12)`.
//! - Tolerances are absolute Hz and narrower on low strings, because
//!   semitone spacing in Hz shrinks with pitch.

use once_cell::sync::Lazy;
use std::collections::BTreeMap;

/// Number of strings on a standard guitar.
pub const STRING_COUNT: u8 = 6;

/// Open-string frequencies in Hz for standard tuning, low E first
/// (strings 6, 5, 4, 3, 2, 1).
pub const OPEN_STRINGS: [f32; STRING_COUNT as usize] =
    [82.41, 110.00, 146.83, 196.00, 246.94, 329.63];

/// Default per-string acceptance tolerance in Hz, keyed by string number.
static DEFAULT_TOLERANCES: Lazy<BTreeMap<u8, f32>> = Lazy::new(|| {
    BTreeMap::from([
        (6, 5.0),
        (5, 5.0),
        (4, 7.0),
        (3, 10.0),
        (2, 12.0),
        (1, 15.0),
    ])
});

pub fn default_tolerances() -> &'static BTreeMap<u8, f32> {
    &DEFAULT_TOLERANCES
}

/// A fretboard position: string 6..=1, fret 0..=fret_range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FretPosition {
    pub string: u8,
    pub fret: u8,
}

#[derive(Debug, Clone)]
struct TableEntry {
    position: FretPosition,
    frequency: f32,
    tolerance: f32,
}

/// Precomputed (string, fret, frequency) table for nearest-position lookup.
///
/// Built once at configuration time; lookups are a linear scan over a few
/// dozen entries, which is negligible next to the estimator.
#[derive(Debug, Clone)]
pub struct FretTable {
    entries: Vec<TableEntry>,
}

impl FretTable {
    /// Builds the table for frets `0..=fret_range` on all six strings.
    ///
    /// Entries are laid out string 6 through string 1, low fret first; this
    /// order is the deterministic tie-break for equidistant frequencies.
    /// Strings missing from `tolerances` fall back to the defaults.
    pub fn new(fret_range: u8, tolerances: &BTreeMap<u8, f32>) -> Self {
        let mut entries = Vec::with_capacity(STRING_COUNT as usize * (fret_range as usize + 1));
        for string in (1..=STRING_COUNT).rev() {
            let open = OPEN_STRINGS[(STRING_COUNT - string) as usize];
            let tolerance = tolerances
                .get(&string)
                .or_else(|| DEFAULT_TOLERANCES.get(&string))
                .copied()
                .unwrap_or(5.0);
            for fret in 0..=fret_range {
                entries.push(TableEntry {
                    position: FretPosition { string, fret },
                    frequency: open * 2.0_f32.powf(fret as f32 / 12.0),
                    tolerance,
                });
            }
        }
        Self { entries }
    }

    /// Maps a frequency to the nearest fretboard position, if any entry
    /// lies within its string's tolerance.
    ///
    /// The scan only replaces the best candidate on a strictly smaller
    /// distance, so the first-indexed entry wins exact ties.
    pub fn map_to_fret(&self, f0: f32) -> Option<FretPosition> {
        let mut best: Option<(&TableEntry, f32)> = None;
        for entry in &self.entries {
            let distance = (entry.frequency - f0).abs();
            match best {
                Some((_, best_distance)) if distance >= best_distance => {}
                _ => best = Some((entry, distance)),
            }
        }
        let (entry, distance) = best?;
        if distance <= entry.tolerance {
            Some(entry.position)
        } else {
            None
        }
    }
}
