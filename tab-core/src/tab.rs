//! # Tablature State Module
//!
//! Maintains the six rolling tablature lines the display renders, low E on
//! top. Only the visible suffix of each line is retained; the logical
//! length keeps growing so hosts can tell how much history scrolled past.

use crate::fretboard::{FretPosition, STRING_COUNT};

/// Line headers, low E (string 6) first.
const LINE_HEADERS: [&str; STRING_COUNT as usize] = ["E|", "A|", "D|", "G|", "B|", "E|"];

/// Six parallel character sequences, one per string, appended once per
/// confirmed note and right-truncated to the visible width.
#[derive(Debug, Clone)]
pub struct TablatureState {
    lines: [String; STRING_COUNT as usize],
    visible_width: usize,
    logical_len: u64,
}

impl TablatureState {
    pub fn new(visible_width: usize) -> Self {
        Self {
            lines: LINE_HEADERS.map(String::from),
            visible_width,
            logical_len: 0,
        }
    }

    /// Appends one confirmed note: the fret number on its string's line,
    /// dashes of the same width on every other line.
    ///
    /// Frets of 10 and above take two columns; the other lines pad to match
    /// so the columns stay aligned.
    pub fn append(&mut self, position: FretPosition) {
        let cell = position.fret.to_string();
        let row = (STRING_COUNT - position.string) as usize;
        for (i, line) in self.lines.iter_mut().enumerate() {
            if i == row {
                line.push_str(&cell);
            } else {
                for _ in 0..cell.len() {
                    line.push('-');
                }
            }
            // Retain only the visible suffix. All cells are ASCII.
            if line.len() > self.visible_width {
                let cut = line.len() - self.visible_width;
                line.drain(..cut);
            }
        }
        self.logical_len += cell.len() as u64;
    }

    /// The rendered display block, one line per string.
    pub fn render(&self) -> String {
        self.lines.join("\n")
    }

    /// Total columns ever appended, including those scrolled out of view.
    pub fn logical_len(&self) -> u64 {
        self.logical_len
    }

    /// Restores the empty header lines.
    pub fn reset(&mut self) {
        self.lines = LINE_HEADERS.map(String::from);
        self.logical_len = 0;
    }
}
