//! # Note Stabilizer Module
//!
//! Raw per-window pitch is noisy around note onsets and decays and prone to
//! octave errors. Majority voting over a short history of mapped positions
//! trades a few tens of milliseconds of latency for a stable display.

use std::collections::VecDeque;

use crate::fretboard::FretPosition;

/// Majority-vote debouncer over the most recent mapped fretboard positions.
#[derive(Debug)]
pub struct NoteStabilizer {
    recent: VecDeque<FretPosition>,
    capacity: usize,
    /// Matching entries required before a position is confirmed. A value of
    /// 1 reflects every mapped position immediately.
    confirmation_count: usize,
}

impl NoteStabilizer {
    pub fn new(capacity: usize, confirmation_count: usize) -> Self {
        Self {
            recent: VecDeque::with_capacity(capacity),
            capacity,
            confirmation_count,
        }
    }

    /// Records this cycle's candidate (absent candidates leave the history
    /// untouched) and returns a confirmed position once one key holds at
    /// least `confirmation_count` of the recent entries.
    ///
    /// When several keys qualify at once, the key whose entries appear
    /// earliest in the history wins, which keeps confirmation deterministic.
    pub fn confirm(&mut self, candidate: Option<FretPosition>) -> Option<FretPosition> {
        if let Some(position) = candidate {
            if self.recent.len() == self.capacity {
                self.recent.pop_front();
            }
            self.recent.push_back(position);
        }

        // A threshold of 1 means no debouncing: reflect the current
        // candidate rather than the oldest surviving vote.
        if self.confirmation_count <= 1 {
            return candidate;
        }

        // Tally in first-seen order.
        let mut counts: Vec<(FretPosition, usize)> = Vec::with_capacity(self.recent.len());
        for &position in &self.recent {
            match counts.iter_mut().find(|(key, _)| *key == position) {
                Some((_, count)) => *count += 1,
                None => counts.push((position, 1)),
            }
        }

        counts
            .into_iter()
            .find(|&(_, count)| count >= self.confirmation_count)
            .map(|(position, _)| position)
    }

    /// Clears the voting history, e.g. when capture restarts.
    pub fn reset(&mut self) {
        self.recent.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(string: u8, fret: u8) -> FretPosition {
        FretPosition { string, fret }
    }

    #[test]
    fn confirms_at_exactly_the_threshold() {
        let mut stabilizer = NoteStabilizer::new(5, 3);
        assert_eq!(stabilizer.confirm(Some(pos(5, 0))), None);
        assert_eq!(stabilizer.confirm(Some(pos(5, 0))), None);
        // Third matching entry fires on the earliest qualifying cycle.
        assert_eq!(stabilizer.confirm(Some(pos(5, 0))), Some(pos(5, 0)));
    }

    #[test]
    fn just_below_threshold_confirms_nothing() {
        let mut stabilizer = NoteStabilizer::new(5, 3);
        stabilizer.confirm(Some(pos(5, 0)));
        stabilizer.confirm(Some(pos(5, 0)));
        stabilizer.confirm(Some(pos(6, 1)));
        stabilizer.confirm(Some(pos(6, 1)));
        // Two of each in a window of five, threshold three.
        assert_eq!(stabilizer.confirm(None), None);
    }

    #[test]
    fn absent_candidates_do_not_evict_history() {
        let mut stabilizer = NoteStabilizer::new(5, 3);
        stabilizer.confirm(Some(pos(5, 0)));
        stabilizer.confirm(Some(pos(5, 0)));
        stabilizer.confirm(None);
        stabilizer.confirm(None);
        assert_eq!(stabilizer.confirm(Some(pos(5, 0))), Some(pos(5, 0)));
    }

    #[test]
    fn eviction_forgets_old_votes() {
        let mut stabilizer = NoteStabilizer::new(5, 3);
        stabilizer.confirm(Some(pos(5, 0)));
        stabilizer.confirm(Some(pos(5, 0)));
        for _ in 0..5 {
            stabilizer.confirm(Some(pos(6, 2)));
        }
        // The two old (5,0) votes were evicted; the recent majority still
        // holds the window.
        assert_eq!(stabilizer.confirm(Some(pos(5, 0))), Some(pos(6, 2)));
    }

    #[test]
    fn immediate_mode_reflects_every_candidate() {
        let mut stabilizer = NoteStabilizer::new(5, 1);
        assert_eq!(stabilizer.confirm(Some(pos(3, 2))), Some(pos(3, 2)));
        assert_eq!(stabilizer.confirm(Some(pos(4, 1))), Some(pos(4, 1)));
    }

    #[test]
    fn earliest_qualifying_key_wins() {
        let mut stabilizer = NoteStabilizer::new(6, 2);
        stabilizer.confirm(Some(pos(5, 0)));
        stabilizer.confirm(Some(pos(6, 1)));
        stabilizer.confirm(Some(pos(6, 1)));
        // Both keys qualify after another (5,0); the one seen first in the
        // history wins.
        assert_eq!(stabilizer.confirm(Some(pos(5, 0))), Some(pos(5, 0)));
    }

    #[test]
    fn reset_clears_votes() {
        let mut stabilizer = NoteStabilizer::new(5, 2);
        stabilizer.confirm(Some(pos(5, 0)));
        stabilizer.reset();
        assert_eq!(stabilizer.confirm(Some(pos(5, 0))), None);
    }
}
