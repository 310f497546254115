//! # Pipeline Configuration Module
//!
//! All tuning knobs of the detection pipeline live in one explicit,
//! injectable struct. The pipeline reads it at the start of every detection
//! cycle, so band limits can be adjusted live (e.g. from host sliders)
//! without restarting the stream, and multiple pipeline instances stay
//! independent.

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::fretboard::default_tolerances;

/// Configuration for one detection pipeline instance.
///
/// `Default` matches the values the application ships with; hosts may
/// deserialize an override from JSON (see `tab-app`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Samples per analysis window. Larger windows resolve lower
    /// frequencies but add latency (~46ms at 2048/44.1kHz).
    pub block_size: usize,
    /// Sample rate in Hz. Must be the rate the audio device actually
    /// reports, not a nominal constant.
    pub sample_rate: f32,
    /// Lower edge of the fundamental search band in Hz.
    pub fmin: f32,
    /// Upper edge of the fundamental search band in Hz.
    pub fmax: f32,
    /// Absolute threshold for the YIN normalized difference function.
    pub yin_threshold: f32,
    /// RMS level below which a window is treated as silence: volume is
    /// still reported, pitch detection is skipped.
    pub noise_gate: f32,
    /// Capacity of the recent-notes voting window.
    pub recent_window: usize,
    /// Matching entries required within the recent-notes window before a
    /// note is confirmed. 1 reflects every mapped note immediately.
    pub confirmation_count: usize,
    /// Highest fret included in the fretboard table (0 = open strings only).
    pub fret_range: u8,
    /// Per-string acceptance tolerance in Hz, keyed by string number
    /// (6 = low E). Lower strings get narrower tolerances because semitone
    /// spacing in Hz shrinks with pitch.
    pub tolerances: BTreeMap<u8, f32>,
    /// Visible width of each tablature line in characters.
    pub visible_width: usize,
    /// Whether the host should clear the tablature when capture restarts.
    pub clear_tab_on_restart: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            block_size: 2048,
            sample_rate: 44100.0,
            fmin: 50.0,
            fmax: 800.0,
            yin_threshold: 0.15,
            noise_gate: 0.001,
            recent_window: 5,
            confirmation_count: 3,
            fret_range: 3,
            tolerances: default_tolerances().clone(),
            visible_width: 30,
            clear_tab_on_restart: true,
        }
    }
}

impl PipelineConfig {
    /// Checks the invariants the pipeline relies on.
    ///
    /// A degenerate band that only becomes invalid against a particular
    /// sample rate is also caught per-cycle inside the estimator; this is
    /// the up-front check for configuration that can never work.
    pub fn validate(&self) -> Result<()> {
        if self.block_size == 0 {
            bail!("block_size must be positive");
        }
        if !(self.sample_rate.is_finite() && self.sample_rate > 0.0) {
            bail!("sample_rate must be a positive finite number");
        }
        if !(0.0 < self.fmin && self.fmin < self.fmax && self.fmax < self.sample_rate / 2.0) {
            bail!(
                "frequency band must satisfy 0 < fmin < fmax < sample_rate/2 (got {}..{} at {} Hz)",
                self.fmin,
                self.fmax,
                self.sample_rate
            );
        }
        if !(self.yin_threshold > 0.0 && self.yin_threshold.is_finite()) {
            bail!("yin_threshold must be positive");
        }
        if !(self.noise_gate >= 0.0 && self.noise_gate.is_finite()) {
            bail!("noise_gate must be non-negative");
        }
        if self.recent_window == 0 {
            bail!("recent_window must be positive");
        }
        if self.confirmation_count == 0 || self.confirmation_count > self.recent_window {
            bail!(
                "confirmation_count must be in 1..={} (got {})",
                self.recent_window,
                self.confirmation_count
            );
        }
        if self.visible_width == 0 {
            bail!("visible_width must be positive");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        PipelineConfig::default().validate().unwrap();
    }

    #[test]
    fn rejects_inverted_band() {
        let config = PipelineConfig {
            fmin: 800.0,
            fmax: 50.0,
            ..PipelineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_or_nonfinite_sample_rate() {
        for rate in [0.0, -44100.0, f32::NAN] {
            let config = PipelineConfig {
                sample_rate: rate,
                ..PipelineConfig::default()
            };
            assert!(config.validate().is_err(), "rate {} must be rejected", rate);
        }
    }

    #[test]
    fn rejects_band_above_nyquist() {
        let config = PipelineConfig {
            fmax: 30000.0,
            ..PipelineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_confirmation_count_above_window() {
        let config = PipelineConfig {
            recent_window: 5,
            confirmation_count: 6,
            ..PipelineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn immediate_confirmation_is_allowed() {
        let config = PipelineConfig {
            confirmation_count: 1,
            ..PipelineConfig::default()
        };
        config.validate().unwrap();
    }
}
