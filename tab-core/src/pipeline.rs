//! # Detection Pipeline Module
//!
//! This module owns the per-chunk control flow of the transcriber: chunks
//! from the audio source are absorbed by the ring buffer, whole analysis
//! windows run through the YIN estimator, and confirmed notes are pushed to
//! the display sink.
//!
//! ## Model
//! - Single-threaded and callback-driven: `on_chunk` runs one bounded
//!   detection cycle to completion, no locks, no internal threads.
//! - All per-cycle "nothing found" outcomes are normal; the cycle simply
//!   produces fewer reports. Volume is reported every cycle, pitch and
//!   notes only when present.
//! - The sink calls are fire-and-forget notifications. If the display lives
//!   on another thread, the sink implementation is responsible for the
//!   thread-safe handoff (see `tab-app`).

use anyhow::Result;

use crate::config::PipelineConfig;
use crate::fretboard::FretTable;
use crate::pitch::{self, FrequencyBand};
use crate::ring::RingBuffer;
use crate::stabilizer::NoteStabilizer;

/// Receiver of pipeline results. Implemented by the host's display layer.
pub trait DisplaySink {
    /// Called every detection cycle with the window's RMS level, scaled to
    /// a 0..=100 percentage.
    fn report_volume(&mut self, percent: f32);
    /// Called when a cycle produced a valid in-band fundamental. Not called
    /// on cycles without a detection.
    fn report_frequency(&mut self, hz: f32);
    /// Called when the stabilizer confirmed a fretboard position.
    fn report_note(&mut self, string: u8, fret: u8);
}

/// Lifecycle state of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// No audio source attached; chunks are ignored.
    Idle,
    /// Attached and processing chunks.
    Running,
}

/// The pipeline controller. Owns the ring buffer, the stabilizer, the
/// fretboard table, and the display sink.
pub struct Pipeline<S: DisplaySink> {
    config: PipelineConfig,
    ring: RingBuffer,
    stabilizer: NoteStabilizer,
    fret_table: FretTable,
    sink: S,
    state: PipelineState,
}

impl<S: DisplaySink> Pipeline<S> {
    /// Builds an idle pipeline after validating the configuration.
    pub fn new(config: PipelineConfig, sink: S) -> Result<Self> {
        config.validate()?;
        let ring = RingBuffer::new(config.block_size);
        let stabilizer = NoteStabilizer::new(config.recent_window, config.confirmation_count);
        let fret_table = FretTable::new(config.fret_range, &config.tolerances);
        Ok(Self {
            config,
            ring,
            stabilizer,
            fret_table,
            sink,
            state: PipelineState::Idle,
        })
    }

    /// Idle -> Running. Clears buffered samples and voting history so a
    /// fresh capture never sees stale state.
    pub fn start(&mut self) {
        self.ring.reset();
        self.stabilizer.reset();
        self.state = PipelineState::Running;
        eprintln!("[PIPELINE] Running at {} Hz", self.config.sample_rate);
    }

    /// Running -> Idle. Takes effect before the next chunk; a cycle already
    /// in progress always runs to completion.
    pub fn stop(&mut self) {
        self.state = PipelineState::Idle;
        self.ring.reset();
        self.stabilizer.reset();
        eprintln!("[PIPELINE] Stopped");
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Adjusts the search band while running. Read at the start of the next
    /// cycle; a degenerate band yields no detections until corrected.
    pub fn set_band(&mut self, fmin: f32, fmax: f32) {
        self.config.fmin = fmin;
        self.config.fmax = fmax;
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Processes one chunk from the audio source: one bounded detection
    /// cycle, or a no-op while idle or until enough samples have buffered.
    pub fn on_chunk(&mut self, chunk: &[f32]) {
        if self.state != PipelineState::Running {
            return;
        }

        self.ring.push(chunk);
        let Some(window) = self.ring.try_read_window() else {
            return;
        };

        // Malformed input is recovered locally: drop the window, keep the
        // stream alive.
        if window.iter().any(|s| !s.is_finite()) {
            eprintln!("[PIPELINE] Discarding window containing non-finite samples");
            return;
        }

        let rms = (window.iter().map(|&s| s * s).sum::<f32>() / window.len() as f32).sqrt();
        self.sink.report_volume((rms * 400.0).min(100.0));

        // Below the gate there is nothing worth estimating; the volume
        // report above already happened.
        if rms < self.config.noise_gate {
            return;
        }

        let band = FrequencyBand::new(self.config.fmin, self.config.fmax);
        let Some(f0) = pitch::detect_pitch(
            window,
            self.config.yin_threshold,
            self.config.sample_rate,
            band,
        ) else {
            return;
        };

        self.sink.report_frequency(f0);

        let candidate = self.fret_table.map_to_fret(f0);
        if let Some(position) = self.stabilizer.confirm(candidate) {
            self.sink.report_note(position.string, position.fret);
        }
    }
}
