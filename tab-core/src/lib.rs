// tab-core/src/lib.rs

//! The core logic for the real-time guitar tablature transcriber.
//! This crate turns a stream of raw microphone chunks into stable
//! (string, fret) note decisions: ring-buffered windowing, YIN pitch
//! estimation, majority-vote stabilization, and fretboard mapping.
//! It is completely headless and contains no UI code.

pub mod audio;
pub mod config;
pub mod fretboard;
pub mod pipeline;
pub mod pitch;
pub mod ring;
pub mod stabilizer;
pub mod tab;

pub use config::PipelineConfig;
pub use fretboard::{FretPosition, FretTable};
pub use pipeline::{DisplaySink, Pipeline, PipelineState};
pub use pitch::FrequencyBand;
pub use ring::RingBuffer;
pub use stabilizer::NoteStabilizer;
pub use tab::TablatureState;
