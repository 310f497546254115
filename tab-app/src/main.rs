//! # Tab App - Real-time Guitar Tablature Transcriber
//!
//! Terminal host for `tab-core`.
//!
//! ## Architecture
//! - **Audio Thread**: owns the cpal stream and the detection pipeline;
//!   every captured chunk is processed to completion on this thread.
//! - **Main Thread**: renders the frequency readout, volume bar, and
//!   rolling tablature from display updates.
//! - **Communication**: crossbeam channels for thread-safe data exchange;
//!   the pipeline's sink never blocks on the renderer.

use anyhow::{Context, Result};
use cpal::traits::StreamTrait;
use crossbeam_channel::{Receiver, Sender};
use std::io::Write;
use std::thread::{self, JoinHandle};
use tab_core::pipeline::DisplaySink;
use tab_core::{Pipeline, PipelineConfig, TablatureState};

/// One pipeline report crossing from the audio thread to the renderer.
#[derive(Debug, Clone, Copy)]
enum DisplayUpdate {
    Volume(f32),
    Frequency(f32),
    Note { string: u8, fret: u8 },
}

/// Sink that forwards reports over a channel.
///
/// `try_send` keeps the audio thread non-blocking: if the renderer falls
/// behind, stale updates are dropped, never queued without bound.
struct ChannelSink {
    updates: Sender<DisplayUpdate>,
}

impl DisplaySink for ChannelSink {
    fn report_volume(&mut self, percent: f32) {
        let _ = self.updates.try_send(DisplayUpdate::Volume(percent));
    }

    fn report_frequency(&mut self, hz: f32) {
        let _ = self.updates.try_send(DisplayUpdate::Frequency(hz));
    }

    fn report_note(&mut self, string: u8, fret: u8) {
        let _ = self.updates.try_send(DisplayUpdate::Note { string, fret });
    }
}

/// Audio worker thread management structure.
struct AudioWorker {
    shutdown_tx: Sender<()>,
    thread_handle: Option<JoinHandle<()>>,
}

fn main() -> Result<()> {
    let config = load_config()?;
    config.validate()?;

    eprintln!("[APP] Starting transcriber...");

    let (update_tx, update_rx) = crossbeam_channel::bounded(256);
    let worker = start_audio_thread(config.clone(), update_tx);

    // Enter stops the session.
    let quit_rx = wait_for_enter();
    println!("Listening. Press Enter to stop.\n");

    run_display_loop(&config, update_rx, quit_rx);

    eprintln!("[APP] Shutting down audio worker...");
    let _ = worker.shutdown_tx.send(());
    if let Some(handle) = worker.thread_handle {
        let _ = handle.join();
    }
    eprintln!("[APP] Done");
    Ok(())
}

/// Loads the pipeline configuration, optionally overridden by a JSON file
/// given as the first argument.
fn load_config() -> Result<PipelineConfig> {
    match std::env::args().nth(1) {
        Some(path) => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("reading config file {}", path))?;
            let config: PipelineConfig =
                serde_json::from_str(&text).with_context(|| format!("parsing {}", path))?;
            eprintln!("[APP] Loaded configuration from {}", path);
            Ok(config)
        }
        None => Ok(PipelineConfig::default()),
    }
}

/// Spawns the dedicated audio thread: capture stream, pipeline, and a
/// select loop that processes chunks until shutdown.
fn start_audio_thread(config: PipelineConfig, update_tx: Sender<DisplayUpdate>) -> AudioWorker {
    let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded(1);
    let thread_handle = thread::spawn(move || {
        eprintln!("[AUDIO-THREAD] Starting audio thread...");
        let (raw_audio_tx, raw_audio_rx) = crossbeam_channel::unbounded::<Vec<f32>>();

        let (stream, sample_rate) = match tab_core::audio::start_capture(raw_audio_tx) {
            Ok(tuple) => tuple,
            Err(e) => {
                eprintln!("[AUDIO-THREAD] Fatal error starting audio: {}", e);
                return;
            }
        };

        // The device's reported rate replaces whatever the config assumed.
        let config = PipelineConfig {
            sample_rate: sample_rate as f32,
            ..config
        };
        let sink = ChannelSink { updates: update_tx };
        let mut pipeline = match Pipeline::new(config, sink) {
            Ok(pipeline) => pipeline,
            Err(e) => {
                eprintln!("[AUDIO-THREAD] Invalid configuration: {}", e);
                return;
            }
        };
        pipeline.start();

        loop {
            crossbeam_channel::select! {
                recv(raw_audio_rx) -> msg => match msg {
                    Ok(chunk) => pipeline.on_chunk(&chunk),
                    Err(_) => {
                        eprintln!("[AUDIO-THREAD] Audio channel closed");
                        break;
                    }
                },
                recv(shutdown_rx) -> _ => {
                    eprintln!("[AUDIO-THREAD] Received shutdown signal");
                    break;
                }
            }
        }

        pipeline.stop();
        if let Err(e) = stream.pause() {
            eprintln!("[AUDIO-THREAD] Error pausing stream: {}", e);
        }
        drop(stream);
        eprintln!("[AUDIO-THREAD] Audio thread finished");
    });

    AudioWorker {
        shutdown_tx,
        thread_handle: Some(thread_handle),
    }
}

/// Spawns a thread that signals once the user presses Enter.
fn wait_for_enter() -> Receiver<()> {
    let (quit_tx, quit_rx) = crossbeam_channel::bounded(1);
    thread::spawn(move || {
        let mut line = String::new();
        let _ = std::io::stdin().read_line(&mut line);
        let _ = quit_tx.send(());
    });
    quit_rx
}

/// Renders display updates until the user quits or the audio thread dies.
fn run_display_loop(
    config: &PipelineConfig,
    update_rx: Receiver<DisplayUpdate>,
    quit_rx: Receiver<()>,
) {
    // A single capture session: the tablature starts fresh. Hosts that
    // restart capture consult `clear_tab_on_restart` to decide whether to
    // call `reset()` between sessions.
    let mut tab = TablatureState::new(config.visible_width);

    let mut volume = 0.0f32;
    let mut frequency: Option<f32> = None;

    loop {
        crossbeam_channel::select! {
            recv(update_rx) -> msg => match msg {
                Ok(DisplayUpdate::Volume(percent)) => {
                    volume = percent;
                    draw_status(volume, frequency);
                }
                Ok(DisplayUpdate::Frequency(hz)) => {
                    frequency = Some(hz);
                    draw_status(volume, frequency);
                }
                Ok(DisplayUpdate::Note { string, fret }) => {
                    tab.append(tab_core::FretPosition { string, fret });
                    draw_tab(&tab);
                }
                Err(_) => {
                    eprintln!("[APP] Display channel closed");
                    break;
                }
            },
            recv(quit_rx) -> _ => break,
        }
    }

    // Leave the final tablature on screen.
    println!("\n\nFinal tablature:\n{}", tab.render());
}

fn draw_status(volume: f32, frequency: Option<f32>) {
    let filled = (volume / 5.0).round() as usize;
    let bar: String = "#".repeat(filled.min(20));
    let readout = match frequency {
        Some(hz) => format!("{:7.1} Hz", hz),
        None => "     -- Hz".to_string(),
    };
    print!("\r[{:<20}] {}", bar, readout);
    let _ = std::io::stdout().flush();
}

fn draw_tab(tab: &TablatureState) {
    println!("\n{}\n", tab.render());
}
