//! # Audio Capture Module
//!
//! This module handles real-time audio capture using CPAL (Cross-Platform
//! Audio Library) and is the only part of the crate that touches hardware.
//! It delivers raw callback chunks to the pipeline over a channel; chunk
//! sizes are whatever the device driver produces, and the pipeline's ring
//! buffer reassembles them into analysis windows.
//!
//! ## Features
//! - Default input device selection with closest-rate config search
//! - Mono 32-bit float streaming
//! - Non-blocking hand-off: a full channel drops the chunk instead of
//!   stalling the audio callback
//! - The device's actual sample rate is reported back to the caller

use anyhow::{Result, anyhow};
use cpal::SupportedStreamConfigRange;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::Sender;

/// Sample rate the config search aims for; the device's real rate wins.
const TARGET_SAMPLE_RATE: u32 = 44100;

/// Starts audio capture from the default input device.
///
/// Each hardware callback forwards its samples unmodified through `sender`.
/// On failure nothing is left partially initialized; the caller can simply
/// retry.
///
/// # Arguments
/// * `sender` - Channel sender carrying raw sample chunks to the pipeline
///   thread
///
/// # Returns
/// * `Ok((stream, sample_rate))` - Live stream handle and the rate the
///   device actually runs at
/// * `Err(e)` - No device, no suitable mono f32 config, or stream errors
pub fn start_capture(sender: Sender<Vec<f32>>) -> Result<(cpal::Stream, u32)> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or_else(|| anyhow!("No input device available"))?;

    eprintln!("[AUDIO] Using input device: {}", device.name()?);

    let configs = device.supported_input_configs()?.collect::<Vec<_>>();
    let config = pick_input_config(configs, TARGET_SAMPLE_RATE)
        .ok_or_else(|| anyhow!("No suitable mono f32 input format found"))?;
    let sample_rate = config.sample_rate().0;
    let config: cpal::StreamConfig = config.into();

    eprintln!("[AUDIO] Device sample rate: {} Hz", sample_rate);

    let err_fn = |err| eprintln!("[AUDIO] Stream error: {}", err);

    let stream = device.build_input_stream(
        &config,
        move |data: &[f32], _: &cpal::InputCallbackInfo| {
            // try_send keeps the callback non-blocking; if the pipeline
            // thread falls behind, dropping a chunk is the lossy behavior
            // the ring buffer is built around anyway.
            let _ = sender.try_send(data.to_vec());
        },
        err_fn,
        None,
    )?;

    stream.play()?;

    Ok((stream, sample_rate))
}

/// Picks the best input configuration: mono, f32, with the target rate
/// clamped into the closest supported range. Whatever rate lands there is
/// final; the pipeline must never assume 44.1 kHz.
fn pick_input_config(
    configs: Vec<SupportedStreamConfigRange>,
    target_rate: u32,
) -> Option<cpal::SupportedStreamConfig> {
    configs
        .into_iter()
        .filter(|c| c.channels() == 1 && c.sample_format() == cpal::SampleFormat::F32)
        .min_by_key(|c| {
            let min_diff = (c.min_sample_rate().0 as i32 - target_rate as i32).abs();
            let max_diff = (c.max_sample_rate().0 as i32 - target_rate as i32).abs();
            min_diff.min(max_diff)
        })
        .map(|c| {
            let rate = target_rate.clamp(c.min_sample_rate().0, c.max_sample_rate().0);
            c.with_sample_rate(cpal::SampleRate(rate))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cpal::{SampleFormat, SampleRate, SupportedBufferSize};

    fn range(
        channels: u16,
        min: u32,
        max: u32,
        format: SampleFormat,
    ) -> SupportedStreamConfigRange {
        SupportedStreamConfigRange::new(
            channels,
            SampleRate(min),
            SampleRate(max),
            SupportedBufferSize::Unknown,
            format,
        )
    }

    #[test]
    fn picks_mono_f32_at_the_target_rate() {
        let configs = vec![
            range(2, 8000, 96000, SampleFormat::F32),
            range(1, 8000, 96000, SampleFormat::I16),
            range(1, 8000, 96000, SampleFormat::F32),
        ];
        let picked = pick_input_config(configs, 44100).unwrap();
        assert_eq!(picked.channels(), 1);
        assert_eq!(picked.sample_format(), SampleFormat::F32);
        assert_eq!(picked.sample_rate(), SampleRate(44100));
    }

    #[test]
    fn clamps_target_into_the_supported_range() {
        let configs = vec![range(1, 48000, 48000, SampleFormat::F32)];
        let picked = pick_input_config(configs, 44100).unwrap();
        assert_eq!(picked.sample_rate(), SampleRate(48000));
    }

    #[test]
    fn no_mono_f32_config_means_no_pick() {
        let configs = vec![range(2, 8000, 96000, SampleFormat::I16)];
        assert!(pick_input_config(configs, 44100).is_none());
    }
}
