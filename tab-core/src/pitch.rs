//! # Pitch Detection Module
//!
//! This module implements the YIN fundamental-frequency estimator used by
//! the transcription pipeline. It works entirely in the time domain and is
//! tuned for monophonic guitar input.
//!
//! ## Features
//! - Band-limited lag search derived from the configured frequency range
//! - Cumulative mean normalized difference for a scale-invariant threshold
//! - Parabolic interpolation for sub-sample lag accuracy
//! - Conservative rejection of degenerate bands and out-of-range results

/// The fundamental-frequency search range in Hz.
///
/// Read fresh at the start of every detection cycle so the host can adjust
/// the band while the stream is running.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrequencyBand {
    pub fmin: f32,
    pub fmax: f32,
}

impl FrequencyBand {
    pub fn new(fmin: f32, fmax: f32) -> Self {
        Self { fmin, fmax }
    }
}

/// Estimates the fundamental frequency of one analysis window using YIN.
///
/// The search examines lags between `sample_rate / fmax` and
/// `sample_rate / fmin` only, which both saves work and rejects
/// out-of-band periodicity before it can alias into a wrong note.
///
/// # Arguments
/// * `window` - One fixed-size analysis window of mono samples
/// * `threshold` - Absolute threshold on the normalized difference (0.15 is
///   a good default; lower is stricter)
/// * `sample_rate` - Sample rate in Hz, as reported by the audio device
/// * `band` - Frequency search range
///
/// # Returns
/// * `Some(frequency)` - Detected fundamental in Hz, inside `band`
/// * `None` - No clear periodicity, degenerate band, or out-of-range result.
///   This is a normal per-cycle outcome, not an error.
pub fn detect_pitch(
    window: &[f32],
    threshold: f32,
    sample_rate: f32,
    band: FrequencyBand,
) -> Option<f32> {
    let n = window.len();
    if n < 3 {
        return None;
    }

    // Lag bounds from the band. The longest searched lag must leave at
    // least one sample pair for the difference function; the shortest is
    // floored at 2 so parabolic interpolation always has a left neighbor
    // inside the buffer.
    let tau_max = ((sample_rate / band.fmin) as usize).min(n - 1);
    let tau_min = ((sample_rate / band.fmax) as usize).max(2);
    if tau_min >= tau_max {
        return None;
    }

    // Step 1: squared difference function over the searched lags.
    let mut diff = vec![0.0f32; tau_max + 1];
    for tau in tau_min..=tau_max {
        let mut sum = 0.0;
        for i in 0..(n - tau) {
            let delta = window[i] - window[i + tau];
            sum += delta * delta;
        }
        diff[tau] = sum;
    }

    // Step 2: cumulative mean normalized difference. The running sum starts
    // at tau_min, which keeps the absolute threshold comparable across lags
    // regardless of signal level. A silent window leaves the running sum at
    // zero; treat those entries as 1.0 so they can never cross the
    // threshold.
    let mut cmnd = vec![1.0f32; tau_max + 1];
    let mut running_sum = 0.0;
    for tau in tau_min..=tau_max {
        running_sum += diff[tau];
        if running_sum > 0.0 {
            cmnd[tau] = diff[tau] * tau as f32 / running_sum;
        }
    }

    // Step 3: absolute threshold. The first lag that dips below the
    // threshold selects the dip; scanning upward from tau_min favors the
    // fundamental over its subharmonics. The dip of a clean tone is wide,
    // so descend to its local minimum before refining.
    let mut candidate = None;
    for tau in tau_min..=tau_max {
        if cmnd[tau] < threshold {
            let mut t = tau;
            while t + 1 <= tau_max && cmnd[t + 1] < cmnd[t] {
                t += 1;
            }
            candidate = Some(t);
            break;
        }
    }
    let tau = candidate?;

    // Step 4: parabolic interpolation around the winning lag recovers
    // sub-sample precision. Skipped at the edges of the searched range and
    // when the three points are collinear.
    let mut refined_tau = tau as f32;
    if tau > tau_min && tau < tau_max {
        let x0 = cmnd[tau - 1];
        let x1 = cmnd[tau];
        let x2 = cmnd[tau + 1];
        let a = (x0 + x2 - 2.0 * x1) / 2.0;
        let b = (x2 - x0) / 2.0;
        if a != 0.0 {
            refined_tau = tau as f32 - b / (2.0 * a);
        }
    }

    let frequency = sample_rate / refined_tau;

    // Final guard: only finite, positive, in-band frequencies count.
    if frequency.is_finite() && frequency > 0.0 && frequency >= band.fmin && frequency <= band.fmax
    {
        Some(frequency)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 44100.0;
    const BLOCK: usize = 2048;

    fn band() -> FrequencyBand {
        FrequencyBand::new(50.0, 800.0)
    }

    fn sine_window(freq: f32, amplitude: f32) -> Vec<f32> {
        (0..BLOCK)
            .map(|i| amplitude * (2.0 * std::f32::consts::PI * freq * i as f32 / SAMPLE_RATE).sin())
            .collect()
    }

    #[test]
    fn detects_pure_sine_within_one_percent() {
        for freq in [82.41, 110.0, 196.0, 329.63, 440.0] {
            let window = sine_window(freq, 0.5);
            let detected = detect_pitch(&window, 0.15, SAMPLE_RATE, band())
                .unwrap_or_else(|| panic!("no pitch for {} Hz", freq));
            let relative_error = (detected - freq).abs() / freq;
            assert!(
                relative_error < 0.01,
                "{} Hz detected as {} Hz",
                freq,
                detected
            );
        }
    }

    #[test]
    fn refinement_beats_integer_lag() {
        // 110 Hz at 44100 Hz has a period of 400.9 samples; the integer lag
        // alone would land on 401 and read back 109.98 Hz or worse.
        let window = sine_window(110.0, 0.5);
        let detected = detect_pitch(&window, 0.15, SAMPLE_RATE, band()).unwrap();
        assert!((detected - 110.0).abs() < 0.5, "detected {}", detected);
    }

    #[test]
    fn silence_yields_no_pitch() {
        let window = vec![0.0; BLOCK];
        assert_eq!(detect_pitch(&window, 0.15, SAMPLE_RATE, band()), None);
    }

    #[test]
    fn below_band_frequency_is_rejected() {
        // 30 Hz sits below the 50 Hz floor; its period is longer than any
        // searched lag, so no dip falls inside the range.
        let window = sine_window(30.0, 0.5);
        assert_eq!(detect_pitch(&window, 0.15, SAMPLE_RATE, band()), None);
    }

    #[test]
    fn degenerate_band_yields_no_pitch() {
        let window = sine_window(110.0, 0.5);
        let degenerate = FrequencyBand::new(500.0, 501.0);
        assert_eq!(detect_pitch(&window, 0.15, SAMPLE_RATE, degenerate), None);
    }

    #[test]
    fn nonfinite_samples_yield_no_pitch() {
        let mut window = sine_window(110.0, 0.5);
        window[100] = f32::NAN;
        assert_eq!(detect_pitch(&window, 0.15, SAMPLE_RATE, band()), None);
    }

    #[test]
    fn tiny_window_yields_no_pitch() {
        assert_eq!(detect_pitch(&[0.1, 0.2], 0.15, SAMPLE_RATE, band()), None);
    }
}
