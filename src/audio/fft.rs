//! Byte-oriented spectrum and waveform analysis.

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::f32::consts::PI;
use std::sync::Arc;

use crate::error::ConfigError;
use crate::params::AnalysisConfig;

/// Converts one analysis window into byte magnitudes.
///
/// Keeps the previous frame's magnitudes for temporal smoothing, so a single
/// `Analyser` must only ever see windows from one source.
pub struct Analyser {
    config: AnalysisConfig,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    spectrum: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
    smoothed: Vec<f32>,
}

impl Analyser {
    pub fn new(config: AnalysisConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let size = config.window_size;
        let fft = FftPlanner::new().plan_fft_forward(size);
        let scratch = vec![Complex::new(0.0, 0.0); fft.get_inplace_scratch_len()];
        let window = (0..size).map(|i| blackman_window(i, size)).collect();

        Ok(Self {
            spectrum: vec![Complex::new(0.0, 0.0); size],
            smoothed: vec![0.0; config.buffer_len()],
            scratch,
            window,
            fft,
            config,
        })
    }

    /// Fill `out` with smoothed frequency magnitudes scaled to 0..=255.
    ///
    /// `samples` must hold exactly one window; `out` receives one entry per
    /// bin, low to high, up to `buffer_len()`.
    pub fn frequency_bytes(&mut self, samples: &[f32], out: &mut [u8]) {
        debug_assert_eq!(samples.len(), self.config.window_size);

        // Apply Blackman window
        for ((slot, &s), &w) in self.spectrum.iter_mut().zip(samples).zip(&self.window) {
            *slot = Complex::new(s * w, 0.0);
        }

        self.fft
            .process_with_scratch(&mut self.spectrum, &mut self.scratch);

        let tau = self.config.smoothing_time_constant;
        let magnitude_scale = 1.0 / self.config.window_size as f32;
        let db_range = self.config.max_decibels - self.config.min_decibels;

        for (i, slot) in out.iter_mut().enumerate().take(self.smoothed.len()) {
            let magnitude = self.spectrum[i].norm() * magnitude_scale;
            let mut value = tau * self.smoothed[i] + (1.0 - tau) * magnitude;
            if !value.is_finite() {
                value = 0.0;
            }
            self.smoothed[i] = value;

            let db = linear_to_decibels(value);
            let scaled = 255.0 * (db - self.config.min_decibels) / db_range;
            *slot = scaled.clamp(0.0, 255.0) as u8;
        }
    }
}

/// Fill `out` with the most recent samples as bytes centred on 128
pub fn time_domain_bytes(samples: &[f32], out: &mut [u8]) {
    let start = samples.len().saturating_sub(out.len());
    for (slot, &s) in out.iter_mut().zip(&samples[start..]) {
        *slot = (128.0 * (1.0 + s)).clamp(0.0, 255.0) as u8;
    }
}

/// Blackman window function for FFT analysis
pub fn blackman_window(index: usize, size: usize) -> f32 {
    const A0: f32 = 0.42;
    const A1: f32 = 0.5;
    const A2: f32 = 0.08;
    let x = index as f32 / size as f32;
    A0 - A1 * (2.0 * PI * x).cos() + A2 * (4.0 * PI * x).cos()
}

fn linear_to_decibels(value: f32) -> f32 {
    if value <= 0.0 {
        f32::NEG_INFINITY
    } else {
        20.0 * value.log10()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq_bin: usize, size: usize, amplitude: f32) -> Vec<f32> {
        (0..size)
            .map(|i| amplitude * (2.0 * PI * freq_bin as f32 * i as f32 / size as f32).sin())
            .collect()
    }

    #[test]
    fn test_blackman_window() {
        let size = 512;

        // Blackman window is ~0 at the edge and 1 at the centre
        assert!(blackman_window(0, size).abs() < 0.01);
        assert!((blackman_window(size / 2, size) - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_silence_maps_to_zero() {
        let config = AnalysisConfig::capture();
        let mut analyser = Analyser::new(config.clone()).unwrap();
        let mut out = vec![255u8; config.buffer_len()];

        analyser.frequency_bytes(&vec![0.0; config.window_size], &mut out);
        assert!(out.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_tone_peaks_at_its_bin() {
        let mut config = AnalysisConfig::media();
        config.smoothing_time_constant = 0.0;
        let mut analyser = Analyser::new(config.clone()).unwrap();
        let mut out = vec![0u8; config.buffer_len()];

        analyser.frequency_bytes(&sine(32, config.window_size, 0.1), &mut out);

        let peak = out
            .iter()
            .enumerate()
            .max_by_key(|&(_, v)| *v)
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(peak, 32);
        assert!(out[32] > 200, "expected strong peak, got {}", out[32]);
        assert!(out[100] < out[32]);
    }

    #[test]
    fn test_smoothing_decays_gradually() {
        let config = AnalysisConfig::media();
        let mut analyser = Analyser::new(config.clone()).unwrap();
        let mut loud = vec![0u8; config.buffer_len()];
        let mut after = vec![0u8; config.buffer_len()];

        let tone = sine(16, config.window_size, 0.05);
        for _ in 0..20 {
            analyser.frequency_bytes(&tone, &mut loud);
        }
        analyser.frequency_bytes(&vec![0.0; config.window_size], &mut after);

        // One silent frame only removes 20% of the linear magnitude
        assert!(after[16] > 0);
        assert!(after[16] < loud[16]);
    }

    #[test]
    fn test_time_domain_bytes() {
        let mut out = [0u8; 4];
        time_domain_bytes(&[0.9, 0.9, 0.0, 1.0, -1.0, 0.5], &mut out);
        assert_eq!(out, [128, 255, 0, 192]);
    }

    #[test]
    fn test_rejects_invalid_config() {
        let mut config = AnalysisConfig::media();
        config.window_size = 300;
        assert!(Analyser::new(config).is_err());
    }
}
