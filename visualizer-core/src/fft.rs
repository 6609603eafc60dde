//! # Fast Fourier Transform (FFT) Module
//!
//! Magnitude spectra for the pitch estimator's refinement step. The plan
//! and the window are built once per analysis size and reused every tick.
//!
//! ## Features
//! - High-performance FFT using RustFFT
//! - Hann windowing for reduced spectral leakage
//! - DC offset removal for accurate analysis

use rustfft::{Fft, FftPlanner, num_complex::Complex};
use std::sync::Arc;

/// Removes the DC offset from a signal by making its average value zero.
fn remove_dc_offset(signal: &mut [f32]) {
    let len = signal.len();
    if len == 0 {
        return;
    }
    let avg = signal.iter().sum::<f32>() / len as f32;
    if avg.abs() > 1e-6 {
        for sample in signal.iter_mut() {
            *sample -= avg;
        }
    }
}

/// Hann window coefficients for `n` samples.
fn hann_window(n: usize) -> Vec<f32> {
    if n < 2 {
        return vec![1.0; n];
    }
    let n_minus_1 = (n - 1) as f32;
    (0..n)
        .map(|i| 0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / n_minus_1).cos()))
        .collect()
}

/// Computes windowed magnitude spectra for frames of a fixed size.
pub struct SpectrumAnalyzer {
    size: usize,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    scratch: Vec<Complex<f32>>,
}

impl SpectrumAnalyzer {
    pub fn new(size: usize) -> Self {
        let mut planner = FftPlanner::new();
        Self {
            size,
            fft: planner.plan_fft_forward(size),
            window: hann_window(size),
            scratch: vec![Complex::default(); size],
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Magnitude spectrum up to the Nyquist frequency.
    ///
    /// Frames shorter than the analyzer size are zero-padded; longer frames
    /// are truncated.
    ///
    /// # Returns
    /// * `Vec<f32>` - `size / 2` magnitudes, bin `k` at `k * sample_rate / size` Hz
    pub fn magnitudes(&mut self, signal: &[f32]) -> Vec<f32> {
        let mut frame: Vec<f32> = signal.iter().copied().take(self.size).collect();
        frame.resize(self.size, 0.0);
        remove_dc_offset(&mut frame);

        for ((slot, sample), w) in self.scratch.iter_mut().zip(frame).zip(&self.window) {
            *slot = Complex { re: sample * w, im: 0.0 };
        }
        self.fft.process(&mut self.scratch);

        self.scratch
            .iter()
            .take(self.size / 2)
            .map(|c| c.norm()) // .norm() is sqrt(re^2 + im^2)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pure_tone_peaks_in_its_bin() {
        let size = 1024;
        let sample_rate = 8192.0;
        // Bin 50 at 8 Hz resolution.
        let signal: Vec<f32> = (0..size)
            .map(|i| (2.0 * std::f32::consts::PI * 400.0 * i as f32 / sample_rate).sin())
            .collect();

        let mut analyzer = SpectrumAnalyzer::new(size);
        let mags = analyzer.magnitudes(&signal);
        assert_eq!(mags.len(), size / 2);

        let peak = mags
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(peak, 50);
    }

    #[test]
    fn short_frames_are_padded() {
        let mut analyzer = SpectrumAnalyzer::new(256);
        assert_eq!(analyzer.magnitudes(&[0.5; 10]).len(), 128);
    }
}
