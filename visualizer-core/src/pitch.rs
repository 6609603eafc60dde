//! # Pitch Estimation Module
//!
//! The estimator seam of the detection cycle and the estimator the
//! visualizer ships with.
//!
//! ## Features
//! - YIN pitch detection with cumulative mean normalization
//! - RMS noise gate to report silence
//! - Parabolic interpolation for sub-sample accuracy
//! - Spectrum refinement for improved precision

use crate::fft::SpectrumAnalyzer;

/// Absolute threshold on the normalized difference function for accepting
/// the first dip as the period.
const DIP_THRESHOLD: f32 = 0.15;

/// Largest relative change spectrum refinement may make to the YIN estimate.
const MAX_REFINEMENT: f32 = 0.03;

/// What an estimator made of one waveform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchEstimate {
    /// Fundamental frequency in Hz, if any was found.
    pub frequency: Option<f32>,
    /// Goodness of fit in `0.0..=1.0`.
    pub confidence: f32,
}

impl PitchEstimate {
    pub const NONE: Self = Self { frequency: None, confidence: 0.0 };
}

/// Waveform buffer plus sample rate in, fundamental plus confidence out.
pub trait PitchEstimator {
    fn find_pitch(&mut self, waveform: &[f32], sample_rate: u32) -> PitchEstimate;
}

/// YIN estimator with spectral refinement.
///
/// Confidence is `1 - d'(τ)`, where `d'` is the cumulative mean normalized
/// difference at the chosen period: a clean periodic tone scores near 1,
/// noise scores low.
pub struct YinEstimator {
    amplitude_threshold: f32,
    refine_with_spectrum: bool,
    spectrum: Option<SpectrumAnalyzer>,
    difference: Vec<f32>,
}

impl YinEstimator {
    /// # Arguments
    /// * `amplitude_threshold` - RMS level below which the input is silence
    pub fn new(amplitude_threshold: f32) -> Self {
        Self { amplitude_threshold, refine_with_spectrum: true, spectrum: None, difference: Vec::new() }
    }

    /// Turns the spectral refinement step off.
    pub fn without_refinement(self) -> Self {
        Self { refine_with_spectrum: false, ..self }
    }

    fn refine(&mut self, waveform: &[f32], rough: f32, sample_rate: u32) -> f32 {
        if !self.refine_with_spectrum {
            return rough;
        }
        let size = waveform.len();
        if self.spectrum.as_ref().map(SpectrumAnalyzer::size) != Some(size) {
            self.spectrum = Some(SpectrumAnalyzer::new(size));
        }
        let Some(analyzer) = self.spectrum.as_mut() else {
            return rough;
        };
        let magnitudes = analyzer.magnitudes(waveform);
        match refine_from_spectrum(&magnitudes, rough, sample_rate) {
            Some(refined) if ((refined - rough) / rough).abs() <= MAX_REFINEMENT => refined,
            _ => rough,
        }
    }
}

impl PitchEstimator for YinEstimator {
    fn find_pitch(&mut self, waveform: &[f32], sample_rate: u32) -> PitchEstimate {
        let half = waveform.len() / 2;
        if half < 3 || sample_rate == 0 {
            return PitchEstimate::NONE;
        }

        let rms = (waveform.iter().map(|&s| s * s).sum::<f32>() / waveform.len() as f32).sqrt();
        if rms < self.amplitude_threshold {
            return PitchEstimate::NONE;
        }

        normalized_difference(waveform, &mut self.difference);
        let d = &self.difference;

        let Some(period) = pick_period(d) else {
            return PitchEstimate::NONE;
        };
        let confidence = (1.0 - d[period]).clamp(0.0, 1.0);

        let period = parabolic_peak(d, period);
        let rough = sample_rate as f32 / period;
        if !rough.is_finite() || rough <= 0.0 {
            return PitchEstimate { frequency: None, confidence };
        }

        let frequency = self.refine(waveform, rough, sample_rate);
        PitchEstimate { frequency: Some(frequency), confidence }
    }
}

/// Cumulative mean normalized difference function over lags `0..len/2`.
fn normalized_difference(signal: &[f32], out: &mut Vec<f32>) {
    let half = signal.len() / 2;
    out.clear();
    out.resize(half, 0.0);

    for tau in 1..half {
        out[tau] = signal[..half]
            .iter()
            .zip(&signal[tau..tau + half])
            .map(|(a, b)| (a - b) * (a - b))
            .sum();
    }

    out[0] = 1.0;
    let mut running_sum = 0.0;
    for tau in 1..half {
        running_sum += out[tau];
        out[tau] = if running_sum > 0.0 { out[tau] * tau as f32 / running_sum } else { 1.0 };
    }
}

/// First dip under the threshold, followed down to its local minimum.
/// Without such a dip the global minimum is used.
fn pick_period(d: &[f32]) -> Option<usize> {
    let mut tau = 2;
    while tau < d.len() {
        if d[tau] < DIP_THRESHOLD {
            while tau + 1 < d.len() && d[tau + 1] < d[tau] {
                tau += 1;
            }
            return Some(tau);
        }
        tau += 1;
    }
    (2..d.len()).min_by(|&a, &b| d[a].total_cmp(&d[b]))
}

/// Sub-sample position of the minimum around `tau`.
fn parabolic_peak(d: &[f32], tau: usize) -> f32 {
    if tau == 0 || tau + 1 >= d.len() {
        return tau as f32;
    }
    let (y1, y2, y3) = (d[tau - 1], d[tau], d[tau + 1]);
    let curvature = y1 - 2.0 * y2 + y3;
    if curvature.abs() < f32::EPSILON {
        tau as f32
    } else {
        tau as f32 + (y1 - y3) / (2.0 * curvature)
    }
}

/// Refines a frequency estimate using a pre-computed magnitude spectrum.
///
/// Looks for the strongest bin within two bins of the estimate and
/// interpolates its log-magnitude parabola.
///
/// # Returns
/// * `Some(refined_freq)` - Refined frequency estimate
/// * `None` - No usable peak near the estimate
pub fn refine_from_spectrum(magnitudes: &[f32], rough_freq: f32, sample_rate: u32) -> Option<f32> {
    if rough_freq <= 0.0 || magnitudes.len() < 3 {
        return None;
    }
    let buffer_size = magnitudes.len() * 2;
    let target_bin = rough_freq * buffer_size as f32 / sample_rate as f32;
    let start = (target_bin - 2.0).max(1.0) as usize;
    let end = ((target_bin + 2.0) as usize).min(magnitudes.len() - 2);
    if start > end {
        return None;
    }

    let peak = (start..=end).max_by(|&a, &b| magnitudes[a].total_cmp(&magnitudes[b]))?;

    let y1 = magnitudes[peak - 1].ln();
    let y2 = magnitudes[peak].ln();
    let y3 = magnitudes[peak + 1].ln();
    if !(y1.is_finite() && y2.is_finite() && y3.is_finite()) {
        return None;
    }
    let denominator = 2.0 * y2 - y1 - y3;
    if denominator.abs() < 1e-6 {
        return None;
    }

    let bin = peak as f32 + (y3 - y1) / (2.0 * denominator);
    let refined = bin * sample_rate as f32 / buffer_size as f32;
    (refined.is_finite() && refined > 0.0).then_some(refined)
}
