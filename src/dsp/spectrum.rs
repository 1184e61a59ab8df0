//! Block spectrum analysis for diagnostics.
//!
//! Not on the real-time decode path (that uses Goertzel); used to inspect where the
//! keyed tone actually sits before choosing target frequencies.

use crate::dsp::fft::{Radix2Fft, magnitude};
use crate::dsp::pcm::normalize_into;
use crate::dsp::window::{hann_rms_factor, hann_window};
use crate::error::{MorshError, Result};
use num_complex::Complex64;

/// Pre-sized FFT spectrum analyzer for one block length.
pub struct SpectrumAnalyzer {
    sample_rate: f64,
    plan: Radix2Fft,
    samples: Vec<f64>,
    bins: Vec<Complex64>,
    magnitudes: Vec<f64>,
}

impl SpectrumAnalyzer {
    /// Creates an analyzer for blocks of up to `size` samples.
    ///
    /// # Errors
    /// Returns [`MorshError::FftLengthNotPowerOfTwo`] if `size` is not a power of two.
    pub fn new(sample_rate: u32, size: usize) -> Result<Self> {
        let plan = Radix2Fft::new(size)?;
        Ok(Self {
            sample_rate: sample_rate as f64,
            plan,
            samples: vec![0.0; size],
            bins: vec![Complex64::new(0.0, 0.0); size],
            magnitudes: vec![0.0; size / 2 + 1],
        })
    }

    pub fn size(&self) -> usize {
        self.plan.len()
    }

    /// Frequency in Hz at the centre of bin `k`.
    pub fn bin_frequency(&self, k: usize) -> f64 {
        k as f64 * self.sample_rate / self.size() as f64
    }

    /// Analyzes one PCM block and returns its single-sided magnitude spectrum.
    ///
    /// Blocks shorter than the plan are zero-padded; only the real samples are
    /// windowed. Magnitudes are normalized by the sample count and the window's RMS
    /// gain, and doubled everywhere except DC and Nyquist.
    ///
    /// # Errors
    /// Returns [`MorshError::InvalidBlock`] for empty blocks or blocks longer than the plan.
    pub fn analyze(&mut self, pcm: &[i16]) -> Result<&[f64]> {
        let size = self.size();
        if pcm.is_empty() || pcm.len() > size {
            return Err(MorshError::InvalidBlock {
                message: format!("expected 1..={} samples, got {}", size, pcm.len()),
            });
        }

        let count = normalize_into(pcm, &mut self.samples);
        self.samples[count..].fill(0.0);
        hann_window(&mut self.samples[..count]);

        for (bin, &sample) in self.bins.iter_mut().zip(self.samples.iter()) {
            *bin = Complex64::new(sample, 0.0);
        }
        self.plan.process(&mut self.bins)?;

        let rms = hann_rms_factor(count);
        let scale = count as f64 * rms;
        let nyquist = size / 2;
        for (k, mag) in self.magnitudes.iter_mut().enumerate() {
            let single_sided = if k == 0 || k == nyquist { 1.0 } else { 2.0 };
            *mag = single_sided * magnitude(self.bins[k]) / scale;
        }

        Ok(&self.magnitudes)
    }

    /// Magnitudes from the most recent [`analyze`](Self::analyze) call.
    pub fn magnitudes(&self) -> &[f64] {
        &self.magnitudes
    }

    /// Strongest non-DC bin of the last analysis as `(frequency_hz, magnitude)`.
    pub fn peak(&self) -> Option<(f64, f64)> {
        self.magnitudes
            .iter()
            .enumerate()
            .skip(1)
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(k, &mag)| (self.bin_frequency(k), mag))
    }
}
