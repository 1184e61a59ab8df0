//! Tone detection: reduces one PCM block to a single "tone present" flag.
//!
//! Runs on the audio driver's thread, so every buffer is sized once at construction
//! and `process_*` never allocates on the success path.

use crate::defaults;
use crate::dsp::fft::magnitude;
use crate::dsp::goertzel::GoertzelBin;
use crate::dsp::pcm::{normalize_into, normalize_le_bytes};
use crate::dsp::window::hann_window;
use crate::error::{MorshError, Result};

/// Hann window average gain compensation applied to every Goertzel magnitude.
const WINDOW_COMPENSATION: f64 = 2.0;

/// Configuration for the tone detector.
#[derive(Debug, Clone, PartialEq)]
pub struct ToneDetectorConfig {
    /// Sample rate of incoming PCM in Hz.
    pub sample_rate: u32,
    /// Largest block accepted; also the Goertzel analysis length.
    pub block_size: usize,
    /// Tones monitored per block, in Hz.
    pub target_frequencies: Vec<f64>,
    /// Minimum compensated magnitude that declares a tone present.
    pub threshold: f64,
}

impl Default for ToneDetectorConfig {
    fn default() -> Self {
        Self {
            sample_rate: defaults::SAMPLE_RATE,
            block_size: defaults::BLOCK_SIZE,
            target_frequencies: defaults::TARGET_FREQUENCIES.to_vec(),
            threshold: defaults::DETECTION_THRESHOLD,
        }
    }
}

impl ToneDetectorConfig {
    /// Checks the configuration for values the detector cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(MorshError::invalid_value("sample_rate", "must be positive"));
        }
        if self.block_size == 0 {
            return Err(MorshError::invalid_value("block_size", "must be positive"));
        }
        if self.target_frequencies.is_empty() {
            return Err(MorshError::invalid_value(
                "target_frequencies",
                "at least one frequency is required",
            ));
        }
        let nyquist = self.sample_rate as f64 / 2.0;
        if let Some(bad) = self
            .target_frequencies
            .iter()
            .find(|&&f| !f.is_finite() || f <= 0.0 || f >= nyquist)
        {
            return Err(MorshError::invalid_value(
                "target_frequencies",
                format!("{} Hz is outside (0, {}) Hz", bad, nyquist),
            ));
        }
        if !self.threshold.is_finite() || self.threshold <= 0.0 {
            return Err(MorshError::invalid_value(
                "detection_threshold",
                "must be a positive number",
            ));
        }
        Ok(())
    }
}

/// Goertzel-based multi-frequency tone detector.
pub struct ToneDetector {
    bins: Vec<GoertzelBin>,
    samples: Vec<f64>,
    magnitudes: Vec<f64>,
    threshold: f64,
    sample_rate: u32,
}

impl ToneDetector {
    /// Creates a detector with all buffers pre-sized to `config.block_size`.
    pub fn new(config: &ToneDetectorConfig) -> Result<Self> {
        config.validate()?;
        let bins = config
            .target_frequencies
            .iter()
            .map(|&f| GoertzelBin::new(config.sample_rate as f64, f, config.block_size))
            .collect::<Vec<_>>();
        Ok(Self {
            magnitudes: vec![0.0; bins.len()],
            bins,
            samples: vec![0.0; config.block_size],
            threshold: config.threshold,
            sample_rate: config.sample_rate,
        })
    }

    pub fn block_size(&self) -> usize {
        self.samples.len()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Monitored frequencies, in the same order as [`magnitudes`](Self::magnitudes).
    pub fn frequencies(&self) -> impl Iterator<Item = f64> + '_ {
        self.bins.iter().map(GoertzelBin::target_freq)
    }

    /// Compensated magnitudes computed for the most recent block.
    pub fn magnitudes(&self) -> &[f64] {
        &self.magnitudes
    }

    /// Processes a block of signed 16-bit samples.
    ///
    /// # Errors
    /// Returns [`MorshError::InvalidBlock`] for an empty block or one larger than the
    /// configured block size; the block is not processed.
    pub fn process_samples(&mut self, pcm: &[i16]) -> Result<bool> {
        self.check_len(pcm.len())?;
        let count = normalize_into(pcm, &mut self.samples);
        Ok(self.detect(count))
    }

    /// Processes a block of little-endian signed 16-bit mono PCM bytes.
    ///
    /// # Errors
    /// Returns [`MorshError::InvalidBlock`] for an odd byte count, an empty block, or a
    /// block larger than the configured block size.
    pub fn process_le_bytes(&mut self, bytes: &[u8]) -> Result<bool> {
        if bytes.len() % 2 != 0 {
            return Err(MorshError::InvalidBlock {
                message: format!("odd byte count {} for 16-bit PCM", bytes.len()),
            });
        }
        self.check_len(bytes.len() / 2)?;
        let count = normalize_le_bytes(bytes, &mut self.samples);
        Ok(self.detect(count))
    }

    fn check_len(&self, sample_count: usize) -> Result<()> {
        if sample_count == 0 || sample_count > self.samples.len() {
            return Err(MorshError::InvalidBlock {
                message: format!(
                    "expected 1..={} samples, got {}",
                    self.samples.len(),
                    sample_count
                ),
            });
        }
        Ok(())
    }

    fn detect(&mut self, count: usize) -> bool {
        // Short blocks leave zero padding behind the real samples; the window
        // only covers the real ones.
        self.samples[count..].fill(0.0);
        hann_window(&mut self.samples[..count]);

        let mut present = false;
        for (mag, bin) in self.magnitudes.iter_mut().zip(self.bins.iter()) {
            *mag = magnitude(bin.run(&self.samples)) * WINDOW_COMPENSATION;
            if *mag > self.threshold {
                present = true;
            }
        }
        present
    }
}
