//! Goertzel single-bin DFT.
//!
//! Cheaper than a full FFT when only a handful of tones matter: O(N) per frequency,
//! no power-of-two restriction on the block length.

use num_complex::Complex64;
use std::f64::consts::PI;

/// Precomputed coefficients for one target frequency at a fixed block length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GoertzelBin {
    target_freq: f64,
    cosine: f64,
    sine: f64,
}

impl GoertzelBin {
    /// Builds the bin nearest to `target_freq` for blocks of `block_len` samples.
    ///
    /// The bin index is `round(N * target_freq / sample_rate)`.
    pub fn new(sample_rate: f64, target_freq: f64, block_len: usize) -> Self {
        if block_len == 0 {
            return Self {
                target_freq,
                cosine: 1.0,
                sine: 0.0,
            };
        }
        let n = block_len as f64;
        let k = (n * target_freq / sample_rate).round();
        let w = 2.0 * PI * k / n;
        Self {
            target_freq,
            cosine: w.cos(),
            sine: w.sin(),
        }
    }

    pub fn target_freq(&self) -> f64 {
        self.target_freq
    }

    /// Runs the recursion over `samples` and returns the complex bin value.
    pub fn run(&self, samples: &[f64]) -> Complex64 {
        let coeff = 2.0 * self.cosine;
        let mut s_prev = 0.0;
        let mut s_prev_prev = 0.0;

        // Two-pole IIR accumulation into the target bin
        for &x in samples {
            let s = x + coeff * s_prev - s_prev_prev;
            s_prev_prev = s_prev;
            s_prev = s;
        }

        Complex64::new(s_prev - self.cosine * s_prev_prev, self.sine * s_prev_prev)
    }
}

/// Single-bin DFT of `samples` at `target_freq`.
pub fn goertzel(sample_rate: f64, target_freq: f64, samples: &[f64]) -> Complex64 {
    GoertzelBin::new(sample_rate, target_freq, samples.len()).run(samples)
}
