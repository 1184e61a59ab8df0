//! Radix-2 Cooley-Tukey FFT.
//!
//! [`Radix2Fft`] is the in-place iterative transform with a precomputed bit-reversal
//! table. [`fft_recursive`] is the textbook divide-and-conquer version, kept as a
//! reference to cross-check the iterative one.

use crate::error::{MorshError, Result};
use num_complex::Complex64;
use std::f64::consts::PI;

/// Euclidean magnitude of a complex bin.
#[inline]
pub fn magnitude(c: Complex64) -> f64 {
    c.norm()
}

/// Phase of a complex bin in radians, in `(-π, π]`.
#[inline]
pub fn phase(c: Complex64) -> f64 {
    c.arg()
}

/// True for 1, 2, 4, 8, ... (zero is not a power of two).
pub fn is_power_of_two(n: usize) -> bool {
    n != 0 && n & (n - 1) == 0
}

/// Reverses the lowest `bits` bits of `value`.
pub fn reverse_bits(mut value: usize, bits: u32) -> usize {
    let mut out = 0;
    for _ in 0..bits {
        out = (out << 1) | (value & 1);
        value >>= 1;
    }
    out
}

/// Bit-reversal permutation table for an `n`-point transform.
///
/// `n` must be a power of two.
pub fn bit_reverse_indices(n: usize) -> Vec<usize> {
    let bits = n.trailing_zeros();
    (0..n).map(|i| reverse_bits(i, bits)).collect()
}

/// An iterative FFT plan for one power-of-two length.
#[derive(Debug, Clone)]
pub struct Radix2Fft {
    len: usize,
    indices: Vec<usize>,
}

impl Radix2Fft {
    /// Plans a transform of `len` points.
    ///
    /// # Errors
    /// Returns [`MorshError::FftLengthNotPowerOfTwo`] if `len` is not a power of two.
    pub fn new(len: usize) -> Result<Self> {
        if !is_power_of_two(len) {
            return Err(MorshError::FftLengthNotPowerOfTwo { len });
        }
        Ok(Self {
            len,
            indices: bit_reverse_indices(len),
        })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Reorders `samples` into bit-reversed index order.
    pub fn permute(&self, samples: &mut [Complex64]) {
        for (i, &j) in self.indices.iter().enumerate() {
            // Plain swaps only; arithmetic swaps would round.
            if i < j {
                samples.swap(i, j);
            }
        }
    }

    /// Transforms `samples` in place.
    ///
    /// # Errors
    /// Returns [`MorshError::FftLengthNotPowerOfTwo`] if the slice length differs from
    /// the planned length; the slice is left untouched in that case.
    pub fn process(&self, samples: &mut [Complex64]) -> Result<()> {
        if samples.len() != self.len {
            return Err(MorshError::FftLengthNotPowerOfTwo { len: samples.len() });
        }

        self.permute(samples);
        let n = self.len;

        let mut size = 2;
        while size <= n {
            let half = size >> 1;

            // Twiddle increment for this stage; w is advanced by multiplication
            // rather than recomputed per butterfly.
            let theta = -2.0 * PI / size as f64;
            let wm = Complex64::new(theta.cos(), theta.sin());

            for start in (0..n).step_by(size) {
                let mut w = Complex64::new(1.0, 0.0);
                for j in 0..half {
                    let u = samples[start + j];
                    let t = w * samples[start + j + half];

                    samples[start + j] = u + t;
                    samples[start + j + half] = u - t;

                    w *= wm;
                }
            }
            size <<= 1;
        }

        Ok(())
    }
}

/// In-place iterative FFT of `samples`.
///
/// Builds a fresh bit-reversal table per call; hold a [`Radix2Fft`] to reuse it.
///
/// # Errors
/// Returns [`MorshError::FftLengthNotPowerOfTwo`] if the length is not a power of two.
pub fn fft_radix2(samples: &mut [Complex64]) -> Result<()> {
    Radix2Fft::new(samples.len())?.process(samples)
}

/// Recursive FFT of `samples`, returning a new spectrum.
///
/// # Errors
/// Returns [`MorshError::FftLengthNotPowerOfTwo`] if the length is not a power of two.
pub fn fft_recursive(samples: &[Complex64]) -> Result<Vec<Complex64>> {
    if !is_power_of_two(samples.len()) {
        return Err(MorshError::FftLengthNotPowerOfTwo { len: samples.len() });
    }
    Ok(recurse(samples))
}

fn recurse(samples: &[Complex64]) -> Vec<Complex64> {
    let n = samples.len();
    // A single point is its own DFT.
    if n == 1 {
        return samples.to_vec();
    }

    let half = n >> 1;
    let even: Vec<Complex64> = samples.iter().step_by(2).copied().collect();
    let odd: Vec<Complex64> = samples.iter().skip(1).step_by(2).copied().collect();

    let even_fft = recurse(&even);
    let odd_fft = recurse(&odd);

    let mut out = vec![Complex64::new(0.0, 0.0); n];
    for k in 0..half {
        let angle = -2.0 * PI * k as f64 / n as f64;
        let twiddle = Complex64::new(angle.cos(), angle.sin());
        let t = twiddle * odd_fft[k];
        out[k] = even_fft[k] + t;
        out[k + half] = even_fft[k] - t;
    }
    out
}
