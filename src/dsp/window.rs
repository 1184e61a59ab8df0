//! Hann windowing.

use std::f64::consts::PI;

/// Hann coefficient for index `i` of an `n`-point window.
#[inline]
fn hann_coefficient(i: usize, n: usize) -> f64 {
    0.5 * (1.0 - (2.0 * PI * i as f64 / (n - 1) as f64).cos())
}

/// Applies a Hann window to `samples` in place.
///
/// Multiplies sample `i` by `0.5 * (1 - cos(2πi / (N-1)))`, which tapers both ends to
/// zero and keeps spectral leakage under control. Slices shorter than two samples have
/// no defined taper and are left untouched.
pub fn hann_window(samples: &mut [f64]) {
    let n = samples.len();
    if n < 2 {
        return;
    }
    for (i, sample) in samples.iter_mut().enumerate() {
        *sample *= hann_coefficient(i, n);
    }
}

/// RMS gain of an `n`-point Hann window.
///
/// Dividing a windowed magnitude by this factor compensates for the energy the
/// window removed. Tends to `sqrt(3/8)` for large `n`.
pub fn hann_rms_factor(n: usize) -> f64 {
    if n < 2 {
        return 1.0;
    }
    let sum_sq: f64 = (0..n).map(|i| hann_coefficient(i, n).powi(2)).sum();
    (sum_sq / n as f64).sqrt()
}
