//! 16-bit PCM normalization.

/// Divisor mapping signed 16-bit PCM onto `[-1.0, 1.0)`.
///
/// `i16::MIN` maps to exactly -1.0 and `i16::MAX` to 0.99997. Dividing by 32767
/// instead would push the negative extreme past -1.0.
pub const PCM16_DIVISOR: f64 = 32768.0;

/// Normalizes one signed 16-bit sample.
#[inline]
pub fn normalize(sample: i16) -> f64 {
    sample as f64 / PCM16_DIVISOR
}

/// Normalizes `samples` into the front of `out`.
///
/// Returns the number of samples written (the shorter of the two lengths).
pub fn normalize_into(samples: &[i16], out: &mut [f64]) -> usize {
    let count = samples.len().min(out.len());
    for (dst, &src) in out.iter_mut().zip(samples.iter()).take(count) {
        *dst = normalize(src);
    }
    count
}

/// Normalizes little-endian 16-bit PCM bytes into the front of `out`.
///
/// A trailing odd byte is ignored. Returns the number of samples written.
pub fn normalize_le_bytes(bytes: &[u8], out: &mut [f64]) -> usize {
    let mut count = 0;
    for (dst, pair) in out.iter_mut().zip(bytes.chunks_exact(2)) {
        *dst = normalize(i16::from_le_bytes([pair[0], pair[1]]));
        count += 1;
    }
    count
}
