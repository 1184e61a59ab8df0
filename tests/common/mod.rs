//! Keyed-tone synthesis shared by the integration tests.

#![allow(dead_code)]

use morsh::decode::table::{DIT, encode};
use std::f64::consts::PI;

pub const SAMPLE_RATE: u32 = 8000;
pub const BLOCK: usize = 128;
/// 48 ms at 8 kHz: one unit at 25 WPM, three blocks.
pub const UNIT_SAMPLES: usize = 384;

/// On/off keying pattern for `text` in units, starting with a mark.
///
/// Spaces between words become 7-unit gaps. The pattern ends on the last mark.
pub fn keying(text: &str) -> Vec<(bool, usize)> {
    let mut out = Vec::new();
    for (w, word) in text.split(' ').enumerate() {
        if w > 0 {
            out.push((false, 7));
        }
        for (c, ch) in word.chars().enumerate() {
            if c > 0 {
                out.push((false, 3));
            }
            let code = encode(ch).unwrap();
            for (e, element) in code.chars().enumerate() {
                if e > 0 {
                    out.push((false, 1));
                }
                out.push((true, if element == DIT { 1 } else { 3 }));
            }
        }
    }
    out
}

/// 700 Hz keyed audio for `text` with `lead` and `tail` units of silence around it.
pub fn keyed_pcm(text: &str, lead: usize, tail: usize) -> Vec<i16> {
    let mut pattern = vec![(false, lead)];
    pattern.extend(keying(text));
    pattern.push((false, tail));

    let mut samples = Vec::new();
    for (on, units) in pattern {
        for _ in 0..units * UNIT_SAMPLES {
            let n = samples.len() as f64;
            let s = if on {
                (0.5 * (2.0 * PI * 700.0 * n / SAMPLE_RATE as f64).sin() * 32767.0) as i16
            } else {
                0
            };
            samples.push(s);
        }
    }
    samples
}

/// Writes mono 16-bit samples as a WAV file.
pub fn write_wav(path: &std::path::Path, samples: &[i16], sample_rate: u32, channels: u16) {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for &s in samples {
        for _ in 0..channels {
            writer.write_sample(s).unwrap();
        }
    }
    writer.finalize().unwrap();
}

/// Continuous 700 Hz tone.
pub fn tone_pcm(len: usize) -> Vec<i16> {
    (0..len)
        .map(|n| {
            (0.5 * (2.0 * PI * 700.0 * n as f64 / SAMPLE_RATE as f64).sin() * 32767.0) as i16
        })
        .collect()
}
