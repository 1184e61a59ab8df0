//! Signal-processing primitives.
//!
//! Everything here is allocation-free on the hot path: callers own the buffers and
//! the primitives transform them in place or read them.

pub mod fft;
pub mod goertzel;
pub mod pcm;
pub mod spectrum;
pub mod window;

pub use fft::{Radix2Fft, fft_radix2, fft_recursive, magnitude, phase};
pub use goertzel::{GoertzelBin, goertzel};
pub use pcm::normalize;
pub use spectrum::SpectrumAnalyzer;
pub use window::{hann_rms_factor, hann_window};
