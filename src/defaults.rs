//! Default configuration constants for morsh.
//!
//! Shared by the config types, the pipeline, and the CLI so every entry point
//! starts from the same values.

/// Default audio sample rate in Hz.
///
/// CW audio tones sit well below 2 kHz, so 8 kHz leaves ample headroom below Nyquist.
pub const SAMPLE_RATE: u32 = 8000;

/// Default number of samples per audio block (16 ms at 8 kHz).
///
/// Also the largest block the tone detector accepts; shorter blocks are zero-padded.
pub const BLOCK_SIZE: usize = 128;

/// Default decode speed in words per minute.
pub const WPM: u32 = 25;

/// Default fractional slack applied symmetrically to every timing window.
pub const TOLERANCE: f64 = 0.4;

/// Tones monitored per block: 500 Hz to 950 Hz in 50 Hz steps.
pub const TARGET_FREQUENCIES: [f64; 10] = [
    500.0, 550.0, 600.0, 650.0, 700.0, 750.0, 800.0, 850.0, 900.0, 950.0,
];

/// Minimum window-compensated Goertzel magnitude that counts as "tone present".
pub const DETECTION_THRESHOLD: f64 = 1.0;

/// Silence after which a pending character is flushed, in milliseconds.
pub const SILENCE_TIMEOUT_MS: u64 = 2000;

/// Depth of the hand-off queue between the audio callback and the edge detector.
pub const QUEUE_DEPTH: usize = 1;

/// Capacity of the token channel between the decoder and the sink.
pub const TOKEN_BUFFER: usize = 64;

/// PARIS standard: one word is 50 units long.
pub const UNITS_PER_WORD: u32 = 50;

/// Token emitted for a sequence that maps to no character.
pub const ERROR_TOKEN: &str = "|?|";
