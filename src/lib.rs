//! morsh - live Morse code decoder
//!
//! Listens to an audio stream, detects CW tone keying, and decodes it to text.

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod audio;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod decode;
pub mod defaults;
pub mod dsp;
pub mod error;
pub mod pipeline;

// Core traits (source → process → sink)
pub use audio::source::{BlockCallback, BlockSource};
pub use pipeline::sink::{CollectorSink, StdoutSink, TextSink};

// Decoding
pub use decode::{DecoderConfig, MorseDecoder, decode_samples, decode_tokens};

// Pipeline
pub use pipeline::orchestrator::{Pipeline, PipelineConfig, PipelineHandle, ToneCallback};
pub use pipeline::types::{DecodedToken, Detection};

// Error handling
pub use error::{MorshError, Result};

// Config
pub use config::Config;

// Station framework (for advanced users)
pub use pipeline::error::{ErrorReporter, StationError};
pub use pipeline::station::Station;

/// Build version string with optional git commit hash.
///
/// Returns `"0.1.0+abc1234"` when git hash is available, `"0.1.0"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}
