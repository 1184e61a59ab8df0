//! Synchronous decoding of recorded audio.
//!
//! Runs the same tone, edge and decoder stages as the live pipeline on the calling
//! thread. Time is virtual: the clock advances by each block's duration, so results do
//! not depend on how fast the machine is.

use crate::audio::clock::ManualClock;
use crate::audio::edge::EdgeDetector;
use crate::audio::tone::ToneDetector;
use crate::decode::decoder::MorseDecoder;
use crate::error::Result;
use crate::pipeline::orchestrator::PipelineConfig;
use crate::pipeline::types::DecodedToken;
use std::time::Duration;

/// Decodes a whole recording into tokens, flushing the pending character at the end.
pub fn decode_tokens(samples: &[i16], config: &PipelineConfig) -> Result<Vec<DecodedToken>> {
    config.validate()?;
    let mut tone = ToneDetector::new(&config.tone)?;
    let mut decoder = MorseDecoder::new(config.decoder)?;
    let clock = ManualClock::new();
    let mut edge = EdgeDetector::with_clock(config.silence_timeout, clock.clone());

    let sample_rate = config.tone.sample_rate as f64;
    let mut tokens = Vec::new();
    for block in samples.chunks(tone.block_size()) {
        clock.advance(Duration::from_secs_f64(block.len() as f64 / sample_rate));
        let present = tone.process_samples(block)?;
        if let Some(detection) = edge.process(present)
            && let Some(token) = decoder.decode(&detection)
        {
            tokens.push(token);
        }
    }
    tokens.extend(decoder.flush());

    log::debug!(
        "offline: {} samples, {:?} of audio, {} tokens",
        samples.len(),
        clock.elapsed(),
        tokens.len()
    );
    Ok(tokens)
}

/// Decodes a whole recording into text.
pub fn decode_samples(samples: &[i16], config: &PipelineConfig) -> Result<String> {
    Ok(decode_tokens(samples, config)?
        .iter()
        .map(ToString::to_string)
        .collect())
}
