//! Decoder station: timed intervals in, text tokens out.

use crate::decode::decoder::MorseDecoder;
use crate::pipeline::error::StationError;
use crate::pipeline::station::Station;
use crate::pipeline::types::{DecodedToken, Detection};

pub struct DecoderStation {
    decoder: MorseDecoder,
}

impl DecoderStation {
    pub fn new(decoder: MorseDecoder) -> Self {
        Self { decoder }
    }
}

impl Station for DecoderStation {
    type Input = Detection;
    type Output = DecodedToken;

    fn process(&mut self, detection: Detection) -> Result<Option<DecodedToken>, StationError> {
        Ok(self.decoder.decode(&detection))
    }

    /// The character still pending at shutdown.
    fn flush(&mut self) -> Option<DecodedToken> {
        self.decoder.flush()
    }

    fn name(&self) -> &'static str {
        "decoder"
    }
}
