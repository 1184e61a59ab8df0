//! Edge timing station: stamped tone flags in, timed intervals out.

use crate::audio::clock::{Clock, SystemClock};
use crate::audio::edge::EdgeDetector;
use crate::pipeline::error::StationError;
use crate::pipeline::station::Station;
use crate::pipeline::types::{Detection, ToneSample};

/// Owns the edge detector for the lifetime of its thread.
pub struct EdgeStation<C: Clock = SystemClock> {
    detector: EdgeDetector<C>,
}

impl<C: Clock + 'static> EdgeStation<C> {
    pub fn new(detector: EdgeDetector<C>) -> Self {
        Self { detector }
    }
}

impl<C: Clock + 'static> Station for EdgeStation<C> {
    type Input = ToneSample;
    type Output = Detection;

    fn process(&mut self, sample: ToneSample) -> Result<Option<Detection>, StationError> {
        Ok(self.detector.process_at(sample.present, sample.at))
    }

    fn name(&self) -> &'static str {
        "edge"
    }
}
