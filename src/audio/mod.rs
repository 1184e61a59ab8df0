//! Audio input: block sources, the clock, tone detection and edge timing.

#[cfg(feature = "cpal-audio")]
pub mod capture;
pub mod clock;
pub mod edge;
pub mod source;
pub mod tone;
pub mod wav;

pub use clock::{Clock, ManualClock, SystemClock};
pub use edge::EdgeDetector;
pub use source::{BlockCallback, BlockSource};
pub use tone::{ToneDetector, ToneDetectorConfig};
