//! Staged decode pipeline.
//!
//! Each station runs in its own thread, connected by crossbeam channels: a depth-limited
//! hand-off from the audio callback, a rendezvous between edge timing and the decoder,
//! and a bounded token channel into the sink.

pub mod decoder_station;
pub mod edge_station;
pub mod error;
pub mod handoff;
pub mod orchestrator;
pub mod shutdown;
pub mod sink;
pub mod station;
pub mod types;

pub use decoder_station::DecoderStation;
pub use edge_station::EdgeStation;
pub use error::{ErrorReporter, LogReporter, StationError};
pub use handoff::{HandoffSender, OverflowPolicy, handoff};
pub use orchestrator::{Pipeline, PipelineConfig, PipelineHandle, ToneCallback};
pub use shutdown::ShutdownSignal;
pub use sink::{CollectorSink, StdoutSink, TextSink};
pub use station::{Station, StationRunner};
pub use types::{DecodedToken, Detection, ToneSample};
