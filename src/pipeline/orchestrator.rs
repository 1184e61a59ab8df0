//! Live decode pipeline: audio callback → edge timing → decoder → sink.

use crate::audio::clock::{Clock, SystemClock};
use crate::audio::edge::EdgeDetector;
use crate::audio::source::BlockCallback;
use crate::audio::tone::{ToneDetector, ToneDetectorConfig};
use crate::decode::decoder::{DecoderConfig, MorseDecoder};
use crate::defaults;
use crate::error::{MorshError, Result};
use crate::pipeline::decoder_station::DecoderStation;
use crate::pipeline::edge_station::EdgeStation;
use crate::pipeline::error::{ErrorReporter, LogReporter};
use crate::pipeline::handoff::{HandoffSender, OverflowPolicy, handoff};
use crate::pipeline::shutdown::ShutdownSignal;
use crate::pipeline::sink::{SinkStation, TextSink};
use crate::pipeline::station::StationRunner;
use crate::pipeline::types::ToneSample;
use crossbeam_channel::bounded;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Configuration for the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub tone: ToneDetectorConfig,
    pub decoder: DecoderConfig,
    /// Silence after which the edge detector emits a synthetic space.
    pub silence_timeout: Duration,
    /// Behaviour of the callback → edge queue when the edge thread falls behind.
    pub overflow: OverflowPolicy,
    pub queue_depth: usize,
    /// Channel buffer between decoder and sink
    pub token_buffer: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            tone: ToneDetectorConfig::default(),
            decoder: DecoderConfig::default(),
            silence_timeout: Duration::from_millis(defaults::SILENCE_TIMEOUT_MS),
            overflow: OverflowPolicy::default(),
            queue_depth: defaults::QUEUE_DEPTH,
            token_buffer: defaults::TOKEN_BUFFER,
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        self.tone.validate()?;
        self.decoder.validate()?;
        if self.silence_timeout.is_zero() {
            return Err(MorshError::invalid_value(
                "silence_timeout_ms",
                "must be positive",
            ));
        }
        if self.queue_depth == 0 {
            return Err(MorshError::invalid_value("queue_depth", "must be positive"));
        }
        Ok(())
    }
}

/// Audio-thread entry point of a running pipeline.
///
/// Reduces each block to a tone flag and hands it to the edge thread. Nothing here
/// allocates once constructed.
pub struct ToneCallback {
    detector: ToneDetector,
    tx: HandoffSender<ToneSample>,
    clock: Arc<dyn Clock>,
    shutdown: ShutdownSignal,
}

impl ToneCallback {
    /// Processes one block of samples; returns whether a tone was present.
    ///
    /// Blocks arriving after shutdown are still analysed but not forwarded.
    ///
    /// # Errors
    /// Returns [`MorshError::InvalidBlock`] for a block the detector rejects.
    pub fn on_samples(&mut self, pcm: &[i16]) -> Result<bool> {
        let present = self.detector.process_samples(pcm)?;
        self.forward(present);
        Ok(present)
    }

    /// Processes one block of little-endian 16-bit mono PCM bytes.
    pub fn on_block(&mut self, bytes: &[u8]) -> Result<bool> {
        let present = self.detector.process_le_bytes(bytes)?;
        self.forward(present);
        Ok(present)
    }

    fn forward(&self, present: bool) {
        if self.shutdown.is_triggered() {
            return;
        }
        let sample = ToneSample {
            present,
            at: self.clock.now(),
        };
        // The edge thread is gone only during shutdown
        let _ = self.tx.send(sample);
    }

    /// Tone flags discarded under the overwrite policy so far.
    pub fn overwritten(&self) -> u64 {
        self.tx.overwritten()
    }

    /// Adapts this callback for a [`crate::audio::BlockSource`]; rejected blocks are logged.
    pub fn into_block_callback(mut self) -> BlockCallback {
        Box::new(move |pcm: &[i16]| {
            if let Err(e) = self.on_samples(pcm) {
                log::warn!("dropping audio block: {}", e);
            }
        })
    }
}

/// Handle to a running pipeline.
pub struct PipelineHandle {
    shutdown: ShutdownSignal,
    /// Join handles for spawned threads
    threads: Vec<JoinHandle<()>>,
    /// Receiver for sink's finish() result
    result_rx: Option<crossbeam_channel::Receiver<Option<String>>>,
    /// Shared with the callback's hand-off sender
    overwritten: Arc<AtomicU64>,
}

impl PipelineHandle {
    /// Stops the pipeline and returns the sink's accumulated result.
    ///
    /// The decoder flushes its pending character before closing, so it reaches the sink.
    /// Waits up to 5s for the result, then 1s for threads to finish; after that the
    /// remaining threads are detached.
    pub fn stop(mut self) -> Option<String> {
        self.shutdown.trigger();

        let result = self
            .result_rx
            .take()
            .and_then(|rx| rx.recv_timeout(Duration::from_secs(5)).ok().flatten());

        let deadline = Instant::now() + Duration::from_secs(1);
        let poll_interval = Duration::from_millis(10);

        loop {
            let mut remaining = Vec::new();
            for handle in self.threads.drain(..) {
                if handle.is_finished() {
                    if let Err(panic_info) = handle.join() {
                        let msg = panic_info
                            .downcast_ref::<&str>()
                            .copied()
                            .or_else(|| panic_info.downcast_ref::<String>().map(|s| s.as_str()))
                            .unwrap_or("unknown panic");
                        log::error!("pipeline thread panicked: {msg}");
                    }
                } else {
                    remaining.push(handle);
                }
            }
            self.threads = remaining;

            if self.threads.is_empty() {
                break;
            }

            if Instant::now() >= deadline {
                log::warn!(
                    "shutdown timeout: {} thread(s) still running, detaching",
                    self.threads.len()
                );
                break;
            }

            thread::sleep(poll_interval);
        }

        let overwritten = self.overwritten();
        if overwritten > 0 {
            log::warn!(
                "{} tone sample(s) overwritten before the edge thread read them",
                overwritten
            );
        }

        result
    }

    /// Tone samples evicted from the hand-off queue so far.
    pub fn overwritten(&self) -> u64 {
        self.overwritten.load(Ordering::Relaxed)
    }

    /// Returns true until `stop` has been requested.
    pub fn is_running(&self) -> bool {
        !self.shutdown.is_triggered()
    }
}

impl Drop for PipelineHandle {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Decode pipeline: ToneCallback → EdgeStation → DecoderStation → TextSink.
pub struct Pipeline {
    config: PipelineConfig,
    error_reporter: Arc<dyn ErrorReporter>,
    clock: Arc<dyn Clock>,
}

impl Pipeline {
    /// Creates a new pipeline with default error reporter.
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            error_reporter: Arc::new(LogReporter),
            clock: Arc::new(SystemClock),
        }
    }

    /// Sets a custom error reporter.
    pub fn with_error_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.error_reporter = reporter;
        self
    }

    /// Sets a custom clock (for deterministic testing).
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Starts the station threads.
    ///
    /// Returns the handle that stops them and the callback to feed audio blocks into.
    pub fn start(self, sink: Box<dyn TextSink>) -> Result<(PipelineHandle, ToneCallback)> {
        self.config.validate()?;
        let detector = ToneDetector::new(&self.config.tone)?;
        let decoder = MorseDecoder::new(self.config.decoder)?;
        let edge = EdgeDetector::with_clock(self.config.silence_timeout, self.clock.clone());

        let shutdown = ShutdownSignal::new();

        // Callback → edge: lossy or blocking, per policy. Edge → decoder: rendezvous.
        let (tone_tx, tone_rx) = handoff(self.config.queue_depth, self.config.overflow);
        let (detection_tx, detection_rx) = bounded(0);
        let (token_tx, token_rx) = bounded(self.config.token_buffer);

        let edge_runner = StationRunner::spawn(
            EdgeStation::new(edge),
            tone_rx,
            detection_tx,
            shutdown.clone(),
            self.error_reporter.clone(),
        );

        let decoder_runner = StationRunner::spawn(
            DecoderStation::new(decoder),
            detection_rx,
            token_tx,
            shutdown.clone(),
            self.error_reporter.clone(),
        );

        // The sink ignores the shared signal and drains until the decoder closes.
        let (result_tx, result_rx) = bounded(1);
        let (sink_out_tx, _) = bounded::<()>(1);
        let sink_runner = StationRunner::spawn(
            SinkStation::new(sink, result_tx),
            token_rx,
            sink_out_tx,
            ShutdownSignal::new(),
            self.error_reporter.clone(),
        );

        let threads = vec![
            thread::spawn(move || {
                if let Err(msg) = edge_runner.join() {
                    log::error!("{msg}");
                }
            }),
            thread::spawn(move || {
                if let Err(msg) = decoder_runner.join() {
                    log::error!("{msg}");
                }
            }),
            thread::spawn(move || {
                if let Err(msg) = sink_runner.join() {
                    log::error!("{msg}");
                }
            }),
        ];

        let overwritten = tone_tx.overwrite_counter();
        let callback = ToneCallback {
            detector,
            tx: tone_tx,
            clock: self.clock,
            shutdown: shutdown.clone(),
        };

        Ok((
            PipelineHandle {
                shutdown,
                threads,
                result_rx: Some(result_rx),
                overwritten,
            },
            callback,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::clock::ManualClock;
    use crate::pipeline::sink::CollectorSink;
    use crate::pipeline::types::DecodedToken;
    use std::f64::consts::PI;

    const BLOCK: usize = 128;
    const BLOCK_MS: u64 = 16;

    fn tone() -> Vec<i16> {
        (0..BLOCK)
            .map(|i| ((2.0 * PI * 700.0 * i as f64 / 8000.0).sin() * 16000.0) as i16)
            .collect()
    }

    fn blocking_config() -> PipelineConfig {
        PipelineConfig {
            overflow: OverflowPolicy::Block,
            ..PipelineConfig::default()
        }
    }

    /// Feeds `units` of 48 ms (three blocks each), advancing the clock per block.
    fn feed(callback: &mut ToneCallback, clock: &ManualClock, units: usize, on: bool) {
        let block = if on { tone() } else { vec![0; BLOCK] };
        for _ in 0..units * 3 {
            clock.advance(Duration::from_millis(BLOCK_MS));
            callback.on_samples(&block).unwrap();
        }
    }

    #[test]
    fn test_pipeline_decodes_and_flushes_pending_character() {
        let clock = ManualClock::new();
        let (handle, mut callback) = Pipeline::new(blocking_config())
            .with_clock(Arc::new(clock.clone()))
            .start(Box::new(CollectorSink::new()))
            .unwrap();
        assert!(handle.is_running());

        // K: -.- then nothing more
        feed(&mut callback, &clock, 2, false);
        feed(&mut callback, &clock, 3, true);
        feed(&mut callback, &clock, 1, false);
        feed(&mut callback, &clock, 1, true);
        feed(&mut callback, &clock, 1, false);
        feed(&mut callback, &clock, 3, true);
        // One more block closes the last dah; two more guarantee it has been decoded
        feed(&mut callback, &clock, 1, false);

        assert_eq!(handle.stop(), Some("K".to_string()));
    }

    #[test]
    fn test_stop_without_input_returns_nothing() {
        let (handle, _callback) = Pipeline::new(PipelineConfig::default())
            .start(Box::new(CollectorSink::new()))
            .unwrap();
        assert_eq!(handle.stop(), None);
    }

    #[test]
    fn test_callback_rejects_bad_blocks() {
        let (handle, mut callback) = Pipeline::new(PipelineConfig::default())
            .start(Box::new(CollectorSink::new()))
            .unwrap();
        assert!(callback.on_block(&[0, 0, 0]).is_err());
        assert!(callback.on_samples(&[0; 4096]).is_err());
        assert!(!callback.on_block(&[0; 256]).unwrap());
        handle.stop();
    }

    #[test]
    fn test_callback_after_stop_does_not_block() {
        let (handle, mut callback) = Pipeline::new(blocking_config())
            .start(Box::new(CollectorSink::new()))
            .unwrap();
        handle.stop();
        for _ in 0..10 {
            callback.on_samples(&tone()).unwrap();
        }
    }

    /// Holds every token until the gate's sender is dropped.
    struct GatedSink {
        gate: crossbeam_channel::Receiver<()>,
    }

    impl TextSink for GatedSink {
        fn handle(&mut self, _token: &DecodedToken) -> Result<()> {
            let _ = self.gate.recv();
            Ok(())
        }
    }

    #[test]
    fn test_handle_reports_overwritten_samples() {
        let clock = ManualClock::new();
        let (gate_tx, gate) = bounded::<()>(0);
        let config = PipelineConfig {
            overflow: OverflowPolicy::Overwrite,
            token_buffer: 0,
            ..PipelineConfig::default()
        };
        let (handle, mut callback) = Pipeline::new(config)
            .with_clock(Arc::new(clock.clone()))
            .start(Box::new(GatedSink { gate }))
            .unwrap();
        assert_eq!(handle.overwritten(), 0);

        // Keep keying E until the stalled sink backs up into the hand-off queue
        let mut letters = 0;
        while callback.overwritten() == 0 {
            assert!(letters < 10_000, "hand-off queue never overflowed");
            feed(&mut callback, &clock, 1, true);
            feed(&mut callback, &clock, 3, false);
            letters += 1;
        }

        assert!(handle.overwritten() > 0);
        assert_eq!(handle.overwritten(), callback.overwritten());

        drop(gate_tx);
        assert_eq!(handle.stop(), None);
    }

    #[test]
    fn test_invalid_config_fails_to_start() {
        let mut config = PipelineConfig::default();
        config.decoder.wpm = 0;
        assert!(Pipeline::new(config).start(Box::new(CollectorSink::new())).is_err());

        let mut config = PipelineConfig::default();
        config.queue_depth = 0;
        assert!(config.validate().is_err());
    }
}
