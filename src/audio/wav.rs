//! WAV file input: loading recordings and replaying them as a block source.

use crate::audio::source::{BlockCallback, BlockSource};
use crate::error::{MorshError, Result};
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// Mono 16-bit samples decoded from a WAV file.
#[derive(Debug, Clone, PartialEq)]
pub struct WavRecording {
    pub samples: Vec<i16>,
    pub sample_rate: u32,
}

impl WavRecording {
    /// Parses WAV data from any reader, mixing multi-channel audio down to mono.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut wav_reader = hound::WavReader::new(reader).map_err(|e| MorshError::AudioCapture {
            message: format!("Failed to parse WAV file: {}", e),
        })?;

        let spec = wav_reader.spec();
        if spec.sample_format != hound::SampleFormat::Int || spec.bits_per_sample != 16 {
            return Err(MorshError::AudioFormatMismatch {
                expected: "16-bit integer PCM".to_string(),
                actual: format!("{}-bit {:?}", spec.bits_per_sample, spec.sample_format),
            });
        }

        let raw_samples: Vec<i16> = wav_reader
            .samples::<i16>()
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| MorshError::AudioCapture {
                message: format!("Failed to read WAV samples: {}", e),
            })?;

        Ok(Self {
            samples: mix_to_mono(&raw_samples, spec.channels as usize),
            sample_rate: spec.sample_rate,
        })
    }

    /// Opens and parses a WAV file.
    pub fn open(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    /// Fails unless the recording was made at `expected` Hz.
    pub fn require_sample_rate(&self, expected: u32) -> Result<()> {
        if self.sample_rate != expected {
            return Err(MorshError::AudioFormatMismatch {
                expected: format!("{} Hz", expected),
                actual: format!("{} Hz", self.sample_rate),
            });
        }
        Ok(())
    }

    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.samples.len() as f64 / self.sample_rate as f64)
    }
}

/// Averages interleaved frames into one channel.
fn mix_to_mono(samples: &[i16], channels: usize) -> Vec<i16> {
    if channels <= 1 {
        return samples.to_vec();
    }
    samples
        .chunks_exact(channels)
        .map(|frame| {
            let sum: i32 = frame.iter().map(|&s| s as i32).sum();
            (sum / channels as i32) as i16
        })
        .collect()
}

/// Replays a recording block by block on its own thread.
///
/// With pacing enabled (the default) each block is delivered one block-duration after
/// the previous one, so downstream wall-clock timing matches the recording.
pub struct WavBlockSource {
    samples: Arc<Vec<i16>>,
    sample_rate: u32,
    block_size: usize,
    paced: bool,
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl WavBlockSource {
    /// Wraps a recording, rejecting one whose sample rate differs from `sample_rate`.
    pub fn new(recording: WavRecording, sample_rate: u32, block_size: usize) -> Result<Self> {
        recording.require_sample_rate(sample_rate)?;
        if block_size == 0 {
            return Err(MorshError::invalid_value("block_size", "must be positive"));
        }
        Ok(Self {
            samples: Arc::new(recording.samples),
            sample_rate,
            block_size,
            paced: true,
            stop: Arc::new(AtomicBool::new(false)),
            thread: None,
        })
    }

    /// Opens a WAV file as a block source.
    pub fn open(path: &Path, sample_rate: u32, block_size: usize) -> Result<Self> {
        Self::new(WavRecording::open(path)?, sample_rate, block_size)
    }

    /// Enables or disables real-time pacing.
    pub fn with_pacing(mut self, paced: bool) -> Self {
        self.paced = paced;
        self
    }

    fn block_duration(&self) -> Duration {
        Duration::from_secs_f64(self.block_size as f64 / self.sample_rate as f64)
    }
}

impl BlockSource for WavBlockSource {
    fn start(&mut self, mut on_block: BlockCallback) -> Result<()> {
        if self.thread.is_some() {
            return Ok(()); // Already started
        }
        self.stop.store(false, Ordering::SeqCst);

        let samples = Arc::clone(&self.samples);
        let stop = Arc::clone(&self.stop);
        let block_size = self.block_size;
        let period = self.paced.then(|| self.block_duration());

        let handle = std::thread::Builder::new()
            .name("wav-source".to_string())
            .spawn(move || {
                let started = Instant::now();
                for (index, block) in samples.chunks(block_size).enumerate() {
                    if stop.load(Ordering::SeqCst) {
                        break;
                    }
                    if let Some(period) = period {
                        let due = started + period * index as u32;
                        let now = Instant::now();
                        if due > now {
                            std::thread::sleep(due - now);
                        }
                    }
                    on_block(block);
                }
                log::debug!("wav source finished");
            })
            .map_err(|e| MorshError::AudioCapture {
                message: format!("Failed to spawn WAV source thread: {}", e),
            })?;

        self.thread = Some(handle);
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.stop.store(true, Ordering::SeqCst);
        self.wait()
    }

    fn is_finite(&self) -> bool {
        true
    }

    fn wait(&mut self) -> Result<()> {
        if let Some(handle) = self.thread.take() {
            handle.join().map_err(|_| MorshError::AudioCapture {
                message: "WAV source thread panicked".to_string(),
            })?;
        }
        Ok(())
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

impl Drop for WavBlockSource {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}
