//! Live audio capture using CPAL (Cross-Platform Audio Library).

use crate::audio::source::{BlockCallback, BlockSource};
use crate::error::{MorshError, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

/// Run a closure with stderr temporarily redirected to /dev/null.
///
/// Silences the ALSA/JACK/PipeWire chatter CPAL triggers while probing backends.
///
/// # Safety
/// Uses `libc::dup`/`libc::dup2` to save and restore file descriptor 2 (stderr).
/// Safe as long as no other thread is concurrently manipulating fd 2.
fn with_suppressed_stderr<F, R>(f: F) -> R
where
    F: FnOnce() -> R,
{
    unsafe {
        let saved_fd = libc::dup(2);
        let devnull = libc::open(c"/dev/null".as_ptr(), libc::O_WRONLY);
        if saved_fd >= 0 && devnull >= 0 {
            libc::dup2(devnull, 2);
            libc::close(devnull);
        }

        let result = f();

        if saved_fd >= 0 {
            libc::dup2(saved_fd, 2);
            libc::close(saved_fd);
        }

        result
    }
}

/// Keep JACK from auto-starting and quiet the PipeWire/ALSA debug output.
///
/// # Safety
/// Modifies environment variables; call at startup before any threads are spawned.
pub fn suppress_audio_warnings() {
    // SAFETY: Called at startup before any threads are spawned
    unsafe {
        std::env::set_var("JACK_NO_START_SERVER", "1");
        std::env::set_var("JACK_NO_AUDIO_RESERVATION", "1");
        std::env::set_var("PIPEWIRE_DEBUG", "0");
        std::env::set_var("ALSA_DEBUG", "0");
        std::env::set_var("PW_LOG", "0");
    }
}

/// Sound servers that resample to 8 kHz for us.
const PREFERRED_DEVICES: &[&str] = &["pipewire", "pulse", "PulseAudio"];

/// Device name patterns that are never useful as a receiver input.
const FILTERED_PATTERNS: &[&str] = &[
    "surround",
    "front:",
    "rear:",
    "center:",
    "side:",
    "Digital Output",
    "HDMI",
    "S/PDIF",
];

fn should_filter_device(name: &str) -> bool {
    let lower = name.to_lowercase();
    FILTERED_PATTERNS
        .iter()
        .any(|pattern| lower.contains(&pattern.to_lowercase()))
}

fn is_preferred_device(name: &str) -> bool {
    let lower = name.to_lowercase();
    PREFERRED_DEVICES
        .iter()
        .any(|pref| lower.contains(&pref.to_lowercase()))
}

/// List usable audio input devices, marking sound-server devices "\[recommended\]".
///
/// # Errors
/// Returns `MorshError::AudioCapture` if device enumeration fails.
pub fn list_devices() -> Result<Vec<String>> {
    let (host, devices) = with_suppressed_stderr(|| {
        let host = cpal::default_host();
        let devices = host.input_devices();
        (host, devices)
    });
    let _ = host; // keep host alive while iterating devices
    let devices = devices.map_err(|e| MorshError::AudioCapture {
        message: format!("Failed to enumerate input devices: {}", e),
    })?;

    let mut device_names = Vec::new();
    for device in devices {
        if let Ok(name) = device.name() {
            if should_filter_device(&name) {
                continue;
            }
            if is_preferred_device(&name) {
                device_names.push(format!("{} [recommended]", name));
            } else {
                device_names.push(name);
            }
        }
    }

    Ok(device_names)
}

/// Pick the input device: PipeWire, then PulseAudio, then the system default.
fn get_best_default_device() -> Result<cpal::Device> {
    with_suppressed_stderr(|| {
        let host = cpal::default_host();

        if let Ok(devices) = host.input_devices() {
            for device in devices {
                if let Ok(name) = device.name()
                    && is_preferred_device(&name)
                {
                    return Ok(device);
                }
            }
        }

        host.default_input_device()
            .ok_or_else(|| MorshError::AudioDeviceNotFound {
                device: "default".to_string(),
            })
    })
}

fn find_device(name: &str) -> Result<cpal::Device> {
    with_suppressed_stderr(|| {
        let host = cpal::default_host();
        let devices = host
            .input_devices()
            .map_err(|e| MorshError::AudioCapture {
                message: format!("Failed to enumerate devices: {}", e),
            })?;

        for dev in devices {
            if let Ok(dev_name) = dev.name()
                && dev_name == name
            {
                return Ok(dev);
            }
        }

        Err(MorshError::AudioDeviceNotFound {
            device: name.to_string(),
        })
    })
}

/// Re-slices driver buffers of arbitrary length into fixed-size blocks.
///
/// The block buffer is allocated once; pushing samples never allocates.
struct Rechunker {
    block: Vec<i16>,
    block_size: usize,
    on_block: BlockCallback,
}

impl Rechunker {
    fn new(block_size: usize, on_block: BlockCallback) -> Self {
        Self {
            block: Vec::with_capacity(block_size),
            block_size,
            on_block,
        }
    }

    fn push(&mut self, samples: impl Iterator<Item = i16>) {
        for sample in samples {
            self.block.push(sample);
            if self.block.len() == self.block_size {
                (self.on_block)(&self.block);
                self.block.clear();
            }
        }
    }
}

/// Wrapper for cpal::Stream to make it Send.
///
/// SAFETY: the stream is only touched from the thread that owns the
/// `CpalBlockSource`, through `&mut self`.
struct SendableStream(cpal::Stream);

unsafe impl Send for SendableStream {}

/// Live capture of 16-bit mono PCM at a fixed rate.
///
/// Tries i16 first, then f32 with conversion, at the configured rate. Blocks of exactly
/// `block_size` samples are handed to the callback on the driver's thread.
pub struct CpalBlockSource {
    device: cpal::Device,
    stream: Option<SendableStream>,
    sample_rate: u32,
    block_size: usize,
}

impl CpalBlockSource {
    /// Open `device_name`, or the best default input device when `None`.
    ///
    /// # Errors
    /// Returns `MorshError::AudioDeviceNotFound` when the named device does not exist.
    pub fn new(device_name: Option<&str>, sample_rate: u32, block_size: usize) -> Result<Self> {
        if block_size == 0 {
            return Err(MorshError::invalid_value("block_size", "must be positive"));
        }
        let device = match device_name {
            Some(name) => find_device(name)?,
            None => get_best_default_device()?,
        };
        if let Ok(name) = device.name() {
            log::debug!("capturing from {}", name);
        }

        Ok(Self {
            device,
            stream: None,
            sample_rate,
            block_size,
        })
    }

    /// Builds one stream in the device's native sample format, with the rechunker
    /// moved into its data callback.
    fn build_stream(&self, mut rechunker: Rechunker) -> Result<cpal::Stream> {
        use cpal::SampleFormat;

        let config = cpal::StreamConfig {
            channels: 1,
            sample_rate: cpal::SampleRate(self.sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let err_callback = |err| {
            log::error!("Audio stream error: {}", err);
        };

        let format = self
            .device
            .default_input_config()
            .map(|c| c.sample_format())
            .map_err(|e| MorshError::AudioCapture {
                message: format!("Failed to query input format: {}", e),
            })?;
        log::debug!("native input format {:?}", format);

        let stream = match format {
            SampleFormat::I16 => self.device.build_input_stream(
                &config,
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    rechunker.push(data.iter().copied());
                },
                err_callback,
                None,
            ),
            // Everything else is captured as float and converted
            _ => self.device.build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    rechunker.push(data.iter().map(|&s| f32_to_i16(s)));
                },
                err_callback,
                None,
            ),
        };

        stream.map_err(|e| MorshError::AudioFormatMismatch {
            expected: format!("mono {} Hz i16 or f32 input", self.sample_rate),
            actual: e.to_string(),
        })
    }
}

/// Float sample to i16 on the same 32768 scale `dsp::pcm` normalises by.
fn f32_to_i16(sample: f32) -> i16 {
    let scaled = sample * -(i16::MIN as f32);
    scaled.clamp(i16::MIN as f32, i16::MAX as f32) as i16
}

impl BlockSource for CpalBlockSource {
    fn start(&mut self, on_block: BlockCallback) -> Result<()> {
        if self.stream.is_some() {
            return Ok(()); // Already started
        }

        let rechunker = Rechunker::new(self.block_size, on_block);
        let stream = with_suppressed_stderr(|| self.build_stream(rechunker))?;
        stream.play().map_err(|e| MorshError::AudioCapture {
            message: format!("Failed to start audio stream: {}", e),
        })?;

        self.stream = Some(SendableStream(stream));
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        if let Some(sendable_stream) = self.stream.take() {
            sendable_stream
                .0
                .pause()
                .map_err(|e| MorshError::AudioCapture {
                    message: format!("Failed to stop audio stream: {}", e),
                })?;
        }
        Ok(())
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}
