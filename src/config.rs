use crate::audio::tone::ToneDetectorConfig;
use crate::decode::decoder::DecoderConfig;
use crate::defaults;
use crate::error::{MorshError, Result};
use crate::pipeline::handoff::OverflowPolicy;
use crate::pipeline::orchestrator::PipelineConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
#[cfg(feature = "cli")]
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub audio: AudioConfig,
    pub detector: DetectorConfig,
    pub decoder: DecoderSection,
    pub pipeline: PipelineSection,
}

/// Audio input configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AudioConfig {
    pub device: Option<String>,
    pub sample_rate: u32,
    /// Samples per block; also the largest block the tone detector accepts.
    pub block_size: usize,
}

/// Tone detection configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DetectorConfig {
    pub target_frequencies: Vec<f64>,
    pub detection_threshold: f64,
}

/// Decode speed and timing configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DecoderSection {
    pub wpm: u32,
    pub tolerance: f64,
    pub silence_timeout_ms: u64,
}

/// Stage wiring configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PipelineSection {
    pub overflow: OverflowPolicy,
    pub queue_depth: usize,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            device: None,
            sample_rate: defaults::SAMPLE_RATE,
            block_size: defaults::BLOCK_SIZE,
        }
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            target_frequencies: defaults::TARGET_FREQUENCIES.to_vec(),
            detection_threshold: defaults::DETECTION_THRESHOLD,
        }
    }
}

impl Default for DecoderSection {
    fn default() -> Self {
        Self {
            wpm: defaults::WPM,
            tolerance: defaults::TOLERANCE,
            silence_timeout_ms: defaults::SILENCE_TIMEOUT_MS,
        }
    }
}

impl Default for PipelineSection {
    fn default() -> Self {
        Self {
            overflow: OverflowPolicy::default(),
            queue_depth: defaults::QUEUE_DEPTH,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if file doesn't exist
    ///
    /// Only a missing file yields defaults; unreadable files and invalid TOML are errors.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(e)
                if e.downcast_ref::<std::io::Error>()
                    .is_some_and(|io_err| io_err.kind() == std::io::ErrorKind::NotFound) =>
            {
                log::debug!("no config at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(e.context(format!("Failed to load config from {}", path.display()))),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - MORSH_WPM → decoder.wpm
    /// - MORSH_TOLERANCE → decoder.tolerance
    /// - MORSH_THRESHOLD → detector.detection_threshold
    /// - MORSH_AUDIO_DEVICE → audio.device
    ///
    /// Empty or unparsable values are ignored.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(wpm) = env_parse("MORSH_WPM") {
            self.decoder.wpm = wpm;
        }

        if let Some(tolerance) = env_parse("MORSH_TOLERANCE") {
            self.decoder.tolerance = tolerance;
        }

        if let Some(threshold) = env_parse("MORSH_THRESHOLD") {
            self.detector.detection_threshold = threshold;
        }

        if let Ok(device) = std::env::var("MORSH_AUDIO_DEVICE")
            && !device.is_empty()
        {
            self.audio.device = Some(device);
        }

        self
    }

    /// Check every value the pipeline depends on.
    pub fn validate(&self) -> Result<()> {
        if self.audio.block_size == 0 {
            return Err(MorshError::invalid_value(
                "audio.block_size",
                "must be positive",
            ));
        }
        if self.decoder.silence_timeout_ms == 0 {
            return Err(MorshError::invalid_value(
                "decoder.silence_timeout_ms",
                "must be positive",
            ));
        }
        self.pipeline_config().validate()
    }

    /// Pipeline settings derived from this configuration.
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            tone: ToneDetectorConfig {
                sample_rate: self.audio.sample_rate,
                block_size: self.audio.block_size,
                target_frequencies: self.detector.target_frequencies.clone(),
                threshold: self.detector.detection_threshold,
            },
            decoder: DecoderConfig {
                wpm: self.decoder.wpm,
                tolerance: self.decoder.tolerance,
            },
            silence_timeout: Duration::from_millis(self.decoder.silence_timeout_ms),
            overflow: self.pipeline.overflow,
            queue_depth: self.pipeline.queue_depth,
            token_buffer: defaults::TOKEN_BUFFER,
        }
    }

    /// Render as TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| MorshError::ConfigParse {
            message: e.to_string(),
        })
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/morsh/config.toml on Linux
    #[cfg(feature = "cli")]
    pub fn default_path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("morsh").join("config.toml"))
            .ok_or_else(|| MorshError::Other("Could not determine config directory".to_string()))
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    let value = std::env::var(key).ok()?;
    if value.is_empty() {
        return None;
    }
    match value.parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            log::warn!("ignoring unparsable {}={:?}", key, value);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::NamedTempFile;

    // Mutex to serialize tests that modify environment variables
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    // SAFETY: These helpers are only used in tests with ENV_LOCK held,
    // ensuring no concurrent access to environment variables.
    fn set_env(key: &str, value: &str) {
        unsafe { std::env::set_var(key, value) }
    }

    fn remove_env(key: &str) {
        unsafe { std::env::remove_var(key) }
    }

    fn clear_morsh_env() {
        remove_env("MORSH_WPM");
        remove_env("MORSH_TOLERANCE");
        remove_env("MORSH_THRESHOLD");
        remove_env("MORSH_AUDIO_DEVICE");
    }

    fn write_temp(contents: &str) -> NamedTempFile {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(contents.as_bytes()).unwrap();
        temp_file
    }

    #[test]
    fn test_default_config_has_correct_values() {
        let config = Config::default();

        assert_eq!(config.audio.device, None);
        assert_eq!(config.audio.sample_rate, 8000);
        assert_eq!(config.audio.block_size, 128);

        assert_eq!(config.detector.target_frequencies.len(), 10);
        assert_eq!(config.detector.target_frequencies[0], 500.0);
        assert_eq!(config.detector.target_frequencies[9], 950.0);

        assert_eq!(config.decoder.wpm, 25);
        assert_eq!(config.decoder.tolerance, 0.4);
        assert_eq!(config.decoder.silence_timeout_ms, 2000);

        assert_eq!(config.pipeline.overflow, OverflowPolicy::Overwrite);
        assert_eq!(config.pipeline.queue_depth, 1);

        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_toml_file() {
        let temp_file = write_temp(
            r#"
            [audio]
            device = "hw:0,0"
            block_size = 256

            [detector]
            target_frequencies = [600.0, 700.0]
            detection_threshold = 2.5

            [decoder]
            wpm = 18
            tolerance = 0.3
            silence_timeout_ms = 3000

            [pipeline]
            overflow = "block"
            queue_depth = 4
        "#,
        );

        let config = Config::load(temp_file.path()).unwrap();

        assert_eq!(config.audio.device, Some("hw:0,0".to_string()));
        assert_eq!(config.audio.block_size, 256);
        assert_eq!(config.detector.target_frequencies, vec![600.0, 700.0]);
        assert_eq!(config.detector.detection_threshold, 2.5);
        assert_eq!(config.decoder.wpm, 18);
        assert_eq!(config.decoder.tolerance, 0.3);
        assert_eq!(config.decoder.silence_timeout_ms, 3000);
        assert_eq!(config.pipeline.overflow, OverflowPolicy::Block);
        assert_eq!(config.pipeline.queue_depth, 4);
    }

    #[test]
    fn test_load_partial_config_uses_defaults() {
        let temp_file = write_temp(
            r#"
            [decoder]
            wpm = 30
        "#,
        );

        let config = Config::load(temp_file.path()).unwrap();

        assert_eq!(config.decoder.wpm, 30);
        assert_eq!(config.decoder.tolerance, 0.4);
        assert_eq!(config.audio, AudioConfig::default());
        assert_eq!(config.detector, DetectorConfig::default());
        assert_eq!(config.pipeline, PipelineSection::default());
    }

    #[test]
    fn test_pipeline_config_mapping() {
        let mut config = Config::default();
        config.decoder.wpm = 20;
        config.decoder.silence_timeout_ms = 1500;
        config.pipeline.overflow = OverflowPolicy::Block;

        let pipeline = config.pipeline_config();
        assert_eq!(pipeline.decoder.wpm, 20);
        assert_eq!(pipeline.silence_timeout, Duration::from_millis(1500));
        assert_eq!(pipeline.overflow, OverflowPolicy::Block);
        assert_eq!(pipeline.tone.block_size, 128);
        assert_eq!(pipeline.tone.threshold, 1.0);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.decoder.wpm = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.decoder.tolerance = 1.2;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.detector.target_frequencies = vec![5000.0];
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.detector.detection_threshold = -1.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.audio.block_size = 0;
        assert!(matches!(
            config.validate(),
            Err(MorshError::ConfigInvalidValue { key, .. }) if key == "audio.block_size"
        ));

        let mut config = Config::default();
        config.pipeline.queue_depth = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.decoder.silence_timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_override_numbers() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_morsh_env();

        set_env("MORSH_WPM", "18");
        set_env("MORSH_TOLERANCE", "0.25");
        set_env("MORSH_THRESHOLD", "3.5");
        let config = Config::default().with_env_overrides();

        assert_eq!(config.decoder.wpm, 18);
        assert_eq!(config.decoder.tolerance, 0.25);
        assert_eq!(config.detector.detection_threshold, 3.5);

        clear_morsh_env();
    }

    #[test]
    fn test_env_override_device() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_morsh_env();

        set_env("MORSH_AUDIO_DEVICE", "hw:1,0");
        let config = Config::default().with_env_overrides();

        assert_eq!(config.audio.device, Some("hw:1,0".to_string()));

        clear_morsh_env();
    }

    #[test]
    fn test_env_override_empty_or_garbage_ignored() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_morsh_env();

        set_env("MORSH_WPM", "");
        set_env("MORSH_TOLERANCE", "loose");
        set_env("MORSH_AUDIO_DEVICE", "");
        let config = Config::default().with_env_overrides();

        assert_eq!(config, Config::default());

        clear_morsh_env();
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let temp_file = write_temp(
            r#"
            [audio
            device = "broken
        "#,
        );

        assert!(Config::load(temp_file.path()).is_err());
    }

    #[test]
    fn test_unknown_overflow_policy_is_rejected() {
        let temp_file = write_temp("[pipeline]\noverflow = \"drop\"\n");
        assert!(Config::load(temp_file.path()).is_err());
    }

    #[test]
    fn test_load_or_default_returns_default_for_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing_path = dir.path().join("config.toml");
        let config = Config::load_or_default(&missing_path).unwrap();

        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_or_default_errors_on_invalid_toml() {
        let temp_file = write_temp("[decoder]\nwpm = \"fast\"\n");

        let err = Config::load_or_default(temp_file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to load config"));
    }

    #[test]
    fn test_toml_round_trip_of_defaults() {
        let rendered = Config::default().to_toml().unwrap();
        let parsed: Config = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed, Config::default());
    }

    #[cfg(feature = "cli")]
    #[test]
    fn test_default_path_is_xdg_compliant() {
        let path = Config::default_path().unwrap();
        let path_str = path.to_string_lossy();

        assert!(path_str.contains("morsh"));
        assert!(path_str.ends_with("config.toml"));
    }
}
