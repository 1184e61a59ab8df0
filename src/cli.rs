//! Command-line interface for morsh
//!
//! Provides argument parsing using clap derive macros.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;
use std::time::Duration;

/// Live Morse code decoder
#[derive(Parser, Debug)]
#[command(name = "morsh", version, about = "Live Morse code decoder")]
pub struct Cli {
    /// Subcommand to execute (default: listen)
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose output (-v: debug log of detections and tokens)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Expected keying speed in words per minute
    #[arg(long, global = true, value_name = "WPM")]
    pub wpm: Option<u32>,

    /// Timing slack as a fraction of each duration (0.0 to 1.0)
    #[arg(long, global = true, value_name = "FRACTION")]
    pub tolerance: Option<f64>,

    /// Minimum tone magnitude that counts as key-down
    #[arg(long, global = true, value_name = "MAGNITUDE")]
    pub threshold: Option<f64>,

    /// Silence after which a pending character is emitted. Examples: 2s, 1500ms, 800
    #[arg(long, global = true, value_name = "DURATION", value_parser = parse_timeout)]
    pub silence_timeout: Option<Duration>,

    /// Audio input device (e.g., hw:0)
    #[arg(long, global = true, value_name = "DEVICE")]
    pub device: Option<String>,
}

/// Parse a silence timeout.
///
/// Bare numbers are milliseconds; anything else goes through `humantime`
/// (`2s`, `1500ms`, `1s500ms`).
fn parse_timeout(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if let Ok(ms) = s.parse::<u64>() {
        return Ok(Duration::from_millis(ms));
    }
    humantime::parse_duration(s).map_err(|e| e.to_string())
}

/// Available commands
#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Decode live audio from the input device until Ctrl-C
    Listen,

    /// Decode a recorded 16-bit WAV file
    Decode {
        /// WAV file to decode
        #[arg(value_name = "FILE")]
        wav: PathBuf,
    },

    /// Print per-block tone magnitudes of a WAV file
    Tones {
        /// WAV file to analyse
        #[arg(value_name = "FILE")]
        wav: PathBuf,

        /// Only print blocks where a tone is present
        #[arg(long)]
        present_only: bool,
    },

    /// Print the strongest frequency of each block of a WAV file
    Spectrum {
        /// WAV file to analyse
        #[arg(value_name = "FILE")]
        wav: PathBuf,

        /// FFT length in samples (power of two)
        #[arg(long, value_name = "N", default_value = "128")]
        fft_size: usize,
    },

    /// List available audio input devices
    Devices,

    /// View configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

/// Configuration actions
#[derive(Subcommand, Debug, PartialEq)]
pub enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,
    /// Print the configuration file path
    Path,
}

impl Cli {
    /// The subcommand to run; a bare `morsh` listens.
    pub fn command_or_default(&self) -> &Commands {
        self.command.as_ref().unwrap_or(&Commands::Listen)
    }
}
