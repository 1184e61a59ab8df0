use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use morsh::audio::tone::ToneDetector;
use morsh::audio::wav::WavRecording;
use morsh::cli::{Cli, Commands, ConfigAction};
use morsh::config::Config;
use morsh::dsp::spectrum::SpectrumAnalyzer;
use owo_colors::OwoColorize;
use std::io::IsTerminal;
use std::path::Path;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match cli.command_or_default() {
        Commands::Listen => {
            let config = effective_config(&cli)?;
            run_listen(config).await?;
        }
        Commands::Decode { wav } => {
            let config = effective_config(&cli)?;
            run_decode(&config, wav)?;
        }
        Commands::Tones { wav, present_only } => {
            let config = effective_config(&cli)?;
            run_tones(&config, wav, *present_only)?;
        }
        Commands::Spectrum { wav, fft_size } => {
            let config = effective_config(&cli)?;
            run_spectrum(&config, wav, *fft_size)?;
        }
        Commands::Devices => {
            list_audio_devices()?;
        }
        Commands::Config { action } => {
            handle_config_command(action, &cli)?;
        }
        Commands::Completions { shell } => {
            clap_complete::generate(
                *shell,
                &mut Cli::command(),
                "morsh",
                &mut std::io::stdout(),
            );
        }
    }

    Ok(())
}

/// Route `log` output through env_logger; `RUST_LOG` overrides the flags.
fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_millis()
        .init();
}

fn config_path(custom_path: Option<&Path>) -> Result<std::path::PathBuf> {
    match custom_path {
        Some(path) => Ok(path.to_path_buf()),
        None => Ok(Config::default_path()?),
    }
}

fn load_config(custom_path: Option<&Path>) -> Result<Config> {
    let config = match custom_path {
        // An explicit path must exist
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::load_or_default(&config_path(None)?)?,
    };

    Ok(config.with_env_overrides())
}

/// File, then environment, then command-line flags; validated.
fn effective_config(cli: &Cli) -> Result<Config> {
    let mut config = load_config(cli.config.as_deref())?;

    if let Some(wpm) = cli.wpm {
        config.decoder.wpm = wpm;
    }
    if let Some(tolerance) = cli.tolerance {
        config.decoder.tolerance = tolerance;
    }
    if let Some(threshold) = cli.threshold {
        config.detector.detection_threshold = threshold;
    }
    if let Some(timeout) = cli.silence_timeout {
        config.decoder.silence_timeout_ms = timeout.as_millis() as u64;
    }
    if let Some(device) = &cli.device {
        config.audio.device = Some(device.clone());
    }

    config.validate()?;
    Ok(config)
}

#[cfg(feature = "cpal-audio")]
async fn run_listen(config: Config) -> Result<()> {
    use morsh::audio::capture::{CpalBlockSource, suppress_audio_warnings};
    use morsh::{BlockSource, Pipeline, StdoutSink};

    suppress_audio_warnings();

    let mut source = CpalBlockSource::new(
        config.audio.device.as_deref(),
        config.audio.sample_rate,
        config.audio.block_size,
    )?;
    let (handle, callback) = Pipeline::new(config.pipeline_config())
        .start(Box::new(StdoutSink::new()))?;
    source.start(callback.into_block_callback())?;

    if std::io::stderr().is_terminal() {
        eprintln!(
            "{} at {} WPM, Ctrl-C to stop",
            "Listening".green().bold(),
            config.decoder.wpm
        );
    }

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;

    source.stop()?;
    handle.stop();
    Ok(())
}

#[cfg(not(feature = "cpal-audio"))]
async fn run_listen(_config: Config) -> Result<()> {
    anyhow::bail!("Live capture requires the cpal-audio feature; use `morsh decode <wav>`")
}

fn open_recording(config: &Config, path: &Path) -> Result<WavRecording> {
    let recording = WavRecording::open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    recording.require_sample_rate(config.audio.sample_rate)?;
    Ok(recording)
}

fn run_decode(config: &Config, path: &Path) -> Result<()> {
    let recording = open_recording(config, path)?;
    log::debug!(
        "decoding {} ({:.1}s)",
        path.display(),
        recording.duration().as_secs_f64()
    );

    let text = morsh::decode_samples(&recording.samples, &config.pipeline_config())?;
    println!("{}", text);
    Ok(())
}

/// Magnitude table: one row per block, one column per monitored frequency.
fn run_tones(config: &Config, path: &Path, present_only: bool) -> Result<()> {
    let recording = open_recording(config, path)?;
    let tone_config = config.pipeline_config().tone;
    let mut detector = ToneDetector::new(&tone_config)?;
    let block_ms = detector.block_size() as f64 * 1000.0 / f64::from(detector.sample_rate());
    let color = std::io::stdout().is_terminal();

    let header: Vec<String> = detector
        .frequencies()
        .map(|f| format!("{:>8.0}", f))
        .collect();
    let header = format!("{:>9} {}", "ms", header.join(""));
    if color {
        println!("{}", header.bold());
    } else {
        println!("{}", header);
    }

    for (index, block) in recording.samples.chunks(detector.block_size()).enumerate() {
        let present = detector.process_samples(block)?;
        if present_only && !present {
            continue;
        }

        let cells: String = detector
            .magnitudes()
            .iter()
            .map(|&m| {
                let cell = format!("{:>8.1}", m);
                if color && m > tone_config.threshold {
                    cell.yellow().to_string()
                } else {
                    cell
                }
            })
            .collect();
        let marker = if present { " *" } else { "" };
        println!("{:>9.0} {}{}", index as f64 * block_ms, cells, marker);
    }

    Ok(())
}

/// Strongest FFT bin per block.
fn run_spectrum(config: &Config, path: &Path, fft_size: usize) -> Result<()> {
    let recording = open_recording(config, path)?;
    let mut analyzer = SpectrumAnalyzer::new(recording.sample_rate, fft_size)?;
    let block_ms = fft_size as f64 * 1000.0 / f64::from(recording.sample_rate);

    for (index, block) in recording.samples.chunks(fft_size).enumerate() {
        analyzer.analyze(block)?;
        if let Some((freq, mag)) = analyzer.peak() {
            println!(
                "{:>9.0} ms  {:>7.1} Hz  {:.4}",
                index as f64 * block_ms,
                freq,
                mag
            );
        }
    }

    Ok(())
}

/// List available audio input devices.
#[cfg(feature = "cpal-audio")]
fn list_audio_devices() -> Result<()> {
    let devices = morsh::audio::capture::list_devices()?;

    if devices.is_empty() {
        anyhow::bail!("No audio input devices found");
    }

    println!("Available audio input devices:");
    for (idx, device) in devices.iter().enumerate() {
        println!("  [{}] {}", idx, device);
    }

    Ok(())
}

#[cfg(not(feature = "cpal-audio"))]
fn list_audio_devices() -> Result<()> {
    anyhow::bail!("Device listing requires the cpal-audio feature")
}

fn handle_config_command(action: &ConfigAction, cli: &Cli) -> Result<()> {
    match action {
        ConfigAction::Path => {
            println!("{}", config_path(cli.config.as_deref())?.display());
        }
        ConfigAction::Show => {
            let config = effective_config(cli)?;
            print!("{}", config.to_toml()?);
        }
    }
    Ok(())
}
