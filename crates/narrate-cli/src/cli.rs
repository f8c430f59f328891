//! Command-line surface of the `narrate` binary.

use crate::batch::{convert_directory, BatchOptions};
use crate::config::{Config, ConfigError};
use crate::convert::{ConvertOptions, Converter};
use crate::error::StartupError;
use clap::Parser;
use narrate_voice::{TtsClient, VoiceRegistry};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Default output directory.
pub const DEFAULT_OUTPUT_ROOT: &str = "out";

/// Convert dialogue scripts into narrated audio.
#[derive(Parser, Debug, Clone)]
#[command(name = "narrate", version, about)]
pub struct Cli {
    /// Script file, or a directory of scripts for batch mode.
    #[arg(required_unless_present = "test_connection")]
    pub input: Option<PathBuf>,

    /// Output file (single script) or output root (directory). Default: out
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Glob pattern for scripts in batch mode.
    #[arg(short, long, default_value = "*.md")]
    pub pattern: String,

    /// Use this voice id for every character.
    #[arg(short = 'v', long)]
    pub voice: Option<String>,

    /// Use this speed ratio for every character.
    #[arg(short, long)]
    pub speed: Option<f32>,

    /// Regenerate outputs that already exist.
    #[arg(long)]
    pub no_skip: bool,

    /// Convert at most this many scripts.
    #[arg(long)]
    pub max_files: Option<usize>,

    /// Synthesize at most this many tasks per script.
    #[arg(long)]
    pub max_conversations: Option<usize>,

    /// Assembly strategy: concat or transcode.
    #[arg(long)]
    pub strategy: Option<String>,

    /// Roles document (YAML).
    #[arg(long)]
    pub roles: Option<PathBuf>,

    /// Configuration file (TOML).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Attempts per TTS call.
    #[arg(long)]
    pub max_retries: Option<u32>,

    /// Check the TTS service and exit.
    #[arg(long)]
    pub test_connection: bool,
}

impl Cli {
    /// Folds command-line overrides into the loaded configuration.
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(roles) = &self.roles {
            config.conversion.roles_path = roles.clone();
        }
        if let Some(strategy) = &self.strategy {
            config.conversion.strategy = strategy.clone();
        }
        if let Some(max_retries) = self.max_retries {
            config.tts.max_retries = max_retries;
        }
    }
}

/// Loads the roles document and applies the process-wide voice defaults.
/// A missing roles file yields an empty registry.
pub fn load_registry(config: &Config) -> Result<VoiceRegistry, StartupError> {
    let path = &config.conversion.roles_path;
    let mut registry = if path.exists() {
        VoiceRegistry::load(path)?
    } else {
        warn!(path = %path.display(), "roles file not found, every character uses the default voice");
        VoiceRegistry::default()
    };

    if let Some(voice) = &config.tts.voice_type {
        registry = registry.with_default_voice(voice.clone());
    }
    if let Some(speed) = config.tts.speed_ratio {
        registry = registry.with_default_speed(speed);
    }
    Ok(registry)
}

/// Builds conversion options from configuration and flags.
pub fn convert_options(cli: &Cli, config: &Config) -> Result<ConvertOptions, StartupError> {
    if let Some(speed) = cli.speed {
        if !(speed.is_finite() && speed > 0.0) {
            return Err(ConfigError::Invalid {
                key: "--speed",
                value: speed.to_string(),
            }
            .into());
        }
    }

    Ok(ConvertOptions {
        voice_override: cli.voice.clone(),
        speed_override: cli.speed,
        output_format: config.tts.output_format.clone(),
        max_retries: config.tts.max_retries,
        max_chunk_chars: config.conversion.max_chunk_chars,
        throttle: config.throttle(),
        max_tasks: cli.max_conversations,
        strategy: config.strategy()?,
    })
}

fn single_output_path(cli: &Cli, input: &Path, extension: &str) -> PathBuf {
    match &cli.output {
        Some(output) => output.clone(),
        None => {
            let stem = input
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "output".to_string());
            Path::new(DEFAULT_OUTPUT_ROOT).join(format!("{}.{}", stem, extension))
        }
    }
}

/// Runs the command. Returns whether anything succeeded.
///
/// # Errors
///
/// Returns [`StartupError`] for configuration problems detected before any
/// work starts.
pub async fn run(cli: Cli, mut config: Config) -> Result<bool, StartupError> {
    cli.apply_to(&mut config);
    config.validate()?;

    let registry = load_registry(&config)?;
    let client = TtsClient::new(config.tts_config()?)
        .map_err(|e| StartupError::Client(e.to_string()))?;

    if cli.test_connection {
        let reachable = client.test_connection(registry.default_profile()).await;
        if reachable {
            info!("TTS service reachable");
        } else {
            error!("TTS service unreachable");
        }
        return Ok(reachable);
    }

    let options = convert_options(&cli, &config)?;
    let converter = Converter::new(client, registry, options);

    let Some(input) = cli.input.as_deref() else {
        error!("no input path given");
        return Ok(false);
    };

    if input.is_dir() {
        let output_root = cli
            .output
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_ROOT));
        let batch = BatchOptions {
            pattern: cli.pattern.clone(),
            skip_existing: !cli.no_skip,
            max_files: cli.max_files,
        };
        match convert_directory(&converter, input, &output_root, &batch).await {
            Ok(summary) => Ok(summary.any_succeeded()),
            Err(e) => {
                error!(error = %e, "batch conversion failed");
                Ok(false)
            }
        }
    } else if input.is_file() {
        let output = single_output_path(&cli, input, &converter.output_extension());
        match converter.convert_file(input, &output).await {
            Ok(report) => {
                info!(
                    output = %report.output.display(),
                    succeeded = report.tasks.succeeded,
                    failed = report.tasks.failed,
                    "conversion finished"
                );
                Ok(true)
            }
            Err(_) => Ok(false),
        }
    } else {
        error!(input = %input.display(), "input path does not exist");
        Ok(false)
    }
}
