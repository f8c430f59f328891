//! Process configuration loading from file and environment variables.

use narrate_audio::AssemblyStrategy;
use narrate_voice::{TtsConfig, DEFAULT_CLUSTER, DEFAULT_TTS_ENDPOINT};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub tts: TtsSettings,

    #[serde(default)]
    pub conversion: ConversionSettings,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Remote TTS service settings.
#[derive(Clone, Deserialize)]
pub struct TtsSettings {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Application id. Required; usually supplied through `TTS_APP_ID`.
    #[serde(default)]
    pub app_id: Option<String>,

    /// Access token. Required; usually supplied through `TTS_TOKEN`.
    #[serde(default)]
    pub token: Option<String>,

    #[serde(default = "default_cluster")]
    pub cluster: String,

    /// Voice used for characters with no configured voice.
    #[serde(default)]
    pub voice_type: Option<String>,

    /// Speed used for characters with no configured voice.
    #[serde(default)]
    pub speed_ratio: Option<f32>,

    /// Audio encoding requested from the service for every segment.
    #[serde(default)]
    pub output_format: Option<String>,

    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

/// Conversion pipeline settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ConversionSettings {
    /// Path to the YAML roles document.
    #[serde(default = "default_roles_path")]
    pub roles_path: PathBuf,

    #[serde(default = "default_max_chunk_chars")]
    pub max_chunk_chars: usize,

    /// Pause between consecutive TTS calls, in milliseconds.
    #[serde(default = "default_throttle_ms")]
    pub throttle_ms: u64,

    /// `concat` or `transcode`.
    #[serde(default = "default_strategy")]
    pub strategy: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "narrate_voice=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub json: bool,
}

fn default_endpoint() -> String {
    DEFAULT_TTS_ENDPOINT.to_string()
}

fn default_cluster() -> String {
    DEFAULT_CLUSTER.to_string()
}

fn default_request_timeout_seconds() -> u64 {
    600
}

fn default_max_retries() -> u32 {
    3
}

fn default_roles_path() -> PathBuf {
    PathBuf::from("config/roles.yml")
}

fn default_max_chunk_chars() -> usize {
    narrate_script::DEFAULT_MAX_CHUNK_CHARS
}

fn default_throttle_ms() -> u64 {
    500
}

fn default_strategy() -> String {
    "concat".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TtsSettings {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            app_id: None,
            token: None,
            cluster: default_cluster(),
            voice_type: None,
            speed_ratio: None,
            output_format: None,
            request_timeout_seconds: default_request_timeout_seconds(),
            max_retries: default_max_retries(),
        }
    }
}

impl fmt::Debug for TtsSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TtsSettings")
            .field("endpoint", &self.endpoint)
            .field("app_id", &self.app_id)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("cluster", &self.cluster)
            .field("voice_type", &self.voice_type)
            .field("speed_ratio", &self.speed_ratio)
            .field("output_format", &self.output_format)
            .field("request_timeout_seconds", &self.request_timeout_seconds)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

impl Default for ConversionSettings {
    fn default() -> Self {
        Self {
            roles_path: default_roles_path(),
            max_chunk_chars: default_max_chunk_chars(),
            throttle_ms: default_throttle_ms(),
            strategy: default_strategy(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Required credentials are absent.
    #[error("missing required environment variables: {0}")]
    MissingCredentials(String),

    /// A setting has a value that cannot be used.
    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

impl Config {
    /// Builds the TTS client settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingCredentials`] naming every absent
    /// credential.
    pub fn tts_config(&self) -> Result<TtsConfig, ConfigError> {
        let present = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        let token = present(&self.tts.token);
        let app_id = present(&self.tts.app_id);

        let mut missing = Vec::new();
        if token.is_none() {
            missing.push("TTS_TOKEN");
        }
        if app_id.is_none() {
            missing.push("TTS_APP_ID");
        }
        let (Some(token), Some(app_id)) = (token, app_id) else {
            return Err(ConfigError::MissingCredentials(missing.join(", ")));
        };

        Ok(TtsConfig {
            endpoint: self.tts.endpoint.clone(),
            app_id,
            token,
            cluster: self.tts.cluster.clone(),
            request_timeout_seconds: self.tts.request_timeout_seconds,
            ..TtsConfig::default()
        })
    }

    pub fn strategy(&self) -> Result<AssemblyStrategy, ConfigError> {
        self.conversion
            .strategy
            .parse()
            .map_err(|_| ConfigError::Invalid {
                key: "conversion.strategy",
                value: self.conversion.strategy.clone(),
            })
    }

    pub fn throttle(&self) -> Duration {
        Duration::from_millis(self.conversion.throttle_ms)
    }

    /// Checks everything needed before any work starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.tts_config()?;
        self.strategy()?;
        if let Some(speed) = self.tts.speed_ratio {
            if !(speed.is_finite() && speed > 0.0) {
                return Err(ConfigError::Invalid {
                    key: "tts.speed_ratio",
                    value: speed.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Loads configuration from a TOML file, falling back to defaults, then
/// applies environment overrides.
///
/// Environment variable overrides:
/// - `TTS_TOKEN`, `TTS_APP_ID`, `TTS_CLUSTER`, `TTS_ENDPOINT`
/// - `TTS_VOICE_TYPE`, `TTS_SPEED_RATIO`, `OUTPUT_FORMAT`
/// - `NARRATE_ROLES_PATH` overrides `conversion.roles_path`
/// - `NARRATE_LOG_LEVEL` overrides `logging.level`
/// - `NARRATE_LOG_JSON` overrides `logging.json` (set to "true" to enable)
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed, or
/// if `TTS_SPEED_RATIO` is not a number.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    load_config_with(path, |key| std::env::var(key).ok())
}

/// [`load_config`] with an explicit environment lookup.
pub fn load_config_with<F>(path: Option<&Path>, env: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %p.display(), "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    if let Some(token) = env("TTS_TOKEN") {
        config.tts.token = Some(token);
    }
    if let Some(app_id) = env("TTS_APP_ID") {
        config.tts.app_id = Some(app_id);
    }
    if let Some(cluster) = env("TTS_CLUSTER") {
        config.tts.cluster = cluster;
    }
    if let Some(endpoint) = env("TTS_ENDPOINT") {
        config.tts.endpoint = endpoint;
    }
    if let Some(voice) = env("TTS_VOICE_TYPE") {
        config.tts.voice_type = Some(voice);
    }
    if let Some(speed) = env("TTS_SPEED_RATIO") {
        let parsed = speed.trim().parse().map_err(|_| ConfigError::Invalid {
            key: "TTS_SPEED_RATIO",
            value: speed.clone(),
        })?;
        config.tts.speed_ratio = Some(parsed);
    }
    if let Some(format) = env("OUTPUT_FORMAT") {
        config.tts.output_format = Some(format);
    }
    if let Some(roles) = env("NARRATE_ROLES_PATH") {
        config.conversion.roles_path = PathBuf::from(roles);
    }
    if let Some(level) = env("NARRATE_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(json) = env("NARRATE_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }

    Ok(config)
}
