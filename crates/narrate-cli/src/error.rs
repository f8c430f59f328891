use narrate_audio::AudioError;
use narrate_script::ScriptError;
use std::path::PathBuf;
use thiserror::Error;

/// Why a single script conversion failed.
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error(transparent)]
    Script(#[from] ScriptError),

    #[error("no dialogue or narration found in {}", .0.display())]
    NoLines(PathBuf),

    #[error("all {failed} synthesis tasks failed")]
    NoAudio { failed: usize },

    #[error(transparent)]
    Audio(#[from] AudioError),

    #[error("input directory not found: {}", .0.display())]
    MissingDirectory(PathBuf),

    #[error("invalid file pattern {pattern:?}: {reason}")]
    Pattern { pattern: String, reason: String },
}

/// Errors that abort the whole run before any script is converted.
#[derive(Error, Debug)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),

    #[error(transparent)]
    Registry(#[from] narrate_voice::RegistryError),

    #[error("failed to build HTTP client: {0}")]
    Client(String),
}
