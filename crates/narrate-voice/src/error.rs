use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading the voice registry.
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("failed to read roles file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse roles document: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Why a single synthesis attempt did not produce audio.
///
/// Retryable failures are retried within the attempt budget; terminal
/// failures end the call immediately.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SynthesisError {
    #[error("retryable TTS failure: {0}")]
    Retryable(String),

    #[error("terminal TTS failure: {0}")]
    Terminal(String),
}

impl SynthesisError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Retryable(_))
    }
}
