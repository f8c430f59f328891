use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AudioError {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no usable audio segments to assemble")]
    NoSegments,

    #[error("failed to decode segment {task_id}: {reason}")]
    Decode { task_id: String, reason: String },

    #[error("failed to resample segment {task_id}: {reason}")]
    Resample { task_id: String, reason: String },

    #[error("failed to encode WAV output: {0}")]
    Encode(#[from] hound::Error),

    #[error("unknown assembly strategy: {0}")]
    UnknownStrategy(String),
}

impl AudioError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
