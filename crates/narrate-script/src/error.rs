//! Error types for script loading.

use std::path::PathBuf;

/// Errors that can occur while loading a script file.
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    /// The script file does not exist.
    #[error("script file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The script file exists but could not be read.
    #[error("failed to read script file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
