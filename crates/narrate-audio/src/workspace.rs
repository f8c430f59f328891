//! Per-job scratch directories.
//!
//! A [`JobWorkspace`] is created next to the job's output file so the final
//! rename stays on one filesystem. It is removed when dropped, whether the
//! job succeeded, failed or panicked.

use crate::error::AudioError;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, warn};

const WORKSPACE_PREFIX: &str = ".narrate-";

#[derive(Debug)]
pub struct JobWorkspace {
    dir: Option<TempDir>,
    path: PathBuf,
}

impl JobWorkspace {
    /// Creates a workspace in the directory that will hold `output`,
    /// creating that directory if needed.
    pub fn beside(output: &Path) -> Result<Self, AudioError> {
        let parent = match output.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&parent).map_err(|e| AudioError::io(&parent, e))?;

        let dir = tempfile::Builder::new()
            .prefix(WORKSPACE_PREFIX)
            .tempdir_in(&parent)
            .map_err(|e| AudioError::io(&parent, e))?;
        let path = dir.path().to_path_buf();
        debug!(workspace = %path.display(), "created job workspace");

        Ok(Self {
            dir: Some(dir),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Staging location for the assembled output before it is moved into
    /// place.
    pub fn staging_path(&self, output: &Path) -> PathBuf {
        let name = output
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "output".to_string());
        self.path.join(format!("staging-{}", name))
    }

    /// Moves a staged file to `output`.
    pub fn commit(&self, staged: &Path, output: &Path) -> Result<(), AudioError> {
        std::fs::rename(staged, output).map_err(|e| AudioError::io(output, e))
    }
}

impl Drop for JobWorkspace {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            if let Err(e) = dir.close() {
                warn!(workspace = %self.path.display(), error = %e, "failed to remove job workspace");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workspace_is_removed_on_drop() {
        let root = tempfile::tempdir().unwrap();
        let output = root.path().join("nested/story.mp3");

        let workspace = JobWorkspace::beside(&output).unwrap();
        let path = workspace.path().to_path_buf();
        assert!(path.is_dir());
        assert_eq!(path.parent().unwrap(), root.path().join("nested"));
        std::fs::write(path.join("000_00.mp3"), b"x").unwrap();

        drop(workspace);
        assert!(!path.exists());
    }

    #[test]
    fn commit_moves_staged_file_into_place() {
        let root = tempfile::tempdir().unwrap();
        let output = root.path().join("story.mp3");
        let workspace = JobWorkspace::beside(&output).unwrap();

        let staged = workspace.staging_path(&output);
        std::fs::write(&staged, b"audio").unwrap();
        workspace.commit(&staged, &output).unwrap();

        assert!(!staged.exists());
        assert_eq!(std::fs::read(&output).unwrap(), b"audio");
    }
}
