use crate::error::AudioError;
use std::path::{Path, PathBuf};

/// Where a segment's encoded audio lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentSource {
    Memory(Vec<u8>),
    File(PathBuf),
}

/// Encoded audio produced for one synthesis task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioSegment {
    pub task_id: String,
    /// Encoding reported to the service, e.g. `mp3`. Used as a decode hint.
    pub format: String,
    pub source: SegmentSource,
}

impl AudioSegment {
    pub fn in_memory(task_id: impl Into<String>, format: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            task_id: task_id.into(),
            format: format.into(),
            source: SegmentSource::Memory(bytes),
        }
    }

    pub fn on_disk(task_id: impl Into<String>, format: impl Into<String>, path: PathBuf) -> Self {
        Self {
            task_id: task_id.into(),
            format: format.into(),
            source: SegmentSource::File(path),
        }
    }

    /// Writes in-memory audio to `<dir>/<task_id>.<format>` and returns the
    /// file-backed segment. File-backed segments are returned unchanged.
    pub fn spill_to(self, dir: &Path) -> Result<Self, AudioError> {
        match self.source {
            SegmentSource::Memory(bytes) => {
                let path = dir.join(format!("{}.{}", self.task_id, self.format));
                std::fs::write(&path, &bytes).map_err(|e| AudioError::io(&path, e))?;
                Ok(Self {
                    task_id: self.task_id,
                    format: self.format,
                    source: SegmentSource::File(path),
                })
            }
            SegmentSource::File(_) => Ok(self),
        }
    }

    /// Reads the encoded bytes.
    pub fn load(&self) -> Result<Vec<u8>, AudioError> {
        match &self.source {
            SegmentSource::Memory(bytes) => Ok(bytes.clone()),
            SegmentSource::File(path) => std::fs::read(path).map_err(|e| AudioError::io(path, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spill_writes_named_file() {
        let dir = tempfile::tempdir().unwrap();
        let segment = AudioSegment::in_memory("003_01", "mp3", b"abc".to_vec())
            .spill_to(dir.path())
            .unwrap();

        let expected = dir.path().join("003_01.mp3");
        assert_eq!(segment.source, SegmentSource::File(expected.clone()));
        assert_eq!(std::fs::read(expected).unwrap(), b"abc");
        assert_eq!(segment.load().unwrap(), b"abc");
    }

    #[test]
    fn missing_file_fails_to_load() {
        let segment = AudioSegment::on_disk("000_00", "mp3", PathBuf::from("/nonexistent/x.mp3"));
        assert!(matches!(segment.load(), Err(AudioError::Io { .. })));
    }
}
