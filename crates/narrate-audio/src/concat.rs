//! Byte-level concatenation.
//!
//! Encoded segments are appended back to back with no re-encoding and no
//! metadata rewriting. MP3 players tolerate this; other formats may not.

use crate::error::AudioError;
use crate::segment::AudioSegment;
use crate::AssemblyReport;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::warn;

pub fn concatenate(segments: &[AudioSegment], destination: &Path) -> Result<AssemblyReport, AudioError> {
    let mut usable = Vec::with_capacity(segments.len());
    let mut skipped = 0;

    for segment in segments {
        match segment.load() {
            Ok(bytes) if bytes.is_empty() => {
                warn!(task_id = %segment.task_id, "skipping empty segment");
                skipped += 1;
            }
            Ok(bytes) => usable.push(bytes),
            Err(e) => {
                warn!(task_id = %segment.task_id, error = %e, "skipping unreadable segment");
                skipped += 1;
            }
        }
    }

    if usable.is_empty() {
        return Err(AudioError::NoSegments);
    }

    let file = File::create(destination).map_err(|e| AudioError::io(destination, e))?;
    let mut writer = BufWriter::new(file);
    let mut bytes_written = 0u64;
    for bytes in &usable {
        writer
            .write_all(bytes)
            .map_err(|e| AudioError::io(destination, e))?;
        bytes_written += bytes.len() as u64;
    }
    writer.flush().map_err(|e| AudioError::io(destination, e))?;

    Ok(AssemblyReport {
        segments_used: usable.len(),
        segments_skipped: skipped,
        bytes_written,
        duration: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_length_is_sum_of_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.mp3");
        let segments = vec![
            AudioSegment::in_memory("000_00", "mp3", vec![1; 10]),
            AudioSegment::in_memory("001_00", "mp3", vec![2; 25]),
            AudioSegment::in_memory("002_00", "mp3", vec![3; 7]),
        ];

        let report = concatenate(&segments, &out).unwrap();
        let written = std::fs::read(&out).unwrap();
        assert_eq!(written.len(), 42);
        assert_eq!(report.bytes_written, 42);
        assert_eq!(report.segments_used, 3);
        assert_eq!(&written[..10], &[1; 10]);
        assert_eq!(&written[35..], &[3; 7]);
    }

    #[test]
    fn empty_and_missing_segments_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.mp3");
        let segments = vec![
            AudioSegment::in_memory("000_00", "mp3", Vec::new()),
            AudioSegment::on_disk("001_00", "mp3", dir.path().join("missing.mp3")),
            AudioSegment::in_memory("002_00", "mp3", vec![9; 4]),
        ];

        let report = concatenate(&segments, &out).unwrap();
        assert_eq!(report.segments_used, 1);
        assert_eq!(report.segments_skipped, 2);
        assert_eq!(std::fs::read(&out).unwrap(), vec![9; 4]);
    }

    #[test]
    fn nothing_usable_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.mp3");
        let segments = vec![AudioSegment::in_memory("000_00", "mp3", Vec::new())];

        assert!(matches!(concatenate(&segments, &out), Err(AudioError::NoSegments)));
        assert!(matches!(concatenate(&[], &out), Err(AudioError::NoSegments)));
        assert!(!out.exists());
    }
}
