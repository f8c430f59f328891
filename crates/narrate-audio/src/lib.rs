//! Audio assembly for the narrate pipeline.
//!
//! Synthesized segments are merged into one output file with one of two
//! strategies:
//!
//! - [`AssemblyStrategy::Concatenate`] appends the encoded bytes as-is.
//! - [`AssemblyStrategy::Transcode`] decodes every segment, inserts
//!   [`SEGMENT_GAP`] of silence after each, and writes a single WAV file.
//!
//! Output is staged inside a [`JobWorkspace`] and renamed into place, so a
//! partially written file never appears at the output path.

pub mod concat;
pub mod error;
pub mod resample;
pub mod segment;
pub mod transcode;
pub mod workspace;

pub use error::AudioError;
pub use segment::{AudioSegment, SegmentSource};
pub use transcode::SEGMENT_GAP;
pub use workspace::JobWorkspace;

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AssemblyStrategy {
    #[default]
    Concatenate,
    Transcode,
}

impl AssemblyStrategy {
    /// File extension of the assembled output for segments encoded as
    /// `format`.
    pub fn output_extension(&self, format: &str) -> String {
        match self {
            Self::Concatenate => format.to_string(),
            Self::Transcode => "wav".to_string(),
        }
    }

    /// Whether the assembled file ends up in a different format than the
    /// segments, i.e. transcoding anything that is not already WAV.
    pub fn overrides_format(&self, format: &str) -> bool {
        matches!(self, Self::Transcode) && !format.eq_ignore_ascii_case("wav")
    }
}

impl FromStr for AssemblyStrategy {
    type Err = AudioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "concat" | "concatenate" => Ok(Self::Concatenate),
            "transcode" => Ok(Self::Transcode),
            other => Err(AudioError::UnknownStrategy(other.to_string())),
        }
    }
}

impl fmt::Display for AssemblyStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Concatenate => write!(f, "concat"),
            Self::Transcode => write!(f, "transcode"),
        }
    }
}

/// Outcome of one assembly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblyReport {
    pub segments_used: usize,
    pub segments_skipped: usize,
    pub bytes_written: u64,
    /// Total playback time, known only when audio was decoded.
    pub duration: Option<Duration>,
}

/// Merges `segments` in order into `output`.
///
/// # Errors
///
/// Returns [`AudioError::NoSegments`] when no segment is usable, or an I/O,
/// decode or encode error. Nothing is written to `output` on error.
pub fn assemble(
    strategy: AssemblyStrategy,
    segments: &[AudioSegment],
    output: &Path,
    workspace: &JobWorkspace,
) -> Result<AssemblyReport, AudioError> {
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| AudioError::io(parent, e))?;
    }

    let staged = workspace.staging_path(output);
    let report = match strategy {
        AssemblyStrategy::Concatenate => concat::concatenate(segments, &staged)?,
        AssemblyStrategy::Transcode => transcode::transcode(segments, &staged, SEGMENT_GAP)?,
    };
    workspace.commit(&staged, output)?;

    info!(
        output = %output.display(),
        strategy = %strategy,
        segments = report.segments_used,
        skipped = report.segments_skipped,
        bytes = report.bytes_written,
        duration_secs = report.duration.map(|d| d.as_secs_f64()),
        "assembled audio"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_parses_cli_names() {
        assert_eq!("concat".parse::<AssemblyStrategy>().unwrap(), AssemblyStrategy::Concatenate);
        assert_eq!("Transcode".parse::<AssemblyStrategy>().unwrap(), AssemblyStrategy::Transcode);
        assert!("ffmpeg".parse::<AssemblyStrategy>().is_err());
        assert_eq!(AssemblyStrategy::default().to_string(), "concat");
    }

    #[test]
    fn transcode_always_writes_wav() {
        assert_eq!(AssemblyStrategy::Concatenate.output_extension("mp3"), "mp3");
        assert_eq!(AssemblyStrategy::Transcode.output_extension("mp3"), "wav");
    }

    #[test]
    fn only_transcode_of_non_wav_overrides_format() {
        assert!(AssemblyStrategy::Transcode.overrides_format("mp3"));
        assert!(AssemblyStrategy::Transcode.overrides_format("ogg_opus"));
        assert!(!AssemblyStrategy::Transcode.overrides_format("WAV"));
        assert!(!AssemblyStrategy::Concatenate.overrides_format("mp3"));
    }
}
