//! Shared types for the narrate workspace.
//!
//! This crate holds the data model passed between the pipeline stages:
//! parsed script lines, voice-resolved dialogue lines, synthesis tasks, and
//! the per-job conversion counters. Every other crate depends on it; it
//! depends on nothing in the workspace.

use serde::{Deserialize, Serialize};
use std::fmt;

mod voice;
pub use voice::{VoiceProfile, DEFAULT_OUTPUT_FORMAT, DEFAULT_VOICE_ID};

/// Speaker assigned to narration lines.
pub const NARRATOR: &str = "旁白";

/// Whether a script line is attributed dialogue or narration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineKind {
    /// A `（character）：text` line.
    Dialogue,
    /// Unattributed descriptive text, spoken by [`NARRATOR`].
    Narration,
}

/// A line recognised by the script parser, before voice resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptLine {
    pub kind: LineKind,
    pub character: String,
    pub text: String,
    /// 1-based line number in the source file.
    pub line_number: usize,
}

/// A script line with its voice profile resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueLine {
    pub character: String,
    pub text: String,
    pub source_line_number: usize,
    pub voice_profile: VoiceProfile,
}

/// One synthesis request: a chunk of a dialogue line.
///
/// Tasks are ordered by `task_id`; concatenating their audio in that order
/// reproduces the script order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TtsTask {
    pub task_id: String,
    pub character: String,
    pub text_chunk: String,
    pub voice_profile: VoiceProfile,
    pub line_number: usize,
    pub chunk_index: usize,
    pub total_chunks: usize,
}

/// Formats the task id for chunk `chunk_index` of line `line_index`.
///
/// Indices are zero-padded so lexicographic order matches script order for
/// scripts of up to 1000 lines with up to 100 chunks each.
pub fn task_id(line_index: usize, chunk_index: usize) -> String {
    format!("{line_index:03}_{chunk_index:02}")
}

/// Stage of a single conversion job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Idle,
    Parsing,
    Resolving,
    Synthesizing,
    Assembling,
    Done,
    Failed,
}

impl JobState {
    /// Returns the lowercase label used in log fields.
    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Parsing => "parsing",
            Self::Resolving => "resolving",
            Self::Synthesizing => "synthesizing",
            Self::Assembling => "assembling",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    /// Whether the job has finished, successfully or not.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Aggregate counters for a conversion job or a batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionResult {
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    /// Ids of the tasks (or files, in batch mode) that failed.
    pub failed_ids: Vec<String>,
}

impl ConversionResult {
    /// Records a successful unit of work.
    pub fn record_success(&mut self) {
        self.processed += 1;
        self.succeeded += 1;
    }

    /// Records a failed unit of work under the given id.
    pub fn record_failure(&mut self, id: impl Into<String>) {
        self.processed += 1;
        self.failed += 1;
        self.failed_ids.push(id.into());
    }

    /// Records a unit of work that was not attempted.
    pub fn record_skip(&mut self) {
        self.skipped += 1;
    }

    /// Adds another result's counters into this one.
    pub fn merge(&mut self, other: &ConversionResult) {
        self.processed += other.processed;
        self.succeeded += other.succeeded;
        self.failed += other.failed;
        self.skipped += other.skipped;
        self.failed_ids.extend(other.failed_ids.iter().cloned());
    }
}
