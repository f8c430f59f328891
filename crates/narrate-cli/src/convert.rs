//! Single-script conversion.
//!
//! A job walks `Idle → Parsing → Resolving → Synthesizing → Assembling` and
//! ends in `Done` or `Failed`. Synthesis is strictly sequential: one TTS call
//! in flight at a time, with a fixed pause between calls.

use crate::error::ConvertError;
use narrate_audio::{assemble, AssemblyReport, AssemblyStrategy, AudioSegment, JobWorkspace};
use narrate_script::{character_stats, estimate_minutes, prepare_tasks, ScriptParser};
use narrate_types::{ConversionResult, DialogueLine, JobState, ScriptLine, VoiceProfile};
use narrate_voice::{HttpTransport, SpeechTransport, TtsClient, VoiceRegistry};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info, warn};

/// Knobs for one conversion run.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Replaces every resolved voice id.
    pub voice_override: Option<String>,
    /// Replaces every resolved speed.
    pub speed_override: Option<f32>,
    /// Encoding requested for every segment. Defaults to the registry's.
    pub output_format: Option<String>,
    pub max_retries: u32,
    pub max_chunk_chars: usize,
    /// Pause between consecutive TTS calls.
    pub throttle: Duration,
    /// Process only the first N tasks of each script.
    pub max_tasks: Option<usize>,
    pub strategy: AssemblyStrategy,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            voice_override: None,
            speed_override: None,
            output_format: None,
            max_retries: 3,
            max_chunk_chars: narrate_script::DEFAULT_MAX_CHUNK_CHARS,
            throttle: Duration::from_millis(500),
            max_tasks: None,
            strategy: AssemblyStrategy::default(),
        }
    }
}

/// Outcome of a successful conversion.
#[derive(Debug, Clone)]
pub struct FileReport {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Per-task counters. `failed_ids` lists tasks missing from the output.
    pub tasks: ConversionResult,
    pub assembly: AssemblyReport,
}

/// Tracks and logs the state of one job.
#[derive(Debug)]
struct Job<'a> {
    input: &'a Path,
    state: JobState,
}

impl<'a> Job<'a> {
    fn new(input: &'a Path) -> Self {
        Self {
            input,
            state: JobState::Idle,
        }
    }

    fn advance(&mut self, next: JobState) {
        info!(
            input = %self.input.display(),
            from = %self.state,
            to = %next,
            "job state changed"
        );
        self.state = next;
    }
}

/// Runs the parse → resolve → synthesize → assemble pipeline.
pub struct Converter<T = HttpTransport> {
    client: TtsClient<T>,
    registry: VoiceRegistry,
    parser: ScriptParser,
    options: ConvertOptions,
}

impl<T: SpeechTransport> Converter<T> {
    pub fn new(client: TtsClient<T>, registry: VoiceRegistry, options: ConvertOptions) -> Self {
        Self {
            client,
            registry,
            parser: ScriptParser::new(),
            options,
        }
    }

    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    pub fn client(&self) -> &TtsClient<T> {
        &self.client
    }

    /// Encoding requested from the service.
    pub fn output_format(&self) -> &str {
        self.options
            .output_format
            .as_deref()
            .unwrap_or(&self.registry.default_profile().output_format)
    }

    /// Extension of the files this converter writes.
    pub fn output_extension(&self) -> String {
        let format = self.output_format();
        if self.options.strategy.overrides_format(format) {
            warn!(
                requested = format,
                written = "wav",
                "transcode strategy writes WAV, ignoring requested output format"
            );
        }
        self.options.strategy.output_extension(format)
    }

    fn resolve_profile(&self, character: &str) -> VoiceProfile {
        let mut profile = self.registry.lookup(character).with_overrides(
            self.options.voice_override.as_deref(),
            self.options.speed_override,
        );
        if let Some(format) = &self.options.output_format {
            profile.output_format = format.clone();
        }
        profile
    }

    fn resolve(&self, lines: Vec<ScriptLine>) -> Vec<DialogueLine> {
        lines
            .into_iter()
            .map(|line| DialogueLine {
                voice_profile: self.resolve_profile(&line.character),
                character: line.character,
                text: line.text,
                source_line_number: line.line_number,
            })
            .collect()
    }

    /// Converts one script file into one audio file at `output`.
    ///
    /// Failed tasks are logged and left out of the output; the conversion
    /// fails only if the script has no lines or no task produced audio.
    pub async fn convert_file(
        &self,
        input: &Path,
        output: &Path,
    ) -> Result<FileReport, ConvertError> {
        let mut job = Job::new(input);
        match self.run(&mut job, output).await {
            Ok(report) => {
                job.advance(JobState::Done);
                Ok(report)
            }
            Err(e) => {
                error!(input = %input.display(), error = %e, "conversion failed");
                job.advance(JobState::Failed);
                Err(e)
            }
        }
    }

    async fn run(&self, job: &mut Job<'_>, output: &Path) -> Result<FileReport, ConvertError> {
        let input = job.input;

        job.advance(JobState::Parsing);
        let lines = self.parser.parse_file(input)?;
        if lines.is_empty() {
            warn!(input = %input.display(), "no recognisable lines in script");
            return Err(ConvertError::NoLines(input.to_path_buf()));
        }

        job.advance(JobState::Resolving);
        let resolved = self.resolve(lines);
        for (character, stats) in character_stats(&resolved) {
            info!(
                character = %character,
                lines = stats.line_count,
                chars = stats.total_chars,
                "character summary"
            );
        }
        info!(
            estimated_minutes = %format!("{:.1}", estimate_minutes(&resolved)),
            "estimated narration length"
        );

        let mut tasks = prepare_tasks(&resolved, self.options.max_chunk_chars);
        if let Some(max) = self.options.max_tasks {
            if tasks.len() > max {
                info!(total = tasks.len(), limit = max, "limiting tasks");
                tasks.truncate(max);
            }
        }

        let workspace = JobWorkspace::beside(output)?;

        job.advance(JobState::Synthesizing);
        let total = tasks.len();
        let mut result = ConversionResult::default();
        let mut segments = Vec::with_capacity(total);

        for (index, task) in tasks.iter().enumerate() {
            if index > 0 && !self.options.throttle.is_zero() {
                tokio::time::sleep(self.options.throttle).await;
            }
            info!(
                task_id = %task.task_id,
                character = %task.character,
                progress = %format!("{}/{}", index + 1, total),
                "synthesizing"
            );

            match self
                .client
                .synthesize(&task.text_chunk, &task.voice_profile, self.options.max_retries)
                .await
            {
                Some(audio) => {
                    let segment = AudioSegment::in_memory(
                        task.task_id.clone(),
                        task.voice_profile.output_format.clone(),
                        audio,
                    )
                    .spill_to(workspace.path())?;
                    segments.push(segment);
                    result.record_success();
                }
                None => {
                    error!(
                        task_id = %task.task_id,
                        line = task.line_number,
                        "task failed, leaving it out of the output"
                    );
                    result.record_failure(task.task_id.clone());
                }
            }
        }

        info!(
            succeeded = result.succeeded,
            failed = result.failed,
            "synthesis finished"
        );
        if segments.is_empty() {
            return Err(ConvertError::NoAudio {
                failed: result.failed,
            });
        }

        job.advance(JobState::Assembling);
        let assembly = assemble(self.options.strategy, &segments, output, &workspace)?;

        Ok(FileReport {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            tasks: result,
            assembly,
        })
    }
}
