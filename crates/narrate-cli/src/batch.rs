//! Directory batch conversion.
//!
//! Every script in a directory matching a glob pattern is converted in
//! sorted name order. Output for `<dir>/<stem>.md` goes to
//! `<output_root>/<dir name>/<stem>.<ext>`. One file's failure never stops
//! the batch.

use crate::convert::{Converter, FileReport};
use crate::error::ConvertError;
use narrate_types::ConversionResult;
use narrate_voice::SpeechTransport;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// File names never treated as scripts.
pub const EXCLUDED_FILES: [&str; 1] = ["README.md"];

#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub pattern: String,
    /// Leave scripts whose output already exists untouched.
    pub skip_existing: bool,
    pub max_files: Option<usize>,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            pattern: "*.md".to_string(),
            skip_existing: true,
            max_files: None,
        }
    }
}

#[derive(Debug)]
pub enum FileStatus {
    Converted(FileReport),
    Skipped,
    Failed(String),
}

#[derive(Debug)]
pub struct FileOutcome {
    pub input: PathBuf,
    pub output: PathBuf,
    pub status: FileStatus,
}

#[derive(Debug, Default)]
pub struct BatchSummary {
    /// File-level counters; `failed_ids` holds failed file names.
    pub files: ConversionResult,
    pub outcomes: Vec<FileOutcome>,
}

impl BatchSummary {
    pub fn any_succeeded(&self) -> bool {
        self.files.succeeded > 0
    }
}

/// Lists scripts in `dir` matching `pattern`, sorted by path.
pub fn discover_scripts(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>, ConvertError> {
    let full_pattern = format!(
        "{}/{}",
        glob::Pattern::escape(&dir.to_string_lossy()),
        pattern
    );
    let entries = glob::glob(&full_pattern).map_err(|e| ConvertError::Pattern {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })?;

    let mut scripts: Vec<PathBuf> = entries
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(e) => {
                warn!(error = %e, "unreadable directory entry");
                None
            }
        })
        .filter(|path| path.is_file())
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .map_or(true, |name| !EXCLUDED_FILES.contains(&name))
        })
        .collect();
    scripts.sort();
    Ok(scripts)
}

/// Output path for `script` found in `input_dir`.
pub fn batch_output_path(
    input_dir: &Path,
    output_root: &Path,
    script: &Path,
    extension: &str,
) -> PathBuf {
    let dir_name = input_dir
        .file_name()
        .map(|n| n.to_os_string())
        .or_else(|| {
            input_dir
                .canonicalize()
                .ok()
                .and_then(|p| p.file_name().map(|n| n.to_os_string()))
        });
    let stem = script
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());

    let mut path = output_root.to_path_buf();
    if let Some(dir_name) = dir_name {
        path.push(dir_name);
    }
    path.push(format!("{}.{}", stem, extension));
    path
}

/// Converts every matching script in `input_dir`.
///
/// # Errors
///
/// Fails only when the directory is missing or the pattern is invalid;
/// per-file failures are recorded in the summary.
pub async fn convert_directory<T: SpeechTransport>(
    converter: &Converter<T>,
    input_dir: &Path,
    output_root: &Path,
    options: &BatchOptions,
) -> Result<BatchSummary, ConvertError> {
    if !input_dir.is_dir() {
        return Err(ConvertError::MissingDirectory(input_dir.to_path_buf()));
    }

    let mut scripts = discover_scripts(input_dir, &options.pattern)?;
    info!(
        dir = %input_dir.display(),
        pattern = %options.pattern,
        found = scripts.len(),
        "discovered scripts"
    );
    if scripts.is_empty() {
        warn!(dir = %input_dir.display(), "no scripts matched");
    }
    if let Some(max) = options.max_files {
        if scripts.len() > max {
            info!(limit = max, "limiting files");
            scripts.truncate(max);
        }
    }

    let extension = converter.output_extension();
    let total = scripts.len();
    let mut summary = BatchSummary::default();

    for (index, script) in scripts.into_iter().enumerate() {
        let output = batch_output_path(input_dir, output_root, &script, &extension);
        info!(
            progress = %format!("{}/{}", index + 1, total),
            input = %script.display(),
            output = %output.display(),
            "processing script"
        );

        if options.skip_existing && output.exists() {
            info!(output = %output.display(), "output exists, skipping");
            summary.files.record_skip();
            summary.outcomes.push(FileOutcome {
                input: script,
                output,
                status: FileStatus::Skipped,
            });
            continue;
        }

        let status = match converter.convert_file(&script, &output).await {
            Ok(report) => {
                summary.files.record_success();
                FileStatus::Converted(report)
            }
            Err(e) => {
                error!(input = %script.display(), error = %e, "script failed");
                let name = script
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| script.display().to_string());
                summary.files.record_failure(name);
                FileStatus::Failed(e.to_string())
            }
        };
        summary.outcomes.push(FileOutcome {
            input: script,
            output,
            status,
        });

        info!(
            processed = summary.files.processed,
            succeeded = summary.files.succeeded,
            failed = summary.files.failed,
            skipped = summary.files.skipped,
            "batch progress"
        );
    }

    info!(
        total,
        processed = summary.files.processed,
        succeeded = summary.files.succeeded,
        failed = summary.files.failed,
        skipped = summary.files.skipped,
        "batch finished"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_path_uses_directory_name_and_stem() {
        let path = batch_output_path(
            Path::new("data/input/story-02"),
            Path::new("out"),
            Path::new("data/input/story-02/chapter.01.md"),
            "mp3",
        );
        assert_eq!(path, PathBuf::from("out/story-02/chapter.01.mp3"));
    }

    #[test]
    fn discovery_is_sorted_and_skips_readme() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["02.md", "01.md", "README.md", "notes.txt", "10.md"] {
            std::fs::write(dir.path().join(name), "（小猪）：你好").unwrap();
        }
        std::fs::create_dir(dir.path().join("sub.md")).unwrap();

        let scripts = discover_scripts(dir.path(), "*.md").unwrap();
        let names: Vec<_> = scripts
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["01.md", "02.md", "10.md"]);
    }

    #[test]
    fn invalid_pattern_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            discover_scripts(dir.path(), "[*.md"),
            Err(ConvertError::Pattern { .. })
        ));
    }
}
