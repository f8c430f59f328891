//! Script-to-audio conversion for the `narrate` binary.
//!
//! Wires the script parser, voice registry, TTS client and audio assembler
//! into single-file and batch conversions, and owns process configuration
//! and logging setup.

pub mod batch;
pub mod cli;
pub mod config;
pub mod convert;
pub mod error;
pub mod logging;

pub use batch::{convert_directory, BatchOptions, BatchSummary, FileOutcome, FileStatus};
pub use cli::Cli;
pub use config::{load_config, Config, ConfigError};
pub use convert::{ConvertOptions, Converter, FileReport};
pub use error::{ConvertError, StartupError};
