//! Script handling for the narrate pipeline.
//!
//! Turns a script file into an ordered list of synthesis tasks:
//!
//! 1. [`ScriptParser`] recognises dialogue and narration lines.
//! 2. The caller resolves each line's voice (see `narrate-voice`).
//! 3. [`prepare_tasks`] splits long lines with [`split_text`] and assigns
//!    zero-padded task ids.
//!
//! [`character_stats`] and [`estimate_minutes`] summarise a script before
//! synthesis starts.

pub mod chunker;
pub mod error;
pub mod parser;
pub mod tasks;

pub use chunker::{split_text, DEFAULT_MAX_CHUNK_CHARS};
pub use error::ScriptError;
pub use parser::{ScriptParser, FOOTER_PREFIX};
pub use tasks::{character_stats, estimate_minutes, prepare_tasks, CharacterStats};
