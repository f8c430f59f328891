//! Line parser for narrated scripts.
//!
//! Scripts are Markdown-ish UTF-8 text. Each non-blank line is one of:
//!
//! | Line | Effect |
//! |------|--------|
//! | `# ...` | comment, skipped |
//! | `> ...` | block quote (metadata), skipped |
//! | `---...` | end of the script body, parsing stops |
//! | `*该小节涉及的角色...` | character footer, parsing stops |
//! | `（角色）：台词` | dialogue for `角色` |
//! | anything containing a CJK ideograph | narration |
//!
//! Everything else is ignored.

use crate::error::ScriptError;
use narrate_types::{LineKind, ScriptLine, NARRATOR};
use regex::Regex;
use std::path::Path;
use tracing::{debug, info};

/// Prefix of the trailing "characters in this section" footer.
pub const FOOTER_PREFIX: &str = "*该小节涉及的角色";

const COMMENT_MARKER: &str = "#";
const QUOTE_MARKER: &str = ">";
const RULE_MARKER: &str = "---";

/// Parses script text into ordered [`ScriptLine`]s.
#[derive(Debug, Clone)]
pub struct ScriptParser {
    dialogue: Regex,
    ideograph: Regex,
}

impl ScriptParser {
    pub fn new() -> Self {
        Self {
            dialogue: Regex::new(r"^（([^）]+)）：(.+)$").expect("dialogue pattern is valid"),
            ideograph: Regex::new(r"[\u{4e00}-\u{9fff}]").expect("ideograph pattern is valid"),
        }
    }

    /// Parses a whole script document.
    ///
    /// Returns an empty vector when nothing recognisable is found; callers
    /// decide whether that is worth a warning.
    pub fn parse(&self, content: &str) -> Vec<ScriptLine> {
        let mut lines = Vec::new();

        for (index, raw) in content.lines().enumerate() {
            let line_number = index + 1;
            let line = raw.trim();

            if line.is_empty() || line.starts_with(COMMENT_MARKER) || line.starts_with(QUOTE_MARKER)
            {
                continue;
            }

            if line.starts_with(RULE_MARKER) || line.starts_with(FOOTER_PREFIX) {
                debug!(line_number, "reached end of script body");
                break;
            }

            if let Some((character, text)) = self.dialogue_parts(line) {
                lines.push(ScriptLine {
                    kind: LineKind::Dialogue,
                    character: character.to_string(),
                    text: text.to_string(),
                    line_number,
                });
                continue;
            }

            if self.ideograph.is_match(line) {
                lines.push(ScriptLine {
                    kind: LineKind::Narration,
                    character: NARRATOR.to_string(),
                    text: line.to_string(),
                    line_number,
                });
            }
        }

        lines
    }

    /// Speaker and text of a dialogue line. Lines whose speaker or text is
    /// blank are not dialogue and fall through to the narration rule.
    fn dialogue_parts<'a>(&self, line: &'a str) -> Option<(&'a str, &'a str)> {
        let caps = self.dialogue.captures(line)?;
        let character = caps.get(1)?.as_str().trim();
        let text = caps.get(2)?.as_str().trim();
        if character.is_empty() || text.is_empty() {
            return None;
        }
        Some((character, text))
    }

    /// Reads and parses a script file.
    ///
    /// # Errors
    ///
    /// Returns [`ScriptError::NotFound`] if the file does not exist and
    /// [`ScriptError::Read`] if it cannot be read as UTF-8 text.
    pub fn parse_file(&self, path: &Path) -> Result<Vec<ScriptLine>, ScriptError> {
        let content = std::fs::read_to_string(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                ScriptError::NotFound(path.to_path_buf())
            } else {
                ScriptError::Read {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;

        let lines = self.parse(&content);
        let dialogue = lines
            .iter()
            .filter(|l| l.kind == LineKind::Dialogue)
            .count();
        info!(
            path = %path.display(),
            dialogue,
            narration = lines.len() - dialogue,
            "parsed script"
        );
        Ok(lines)
    }
}

impl Default for ScriptParser {
    fn default() -> Self {
        Self::new()
    }
}
