//! Task preparation and script statistics.

use crate::chunker::split_text;
use narrate_types::{task_id, DialogueLine, TtsTask};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::info;

/// Reading speed used for duration estimates, in characters per minute.
pub const CHARS_PER_MINUTE: f64 = 200.0;

/// Expands resolved lines into synthesis tasks, one per chunk.
///
/// Task ids are `{line_index:03}_{chunk_index:02}`, so sorting by id keeps
/// script order.
pub fn prepare_tasks(lines: &[DialogueLine], max_chunk_chars: usize) -> Vec<TtsTask> {
    let mut tasks = Vec::new();

    for (line_index, line) in lines.iter().enumerate() {
        let chunks = split_text(&line.text, max_chunk_chars);
        let total_chunks = chunks.len();

        for (chunk_index, chunk) in chunks.into_iter().enumerate() {
            tasks.push(TtsTask {
                task_id: task_id(line_index, chunk_index),
                character: line.character.clone(),
                text_chunk: chunk,
                voice_profile: line.voice_profile.clone(),
                line_number: line.source_line_number,
                chunk_index,
                total_chunks,
            });
        }
    }

    info!(lines = lines.len(), tasks = tasks.len(), "prepared synthesis tasks");
    tasks
}

/// Per-character line and character counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CharacterStats {
    pub line_count: usize,
    pub total_chars: usize,
}

/// Counts lines and characters per speaker, keyed by speaker name.
pub fn character_stats(lines: &[DialogueLine]) -> BTreeMap<String, CharacterStats> {
    let mut stats: BTreeMap<String, CharacterStats> = BTreeMap::new();
    for line in lines {
        let entry = stats.entry(line.character.clone()).or_default();
        entry.line_count += 1;
        entry.total_chars += line.text.chars().count();
    }
    stats
}

/// Estimates spoken duration in minutes from the total character count.
pub fn estimate_minutes(lines: &[DialogueLine]) -> f64 {
    let total: usize = lines.iter().map(|l| l.text.chars().count()).sum();
    total as f64 / CHARS_PER_MINUTE
}

#[cfg(test)]
mod tests {
    use super::*;
    use narrate_types::VoiceProfile;

    fn line(character: &str, text: &str, source_line_number: usize) -> DialogueLine {
        DialogueLine {
            character: character.to_string(),
            text: text.to_string(),
            source_line_number,
            voice_profile: VoiceProfile::default(),
        }
    }

    #[test]
    fn one_task_per_short_line() {
        let lines = vec![line("小猪", "你好！", 1), line("妈妈", "早上好。", 2)];
        let tasks = prepare_tasks(&lines, 500);
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].task_id, "000_00");
        assert_eq!(tasks[1].task_id, "001_00");
        assert_eq!(tasks[1].character, "妈妈");
        assert_eq!(tasks[1].line_number, 2);
        assert_eq!(tasks[1].total_chunks, 1);
    }

    #[test]
    fn long_lines_fan_out_into_ordered_chunks() {
        let lines = vec![
            line("小猪", "一二三四。五六七八。九十一二。", 3),
            line("妈妈", "好。", 4),
        ];
        let tasks = prepare_tasks(&lines, 5);
        let ids: Vec<&str> = tasks.iter().map(|t| t.task_id.as_str()).collect();
        assert_eq!(ids, vec!["000_00", "000_01", "000_02", "001_00"]);
        assert!(tasks[..3].iter().all(|t| t.total_chunks == 3));
        assert_eq!(tasks[2].chunk_index, 2);

        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(sorted, ids);
    }

    #[test]
    fn stats_group_by_character() {
        let lines = vec![
            line("小猪", "你好！", 1),
            line("妈妈", "早上好。", 2),
            line("小猪", "我饿了。", 3),
        ];
        let stats = character_stats(&lines);
        assert_eq!(stats.len(), 2);
        assert_eq!(stats["小猪"].line_count, 2);
        assert_eq!(stats["小猪"].total_chars, 7);
        assert_eq!(stats["妈妈"].line_count, 1);
    }

    #[test]
    fn estimate_uses_characters_per_minute() {
        let text: String = std::iter::repeat('字').take(400).collect();
        let lines = vec![line("旁白", &text, 1)];
        assert!((estimate_minutes(&lines) - 2.0).abs() < f64::EPSILON);
        assert_eq!(estimate_minutes(&[]), 0.0);
    }
}
