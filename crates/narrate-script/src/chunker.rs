//! Sentence-boundary text chunking.
//!
//! The TTS service limits the length of a single request, so long lines are
//! split on the CJK sentence terminators `。！？` and re-packed into chunks no
//! longer than the limit. Terminators are normalised: every sentence is
//! rejoined with `。` and the final `。` of each chunk is dropped.

/// Default per-request character limit.
pub const DEFAULT_MAX_CHUNK_CHARS: usize = 500;

const SENTENCE_END: char = '。';

fn is_terminator(c: char) -> bool {
    matches!(c, '。' | '！' | '？')
}

/// Splits `text` into chunks of at most `max_chars` characters.
///
/// Text that already fits is returned unchanged as a single chunk. A
/// sentence longer than `max_chars` on its own is cut at character
/// boundaries. A `max_chars` of zero is treated as one.
pub fn split_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    if text.chars().count() <= max_chars {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for sentence in sentences(text, max_chars) {
        let sentence_len = sentence.chars().count();
        if current_len + sentence_len <= max_chars {
            current.push_str(&sentence);
            current.push(SENTENCE_END);
            current_len += sentence_len + 1;
        } else {
            if !current.is_empty() {
                chunks.push(finish(&current));
            }
            current = sentence;
            current.push(SENTENCE_END);
            current_len = sentence_len + 1;
        }
    }

    if !current.is_empty() {
        chunks.push(finish(&current));
    }

    chunks
}

/// Yields trimmed, non-empty sentences, with any sentence longer than
/// `max_chars` cut into `max_chars`-sized pieces.
fn sentences(text: &str, max_chars: usize) -> impl Iterator<Item = String> + '_ {
    text.split(is_terminator)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .flat_map(move |sentence| {
            let chars: Vec<char> = sentence.chars().collect();
            chars
                .chunks(max_chars)
                .map(|piece| piece.iter().collect::<String>())
                .collect::<Vec<_>>()
        })
}

fn finish(chunk: &str) -> String {
    chunk.trim_end_matches(SENTENCE_END).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_a_single_unchanged_chunk() {
        let text = "你好！今天天气很好。";
        assert_eq!(split_text(text, 500), vec![text.to_string()]);
    }

    #[test]
    fn text_exactly_at_limit_is_not_split() {
        let text = "一二三四五";
        assert_eq!(split_text(text, 5), vec![text.to_string()]);
    }

    #[test]
    fn long_text_is_packed_greedily() {
        // Each sentence is 4 chars, 5 with its terminator.
        let text = "一二三四。五六七八！九十一二？三四五六。";
        let chunks = split_text(text, 10);
        assert_eq!(chunks, vec!["一二三四。五六七八", "九十一二。三四五六"]);
    }

    #[test]
    fn chunks_respect_the_limit() {
        let sentence = "这是一个比较长的句子";
        let text = std::iter::repeat(format!("{sentence}。"))
            .take(40)
            .collect::<String>();
        for chunk in split_text(&text, 50) {
            assert!(chunk.chars().count() <= 50, "chunk too long: {chunk}");
        }
    }

    #[test]
    fn chunks_reconstruct_sentence_sequence() {
        let text = "小猪起床了。它看见太阳！太阳为什么这么红？妈妈笑了。大家一起去散步。";
        let chunks = split_text(text, 12);
        assert!(chunks.len() > 1);

        let rejoined: Vec<String> = chunks
            .iter()
            .flat_map(|c| c.split(is_terminator).map(str::to_string))
            .filter(|s| !s.is_empty())
            .collect();
        let original: Vec<String> = text
            .split(is_terminator)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        assert_eq!(rejoined, original);
    }

    #[test]
    fn oversized_sentence_is_cut_at_char_boundaries() {
        let text = "一二三四五六七八九十";
        let chunks = split_text(text, 4);
        assert_eq!(chunks, vec!["一二三四", "五六七八", "九十"]);
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn zero_limit_does_not_loop_forever() {
        let chunks = split_text("一二。三", 0);
        assert_eq!(chunks.concat(), "一二三");
    }
}
