//! Post-recognition transcript filters.
//!
//! ASR models hallucinate under music and silence, echo their own prompt
//! back, and emit metadata tags; OCR picks up watermark digit runs. These
//! filters run on every engine result before it reaches the gate. A
//! rejected transcript becomes the empty string, which the pipeline
//! already treats as "nothing recognized".

// ---------------------------------------------------------------------------
// Hallucination filter
// ---------------------------------------------------------------------------

/// Maximum immediate repetitions of one word before the transcript is
/// considered a decoding loop.
const MAX_CONSECUTIVE_REPEATS: usize = 4;
/// Transcripts of at least this many words are checked for information
/// density.
const DENSITY_MIN_WORDS: usize = 10;
/// Minimum unique/total token ratio for long transcripts.
const DENSITY_MIN_RATIO: f64 = 0.4;

/// Detect repetitive decoding loops ("once once once once once…").
pub fn is_hallucination(text: &str) -> bool {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return false;
    }

    // Immediate consecutive repetitions of the same word.
    let mut max_repeats = 1;
    let mut current = 1;
    for pair in words.windows(2) {
        if pair[0] == pair[1] {
            current += 1;
            max_repeats = max_repeats.max(current);
        } else {
            current = 1;
        }
    }
    if max_repeats > MAX_CONSECUTIVE_REPEATS {
        return true;
    }

    // Low information density ("that was that was that was…").
    if words.len() >= DENSITY_MIN_WORDS {
        let unique: std::collections::HashSet<&&str> = words.iter().collect();
        let ratio = unique.len() as f64 / words.len() as f64;
        if ratio < DENSITY_MIN_RATIO {
            return true;
        }
    }

    false
}

// ---------------------------------------------------------------------------
// Prompt-echo filter
// ---------------------------------------------------------------------------

/// Detect transcripts that merely echo the biasing prompt — a common
/// failure on silence or music.
pub fn is_prompt_echo(text: &str, prompt: &str) -> bool {
    let norm_text = normalize(text);
    let norm_prompt = normalize(prompt);
    if norm_text.is_empty() || norm_prompt.is_empty() {
        return false;
    }
    norm_text == norm_prompt || norm_prompt.ends_with(&norm_text)
}

/// Lowercase and strip everything but letters, digits and spaces.
fn normalize(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if c.is_alphanumeric() {
            out.extend(c.to_lowercase());
        } else if c.is_whitespace() {
            out.push(' ');
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ---------------------------------------------------------------------------
// Metadata tag strip
// ---------------------------------------------------------------------------

/// Remove `<|…|>`-style tags (language, emotion, background-music markers
/// emitted by some ASR models).
pub fn strip_metadata_tags(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == '<' && i + 1 < chars.len() && chars[i + 1] == '|' {
            // Scan for the closing "|>".
            if let Some(close) = (i + 2..chars.len().saturating_sub(1))
                .find(|&j| chars[j] == '|' && chars[j + 1] == '>')
            {
                i = close + 2;
                continue;
            }
        }
        out.push(chars[i]);
        i += 1;
    }
    out.trim().to_string()
}

// ---------------------------------------------------------------------------
// Garbage strip
// ---------------------------------------------------------------------------

/// Minimum length of a trailing digit run considered a watermark.
const TRAILING_DIGIT_RUN: usize = 8;
/// Minimum digits after `×` considered a watermark artifact.
const CROSS_DIGIT_RUN: usize = 6;

/// Strip overlay-watermark artifacts: trailing digit runs of length ≥ 8
/// and `×NNNNNN` sequences anywhere in the text.
pub fn strip_garbage(text: &str) -> String {
    let mut chars: Vec<char> = text.chars().collect();

    // ×NNNNNN… sequences.
    let mut cleaned: Vec<char> = Vec::with_capacity(chars.len());
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == '×' {
            let digits = chars[i + 1..]
                .iter()
                .take_while(|c| c.is_ascii_digit())
                .count();
            if digits >= CROSS_DIGIT_RUN {
                i += 1 + digits;
                continue;
            }
        }
        cleaned.push(chars[i]);
        i += 1;
    }
    chars = cleaned;

    // Trailing digit run (ignoring trailing whitespace).
    let mut end = chars.len();
    while end > 0 && chars[end - 1].is_whitespace() {
        end -= 1;
    }
    let mut digit_start = end;
    while digit_start > 0 && chars[digit_start - 1].is_ascii_digit() {
        digit_start -= 1;
    }
    if end - digit_start >= TRAILING_DIGIT_RUN {
        chars.truncate(digit_start);
    }

    chars.into_iter().collect::<String>().trim().to_string()
}

// ---------------------------------------------------------------------------
// Block list
// ---------------------------------------------------------------------------

/// Case-insensitive check against the configured caption-credit block list.
pub fn is_blocked(text: &str, patterns: &[String]) -> bool {
    if patterns.is_empty() {
        return false;
    }
    let lower = text.to_lowercase();
    patterns
        .iter()
        .any(|p| !p.is_empty() && lower.contains(&p.to_lowercase()))
}

// ---------------------------------------------------------------------------
// Combined pass
// ---------------------------------------------------------------------------

/// Run the full filter chain on an engine result.
///
/// Returns the cleaned transcript, or an empty string when the transcript
/// is rejected outright.
pub fn filter_transcript(text: &str, prompt: Option<&str>, blocked: &[String]) -> String {
    let cleaned = strip_garbage(&strip_metadata_tags(text));
    if cleaned.is_empty() {
        return cleaned;
    }
    if is_hallucination(&cleaned) {
        log::debug!("recognize: filtered hallucination: {:.50}", cleaned);
        return String::new();
    }
    if let Some(p) = prompt {
        if is_prompt_echo(&cleaned, p) {
            log::debug!("recognize: filtered prompt echo: {:.50}", cleaned);
            return String::new();
        }
    }
    if is_blocked(&cleaned, blocked) {
        log::debug!("recognize: filtered blocked pattern: {:.50}", cleaned);
        return String::new();
    }
    cleaned
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // --- hallucination ---

    #[test]
    fn repeated_word_loop_is_hallucination() {
        assert!(is_hallucination("once once once once once"));
    }

    #[test]
    fn four_repeats_is_allowed() {
        assert!(!is_hallucination("no no no no"));
    }

    #[test]
    fn low_density_long_text_is_hallucination() {
        assert!(is_hallucination(
            "that was that was that was that was that was"
        ));
    }

    #[test]
    fn normal_sentence_passes() {
        assert!(!is_hallucination(
            "the quick brown fox jumps over the lazy dog today"
        ));
    }

    #[test]
    fn empty_text_is_not_hallucination() {
        assert!(!is_hallucination(""));
    }

    // --- prompt echo ---

    #[test]
    fn exact_echo_detected() {
        assert!(is_prompt_echo("Hello world", "hello world"));
    }

    #[test]
    fn trailing_substring_echo_detected() {
        assert!(is_prompt_echo("world", "Hello world"));
    }

    #[test]
    fn punctuation_insensitive_echo() {
        assert!(is_prompt_echo("Hello, world!", "hello world"));
    }

    #[test]
    fn fresh_text_is_not_echo() {
        assert!(!is_prompt_echo("something new entirely", "Hello world"));
    }

    // --- metadata tags ---

    #[test]
    fn strips_asr_tags() {
        assert_eq!(
            strip_metadata_tags("<|zh|><|NEUTRAL|>你好世界<|woitn|>"),
            "你好世界"
        );
    }

    #[test]
    fn leaves_plain_angle_brackets() {
        assert_eq!(strip_metadata_tags("a < b and c > d"), "a < b and c > d");
    }

    #[test]
    fn unterminated_tag_kept() {
        assert_eq!(strip_metadata_tags("text <|zh"), "text <|zh");
    }

    // --- garbage strip ---

    #[test]
    fn strips_trailing_digit_run() {
        assert_eq!(strip_garbage("subtitle text 123456789"), "subtitle text");
    }

    #[test]
    fn keeps_short_trailing_digits() {
        assert_eq!(strip_garbage("season 3"), "season 3");
    }

    #[test]
    fn strips_cross_watermark() {
        assert_eq!(strip_garbage("正片内容×123456继续"), "正片内容继续");
    }

    #[test]
    fn keeps_cross_with_few_digits() {
        assert_eq!(strip_garbage("3×4 matrix"), "3×4 matrix");
    }

    // --- block list ---

    #[test]
    fn block_list_matches_case_insensitively() {
        let patterns = vec!["Subtitles by".to_string()];
        assert!(is_blocked("subtitles BY community", &patterns));
        assert!(!is_blocked("actual dialogue", &patterns));
    }

    // --- combined ---

    #[test]
    fn filter_chain_cleans_and_rejects() {
        assert_eq!(
            filter_transcript("<|en|>hello there", None, &[]),
            "hello there"
        );
        assert_eq!(
            filter_transcript("once once once once once", None, &[]),
            ""
        );
        assert_eq!(filter_transcript("world", Some("hello world"), &[]), "");
        let blocked = vec!["caption credit".to_string()];
        assert_eq!(filter_transcript("Caption Credit: xyz", None, &blocked), "");
    }
}
