//! Mixed-output repair.
//!
//! LLMs translating into a Latin-script target sometimes leave CJK,
//! kana, or Hangul fragments untranslated mid-sentence. The repair pass
//! finds those fragments so the dispatcher can translate each one through
//! the MT chain, then splices the replacements back while keeping the
//! sentence readable.
//!
//! The splice heuristics (lowercasing after a lowercase letter, dropping
//! a duplicated article) are English habits; they live behind
//! [`SplicePolicy`] so other Latin targets get only neutral spacing.

use crate::lang::{is_cjk_family, lang_is_latin_script};

// ---------------------------------------------------------------------------
// SplicePolicy
// ---------------------------------------------------------------------------

/// Target-language-indexed splice behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplicePolicy {
    /// Lowercase the fragment's first letter when spliced after a
    /// lowercase letter mid-sentence.
    pub lowercase_after_lowercase: bool,
    /// Drop a leading "a "/"an "/"the " when the preceding text already
    /// ends with the article "a".
    pub strip_article_after_a: bool,
}

impl SplicePolicy {
    /// Policy for a target language. English carries the full heuristics;
    /// every other Latin-script target gets neutral spacing only.
    pub fn for_target(target_lang: &str) -> Self {
        if target_lang == "en" {
            Self {
                lowercase_after_lowercase: true,
                strip_article_after_a: true,
            }
        } else {
            Self {
                lowercase_after_lowercase: false,
                strip_article_after_a: false,
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Fragment discovery
// ---------------------------------------------------------------------------

/// Whether the repair pass applies at all: Latin-script target with
/// CJK-family fragments left in the candidate.
pub fn needs_repair(candidate: &str, target_lang: &str) -> bool {
    lang_is_latin_script(target_lang) && candidate.chars().any(is_cjk_family)
}

/// Maximal runs of CJK-family characters as char-index ranges
/// `[start, end)`.
pub fn find_fragments(text: &str) -> Vec<(usize, usize)> {
    let mut runs = Vec::new();
    let mut start = None;
    let mut i = 0;
    for c in text.chars() {
        if is_cjk_family(c) {
            if start.is_none() {
                start = Some(i);
            }
        } else if let Some(s) = start.take() {
            runs.push((s, i));
        }
        i += 1;
    }
    if let Some(s) = start {
        runs.push((s, i));
    }
    runs
}

/// Extract the fragment text for a char range.
pub fn fragment_text(text: &str, range: (usize, usize)) -> String {
    text.chars().skip(range.0).take(range.1 - range.0).collect()
}

// ---------------------------------------------------------------------------
// Splicing
// ---------------------------------------------------------------------------

fn is_wordlike(c: char) -> bool {
    c.is_alphanumeric()
}

/// Splice fragment replacements into `text`.
///
/// `replacements` pairs each char range from [`find_fragments`] with its
/// translation, in order. Spacing: a space is inserted when both
/// neighbouring characters are word-like. The policy heuristics adjust
/// case and duplicated articles at each splice point.
pub fn splice(text: &str, replacements: &[((usize, usize), String)], policy: &SplicePolicy) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut pos = 0;

    for ((start, end), replacement) in replacements {
        // Copy the untouched span.
        out.extend(chars[pos..*start].iter());
        pos = *end;

        let mut rep = replacement.trim().to_string();
        if rep.is_empty() {
            continue;
        }

        let prev_word_char = out.chars().rev().find(|c| !c.is_whitespace());

        // Article dedup: "… a" + "the school" → "… a school".
        if policy.strip_article_after_a {
            let trimmed_out = out.trim_end();
            if trimmed_out.ends_with(" a") || trimmed_out == "a" {
                for article in ["a ", "an ", "the "] {
                    if rep.to_lowercase().starts_with(article) {
                        let stripped: String =
                            rep.chars().skip(article.chars().count()).collect();
                        rep = stripped;
                        break;
                    }
                }
            }
        }

        // Case: mid-sentence splice after a lowercase letter.
        if policy.lowercase_after_lowercase {
            if let Some(prev) = prev_word_char {
                if prev.is_lowercase() {
                    let mut cs = rep.chars();
                    if let Some(first) = cs.next() {
                        if first.is_uppercase() {
                            let rest: String = cs.collect();
                            let mut lowered: String = first.to_lowercase().collect();
                            lowered.push_str(&rest);
                            rep = lowered;
                        }
                    }
                }
            }
        }

        // Leading space when both neighbours are word-like.
        if let (Some(last), Some(first)) = (out.chars().last(), rep.chars().next()) {
            if is_wordlike(last) && is_wordlike(first) {
                out.push(' ');
            }
        }
        out.push_str(&rep);

        // Trailing space before the next word-like character.
        if let (Some(last), Some(next)) = (out.chars().last(), chars.get(pos)) {
            if is_wordlike(last) && is_wordlike(*next) {
                out.push(' ');
            }
        }
    }
    out.extend(chars[pos..].iter());
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn en() -> SplicePolicy {
        SplicePolicy::for_target("en")
    }

    // --- discovery ---

    #[test]
    fn needs_repair_only_for_latin_targets() {
        assert!(needs_repair("went to 学校 today", "en"));
        assert!(needs_repair("went to 学校 today", "fr"));
        assert!(!needs_repair("went to school today", "en"));
        assert!(!needs_repair("去了学校", "zh"));
    }

    #[test]
    fn finds_maximal_runs() {
        let runs = find_fragments("go to 学校 and がっこう now");
        assert_eq!(runs, vec![(6, 8), (13, 17)]);
        assert_eq!(fragment_text("go to 学校 and がっこう now", runs[0]), "学校");
    }

    #[test]
    fn trailing_run_is_found() {
        assert_eq!(find_fragments("hello 世界"), vec![(6, 8)]);
        assert_eq!(find_fragments("没有拉丁"), vec![(0, 4)]);
        assert!(find_fragments("all latin").is_empty());
    }

    // --- splicing ---

    #[test]
    fn splices_with_spacing() {
        let text = "went to学校today";
        let runs = find_fragments(text);
        let reps = vec![(runs[0], "school".to_string())];
        assert_eq!(splice(text, &reps, &en()), "went to school today");
    }

    #[test]
    fn lowercases_after_lowercase_letter() {
        let text = "went to 学校 yesterday";
        let runs = find_fragments(text);
        let reps = vec![(runs[0], "The School".to_string())];
        assert_eq!(splice(text, &reps, &en()), "went to the School yesterday");
    }

    #[test]
    fn neutral_policy_keeps_case() {
        let text = "allé à 学校 hier";
        let runs = find_fragments(text);
        let reps = vec![(runs[0], "L'école".to_string())];
        assert_eq!(
            splice(text, &reps, &SplicePolicy::for_target("fr")),
            "allé à L'école hier"
        );
    }

    #[test]
    fn strips_duplicated_article() {
        let text = "I saw a 学校 there";
        let runs = find_fragments(text);
        let reps = vec![(runs[0], "the school".to_string())];
        assert_eq!(splice(text, &reps, &en()), "I saw a school there");
    }

    #[test]
    fn multiple_fragments_in_order() {
        let text = "他 said 你好 loudly";
        let runs = find_fragments(text);
        let reps = vec![
            (runs[0], "He".to_string()),
            (runs[1], "hello".to_string()),
        ];
        assert_eq!(splice(text, &reps, &en()), "He said hello loudly");
    }

    #[test]
    fn empty_replacement_drops_fragment() {
        let text = "ok 好 done";
        let runs = find_fragments(text);
        let reps = vec![(runs[0], "  ".to_string())];
        assert_eq!(splice(text, &reps, &en()), "ok  done");
    }

    #[test]
    fn punctuation_neighbours_get_no_space() {
        let text = "said \"你好\" twice";
        let runs = find_fragments(text);
        let reps = vec![(runs[0], "hello".to_string())];
        assert_eq!(splice(text, &reps, &en()), "said \"hello\" twice");
    }
}
