//! Probabilistic OCR correction from per-line candidate lists.
//!
//! OCR engines report ranked alternatives per observation ("重" vs "蛋" vs
//! "虫"). For CJK text, picking the combination whose segmentation looks
//! most like real vocabulary beats always taking the top candidate. The
//! scoring function is pluggable: the learn module's dictionary segmenter
//! provides one, tests provide their own, and with no scorer the text
//! passes through untouched.

use crate::lang::has_cjk;

/// Candidates considered per observation.
const MAX_CANDIDATES_PER_LINE: usize = 5;
/// Total combinations scored before giving up the search.
const MAX_COMBINATIONS: usize = 27;

// ---------------------------------------------------------------------------
// TextScorer
// ---------------------------------------------------------------------------

/// Scores how much a string looks like well-segmented vocabulary.
/// Higher is better.
pub trait TextScorer: Send + Sync {
    fn score(&self, text: &str) -> f64;
}

/// Scorer over a fixed lexicon: greedy longest-match segmentation where a
/// known word of `n ≥ 2` characters scores `n^1.5` and every other
/// character scores 0.3.
pub struct LexiconScorer {
    words: std::collections::HashSet<String>,
    max_word_len: usize,
}

impl LexiconScorer {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let words: std::collections::HashSet<String> =
            words.into_iter().map(Into::into).collect();
        let max_word_len = words.iter().map(|w| w.chars().count()).max().unwrap_or(1);
        Self {
            words,
            max_word_len,
        }
    }
}

impl TextScorer for LexiconScorer {
    fn score(&self, text: &str) -> f64 {
        let chars: Vec<char> = text.chars().filter(|c| !c.is_whitespace()).collect();
        let mut total = 0.0;
        let mut i = 0;
        while i < chars.len() {
            let mut matched = 0;
            let upper = self.max_word_len.min(chars.len() - i);
            for len in (2..=upper).rev() {
                let cand: String = chars[i..i + len].iter().collect();
                if self.words.contains(&cand) {
                    matched = len;
                    break;
                }
            }
            if matched >= 2 {
                total += (matched as f64).powf(1.5);
                i += matched;
            } else {
                total += 0.3;
                i += 1;
            }
        }
        total
    }
}

// ---------------------------------------------------------------------------
// pick_best / correct
// ---------------------------------------------------------------------------

/// From per-observation candidate lists, pick the combination with the
/// highest score. Only CJK combinations are scored; the first combination
/// is the fallback.
pub fn pick_best(candidates: &[Vec<String>], scorer: &dyn TextScorer) -> String {
    let limited: Vec<&[String]> = candidates
        .iter()
        .filter(|c| !c.is_empty())
        .map(|c| &c[..c.len().min(MAX_CANDIDATES_PER_LINE)])
        .collect();
    if limited.is_empty() {
        return String::new();
    }

    let mut best_text = join_combo(&limited.iter().map(|c| &c[0]).collect::<Vec<_>>());
    let mut best_score = if has_cjk(&best_text) {
        scorer.score(&best_text)
    } else {
        0.0
    };

    for combo in Combinations::new(&limited).skip(1).take(MAX_COMBINATIONS - 1) {
        let text = join_combo(&combo);
        if !has_cjk(&text) {
            continue;
        }
        let score = scorer.score(&text);
        if score > best_score {
            best_score = score;
            best_text = text;
        }
    }
    best_text
}

/// Candidate-based correction: pick the best combination when candidate
/// lists are present, otherwise return `text` unchanged.
pub fn correct(text: &str, candidates: &[Vec<String>], scorer: &dyn TextScorer) -> String {
    if candidates.iter().any(|c| !c.is_empty()) {
        pick_best(candidates, scorer)
    } else {
        text.to_string()
    }
}

fn join_combo(parts: &[&String]) -> String {
    if parts.len() == 1 {
        parts[0].clone()
    } else {
        parts
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(" ")
            .trim()
            .to_string()
    }
}

/// Cartesian-product iterator over candidate slices, in ranked order.
struct Combinations<'a> {
    lists: &'a [&'a [String]],
    indices: Vec<usize>,
    done: bool,
}

impl<'a> Combinations<'a> {
    fn new(lists: &'a [&'a [String]]) -> Self {
        Self {
            lists,
            indices: vec![0; lists.len()],
            done: lists.is_empty(),
        }
    }
}

impl<'a> Iterator for Combinations<'a> {
    type Item = Vec<&'a String>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let combo: Vec<&String> = self
            .indices
            .iter()
            .zip(self.lists)
            .map(|(&i, list)| &list[i])
            .collect();

        // Advance odometer, last position fastest.
        let mut pos = self.lists.len();
        loop {
            if pos == 0 {
                self.done = true;
                break;
            }
            pos -= 1;
            self.indices[pos] += 1;
            if self.indices[pos] < self.lists[pos].len() {
                break;
            }
            self.indices[pos] = 0;
        }
        Some(combo)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn scorer() -> LexiconScorer {
        LexiconScorer::new(["你好", "世界", "学校", "每个"])
    }

    #[test]
    fn no_candidates_passes_text_through() {
        let s = scorer();
        assert_eq!(correct("原文", &[], &s), "原文");
        assert_eq!(correct("原文", &[vec![]], &s), "原文");
    }

    #[test]
    fn picks_lexicon_backed_candidate() {
        let s = scorer();
        // "王不" is the top candidate but "每个" is a known word.
        let candidates = vec![vec!["王不".to_string(), "每个".to_string()]];
        assert_eq!(pick_best(&candidates, &s), "每个");
    }

    #[test]
    fn multi_line_combination() {
        let s = scorer();
        let candidates = vec![
            vec!["你好".to_string()],
            vec!["世凡".to_string(), "世界".to_string()],
        ];
        assert_eq!(pick_best(&candidates, &s), "你好 世界");
    }

    #[test]
    fn non_cjk_keeps_top_candidate() {
        let s = scorer();
        let candidates = vec![vec!["hello".to_string(), "he11o".to_string()]];
        assert_eq!(pick_best(&candidates, &s), "hello");
    }

    #[test]
    fn lexicon_scorer_prefers_known_words() {
        let s = scorer();
        assert!(s.score("你好世界") > s.score("你子世凡"));
    }

    #[test]
    fn combinations_iterate_in_ranked_order() {
        let a = vec!["a1".to_string(), "a2".to_string()];
        let b = vec!["b1".to_string(), "b2".to_string()];
        let lists: Vec<&[String]> = vec![&a, &b];
        let combos: Vec<String> = Combinations::new(&lists)
            .map(|c| c.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(""))
            .collect();
        assert_eq!(combos, vec!["a1b1", "a1b2", "a2b1", "a2b2"]);
    }
}
