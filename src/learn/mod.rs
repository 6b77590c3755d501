//! Learn side-channel — keyword extraction from committed Chinese source
//! text.
//!
//! Segmentation and dictionary lookup are external collaborators behind
//! the [`Segmenter`] and [`Dictionary`] traits. This module owns the
//! selection policy (content words, proper nouns, four-character idioms,
//! capped at eight), the traditional→simplified conversion, and the
//! batch-overlap suppression that keeps the panel from flickering with
//! near-identical batches.

pub mod trad;

use std::collections::{HashSet, VecDeque};

use crate::lang::{has_cjk, is_cjk};

pub use trad::to_simplified;

/// Batches remembered for overlap suppression.
const SUPPRESS_HISTORY: usize = 3;
/// A new batch overlapping any remembered batch by at least this fraction
/// is suppressed.
const SUPPRESS_OVERLAP: f64 = 0.6;

// ---------------------------------------------------------------------------
// External collaborator traits
// ---------------------------------------------------------------------------

/// Coarse word class from the segmenter, used to bias keyword selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenClass {
    /// Common nouns, verbs, adjectives, adverbs.
    Content,
    /// Person, place, and other proper names.
    ProperNoun,
    /// Four-character idioms.
    Idiom,
    /// Particles, pronouns, everything else.
    Function,
}

/// One segmented token.
#[derive(Debug, Clone)]
pub struct Token {
    pub text: String,
    pub class: TokenClass,
}

/// Chinese word segmentation with coarse part-of-speech classes.
pub trait Segmenter: Send + Sync {
    fn segment(&self, text: &str) -> Vec<Token>;
}

/// A dictionary entry: simplified headword, pronunciation, definition.
#[derive(Debug, Clone, PartialEq)]
pub struct DictEntry {
    pub simplified: String,
    pub pinyin: String,
    pub definition: String,
}

/// Bundled dictionary lookup. `pronounce` derives a reading for words the
/// dictionary does not carry.
pub trait Dictionary: Send + Sync {
    fn lookup(&self, word: &str) -> Option<DictEntry>;
    fn pronounce(&self, word: &str) -> String;
}

// ---------------------------------------------------------------------------
// Keyword batch
// ---------------------------------------------------------------------------

/// One annotated keyword for the learn panel.
#[derive(Debug, Clone, PartialEq)]
pub struct Keyword {
    pub word: String,
    pub pinyin: String,
    pub definition: String,
}

/// A batch of keywords extracted from one committed source.
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordBatch {
    pub keywords: Vec<Keyword>,
}

impl KeywordBatch {
    /// Combined panel text, for the gate's self-echo rule.
    pub fn panel_text(&self) -> String {
        self.keywords
            .iter()
            .map(|k| k.word.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

// ---------------------------------------------------------------------------
// KeywordExtractor
// ---------------------------------------------------------------------------

/// Selection + suppression policy. The async dictionary-miss path runs in
/// the pipeline: [`select`](Self::select) is pure, the caller resolves
/// each word (dictionary, then the dispatcher on miss), and
/// [`admit`](Self::admit) applies batch suppression.
pub struct KeywordExtractor {
    max_keywords: usize,
    recent_batches: VecDeque<HashSet<String>>,
}

impl KeywordExtractor {
    pub fn new(max_keywords: usize) -> Self {
        Self {
            max_keywords,
            recent_batches: VecDeque::with_capacity(SUPPRESS_HISTORY + 1),
        }
    }

    /// Select up to `max_keywords` candidate words from `text`.
    ///
    /// Returns an empty list for non-Chinese text. The input is converted
    /// to simplified characters before segmentation; selection favors
    /// proper nouns and idioms, then content words of two or more
    /// characters.
    pub fn select(&self, text: &str, segmenter: &dyn Segmenter) -> Vec<String> {
        if !has_cjk(text) {
            return Vec::new();
        }
        let simplified = to_simplified(text);
        let tokens = segmenter.segment(&simplified);

        let mut seen: HashSet<String> = HashSet::new();
        let mut picked: Vec<String> = Vec::new();

        // Proper nouns and idioms first — they carry the most learning
        // value and segmenters find few of them.
        for token in &tokens {
            if picked.len() >= self.max_keywords {
                break;
            }
            let eligible = matches!(token.class, TokenClass::ProperNoun | TokenClass::Idiom)
                && token.text.chars().count() >= 2;
            if eligible && token.text.chars().all(is_cjk) && seen.insert(token.text.clone()) {
                picked.push(token.text.clone());
            }
        }

        // Then ordinary content words.
        for token in &tokens {
            if picked.len() >= self.max_keywords {
                break;
            }
            let eligible =
                token.class == TokenClass::Content && token.text.chars().count() >= 2;
            if eligible && token.text.chars().all(is_cjk) && seen.insert(token.text.clone()) {
                picked.push(token.text.clone());
            }
        }

        picked
    }

    /// Resolve one selected word to a keyword: dictionary first, the
    /// provided fallback definition on miss.
    pub fn resolve(
        word: &str,
        dictionary: &dyn Dictionary,
        fallback_definition: Option<String>,
    ) -> Keyword {
        if let Some(entry) = dictionary.lookup(word) {
            return Keyword {
                word: entry.simplified,
                pinyin: entry.pinyin,
                definition: entry.definition,
            };
        }
        Keyword {
            word: word.to_string(),
            pinyin: dictionary.pronounce(word),
            definition: fallback_definition.unwrap_or_default(),
        }
    }

    /// Apply batch suppression. Returns the batch when it is fresh enough
    /// to show, recording it in the history; `None` when ≥ 60 % of its
    /// words overlap any of the last three shown batches.
    pub fn admit(&mut self, keywords: Vec<Keyword>) -> Option<KeywordBatch> {
        if keywords.is_empty() {
            return None;
        }
        let words: HashSet<String> = keywords.iter().map(|k| k.word.clone()).collect();

        for prev in &self.recent_batches {
            let inter = words.intersection(prev).count() as f64;
            if inter / words.len() as f64 >= SUPPRESS_OVERLAP {
                return None;
            }
        }

        self.recent_batches.push_back(words);
        while self.recent_batches.len() > SUPPRESS_HISTORY {
            self.recent_batches.pop_front();
        }
        Some(KeywordBatch { keywords })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    /// Segmenter test double with a fixed token table.
    struct TableSegmenter(Vec<(&'static str, TokenClass)>);

    impl Segmenter for TableSegmenter {
        fn segment(&self, text: &str) -> Vec<Token> {
            // Greedy longest-match over the table, singles otherwise.
            let chars: Vec<char> = text.chars().collect();
            let mut out = Vec::new();
            let mut i = 0;
            while i < chars.len() {
                let mut matched = None;
                for (word, class) in &self.0 {
                    let wlen = word.chars().count();
                    if i + wlen <= chars.len() {
                        let slice: String = chars[i..i + wlen].iter().collect();
                        if slice == *word
                            && matched
                                .as_ref()
                                .map(|(m, _): &(String, TokenClass)| {
                                    wlen > m.chars().count()
                                })
                                .unwrap_or(true)
                        {
                            matched = Some((slice, *class));
                        }
                    }
                }
                match matched {
                    Some((word, class)) => {
                        i += word.chars().count();
                        out.push(Token { text: word, class });
                    }
                    None => {
                        out.push(Token {
                            text: chars[i].to_string(),
                            class: TokenClass::Function,
                        });
                        i += 1;
                    }
                }
            }
            out
        }
    }

    struct TableDictionary;

    impl Dictionary for TableDictionary {
        fn lookup(&self, word: &str) -> Option<DictEntry> {
            (word == "学校").then(|| DictEntry {
                simplified: "学校".into(),
                pinyin: "xué xiào".into(),
                definition: "school".into(),
            })
        }

        fn pronounce(&self, _word: &str) -> String {
            "pīn yīn".into()
        }
    }

    fn segmenter() -> TableSegmenter {
        TableSegmenter(vec![
            ("学校", TokenClass::Content),
            ("老师", TokenClass::Content),
            ("北京", TokenClass::ProperNoun),
            ("一心一意", TokenClass::Idiom),
        ])
    }

    #[test]
    fn non_chinese_selects_nothing() {
        let ex = KeywordExtractor::new(8);
        assert!(ex.select("hello world", &segmenter()).is_empty());
    }

    #[test]
    fn proper_nouns_and_idioms_rank_first() {
        let ex = KeywordExtractor::new(8);
        let picked = ex.select("学校在北京一心一意老师", &segmenter());
        assert_eq!(picked[0], "北京");
        assert_eq!(picked[1], "一心一意");
        assert!(picked.contains(&"学校".to_string()));
        assert!(picked.contains(&"老师".to_string()));
    }

    #[test]
    fn selection_caps_at_max() {
        let ex = KeywordExtractor::new(2);
        let picked = ex.select("学校在北京一心一意老师", &segmenter());
        assert_eq!(picked.len(), 2);
    }

    #[test]
    fn traditional_input_is_simplified_first() {
        // 學校 → 学校 via the character map, then segmented.
        let ex = KeywordExtractor::new(8);
        let picked = ex.select("學校", &segmenter());
        assert_eq!(picked, vec!["学校".to_string()]);
    }

    #[test]
    fn resolve_prefers_dictionary() {
        let kw = KeywordExtractor::resolve("学校", &TableDictionary, None);
        assert_eq!(kw.definition, "school");
        assert_eq!(kw.pinyin, "xué xiào");
    }

    #[test]
    fn resolve_miss_uses_fallback_and_pronounce() {
        let kw =
            KeywordExtractor::resolve("奇怪", &TableDictionary, Some("strange".to_string()));
        assert_eq!(kw.definition, "strange");
        assert_eq!(kw.pinyin, "pīn yīn");
    }

    #[test]
    fn overlapping_batch_is_suppressed() {
        let mut ex = KeywordExtractor::new(8);
        let batch1: Vec<Keyword> = ["学校", "老师", "北京"]
            .iter()
            .map(|w| Keyword {
                word: w.to_string(),
                pinyin: String::new(),
                definition: String::new(),
            })
            .collect();
        assert!(ex.admit(batch1.clone()).is_some());
        // Two of three words repeat: 66 % ≥ 60 % → suppressed.
        let batch2: Vec<Keyword> = ["学校", "老师", "朋友"]
            .iter()
            .map(|w| Keyword {
                word: w.to_string(),
                pinyin: String::new(),
                definition: String::new(),
            })
            .collect();
        assert!(ex.admit(batch2).is_none());
    }

    #[test]
    fn suppression_history_is_bounded_to_three() {
        let mut ex = KeywordExtractor::new(8);
        let make = |words: &[&str]| -> Vec<Keyword> {
            words
                .iter()
                .map(|w| Keyword {
                    word: w.to_string(),
                    pinyin: String::new(),
                    definition: String::new(),
                })
                .collect()
        };
        assert!(ex.admit(make(&["一", "二"])).is_some());
        assert!(ex.admit(make(&["三", "四"])).is_some());
        assert!(ex.admit(make(&["五", "六"])).is_some());
        assert!(ex.admit(make(&["七", "八"])).is_some());
        // The first batch has aged out of the 3-deep history.
        assert!(ex.admit(make(&["一", "二"])).is_some());
    }

    #[test]
    fn empty_batch_not_admitted() {
        let mut ex = KeywordExtractor::new(8);
        assert!(ex.admit(vec![]).is_none());
    }
}
